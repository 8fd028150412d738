use log::debug;
use macaw::Vec2;

use crate::error::Error;
use crate::height_field::HeightField;

/// Smallest propagation divisor the solver will use; below this the
/// neighbour sum is amplified and the field diverges.
pub const MIN_SPEED: f32 = 2.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulationParams {
    /// Half-width of the square a poke writes, in pixels
    pub ripple_size: u32,
    /// Amplitude written into the field by a poke
    pub strength: f32,
    /// Damping input in [0, 1); 0 keeps waves forever
    pub viscosity: f32,
    /// Propagation divisor, anything below `MIN_SPEED` acts as `MIN_SPEED`
    pub speed: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            ripple_size: 4,
            strength: 512.0,
            viscosity: 0.04,
            speed: 2.0,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), Error> {
        if self.ripple_size == 0 {
            return Err(Error::InvalidRippleSize(self.ripple_size));
        }
        if !self.strength.is_finite() {
            return Err(Error::NonFiniteParameter { name: "strength", value: self.strength });
        }
        if !self.speed.is_finite() {
            return Err(Error::NonFiniteParameter { name: "speed", value: self.speed });
        }
        // NaN fails this check as well
        if !(0.0..1.0).contains(&self.viscosity) {
            return Err(Error::UnsupportedViscosity(self.viscosity));
        }
        Ok(())
    }
}

/// Advance the wave equation by one step, reading the current buffer and
/// writing the scratch buffer. The caller swaps afterwards.
///
/// Only the rows between the first and the last are updated. Horizontal
/// neighbours are taken from the flat index, so the first and last column
/// of a row see the adjacent row.
pub fn step(field: &mut HeightField, speed: f32, viscosity: f32) {
    let width = field.width();
    let len = field.len();
    let divisor = speed.max(MIN_SPEED);
    let damping = 1.0 - viscosity;

    let (current, next) = field.split_mut();
    for i in width..len.saturating_sub(width) {
        let neighbours = current[i - 1] + current[i + 1] + current[i - width] + current[i + width];
        next[i] = (neighbours / divisor - next[i]) * damping;
    }
}

/// Overwrite the square `[center - radius, center + radius)` of the current
/// buffer with `strength`, clipped to the field.
pub fn inject(field: &mut HeightField, center_x: i32, center_y: i32, radius: i32, strength: f32) {
    let width = field.width();
    let (cx, cy, r) = (i64::from(center_x), i64::from(center_y), i64::from(radius));

    let x_start = (cx - r).max(0);
    let x_end = (cx + r).min(width as i64);
    let y_start = (cy - r).max(0);
    let y_end = (cy + r).min(field.height() as i64);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let current = field.current_mut();
    for y in y_start as usize..y_end as usize {
        let row = y * width;
        current[row + x_start as usize..row + x_end as usize].fill(strength);
    }
}

pub struct WaveSimulation {
    field: HeightField,
    params: SimulationParams,
    steps: u64,
}

impl WaveSimulation {
    pub fn new(width: usize, height: usize, params: SimulationParams) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self {
            field: HeightField::new(width, height)?,
            params,
            steps: 0,
        })
    }

    pub fn params(&self) -> SimulationParams {
        self.params
    }

    /// Replace the parameters; they apply from the next poke or step.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), Error> {
        params.validate()?;
        if params != self.params {
            debug!("simulation params changed: {:?}", params);
            self.params = params;
        }
        Ok(())
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    /// Number of steps taken since creation or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn poke_normalized(&mut self, point: Vec2) {
        let clamped = point.clamp(Vec2::ZERO, Vec2::ONE);
        let x = clamped.x * self.field.width() as f32;
        let y = clamped.y * self.field.height() as f32;
        self.poke(x as i32, y as i32);
    }

    pub fn poke(&mut self, x: i32, y: i32) {
        let radius = i32::try_from(self.params.ripple_size).unwrap_or(i32::MAX);
        inject(&mut self.field, x, y, radius, self.params.strength);
    }

    pub fn advance(&mut self) {
        step(&mut self.field, self.params.speed, self.params.viscosity);
        self.field.swap();
        self.steps += 1;
    }

    pub fn reset(&mut self) {
        self.field.clear();
        self.steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macaw::vec2;
    use proptest::prelude::*;

    fn abs_sum(field: &HeightField) -> f32 {
        field.current().iter().map(|v| v.abs()).sum()
    }

    #[test]
    fn default_params_are_valid() {
        let params = SimulationParams::default();
        assert_eq!(params.ripple_size, 4);
        assert_eq!(params.strength, 512.0);
        assert_eq!(params.viscosity, 0.04);
        assert_eq!(params.speed, 2.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let base = SimulationParams::default();
        for viscosity in [1.0, 1.5, -0.01, f32::NAN] {
            let params = SimulationParams { viscosity, ..base };
            assert!(matches!(params.validate(), Err(Error::UnsupportedViscosity(_))));
        }
        let params = SimulationParams { ripple_size: 0, ..base };
        assert!(matches!(params.validate(), Err(Error::InvalidRippleSize(0))));
        let params = SimulationParams { strength: f32::INFINITY, ..base };
        assert!(matches!(
            params.validate(),
            Err(Error::NonFiniteParameter { name: "strength", .. })
        ));
        let params = SimulationParams { speed: f32::NAN, ..base };
        assert!(matches!(
            params.validate(),
            Err(Error::NonFiniteParameter { name: "speed", .. })
        ));
        assert!(WaveSimulation::new(8, 8, SimulationParams { viscosity: 1.0, ..base }).is_err());
    }

    #[test]
    fn rejected_params_leave_simulation_unchanged() {
        let mut sim = WaveSimulation::new(8, 8, SimulationParams::default()).unwrap();
        let bad = SimulationParams { viscosity: 2.0, ..SimulationParams::default() };
        assert!(sim.set_params(bad).is_err());
        assert_eq!(sim.params(), SimulationParams::default());
    }

    #[test]
    fn undisturbed_field_stays_at_rest() {
        let mut field = HeightField::new(16, 12).unwrap();
        for _ in 0..100 {
            step(&mut field, 2.0, 0.04);
            field.swap();
        }
        assert!(field.current().iter().all(|v| *v == 0.0));
        assert!(field.scratch().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn inject_writes_only_the_clipped_square() {
        let mut field = HeightField::new(10, 8).unwrap();
        field.current_mut().fill(-1.0);

        inject(&mut field, 5, 4, 2, 7.0);

        for y in 0..8 {
            for x in 0..10 {
                let value = field.current()[y * 10 + x];
                let inside = (3..7).contains(&x) && (2..6).contains(&y);
                assert_eq!(value, if inside { 7.0 } else { -1.0 }, "at ({x}, {y})");
            }
        }
        assert!(field.scratch().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn inject_clips_at_edges() {
        let mut field = HeightField::new(6, 6).unwrap();
        inject(&mut field, 5, 0, 2, 3.0);
        let touched: Vec<usize> = (0..36).filter(|i| field.current()[*i] != 0.0).collect();
        // x in 3..6, y in 0..2
        assert_eq!(touched, vec![3, 4, 5, 9, 10, 11]);
    }

    #[test]
    fn inject_outside_the_field_is_a_no_op() {
        let mut field = HeightField::new(6, 6).unwrap();
        inject(&mut field, -10, 3, 2, 3.0);
        inject(&mut field, 3, 40, 2, 3.0);
        inject(&mut field, i32::MAX, i32::MIN, i32::MAX, 3.0);
        inject(&mut field, 3, 3, 0, 3.0);
        assert!(field.current().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn later_injections_overwrite_earlier_ones() {
        let mut field = HeightField::new(6, 6).unwrap();
        inject(&mut field, 2, 2, 2, 10.0);
        inject(&mut field, 3, 3, 1, -4.0);
        assert_eq!(field.current()[2 * 6 + 2], -4.0);
        assert_eq!(field.current()[3 * 6 + 3], -4.0);
        assert_eq!(field.current()[6 + 1], 10.0);
        assert_eq!(field.current()[4 * 6 + 4], 0.0);
    }

    #[test]
    fn one_step_on_a_four_by_four_field() {
        let mut field = HeightField::new(4, 4).unwrap();
        inject(&mut field, 1, 1, 1, 100.0);

        let mut expected_poke = [0.0f32; 16];
        for i in [0, 1, 4, 5] {
            expected_poke[i] = 100.0;
        }
        assert_eq!(field.current(), &expected_poke[..]);

        step(&mut field, 2.0, 0.04);
        field.swap();

        let damping = 1.0f32 - 0.04;
        let full = (200.0f32 / 2.0 - 0.0) * damping;
        let half = (100.0f32 / 2.0 - 0.0) * damping;
        let mut expected = [0.0f32; 16];
        expected[4] = full;
        expected[5] = full;
        expected[6] = half;
        expected[8] = half;
        expected[9] = half;

        for (i, (actual, expected)) in field.current().iter().zip(expected).enumerate() {
            assert!((actual - expected).abs() <= f32::EPSILON, "index {i}: {actual} != {expected}");
        }
        // The poked buffer becomes scratch untouched
        assert_eq!(field.scratch(), &expected_poke[..]);
    }

    #[test]
    fn speed_below_minimum_is_clamped() {
        let mut slow = HeightField::new(5, 5).unwrap();
        let mut clamped = HeightField::new(5, 5).unwrap();
        inject(&mut slow, 2, 2, 1, 50.0);
        inject(&mut clamped, 2, 2, 1, 50.0);

        step(&mut slow, 0.5, 0.1);
        step(&mut clamped, MIN_SPEED, 0.1);
        assert_eq!(slow.scratch(), clamped.scratch());
    }

    #[test]
    fn advance_swaps_once_per_step() {
        let mut sim = WaveSimulation::new(6, 6, SimulationParams::default()).unwrap();
        let first = sim.field().current().as_ptr();
        sim.advance();
        assert_ne!(sim.field().current().as_ptr(), first);
        sim.advance();
        assert_eq!(sim.field().current().as_ptr(), first);
        assert_eq!(sim.steps(), 2);
    }

    #[test]
    fn poke_uses_configured_size_and_strength() {
        let params = SimulationParams { ripple_size: 1, strength: 9.0, ..Default::default() };
        let mut sim = WaveSimulation::new(4, 4, params).unwrap();
        sim.poke(2, 2);
        let touched: Vec<usize> = (0..16).filter(|i| sim.field().current()[*i] == 9.0).collect();
        assert_eq!(touched, vec![5, 6, 9, 10]);

        sim.reset();
        assert!(sim.field().current().iter().all(|v| *v == 0.0));
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn normalized_poke_is_clamped_to_the_field() {
        let params = SimulationParams { ripple_size: 1, strength: 1.0, ..Default::default() };
        let mut sim = WaveSimulation::new(4, 4, params).unwrap();
        sim.poke_normalized(vec2(2.0, -1.0));
        // Lands at (4, 0): only x = 3, y = 0 survives clipping
        let touched: Vec<usize> = (0..16).filter(|i| sim.field().current()[*i] != 0.0).collect();
        assert_eq!(touched, vec![3]);
    }

    #[test]
    fn damped_waves_die_out() {
        let mut sim = WaveSimulation::new(32, 32, SimulationParams::default()).unwrap();
        sim.poke(16, 16);
        let initial = abs_sum(sim.field());

        let mut early = 0.0f32;
        for _ in 0..1000 {
            sim.advance();
            if sim.steps() == 50 {
                early = abs_sum(sim.field());
            }
        }
        let late = abs_sum(sim.field());
        assert!(early > 0.0);
        assert!(late < early);
        assert!(late < initial * 1e-6);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Away from the border rows the field always decays: a late window
        /// of steps never carries more energy than an earlier one.
        #[test]
        fn energy_does_not_grow(
            width in 8usize..24,
            height in 8usize..24,
            viscosity in 0.05f32..0.9,
            speed in 2.0f32..10.0,
            strength in -1000.0f32..1000.0,
            radius in 1i32..4,
            pokes in proptest::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..4),
        ) {
            let mut field = HeightField::new(width, height).unwrap();
            for (nx, ny) in pokes {
                let cx = (nx * width as f32) as i32;
                // Keep the square off the first and last row
                let min_y = radius + 1;
                let max_y = height as i32 - radius - 1;
                let cy = min_y + (ny * (max_y - min_y).max(0) as f32) as i32;
                inject(&mut field, cx, cy, radius, strength);
            }
            let initial: f32 = field.current().iter().map(|v| v.abs()).sum();

            let mut sums = Vec::with_capacity(600);
            for _ in 0..600 {
                step(&mut field, speed, viscosity);
                field.swap();
                let sum: f32 = field.current().iter().map(|v| v.abs()).sum();
                prop_assert!(sum.is_finite());
                sums.push(sum);
            }

            let window_peak = |from: usize| sums[from..from + 10].iter().cloned().fold(0.0f32, f32::max);
            prop_assert!(window_peak(400) <= window_peak(100));
            prop_assert!(window_peak(590) <= initial.max(1.0) * 1e-2);
        }
    }
}

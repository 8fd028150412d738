use log::info;

use crate::error::Error;
use crate::refraction;
use crate::simulation::{SimulationParams, WaveSimulation};
use crate::source_image::{OutputImage, SourceImage};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RenderMode {
    /// The source image seen through the water
    Refracted,
    /// The raw amplitudes as grey levels
    HeightMap,
}

/// An image with water on top of it.
///
/// Pokes may land at any time between frames; each `frame` advances the
/// water by exactly one step and then renders it.
pub struct RippleEffect {
    source: SourceImage,
    simulation: WaveSimulation,
}

impl RippleEffect {
    pub fn new(source: SourceImage, params: SimulationParams) -> Result<Self, Error> {
        let (width, height) = source.dimensions();
        let simulation = WaveSimulation::new(width, height, params)?;
        Ok(Self { source, simulation })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.source.dimensions()
    }

    pub fn simulation(&self) -> &WaveSimulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut WaveSimulation {
        &mut self.simulation
    }

    /// Swap in a new picture. The water is reallocated at the new size and
    /// starts out still; the current parameters carry over.
    pub fn replace_source(&mut self, source: SourceImage) -> Result<(), Error> {
        let (width, height) = source.dimensions();
        self.simulation = WaveSimulation::new(width, height, self.simulation.params())?;
        self.source = source;
        info!("height field reallocated at {}x{}", width, height);
        Ok(())
    }

    /// Disturb the water at a buffer coordinate. Off-image points are clipped.
    pub fn disturb(&mut self, x: i32, y: i32) {
        self.simulation.poke(x, y);
    }

    pub fn frame(&mut self, mode: RenderMode) -> Result<OutputImage, Error> {
        self.simulation.advance();
        match mode {
            RenderMode::Refracted => refraction::render(self.simulation.field(), &self.source),
            RenderMode::HeightMap => Ok(refraction::heightmap(self.simulation.field())),
        }
    }
}

/// Map a cursor position in window pixels onto the image buffer.
pub fn window_to_buffer(
    position: (f64, f64),
    window_size: (u32, u32),
    buffer_size: (usize, usize),
) -> (i32, i32) {
    let scale = |pos: f64, window: u32, buffer: usize| {
        if window == 0 {
            return 0;
        }
        (pos * buffer as f64 / window as f64).floor() as i32
    };
    (
        scale(position.0, window_size.0, buffer_size.0),
        scale(position.1, window_size.1, buffer_size.1),
    )
}

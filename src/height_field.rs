use crate::error::Error;

/// Wave amplitude per pixel, double buffered.
///
/// One buffer is the current state, the other is scratch for the next step.
/// `swap` flips which is which without touching the data.
pub struct HeightField {
    width: usize,
    height: usize,
    buffers: [Vec<f32>; 2],
    current: usize,
}

impl HeightField {
    pub fn new(width: usize, height: usize) -> Result<Self, Error> {
        let len = width
            .checked_mul(height)
            .filter(|len| *len > 0)
            .ok_or(Error::InvalidDimensions { width, height })?;
        Ok(Self {
            width,
            height,
            buffers: [vec![0.0; len], vec![0.0; len]],
            current: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    pub fn current(&self) -> &[f32] {
        &self.buffers[self.current]
    }

    pub fn current_mut(&mut self) -> &mut [f32] {
        &mut self.buffers[self.current]
    }

    #[cfg(test)]
    pub fn scratch(&self) -> &[f32] {
        &self.buffers[self.current ^ 1]
    }

    #[cfg(test)]
    pub fn scratch_mut(&mut self) -> &mut [f32] {
        &mut self.buffers[self.current ^ 1]
    }

    /// Current buffer for reading alongside scratch for writing.
    pub fn split_mut(&mut self) -> (&[f32], &mut [f32]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
    }
}

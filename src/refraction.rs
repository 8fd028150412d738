use crate::error::Error;
use crate::height_field::HeightField;
use crate::source_image::{OutputImage, SourceImage};

/// Amplitude at a flat index, `None` off the buffer.
#[inline]
fn amplitude(field: &[f32], index: isize) -> Option<f32> {
    usize::try_from(index).ok().and_then(|i| field.get(i)).copied()
}

/// Slope between two neighbours, truncated toward zero. An axis with a
/// neighbour off the buffer has no slope.
#[inline]
fn axis_offset(before: Option<f32>, after: Option<f32>) -> i64 {
    match (before, after) {
        (Some(before), Some(after)) => (before - after) as i64,
        _ => 0,
    }
}

/// Offset of the pixel to sample for `index`, from the local slope of the
/// water.
#[inline]
fn refraction_offset(field: &[f32], index: isize, width: isize) -> (i64, i64) {
    (
        axis_offset(amplitude(field, index - 1), amplitude(field, index + 1)),
        axis_offset(amplitude(field, index - width), amplitude(field, index + width)),
    )
}

/// Look at `source` through the current state of `field`.
///
/// Every output pixel copies the source pixel displaced by the amplitude
/// gradient around it, with alpha forced opaque. The sample index is clamped
/// to the image, so steep slopes near the edges smear the first or last
/// pixel rather than wrapping around.
pub fn render(field: &HeightField, source: &SourceImage) -> Result<OutputImage, Error> {
    if field.dimensions() != source.dimensions() {
        return Err(Error::DimensionMismatch {
            field: field.dimensions(),
            image: source.dimensions(),
        });
    }

    let (width, height) = field.dimensions();
    let current = field.current();
    let src = source.pixels();
    let last = (current.len() - 1) as i64;

    let mut pixels = Vec::with_capacity(current.len());
    for i in 0..current.len() {
        let (x_offset, y_offset) = refraction_offset(current, i as isize, width as isize);
        let sample = if x_offset == 0 && y_offset == 0 {
            i
        } else {
            let target = (i as i64)
                .saturating_add(x_offset)
                .saturating_add(y_offset.saturating_mul(width as i64));
            target.clamp(0, last) as usize
        };
        let [r, g, b, _] = src[sample];
        pixels.push([r, g, b, 255]);
    }

    Ok(OutputImage { width, height, pixels })
}

/// Grey-scale view of the current amplitudes, mid grey at rest.
pub fn heightmap(field: &HeightField) -> OutputImage {
    let pixels = field
        .current()
        .iter()
        .map(|v| {
            let level = (128.0 + v * 0.5).clamp(0.0, 255.0) as u8;
            [level, level, level, 255]
        })
        .collect();
    OutputImage {
        width: field.width(),
        height: field.height(),
        pixels,
    }
}

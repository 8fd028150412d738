use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    /// Width or height is zero, or their product does not fit in memory
    InvalidDimensions { width: usize, height: usize },
    /// Viscosity must lie in [0, 1)
    UnsupportedViscosity(f32),
    InvalidRippleSize(u32),
    NonFiniteParameter { name: &'static str, value: f32 },
    /// Height field and image disagree on size
    DimensionMismatch {
        field: (usize, usize),
        image: (usize, usize),
    },
    Image(image::ImageError),
    /// Raw RGBA buffer length doesn't match width * height * 4
    ImageBuffer { width: usize, height: usize, len: usize },
    /// Image is bigger than the largest texture the device supports
    TextureTooLarge { width: usize, height: usize, max: u32 },
    CreateSurface(wgpu::CreateSurfaceError),
    NoAdapter,
    RequestDevice(wgpu::RequestDeviceError),
    Window(winit::error::OsError),
    EventLoop(winit::error::EventLoopError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDimensions { width, height } => {
                write!(f, "invalid field dimensions {width}x{height}")
            }
            Error::UnsupportedViscosity(v) => {
                write!(f, "viscosity {v} is outside the supported range [0, 1)")
            }
            Error::InvalidRippleSize(size) => write!(f, "ripple size must be > 0, got {size}"),
            Error::NonFiniteParameter { name, value } => {
                write!(f, "{name} must be finite, got {value}")
            }
            Error::DimensionMismatch { field, image } => write!(
                f,
                "height field is {}x{} but image is {}x{}",
                field.0, field.1, image.0, image.1
            ),
            Error::Image(e) => write!(f, "image error: {e}"),
            Error::ImageBuffer { width, height, len } => write!(
                f,
                "rgba buffer of {len} bytes cannot hold a {width}x{height} image"
            ),
            Error::TextureTooLarge { width, height, max } => write!(
                f,
                "image is {width}x{height} but the graphics device allows at most {max}x{max}"
            ),
            Error::CreateSurface(e) => write!(f, "create surface: {e}"),
            Error::NoAdapter => write!(f, "no compatible graphics adapter found"),
            Error::RequestDevice(e) => write!(f, "request device: {e}"),
            Error::Window(e) => write!(f, "create window: {e}"),
            Error::EventLoop(e) => write!(f, "event loop: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Image(e) => Some(e),
            Error::CreateSurface(e) => Some(e),
            Error::RequestDevice(e) => Some(e),
            Error::Window(e) => Some(e),
            Error::EventLoop(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<wgpu::CreateSurfaceError> for Error {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        Error::CreateSurface(e)
    }
}

impl From<wgpu::RequestDeviceError> for Error {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Error::RequestDevice(e)
    }
}

impl From<winit::error::OsError> for Error {
    fn from(e: winit::error::OsError) -> Self {
        Error::Window(e)
    }
}

impl From<winit::error::EventLoopError> for Error {
    fn from(e: winit::error::EventLoopError) -> Self {
        Error::EventLoop(e)
    }
}

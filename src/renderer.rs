use std::sync::Arc;
use egui_wgpu::ScreenDescriptor;
use winit::window::Window;
use crate::egui_renderer::EguiRenderer;
use crate::error::Error;
use crate::image_renderer::{self, ImageRenderer};

pub struct GfxState<'a> {
    surface: wgpu::Surface<'a>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,

    pub image: ImageRenderer,
    pub egui_renderer: EguiRenderer,
}

impl<'a> GfxState<'a> {
    pub(crate) async fn new(
        window: Arc<Window>,
        image_width: usize,
        image_height: usize,
    ) -> Result<GfxState<'a>, Error> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;
        let adapter = instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }
        ).await.ok_or(Error::NoAdapter)?;
        let (device, queue) = adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: Default::default(),
                label: None,
                memory_hints: Default::default(),
            },
            None,
        ).await?;
        let (image_width, image_height) = image_renderer::texture_size(
            image_width,
            image_height,
            device.limits().max_texture_dimension_2d,
        )?;
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps.formats.iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let egui_renderer = EguiRenderer::new(&device, config.format, None, 1, &window);

        surface.configure(&device, &config);
        let image = ImageRenderer::new(&device, &config, image_width, image_height);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,

            image,
            egui_renderer,
        })
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor { label: Some("Render Encoder") }
        );
        self.image.render(&view, &mut encoder);
        self.render_egui(&view, &mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));

        output.present();
        Ok(())
    }

    fn render_egui(
        &mut self,
        surface_view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [self.size.width, self.size.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let window = self.window.as_ref();
        self.egui_renderer.end_frame_and_draw(
            &self.device,
            &self.queue,
            encoder,
            window,
            surface_view,
            screen_descriptor,
        );
    }
}

mod effect;
mod egui_renderer;
mod error;
mod height_field;
mod image_renderer;
mod refraction;
mod renderer;
mod simulation;
mod source_image;

use std::path::Path;
use std::sync::Arc;
use egui::Widget;
use log::{debug, error, info, warn};
use macaw::vec2;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::ElementState::Pressed;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};
use crate::effect::{RenderMode, RippleEffect};
use crate::error::Error;
use crate::renderer::GfxState;
use crate::simulation::SimulationParams;
use crate::source_image::SourceImage;

const FALLBACK_IMAGE_SIZE: (usize, usize) = (640, 480);
const FALLBACK_CELL_SIZE: usize = 32;

fn main() {
    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

#[derive(Copy, Clone)]
struct RaindropConfig {
    enabled: bool,
    delay: u32,
    ticks: u32,
}

struct App<'a> {
    window: Option<Arc<Window>>,
    renderer: Option<GfxState<'a>>,
    effect: RippleEffect,
    /// Settings panel copy, pushed into the simulation after every UI pass
    params: SimulationParams,
    render_mode: RenderMode,
    raindrop_config: RaindropConfig,
    show_settings: bool,
    setup_error: Option<Error>,
}

impl App<'_> {
    pub fn new(effect: RippleEffect) -> Self {
        Self {
            window: None,
            renderer: None,
            params: effect.simulation().params(),
            effect,
            render_mode: RenderMode::Refracted,
            raindrop_config: RaindropConfig {
                enabled: false,
                delay: 60,
                ticks: 0,
            },
            show_settings: true,
            setup_error: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Error> {
        let (width, height) = self.effect.dimensions();
        let attributes = Window::default_attributes()
            .with_title("Water Ripple")
            .with_inner_size(PhysicalSize::new(width as u32, height as u32));
        let window = Arc::new(event_loop.create_window(attributes)?);
        self.window = Some(window.clone());

        let state = pollster::block_on(
            GfxState::new(window.clone(), width, height)
        )?;
        self.renderer = Some(state);
        window.request_redraw();
        Ok(())
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        let Some(renderer) = self.renderer.as_mut() else {
            return false;
        };
        let window = renderer.window.clone();
        if renderer.egui_renderer.handle_input(&window, event).consumed {
            return true;
        }

        match event {
            WindowEvent::CursorMoved { position, .. } => {
                if renderer.egui_renderer.context().is_pointer_over_area() {
                    return false;
                }
                let size = renderer.size;
                let (x, y) = effect::window_to_buffer(
                    (position.x, position.y),
                    (size.width, size.height),
                    self.effect.dimensions(),
                );
                self.effect.disturb(x, y);
            }
            WindowEvent::DroppedFile(path) => {
                let loaded = SourceImage::open(path).and_then(|source| {
                    let (width, height) = source.dimensions();
                    let (texture_width, texture_height) = image_renderer::texture_size(
                        width,
                        height,
                        renderer.max_texture_dimension(),
                    )?;
                    self.effect.replace_source(source)?;
                    renderer.image.resize_image(&renderer.device, texture_width, texture_height);
                    Ok(())
                });
                if let Err(e) = loaded {
                    warn!("ignoring dropped file {}: {e}", path.display());
                }
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key,
                    state: Pressed,
                    repeat: false,
                    ..
                }, ..
            } => {
                match physical_key {
                    PhysicalKey::Code(KeyCode::Space) => {
                        self.render_mode = match self.render_mode {
                            RenderMode::Refracted => RenderMode::HeightMap,
                            RenderMode::HeightMap => RenderMode::Refracted,
                        }
                    }
                    PhysicalKey::Code(KeyCode::KeyS) => self.show_settings = !self.show_settings,
                    PhysicalKey::Code(KeyCode::KeyC) => self.effect.simulation_mut().reset(),
                    _ => {}
                }
            }
            _ => {}
        }
        false
    }

    pub fn render_ui(&mut self) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let context = renderer.egui_renderer.context().clone();
        let mut clear = false;
        egui::Window::new("Settings")
            .resizable(true)
            .vscroll(true)
            .default_open(false)
            .open(&mut self.show_settings)
            .show(&context, |ui| {
                ui.label("Simulation");
                egui::Slider::new(&mut self.params.ripple_size, 1..=32)
                    .integer()
                    .text("Ripple Size")
                    .ui(ui);
                egui::Slider::new(&mut self.params.strength, 0.0..=2048.0)
                    .text("Strength")
                    .ui(ui);
                egui::Slider::new(&mut self.params.viscosity, 0.0..=0.5)
                    .fixed_decimals(3)
                    .text("Viscosity")
                    .ui(ui);
                egui::Slider::new(&mut self.params.speed, simulation::MIN_SPEED..=16.0)
                    .text("Speed")
                    .ui(ui);
                ui.label(format!("Steps: {}", self.effect.simulation().steps()));
                if ui.button("Clear water").clicked() {
                    clear = true;
                }

                ui.separator();
                ui.label("Render");
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.render_mode, RenderMode::Refracted, "Refracted");
                    ui.selectable_value(&mut self.render_mode, RenderMode::HeightMap, "Height map");
                });

                ui.separator();
                ui.label("Raindrops");
                egui::Checkbox::new(&mut self.raindrop_config.enabled, "Enabled").ui(ui);
                egui::Slider::new(&mut self.raindrop_config.delay, 1..=1000).integer()
                    .text("Delay")
                    .ui(ui);
            });

        if clear {
            self.effect.simulation_mut().reset();
        }
        if let Err(e) = self.effect.simulation_mut().set_params(self.params) {
            warn!("rejected settings: {e}");
            self.params = self.effect.simulation().params();
        }
    }

    fn rain(&mut self) {
        if !self.raindrop_config.enabled {
            return;
        }
        self.raindrop_config.ticks += 1;
        if self.raindrop_config.ticks >= self.raindrop_config.delay {
            self.raindrop_config.ticks = 0;
            let drop = vec2(rand::random(), rand::random());
            debug!("raindrop at {}", drop);
            self.effect.simulation_mut().poke_normalized(drop);
        }
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_graphics(event_loop) {
                self.setup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        if self.input(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Window close button pressed: stopping");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let Some(window) = self.window.clone() else {
                    return;
                };
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.egui_renderer.begin_frame(&window);
                }
                self.render_ui();
                self.rain();

                let frame = match self.effect.frame(self.render_mode) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("frame failed: {e}");
                        event_loop.exit();
                        return;
                    }
                };

                use wgpu::SurfaceError as SE;
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };
                renderer.image.update_image(&renderer.queue, &frame);
                match renderer.render() {
                    Ok(_) => {}
                    Err(SE::Lost | SE::Outdated) => renderer.resize(renderer.size),
                    Err(SE::OutOfMemory) => {
                        log::error!("OutOfMemory");
                        event_loop.exit();
                    }
                    Err(SE::Timeout) => {
                        log::warn!("Surface timeout");
                    }
                }
                window.request_redraw();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> Result<(), Error> {
    env_logger::init();
    let source = match std::env::args_os().nth(1) {
        Some(path) => SourceImage::open(Path::new(&path))?,
        None => {
            info!("no image given, showing a checkerboard");
            let (width, height) = FALLBACK_IMAGE_SIZE;
            SourceImage::checkerboard(width, height, FALLBACK_CELL_SIZE)?
        }
    };
    let effect = RippleEffect::new(source, SimulationParams::default())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(effect);
    event_loop.run_app(&mut app)?;
    match app.setup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

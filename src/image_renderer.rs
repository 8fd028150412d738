use crate::error::Error;
use crate::source_image::OutputImage;

/// Texture extent for an image, if the device can hold it.
pub fn texture_size(width: usize, height: usize, max_dimension: u32) -> Result<(u32, u32), Error> {
    let fits = |side: usize| u32::try_from(side).ok().filter(|side| *side <= max_dimension);
    match (fits(width), fits(height)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(Error::TextureTooLarge { width, height, max: max_dimension }),
    }
}

/// Shows the CPU-rendered frame by uploading it into a texture and drawing
/// one quad over the whole surface.
pub struct ImageRenderer {
    bind_group_layout: wgpu::BindGroupLayout,
    image: ImageTextureData,
    pipeline: Pipeline2D,
}

impl ImageRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_config: &wgpu::SurfaceConfiguration,
        width: u32,
        height: u32,
    ) -> Self {
        let bind_group_layout = image_bind_group_layout(device);
        let image = ImageTextureData::new(device, &bind_group_layout, width, height);
        let pipeline = Pipeline2D::new(device, surface_config, &bind_group_layout);
        Self {
            bind_group_layout,
            image,
            pipeline,
        }
    }

    /// Reallocate the texture after the source image changed size.
    pub fn resize_image(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.image = ImageTextureData::new(device, &self.bind_group_layout, width, height);
    }

    pub fn update_image(&self, queue: &wgpu::Queue, frame: &OutputImage) {
        let size = self.image.texture_size;
        if frame.width as u32 != size.width || frame.height as u32 != size.height {
            log::warn!(
                "skipping upload: frame is {}x{}, texture is {}x{}",
                frame.width, frame.height, size.width, size.height
            );
            return;
        }
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.image.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_bytes(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
    }

    pub fn render(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        self.pipeline.render(view, encoder, &self.image.bind_group);
    }
}

fn image_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("image_texture_bind_group_layout"),
    })
}

struct ImageTextureData {
    bind_group: wgpu::BindGroup,
    texture_size: wgpu::Extent3d,
    texture: wgpu::Texture,
}

impl ImageTextureData {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        width: u32,
        height: u32,
    ) -> Self {
        let texture_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(
            &wgpu::TextureDescriptor {
                size: texture_size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                label: Some("image_texture"),
                view_formats: &[],
            }
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    }
                ],
                label: Some("image_texture_bind_group"),
            },
        );
        Self {
            bind_group,
            texture_size,
            texture,
        }
    }
}

struct Pipeline2D {
    pipeline: wgpu::RenderPipeline,
}

impl Pipeline2D {
    fn new(
        device: &wgpu::Device,
        surface_config: &wgpu::SurfaceConfiguration,
        image_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/pipeline_2d.wgsl"));
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pipeline 2D Layout"),
            bind_group_layouts: &[
                image_layout,
            ],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("2D Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline
        }
    }

    fn render(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        image_bind_group: &wgpu::BindGroup,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("2d render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.1,
                        g: 0.2,
                        b: 0.3,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, image_bind_group, &[]);
        render_pass.draw(0..4, 0..1);
    }
}

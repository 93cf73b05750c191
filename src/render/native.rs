use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use log::{info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::common::{Frame, GlobalUniform, MeshId, ObjectUniform};
use super::shared::{cube_vertices, CUBE_INDICES, SHADER};
use crate::state::SceneState;
use crate::text::Vertex;

const MSAA_SAMPLES: u32 = 4;

/// GPU renderer backed by wgpu. Meshes are uploaded once at creation; each
/// frame only rewrites uniform buffers.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    sample_count: u32,
    depth: Attachment,
    /// Multisampled color target resolved into the surface texture.
    msaa: Option<Attachment>,
    pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    meshes: HashMap<MeshId, GpuMesh>,
}

impl Renderer {
    /// Initializes the GPU for `window` and uploads every mesh in `state`.
    pub async fn new(window: Arc<Window>, state: &SceneState) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using GPU adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("glyph-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sample_count =
            sample_count(adapter.get_texture_format_features(surface_format).flags);
        info!("rendering with {sample_count}x multisampling");
        let depth = Attachment::depth(&device, config.width, config.height, sample_count);
        let msaa = Attachment::msaa_color(&device, &config, sample_count);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glyph-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = uniform_layout::<GlobalUniform>(&device, "global-bind-layout");
        let object_layout = uniform_layout::<ObjectUniform>(&device, "object-bind-layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glyph-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("glyph-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: (3 * std::mem::size_of::<f32>()) as u64,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Attachment::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        let mut meshes = HashMap::new();
        for (index, glyph) in state.glyphs.iter().enumerate() {
            let label = format!("glyph-{}", glyph.geometry.glyph());
            let mesh = GpuMesh::upload(
                &device,
                &object_layout,
                glyph.geometry.vertices(),
                glyph.geometry.indices(),
                &label,
            );
            meshes.insert(MeshId::Glyph(index), mesh);
        }
        if state.marker.is_some() {
            let mesh = GpuMesh::upload(
                &device,
                &object_layout,
                &cube_vertices(),
                CUBE_INDICES,
                "light-marker",
            );
            meshes.insert(MeshId::Marker, mesh);
        }

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            depth,
            msaa,
            pipeline,
            global_buffer,
            global_bind_group,
            meshes,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface and its depth and multisample targets. Zero
    /// sizes are ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = Attachment::depth(
            &self.device,
            new_size.width,
            new_size.height,
            self.sample_count,
        );
        self.msaa = Attachment::msaa_color(&self.device, &self.config, self.sample_count);
    }

    /// Uploads the frame's uniforms and draws every item in one pass.
    pub fn render(&mut self, frame: &Frame) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&frame.globals));
        for item in &frame.draws {
            match self.meshes.get(&item.mesh) {
                Some(mesh) => self
                    .queue
                    .write_buffer(&mesh.uniform, 0, bytes_of(&item.uniform)),
                None => warn!("no GPU mesh for {:?}", item.mesh),
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glyph-encoder"),
            });
        {
            let clear = frame.clear_color;
            let (target, resolve_target) = match &self.msaa {
                Some(msaa) => (&msaa.view, Some(&view)),
                None => (&view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.x),
                            g: f64::from(clear.y),
                            b: f64::from(clear.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            for item in &frame.draws {
                let Some(mesh) = self.meshes.get(&item.mesh) else {
                    continue;
                };
                pass.set_vertex_buffer(0, mesh.vertex.slice(..));
                pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.set_bind_group(1, &mesh.bind_group, &[]);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn uniform_layout<T>(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

/// Vertex/index buffers of one mesh plus its own uniform buffer.
struct GpuMesh {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    fn upload(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        vertices: &[Vertex],
        indices: &[u32],
        label: &str,
    ) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label}-uniform")),
            size: std::mem::size_of::<ObjectUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });
        Self {
            vertex,
            index,
            index_count: indices.len() as u32,
            uniform,
            bind_group,
        }
    }
}

/// 4x MSAA when the surface format can be multisampled and resolved.
fn sample_count(flags: wgpu::TextureFormatFeatureFlags) -> u32 {
    let resolvable = flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE);
    if resolvable && flags.sample_count_supported(MSAA_SAMPLES) {
        MSAA_SAMPLES
    } else {
        1
    }
}

/// A render attachment texture sized to the surface.
struct Attachment {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Attachment {
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn depth(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        Self::create(
            device,
            "depth-texture",
            Self::DEPTH_FORMAT,
            width,
            height,
            sample_count,
        )
    }

    /// `None` without multisampling; the pass then draws to the surface directly.
    fn msaa_color(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Option<Self> {
        (sample_count > 1).then(|| {
            Self::create(
                device,
                "msaa-color-texture",
                config.format,
                config.width,
                config.height,
                sample_count,
            )
        })
    }

    fn create(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormatFeatureFlags as Flags;

    #[test]
    fn four_samples_when_format_resolves_them() {
        assert_eq!(sample_count(Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_RESOLVE), 4);
        assert_eq!(
            sample_count(
                Flags::MULTISAMPLE_X2
                    | Flags::MULTISAMPLE_X4
                    | Flags::MULTISAMPLE_X8
                    | Flags::MULTISAMPLE_RESOLVE
            ),
            4
        );
    }

    #[test]
    fn single_sample_without_resolve_or_x4_support() {
        assert_eq!(sample_count(Flags::empty()), 1);
        assert_eq!(sample_count(Flags::MULTISAMPLE_X4), 1);
        assert_eq!(sample_count(Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_RESOLVE), 1);
    }
}

//! Forward renderer for the aquarium.
//!
//! One lit, instanced pipeline draws every [`SceneNode`] into an offscreen
//! target; the post-process pass then composites it onto the window. An
//! optional overlay (the egui panel) is drawn last.

mod camera;
#[cfg(feature = "egui")]
mod egui_integration;
mod mesh;
mod post_process;
mod shaders;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::{OrbitCamera, MAX_DISTANCE, MIN_DISTANCE, START_POSITION};
#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};
pub use mesh::{MeshData, Vertex};

use crate::config::{Lighting, Tuning};
use crate::error::GpuError;
use crate::scene::{hex_to_rgb, ModelKind, SceneNode};
use post_process::PostProcessState;
use shaders::SCENE_SHADER;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Tail sway amplitude for swimmers, in model units.
const SWAY_AMPLITUDE: f32 = 0.25;
/// Reach of the spotlight.
const SPOT_RANGE: f32 = 100.0;
const SPOT_DECAY: f32 = 2.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    directional_color: [f32; 4],
    directional_dir: [f32; 4],
    spot_color: [f32; 4],
    spot_position: [f32; 4],
    spot_cone: [f32; 4],
    background: [f32; 4],
}

impl SceneUniforms {
    pub fn new(camera: &OrbitCamera, tuning: &Tuning, elapsed: f32) -> Self {
        let lighting = &tuning.lighting;
        let light = |color: u32, intensity: f32| (hex_to_rgb(color) * intensity).extend(1.0).to_array();
        let (cos_outer, cos_inner) = spot_cone(lighting);

        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_pos: camera.position().extend(elapsed).to_array(),
            ambient: light(lighting.ambient.color, lighting.ambient.intensity),
            directional_color: light(lighting.directional.color, lighting.directional.intensity),
            directional_dir: Vec3::from_array(lighting.directional_position)
                .normalize_or(Vec3::Y)
                .extend(0.0)
                .to_array(),
            spot_color: light(lighting.spot.color, lighting.spot.intensity),
            spot_position: Vec3::from_array(lighting.spot_position)
                .extend(SPOT_RANGE)
                .to_array(),
            spot_cone: [cos_outer, cos_inner, SPOT_DECAY, 0.0],
            background: hex_to_rgb(tuning.post.background).extend(1.0).to_array(),
        }
    }
}

/// Cosines of the outer and inner cone edges. The penumbra is the fraction
/// of the cone that fades.
fn spot_cone(lighting: &Lighting) -> (f32, f32) {
    let outer = lighting.spot_angle.clamp(0.0, std::f32::consts::FRAC_PI_2);
    let inner = outer * (1.0 - lighting.spot_penumbra.clamp(0.0, 1.0));
    (outer.cos(), inner.cos())
}

/// Per-instance data for one scene node.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
    anim: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    pub fn new(node: &SceneNode, phase: Option<f32>) -> Self {
        let sway = if phase.is_some() && node.model.is_swimmer() {
            SWAY_AMPLITUDE
        } else {
            0.0
        };
        Self {
            model: node.matrix().to_cols_array_2d(),
            tint: node.tint.extend(sway).to_array(),
            anim: [phase.unwrap_or(0.0), 0.0, 0.0, 0.0],
        }
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Group instances by model so each mesh is drawn with one call.
///
/// Returns the sorted instances and, per [`ModelKind::ALL`] entry, the
/// instance range to draw.
pub fn batch_instances<'a>(
    nodes: impl Iterator<Item = (&'a SceneNode, Option<f32>)>,
) -> (Vec<InstanceRaw>, Vec<std::ops::Range<u32>>) {
    let mut buckets: Vec<Vec<InstanceRaw>> = vec![Vec::new(); ModelKind::ALL.len()];
    for (node, phase) in nodes {
        let slot = ModelKind::ALL
            .iter()
            .position(|&k| k == node.model)
            .unwrap_or(0);
        buckets[slot].push(InstanceRaw::new(node, phase));
    }

    let mut instances = Vec::new();
    let mut ranges = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let start = instances.len() as u32;
        instances.extend(bucket);
        ranges.push(start..instances.len() as u32);
    }
    (instances, ranges)
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Window surface, pipelines and per-frame buffers.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    /// Indexed like [`ModelKind::ALL`].
    meshes: Vec<GpuMesh>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    post: PostProcessState,
    pub camera: OrbitCamera,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        tracing::info!(adapter = ?adapter.get_info().name, "using GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut camera = OrbitCamera::default();
        camera.set_aspect(config.width, config.height);

        let uniforms = SceneUniforms::new(&camera, &Tuning::default(), 0.0);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout(), InstanceRaw::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Fins and petals are single-sided geometry.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let meshes = ModelKind::ALL
            .iter()
            .map(|&kind| upload_mesh(&device, kind))
            .collect();

        let instance_capacity = 64;
        let instance_buffer = create_instance_buffer(&device, instance_capacity);

        let post = PostProcessState::new(&device, config.width, config.height, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes,
            instance_buffer,
            instance_capacity,
            post,
            camera,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    /// Reconfigure the surface, offscreen targets and camera aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.post.resize(&self.device, width, height);
        self.camera.set_aspect(width, height);
        tracing::debug!(width, height, "resized");
    }

    /// Reconfigure with the current size, after the surface was lost.
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    /// Draw one frame.
    ///
    /// `nodes` pairs every node with its swim phase (`None` for props).
    /// `overlay` is called after the post-process pass with the device,
    /// queue, encoder and surface view.
    pub fn render<'a>(
        &mut self,
        nodes: impl Iterator<Item = (&'a SceneNode, Option<f32>)>,
        tuning: &Tuning,
        elapsed: f32,
        overlay: impl FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    ) -> Result<(), wgpu::SurfaceError> {
        self.camera.update();

        let uniforms = SceneUniforms::new(&self.camera, tuning, elapsed);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        self.post
            .update(&self.queue, &tuning.post, self.config.width, self.config.height);

        let (instances, ranges) = batch_instances(nodes);
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let bg = hex_to_rgb(tuning.post.background);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.post.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.x as f64,
                            g: bg.y as f64,
                            b: bg.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.post.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (mesh, range) in self.meshes.iter().zip(ranges) {
                if range.is_empty() {
                    continue;
                }
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, range);
            }
        }

        self.post.draw(&mut encoder, &view);
        overlay(&self.device, &self.queue, &mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn upload_mesh(device: &wgpu::Device, kind: ModelKind) -> GpuMesh {
    let data = MeshData::for_model(kind);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Vertex Buffer"),
        contents: bytemuck::cast_slice(&data.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Index Buffer"),
        contents: bytemuck::cast_slice(&data.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: data.indices.len() as u32,
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

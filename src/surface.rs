//! wgpu renderer surface: full-screen path tracing into ping-ponged
//! accumulation targets, then a present pass to the swapchain.

use wgpu::{
    include_wgsl, CommandEncoderDescriptor, PipelineLayoutDescriptor, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipelineDescriptor, TextureViewDescriptor,
};

use crate::application::Screen;
use crate::renderer::{
    flags, FrameUniforms, IndexBuffer, RenderSurface, UniformBuffer, Vertex, VertexBuffer,
    QUAD_INDICES, QUAD_VERTICES,
};
use crate::scene::{Sphere, MAX_CAPACITY};

const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Gamma exponent applied by the present pass; 32 bytes like `Present` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct PresentUniforms {
    exponent: f32,
    _pad: [f32; 7],
}

struct Target {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// GPU resources of the tracer. Borrow it with a [`Screen`] through
/// [`Tracer::frame`] to get a [`RenderSurface`].
pub struct Tracer {
    trace_pipeline: wgpu::RenderPipeline,
    present_pipeline: wgpu::RenderPipeline,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    frame_buffer: UniformBuffer,
    sphere_buffer: UniformBuffer,
    present_buffer: UniformBuffer,
    scene_bind_group: wgpu::BindGroup,
    history_layout: wgpu::BindGroupLayout,
    present_layout: wgpu::BindGroupLayout,
    targets: [Target; 2],
    /// Sampled by the trace pass when writing into the other target
    history_bind_groups: [wgpu::BindGroup; 2],
    present_bind_groups: [wgpu::BindGroup; 2],
    current: usize,
    surface_is_srgb: bool,
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
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
    })
}

fn create_target(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ACCUMULATION_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&TextureViewDescriptor::default());
    Target {
        _texture: texture,
        view,
    }
}

impl Tracer {
    pub fn new(screen: &Screen) -> Self {
        let device = &screen.device;
        let trace_shader = device.create_shader_module(include_wgsl!("shader/tracer.wgsl"));
        let present_shader = device.create_shader_module(include_wgsl!("shader/present.wgsl"));

        let vertex_buffer = VertexBuffer::init_immediate(
            device,
            bytemuck::cast_slice(QUAD_VERTICES),
            Some("Quad Vertex Buffer"),
        );
        let index_buffer =
            IndexBuffer::init_immediate_u16(device, QUAD_INDICES, Some("Quad Index Buffer"));

        let frame_buffer = UniformBuffer::init(
            device,
            std::mem::size_of::<FrameUniforms>() as u64,
            Some("Frame Buffer"),
        );
        let sphere_buffer = UniformBuffer::init(
            device,
            (std::mem::size_of::<Sphere>() * MAX_CAPACITY) as u64,
            Some("Sphere Buffer"),
        );
        let present_buffer = UniformBuffer::init(
            device,
            std::mem::size_of::<PresentUniforms>() as u64,
            Some("Present Buffer"),
        );

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("scene_bind_group_layout"),
        });
        let history_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[texture_entry(0, wgpu::ShaderStages::FRAGMENT)],
            label: Some("history_bind_group_layout"),
        });
        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture_entry(0, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("present_bind_group_layout"),
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sphere_buffer.buffer().as_entire_binding(),
                },
            ],
            label: Some("scene_bind_group"),
        });

        let trace_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Trace Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &history_layout],
            push_constant_ranges: &[],
        });
        let present_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&present_layout],
            push_constant_ranges: &[],
        });

        let trace_pipeline = create_pipeline(
            device,
            "Trace Pipeline",
            &trace_shader,
            &trace_layout,
            ACCUMULATION_FORMAT,
        );
        let present_pipeline = create_pipeline(
            device,
            "Present Pipeline",
            &present_shader,
            &present_pipeline_layout,
            screen.config.format,
        );

        let (targets, history_bind_groups, present_bind_groups) = Self::create_targets(
            device,
            &history_layout,
            &present_layout,
            &present_buffer,
            screen.config.width,
            screen.config.height,
        );

        Self {
            trace_pipeline,
            present_pipeline,
            vertex_buffer,
            index_buffer,
            frame_buffer,
            sphere_buffer,
            present_buffer,
            scene_bind_group,
            history_layout,
            present_layout,
            targets,
            history_bind_groups,
            present_bind_groups,
            current: 0,
            surface_is_srgb: screen.config.format.is_srgb(),
        }
    }

    #[allow(clippy::type_complexity)]
    fn create_targets(
        device: &wgpu::Device,
        history_layout: &wgpu::BindGroupLayout,
        present_layout: &wgpu::BindGroupLayout,
        present_buffer: &UniformBuffer,
        width: u32,
        height: u32,
    ) -> ([Target; 2], [wgpu::BindGroup; 2], [wgpu::BindGroup; 2]) {
        let targets = [
            create_target(device, width, height, "Accumulation Target A"),
            create_target(device, width, height, "Accumulation Target B"),
        ];
        let history = |target: &Target| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: history_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                }],
                label: Some("history_bind_group"),
            })
        };
        let present = |target: &Target| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: present_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&target.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: present_buffer.buffer().as_entire_binding(),
                    },
                ],
                label: Some("present_bind_group"),
            })
        };
        let history_bind_groups = [history(&targets[0]), history(&targets[1])];
        let present_bind_groups = [present(&targets[0]), present(&targets[1])];
        (targets, history_bind_groups, present_bind_groups)
    }

    /// Recreate the accumulation targets at the screen's current size.
    pub fn resize(&mut self, screen: &Screen) {
        let (targets, history_bind_groups, present_bind_groups) = Self::create_targets(
            &screen.device,
            &self.history_layout,
            &self.present_layout,
            &self.present_buffer,
            screen.config.width,
            screen.config.height,
        );
        self.targets = targets;
        self.history_bind_groups = history_bind_groups;
        self.present_bind_groups = present_bind_groups;
        self.current = 0;
    }

    pub fn frame<'a>(&'a mut self, screen: &'a Screen) -> TracerFrame<'a> {
        TracerFrame {
            tracer: self,
            screen,
        }
    }

    fn gamma_exponent(&self, gamma_correction: bool) -> f32 {
        match (self.surface_is_srgb, gamma_correction) {
            (true, true) | (false, false) => 1.0,
            // the swapchain encodes anyway; undo it
            (true, false) => 2.0,
            (false, true) => 0.5,
        }
    }
}

/// A [`Tracer`] bound to the screen for one frame.
pub struct TracerFrame<'a> {
    tracer: &'a mut Tracer,
    screen: &'a Screen,
}

impl RenderSurface for TracerFrame<'_> {
    type Error = wgpu::SurfaceError;

    fn draw(&mut self, uniforms: &FrameUniforms, spheres: &[u8]) -> Result<(), Self::Error> {
        let tracer = &mut *self.tracer;
        let screen = self.screen;

        tracer
            .frame_buffer
            .write(&screen.queue, bytemuck::bytes_of(uniforms));
        tracer.sphere_buffer.write(&screen.queue, spheres);
        let present = PresentUniforms {
            exponent: tracer.gamma_exponent(uniforms.has_flag(flags::GAMMA_CORRECTION)),
            _pad: [0.0; 7],
        };
        tracer
            .present_buffer
            .write(&screen.queue, bytemuck::bytes_of(&present));

        let output = screen.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&TextureViewDescriptor::default());
        let mut encoder = screen
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let current = tracer.current;
        let previous = 1 - current;
        {
            let mut trace_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Trace Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &tracer.targets[current].view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            trace_pass.set_pipeline(&tracer.trace_pipeline);
            trace_pass.set_bind_group(0, &tracer.scene_bind_group, &[]);
            trace_pass.set_bind_group(1, &tracer.history_bind_groups[previous], &[]);
            trace_pass.set_vertex_buffer(0, tracer.vertex_buffer.buffer().slice(..));
            trace_pass.set_index_buffer(
                tracer.index_buffer.buffer().slice(..),
                tracer.index_buffer.format(),
            );
            trace_pass.draw_indexed(0..tracer.index_buffer.count(), 0, 0..1);
        }
        {
            let mut present_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            present_pass.set_pipeline(&tracer.present_pipeline);
            present_pass.set_bind_group(0, &tracer.present_bind_groups[current], &[]);
            present_pass.set_vertex_buffer(0, tracer.vertex_buffer.buffer().slice(..));
            present_pass.set_index_buffer(
                tracer.index_buffer.buffer().slice(..),
                tracer.index_buffer.format(),
            );
            present_pass.draw_indexed(0..tracer.index_buffer.count(), 0, 0..1);
        }

        screen.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        tracer.current = previous;

        Ok(())
    }
}

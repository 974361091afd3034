use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::settings::RenderSettings;
use crate::viewport::Projection;

/// Shading backend driven once per frame with the camera, settings and scene.
pub trait RenderSurface {
    type Error;

    /// Shade and present one frame. `spheres` is the scene store's byte image.
    fn draw(&mut self, uniforms: &FrameUniforms, spheres: &[u8]) -> Result<(), Self::Error>;
}

pub mod flags {
    pub const SKY: u32 = 1 << 0;
    pub const GAMMA_CORRECTION: u32 = 1 << 1;
    pub const PIXEL_SAMPLING: u32 = 1 << 2;
}

/// Per-frame uniform block, 16-byte rows matching `Frame` in the tracer shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub eye: Vec3,
    pub elapsed_time: f32,

    pub pixel_dh: Vec3,
    pub max_bounce_depth: u32,

    pub pixel_dv: Vec3,
    pub frame_count: u32,

    pub pixel_origin: Vec3,
    pub samples_per_pixel: u32,

    pub blend_enabled: u32,
    pub flags: u32,
    pub sphere_count: u32,
    pub selected_index: i32,

    pub resolution: [u32; 2],
    /// Samples already averaged into the history being blended with
    pub history_samples: u32,
    _pad: u32,
}

impl FrameUniforms {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projection: &Projection,
        settings: &RenderSettings,
        elapsed_time: f32,
        frame_count: u32,
        history_samples: u32,
        blend_enabled: bool,
        sphere_count: usize,
        selected_index: i32,
    ) -> Self {
        let mut flags = 0;
        if settings.sky {
            flags |= flags::SKY;
        }
        if settings.gamma_correction {
            flags |= flags::GAMMA_CORRECTION;
        }
        if settings.pixel_sampling {
            flags |= flags::PIXEL_SAMPLING;
        }

        Self {
            eye: projection.eye,
            elapsed_time,
            pixel_dh: projection.viewport.pixel_dh,
            max_bounce_depth: settings.max_bounce_depth,
            pixel_dv: projection.viewport.pixel_dv,
            frame_count,
            pixel_origin: projection.viewport.pixel_origin,
            samples_per_pixel: settings.samples_per_pixel,
            blend_enabled: blend_enabled as u32,
            flags,
            sphere_count: sphere_count as u32,
            selected_index,
            resolution: projection.resolution.to_array(),
            history_samples,
            _pad: 0,
        }
    }

    pub fn blend_enabled(&self) -> bool {
        self.blend_enabled != 0
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Full-screen quad in clip space.
pub const QUAD_VERTICES: &[Vertex] = &[
    Vertex {
        position: [-1.0, -1.0],
    },
    Vertex {
        position: [1.0, -1.0],
    },
    Vertex {
        position: [1.0, 1.0],
    },
    Vertex {
        position: [-1.0, 1.0],
    },
];

pub const QUAD_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

pub struct VertexBuffer(wgpu::Buffer);

impl VertexBuffer {
    pub fn init_immediate<'label>(
        device: &wgpu::Device,
        content: &[u8],
        label: Option<&'label str>,
    ) -> Self {
        let init_descriptor = wgpu::util::BufferInitDescriptor {
            label,
            contents: content,
            usage: wgpu::BufferUsages::VERTEX,
        };
        let buffer = device.create_buffer_init(&init_descriptor);
        Self(buffer)
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }
}

pub struct IndexBuffer {
    buffer: wgpu::Buffer,
    format: wgpu::IndexFormat,
}

impl IndexBuffer {
    pub fn init_immediate_u16<'label>(
        device: &wgpu::Device,
        content: &[u16],
        label: Option<&'label str>,
    ) -> Self {
        let init_descriptor = wgpu::util::BufferInitDescriptor {
            label,
            contents: bytemuck::cast_slice(content),
            usage: wgpu::BufferUsages::INDEX,
        };
        let buffer = device.create_buffer_init(&init_descriptor);
        Self {
            buffer,
            format: wgpu::IndexFormat::Uint16,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn format(&self) -> wgpu::IndexFormat {
        self.format
    }

    pub fn count(&self) -> u32 {
        (self.buffer.size() / Self::format_size(self.format) as u64) as u32
    }

    /// Return the index byte size from the index format
    #[inline(always)]
    pub fn format_size(format: wgpu::IndexFormat) -> u8 {
        match format {
            wgpu::IndexFormat::Uint16 => 2,
            wgpu::IndexFormat::Uint32 => 4,
        }
    }
}

/// Fixed-size uniform buffer rewritten in place every frame.
pub struct UniformBuffer {
    buffer: wgpu::Buffer,
}

impl UniformBuffer {
    pub fn init<'label>(device: &wgpu::Device, size: u64, label: Option<&'label str>) -> Self {
        let wgt_descriptor = wgpu::BufferDescriptor {
            label,
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        };
        let buffer = device.create_buffer(&wgt_descriptor);
        Self { buffer }
    }

    /// Write `content` at the start of the buffer, truncated to its size.
    pub fn write(&self, queue: &wgpu::Queue, content: &[u8]) {
        let len = content.len().min(self.buffer.size() as usize);
        // write_buffer wants a multiple of 4 bytes
        let len = len & !3;
        if len > 0 {
            queue.write_buffer(&self.buffer, 0, &content[..len]);
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

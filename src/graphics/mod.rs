use bytemuck::{Pod, Zeroable};

pub use quilt_target::*;
pub use renderer::*;
pub use scene::*;
pub use util::*;

mod pipelines;
mod quilt_target;
mod renderer;
mod scene;
mod transform_slots;
mod util;

const NUM_OUTPUT_SAMPLES: u32 = 4;
const DEPTH_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
/// The bridge consumes RGBA quilts.
pub const QUILT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
struct Vertex {
    pos: [f32; 3],
    color: [f32; 4],
}

unsafe impl Zeroable for Vertex {}
unsafe impl Pod for Vertex {}

/// Per-draw uniforms, laid out like `Transforms` in `cube.wgsl`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct Transforms {
    proj: [f32; 16],
    view: [f32; 16],
    model: [f32; 16],
}

unsafe impl Zeroable for Transforms {}
unsafe impl Pod for Transforms {}

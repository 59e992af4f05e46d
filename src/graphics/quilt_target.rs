use super::{
    transform_slots::TransformSlots, DEPTH_TEXTURE_FORMAT, QUILT_TEXTURE_FORMAT,
};
use crate::{bridge::NativeTexture, quilt::QuiltLayout};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TEXTURE_HANDLE: AtomicU64 = AtomicU64::new(1);

/// The offscreen texture every view of the quilt is rendered into, plus the depth buffer
/// and per-view uniforms that go with it. Sized once from a layout and never resized.
pub struct QuiltTarget {
    handle: NativeTexture,
    size: (u32, u32),
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    slots: TransformSlots,
}

impl QuiltTarget {
    pub(super) fn new(
        device: &wgpu::Device,
        transform_bind_group_layout: &wgpu::BindGroupLayout,
        layout: &QuiltLayout,
    ) -> Self {
        let size = layout.texture_size();
        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quilt"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: QUILT_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quilt depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let slots = TransformSlots::new(device, transform_bind_group_layout, layout.total_views());

        Self {
            handle: NativeTexture::from_raw(NEXT_TEXTURE_HANDLE.fetch_add(1, Ordering::Relaxed)),
            size,
            texture,
            view,
            depth_view,
            slots,
        }
    }

    /// The token the bridge knows this texture by.
    pub fn handle(&self) -> NativeTexture {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub(super) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(super) fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub(super) fn slots(&self) -> &TransformSlots {
        &self.slots
    }
}

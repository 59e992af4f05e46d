use super::Transforms;
use bytemuck::bytes_of;
use std::{convert::TryFrom, mem::size_of};

pub fn create_transform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("transforms"),
        entries: &[
            // u_transforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(size_of::<Transforms>() as u64),
                },
                count: None,
            },
        ],
    })
}

/// One uniform buffer holding a `Transforms` block per draw, addressed by dynamic offset.
///
/// Every view of a quilt gets its own slot, so all of them can be written while the render
/// pass is being recorded and still be intact when it executes.
pub struct TransformSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
}

impl TransformSlots {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: u32) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let size = size_of::<Transforms>() as u64;
        let stride = (size + alignment - 1) / alignment * alignment;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("transform slots"),
            size: stride * u64::from(capacity.max(1)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("transform slots"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Uploads `transforms` into `slot` and returns the dynamic offset to bind it with.
    pub(super) fn write(&self, queue: &wgpu::Queue, slot: u32, transforms: &Transforms) -> Option<u32> {
        let offset = slot_offset(self.stride, slot, self.capacity)?;
        queue.write_buffer(&self.buffer, u64::from(offset), bytes_of(transforms));
        Some(offset)
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Byte offset of `slot`, or `None` when it is out of range or not addressable by a dynamic
/// offset.
fn slot_offset(stride: u64, slot: u32, capacity: u32) -> Option<u32> {
    if slot >= capacity {
        return None;
    }
    let offset = stride.checked_mul(u64::from(slot))?;
    u32::try_from(offset).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_stride_apart() {
        assert_eq!(slot_offset(256, 0, 45), Some(0));
        assert_eq!(slot_offset(256, 44, 45), Some(44 * 256));
        assert_eq!(slot_offset(256, 45, 45), None);
    }

    #[test]
    fn offsets_beyond_u32_are_rejected() {
        let slot = u32::MAX / 256 + 1;
        assert_eq!(slot_offset(256, slot, u32::MAX), None);
        assert_eq!(slot_offset(256, slot - 1, u32::MAX), Some((slot - 1) * 256));
    }
}

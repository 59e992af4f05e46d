use super::{
    pipelines::{create_texture_bind_group_layout, Pipelines},
    scene::{cube_indices, cube_vertices, CUBE_INDEX_COUNT},
    transform_slots::{create_transform_bind_group_layout, TransformSlots},
    util::{fit_viewport, scene_transforms, tile_viewport},
    CubeScene, QuiltTarget, Viewport, DEPTH_TEXTURE_FORMAT, NUM_OUTPUT_SAMPLES,
    QUILT_TEXTURE_FORMAT,
};
use crate::{
    bridge::NativeTexture,
    quilt::{ComposeError, ComposedFrame, PixelRect, QuiltCompositor, QuiltLayout, ViewTile},
};
use bytemuck::cast_slice;
use std::{error::Error, fmt, iter};
use wgpu::util::DeviceExt;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.06,
    g: 0.06,
    b: 0.06,
    a: 1.0,
};

/// Why a single view of the quilt could not be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderViewError {
    ViewportOutOfBounds { rect: PixelRect, target: (u32, u32) },
    SlotOutOfRange { slot: u32, capacity: u32 },
}

impl fmt::Display for RenderViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderViewError::ViewportOutOfBounds { rect, target } => write!(
                f,
                "tile {}x{} at ({}, {}) does not fit a {}x{} target",
                rect.width, rect.height, rect.x, rect.y, target.0, target.1
            ),
            RenderViewError::SlotOutOfRange { slot, capacity } => write!(
                f,
                "transform slot {} out of range (capacity {})",
                slot, capacity
            ),
        }
    }
}

impl Error for RenderViewError {}

/// What the desktop window shows.
#[derive(Clone, Copy)]
pub enum WindowContent<'a> {
    /// A conventional rendering of the scene from the center view.
    SingleView(&'a CubeScene),
    /// The last composed quilt, letterboxed.
    QuiltPreview(&'a QuiltTarget),
}

pub struct Renderer {
    multisample_texture: Option<((u32, u32), wgpu::Texture)>,
    depth_texture: Option<((u32, u32), wgpu::Texture)>,
    transform_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    window_pipelines: Pipelines,
    quilt_pipelines: Pipelines,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    window_slots: TransformSlots,
    sampler: wgpu::Sampler,
    preview_bind_group: Option<(NativeTexture, wgpu::BindGroup)>,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let transform_bind_group_layout = create_transform_bind_group_layout(device);
        let texture_bind_group_layout = create_texture_bind_group_layout(device);

        let window_pipelines = Pipelines::for_window(
            device,
            &transform_bind_group_layout,
            &texture_bind_group_layout,
            output_format,
            NUM_OUTPUT_SAMPLES,
        );
        let quilt_pipelines =
            Pipelines::for_quilt(device, &transform_bind_group_layout, QUILT_TEXTURE_FORMAT);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube vertices"),
            contents: cast_slice(&cube_vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube indices"),
            contents: cast_slice(&cube_indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let window_slots = TransformSlots::new(device, &transform_bind_group_layout, 1);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quilt preview"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            multisample_texture: None,
            depth_texture: None,
            transform_bind_group_layout,
            texture_bind_group_layout,
            window_pipelines,
            quilt_pipelines,
            vertex_buffer,
            index_buffer,
            window_slots,
            sampler,
            preview_bind_group: None,
        }
    }

    pub fn create_quilt_target(&self, device: &wgpu::Device, layout: &QuiltLayout) -> QuiltTarget {
        QuiltTarget::new(device, &self.transform_bind_group_layout, layout)
    }

    /// Renders every view of `layout` into `target` and submits the work.
    ///
    /// Nothing is submitted when a view fails, so a failed frame never reaches the
    /// texture the display reads from.
    pub fn render_quilt(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &QuiltTarget,
        scene: &CubeScene,
        compositor: &mut QuiltCompositor,
        layout: &QuiltLayout,
    ) -> Result<(ComposedFrame, wgpu::SubmissionIndex), ComposeError<RenderViewError>> {
        let target_size = target.size();
        let slots = target.slots();
        // edge tiles may be clipped, but every view is projected like a full one
        let view_aspect = layout.view_aspect();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("quilt"),
        });

        let composed = {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quilt"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_pipeline(&self.quilt_pipelines.cube);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            compositor.compose_frame(layout, |tile: &ViewTile| {
                if tile.rect.right() > target_size.0 || tile.rect.top() > target_size.1 {
                    return Err(RenderViewError::ViewportOutOfBounds {
                        rect: tile.rect,
                        target: target_size,
                    });
                }
                if tile.rect.area() == 0 {
                    return Ok(());
                }
                let viewport = tile_viewport(&tile.rect, target_size.1);
                let transforms = scene_transforms(scene, view_aspect, tile.camera_offset);
                let offset = slots.write(queue, tile.linear_index, &transforms).ok_or(
                    RenderViewError::SlotOutOfRange {
                        slot: tile.linear_index,
                        capacity: slots.capacity(),
                    },
                )?;

                set_viewport(&mut render_pass, &viewport);
                render_pass.set_bind_group(0, slots.bind_group(), &[offset]);
                render_pass.draw_indexed(0..CUBE_INDEX_COUNT, 0, 0..1);
                Ok(())
            })
        };

        let frame = composed?;
        let submission = queue.submit(iter::once(encoder.finish()));
        Ok((frame, submission))
    }

    pub fn render_window(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_view: &wgpu::TextureView,
        output_size: (u32, u32),
        output_format: wgpu::TextureFormat,
        content: WindowContent<'_>,
    ) {
        if self
            .multisample_texture
            .as_ref()
            .filter(|(size, _)| size == &output_size)
            .is_none()
        {
            self.multisample_texture = Some((
                output_size,
                create_multisample_texture(device, output_format, output_size),
            ));
        }
        if self
            .depth_texture
            .as_ref()
            .filter(|(size, _)| size == &output_size)
            .is_none()
        {
            self.depth_texture = Some((output_size, create_depth_texture(device, output_size)));
        }
        let (multisample_texture_view, depth_texture_view) =
            match (&self.multisample_texture, &self.depth_texture) {
                (Some((_, multisample)), Some((_, depth))) => (
                    multisample.create_view(&wgpu::TextureViewDescriptor::default()),
                    depth.create_view(&wgpu::TextureViewDescriptor::default()),
                ),
                _ => return,
            };

        if let WindowContent::QuiltPreview(target) = content {
            if self
                .preview_bind_group
                .as_ref()
                .filter(|(handle, _)| *handle == target.handle())
                .is_none()
            {
                self.preview_bind_group = Some((
                    target.handle(),
                    self.create_preview_bind_group(device, target),
                ));
            }
        }

        let window_offset = match content {
            WindowContent::SingleView(scene) => {
                let viewport = full_viewport(output_size);
                let transforms = scene_transforms(scene, viewport.aspect(), 0.0);
                self.window_slots.write(queue, 0, &transforms)
            }
            WindowContent::QuiltPreview(_) => None,
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("window"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("window"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &multisample_texture_view,
                    resolve_target: Some(output_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            match content {
                WindowContent::SingleView(_) => {
                    if let Some(offset) = window_offset {
                        set_viewport(&mut render_pass, &full_viewport(output_size));
                        render_pass.set_pipeline(&self.window_pipelines.cube);
                        render_pass.set_bind_group(0, self.window_slots.bind_group(), &[offset]);
                        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(
                            self.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint16,
                        );
                        render_pass.draw_indexed(0..CUBE_INDEX_COUNT, 0, 0..1);
                    }
                }
                WindowContent::QuiltPreview(target) => {
                    if let (Some(pipeline), Some((_, bind_group))) =
                        (&self.window_pipelines.preview, &self.preview_bind_group)
                    {
                        set_viewport(
                            &mut render_pass,
                            &fit_viewport(target.size(), output_size),
                        );
                        render_pass.set_pipeline(pipeline);
                        render_pass.set_bind_group(0, bind_group, &[]);
                        render_pass.draw(0..3, 0..1);
                    }
                }
            }
        }

        queue.submit(iter::once(encoder.finish()));
    }

    fn create_preview_bind_group(
        &self,
        device: &wgpu::Device,
        target: &QuiltTarget,
    ) -> wgpu::BindGroup {
        let view = target
            .texture()
            .create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quilt preview"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Drops any cached reference to a quilt texture that is about to be destroyed.
    pub fn forget_quilt_target(&mut self, handle: NativeTexture) {
        if self
            .preview_bind_group
            .as_ref()
            .filter(|(cached, _)| *cached == handle)
            .is_some()
        {
            self.preview_bind_group = None;
        }
    }
}

fn full_viewport(output_size: (u32, u32)) -> Viewport {
    Viewport {
        x: 0.0,
        y: 0.0,
        width: output_size.0 as f32,
        height: output_size.1 as f32,
    }
}

fn set_viewport(render_pass: &mut wgpu::RenderPass<'_>, viewport: &Viewport) {
    render_pass.set_viewport(
        viewport.x,
        viewport.y,
        viewport.width,
        viewport.height,
        0.0,
        1.0,
    );
    render_pass.set_scissor_rect(
        viewport.x as u32,
        viewport.y as u32,
        viewport.width as u32,
        viewport.height as u32,
    );
}

fn create_multisample_texture(
    device: &wgpu::Device,
    output_format: wgpu::TextureFormat,
    output_size: (u32, u32),
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: None,
        size: wgpu::Extent3d {
            width: output_size.0,
            height: output_size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: NUM_OUTPUT_SAMPLES,
        dimension: wgpu::TextureDimension::D2,
        format: output_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

fn create_depth_texture(device: &wgpu::Device, output_size: (u32, u32)) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: None,
        size: wgpu::Extent3d {
            width: output_size.0,
            height: output_size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: NUM_OUTPUT_SAMPLES,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_view_errors_describe_the_failure() {
        let error = RenderViewError::ViewportOutOfBounds {
            rect: PixelRect {
                x: 7000,
                y: 0,
                width: 1456,
                height: 910,
            },
            target: (7281, 8192),
        };
        assert_eq!(
            error.to_string(),
            "tile 1456x910 at (7000, 0) does not fit a 7281x8192 target"
        );

        let error = RenderViewError::SlotOutOfRange {
            slot: 45,
            capacity: 45,
        };
        assert_eq!(
            error.to_string(),
            "transform slot 45 out of range (capacity 45)"
        );
    }
}

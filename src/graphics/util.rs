use super::{Camera, CubeScene, Transforms, Viewport};
use crate::{
    geo::{perspective, shifted_look_at, Matrix4f},
    quilt::PixelRect,
};

fn to_array(matrix: &Matrix4f) -> [f32; 16] {
    let mut array = [0.0; 16];
    array.copy_from_slice(matrix.as_slice());
    array
}

pub fn camera_transforms(camera: &Camera, aspect: f32, camera_offset: f32) -> (Matrix4f, Matrix4f) {
    let proj_matrix = perspective(aspect, camera.fov_y, camera.near, camera.far);
    let view_matrix = shifted_look_at(&camera.pos(), &camera.target(), &camera.up(), camera_offset);
    (proj_matrix, view_matrix)
}

pub(super) fn scene_transforms(scene: &CubeScene, aspect: f32, camera_offset: f32) -> Transforms {
    let (proj_matrix, view_matrix) = camera_transforms(&scene.camera, aspect, camera_offset);
    Transforms {
        proj: to_array(&proj_matrix),
        view: to_array(&view_matrix),
        model: to_array(&scene.model),
    }
}

/// Converts a bottom-left based tile rectangle into a wgpu viewport on a target
/// `target_height` pixels high.
pub fn tile_viewport(rect: &PixelRect, target_height: u32) -> Viewport {
    let rect = rect.flipped(target_height);
    Viewport {
        x: rect.x as f32,
        y: rect.y as f32,
        width: rect.width as f32,
        height: rect.height as f32,
    }
}

/// The largest viewport with the aspect ratio of `content` that fits centered in `output`.
pub fn fit_viewport(content: (u32, u32), output: (u32, u32)) -> Viewport {
    let (content_width, content_height) = (content.0 as f32, content.1 as f32);
    let (output_width, output_height) = (output.0 as f32, output.1 as f32);
    let scale = (output_width / content_width).min(output_height / content_height);
    let width = content_width * scale;
    let height = content_height * scale;
    Viewport {
        x: (output_width - width) / 2.0,
        y: (output_height - height) / 2.0,
        width,
        height,
    }
}

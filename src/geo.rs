use nalgebra::{Matrix4, Point3, Vector3};

pub type Matrix4f = Matrix4<f32>;
pub type Point3f = Point3<f32>;
pub type Vector3f = Vector3<f32>;

/// nalgebra builds OpenGL style projections with depth in [-1, 1]; wgpu clips to [0, 1].
#[rustfmt::skip]
pub fn opengl_to_wgpu() -> Matrix4f {
    Matrix4f::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

pub fn perspective(aspect: f32, fov_y: f32, near: f32, far: f32) -> Matrix4f {
    opengl_to_wgpu() * Matrix4f::new_perspective(aspect, fov_y, near, far)
}

/// Right-handed look-at, shifted sideways by `offset` along the camera's own x axis.
pub fn shifted_look_at(eye: &Point3f, target: &Point3f, up: &Vector3f, offset: f32) -> Matrix4f {
    Matrix4f::new_translation(&Vector3f::new(-offset, 0.0, 0.0))
        * Matrix4f::look_at_rh(eye, target, up)
}

pub fn rotation_yaw_pitch_roll(yaw: f32, pitch: f32, roll: f32) -> Matrix4f {
    Matrix4f::new_rotation(yaw * Vector3f::y())
        * Matrix4f::new_rotation(pitch * Vector3f::x())
        * Matrix4f::new_rotation(roll * Vector3f::z())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector4;

    #[test]
    fn shift_moves_world_opposite_to_offset() {
        let eye = Point3f::new(0.0, 0.0, 5.0);
        let view = shifted_look_at(&eye, &Point3f::origin(), &Vector3f::y(), 0.5);
        let origin = view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(origin.x, -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(origin.z, -5.0, epsilon = 1e-6);
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let proj = perspective(1.0, 1.0, 0.1, 100.0);
        let near = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, -100.0, 1.0);
        assert_abs_diff_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }
}

use super::Vertex;
use crate::geo::{Matrix4f, Point3f, Vector3f};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub pos: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn pos(&self) -> Point3f {
        Point3f::new(self.pos[0], self.pos[1], self.pos[2])
    }

    pub fn target(&self) -> Point3f {
        Point3f::new(self.target[0], self.target[1], self.target[2])
    }

    pub fn up(&self) -> Vector3f {
        Vector3f::from_row_slice(&self.up)
    }
}

/// What gets drawn into every view: the cube under one camera.
#[derive(Debug, Clone)]
pub struct CubeScene {
    pub camera: Camera,
    pub model: Matrix4f,
}

pub(super) const CUBE_INDEX_COUNT: u32 = 36;

const FACE_COLORS: [[f32; 4]; 6] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
];

/// Unit cube centered at the origin, four vertices per face so every face gets a flat color.
pub(super) fn cube_vertices() -> Vec<Vertex> {
    let faces: [[[f32; 3]; 4]; 6] = [
        // front
        [
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
        ],
        // back
        [
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ],
        // left
        [
            [-0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [-0.5, 0.5, 0.5],
            [-0.5, 0.5, -0.5],
        ],
        // right
        [
            [0.5, -0.5, -0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [0.5, 0.5, -0.5],
        ],
        // bottom
        [
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, -0.5, 0.5],
            [-0.5, -0.5, 0.5],
        ],
        // top
        [
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ],
    ];

    faces
        .iter()
        .zip(FACE_COLORS.iter())
        .flat_map(|(corners, color)| {
            corners.iter().map(move |pos| Vertex {
                pos: *pos,
                color: *color,
            })
        })
        .collect()
}

pub(super) fn cube_indices() -> Vec<u16> {
    (0..6u16)
        .flat_map(|face| {
            let base = face * 4;
            vec![base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_mesh_is_consistent() {
        let vertices = cube_vertices();
        let indices = cube_indices();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len() as u32, CUBE_INDEX_COUNT);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}

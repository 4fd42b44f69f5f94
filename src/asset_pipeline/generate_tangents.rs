// Neither the country nor the landmark export carries tangents, so they are
// generated here whenever a primitive has texture coordinates.

use anyhow::bail;
use bevy_mikktspace::{generate_tangents, Geometry};

use crate::model::ModelPrimitive;

struct TangentSpace<'a>(&'a mut ModelPrimitive);

impl Geometry for TangentSpace<'_> {
    fn num_faces(&self) -> usize {
        self.0.indices.len() / 3
    }

    fn num_vertices_of_face(&self, _face: usize) -> usize {
        3
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        self.0.vertex_by_triangle_index(face, vert).position.to_array()
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        self.0.vertex_by_triangle_index(face, vert).normal.to_array()
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.0.vertex_by_triangle_index(face, vert).tex_coords.to_array()
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        // Handedness (w) is dropped; shaders rebuild the bitangent as cross(normal, tangent)
        let vertex = self.0.vertex_by_triangle_index_mut(face, vert);
        vertex.tangent = glam::Vec3::new(tangent[0], tangent[1], tangent[2]);
    }
}

impl ModelPrimitive {
    /// Generate tangents for this primitive using mikktspace algorithm
    pub fn generate_tangents(&mut self) -> anyhow::Result<()> {
        if self.indices.len() < 3 {
            bail!("No triangles to generate tangents for");
        }

        if !generate_tangents(&mut TangentSpace(self)) {
            bail!("Failed to generate tangents")
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use crate::model::{ModelPrimitive, Vertex};

    #[test]
    fn quad_tangents_follow_u_axis() {
        let corners = [
            (Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 1.0)),
            (Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 1.0)),
            (Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 0.0)),
            (Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 0.0)),
        ];

        let mut primitive = ModelPrimitive {
            index: 0,
            vertices: corners
                .iter()
                .map(|&(position, tex_coords)| Vertex {
                    position,
                    normal: Vec3::Z,
                    tex_coords,
                    tangent: Vec3::ZERO,
                })
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
            material: None,
        };

        primitive.generate_tangents().unwrap();

        for vertex in &primitive.vertices {
            assert!((vertex.tangent - Vec3::X).length() < 1e-4, "{vertex:?}");
        }
    }

    #[test]
    fn empty_primitive_is_rejected() {
        let mut primitive = ModelPrimitive {
            index: 0,
            vertices: Vec::new(),
            indices: Vec::new(),
            material: None,
        };

        assert!(primitive.generate_tangents().is_err());
    }
}

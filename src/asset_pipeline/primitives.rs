use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::{material_manager::MaterialId, model::ModelPrimitive, model::Vertex};

/// UV sphere centred on the origin. `u` wraps around the Y axis, `v` runs from the north pole
/// (v = 0, top row of an equirectangular image) to the south pole.
pub fn uv_sphere(
    radius: f32,
    width_segments: u32,
    height_segments: u32,
    material: Option<MaterialId>,
) -> ModelPrimitive {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);

    for row in 0..=height_segments {
        let v = row as f32 / height_segments as f32;
        let polar = v * PI;

        for column in 0..=width_segments {
            let u = column as f32 / width_segments as f32;
            let azimuth = u * TAU;

            let normal = Vec3::new(
                -azimuth.cos() * polar.sin(),
                polar.cos(),
                azimuth.sin() * polar.sin(),
            );

            vertices.push(Vertex {
                position: normal * radius,
                normal,
                tex_coords: Vec2::new(u, v),
                // d(position)/du, well defined at the poles too
                tangent: Vec3::new(azimuth.sin(), 0.0, azimuth.cos()),
            });
        }
    }

    let stride = width_segments + 1;
    let mut indices = Vec::new();

    for row in 0..height_segments {
        for column in 0..width_segments {
            let a = row * stride + column + 1;
            let b = row * stride + column;
            let c = (row + 1) * stride + column;
            let d = (row + 1) * stride + column + 1;

            // The pole rows collapse to a single triangle per quad
            if row != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if row != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    ModelPrimitive {
        index: 0,
        vertices,
        indices,
        material,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_lie_on_the_sphere() {
        let sphere = uv_sphere(10.0, 64, 64, None);

        assert_eq!(sphere.vertices.len(), 65 * 65);
        for vertex in &sphere.vertices {
            assert!((vertex.position.length() - 10.0).abs() < 1e-3);
            assert!(vertex.tangent.dot(vertex.normal).abs() < 1e-4);
        }
    }

    #[test]
    fn triangles_wind_outward() {
        let sphere = uv_sphere(5.0, 16, 8, None);

        for face in 0..sphere.indices.len() / 3 {
            let a = sphere.vertex_by_triangle_index(face, 0).position;
            let b = sphere.vertex_by_triangle_index(face, 1).position;
            let c = sphere.vertex_by_triangle_index(face, 2).position;

            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0, "face {face} winds inward");
        }
    }

    #[test]
    fn poles_get_one_triangle_per_column() {
        let sphere = uv_sphere(1.0, 8, 4, None);
        // 2 pole rows of 8 triangles and 2 middle rows of 16
        assert_eq!(sphere.indices.len() / 3, 8 * 2 + 16 * 2);
    }
}

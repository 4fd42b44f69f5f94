use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use gltf::buffer;
use itertools::izip;

use crate::material_manager::{MaterialId, MaterialManager};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub tangent: Vec3,
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// `None` draws with the renderer's default material.
    pub material: Option<MaterialId>,
}

impl ModelPrimitive {
    pub fn vertex_by_triangle_index(&self, face: usize, vert: usize) -> &Vertex {
        &self.vertices[self.indices[face * 3 + vert] as usize]
    }

    pub fn vertex_by_triangle_index_mut(&mut self, face: usize, vert: usize) -> &mut Vertex {
        let index = self.indices[face * 3 + vert] as usize;
        &mut self.vertices[index]
    }

    /// Area-weighted vertex normals, for meshes exported without any.
    fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let face_normal = (self.vertices[b].position - self.vertices[a].position)
                .cross(self.vertices[c].position - self.vertices[a].position);

            for index in [a, b, c] {
                normals[index] += face_normal;
            }
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.normalize_or(Vec3::Y);
        }
    }

    fn fallback_tangents(&mut self) {
        for vertex in &mut self.vertices {
            vertex.tangent = vertex.normal.any_orthonormal_vector();
        }
    }
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_primitive(name: impl Into<String>, primitive: ModelPrimitive) -> Self {
        Self {
            name: name.into(),
            primitives: vec![primitive],
        }
    }

    pub fn from_gltf(
        material_manager: &MaterialManager,
        file_name: &str,
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping {:?} primitive in {} ({})",
                    primitive.mode(),
                    model.name,
                    file_name
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| anyhow::anyhow!("Primitive without positions in {}", model.name))?
                .map(Vec3::from)
                .collect::<Vec<_>>();
            let vertex_count = positions.len();

            let normals: Option<Vec<Vec3>> = reader
                .read_normals()
                .map(|normals| normals.map(Vec3::from).collect());
            let has_normals = normals.is_some();
            let normals: Vec<Vec3> = normals.unwrap_or_else(|| vec![Vec3::ZERO; vertex_count]);

            let tex_coords: Option<Vec<Vec2>> = reader
                .read_tex_coords(0)
                .map(|tex_coords| tex_coords.into_f32().map(Vec2::from).collect());
            let has_tex_coords = tex_coords.is_some();
            let tex_coords: Vec<Vec2> =
                tex_coords.unwrap_or_else(|| vec![Vec2::ZERO; vertex_count]);

            let tangents: Option<Vec<Vec3>> = reader
                .read_tangents()
                .map(|tangents| tangents.map(|t| Vec4::from(t).xyz()).collect());
            let has_tangents = tangents.is_some();
            let tangents: Vec<Vec3> = tangents.unwrap_or_else(|| vec![Vec3::ZERO; vertex_count]);

            let vertices = izip!(positions, normals, tex_coords, tangents)
                .map(|(position, normal, tex_coords, tangent)| Vertex {
                    position,
                    normal,
                    tex_coords,
                    tangent,
                })
                .collect::<Vec<Vertex>>();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertex_count as u32).collect(),
            };

            let material =
                material_manager.resolve_gltf_material(file_name, primitive.material().index());

            let mut model_primitive = ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
                material,
            };

            if !has_normals {
                model_primitive.compute_normals();
            }

            if !has_tangents {
                let generated = has_tex_coords && model_primitive.generate_tangents().is_ok();
                if !generated {
                    model_primitive.fallback_tangents();
                }
            }

            model.primitives.push(model_primitive);
        }

        if model.primitives.is_empty() {
            return Err(anyhow::anyhow!("Mesh without primitives: {}", model.name));
        }

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_pipeline::materials::MaterialOverride;

    fn vertex(position: Vec3) -> Vertex {
        Vertex {
            position,
            normal: Vec3::ZERO,
            tex_coords: Vec2::ZERO,
            tangent: Vec3::ZERO,
        }
    }

    #[test]
    fn computed_normals_face_ccw_front() {
        let mut primitive = ModelPrimitive {
            index: 0,
            vertices: vec![vertex(Vec3::ZERO), vertex(Vec3::X), vertex(Vec3::Y)],
            indices: vec![0, 1, 2],
            material: None,
        };

        primitive.compute_normals();

        for vertex in &primitive.vertices {
            assert_eq!(vertex.normal, Vec3::Z);
        }
    }

    #[test]
    fn fallback_tangents_are_perpendicular() {
        let mut primitive = ModelPrimitive {
            index: 0,
            vertices: vec![Vertex {
                normal: Vec3::new(0.0, 0.6, 0.8),
                ..vertex(Vec3::ZERO)
            }],
            indices: vec![],
            material: None,
        };

        primitive.fallback_tangents();

        let vertex = primitive.vertices[0];
        assert!(vertex.tangent.dot(vertex.normal).abs() < 1e-5);
        assert!((vertex.tangent.length() - 1.0).abs() < 1e-5);
    }

    // One triangle, no material, positions in an embedded buffer
    const BARE_TRIANGLE: &str = r#"{
        "asset": { "version": "2.0" },
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "nodes": [{ "mesh": 0 }],
        "scenes": [{ "nodes": [0] }]
    }"#;

    #[test]
    fn materialless_landmark_primitive_is_recoloured() {
        let (document, buffers, images) = gltf::import_slice(BARE_TRIANGLE.as_bytes()).unwrap();
        let recolour = MaterialOverride::from_hex(0xaba196, 0.5, 0.2);

        let mut materials = MaterialManager::new();
        materials.load_all_materials_from_gltf(
            "Monserrate.glb",
            &document,
            &images,
            Some(recolour),
        );

        let mesh = document.meshes().next().unwrap();
        let model =
            Model::from_gltf(&materials, "Monserrate.glb", "Monserrate", mesh, &buffers).unwrap();

        let material = model.primitives[0]
            .material
            .and_then(|id| materials.get(id))
            .unwrap();
        assert_eq!(material.base_color_factor, recolour.base_color_factor);
        assert_eq!(material.metallic, 0.5);
        assert_eq!(material.roughness, 0.2);
    }

    #[test]
    fn materialless_primitive_without_override_uses_renderer_default() {
        let (document, buffers, images) = gltf::import_slice(BARE_TRIANGLE.as_bytes()).unwrap();

        let mut materials = MaterialManager::new();
        materials.load_all_materials_from_gltf("colombia.glb", &document, &images, None);

        let mesh = document.meshes().next().unwrap();
        let model =
            Model::from_gltf(&materials, "colombia.glb", "colombia", mesh, &buffers).unwrap();

        assert!(model.primitives[0].material.is_none());
        // Computed from the CCW winding
        assert_eq!(model.primitives[0].vertices[0].normal, Vec3::Z);
    }
}

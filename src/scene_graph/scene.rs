use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::HashMap;

use crate::material_manager::MaterialManager;
use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GltfMeshKey {
    file_name: String,
    mesh_index: usize,
}

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<GltfMeshKey, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Adds `model` and an object that draws it, optionally under `parent`.
    pub fn spawn_model(
        &mut self,
        name: impl Into<String>,
        model: Model,
        parent: Option<ObjectId>,
    ) -> ObjectId {
        let model_id = self.add_model(SceneModel::new(model));
        let object_id = self.add_object(Object3D::named(name).with_model(model_id));

        if parent.is_some() {
            self.set_object_parent(object_id, parent);
        }

        object_id
    }

    /// Spawns every root node of a glTF scene as a child of `parent`.
    pub fn spawn_gltf_scene(
        &mut self,
        material_manager: &MaterialManager,
        file_name: &str,
        buffers: Buffers,
        scene: &gltf::Scene,
        parent: Option<ObjectId>,
    ) -> anyhow::Result<Vec<ObjectId>> {
        scene
            .nodes()
            .map(|node| self.spawn_gltf_node(material_manager, file_name, buffers, &node, parent))
            .collect()
    }

    fn spawn_gltf_node(
        &mut self,
        material_manager: &MaterialManager,
        file_name: &str,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
    ) -> anyhow::Result<ObjectId> {
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        let mut object = Object3D::named(node_name.clone());
        let (translation, rotation, scale) = node.transform().decomposed();

        object.transform.set_transform(
            translation.into(),
            Quat::from_array(rotation),
            scale.into(),
        );

        if let Some(mesh) = node.mesh() {
            let key = GltfMeshKey {
                file_name: file_name.to_string(),
                mesh_index: mesh.index(),
            };

            let model_id = match self.gltf_mesh_to_model.get(&key).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model =
                        Model::from_gltf(material_manager, file_name, mesh_name, mesh, buffers)?;
                    let model_id = self.add_model(SceneModel::new(model));
                    self.gltf_mesh_to_model.insert(key, model_id);

                    model_id
                }
            };

            object.model_id = Some(model_id);
        }

        let object_id = self.add_object(object);

        if parent.is_some() {
            self.set_object_parent(object_id, parent);
        }

        for child in node.children() {
            self.spawn_gltf_node(material_manager, file_name, buffers, &child, Some(object_id))?;
        }

        Ok(object_id)
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY, false);
        }
    }

    fn update_object_transform_recursive(
        &self,
        object_id: ObjectId,
        parent_world_matrix: Mat4,
        parent_changed: bool,
    ) {
        let Some(object) = self.objects.get(object_id) else {
            return;
        };

        let changed = parent_changed || object.transform.is_world_dirty();
        if changed {
            let local_matrix = *object.transform.get_local_matrix();
            object
                .transform
                .set_world_matrix(parent_world_matrix * local_matrix);
        }

        let world_matrix = *object.transform.get_world_matrix();
        for &child_id in &object.child_ids {
            self.update_object_transform_recursive(child_id, world_matrix, changed);
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;
            child.transform.invalidate_world();
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    pub fn set_object_visible(&mut self, object_id: ObjectId, visible: bool) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.visible = visible;
        }
    }

    /// An object is drawn only if it and every ancestor are visible.
    pub fn is_visible_in_hierarchy(&self, object_id: ObjectId) -> bool {
        let mut current = self.objects.get(object_id);

        while let Some(object) = current {
            if !object.visible {
                return false;
            }
            current = object.parent(self);
        }

        true
    }

    pub fn early_update(&mut self) {
        for (_, object) in self.objects.iter() {
            object.transform.reset_flags();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

use id_arena::Id;

use crate::{model::Model, rendering::render_model::RenderModelId};

pub type SceneModelId = Id<SceneModel>;

pub struct SceneModel {
    pub model: Model,
    /// Set once the renderer has uploaded the model.
    pub render_model: Option<RenderModelId>,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            render_model: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }
}

use id_arena::Id;

use crate::model::Model;

pub type SceneModelId = Id<SceneModel>;

#[derive(Debug)]
pub struct SceneModel {
    pub model: Model,
    /// Number of objects referencing this model.
    pub users: usize,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        Self { model, users: 0 }
    }
}

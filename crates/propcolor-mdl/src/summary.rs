//! Printable overview of a loaded model.

use crate::StudioModel;

/// The parts of a model that matter when choosing which materials to add.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelSummary {
    pub name: String,
    pub version: i32,
    pub checksum: i32,
    pub length: usize,
    pub textures: Vec<String>,
    pub texture_dirs: Vec<String>,
    pub num_skin_ref: usize,
    pub skin_families: Vec<Vec<i16>>,
    pub surface_prop: String,
    pub key_values: String,
}

impl From<&StudioModel> for ModelSummary {
    fn from(model: &StudioModel) -> Self {
        let header = model.header();

        Self {
            name: header.name(),
            version: header.version,
            checksum: header.checksum,
            length: model.original_bytes().len(),
            textures: model.texture_names().to_vec(),
            texture_dirs: model.texture_dirs().to_vec(),
            num_skin_ref: model.num_skin_ref(),
            skin_families: model.skin_families().to_vec(),
            surface_prop: model.surface_prop().to_string(),
            key_values: String::from_utf8_lossy(model.key_values()).into_owned(),
        }
    }
}

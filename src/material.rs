use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Mesh,
    Line,
}

/// One entry of the serialized material table. Consumers address materials
/// purely by index, so the emitted order must match assignment order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialRecord {
    pub kind: MaterialKind,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// Interns material descriptors and hands out stable indices. Append-only
/// for the duration of one export; deduplication is exact-key match on
/// (kind, color, transparency).
#[derive(Default)]
pub struct MaterialTable {
    indices: HashMap<(MaterialKind, String, u8), usize>,
    materials: Vec<MaterialRecord>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_material_index(&mut self, color: &str, transparency: u8) -> usize {
        self.index_of(MaterialKind::Mesh, color, transparency)
    }

    pub fn line_material_index(&mut self, color: &str, transparency: u8) -> usize {
        self.index_of(MaterialKind::Line, color, transparency)
    }

    fn index_of(&mut self, kind: MaterialKind, color: &str, transparency: u8) -> usize {
        if let Some(&index) = self.indices.get(&(kind, color.to_string(), transparency)) {
            return index;
        }

        let index = self.materials.len();
        self.indices
            .insert((kind, color.to_string(), transparency), index);
        self.materials.push(MaterialRecord {
            kind,
            color: color.to_string(),
            opacity: opacity(transparency),
        });

        index
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Descriptors in assignment order.
    pub fn descriptors(&self) -> &[MaterialRecord] {
        &self.materials
    }
}

/// Opacity derived from a transparency percentage; fully opaque materials
/// omit the field.
pub fn opacity(transparency: u8) -> Option<f64> {
    (transparency > 0).then(|| 1.0 - f64::from(transparency) / 100.0)
}

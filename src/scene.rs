use crate::{material::MaterialRecord, math::MapTransform};
use serde::Serialize;

/// The world header written once at the start of chunk 0. Scene height,
/// scale and Z scale are derived by the consumer:
/// `height = width * (ymax - ymin) / (xmax - xmin)`,
/// `scale = width / (xmax - xmin)`, `z_scale = scale * z_exaggeration`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorldRecord {
    pub map_extent: [f64; 4],
    pub width: f64,
    pub z_exaggeration: f64,
    pub z_shift: f64,
}

impl WorldRecord {
    pub fn from_transform(transform: &MapTransform) -> Self {
        Self {
            map_extent: transform.extent().as_array(),
            width: transform.plane_width(),
            z_exaggeration: transform.vertical_exaggeration(),
            z_shift: transform.vertical_shift(),
        }
    }
}

/// Placement of one terrain mesh within the scene plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlaneRect {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Reference to the image draped over a terrain tile.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextureRef {
    /// Base64-encoded PNG data embedded in the record.
    Inline { data: String },
    /// Path of an image file written next to the chunks.
    File { path: String },
    None,
}

/// Side-wall options of a simple-mode terrain plate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SideOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// One emitted terrain mesh: grid shape, plane placement, display options,
/// elevation samples in row-major order, and its texture.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileRecord {
    pub width: u32,
    pub height: u32,
    pub plane: PlaneRect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<SideOptions>,
    pub data: Vec<f64>,
    pub texture: TextureRef,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

/// One vector geometry part in scene space. Points carry a single ring with
/// a single vertex, lines one ring of vertices, polygons the outer ring
/// followed by its holes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub kind: GeometryKind,
    pub coordinates: Vec<Vec<[f64; 3]>>,
    pub material: usize,
}

/// A line of the chunked record stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneRecord {
    World(WorldRecord),
    Dem(TileRecord),
    Feature(FeatureRecord),
    Materials { materials: Vec<MaterialRecord> },
}

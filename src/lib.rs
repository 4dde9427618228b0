//! Exports a bounded region of map data — one elevation raster plus vector
//! layers — into a chunked 3D scene description for a browser-side renderer.
//!
//! The terrain is either a single elevation grid over the full map extent,
//! or an adaptive quadtree tiling: tiles intersecting a focus area are
//! subdivided to the target resolution while the rest of the map stays
//! coarse. Tiles of different resolution meet without cracks because each
//! finer tile re-interpolates its boundary samples against its coarser
//! neighbors, and the uniform-resolution interior block is merged into one
//! mesh with a single composite texture.
//!
//! Map data comes in through collaborator traits ([`source::ElevationSource`],
//! [`vector::FeatureSource`], [`source::MapRasterizer`]); the produced scene
//! leaves through a [`writer::SceneWriter`] as a stream of records split
//! across one or more chunks.

pub mod config;
pub mod material;
pub mod math;
pub mod quadtree;
pub mod resample;
pub mod result;
pub mod scene;
pub mod source;
pub mod stitch;
pub mod terrain;
pub mod unify;
pub mod vector;
pub mod writer;

/// Reports a completion fraction in `[0, 1]`. Returning `false` requests a
/// cooperative stop: the running export unwinds without emitting the
/// in-flight tile and ends with [`result::ExportOutcome::Cancelled`].
pub type ProgressCallback<'a> = dyn Fn(f64) -> bool + 'a;

pub(crate) fn report(progress: Option<&ProgressCallback>, completion: f64) -> bool {
    progress.is_none_or(|progress| progress(completion))
}

pub mod prelude {
    pub use crate::{
        config::{DemConfig, DemMode, DemSurface, TextureMode},
        material::MaterialTable,
        math::{Extent, MapTransform, WorldConfig},
        quadtree::QuadTree,
        result::{ExportError, ExportOutcome, ExportResult},
        scene::WorldRecord,
        source::{CrsTransform, ElevationSource, FlatElevation, IdentityCrs, MapRasterizer},
        terrain::TerrainExporter,
        vector::{Feature, FeatureSource, Geometry, VectorExporter, VectorLayer, VectorStyle},
        writer::{FileSceneSink, MemorySceneSink, SceneSink, SceneWriter},
        ProgressCallback,
    };
}

use crate::{math::Extent, result::ExportResult};
use glam::DVec2;
use image::RgbaImage;

/// Affine raster transform in the six-element layout
/// `[x_origin, x_res, 0, y_origin, 0, -y_res]`.
pub type GeoTransform = [f64; 6];

/// Answers elevation queries for one raster source. Implementations must be
/// deterministic: identical inputs yield identical samples.
pub trait ElevationSource {
    /// Samples a `width` x `height` grid of elevation points described by
    /// the geotransform, in row-major order starting at the north-west
    /// corner.
    fn sample_grid(
        &self,
        width: usize,
        height: usize,
        crs_wkt: &str,
        geo_transform: GeoTransform,
    ) -> ExportResult<Vec<f64>>;

    /// Samples the elevation at a single map-space position.
    fn sample_value(&self, crs_wkt: &str, x: f64, y: f64) -> ExportResult<f64>;
}

/// Stands in when no elevation layer is configured. Every query reads zero.
pub struct FlatElevation;

impl ElevationSource for FlatElevation {
    fn sample_grid(
        &self,
        width: usize,
        height: usize,
        _crs_wkt: &str,
        _geo_transform: GeoTransform,
    ) -> ExportResult<Vec<f64>> {
        Ok(vec![0.0; width * height])
    }

    fn sample_value(&self, _crs_wkt: &str, _x: f64, _y: f64) -> ExportResult<f64> {
        Ok(0.0)
    }
}

/// Renders the map at a given extent into a pixel buffer.
pub trait MapRasterizer {
    fn render_to_image(&self, extent: &Extent, width: u32, height: u32)
        -> ExportResult<RgbaImage>;
}

/// Reprojects points from a layer's source CRS into the scene CRS.
pub trait CrsTransform {
    fn transform(&self, point: DVec2) -> DVec2;
}

/// For layers already in the scene CRS.
pub struct IdentityCrs;

impl CrsTransform for IdentityCrs {
    fn transform(&self, point: DVec2) -> DVec2 {
        point
    }
}

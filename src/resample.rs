use crate::{
    math::{Extent, MapTransform},
    result::{ExportError, ExportResult},
    source::{ElevationSource, GeoTransform},
};
use log::debug;
use ndarray::Array2;

/// A row-major elevation grid. Row 0 is the north edge, matching the
/// point-registered geotransform the grid was sampled with.
pub struct DemGrid {
    values: Array2<f64>,
}

impl DemGrid {
    pub fn from_values(width: usize, height: usize, values: Vec<f64>) -> ExportResult<Self> {
        let values = Array2::from_shape_vec((height, width), values).map_err(|_| {
            ExportError::SourceRead("elevation grid does not match the requested size".into())
        })?;

        Ok(Self { values })
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[(y, x)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        self.values[(y, x)] = value;
    }

    pub(crate) fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// The samples in row-major order, as they appear in a tile record.
    pub fn into_values(self) -> Vec<f64> {
        self.values.into_iter().collect()
    }
}

/// Geotransform placing `width` x `height` elevation *points* over the
/// extent edge-to-edge: the origin is shifted half a pixel outwards so the
/// first and last grid points sit exactly on the extent boundary.
pub fn point_geotransform(extent: &Extent, width: usize, height: usize) -> GeoTransform {
    let x_res = extent.width() / (width - 1) as f64;
    let y_res = extent.height() / (height - 1) as f64;

    [
        extent.xmin() - x_res / 2.0,
        x_res,
        0.0,
        extent.ymax() + y_res / 2.0,
        0.0,
        -y_res,
    ]
}

/// Samples one tile's elevation grid and applies the vertical shift and
/// exaggeration. The neutral cases are skipped, which does not change the
/// result.
pub fn resample(
    elevation: &dyn ElevationSource,
    extent: &Extent,
    width: usize,
    height: usize,
    crs_wkt: &str,
    transform: &MapTransform,
) -> ExportResult<DemGrid> {
    if width < 2 || height < 2 {
        return Err(ExportError::GridTooSmall);
    }

    let geo_transform = point_geotransform(extent, width, height);
    let mut values = elevation.sample_grid(width, height, crs_wkt, geo_transform)?;

    if values.len() != width * height {
        return Err(ExportError::SourceRead(format!(
            "expected {} elevation samples, got {}",
            width * height,
            values.len()
        )));
    }

    if transform.vertical_shift() != 0.0 {
        for value in &mut values {
            *value += transform.vertical_shift();
        }
    }
    if transform.multiplier_z() != 1.0 {
        for value in &mut values {
            *value *= transform.multiplier_z();
        }
    }

    debug!("resampled dem: {width} x {height}, geotransform {geo_transform:?}");

    DemGrid::from_values(width, height, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::WorldConfig, source::FlatElevation};

    #[test]
    fn geotransform_is_point_registered() {
        let extent = Extent::new(0.0, 0.0, 100.0, 50.0).unwrap();
        let geo_transform = point_geotransform(&extent, 11, 11);

        // 10 intervals over the extent, origin half a pixel outwards
        assert_eq!(geo_transform, [-5.0, 10.0, 0.0, 52.5, 0.0, -5.0]);
    }

    #[test]
    fn flat_source_with_shift_and_exaggeration() {
        let extent = Extent::new(0.0, 0.0, 100.0, 100.0).unwrap();
        // plane_width 200 over width 100 doubles, exaggeration 1 keeps z x2
        let world = WorldConfig {
            plane_width: 200.0,
            vertical_exaggeration: 1.0,
            vertical_shift: 5.0,
        };
        let transform = MapTransform::new(extent, &world);

        let grid = resample(&FlatElevation, &extent, 5, 5, "", &transform).unwrap();

        assert!(grid.into_values().into_iter().all(|value| value == 10.0));
    }

    #[test]
    fn short_sample_response_is_an_error() {
        struct Short;

        impl ElevationSource for Short {
            fn sample_grid(
                &self,
                _width: usize,
                _height: usize,
                _crs_wkt: &str,
                _geo_transform: GeoTransform,
            ) -> ExportResult<Vec<f64>> {
                Ok(vec![0.0; 3])
            }

            fn sample_value(&self, _crs_wkt: &str, _x: f64, _y: f64) -> ExportResult<f64> {
                Ok(0.0)
            }
        }

        let extent = Extent::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let transform = MapTransform::new(extent, &WorldConfig::default());

        assert!(matches!(
            resample(&Short, &extent, 5, 5, "", &transform),
            Err(ExportError::SourceRead(_))
        ));
    }
}

use crate::math::Extent;
use glam::DVec3;

/// Scene-space shaping parameters for one export.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Width of the scene plane the map extent is scaled onto.
    pub plane_width: f64,
    pub vertical_exaggeration: f64,
    pub vertical_shift: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            plane_width: 100.0,
            vertical_exaggeration: 1.0,
            vertical_shift: 0.0,
        }
    }
}

/// Maps map-space coordinates into scene space. The extent is centered on
/// the origin in X/Y and the aspect ratio is preserved:
/// `plane_height = plane_width * extent.height / extent.width`.
///
/// Derived once per export run and read-only afterwards.
#[derive(Clone, Copy, Debug)]
pub struct MapTransform {
    extent: Extent,
    plane_width: f64,
    plane_height: f64,
    vertical_exaggeration: f64,
    vertical_shift: f64,
    multiplier: f64,
    multiplier_z: f64,
}

impl MapTransform {
    pub fn new(extent: Extent, world: &WorldConfig) -> Self {
        let multiplier = world.plane_width / extent.width();

        Self {
            extent,
            plane_width: world.plane_width,
            plane_height: world.plane_width * extent.height() / extent.width(),
            vertical_exaggeration: world.vertical_exaggeration,
            vertical_shift: world.vertical_shift,
            multiplier,
            multiplier_z: multiplier * world.vertical_exaggeration,
        }
    }

    pub fn transform(&self, x: f64, y: f64, z: f64) -> DVec3 {
        DVec3::new(
            (x - self.extent.xmin()) * self.multiplier - self.plane_width / 2.0,
            (y - self.extent.ymin()) * self.multiplier - self.plane_height / 2.0,
            (z + self.vertical_shift) * self.multiplier_z,
        )
    }

    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.transform(point.x, point.y, point.z)
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn plane_width(&self) -> f64 {
        self.plane_width
    }

    pub fn plane_height(&self) -> f64 {
        self.plane_height
    }

    pub fn vertical_exaggeration(&self) -> f64 {
        self.vertical_exaggeration
    }

    pub fn vertical_shift(&self) -> f64 {
        self.vertical_shift
    }

    pub fn multiplier_z(&self) -> f64 {
        self.multiplier_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_onto_the_centered_plane() {
        let extent = Extent::new(10.0, 20.0, 210.0, 120.0).unwrap();
        let transform = MapTransform::new(extent, &WorldConfig::default());

        assert_eq!(transform.plane_width(), 100.0);
        assert_eq!(transform.plane_height(), 50.0);

        let sw = transform.transform(10.0, 20.0, 0.0);
        let ne = transform.transform(210.0, 120.0, 0.0);

        assert!((sw.x - -50.0).abs() < 1e-12);
        assert!((sw.y - -25.0).abs() < 1e-12);
        assert!((ne.x - 50.0).abs() < 1e-12);
        assert!((ne.y - 25.0).abs() < 1e-12);
    }

    #[test]
    fn elevation_is_shifted_then_exaggerated() {
        let extent = Extent::new(0.0, 0.0, 100.0, 100.0).unwrap();
        let world = WorldConfig {
            plane_width: 200.0,
            vertical_exaggeration: 3.0,
            vertical_shift: 5.0,
        };
        let transform = MapTransform::new(extent, &world);

        // multiplier = 2, multiplier_z = 6
        assert_eq!(transform.transform(0.0, 0.0, 10.0).z, 90.0);
    }
}

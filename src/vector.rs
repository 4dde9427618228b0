use crate::{
    material::MaterialTable,
    math::{Extent, MapTransform},
    report,
    result::{ExportOutcome, ExportResult},
    scene::{FeatureRecord, GeometryKind},
    source::{CrsTransform, ElevationSource},
    writer::SceneWriter,
    ProgressCallback,
};
use glam::DVec3;
use log::warn;

/// One vector feature in its layer's source CRS. Multi-geometries carry all
/// their parts; each part is exported as an independent record.
pub struct Feature {
    pub geometry: Geometry,
    /// Height offset for this feature, already evaluated from its
    /// attributes by the provider.
    pub relative_height: f64,
}

pub struct PolygonRings {
    pub outer: Vec<DVec3>,
    pub holes: Vec<Vec<DVec3>>,
}

pub enum Geometry {
    Points(Vec<DVec3>),
    Lines(Vec<Vec<DVec3>>),
    Polygons(Vec<PolygonRings>),
}

/// Yields the features of one layer, restricted to the map extent.
pub trait FeatureSource {
    fn features(&self, extent: &Extent) -> ExportResult<Vec<Feature>>;
}

/// Where a feature's vertices take their height from. The per-feature
/// relative height is added in every mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeightMode {
    /// Z values embedded in the geometry.
    EmbeddedZ,
    /// Terrain surface elevation looked up at each vertex.
    RelativeToSurface,
    /// The relative height alone; the geometry stays flat.
    Absolute,
}

#[derive(Clone, Debug)]
pub struct PointStyle {
    pub color: String,
    pub transparency: u8,
    pub height: HeightMode,
}

#[derive(Clone, Debug)]
pub struct LineStyle {
    pub color: String,
    pub transparency: u8,
    pub height: HeightMode,
}

#[derive(Clone, Debug)]
pub struct PolygonStyle {
    pub color: String,
    pub transparency: u8,
    pub height: HeightMode,
}

/// Per-layer style, one variant per supported geometry kind. Raster/image
/// layers have no representation here; they are not supported.
#[derive(Clone, Debug)]
pub enum VectorStyle {
    Point(PointStyle),
    Line(LineStyle),
    Polygon(PolygonStyle),
}

impl VectorStyle {
    fn kind(&self) -> GeometryKind {
        match self {
            VectorStyle::Point(_) => GeometryKind::Point,
            VectorStyle::Line(_) => GeometryKind::Line,
            VectorStyle::Polygon(_) => GeometryKind::Polygon,
        }
    }

    fn color(&self) -> &str {
        match self {
            VectorStyle::Point(style) => &style.color,
            VectorStyle::Line(style) => &style.color,
            VectorStyle::Polygon(style) => &style.color,
        }
    }

    fn transparency(&self) -> u8 {
        match self {
            VectorStyle::Point(style) => style.transparency,
            VectorStyle::Line(style) => style.transparency,
            VectorStyle::Polygon(style) => style.transparency,
        }
    }

    fn height(&self) -> HeightMode {
        match self {
            VectorStyle::Point(style) => style.height,
            VectorStyle::Line(style) => style.height,
            VectorStyle::Polygon(style) => style.height,
        }
    }
}

/// One vector layer to export: its style, its feature provider, and the
/// transform from its CRS into the scene CRS.
pub struct VectorLayer<'a> {
    pub style: VectorStyle,
    pub source: &'a dyn FeatureSource,
    pub crs: &'a dyn CrsTransform,
}

/// Walks vector layers and emits one record per geometry part, with
/// vertices mapped into scene space and ring winding normalized for the
/// renderer: the outer ring keeps its winding, every hole ring is reversed.
pub struct VectorExporter<'a> {
    transform: &'a MapTransform,
    elevation: &'a dyn ElevationSource,
    crs_wkt: &'a str,
}

impl<'a> VectorExporter<'a> {
    pub fn new(
        transform: &'a MapTransform,
        elevation: &'a dyn ElevationSource,
        crs_wkt: &'a str,
    ) -> Self {
        Self {
            transform,
            elevation,
            crs_wkt,
        }
    }

    pub fn export_layers(
        &self,
        layers: &[VectorLayer],
        writer: &mut SceneWriter,
        materials: &mut MaterialTable,
        progress: Option<&ProgressCallback>,
    ) -> ExportResult<ExportOutcome> {
        for (index, layer) in layers.iter().enumerate() {
            if !report(progress, index as f64 / layers.len() as f64) {
                return Ok(ExportOutcome::Cancelled);
            }

            self.export_layer(layer, writer, materials)?;
        }

        report(progress, 1.0);

        Ok(ExportOutcome::Completed)
    }

    pub fn export_layer(
        &self,
        layer: &VectorLayer,
        writer: &mut SceneWriter,
        materials: &mut MaterialTable,
    ) -> ExportResult<()> {
        let material = match layer.style {
            VectorStyle::Line(_) => {
                materials.line_material_index(layer.style.color(), layer.style.transparency())
            }
            _ => materials.mesh_material_index(layer.style.color(), layer.style.transparency()),
        };

        let height = layer.style.height();

        for feature in layer.source.features(self.transform.extent())? {
            match (&layer.style, &feature.geometry) {
                (VectorStyle::Point(_), Geometry::Points(points)) => {
                    for &point in points {
                        let vertex =
                            self.scene_vertex(height, feature.relative_height, layer.crs, point)?;
                        writer.write_feature(FeatureRecord {
                            kind: GeometryKind::Point,
                            coordinates: vec![vec![vertex]],
                            material,
                        })?;
                    }
                }
                (VectorStyle::Line(_), Geometry::Lines(lines)) => {
                    for line in lines {
                        let vertices =
                            self.scene_ring(height, feature.relative_height, layer.crs, line)?;
                        writer.write_feature(FeatureRecord {
                            kind: GeometryKind::Line,
                            coordinates: vec![vertices],
                            material,
                        })?;
                    }
                }
                (VectorStyle::Polygon(_), Geometry::Polygons(polygons)) => {
                    for polygon in polygons {
                        let mut rings = Vec::with_capacity(1 + polygon.holes.len());
                        rings.push(self.scene_ring(
                            height,
                            feature.relative_height,
                            layer.crs,
                            &polygon.outer,
                        )?);

                        for hole in &polygon.holes {
                            let mut ring =
                                self.scene_ring(height, feature.relative_height, layer.crs, hole)?;
                            // counter the outer ring's direction for face culling
                            ring.reverse();
                            rings.push(ring);
                        }

                        writer.write_feature(FeatureRecord {
                            kind: GeometryKind::Polygon,
                            coordinates: rings,
                            material,
                        })?;
                    }
                }
                _ => {
                    warn!(
                        "skipping feature whose geometry does not match the {:?} layer style",
                        layer.style.kind()
                    );
                }
            }
        }

        Ok(())
    }

    fn scene_ring(
        &self,
        height: HeightMode,
        relative_height: f64,
        crs: &dyn CrsTransform,
        ring: &[DVec3],
    ) -> ExportResult<Vec<[f64; 3]>> {
        ring.iter()
            .map(|&vertex| self.scene_vertex(height, relative_height, crs, vertex))
            .collect()
    }

    fn scene_vertex(
        &self,
        height: HeightMode,
        relative_height: f64,
        crs: &dyn CrsTransform,
        vertex: DVec3,
    ) -> ExportResult<[f64; 3]> {
        let map_position = crs.transform(vertex.truncate());

        let z = match height {
            HeightMode::EmbeddedZ => vertex.z + relative_height,
            HeightMode::RelativeToSurface => {
                self.elevation
                    .sample_value(self.crs_wkt, map_position.x, map_position.y)?
                    + relative_height
            }
            HeightMode::Absolute => relative_height,
        };

        let scene = self.transform.transform(map_position.x, map_position.y, z);

        Ok([scene.x, scene.y, scene.z])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TextureMode,
        math::WorldConfig,
        source::{FlatElevation, IdentityCrs},
        writer::MemorySceneSink,
    };
    use serde_json::Value;

    struct OneFeature(Geometry, f64);

    impl FeatureSource for OneFeature {
        fn features(&self, _extent: &Extent) -> ExportResult<Vec<Feature>> {
            Ok(vec![Feature {
                geometry: clone_geometry(&self.0),
                relative_height: self.1,
            }])
        }
    }

    fn clone_geometry(geometry: &Geometry) -> Geometry {
        match geometry {
            Geometry::Points(points) => Geometry::Points(points.clone()),
            Geometry::Lines(lines) => Geometry::Lines(lines.clone()),
            Geometry::Polygons(polygons) => Geometry::Polygons(
                polygons
                    .iter()
                    .map(|polygon| PolygonRings {
                        outer: polygon.outer.clone(),
                        holes: polygon.holes.clone(),
                    })
                    .collect(),
            ),
        }
    }

    fn transform() -> MapTransform {
        MapTransform::new(
            Extent::new(0.0, 0.0, 100.0, 100.0).unwrap(),
            &WorldConfig::default(),
        )
    }

    fn export_records(style: VectorStyle, source: &dyn FeatureSource) -> Vec<Value> {
        let transform = transform();
        let elevation = FlatElevation;
        let exporter = VectorExporter::new(&transform, &elevation, "");
        let mut sink = MemorySceneSink::new("scene");
        let mut writer = SceneWriter::new(&mut sink, false, TextureMode::Inline);
        let mut materials = MaterialTable::new();

        let layer = VectorLayer {
            style,
            source,
            crs: &IdentityCrs,
        };
        exporter
            .export_layer(&layer, &mut writer, &mut materials)
            .unwrap();
        writer.finish(&materials).unwrap();

        sink.chunks()[0]
            .1
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn multipoints_become_one_record_per_point() {
        let source = OneFeature(
            Geometry::Points(vec![
                DVec3::new(25.0, 25.0, 0.0),
                DVec3::new(75.0, 75.0, 0.0),
            ]),
            3.0,
        );
        let style = VectorStyle::Point(PointStyle {
            color: "0xff0000".into(),
            transparency: 0,
            height: HeightMode::Absolute,
        });

        let records = export_records(style, &source);
        let points: Vec<&Value> = records
            .iter()
            .filter(|value| value["type"] == "feature")
            .collect();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["kind"], "point");
        // (25, 25) maps to (-25, -25) on the centered plane, z = 3
        assert_eq!(
            points[0]["coordinates"][0][0],
            serde_json::json!([-25.0, -25.0, 3.0])
        );
    }

    #[test]
    fn hole_rings_are_reversed_and_the_outer_ring_is_not() {
        let square = |xmin: f64, ymin: f64, size: f64| {
            // clockwise
            vec![
                DVec3::new(xmin, ymin, 0.0),
                DVec3::new(xmin, ymin + size, 0.0),
                DVec3::new(xmin + size, ymin + size, 0.0),
                DVec3::new(xmin + size, ymin, 0.0),
            ]
        };

        let source = OneFeature(
            Geometry::Polygons(vec![PolygonRings {
                outer: square(10.0, 10.0, 40.0),
                holes: vec![square(20.0, 20.0, 10.0)],
            }]),
            0.0,
        );
        let style = VectorStyle::Polygon(PolygonStyle {
            color: "0x00ff00".into(),
            transparency: 0,
            height: HeightMode::Absolute,
        });

        let records = export_records(style, &source);
        let polygon = records
            .iter()
            .find(|value| value["type"] == "feature")
            .unwrap();

        let outer = polygon["coordinates"][0].as_array().unwrap();
        let hole = polygon["coordinates"][1].as_array().unwrap();

        // outer ring in original order: first vertex is (10, 10) -> (-40, -40)
        assert_eq!(outer[0], serde_json::json!([-40.0, -40.0, 0.0]));
        assert_eq!(outer[1], serde_json::json!([-40.0, 0.0, 0.0]));

        // hole ring reversed: the last input vertex (30, 20) comes first
        assert_eq!(hole[0], serde_json::json!([-20.0, -30.0, 0.0]));
        assert_eq!(hole[3], serde_json::json!([-30.0, -30.0, 0.0]));
    }

    #[test]
    fn surface_relative_heights_query_the_elevation_source() {
        struct Plateau;

        impl ElevationSource for Plateau {
            fn sample_grid(
                &self,
                width: usize,
                height: usize,
                _crs_wkt: &str,
                _geo_transform: crate::source::GeoTransform,
            ) -> ExportResult<Vec<f64>> {
                Ok(vec![7.0; width * height])
            }

            fn sample_value(&self, _crs_wkt: &str, _x: f64, _y: f64) -> ExportResult<f64> {
                Ok(7.0)
            }
        }

        let transform = transform();
        let elevation = Plateau;
        let exporter = VectorExporter::new(&transform, &elevation, "");
        let mut sink = MemorySceneSink::new("scene");
        let mut writer = SceneWriter::new(&mut sink, false, TextureMode::Inline);
        let mut materials = MaterialTable::new();

        let source = OneFeature(Geometry::Points(vec![DVec3::new(50.0, 50.0, 0.0)]), 2.0);
        let layer = VectorLayer {
            style: VectorStyle::Point(PointStyle {
                color: "0xffffff".into(),
                transparency: 0,
                height: HeightMode::RelativeToSurface,
            }),
            source: &source,
            crs: &IdentityCrs,
        };
        exporter
            .export_layer(&layer, &mut writer, &mut materials)
            .unwrap();
        writer.finish(&materials).unwrap();

        let record: Value = serde_json::from_str(sink.chunks()[0].1.lines().next().unwrap()).unwrap();
        assert_eq!(record["coordinates"][0][0][2], 9.0);
    }

    #[test]
    fn line_layers_use_line_materials() {
        let source = OneFeature(
            Geometry::Lines(vec![vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(100.0, 100.0, 0.0),
            ]]),
            0.0,
        );
        let style = VectorStyle::Line(LineStyle {
            color: "0x0000ff".into(),
            transparency: 40,
            height: HeightMode::Absolute,
        });

        let records = export_records(style, &source);
        let materials = records
            .iter()
            .find(|value| value["type"] == "materials")
            .unwrap();

        assert_eq!(materials["materials"][0]["kind"], "line");
        assert_eq!(materials["materials"][0]["opacity"], 0.6);
    }
}

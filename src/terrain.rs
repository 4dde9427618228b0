use crate::{
    config::{DemConfig, DemMode, DemSurface},
    material::{self, MaterialTable},
    math::{Extent, MapTransform},
    quadtree::QuadTree,
    report,
    resample::resample,
    result::{ExportOutcome, ExportResult},
    scene::{PlaneRect, SideOptions, TextureRef, TileRecord},
    source::{ElevationSource, MapRasterizer},
    stitch::stitch,
    unify::DemQuadList,
    writer::SceneWriter,
    ProgressCallback,
};
use log::info;

/// Grid edge length of one quadtree tile. One less than this must be a
/// power-of-two multiple of every possible stitch interval, so that seam
/// interpolation lands on exact grid lines.
pub fn quadtree_grid_size(depth: u32) -> usize {
    (1usize << depth).max(64) + 1
}

/// Exports the terrain of one elevation layer: either a single grid over
/// the full map extent, or an adaptive quadtree tiling with per-tile
/// textures and a unified interior block.
///
/// Additional elevation layers are exported by running another exporter
/// with its own elevation source against the same writer.
pub struct TerrainExporter<'a> {
    transform: &'a MapTransform,
    elevation: &'a dyn ElevationSource,
    rasterizer: &'a dyn MapRasterizer,
    crs_wkt: &'a str,
}

impl<'a> TerrainExporter<'a> {
    pub fn new(
        transform: &'a MapTransform,
        elevation: &'a dyn ElevationSource,
        rasterizer: &'a dyn MapRasterizer,
        crs_wkt: &'a str,
    ) -> Self {
        Self {
            transform,
            elevation,
            rasterizer,
            crs_wkt,
        }
    }

    pub fn export(
        &self,
        config: &DemConfig,
        writer: &mut SceneWriter,
        materials: &mut MaterialTable,
        progress: Option<&ProgressCallback>,
    ) -> ExportResult<ExportOutcome> {
        match config.mode {
            DemMode::Simple { width, height } => {
                self.export_simple(config, width, height, writer, materials, progress)
            }
            DemMode::Quadtree { focus, depth } => {
                self.export_quadtree(config, focus, depth, writer, materials, progress)
            }
        }
    }

    fn export_simple(
        &self,
        config: &DemConfig,
        width: usize,
        height: usize,
        writer: &mut SceneWriter,
        materials: &mut MaterialTable,
        progress: Option<&ProgressCallback>,
    ) -> ExportResult<ExportOutcome> {
        if !report(progress, 0.0) {
            return Ok(ExportOutcome::Cancelled);
        }

        let extent = self.transform.extent();
        let grid = resample(self.elevation, extent, width, height, self.crs_wkt, self.transform)?;

        let transparency = config.transparency.min(100);
        let side = (config.side_transparency < 100).then(|| SideOptions {
            opacity: material::opacity(config.side_transparency),
        });

        let (material_index, texture) = match &config.surface {
            DemSurface::MapImage => {
                let (image_width, image_height) = self.base_image_size(config.texture_size);
                let image = self
                    .rasterizer
                    .render_to_image(extent, image_width, image_height)?;

                (None, writer.texture_reference(&image)?)
            }
            DemSurface::SolidColor { color } => (
                Some(materials.mesh_material_index(color, transparency)),
                TextureRef::None,
            ),
            DemSurface::None => (None, TextureRef::None),
        };

        writer.write_tile(TileRecord {
            width: width as u32,
            height: height as u32,
            plane: PlaneRect {
                width: self.transform.plane_width(),
                height: self.transform.plane_height(),
                offset_x: 0.0,
                offset_y: 0.0,
            },
            opacity: material::opacity(transparency),
            material: material_index,
            side,
            data: grid.into_values(),
            texture,
        })?;

        report(progress, 1.0);

        Ok(ExportOutcome::Completed)
    }

    fn export_quadtree(
        &self,
        config: &DemConfig,
        focus: Extent,
        depth: u32,
        writer: &mut SceneWriter,
        materials: &mut MaterialTable,
        progress: Option<&ProgressCallback>,
    ) -> ExportResult<ExportOutcome> {
        let extent = self.transform.extent();
        let tree = QuadTree::build(*extent, focus, depth)?;
        let leaves = tree.leaves();

        info!(
            "quadtree built: {} leaves, target height {}",
            leaves.len(),
            tree.height()
        );

        let size = quadtree_grid_size(depth);
        let opacity = material::opacity(config.transparency.min(100));
        let (base_width, base_height) = self.base_image_size(config.tile_texture_base);

        let mut center = DemQuadList::new(size, size);

        for (index, &quad) in leaves.iter().enumerate() {
            if !report(progress, index as f64 / leaves.len() as f64) {
                return Ok(ExportOutcome::Cancelled);
            }

            let mut grid = resample(
                self.elevation,
                quad.extent(),
                size,
                size,
                self.crs_wkt,
                self.transform,
            )?;
            stitch(&tree, quad, &mut grid);

            if quad.height() == tree.height() {
                center.add_quad(quad, grid);
                continue;
            }

            let (material_index, texture) =
                self.tile_surface(config, materials, quad.extent(), base_width, base_height, writer)?;

            writer.write_tile(TileRecord {
                width: size as u32,
                height: size as u32,
                plane: self.plane_rect(quad.extent()),
                opacity,
                material: material_index,
                side: None,
                data: grid.into_values(),
                texture,
            })?;
        }

        if !center.is_empty() {
            if !report(progress, 1.0) {
                return Ok(ExportOutcome::Cancelled);
            }

            let united = center.unite()?;

            info!(
                "united {} x {} interior tiles over {:?}",
                united.cols, united.rows, united.extent
            );

            let (material_index, texture) = self.tile_surface(
                config,
                materials,
                &united.extent,
                base_width * united.cols as u32,
                base_height * united.rows as u32,
                writer,
            )?;

            writer.write_tile(TileRecord {
                width: ((size - 1) * united.cols + 1) as u32,
                height: ((size - 1) * united.rows + 1) as u32,
                plane: self.plane_rect(&united.extent),
                opacity,
                material: material_index,
                side: None,
                data: united.grid.into_values(),
                texture,
            })?;
        }

        Ok(ExportOutcome::Completed)
    }

    fn tile_surface(
        &self,
        config: &DemConfig,
        materials: &mut MaterialTable,
        extent: &Extent,
        image_width: u32,
        image_height: u32,
        writer: &mut SceneWriter,
    ) -> ExportResult<(Option<usize>, TextureRef)> {
        match &config.surface {
            DemSurface::MapImage => {
                let image = self
                    .rasterizer
                    .render_to_image(extent, image_width, image_height)?;

                Ok((None, writer.texture_reference(&image)?))
            }
            DemSurface::SolidColor { color } => Ok((
                Some(materials.mesh_material_index(color, config.transparency.min(100))),
                TextureRef::None,
            )),
            DemSurface::None => Ok((None, TextureRef::None)),
        }
    }

    /// Scene-plane placement of a tile covering `extent`. The sub-rectangle
    /// is scaled like the full plane and offset so tile centers line up
    /// with their map position.
    fn plane_rect(&self, extent: &Extent) -> PlaneRect {
        let root = self.transform.extent();
        let plane_width = self.transform.plane_width();
        let plane_height = self.transform.plane_height();

        let width = plane_width * extent.width() / root.width();
        let height = plane_height * extent.height() / root.height();

        PlaneRect {
            width,
            height,
            offset_x: plane_width * (extent.xmin() - root.xmin()) / root.width() + width / 2.0
                - plane_width / 2.0,
            offset_y: plane_height * (extent.ymin() - root.ymin()) / root.height() + height / 2.0
                - plane_height / 2.0,
        }
    }

    /// Texture size preserving the map extent's aspect ratio, with the
    /// longer side at `base` pixels.
    fn base_image_size(&self, base: u32) -> (u32, u32) {
        let extent = self.transform.extent();
        let aspect = extent.height() / extent.width();

        if aspect < 1.0 {
            (base, ((base as f64 * aspect).round() as u32).max(1))
        } else {
            (((base as f64 / aspect).round() as u32).max(1), base)
        }
    }
}

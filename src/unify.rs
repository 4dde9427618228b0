use crate::{
    math::Extent,
    quadtree::Quad,
    resample::DemGrid,
    result::{ExportError, ExportResult},
};
use ndarray::{s, Array2};

/// Collects the uniform-resolution interior tiles so they can be merged
/// into one mesh. Filled by the terrain exporter while it classifies
/// leaves, consumed once by [`DemQuadList::unite`].
pub struct DemQuadList {
    grid_width: usize,
    grid_height: usize,
    quads: Vec<(Extent, DemGrid)>,
}

/// The merged interior block: its bounding extent, the tile layout, and one
/// elevation grid covering all tiles with shared edges overlapping exactly.
pub struct UnitedDem {
    pub extent: Extent,
    pub cols: usize,
    pub rows: usize,
    pub grid: DemGrid,
}

impl DemQuadList {
    pub fn new(grid_width: usize, grid_height: usize) -> Self {
        Self {
            grid_width,
            grid_height,
            quads: Vec::new(),
        }
    }

    pub fn add_quad(&mut self, quad: &Quad, grid: DemGrid) {
        debug_assert_eq!(grid.width(), self.grid_width);
        debug_assert_eq!(grid.height(), self.grid_height);

        self.quads.push((*quad.extent(), grid));
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Bounding extent of the collected tiles.
    pub fn extent(&self) -> Option<Extent> {
        self.quads
            .iter()
            .map(|(extent, _)| *extent)
            .reduce(|bounds, extent| bounds.enclose(&extent))
    }

    /// Merges the collected tiles into one grid of shape
    /// `((h-1)*rows+1) x ((w-1)*cols+1)`. Adjacent tiles contribute their
    /// shared edge samples to the same grid line, so nothing is duplicated
    /// and no gap remains.
    ///
    /// The interior block must fill its bounding rectangle: every row/col
    /// slot occupied exactly once. Anything else would mis-tile the merged
    /// mesh and fails loudly instead.
    pub fn unite(self) -> ExportResult<UnitedDem> {
        let extent = self.extent().ok_or(ExportError::NonRectangularInterior)?;

        let (tile_width, tile_height) = {
            let (first, _) = &self.quads[0];
            (first.width(), first.height())
        };

        let cols = (extent.width() / tile_width).round() as usize;
        let rows = (extent.height() / tile_height).round() as usize;

        if cols * rows != self.quads.len() {
            return Err(ExportError::NonRectangularInterior);
        }

        let (grid_width, grid_height) = (self.grid_width, self.grid_height);
        let mut united = Array2::zeros((
            (grid_height - 1) * rows + 1,
            (grid_width - 1) * cols + 1,
        ));
        let mut occupied = Array2::from_elem((rows, cols), false);

        for (tile_extent, grid) in self.quads {
            let col = ((tile_extent.xmin() - extent.xmin()) / tile_width).round() as usize;
            // row 0 is the north edge of the merged grid
            let row = ((extent.ymax() - tile_extent.ymax()) / tile_height).round() as usize;

            if col >= cols || row >= rows || occupied[(row, col)] {
                return Err(ExportError::NonRectangularInterior);
            }
            occupied[(row, col)] = true;

            let y0 = row * (grid_height - 1);
            let x0 = col * (grid_width - 1);
            united
                .slice_mut(s![y0..y0 + grid_height, x0..x0 + grid_width])
                .assign(grid.as_array());
        }

        let grid = DemGrid::from_values(
            (grid_width - 1) * cols + 1,
            (grid_height - 1) * rows + 1,
            united.into_iter().collect(),
        )?;

        Ok(UnitedDem {
            extent,
            cols,
            rows,
            grid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::Extent, quadtree::QuadTree};

    fn united_block() -> (QuadTree, DemQuadList) {
        // focus inside one quadrant: the four height-2 leaves of the
        // south-west quadrant form a 2x2 interior block
        let tree = QuadTree::build(
            Extent::new(0.0, 0.0, 100.0, 100.0).unwrap(),
            Extent::new(10.0, 10.0, 20.0, 20.0).unwrap(),
            2,
        )
        .unwrap();

        let mut list = DemQuadList::new(3, 3);
        for quad in tree.leaves() {
            if quad.height() == tree.height() {
                // constant per tile keeps shared-edge values identical where
                // tiles meet at corners of the same source surface
                let values = vec![1.0; 9];
                list.add_quad(quad, DemGrid::from_values(3, 3, values).unwrap());
            }
        }

        (tree, list)
    }

    #[test]
    fn united_grid_has_the_merged_shape() {
        let (_, list) = united_block();

        assert_eq!(list.len(), 4);
        assert_eq!(list.extent(), Some(Extent::new(0.0, 0.0, 50.0, 50.0).unwrap()));

        let united = list.unite().unwrap();

        assert_eq!((united.cols, united.rows), (2, 2));
        // (3-1)*2+1 = 5 in both directions
        assert_eq!((united.grid.width(), united.grid.height()), (5, 5));
        assert!(united.grid.into_values().into_iter().all(|value| value == 1.0));
    }

    #[test]
    fn shared_edges_overlap_exactly() {
        let tree = QuadTree::build(
            Extent::new(0.0, 0.0, 100.0, 100.0).unwrap(),
            Extent::new(10.0, 10.0, 20.0, 20.0).unwrap(),
            2,
        )
        .unwrap();

        // sample a shared surface f(x, y) = x + y at each tile's points so
        // overlapping edges carry identical values by construction
        let mut list = DemQuadList::new(3, 3);
        for quad in tree.leaves() {
            if quad.height() != tree.height() {
                continue;
            }
            let extent = quad.extent();
            let mut values = Vec::new();
            for y in 0..3 {
                for x in 0..3 {
                    let px = extent.xmin() + extent.width() * x as f64 / 2.0;
                    let py = extent.ymax() - extent.height() * y as f64 / 2.0;
                    values.push(px + py);
                }
            }
            list.add_quad(quad, DemGrid::from_values(3, 3, values).unwrap());
        }

        let united = list.unite().unwrap();

        // the merged grid reproduces the surface on the full block
        for y in 0..5 {
            for x in 0..5 {
                let px = 12.5 * x as f64;
                let py = 50.0 - 12.5 * y as f64;
                assert_eq!(united.grid.get(x, y), px + py);
            }
        }
    }

    #[test]
    fn incomplete_block_is_rejected() {
        let (tree, _) = united_block();

        let mut list = DemQuadList::new(3, 3);
        let leaves = tree.leaves();
        let mut interior = leaves
            .iter()
            .copied()
            .filter(|quad| quad.height() == tree.height());

        // drop one of the four tiles
        for quad in interior.by_ref().take(3) {
            list.add_quad(quad, DemGrid::from_values(3, 3, vec![0.0; 9]).unwrap());
        }

        assert!(matches!(
            list.unite(),
            Err(ExportError::NonRectangularInterior)
        ));
    }
}

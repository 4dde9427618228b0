use crate::{
    quadtree::{Direction, Quad, QuadTree},
    resample::DemGrid,
};

/// Aligns a tile's boundary samples with its coarser neighbors.
///
/// Where the neighbor on some side sits at a lower subdivision height, the
/// shared edge carries `interval = 2^(height difference)` samples per
/// neighbor sample. Only every `interval`-th sample coincides with a point
/// of the coarser grid; the samples in between are replaced by exact linear
/// interpolation so both tiles describe the same edge geometry and no crack
/// opens at the T-junction.
///
/// Only this quad's own edge is mutated, so tiles can be corrected in any
/// order, and correcting twice is a no-op.
pub fn stitch(tree: &QuadTree, quad: &Quad, grid: &mut DemGrid) {
    for direction in Direction::ALL {
        let Some(neighbor) = tree.neighbor(quad, direction) else {
            continue;
        };

        if neighbor.height() >= quad.height() {
            continue;
        }

        let interval = 1usize << (quad.height() - neighbor.height());

        match direction {
            Direction::Up | Direction::Down => {
                let y = match direction {
                    Direction::Up => 0,
                    _ => grid.height() - 1,
                };

                for x1 in (interval..grid.width()).step_by(interval) {
                    let x0 = x1 - interval;
                    let z0 = grid.get(x0, y);
                    let z1 = grid.get(x1, y);

                    for xx in 1..interval {
                        let z = (z0 * (interval - xx) as f64 + z1 * xx as f64) / interval as f64;
                        grid.set(x0 + xx, y, z);
                    }
                }
            }
            Direction::Left | Direction::Right => {
                let x = match direction {
                    Direction::Left => 0,
                    _ => grid.width() - 1,
                };

                for y1 in (interval..grid.height()).step_by(interval) {
                    let y0 = y1 - interval;
                    let z0 = grid.get(x, y0);
                    let z1 = grid.get(x, y1);

                    for yy in 1..interval {
                        let z = (z0 * (interval - yy) as f64 + z1 * yy as f64) / interval as f64;
                        grid.set(x, y0 + yy, z);
                    }
                }
            }
        }
    }
}

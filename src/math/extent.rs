use crate::result::{ExportError, ExportResult};
use glam::DVec2;

/// An axis-aligned rectangle in map-space units. Width and height are
/// always positive once constructed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> ExportResult<Self> {
        if !(xmax - xmin > 0.0) || !(ymax - ymin > 0.0) {
            return Err(ExportError::DegenerateExtent);
        }

        Ok(Self {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(
            0.5 * (self.xmin + self.xmax),
            0.5 * (self.ymin + self.ymax),
        )
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    /// Overlap with a positive area. Rectangles that merely share an edge
    /// do not intersect.
    pub fn intersects(&self, other: &Extent) -> bool {
        self.xmin < other.xmax
            && other.xmin < self.xmax
            && self.ymin < other.ymax
            && other.ymin < self.ymax
    }

    /// Half-open containment: the max edges belong to the adjacent extent.
    pub fn contains(&self, point: DVec2) -> bool {
        self.xmin <= point.x && point.x < self.xmax && self.ymin <= point.y && point.y < self.ymax
    }

    /// One quarter of the extent. Index 0 is the south-west quadrant, bit 0
    /// selects east, bit 1 selects north, matching the child order of the
    /// quadtree.
    pub fn quadrant(&self, index: usize) -> Extent {
        let center = self.center();

        let (xmin, xmax) = if index & 1 == 0 {
            (self.xmin, center.x)
        } else {
            (center.x, self.xmax)
        };
        let (ymin, ymax) = if index & 2 == 0 {
            (self.ymin, center.y)
        } else {
            (center.y, self.ymax)
        };

        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Smallest extent enclosing both rectangles.
    pub fn enclose(&self, other: &Extent) -> Extent {
        Self {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

use crate::math::Extent;

/// How texture references are embedded in the scene description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureMode {
    /// Base64 PNG data inside the record, for self-contained output.
    Inline,
    /// PNG files next to the chunks, referenced by relative path.
    Files,
}

/// What is draped over the terrain surface.
#[derive(Clone, Debug, PartialEq)]
pub enum DemSurface {
    /// Rasterize the map at each tile's extent.
    MapImage,
    /// A solid mesh material interned in the material table.
    SolidColor { color: String },
    None,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DemMode {
    /// One grid covering the full map extent.
    Simple { width: usize, height: usize },
    /// Adaptive tiling around a focus area, subdivided `depth` times.
    Quadtree { focus: Extent, depth: u32 },
}

/// Configuration of one elevation layer export, validated at the boundary
/// instead of read from string-keyed properties throughout.
#[derive(Clone, Debug)]
pub struct DemConfig {
    pub mode: DemMode,
    pub surface: DemSurface,
    /// Surface transparency percentage, 0 to 100.
    pub transparency: u8,
    /// Side-wall transparency percentage; 100 disables the side walls.
    pub side_transparency: u8,
    /// Pixel size of the full-extent texture in simple mode.
    pub texture_size: u32,
    /// Base pixel size of one tile texture in quadtree mode.
    pub tile_texture_base: u32,
}

impl DemConfig {
    pub fn simple(width: usize, height: usize) -> Self {
        Self {
            mode: DemMode::Simple { width, height },
            ..Self::base()
        }
    }

    pub fn quadtree(focus: Extent, depth: u32) -> Self {
        Self {
            mode: DemMode::Quadtree { focus, depth },
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            mode: DemMode::Simple {
                width: 100,
                height: 100,
            },
            surface: DemSurface::MapImage,
            transparency: 0,
            side_transparency: 100,
            texture_size: 1024,
            tile_texture_base: 128,
        }
    }
}

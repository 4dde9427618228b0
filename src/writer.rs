use crate::{
    config::TextureMode,
    material::MaterialTable,
    result::{ExportError, ExportResult},
    scene::{FeatureRecord, SceneRecord, TextureRef, TileRecord, WorldRecord},
};
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use log::debug;
use std::{
    fs::File,
    io::{BufWriter, Cursor, Write},
    path::PathBuf,
};

fn chunk_name(base: &str, index: Option<u32>) -> String {
    match index {
        None => format!("{base}.jsonl"),
        Some(index) => format!("{base}_{index}.jsonl"),
    }
}

/// Where the record stream and texture files end up. One implementation
/// writes to disk, one keeps everything in memory.
pub trait SceneSink {
    /// Closes the current chunk, if any, and starts a new one. `None` names
    /// the sole chunk of a non-chunked export.
    fn open_chunk(&mut self, index: Option<u32>) -> ExportResult<()>;

    /// Appends one record line to the current chunk.
    fn write_record(&mut self, line: &str) -> ExportResult<()>;

    /// Stores a PNG texture and returns the relative path to reference it by.
    fn write_texture(&mut self, index: u32, data: &[u8]) -> ExportResult<String>;

    /// Flushes the last chunk.
    fn finish(&mut self) -> ExportResult<()>;
}

/// Writes chunks and textures into one output directory.
pub struct FileSceneSink {
    directory: PathBuf,
    base: String,
    current: Option<BufWriter<File>>,
    chunk_names: Vec<String>,
}

impl FileSceneSink {
    pub fn new(directory: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base: base.into(),
            current: None,
            chunk_names: Vec::new(),
        }
    }

    /// Chunk file names in creation order.
    pub fn chunk_names(&self) -> &[String] {
        &self.chunk_names
    }
}

impl SceneSink for FileSceneSink {
    fn open_chunk(&mut self, index: Option<u32>) -> ExportResult<()> {
        self.finish()?;

        let name = chunk_name(&self.base, index);
        let file = File::create(self.directory.join(&name))?;

        debug!("opened scene chunk {name}");
        self.chunk_names.push(name);
        self.current = Some(BufWriter::new(file));

        Ok(())
    }

    fn write_record(&mut self, line: &str) -> ExportResult<()> {
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| ExportError::Io(std::io::Error::other("no chunk open")))?;

        current.write_all(line.as_bytes())?;
        current.write_all(b"\n")?;

        Ok(())
    }

    fn write_texture(&mut self, index: u32, data: &[u8]) -> ExportResult<String> {
        let name = format!("{}_{index}.png", self.base);
        std::fs::write(self.directory.join(&name), data)?;

        Ok(name)
    }

    fn finish(&mut self) -> ExportResult<()> {
        if let Some(mut current) = self.current.take() {
            current.flush()?;
        }

        Ok(())
    }
}

/// Keeps the produced chunks and textures in memory.
#[derive(Default)]
pub struct MemorySceneSink {
    base: String,
    chunks: Vec<(String, String)>,
    textures: Vec<(String, Vec<u8>)>,
}

impl MemorySceneSink {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    /// Chunk (name, contents) pairs in creation order.
    pub fn chunks(&self) -> &[(String, String)] {
        &self.chunks
    }

    pub fn textures(&self) -> &[(String, Vec<u8>)] {
        &self.textures
    }
}

impl SceneSink for MemorySceneSink {
    fn open_chunk(&mut self, index: Option<u32>) -> ExportResult<()> {
        self.chunks.push((chunk_name(&self.base, index), String::new()));

        Ok(())
    }

    fn write_record(&mut self, line: &str) -> ExportResult<()> {
        let (_, contents) = self
            .chunks
            .last_mut()
            .ok_or_else(|| ExportError::Io(std::io::Error::other("no chunk open")))?;

        contents.push_str(line);
        contents.push('\n');

        Ok(())
    }

    fn write_texture(&mut self, index: u32, data: &[u8]) -> ExportResult<String> {
        let name = format!("{}_{index}.png", self.base);
        self.textures.push((name.clone(), data.to_vec()));

        Ok(name)
    }

    fn finish(&mut self) -> ExportResult<()> {
        Ok(())
    }
}

/// Incremental scene writer. Streams records into the sink, rolling over to
/// a new chunk for each terrain tile after the first when chunking is
/// enabled, and finishes with the material table.
pub struct SceneWriter<'a> {
    sink: &'a mut dyn SceneSink,
    chunked: bool,
    texture_mode: TextureMode,
    chunk_count: u32,
    tile_count: u32,
    texture_count: u32,
    world_written: bool,
}

impl<'a> SceneWriter<'a> {
    pub fn new(sink: &'a mut dyn SceneSink, chunked: bool, texture_mode: TextureMode) -> Self {
        Self {
            sink,
            chunked,
            texture_mode,
            chunk_count: 0,
            tile_count: 0,
            texture_count: 0,
            world_written: false,
        }
    }

    fn open_next_chunk(&mut self) -> ExportResult<()> {
        let index = self.chunked.then_some(self.chunk_count);
        self.sink.open_chunk(index)?;
        self.chunk_count += 1;

        Ok(())
    }

    fn write_record(&mut self, record: &SceneRecord) -> ExportResult<()> {
        // serialize before touching the sink, so a failure leaves the
        // current chunk intact
        let line = serde_json::to_string(record)?;

        if self.chunk_count == 0 {
            self.open_next_chunk()?;
        }

        self.sink.write_record(&line)
    }

    /// Writes the world header. Must come first; it opens chunk 0 (or the
    /// sole chunk) and is written exactly once per export.
    pub fn write_world(&mut self, world: WorldRecord) -> ExportResult<()> {
        debug_assert!(!self.world_written, "world header already written");
        if self.world_written {
            return Ok(());
        }

        self.write_record(&SceneRecord::World(world))?;
        self.world_written = true;

        Ok(())
    }

    pub fn write_tile(&mut self, tile: TileRecord) -> ExportResult<()> {
        if self.chunked && self.tile_count > 0 {
            self.open_next_chunk()?;
        }

        self.write_record(&SceneRecord::Dem(tile))?;
        self.tile_count += 1;

        Ok(())
    }

    pub fn write_feature(&mut self, feature: FeatureRecord) -> ExportResult<()> {
        self.write_record(&SceneRecord::Feature(feature))
    }

    /// Encodes a rendered tile image into the texture reference to embed in
    /// its tile record: base64 PNG data inline, or a PNG file next to the
    /// chunks, depending on the output mode.
    pub fn texture_reference(&mut self, image: &RgbaImage) -> ExportResult<TextureRef> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        match self.texture_mode {
            TextureMode::Inline => Ok(TextureRef::Inline {
                data: base64::engine::general_purpose::STANDARD.encode(&png),
            }),
            TextureMode::Files => {
                let path = self.sink.write_texture(self.texture_count, &png)?;
                self.texture_count += 1;

                Ok(TextureRef::File { path })
            }
        }
    }

    /// Appends the material table to the last chunk and flushes the sink.
    /// Returns the number of chunks written.
    pub fn finish(mut self, materials: &MaterialTable) -> ExportResult<u32> {
        self.write_record(&SceneRecord::Materials {
            materials: materials.descriptors().to_vec(),
        })?;
        self.sink.finish()?;

        Ok(self.chunk_count)
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }
}

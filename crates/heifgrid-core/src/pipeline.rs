//! Conversion pipeline: from a parsed container to one oriented canvas.
//!
//! ```text
//! Start -> DescriptorResolved -> ThumbnailPath | GridPath -> MetadataApplied -> Done
//! ```
//!
//! Any fatal error moves the pipeline to `Failed` and is returned as is.
//! Orientation problems are collected as warnings on the [`Conversion`].

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::container::{ContainerReader, GridDescriptor};
use crate::decode::{
    decode_tile, ColorConverter, DecodeMode, DecodeScheduler, GridError, TileDecoder,
};
use crate::encode::{SaveOptions, DEFAULT_QUALITY};
use crate::orientation::apply_orientation;
use crate::select::{select_path, DecodePath, THUMBNAIL_MAX_EDGE};
use crate::stitch::{stitch_tiles, Canvas};

/// What the caller wants out of one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Serve the embedded thumbnail regardless of size.
    pub thumbnail_requested: bool,
    /// Requested width; 0 means native size.
    pub target_width: u32,
    /// Requested height; 0 means native size.
    pub target_height: u32,
    /// Decode grid tiles concurrently.
    pub parallel_decode: bool,
}

/// Settings that stay fixed across conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Worker count for parallel decoding. `None` uses the global rayon pool.
    pub max_decode_threads: Option<usize>,
    /// Largest target edge still served from the thumbnail.
    pub thumbnail_max_edge: u32,
    /// YCbCr to RGB conversion for decoded tiles.
    pub color: ColorConverter,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_decode_threads: None,
            thumbnail_max_edge: THUMBNAIL_MAX_EDGE,
            color: ColorConverter::default(),
        }
    }
}

/// Flat option set of a command-line front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub crop: bool,
    pub parallel: bool,
    pub thumbnail: bool,
    pub verbose: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            quality: DEFAULT_QUALITY,
            crop: false,
            parallel: false,
            thumbnail: false,
            verbose: false,
        }
    }
}

impl ConvertOptions {
    /// The decode request these options describe.
    pub fn output_spec(&self) -> OutputSpec {
        OutputSpec {
            thumbnail_requested: self.thumbnail,
            target_width: self.width,
            target_height: self.height,
            parallel_decode: self.parallel,
        }
    }

    /// How the result should be written.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            quality: self.quality,
            width: self.width,
            height: self.height,
            crop: self.crop,
            ..SaveOptions::default()
        }
    }

    /// Log level a front end should install.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}

/// Where a pipeline is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Start,
    DescriptorResolved,
    ThumbnailPath,
    GridPath,
    MetadataApplied,
    Done,
    Failed,
}

/// A finished conversion.
#[derive(Debug)]
pub struct Conversion {
    /// The assembled image, tagged with its orientation when known.
    pub image: Canvas,
    /// Which path produced it.
    pub path: DecodePath,
    /// Non-fatal problems, e.g. missing orientation.
    pub warnings: Vec<GridError>,
}

/// Drives one conversion over a container reader and a tile decoder.
pub struct Pipeline<'a> {
    reader: &'a dyn ContainerReader,
    decoder: &'a dyn TileDecoder,
    config: PipelineConfig,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        reader: &'a dyn ContainerReader,
        decoder: &'a dyn TileDecoder,
        config: PipelineConfig,
    ) -> Self {
        Self {
            reader,
            decoder,
            config,
            state: PipelineState::Start,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the conversion for `spec`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; the pipeline is then `Failed`.
    pub fn run(&mut self, spec: &OutputSpec) -> Result<Conversion, GridError> {
        let start = Instant::now();
        match self.run_stages(spec) {
            Ok(conversion) => {
                self.transition(PipelineState::Done);
                log::info!("export & decode took {} ms", start.elapsed().as_millis());
                Ok(conversion)
            }
            Err(e) => {
                log::error!("Conversion failed: {}", e);
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, spec: &OutputSpec) -> Result<Conversion, GridError> {
        let grid = self.reader.grid_descriptor()?;
        grid.validate()?;
        log::info!(
            "Grid is {}x{} pixels in tiles {}x{}",
            grid.output_width,
            grid.output_height,
            grid.columns,
            grid.rows
        );
        self.transition(PipelineState::DescriptorResolved);

        let thumbnail = self.reader.thumbnail_reference(grid.item_id);
        let path = select_path(spec, thumbnail, self.config.thumbnail_max_edge)?;

        let canvas = match path {
            DecodePath::Thumbnail(item) => {
                self.transition(PipelineState::ThumbnailPath);
                let data = self.reader.compressed_data(item, item)?;
                let tile = decode_tile(self.decoder, 0, &data, self.config.color)?;
                Canvas::from_tile(tile)
            }
            DecodePath::Grid => {
                self.transition(PipelineState::GridPath);
                self.decode_grid(&grid, spec)?
            }
        };

        let (image, warning) = apply_orientation(canvas, self.reader.orientation(grid.item_id));
        self.transition(PipelineState::MetadataApplied);

        Ok(Conversion {
            image,
            path,
            warnings: warning.into_iter().collect(),
        })
    }

    fn decode_grid(&self, grid: &GridDescriptor, spec: &OutputSpec) -> Result<Canvas, GridError> {
        let first = grid.tile_ids.first().copied().ok_or(GridError::EmptyTileSet)?;

        // Every tile is packaged with the decoder parameters of the first one
        let data = grid
            .tile_ids
            .iter()
            .map(|&id| self.reader.compressed_data(id, first))
            .collect::<Result<Vec<_>, _>>()?;

        let mode = DecodeMode::from_flag(spec.parallel_decode);
        let scheduler = match (mode, self.config.max_decode_threads) {
            (DecodeMode::Parallel, Some(threads)) => {
                DecodeScheduler::with_threads(mode, self.config.color, threads)?
            }
            _ => DecodeScheduler::new(mode, self.config.color),
        };

        let tiles = scheduler.decode_all(self.decoder, data)?;
        stitch_tiles(grid, tiles)
    }
}

/// Run a whole conversion in one call.
pub fn convert(
    reader: &dyn ContainerReader,
    decoder: &dyn TileDecoder,
    spec: &OutputSpec,
    config: PipelineConfig,
) -> Result<Conversion, GridError> {
    Pipeline::new(reader, decoder, config).run(spec)
}

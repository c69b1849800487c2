//! Decode scheduler: runs tile decodes sequentially or on a rayon pool.
//!
//! Both modes return tiles in input order. In parallel mode every task is
//! allowed to finish before any failure is reported, so no decoder work is
//! left in flight when the caller sees an error.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::adapter::{decode_tile, TileDecoder};
use super::color::ColorConverter;
use super::{DecodedTile, GridError};

/// How tile decode tasks are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodeMode {
    /// One tile at a time, in tile-index order.
    #[default]
    Sequential,
    /// All tiles submitted at once; joined before stitching.
    Parallel,
}

impl DecodeMode {
    pub fn from_flag(parallel: bool) -> Self {
        if parallel {
            DecodeMode::Parallel
        } else {
            DecodeMode::Sequential
        }
    }
}

/// Runs tile decodes and reassembles the results in tile order.
pub struct DecodeScheduler {
    mode: DecodeMode,
    converter: ColorConverter,
    pool: Option<rayon::ThreadPool>,
}

impl DecodeScheduler {
    /// Create a scheduler. Parallel mode uses the global rayon pool.
    pub fn new(mode: DecodeMode, converter: ColorConverter) -> Self {
        Self {
            mode,
            converter,
            pool: None,
        }
    }

    /// Create a scheduler whose parallel mode runs on a dedicated pool of
    /// `threads` workers.
    pub fn with_threads(
        mode: DecodeMode,
        converter: ColorConverter,
        threads: usize,
    ) -> Result<Self, GridError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tile-decode-{}", i))
            .build()
            .map_err(|e| GridError::ThreadPool(e.to_string()))?;

        Ok(Self {
            mode,
            converter,
            pool: Some(pool),
        })
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Decode every compressed tile. `tiles[i]` becomes result `i`.
    pub fn decode_all(
        &self,
        decoder: &dyn TileDecoder,
        tiles: Vec<Vec<u8>>,
    ) -> Result<Vec<DecodedTile>, GridError> {
        match self.mode {
            DecodeMode::Sequential => self.decode_sequential(decoder, tiles),
            DecodeMode::Parallel => match &self.pool {
                Some(pool) => pool.install(|| self.decode_parallel(decoder, tiles)),
                None => self.decode_parallel(decoder, tiles),
            },
        }
    }

    fn decode_sequential(
        &self,
        decoder: &dyn TileDecoder,
        tiles: Vec<Vec<u8>>,
    ) -> Result<Vec<DecodedTile>, GridError> {
        tiles
            .iter()
            .enumerate()
            .map(|(index, data)| decode_tile(decoder, index, data, self.converter))
            .collect()
    }

    fn decode_parallel(
        &self,
        decoder: &dyn TileDecoder,
        tiles: Vec<Vec<u8>>,
    ) -> Result<Vec<DecodedTile>, GridError> {
        let converter = self.converter;

        // Collecting into Vec<Result> (not Result<Vec>) keeps rayon from
        // short-circuiting: every task runs to completion.
        let results: Vec<Result<DecodedTile, GridError>> = tiles
            .into_par_iter()
            .enumerate()
            .map(|(index, data)| decode_tile(decoder, index, &data, converter))
            .collect();

        let mut decoded = Vec::with_capacity(results.len());
        let mut first_error = None;

        for result in results {
            match result {
                Ok(tile) => decoded.push(tile),
                Err(e) => {
                    log::warn!("{}", e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(decoded),
        }
    }
}

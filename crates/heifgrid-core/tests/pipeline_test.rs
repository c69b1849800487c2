//! End-to-end conversions through in-memory container and decoder fakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use heifgrid_core::{
    convert, save, CodecError, ContainerReader, ConvertOptions, DecodePath, GridDescriptor,
    GridError, ItemId, Orientation, OutputSpec, Pipeline, PipelineConfig, PipelineState,
    RawFrame, TileDecoder,
};

const GRID: ItemId = ItemId(1);
const THUMB: ItemId = ItemId(900);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// EXIF item: offset prefix, `Exif\0\0`, then a one-entry little-endian TIFF.
fn exif_payload(orientation: u16) -> Vec<u8> {
    let mut payload = vec![0, 0, 0, 6];
    payload.extend_from_slice(b"Exif\0\0");
    payload.extend_from_slice(&[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
    payload.extend_from_slice(&[0x01, 0x00, 0x12, 0x01, 0x03, 0x00]);
    payload.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
    payload.extend_from_slice(&orientation.to_le_bytes());
    payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    payload
}

/// Compressed tile encoding understood by `SolidDecoder`:
/// `[width, height, luma, delay_ms]`.
fn tile_bytes(width: u8, height: u8, luma: u8, delay_ms: u8) -> Vec<u8> {
    vec![width, height, luma, delay_ms]
}

struct FakeContainer {
    grid: Option<GridDescriptor>,
    items: HashMap<ItemId, Vec<u8>>,
    thumbnail: Option<ItemId>,
    exif: Option<Vec<u8>>,
}

impl FakeContainer {
    /// A `columns x rows` grid of `tile`-sized tiles cropped to `width x height`.
    /// Tile `i` decodes to luma `20 + 10 * i`.
    fn grid(columns: u8, rows: u8, tile: u8, width: u32, height: u32) -> Self {
        let count = columns as u32 * rows as u32;
        let tile_ids: Vec<ItemId> = (0..count).map(|i| ItemId(100 + i)).collect();
        let mut items = HashMap::new();
        for (i, id) in tile_ids.iter().enumerate() {
            // Earlier tiles decode slower so completion order differs from index order
            let delay = (count as usize - i) as u8 * 2;
            items.insert(*id, tile_bytes(tile, tile, 20 + 10 * i as u8, delay));
        }
        items.insert(THUMB, tile_bytes(8, 6, 77, 0));

        let grid =
            GridDescriptor::from_stored(GRID, width, height, rows - 1, columns - 1, tile_ids)
                .unwrap();
        Self {
            grid: Some(grid),
            items,
            thumbnail: Some(THUMB),
            exif: Some(exif_payload(6)),
        }
    }
}

impl ContainerReader for FakeContainer {
    fn grid_descriptor(&self) -> Result<GridDescriptor, GridError> {
        self.grid.clone().ok_or(GridError::GridNotFound)
    }

    fn thumbnail_reference(&self, _: ItemId) -> Option<ItemId> {
        self.thumbnail
    }

    fn compressed_data(&self, item: ItemId, _: ItemId) -> Result<Vec<u8>, GridError> {
        self.items
            .get(&item)
            .cloned()
            .ok_or_else(|| GridError::Container(format!("no item {}", item)))
    }

    fn metadata_item(&self, _: ItemId) -> Option<Vec<u8>> {
        self.exif.clone()
    }
}

/// Decodes to a flat-gray YUV 4:2:0 frame, optionally failing some lumas.
struct SolidDecoder {
    fail_luma: Option<u8>,
    calls: AtomicUsize,
}

impl SolidDecoder {
    fn new() -> Self {
        Self {
            fail_luma: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(luma: u8) -> Self {
        Self {
            fail_luma: Some(luma),
            ..Self::new()
        }
    }
}

impl TileDecoder for SolidDecoder {
    fn decode(&self, data: &[u8]) -> Result<RawFrame, CodecError> {
        let (w, h, luma, delay) = (data[0] as u32, data[1] as u32, data[2], data[3]);
        std::thread::sleep(Duration::from_millis(delay as u64));
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_luma == Some(luma) {
            return Err(CodecError::new("corrupt slice"));
        }

        let chroma = (w.div_ceil(2) * h.div_ceil(2)) as usize;
        Ok(RawFrame::yuv420(
            w,
            h,
            vec![luma; (w * h) as usize],
            vec![128; chroma],
            vec![128; chroma],
        ))
    }
}

fn full_size(parallel: bool) -> OutputSpec {
    OutputSpec {
        parallel_decode: parallel,
        ..OutputSpec::default()
    }
}

#[test]
fn test_grid_is_stitched_and_cropped() {
    init_logger();
    let container = FakeContainer::grid(3, 2, 16, 40, 30);
    let decoder = SolidDecoder::new();

    let conversion =
        convert(&container, &decoder, &full_size(false), PipelineConfig::default()).unwrap();

    assert_eq!(conversion.path, DecodePath::Grid);
    assert_eq!((conversion.image.width, conversion.image.height), (40, 30));
    assert_eq!(conversion.image.pixels.len(), 40 * 30 * 3);
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 6);

    // Tile 4 (row 1, column 1) covers (16..32, 16..32)
    let expected = conversion.image.pixel(16, 16);
    assert_eq!(conversion.image.pixel(31, 29), expected);
    assert_ne!(conversion.image.pixel(15, 16), expected);
    assert_ne!(conversion.image.pixel(16, 15), expected);
}

#[test]
fn test_sequential_and_parallel_are_identical() {
    init_logger();
    let container = FakeContainer::grid(4, 3, 12, 45, 33);

    let sequential = convert(
        &container,
        &SolidDecoder::new(),
        &full_size(false),
        PipelineConfig::default(),
    )
    .unwrap();
    let parallel = convert(
        &container,
        &SolidDecoder::new(),
        &full_size(true),
        PipelineConfig::default(),
    )
    .unwrap();
    let pooled = convert(
        &container,
        &SolidDecoder::new(),
        &full_size(true),
        PipelineConfig {
            max_decode_threads: Some(3),
            ..PipelineConfig::default()
        },
    )
    .unwrap();

    assert_eq!(sequential.image, parallel.image);
    assert_eq!(sequential.image, pooled.image);
}

#[test]
fn test_parallel_failure_drains_every_task() {
    init_logger();
    let container = FakeContainer::grid(3, 3, 8, 24, 24);
    // Tile 1 decodes to luma 30
    let decoder = SolidDecoder::failing(30);

    let mut pipeline = Pipeline::new(&container, &decoder, PipelineConfig::default());
    let result = pipeline.run(&full_size(true));

    match result {
        Err(GridError::TileDecodeFailed { index, .. }) => assert_eq!(index, 1),
        other => panic!("Expected TileDecodeFailed, got: {:?}", other),
    }
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 9);
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[test]
fn test_sequential_failure_stops_early() {
    let container = FakeContainer::grid(3, 3, 8, 24, 24);
    let decoder = SolidDecoder::failing(30);

    let result = convert(&container, &decoder, &full_size(false), PipelineConfig::default());

    assert!(matches!(result, Err(GridError::TileDecodeFailed { index: 1, .. })));
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_small_target_uses_thumbnail() {
    init_logger();
    let container = FakeContainer::grid(2, 2, 16, 30, 30);
    let decoder = SolidDecoder::new();
    let spec = OutputSpec {
        target_width: 200,
        target_height: 200,
        ..OutputSpec::default()
    };

    let conversion = convert(&container, &decoder, &spec, PipelineConfig::default()).unwrap();

    assert_eq!(conversion.path, DecodePath::Thumbnail(THUMB));
    assert_eq!((conversion.image.width, conversion.image.height), (8, 6));
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(conversion.image.orientation, Some(Orientation::Rotate90CW));
}

#[test]
fn test_large_target_uses_grid() {
    let container = FakeContainer::grid(2, 2, 16, 30, 30);
    let spec = OutputSpec {
        target_width: 1200,
        ..OutputSpec::default()
    };

    let conversion =
        convert(&container, &SolidDecoder::new(), &spec, PipelineConfig::default()).unwrap();
    assert_eq!(conversion.path, DecodePath::Grid);
}

#[test]
fn test_missing_thumbnail_is_fatal() {
    let container = FakeContainer {
        thumbnail: None,
        ..FakeContainer::grid(2, 2, 16, 30, 30)
    };
    let spec = OutputSpec {
        thumbnail_requested: true,
        ..OutputSpec::default()
    };

    let result = convert(&container, &SolidDecoder::new(), &spec, PipelineConfig::default());
    assert!(matches!(result, Err(GridError::ThumbnailNotFound)));
}

#[test]
fn test_missing_grid_is_fatal() {
    let container = FakeContainer {
        grid: None,
        ..FakeContainer::grid(1, 1, 8, 8, 8)
    };

    let result = convert(
        &container,
        &SolidDecoder::new(),
        &OutputSpec::default(),
        PipelineConfig::default(),
    );
    assert!(matches!(result, Err(GridError::GridNotFound)));
}

#[test]
fn test_empty_tile_list_is_fatal() {
    let mut container = FakeContainer::grid(1, 1, 8, 8, 8);
    if let Some(grid) = container.grid.as_mut() {
        grid.tile_ids.clear();
    }

    let result = convert(
        &container,
        &SolidDecoder::new(),
        &OutputSpec::default(),
        PipelineConfig::default(),
    );
    assert!(matches!(result, Err(GridError::EmptyTileSet)));
}

#[test]
fn test_missing_orientation_still_done() {
    init_logger();
    let container = FakeContainer {
        exif: None,
        ..FakeContainer::grid(2, 1, 8, 12, 8)
    };
    let decoder = SolidDecoder::new();
    let mut pipeline = Pipeline::new(&container, &decoder, PipelineConfig::default());

    let conversion = pipeline.run(&OutputSpec::default()).unwrap();

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(conversion.image.orientation, None);
    assert!(matches!(
        conversion.warnings.as_slice(),
        [GridError::MetadataExtractionFailed(_)]
    ));
}

#[test]
fn test_corrupt_orientation_still_done() {
    let container = FakeContainer {
        exif: Some(vec![0, 0, 0, 6, b'E', b'x']),
        ..FakeContainer::grid(2, 1, 8, 12, 8)
    };

    let conversion = convert(
        &container,
        &SolidDecoder::new(),
        &OutputSpec::default(),
        PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(conversion.image.orientation, None);
    assert_eq!(conversion.warnings.len(), 1);
}

#[test]
fn test_missing_tile_data_is_fatal() {
    let mut container = FakeContainer::grid(2, 1, 8, 12, 8);
    container.items.remove(&ItemId(101));

    let result = convert(
        &container,
        &SolidDecoder::new(),
        &OutputSpec::default(),
        PipelineConfig::default(),
    );
    assert!(matches!(result, Err(GridError::Container(_))));
}

#[test]
fn test_convert_and_save_upright() {
    init_logger();
    let container = FakeContainer::grid(2, 2, 16, 30, 20);
    let options = ConvertOptions {
        width: 300,
        ..ConvertOptions::default()
    };

    let conversion = convert(
        &container,
        &SolidDecoder::new(),
        &options.output_spec(),
        PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(conversion.path, DecodePath::Grid);

    let path = std::env::temp_dir().join(format!("heifgrid-it-{}.png", std::process::id()));
    save(conversion.image, &path, &options.save_options()).unwrap();
    let written = image::open(&path).unwrap();
    std::fs::remove_file(&path).ok();

    // Rotated 90 degrees the image is 20x30; fitted into 300x300
    assert_eq!((written.width(), written.height()), (200, 300));
}

#[test]
fn test_height_only_request_keeps_grid_and_native_size() {
    let container = FakeContainer {
        exif: None,
        ..FakeContainer::grid(2, 2, 16, 30, 20)
    };
    let options = ConvertOptions {
        height: 200,
        ..ConvertOptions::default()
    };

    let conversion = convert(
        &container,
        &SolidDecoder::new(),
        &options.output_spec(),
        PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(conversion.path, DecodePath::Grid);

    let path = std::env::temp_dir().join(format!("heifgrid-it-h-{}.ppm", std::process::id()));
    save(conversion.image, &path, &options.save_options()).unwrap();
    let written = image::open(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!((written.width(), written.height()), (30, 20));
}

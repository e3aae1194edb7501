//! File-based session tests: round-trips, state machines, and probe/decode
//! parity against real files on disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use zenframes::{
    CodecError, CodecRegistry, Mirror, Orientation, PixelBuffer, PixelFormat, StreamReader,
    StreamWriter,
};

/// Unique scratch path per test, cleaned up by the guard.
fn scratch(extension: &str) -> ScratchFile {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let _ = env_logger::builder().is_test(true).try_init();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "zenframes-test-{}-{n}.{extension}",
        std::process::id()
    ));
    ScratchFile { path }
}

struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Fixed RGB gradient used by the round-trip tests.
fn gradient_rgb(width: u32, height: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(PixelFormat::Rgb8, width, height).unwrap();
    for y in 0..height {
        let row = buffer.row_mut(y);
        for x in 0..width as usize {
            row[x * 3] = (x % 256) as u8;
            row[x * 3 + 1] = (y % 256) as u8;
            row[x * 3 + 2] = ((x + y as usize) % 256) as u8;
        }
    }
    buffer
}

#[cfg(feature = "png")]
#[test]
fn png_roundtrip_is_lossless() {
    let file = scratch("png");
    let original = gradient_rgb(256, 256);
    original.save(&file.path).expect("save");

    let loaded = PixelBuffer::load(&file.path).expect("load");
    assert_eq!(loaded.width(), 256);
    assert_eq!(loaded.height(), 256);
    assert_eq!(loaded.pixel_format(), PixelFormat::Rgb8);
    assert_eq!(loaded.as_bytes(), original.as_bytes());
}

#[cfg(feature = "jpeg")]
#[test]
fn jpeg_roundtrip_is_close() {
    let file = scratch("jpg");
    let original = gradient_rgb(128, 128);
    original.save(&file.path).expect("save");

    let loaded = PixelBuffer::load(&file.path).expect("load");
    assert_eq!(loaded.width(), 128);
    assert_eq!(loaded.height(), 128);
    for (&got, &want) in loaded.as_bytes().iter().zip(original.as_bytes()) {
        assert!(
            (i16::from(got) - i16::from(want)).abs() <= 20,
            "pixel drifted more than tolerance: {got} vs {want}"
        );
    }
}

#[cfg(feature = "png")]
#[test]
fn to_bytes_matches_file_output_semantics() {
    let file = scratch("png");
    let original = gradient_rgb(32, 16);
    original.save(&file.path).expect("save");
    let from_file = std::fs::read(&file.path).expect("read back");

    let from_memory = original.to_bytes("PNG").expect("to_bytes");
    // Same encoder, same options — byte-identical output
    assert_eq!(from_file, from_memory);

    let decoded = PixelBuffer::decode(&from_memory).expect("decode");
    assert_eq!(decoded.as_bytes(), original.as_bytes());
}

#[cfg(feature = "gif")]
#[test]
fn gif_multi_frame_session() {
    let file = scratch("gif");

    let mut frames = Vec::new();
    for shade in [0u8, 128, 255] {
        let mut frame = PixelBuffer::new(PixelFormat::Rgb8, 8, 8).unwrap();
        frame.as_bytes_mut().fill(shade);
        frame.delay_ms = Some(100);
        frames.push(frame);
    }

    let mut writer = StreamWriter::create(&file.path).expect("create");
    writer.write_all(&frames).expect("write frames");
    assert_eq!(writer.frames_written(), 3);
    writer.finish().expect("finish");
    writer.finish().expect("finish again");

    let mut reader = StreamReader::open(&file.path).expect("open");
    let loaded = reader.read_all().expect("read all");
    assert_eq!(loaded.len(), 3);
    for frame in &loaded {
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.pixel_format(), PixelFormat::Rgba8);
        assert_eq!(frame.delay_ms, Some(100));
    }
    // Solid frames survive quantization exactly
    assert_eq!(&loaded[0].as_bytes()[..4], &[0, 0, 0, 255]);
    assert_eq!(&loaded[2].as_bytes()[..4], &[255, 255, 255, 255]);
}

#[cfg(feature = "pnm")]
#[test]
fn pnm_16bit_roundtrip() {
    let file = scratch("pgm");
    let mut original = PixelBuffer::new(PixelFormat::Gray16, 5, 3).unwrap();
    let values: Vec<u8> = (0..original.pixels_size()).map(|i| (i * 37) as u8).collect();
    original.as_bytes_mut().copy_from_slice(&values);

    original.save(&file.path).expect("save");
    let loaded = PixelBuffer::load(&file.path).expect("load");
    assert_eq!(loaded.pixel_format(), PixelFormat::Gray16);
    assert_eq!(loaded.as_bytes(), original.as_bytes());
}

#[cfg(feature = "png")]
#[test]
fn probe_matches_decode_without_decoding() {
    let file = scratch("png");
    let original = gradient_rgb(64, 48);
    original.save(&file.path).expect("save");

    let report = StreamReader::probe(&file.path).expect("probe");
    assert_eq!(report.codec.name, "PNG");
    assert_eq!(report.width, Some(64));
    assert_eq!(report.height, Some(48));
    assert_eq!(report.pixel_format, Some(PixelFormat::Rgb8));
    assert_eq!(report.bits_per_pixel, Some(24));

    let decoded = PixelBuffer::load(&file.path).expect("load");
    assert_eq!(Some(decoded.width()), report.width);
    assert_eq!(Some(decoded.height()), report.height);
}

#[cfg(feature = "png")]
#[test]
fn reader_state_machine_on_files() {
    let file = scratch("png");
    gradient_rgb(16, 16).save(&file.path).expect("save");

    let mut reader = StreamReader::open(&file.path).expect("open");
    let frame = reader.read().expect("first frame");
    assert_eq!(frame.width(), 16);

    // Exhausted is sticky until finish() switches the error
    assert!(matches!(reader.read(), Err(CodecError::NoMoreFrames)));
    assert!(matches!(reader.read(), Err(CodecError::NoMoreFrames)));
    reader.finish().expect("finish");
    reader.finish().expect("finish twice");
    assert!(matches!(reader.read(), Err(CodecError::SessionFinished)));
}

#[cfg(feature = "png")]
#[test]
fn finish_releases_the_file_handle() {
    let file = scratch("png");
    gradient_rgb(8, 8).save(&file.path).expect("save");

    let mut reader = StreamReader::open(&file.path).expect("open");
    let _ = reader.read().expect("frame");
    reader.finish().expect("finish");
    // With the handle released the file can be removed out from under the session
    std::fs::remove_file(&file.path).expect("delete after finish");
    assert!(matches!(reader.read(), Err(CodecError::SessionFinished)));
}

#[test]
fn registry_rejects_empty_extension() {
    assert!(matches!(
        CodecRegistry::global().from_extension(""),
        Err(CodecError::NoCodec(_))
    ));
}

#[test]
fn zero_width_construction_fails() {
    assert!(matches!(
        PixelBuffer::new(PixelFormat::Rgb8, 0, 256),
        Err(CodecError::InvalidArgument(_))
    ));
}

#[test]
fn missing_source_is_a_typed_io_error() {
    let result = StreamReader::open("/no/such/dir/missing.png");
    match result {
        Err(CodecError::Io { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[cfg(all(feature = "png", feature = "gif"))]
#[test]
fn concurrent_sessions_are_independent() {
    let png_file = scratch("png");
    let gif_file = scratch("gif");
    gradient_rgb(12, 12).save(&png_file.path).expect("png");
    let mut gif_frame = PixelBuffer::new(PixelFormat::Rgb8, 6, 6).unwrap();
    gif_frame.as_bytes_mut().fill(42);
    gif_frame.save(&gif_file.path).expect("gif");

    let mut a = StreamReader::open(&png_file.path).expect("open png");
    let mut b = StreamReader::open(&gif_file.path).expect("open gif");
    let pa = a.read().expect("png frame");
    let pb = b.read().expect("gif frame");
    assert_eq!(pa.width(), 12);
    assert_eq!(pb.width(), 6);
}

#[cfg(feature = "png")]
#[test]
fn save_pipeline_with_conversion_and_transform() {
    let file = scratch("png");
    let codec = CodecRegistry::global().from_extension("png").expect("codec");

    // BGRA is not a PNG save format; convert_for_save picks an RGBA target
    let mut frame = gradient_rgb(20, 10)
        .convert_to(PixelFormat::Bgra8)
        .expect("to bgra");
    frame.rotate(Orientation::Rotate90);
    frame.mirror(Mirror::Horizontal);
    assert_eq!((frame.width(), frame.height()), (10, 20));

    frame
        .convert_for_save(codec.save_features.as_ref().expect("save features"))
        .expect("convert for save");
    assert!(
        codec
            .save_features
            .as_ref()
            .unwrap()
            .supports_pixel_format(frame.pixel_format())
    );

    frame.save(&file.path).expect("save");
    let loaded = PixelBuffer::load(&file.path).expect("load");
    assert_eq!((loaded.width(), loaded.height()), (10, 20));
}

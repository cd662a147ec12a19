//! Round trips through the public API with the sandbox backend selected.
//!
//! The sandbox is configured with the stored-block fixture guest from the
//! sandbox crate's tests, so these run without a real LZHAM build.

#![cfg(any(
    feature = "force-sandbox",
    all(feature = "sandbox", not(feature = "native"))
))]

use std::path::PathBuf;
use std::sync::Once;

use lzham_bridge::{CodecError, SandboxConfig};

static CONFIGURE: Once = Once::new();

fn setup() {
    CONFIGURE.call_once(|| {
        let config = SandboxConfig {
            module_path: Some(
                PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                    .join("crates/lzham-bridge-sandbox/tests/fixtures/stored_codec.wat"),
            ),
            ..Default::default()
        };
        lzham_bridge::configure(config).unwrap();
        lzham_bridge::prepare().unwrap();
    });
}

#[test]
fn test_hello_world() {
    setup();
    let source = b"hello world";

    let mut compressed = [0u8; 64];
    let packed = lzham_bridge::compress(&mut compressed, source).unwrap();
    assert!(packed.written > 0);
    assert_eq!(packed.crc32, crc32fast::hash(source));

    let mut restored = [0u8; 11];
    let unpacked = lzham_bridge::decompress(&mut restored, &compressed[..packed.written]).unwrap();
    assert_eq!(unpacked.written, source.len());
    assert_eq!(&restored, source);
    assert_eq!(unpacked.adler32, packed.adler32);
    assert_eq!(unpacked.crc32, packed.crc32);
}

#[test]
fn test_sizes() {
    setup();

    for size in [1usize, 16, 4096, 1 << 20] {
        let source: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();

        let mut compressed = vec![0u8; size + 64];
        let packed = lzham_bridge::compress(&mut compressed, &source).unwrap();

        let mut restored = vec![0u8; size];
        let unpacked =
            lzham_bridge::decompress(&mut restored, &compressed[..packed.written]).unwrap();

        assert_eq!(unpacked.written, size, "size {size}");
        assert_eq!(restored, source, "size {size}");
        assert_eq!(unpacked.crc32, crc32fast::hash(&source), "size {size}");
        assert_eq!(unpacked.adler32, packed.adler32, "size {size}");
    }
}

#[test]
fn test_destination_too_small_is_codec_error() {
    setup();
    let source = vec![7u8; 256];
    let mut destination = [0u8; 8];

    let err = lzham_bridge::compress(&mut destination, &source).unwrap_err();
    match err {
        CodecError::Codec { ref message, .. } => {
            assert_eq!(message, "output buffer too small");
            assert!(err.to_string().starts_with("lzham: "));
        }
        other => panic!("expected codec error, got {other:?}"),
    }
}

#[test]
fn test_reconfigure_after_prepare_is_rejected() {
    setup();
    assert!(lzham_bridge::configure(SandboxConfig::default()).is_err());
}

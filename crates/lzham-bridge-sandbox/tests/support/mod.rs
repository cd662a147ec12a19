//! Helpers shared by the sandbox integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use lzham_bridge_common::SandboxConfig;
use lzham_bridge_sandbox::SandboxCodec;

/// Stored-block guest implementing the codec exports.
pub const STORED_CODEC_WAT: &str = include_str!("../fixtures/stored_codec.wat");

/// Bytes the stored format adds in front of the payload.
pub const STORED_HEADER_LEN: usize = 5;

pub const STATUS_DEST_TOO_SMALL: u32 = 1;
pub const STATUS_BAD_CODE: u32 = 2;
pub const STATUS_UNMAPPED: u32 = 7;

/// First source bytes that steer the fixture's decompressor.
pub const TAG_TRAP: u8 = 0xDD;
pub const TAG_UNTERMINATED: u8 = 0xEE;
pub const TAG_UNMAPPED: u8 = 0xEF;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stored_codec.wat")
}

pub fn stored_codec(config: &SandboxConfig) -> SandboxCodec {
    SandboxCodec::from_module_bytes(config, STORED_CODEC_WAT.as_bytes()).unwrap()
}

/// Reference Adler-32.
pub fn adler32(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + u32::from(byte)) % 65_521;
        b = (b + a) % 65_521;
    }
    (b << 16) | a
}

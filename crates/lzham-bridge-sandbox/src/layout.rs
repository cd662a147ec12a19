//! Guest memory layout for a single call.
//!
//! One allocation from the guest's own allocator holds everything a call
//! exchanges with the guest, in this order:
//!
//! ```text
//! base
//!  ├─ +0   u32 length   capacity in, bytes written out
//!  ├─ +4   u32 adler32  zeroed in, checksum out
//!  ├─ +8   u32 crc32    zeroed in, checksum out
//!  ├─ +12  destination  `capacity` bytes
//!  └─ ...  source       `source_len` bytes
//! ```
//!
//! All integers are little-endian, as WebAssembly memory is.

use lzham_bridge_common::CodecError;

/// Size of the length and checksum fields that precede the buffers.
pub const HEADER_LEN: u32 = 12;

/// Longest error message, terminator included, read back from guest memory.
///
/// The guest makes no promise about message length; this bound is ours. A
/// message with no NUL within this many bytes is reported as a
/// [`CodecError::Protocol`] error rather than truncated.
pub const MAX_ERROR_MESSAGE_LEN: usize = 128;

/// Offsets of one call's fields inside guest memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestLayout {
    base: u32,
    capacity: u32,
    source_len: u32,
}

impl GuestLayout {
    /// Number of bytes to request from the guest allocator.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InputValidation`] if the buffers cannot fit in a
    /// 32-bit guest address space.
    pub fn allocation_size(capacity: usize, source_len: usize) -> Result<u32, CodecError> {
        let too_large = || {
            CodecError::input_validation(format!(
                "buffers of {capacity} + {source_len} bytes exceed the 32-bit guest address space"
            ))
        };

        let capacity = u32::try_from(capacity).map_err(|_| too_large())?;
        let source_len = u32::try_from(source_len).map_err(|_| too_large())?;

        HEADER_LEN
            .checked_add(capacity)
            .and_then(|n| n.checked_add(source_len))
            .ok_or_else(too_large)
    }

    /// Lay out a call at `base`, the pointer returned by the guest allocator.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Protocol`] if the region would wrap around the
    /// guest address space.
    pub fn new(base: u32, capacity: usize, source_len: usize) -> Result<Self, CodecError> {
        let size = Self::allocation_size(capacity, source_len)?;
        if base.checked_add(size).is_none() {
            return Err(CodecError::protocol(format!(
                "guest allocation of {size} bytes at {base:#x} overflows guest memory"
            )));
        }

        // Both fit in u32: `allocation_size` checked them.
        #[allow(clippy::cast_possible_truncation)]
        let (capacity, source_len) = (capacity as u32, source_len as u32);

        Ok(Self {
            base,
            capacity,
            source_len,
        })
    }

    /// Offset of the length field.
    pub fn length(&self) -> u32 {
        self.base
    }

    /// Offset of the adler32 field.
    pub fn adler32(&self) -> u32 {
        self.base + 4
    }

    /// Offset of the crc32 field.
    pub fn crc32(&self) -> u32 {
        self.base + 8
    }

    /// Offset of the destination region.
    pub fn destination(&self) -> u32 {
        self.base + HEADER_LEN
    }

    /// Offset of the source region.
    pub fn source(&self) -> u32 {
        self.destination() + self.capacity
    }

    /// Declared destination capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Source length.
    pub fn source_len(&self) -> u32 {
        self.source_len
    }

    /// Initial header bytes: capacity in the length field, zeroed checksums.
    pub fn initial_header(&self) -> [u8; HEADER_LEN as usize] {
        let mut header = [0u8; HEADER_LEN as usize];
        header[..4].copy_from_slice(&self.capacity.to_le_bytes());
        header
    }
}

/// The three output fields read back after a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestHeader {
    pub length: u32,
    pub adler32: u32,
    pub crc32: u32,
}

impl GuestHeader {
    /// Decode the header fields.
    pub fn decode(bytes: &[u8; HEADER_LEN as usize]) -> Self {
        let field =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            length: field(0),
            adler32: field(4),
            crc32: field(8),
        }
    }
}

/// Read a NUL-terminated error message from guest memory.
///
/// At most [`MAX_ERROR_MESSAGE_LEN`] bytes starting at `ptr` are examined,
/// fewer if memory ends first.
///
/// # Errors
///
/// Returns [`CodecError::Protocol`] if `ptr` is outside `memory`, no
/// terminator is found within the bound, or the message is not UTF-8.
pub fn read_error_message(memory: &[u8], ptr: u32) -> Result<String, CodecError> {
    let start = ptr as usize;
    let Some(tail) = memory.get(start..) else {
        return Err(CodecError::protocol(format!(
            "strerror returned {ptr:#x}, outside {} bytes of guest memory",
            memory.len()
        )));
    };

    let window = &tail[..tail.len().min(MAX_ERROR_MESSAGE_LEN)];
    let Some(end) = window.iter().position(|&b| b == 0) else {
        return Err(CodecError::protocol(format!(
            "strerror returned an invalid string: no terminator within {MAX_ERROR_MESSAGE_LEN} bytes"
        )));
    };

    std::str::from_utf8(&window[..end])
        .map(str::to_owned)
        .map_err(|e| CodecError::protocol(format!("strerror returned a non-UTF-8 string: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        let layout = GuestLayout::new(1000, 64, 11).unwrap();

        assert_eq!(layout.length(), 1000);
        assert_eq!(layout.adler32(), 1004);
        assert_eq!(layout.crc32(), 1008);
        assert_eq!(layout.destination(), 1012);
        assert_eq!(layout.source(), 1076);
        assert_eq!(GuestLayout::allocation_size(64, 11).unwrap(), 87);
    }

    #[test]
    fn test_initial_header() {
        let layout = GuestLayout::new(8, 0x0102_0304, 1).unwrap();

        assert_eq!(
            layout.initial_header(),
            [0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_header_decode() {
        let bytes = [5, 0, 0, 0, 0x78, 0x56, 0x34, 0x12, 0xff, 0xff, 0xff, 0xff];
        let header = GuestHeader::decode(&bytes);

        assert_eq!(header.length, 5);
        assert_eq!(header.adler32, 0x1234_5678);
        assert_eq!(header.crc32, u32::MAX);
    }

    #[test]
    fn test_allocation_size_overflow() {
        let result = GuestLayout::allocation_size(u32::MAX as usize - 4, 16);
        assert!(matches!(result, Err(CodecError::InputValidation { .. })));
    }

    #[test]
    fn test_layout_wraps_address_space() {
        let result = GuestLayout::new(u32::MAX - 8, 16, 16);
        assert!(matches!(result, Err(CodecError::Protocol { .. })));
    }

    #[test]
    fn test_read_error_message() {
        let mut memory = vec![0u8; 256];
        memory[32..40].copy_from_slice(b"bad code");

        assert_eq!(read_error_message(&memory, 32).unwrap(), "bad code");
    }

    #[test]
    fn test_read_error_message_at_bound() {
        let mut memory = vec![b'x'; 512];
        memory[100 + MAX_ERROR_MESSAGE_LEN - 1] = 0;

        let message = read_error_message(&memory, 100).unwrap();
        assert_eq!(message.len(), MAX_ERROR_MESSAGE_LEN - 1);
    }

    #[test]
    fn test_read_error_message_not_utf8() {
        let mut memory = vec![0u8; 64];
        memory[8..19].copy_from_slice(b"bad \xff\xfe code");

        let result = read_error_message(&memory, 8);
        assert!(matches!(result, Err(CodecError::Protocol { .. })), "got {result:?}");
    }

    #[test]
    fn test_read_error_message_unterminated() {
        let memory = vec![b'x'; 512];

        let result = read_error_message(&memory, 100);
        assert!(matches!(result, Err(CodecError::Protocol { .. })));
    }

    #[test]
    fn test_read_error_message_end_of_memory() {
        let mut memory = vec![0u8; 64];
        memory[60..64].copy_from_slice(b"oops");

        let result = read_error_message(&memory, 60);
        assert!(matches!(result, Err(CodecError::Protocol { .. })));
    }

    #[test]
    fn test_read_error_message_out_of_bounds() {
        let memory = vec![0u8; 64];

        let result = read_error_message(&memory, 4096);
        assert!(matches!(result, Err(CodecError::Protocol { .. })));
    }
}

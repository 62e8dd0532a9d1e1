// Protocol constants for the GDM 70x RS232 stream

use std::time::Duration;

/// Byte opening every frame
pub const FRAME_START: u8 = 0x02;

/// Byte closing every frame
pub const FRAME_END: u8 = 0x03;

/// Frame-type byte announcing an image record
pub const IMAGE_TAG: u8 = b'Z';

/// Start marker plus frame-type byte
pub const HEADER_SIZE: usize = 2;

/// Size of a complete value record (2 header + 23 text + 1 terminator)
pub const VALUE_FRAME_SIZE: usize = 26;

/// Size of one channel's text field inside a value record
pub const VALUE_FIELD_SIZE: usize = 12;

/// Offset of the primary channel field (it starts with the frame-type byte)
pub const PRIMARY_FIELD_OFFSET: usize = 1;

/// Offset of the secondary channel field
pub const SECONDARY_FIELD_OFFSET: usize = 13;

/// Image width in pixels
pub const IMAGE_WIDTH: usize = 128;

/// Image height in pixels
pub const IMAGE_HEIGHT: usize = 64;

/// Size of the packed image plane (one bit per pixel)
pub const IMAGE_DATA_SIZE: usize = IMAGE_WIDTH * IMAGE_HEIGHT / 8;

/// Size of a complete image record (2 header + 1024 data + 1 terminator)
pub const IMAGE_FRAME_SIZE: usize = HEADER_SIZE + IMAGE_DATA_SIZE + 1;

/// Largest read issued while receiving an image record
pub const IMAGE_CHUNK_SIZE: usize = 24;

/// Probes the synchronizer may spend before giving up
pub const SYNC_PROBE_BUDGET: usize = 1026;

/// Line speed of the meter's RS232 interface
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Read timeout applied to every transport read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyS0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

const _: () = assert!(SECONDARY_FIELD_OFFSET + VALUE_FIELD_SIZE == VALUE_FRAME_SIZE - 1);
const _: () = assert!(PRIMARY_FIELD_OFFSET + VALUE_FIELD_SIZE == SECONDARY_FIELD_OFFSET);
const _: () = assert!(IMAGE_FRAME_SIZE == 1027);

//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
#[allow(unused_imports)]
pub use gdm70x_lib::constants::{FRAME_END, FRAME_START, IMAGE_DATA_SIZE, IMAGE_TAG, VALUE_FRAME_SIZE};
#[allow(unused_imports)]
pub use gdm70x_lib::{Config, GdmError, Gdm70x, Image, Measurement, Multiplier, Reading, Transport, Unit};

use std::io::{self, Read};

/// Scripted transport: hands out the queued bytes, at most `max_read` per
/// read, and reports a timeout (zero-byte read) once they run out.
pub struct MockTransport {
    data: Bytes,
    max_read: usize,
    pub reads: usize,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            max_read: usize::MAX,
            reads: 0,
        }
    }

    /// Deliver at most `max_read` bytes per read call.
    pub fn with_max_read(mut self, max_read: usize) -> Self {
        self.max_read = max_read;
        self
    }

    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let n = buf.len().min(self.max_read).min(self.data.remaining());
        self.data.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl Transport for MockTransport {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(self.data.remaining())
    }
}

/// A 12-byte value field from its text.
#[allow(dead_code)]
pub fn field(text: &str) -> [u8; 12] {
    text.as_bytes()
        .try_into()
        .unwrap_or_else(|_| panic!("field {:?} is {} bytes, expected 12", text, text.len()))
}

/// A complete value record. The primary field starts with the frame-type byte.
#[allow(dead_code)]
pub fn value_frame(primary: &str, secondary: &str) -> Vec<u8> {
    let mut frame = BytesMut::with_capacity(VALUE_FRAME_SIZE);
    frame.put_u8(FRAME_START);
    frame.put_slice(&field(primary));
    frame.put_slice(&field(secondary));
    frame.put_u8(FRAME_END);
    frame.to_vec()
}

/// A complete image record around `data`.
#[allow(dead_code)]
pub fn image_frame(data: &[u8]) -> Vec<u8> {
    assert_eq!(data.len(), IMAGE_DATA_SIZE);
    let mut frame = BytesMut::with_capacity(IMAGE_DATA_SIZE + 3);
    frame.put_u8(FRAME_START);
    frame.put_u8(IMAGE_TAG);
    frame.put_slice(data);
    frame.put_u8(FRAME_END);
    frame.to_vec()
}

/// Frame the synchronizer consumes before the frames under test.
#[allow(dead_code)]
pub fn sync_frame() -> Vec<u8> {
    value_frame("D  0.000 Vdc", "A  0.000 Vac")
}

/// `sync_frame()` followed by `frames`.
#[allow(dead_code)]
pub fn synced_stream(frames: &[Vec<u8>]) -> Bytes {
    let mut stream = BytesMut::new();
    stream.put_slice(&sync_frame());
    for frame in frames {
        stream.put_slice(frame);
    }
    stream.freeze()
}

/// Connection over `stream` with default settings.
#[allow(dead_code)]
pub fn connect(stream: Bytes) -> Gdm70x<MockTransport> {
    Gdm70x::new(MockTransport::new(stream), Config::default())
}

#[allow(dead_code)]
pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {}, got {}",
        expected,
        actual
    );
}

use crate::constants::{HEADER_SIZE, IMAGE_DATA_SIZE, IMAGE_HEIGHT, IMAGE_WIDTH};
use crate::error::GdmError;

/// Number of pixels in the image plane
pub const IMAGE_BITS: usize = IMAGE_DATA_SIZE * 8;

/// A 128x64 monochrome screen dump.
///
/// Pixels are stored row-major, one bit per pixel, most significant bit
/// first. A set bit is a dark pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    plane: Vec<u8>,
}

impl Image {
    /// Allocate a blank image, reporting allocation failure instead of aborting.
    pub fn try_new() -> Result<Self, GdmError> {
        let mut plane = Vec::new();
        plane
            .try_reserve_exact(IMAGE_DATA_SIZE)
            .map_err(|_| GdmError::ResourceExhausted)?;
        plane.resize(IMAGE_DATA_SIZE, 0);
        Ok(Self { plane })
    }

    pub fn clear(&mut self) {
        self.plane.fill(0);
    }

    pub fn width(&self) -> usize {
        IMAGE_WIDTH
    }

    pub fn height(&self) -> usize {
        IMAGE_HEIGHT
    }

    /// Whether the pixel at `(row, col)` is dark. Out-of-range coordinates read as blank.
    pub fn pixel(&self, row: usize, col: usize) -> bool {
        if row >= IMAGE_HEIGHT || col >= IMAGE_WIDTH {
            return false;
        }
        let index = row * IMAGE_WIDTH + col;
        self.plane[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Pixels of one row, left to right.
    pub fn row(&self, row: usize) -> impl Iterator<Item = bool> + '_ {
        (0..IMAGE_WIDTH).map(move |col| self.pixel(row, col))
    }

    /// Number of dark pixels
    pub fn count_set(&self) -> usize {
        self.plane.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// The packed 1024-byte plane.
    pub fn as_bytes(&self) -> &[u8] {
        &self.plane
    }

    /// Unpack a chunk of an image record into the plane.
    ///
    /// `frame_offset` is the position of `chunk[0]` within the record, so the
    /// first data byte sits at offset 2. Each data byte carries a vertical
    /// strip of 8 pixels, least significant bit on top; the strips fill
    /// 128-column bands of 8 rows. Bytes that fall outside the plane, such as
    /// the header or the end marker, are ignored.
    pub fn unpack_chunk(&mut self, frame_offset: usize, chunk: &[u8]) {
        for (k, &byte) in chunk.iter().enumerate() {
            if frame_offset + k < HEADER_SIZE {
                continue;
            }
            for bit in 0..8 {
                if byte & (1 << bit) == 0 {
                    continue;
                }
                let dest = destination_bit(frame_offset, k * 8 + bit);
                if dest >= IMAGE_BITS {
                    // later bits land on even lower rows
                    break;
                }
                self.plane[dest / 8] |= 0x80 >> (dest % 8);
            }
        }
    }
}

/// Pixel index receiving source bit `s` of a chunk that starts at `frame_offset`.
pub fn destination_bit(frame_offset: usize, s: usize) -> usize {
    let position = (frame_offset + s / 8).saturating_sub(HEADER_SIZE);
    let row_block = position / IMAGE_WIDTH;
    let col = position % IMAGE_WIDTH;
    col + (row_block * 8 + s % 8) * IMAGE_WIDTH
}

use crate::constants::{
    FRAME_END, IMAGE_TAG, PRIMARY_FIELD_OFFSET, SECONDARY_FIELD_OFFSET, VALUE_FIELD_SIZE,
    VALUE_FRAME_SIZE,
};
use std::fmt;

/// Kind of record announced by the byte following the start marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Two-channel measurement text record
    Value,
    /// 128x64 screen dump
    Image,
}

impl FrameKind {
    pub fn from_tag(tag: u8) -> Self {
        if tag == IMAGE_TAG { FrameKind::Image } else { FrameKind::Value }
    }

    /// Bytes between the frame-type byte and the end marker.
    pub fn body_len(&self) -> usize {
        match self {
            FrameKind::Value => VALUE_FRAME_SIZE - 3,
            FrameKind::Image => crate::constants::IMAGE_DATA_SIZE,
        }
    }
}

/// Which of the meter's two displays a value field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Primary,
    Secondary,
}

impl Channel {
    pub fn field_offset(&self) -> usize {
        match self {
            Channel::Primary => PRIMARY_FIELD_OFFSET,
            Channel::Secondary => SECONDARY_FIELD_OFFSET,
        }
    }
}

/// A complete 26-byte value record as received from the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ValueFrame {
    bytes: [u8; VALUE_FRAME_SIZE],
}

impl ValueFrame {
    pub fn new(bytes: [u8; VALUE_FRAME_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn is_terminated(&self) -> bool {
        self.bytes[VALUE_FRAME_SIZE - 1] == FRAME_END
    }

    /// The 12-byte text field of `channel`.
    pub fn field(&self, channel: Channel) -> [u8; VALUE_FIELD_SIZE] {
        let offset = channel.field_offset();
        let mut field = [0u8; VALUE_FIELD_SIZE];
        field.copy_from_slice(&self.bytes[offset..offset + VALUE_FIELD_SIZE]);
        field
    }

    pub fn as_bytes(&self) -> &[u8; VALUE_FRAME_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for ValueFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueFrame")
            .field("bytes", &hex::encode(self.bytes))
            .finish()
    }
}

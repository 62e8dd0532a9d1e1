use crate::config::Config;
use crate::constants::{
    FRAME_END, FRAME_START, HEADER_SIZE, IMAGE_CHUNK_SIZE, IMAGE_FRAME_SIZE, VALUE_FRAME_SIZE,
};
use crate::error::{GdmError, Result};
use crate::frame::{Channel, FrameKind, ValueFrame};
use crate::image::Image;
use crate::transport::{self, Transport};
use crate::value::Measurement;
use chrono::{DateTime, Utc};
use serialport::SerialPort;
use std::error::Error as StdError;
use std::fmt;
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a user callback. An `Err` aborts the running cycle.
pub type CallbackResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

type ValueCallback = Box<dyn FnMut(&Reading) -> CallbackResult>;
type ImageCallback = Box<dyn FnMut(&Image) -> CallbackResult>;

/// The two channels of the most recent value record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    pub primary: Measurement,
    pub secondary: Measurement,
    /// When the record's header arrived; `None` until the first record
    pub received_at: Option<DateTime<Utc>>,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DATA1: {}; DATA2: {}", self.primary, self.secondary)
    }
}

/// A connection to a Voltcraft GDM 70x.
///
/// Owns the transport, the synchronization state and the last decoded
/// record. All methods take `&mut self`; the connection is meant to be
/// driven from a single thread.
pub struct Gdm70x<T: Transport> {
    transport: T,
    config: Config,
    synced: bool,
    reading: Reading,
    image: Option<Image>,
    on_values: Option<ValueCallback>,
    on_image: Option<ImageCallback>,
}

impl Gdm70x<Box<dyn SerialPort>> {
    /// Open the serial device at `path` and wrap it in a connection.
    pub fn open(path: &str, config: Config) -> Result<Self> {
        let port = transport::open_serial(path, &config)?;
        Ok(Self::new(port, config))
    }
}

impl<T: Transport> Gdm70x<T> {
    /// Wrap an already configured transport.
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            synced: false,
            reading: Reading::default(),
            image: None,
            on_values: None,
            on_image: None,
        }
    }

    /// Release the transport.
    pub fn close(self) -> T {
        self.transport
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Last decoded record
    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn primary(&self) -> &Measurement {
        &self.reading.primary
    }

    pub fn secondary(&self) -> &Measurement {
        &self.reading.secondary
    }

    /// Bytes already received by the transport and not yet consumed.
    pub fn bytes_pending(&mut self) -> Result<usize> {
        Ok(self.transport.bytes_to_read()?)
    }

    /// The image buffer; only present while an image callback is registered.
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// Register the callback run after each value record.
    pub fn set_value_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&Reading) -> CallbackResult + 'static,
    {
        self.on_values = Some(Box::new(callback));
    }

    pub fn clear_value_callback(&mut self) {
        self.on_values = None;
    }

    /// Register the callback run after each image record and allocate the image buffer.
    pub fn set_image_callback<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&Image) -> CallbackResult + 'static,
    {
        if self.image.is_none() {
            match Image::try_new() {
                Ok(image) => self.image = Some(image),
                Err(e) => {
                    warn!("Could not allocate image buffer, image callback not set");
                    self.on_image = None;
                    return Err(e);
                }
            }
        }
        self.on_image = Some(Box::new(callback));
        Ok(())
    }

    /// Drop the image callback and free the image buffer.
    pub fn clear_image_callback(&mut self) {
        self.on_image = None;
        self.image = None;
    }

    /// Align with the frame boundaries of the stream.
    ///
    /// Hunts for a start marker, skips the body of the frame it announces and
    /// checks the end marker. Every byte examined while hunting and every
    /// rejected candidate costs one probe out of `sync_probe_budget`.
    pub fn sync(&mut self) -> Result<()> {
        self.synced = false;
        let mut probes = self.config.sync_probe_budget;
        let mut byte = [0u8; 1];
        let mut scratch = [0u8; IMAGE_CHUNK_SIZE];

        while probes > 0 {
            self.read(&mut byte)?;
            probes -= 1;
            if byte[0] != FRAME_START {
                continue;
            }

            self.read(&mut byte)?;
            let kind = FrameKind::from_tag(byte[0]);
            let mut remaining = kind.body_len();
            while remaining > 0 {
                let n = remaining.min(scratch.len());
                self.read(&mut scratch[..n])?;
                remaining -= n;
            }

            self.read(&mut byte)?;
            if byte[0] == FRAME_END {
                self.synced = true;
                debug!(?kind, probes_left = probes, "synced");
                return Ok(());
            }
            trace!(?kind, terminator = byte[0], "rejected frame candidate");
            probes = probes.saturating_sub(1);
        }

        Err(GdmError::SyncLost(format!(
            "no frame boundary within {} probes",
            self.config.sync_probe_budget
        )))
    }

    /// Receive and dispatch frames.
    ///
    /// Reads one frame and hands it to the matching callback. With
    /// `skip_value_callback` set, keeps consuming frames while a full value
    /// record is already buffered, then reports the last decoded values once,
    /// even if the cycle only carried images.
    pub fn run_cycle(&mut self, skip_value_callback: bool) -> Result<()> {
        if !self.synced {
            debug!("not synced, trying to sync");
            self.sync().map_err(|e| match e {
                GdmError::Timeout | GdmError::SyncLost(_) => {
                    warn!("sync failed: {}", e);
                    GdmError::SyncLost(format!("resynchronization failed: {}", e))
                }
                other => other,
            })?;
        }

        loop {
            let mut header = [0u8; HEADER_SIZE];
            self.read(&mut header)?;
            if header[0] != FRAME_START {
                return Err(self.lose_sync(format!("expected start marker, got {:#04x}", header[0])));
            }
            let received_at = Utc::now();

            match FrameKind::from_tag(header[1]) {
                FrameKind::Image => self.receive_image()?,
                FrameKind::Value => {
                    self.receive_values(header, received_at)?;
                    if !skip_value_callback {
                        self.notify_values()?;
                    }
                }
            }

            let pending = self.transport.bytes_to_read()?;
            if !(skip_value_callback && pending >= VALUE_FRAME_SIZE) {
                break;
            }
            trace!(pending, "draining buffered frames");
        }

        if skip_value_callback {
            self.notify_values()?;
        }
        Ok(())
    }

    fn receive_values(&mut self, header: [u8; HEADER_SIZE], received_at: DateTime<Utc>) -> Result<()> {
        let mut bytes = [0u8; VALUE_FRAME_SIZE];
        bytes[..HEADER_SIZE].copy_from_slice(&header);
        self.read(&mut bytes[HEADER_SIZE..])?;
        let frame = ValueFrame::new(bytes);
        trace!(frame = hex::encode(frame.as_bytes()), "value frame");

        if !frame.is_terminated() {
            return Err(self.lose_sync(format!(
                "value frame ends with {:#04x}",
                bytes[VALUE_FRAME_SIZE - 1]
            )));
        }

        let separator = self.config.decimal_separator;
        let secondary = Measurement::decode(&frame.field(Channel::Secondary), separator);
        let primary = Measurement::decode(&frame.field(Channel::Primary), separator);

        self.reading = Reading {
            primary,
            secondary,
            received_at: Some(received_at),
        };
        debug!(reading = %self.reading, "value record");
        Ok(())
    }

    fn receive_image(&mut self) -> Result<()> {
        if let Some(image) = self.image.as_mut() {
            image.clear();
        }

        let mut chunk = [0u8; IMAGE_CHUNK_SIZE];
        let mut offset = HEADER_SIZE;
        let mut last = 0u8;
        while offset < IMAGE_FRAME_SIZE {
            let n = (IMAGE_FRAME_SIZE - offset).min(IMAGE_CHUNK_SIZE);
            self.read(&mut chunk[..n])?;
            if let Some(image) = self.image.as_mut() {
                image.unpack_chunk(offset, &chunk[..n]);
            }
            last = chunk[n - 1];
            offset += n;
        }

        if last != FRAME_END {
            return Err(self.lose_sync(format!("image frame ends with {:#04x}", last)));
        }

        match (self.on_image.as_mut(), self.image.as_ref()) {
            (Some(callback), Some(image)) => {
                callback(image).map_err(GdmError::CallbackAborted)?;
            }
            _ => debug!("image dropped"),
        }
        Ok(())
    }

    fn notify_values(&mut self) -> Result<()> {
        if let Some(callback) = self.on_values.as_mut() {
            callback(&self.reading).map_err(GdmError::CallbackAborted)?;
        }
        Ok(())
    }

    /// Read exactly `buf.len()` bytes; any failure drops synchronization.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        transport::read_exact(&mut self.transport, buf).inspect_err(|_| self.synced = false)
    }

    fn lose_sync(&mut self, reason: String) -> GdmError {
        warn!("sync lost: {}", reason);
        self.synced = false;
        GdmError::SyncLost(reason)
    }
}


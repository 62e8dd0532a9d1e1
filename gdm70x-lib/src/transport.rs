use crate::config::Config;
use crate::error::GdmError;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Cursor, ErrorKind, Read};
use tracing::{debug, info, trace};

/// Byte stream the meter talks over.
///
/// A read that returns zero bytes, or fails with `TimedOut`/`WouldBlock`,
/// means nothing arrived within the transport's read window.
pub trait Transport: Read {
    /// Number of bytes that can be read right now without blocking.
    fn bytes_to_read(&mut self) -> io::Result<usize>;
}

impl Transport for Box<dyn SerialPort> {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(SerialPort::bytes_to_read(&**self)? as usize)
    }
}

/// Replays a captured byte stream. The end of the capture reads as a timeout.
impl<T: AsRef<[u8]>> Transport for Cursor<T> {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let len = self.get_ref().as_ref().len() as u64;
        Ok(len.saturating_sub(self.position()) as usize)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        (**self).bytes_to_read()
    }
}

/// Fill `buf` completely, issuing as many reads as needed.
///
/// A read that delivers nothing ends the call with [`GdmError::Timeout`];
/// it is not retried here. Interrupted reads are retried.
pub fn read_exact<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Result<usize, GdmError> {
    let mut filled = 0;
    while filled < buf.len() {
        match transport.read(&mut buf[filled..]) {
            Ok(0) => {
                trace!(wanted = buf.len(), got = filled, "read timeout");
                return Err(GdmError::Timeout);
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                trace!(wanted = buf.len(), got = filled, "read timeout");
                return Err(GdmError::Timeout);
            }
            Err(e) => return Err(GdmError::Io(e)),
        }
    }
    Ok(filled)
}

/// Open and configure the serial line for a GDM 70x.
///
/// 8N1 without flow control, at the configured baud rate and read timeout.
/// Input that queued up before opening is discarded.
pub fn open_serial(path: &str, config: &Config) -> Result<Box<dyn SerialPort>, GdmError> {
    info!(%path, baud = config.baud_rate, "Opening serial port");
    let port = serialport::new(path, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout)
        .open()?;

    port.clear(ClearBuffer::Input)?;
    debug!(%path, "Serial port configured");
    Ok(port)
}

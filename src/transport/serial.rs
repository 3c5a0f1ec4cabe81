//! Serial-port transport over the `serialport` crate.
//!
//! Maps the crate's timeout-as-error read semantics onto the protocol
//! layer's "short read at timeout" model: `io::ErrorKind::TimedOut` becomes
//! a zero-length read, broken pipes become [`Error::Disconnected`].

use std::io::{Read, Write};
use std::time::Duration;

use log::info;
use serialport::SerialPort;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Owned serial link to the device.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    path: String,
}

impl SerialTransport {
    /// Open `path` at `baud_rate` with the given read timeout.
    ///
    /// The device resets on port open and then prints its handshake lines;
    /// the caller (the exchange engine) is responsible for consuming them.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        info!("serial port {path} open at {baud_rate} baud");
        Ok(Self {
            port: Some(port),
            path: path.to_string(),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Error::Disconnected)
    }
}

impl Transport for SerialTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        let n = self
            .port_mut()?
            .bytes_to_read()
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        Ok(n as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port_mut()?.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(Error::Disconnected),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self.port_mut()?.write_all(data) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(Error::Disconnected),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            info!("serial port {} closed", self.path);
        }
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

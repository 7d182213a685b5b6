//! 基于 `serialport` 的串口后端

use crate::{SerialConfig, Transport, TransportError};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, trace, warn};

/// 真实串口
#[derive(Default)]
pub struct SerialPortTransport {
    port: Option<Box<dyn SerialPort>>,
    name: Option<String>,
}

impl SerialPortTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前打开的端口名
    pub fn port_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::NotOpen)
    }

    /// 列出系统可用串口
    pub fn available_ports() -> Result<Vec<String>, TransportError> {
        Ok(serialport::available_ports()?
            .into_iter()
            .map(|info| info.port_name)
            .collect())
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport").field("port", &self.name).finish()
    }
}

impl Transport for SerialPortTransport {
    fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), TransportError> {
        if self.port.is_some() {
            debug!("Reopening serial port {}", port);
            self.port = None;
        }

        let handle = serialport::new(port, config.baud_rate)
            .timeout(config.timeout())
            .open()
            .map_err(|e| {
                warn!("Failed to open serial port {}: {}", port, e);
                TransportError::Serial(e)
            })?;

        self.port = Some(handle);
        self.name = Some(port.to_string());
        debug!("Serial port {} opened at {} baud", port, config.baud_rate);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // serialport 在 drop 时关闭句柄
        let port = self.port.take().ok_or(TransportError::NotOpen)?;
        drop(port);
        debug!("Serial port {:?} closed", self.name.take());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        trace!("TX {:02X?}", bytes);
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;
        let pending = port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; pending];
        let mut filled = 0;
        while filled < pending {
            match port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        buf.truncate(filled);
        trace!("RX {:02X?}", buf);
        Ok(buf)
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        let port = self.port_mut()?;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                },
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if line.is_empty() {
                        return Err(TransportError::Timeout);
                    }
                    break;
                },
                Err(e) => return Err(e.into()),
            }
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    fn clear_buffers(&mut self) -> Result<(), TransportError> {
        self.port_mut()?.clear(ClearBuffer::All)?;
        Ok(())
    }
}

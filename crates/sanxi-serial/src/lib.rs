//! # Sanxi Serial Transport Layer
//!
//! 串口硬件抽象层，提供统一的字节通道接口。
//!
//! - [`SerialPortTransport`]: 基于 `serialport` 的真实串口
//! - `mock::MockTransport`: 无硬件测试替身（`mock` feature）
//!
//! 传输层只负责字节收发，不理解协议内容。沉降延时与回复解析由驱动层负责。

use sanxi_protocol::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
use std::time::Duration;
use thiserror::Error;

mod serial;

pub use serial::SerialPortTransport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{FirmwareSim, MockTransport};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("Port not open")]
    NotOpen,
    #[error("Read timeout")]
    Timeout,
    /// 测试替身注入的故障
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// 串口参数
///
/// 校验位、停止位保持固件默认（8N1）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// 读超时（毫秒）
    pub timeout_ms: u64,
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

/// 字节通道
///
/// 协议引擎独占持有传输层，不存在并发读写。
pub trait Transport {
    /// 按给定参数打开端口
    fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), TransportError>;

    /// 关闭端口
    fn close(&mut self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    /// 写入全部字节
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// 读取输入缓冲区中当前可用的全部字节（可能为空）
    fn read_available(&mut self) -> Result<Vec<u8>, TransportError>;

    /// 读取一行（直到 `\n` 或读超时）
    fn read_line(&mut self) -> Result<String, TransportError>;

    /// 丢弃收发缓冲区中的残留数据
    fn clear_buffers(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), TransportError> {
        (**self).open(port, config)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).read_available()
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        (**self).read_line()
    }

    fn clear_buffers(&mut self) -> Result<(), TransportError> {
        (**self).clear_buffers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout(), Duration::from_millis(50));
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(format!("{}", TransportError::NotOpen), "Port not open");
        assert_eq!(format!("{}", TransportError::Timeout), "Read timeout");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: TransportError = io.into();
        assert!(format!("{}", err).contains("pipe"));
    }

    #[test]
    fn test_boxed_transport_delegates() {
        let mock = MockTransport::new();
        let mut boxed: Box<dyn Transport + Send> = Box::new(mock.clone());
        boxed.open("/dev/null", &SerialConfig::default()).unwrap();
        boxed.write(b"J10\n").unwrap();
        assert!(mock.is_open());
        assert_eq!(mock.written_text(), "J10\n");
    }
}

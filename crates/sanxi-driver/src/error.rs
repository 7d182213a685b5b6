//! 驱动层错误类型定义

use sanxi_protocol::{OperatingMode, ProtocolError};
use sanxi_serial::TransportError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 任何返回 `Err` 的操作都视为"没有发生"：调用方不应假设指令已送达。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口传输错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 指令编码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 未连接（引擎不会自动连接）
    #[error("Not connected")]
    NotConnected,

    /// 该模式无法通过控制字节进入（如文件运行模式）
    #[error("Unsupported mode transition: {0}")]
    UnsupportedMode(OperatingMode),
}

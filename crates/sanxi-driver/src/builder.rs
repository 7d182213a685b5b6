//! Builder 模式实现
//!
//! 提供链式构造 `Sanxi` 实例的便捷方式。

use crate::engine::Sanxi;
use crate::error::DriverError;
use sanxi_protocol::JointLimits;
use sanxi_serial::{SerialConfig, SerialPortTransport, Transport};
use std::time::Duration;

/// Sanxi Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use sanxi_driver::SanxiBuilder;
/// use std::time::Duration;
///
/// let arm = SanxiBuilder::new()
///     .baud_rate(115_200)
///     .timeout(Duration::from_millis(50))
///     .open("/dev/ttyUSB0")
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SanxiBuilder {
    config: SerialConfig,
    limits: JointLimits,
}

impl SanxiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置波特率（可选，默认 115200）
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    /// 设置读超时（可选，默认 50ms）
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.config = config;
        self
    }

    /// 覆盖出厂限位表
    pub fn joint_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 用给定传输层构造（未连接）
    pub fn build<T: Transport>(self, transport: T) -> Sanxi<T> {
        Sanxi::with_parts(transport, self.config, self.limits)
    }

    /// 构造并连接
    pub fn connect<T: Transport>(self, transport: T, port: &str) -> Result<Sanxi<T>, DriverError> {
        let mut arm = self.build(transport);
        arm.connect(port)?;
        Ok(arm)
    }

    /// 打开真实串口
    pub fn open(self, port: &str) -> Result<Sanxi<SerialPortTransport>, DriverError> {
        self.connect(SerialPortTransport::new(), port)
    }
}

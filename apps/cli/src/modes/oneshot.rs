//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置
//! 2. 连接机械臂（进入调试模式、笛卡尔坐标返回）
//! 3. 执行操作
//! 4. 断开连接（冻结 → 空闲 → 关闭串口）

use anyhow::{Context, Result};
use sanxi_sdk::serial::SerialPortTransport;
use sanxi_sdk::{Sanxi, SanxiBuilder};

use crate::commands::config::CliConfig;

/// One-shot 模式
pub struct OneShotMode {
    config: CliConfig,
    port: String,
}

impl OneShotMode {
    /// 命令行 `--port` 优先于配置文件
    pub fn new(port: Option<String>) -> Result<Self> {
        let config = CliConfig::load()?;
        Self::with_config(config, port)
    }

    pub fn with_config(config: CliConfig, port: Option<String>) -> Result<Self> {
        let port = port
            .or_else(|| config.port.clone())
            .context("未指定串口：使用 --port 或在配置文件中设置 port")?;
        Ok(Self { config, port })
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn connect(&self) -> Result<Sanxi<SerialPortTransport>> {
        println!("⏳ 连接到 {} ...", self.port);
        let arm = SanxiBuilder::new()
            .serial_config(self.config.serial)
            .joint_limits(self.config.limits()?)
            .open(&self.port)
            .with_context(|| format!("连接 {} 失败", self.port))?;
        println!("✅ 已连接");
        Ok(arm)
    }

    /// 连接 → 执行 → 断开
    ///
    /// 操作失败时仍然尝试断开，并返回操作的错误。
    pub fn run<R>(
        &self,
        action: impl FnOnce(&mut Sanxi<SerialPortTransport>) -> Result<R>,
    ) -> Result<R> {
        let mut arm = self.connect()?;
        let result = action(&mut arm);
        let disconnected = arm.disconnect().context("断开连接失败");
        match (result, disconnected) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Err(disconnect_err)) => {
                tracing::warn!("{:#}", disconnect_err);
                Err(e)
            },
            (Err(e), Ok(())) => Err(e),
        }
    }
}

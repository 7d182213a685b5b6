//! 遥操作（脚本设备回放）

use anyhow::{Context, Result};
use clap::Args;
use sanxi_sdk::teleop::{ScriptedDevice, TeleopSession};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::modes::oneshot::OneShotMode;

/// 用 JSON 脚本代替力反馈手柄运行遥操作循环
#[derive(Args, Debug)]
pub struct TeleopCommand {
    /// 设备脚本（JSON）
    #[arg(long)]
    pub script: PathBuf,

    /// 运行时长（秒），不指定时运行到 Ctrl+C
    #[arg(long)]
    pub duration_s: Option<f64>,

    /// 覆盖配置中的控制周期（毫秒）
    #[arg(long)]
    pub period_ms: Option<u64>,
}

impl TeleopCommand {
    pub fn load_device(&self) -> Result<ScriptedDevice> {
        let json = std::fs::read_to_string(&self.script)
            .with_context(|| format!("读取脚本 {} 失败", self.script.display()))?;
        Ok(ScriptedDevice::from_json(&json)?)
    }

    fn duration(&self) -> Result<Option<Duration>> {
        match self.duration_s {
            Some(secs) if secs.is_finite() && secs > 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
            Some(secs) => anyhow::bail!("无效的运行时长: {}", secs),
            None => Ok(None),
        }
    }

    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let device = self.load_device()?;
        let mut config = mode.config().teleop.clone();
        if let Some(period_ms) = self.period_ms {
            config.period_ms = period_ms;
        }
        config.validate()?;
        let duration = self.duration()?;

        let mut arm = mode.connect()?;
        arm.set_motion_parameters(&mode.config().motion)?;

        let session = TeleopSession::start(arm, Box::new(device), config).map_err(|failure| {
            let (error, mut arm) = failure.into_parts();
            if let Err(e) = arm.disconnect() {
                tracing::warn!("Disconnect after failed start: {}", e);
            }
            anyhow::Error::from(error).context("启动遥操作失败")
        })?;

        let cancel = session.cancel_token();
        let handler_token = cancel.clone();
        ctrlc::set_handler(move || handler_token.cancel()).context("安装 Ctrl+C 处理失败")?;

        println!("✅ 遥操作已启动（Ctrl+C 停止）");
        let deadline = duration.map(|d| Instant::now() + d);
        while session.is_running() && !cancel.is_cancelled() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        let (mut arm, stats) = session.stop()?;
        arm.disconnect().context("断开连接失败")?;
        println!(
            "✅ 遥操作结束：{} 个周期，{} 次运动，{} 次跳过，{} 次错误，{} 次超时",
            stats.ticks, stats.moves, stats.skipped, stats.errors, stats.overruns
        );
        Ok(())
    }
}

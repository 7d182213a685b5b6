//! 单轴点动

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use sanxi_sdk::protocol::{JogDirection, Joint};
use std::time::Duration;

use crate::modes::oneshot::OneShotMode;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionArg {
    Pos,
    Neg,
}

impl From<DirectionArg> for JogDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Pos => JogDirection::Positive,
            DirectionArg::Neg => JogDirection::Negative,
        }
    }
}

/// 点动一个关节：开始 → 保持 → 停止
#[derive(Args, Debug)]
pub struct JogCommand {
    /// 关节编号 1..=6
    #[arg(value_parser = clap::value_parser!(u8).range(1..=6))]
    pub axis: u8,

    #[arg(value_enum)]
    pub direction: DirectionArg,

    /// 点动持续时间
    #[arg(long, default_value_t = 200)]
    pub duration_ms: u64,
}

impl JogCommand {
    pub fn joint(&self) -> Result<Joint> {
        Joint::try_from(self.axis).map_err(|_| anyhow::anyhow!("无效的关节编号: {}", self.axis))
    }

    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let joint = self.joint()?;
        let direction = JogDirection::from(self.direction);
        let hold = Duration::from_millis(self.duration_ms);

        mode.run(|arm| {
            arm.jog_start(joint, direction)?;
            std::thread::sleep(hold);
            // 停止失败时交给断开流程（冻结 → 空闲）兜底
            arm.jog_stop(joint).context("点动停止失败")?;
            println!("✅ {} 点动 {:?} 完成", joint, direction);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_and_direction() {
        let cmd = JogCommand {
            axis: 5,
            direction: DirectionArg::Neg,
            duration_ms: 10,
        };
        assert_eq!(cmd.joint().unwrap(), Joint::J5);
        assert_eq!(JogDirection::from(cmd.direction), JogDirection::Negative);
    }
}

//! 运动参数

use anyhow::Result;
use clap::Args;
use sanxi_sdk::protocol::{MotionParameter, MotionParameters};

use crate::modes::oneshot::OneShotMode;

/// 设置速度/加速度/减速度（百分比 0..=100）
#[derive(Args, Debug)]
pub struct ParamsCommand {
    /// 速度百分比
    pub ve: f64,
    /// 加速度百分比
    pub ac: f64,
    /// 减速度百分比
    pub de: f64,
}

impl ParamsCommand {
    pub fn parameters(&self) -> MotionParameters {
        MotionParameters::new(self.ve, self.ac, self.de)
    }

    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let params = self.parameters();
        // 连接前先校验，避免无谓的连接
        for (parameter, percent) in [
            (MotionParameter::Velocity, params.velocity_pct),
            (MotionParameter::Acceleration, params.accel_pct),
            (MotionParameter::Deceleration, params.decel_pct),
        ] {
            parameter.scale(percent)?;
        }

        mode.run(|arm| {
            arm.set_motion_parameters(&params)?;
            println!(
                "✅ 速度 {}%，加速度 {}%，减速度 {}%",
                params.velocity_pct, params.accel_pct, params.decel_pct
            );
            Ok(())
        })
    }
}

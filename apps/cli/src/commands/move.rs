//! 运动命令

use anyhow::{Result, bail};
use clap::Args;
use sanxi_sdk::protocol::{CartesianField, CartesianTarget, Joint, JointTarget, MoveKind};

use crate::modes::oneshot::OneShotMode;

/// 笛卡尔运动（未给出的字段不发送）
#[derive(Args, Debug, Default)]
pub struct MoveCartesianCommand {
    /// 直线运动（G21），默认点对点（G20）
    #[arg(long)]
    pub line: bool,

    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub z: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub a: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub b: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub c: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub d: Option<f64>,
}

impl MoveCartesianCommand {
    pub fn kind(&self) -> MoveKind {
        if self.line {
            MoveKind::Linear
        } else {
            MoveKind::PointToPoint
        }
    }

    pub fn target(&self) -> Result<CartesianTarget> {
        let mut target = CartesianTarget::new();
        for (field, value) in [
            (CartesianField::X, self.x),
            (CartesianField::Y, self.y),
            (CartesianField::Z, self.z),
            (CartesianField::A, self.a),
            (CartesianField::B, self.b),
            (CartesianField::C, self.c),
            (CartesianField::D, self.d),
        ] {
            target.set(field, value);
        }
        if target.is_empty() {
            bail!("至少需要指定一个坐标字段（--x .. --d）");
        }
        Ok(target)
    }

    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let target = self.target()?;
        let kind = self.kind();
        mode.run(|arm| {
            arm.cartesian_move(kind, target)?;
            println!("✅ 已发送 {} 运动", kind.code());
            Ok(())
        })
    }
}

/// 多关节运动（越限的轴会被钳到边界）
#[derive(Args, Debug, Default)]
pub struct MoveJointsCommand {
    #[arg(long, allow_hyphen_values = true)]
    pub j1: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub j2: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub j3: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub j4: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub j5: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub j6: Option<f64>,
}

impl MoveJointsCommand {
    pub fn target(&self) -> Result<JointTarget> {
        let mut target = JointTarget::new();
        for (joint, value) in Joint::ALL
            .into_iter()
            .zip([self.j1, self.j2, self.j3, self.j4, self.j5, self.j6])
        {
            target.set(joint, value);
        }
        if target.is_empty() {
            bail!("至少需要指定一个关节（--j1 .. --j6）");
        }
        Ok(target)
    }

    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let target = self.target()?;
        mode.run(|arm| {
            let clamps = arm.multi_joint_move(target)?;
            for clamp in &clamps {
                println!(
                    "⚠️  {} 目标 {:.2} 超出限位，已钳到 {:.2}",
                    clamp.joint, clamp.requested, clamp.applied
                );
            }
            println!("✅ 已发送关节运动");
            Ok(())
        })
    }
}

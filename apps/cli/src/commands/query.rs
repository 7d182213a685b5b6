//! 查询与模式命令

use anyhow::Result;
use clap::{Args, ValueEnum};
use sanxi_sdk::Coordinates;
use sanxi_sdk::protocol::{CartesianField, CoordinateReportMode, Joint, format_value};

use crate::modes::oneshot::OneShotMode;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportArg {
    Cartesian,
    Joint,
}

impl From<ReportArg> for CoordinateReportMode {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Cartesian => CoordinateReportMode::Cartesian,
            ReportArg::Joint => CoordinateReportMode::Joint,
        }
    }
}

/// 查询当前坐标
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// 坐标返回模式（默认笛卡尔）
    #[arg(long, value_enum, default_value = "cartesian")]
    pub report: ReportArg,

    /// 同时打印原始返回帧
    #[arg(long)]
    pub raw: bool,
}

impl QueryCommand {
    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        mode.run(|arm| {
            let report = CoordinateReportMode::from(self.report);
            if arm.report_mode() != report {
                arm.set_coordinate_report_mode(report)?;
            }
            match arm.query_coordinates()? {
                Some(coords) => println!("{}", render(&coords)),
                None => println!("(无坐标数据)"),
            }
            if self.raw {
                println!("原始返回: {:?}", arm.latest_frame());
            }
            Ok(())
        })
    }
}

pub fn render(coords: &Coordinates) -> String {
    match coords {
        Coordinates::Cartesian(pose) => CartesianField::ALL
            .iter()
            .map(|f| format!("{}={}", f.key(), format_value(pose.get(*f))))
            .collect::<Vec<_>>()
            .join(" "),
        Coordinates::Joint(angles) => Joint::ALL
            .iter()
            .map(|j| format!("{}={}", j.key(), format_value(angles.get(*j))))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// 停止运动并进入空闲模式
    Idle,
    /// 调试模式（接受运动指令）
    Debug,
    /// 搜寻原点
    Home,
    /// 复位：回到原点
    Reset,
}

/// 切换工作模式
#[derive(Args, Debug)]
pub struct ModeCommand {
    #[arg(value_enum)]
    pub mode: ModeArg,
}

impl ModeCommand {
    pub fn execute(self, mode: &OneShotMode) -> Result<()> {
        let target = self.mode;
        mode.run(|arm| {
            match target {
                ModeArg::Idle => arm.stop_then_idle()?,
                ModeArg::Debug => arm.enter_debug()?,
                ModeArg::Home => arm.search_origin()?,
                ModeArg::Reset => arm.back_to_origin()?,
            }
            println!("✅ 工作模式: {}", arm.mode());
            Ok(())
        })
    }
}

/// 查询固件当前模式
pub fn query_mode(mode: &OneShotMode) -> Result<()> {
    mode.run(|arm| {
        let reported = arm.query_mode()?;
        println!("固件模式: {}", reported);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanxi_sdk::protocol::{CartesianPose, JointAngles};

    #[test]
    fn test_render_coordinates() {
        let pose = CartesianPose::from_array([1.0, 2.5, -3.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            render(&Coordinates::Cartesian(pose)),
            "X=1.00 Y=2.50 Z=-3.00 A=0.00 B=0.00 C=0.00 D=0.00"
        );

        let angles = JointAngles::new([10.0, 0.0, 0.0, 0.0, 0.0, -90.0]);
        assert_eq!(
            render(&Coordinates::Joint(angles)),
            "J1=10.00 J2=0.00 J3=0.00 J4=0.00 J5=0.00 J6=-90.00"
        );
    }
}

//! 指令编码
//!
//! 把运动/配置意图编码为线路字节：
//! - 单字节控制指令（冻结、模式切换、查询）
//! - `G07` 配置指令（坐标返回模式、运动参数）
//! - `G20`/`G21` 笛卡尔运动（点对点 / 直线）
//! - `G00` 多关节运动
//! - `J<n>+` / `J<n>-` / `J<n>0` 单轴点动
//! - 原样透传的文本行
//!
//! 每条指令还携带其沉降延时与是否期待回复，驱动层据此执行
//! "发送 → 等待 → 读取"。

use crate::constants::*;
use crate::limits::{JointClamp, JointLimits};
use crate::types::{CartesianField, CartesianPose, CoordinateReportMode, Joint};
use crate::{ProtocolError, format_value};
use std::time::Duration;

// ============================================================================
// 单字节控制指令
// ============================================================================

/// 单字节控制指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// 冻结运动（取消未完成的运动）
    Freeze,
    /// 查询当前坐标
    QueryCoordinates,
    EnterIdle,
    EnterDebug,
    EnterReset,
    EnterHoming,
    /// 查询当前模式
    QueryMode,
}

impl ControlCommand {
    pub fn byte(self) -> u8 {
        match self {
            Self::Freeze => CTRL_FREEZE,
            Self::QueryCoordinates => CTRL_QUERY_COORDINATES,
            Self::EnterIdle => CTRL_ENTER_IDLE,
            Self::EnterDebug => CTRL_ENTER_DEBUG,
            Self::EnterReset => CTRL_ENTER_RESET,
            Self::EnterHoming => CTRL_ENTER_HOMING,
            Self::QueryMode => CTRL_QUERY_MODE,
        }
    }

    pub fn settle_delay(self) -> Duration {
        match self {
            Self::Freeze | Self::QueryCoordinates => SETTLE_MOTION,
            Self::EnterIdle | Self::EnterDebug | Self::EnterReset => SETTLE_MODE,
            Self::EnterHoming => SETTLE_HOMING,
            Self::QueryMode => SETTLE_JOG,
        }
    }
}

// ============================================================================
// 笛卡尔运动
// ============================================================================

/// 笛卡尔运动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveKind {
    /// 点对点（G20），轨迹由固件规划
    #[default]
    PointToPoint,
    /// 直线（G21）
    Linear,
}

impl MoveKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::PointToPoint => "G20",
            Self::Linear => "G21",
        }
    }
}

/// 笛卡尔运动目标
///
/// 每个字段可缺省；缺省字段不出现在编码结果中。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartesianTarget {
    fields: [Option<f64>; CARTESIAN_FIELD_COUNT],
}

impl CartesianTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有 7 个字段都取自给定位姿
    pub fn from_pose(pose: &CartesianPose) -> Self {
        Self {
            fields: pose.to_array().map(Some),
        }
    }

    pub fn with(mut self, field: CartesianField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn set(&mut self, field: CartesianField, value: Option<f64>) {
        self.fields[field.index()] = value;
    }

    pub fn get(&self, field: CartesianField) -> Option<f64> {
        self.fields[field.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    fn encode(&self, kind: MoveKind) -> Result<String, ProtocolError> {
        if self.is_empty() {
            return Err(ProtocolError::EmptyTarget);
        }

        let mut line = format!("{} ", kind.code());
        for field in CartesianField::ALL {
            if let Some(value) = self.get(field) {
                check_finite(field.key(), value)?;
                line.push_str(&format!("{}={} ", field.key(), format_value(value)));
            }
        }
        line.push('\n');
        Ok(line)
    }
}

// ============================================================================
// 多关节运动
// ============================================================================

/// 多关节运动目标（可只包含部分轴）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointTarget {
    values: [Option<f64>; JOINT_COUNT],
}

impl JointTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_angles(angles: [f64; JOINT_COUNT]) -> Self {
        Self {
            values: angles.map(Some),
        }
    }

    pub fn with(mut self, joint: Joint, value: f64) -> Self {
        self.set(joint, Some(value));
        self
    }

    pub fn set(&mut self, joint: Joint, value: Option<f64>) {
        self.values[joint.index()] = value;
    }

    pub fn get(&self, joint: Joint) -> Option<f64> {
        self.values[joint.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// 按限位表钳位，返回钳位后的目标与钳位记录
    pub fn clamped(&self, limits: &JointLimits) -> (JointTarget, Vec<JointClamp>) {
        let mut out = *self;
        let mut clamps = Vec::new();
        for joint in Joint::ALL {
            if let Some(requested) = self.get(joint) {
                let (applied, clamp) = limits.clamp(joint, requested);
                out.set(joint, Some(applied));
                clamps.extend(clamp);
            }
        }
        (out, clamps)
    }

    fn encode(&self) -> Result<String, ProtocolError> {
        if self.is_empty() {
            return Err(ProtocolError::EmptyTarget);
        }

        let mut line = String::from("G00 ");
        for joint in Joint::ALL {
            if let Some(value) = self.get(joint) {
                check_finite(joint.key(), value)?;
                line.push_str(&format!("{}={} ", joint.key(), format_value(value)));
            }
        }
        line.push('\n');
        Ok(line)
    }
}

// ============================================================================
// 单轴点动
// ============================================================================

/// 点动按键方向（按下"正向"还是"反向"按钮）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JogDirection {
    Positive,
    Negative,
}

/// 每轴点动极性
///
/// `true`：正向按键发送 `+`；`false`：正向按键发送 `-`。
/// J2/J3/J5 为俯仰轴（上/下），其余为回转轴（顺/逆时针），两组约定相反。
const JOG_POSITIVE_IS_PLUS: [bool; JOINT_COUNT] = [false, true, true, false, true, false];

/// 根据极性表得到点动符号
pub fn jog_token(joint: Joint, direction: JogDirection) -> char {
    let positive_is_plus = JOG_POSITIVE_IS_PLUS[joint.index()];
    match (direction, positive_is_plus) {
        (JogDirection::Positive, true) | (JogDirection::Negative, false) => '+',
        (JogDirection::Positive, false) | (JogDirection::Negative, true) => '-',
    }
}

// ============================================================================
// 运动参数
// ============================================================================

/// 运动参数项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionParameter {
    Velocity,
    Acceleration,
    Deceleration,
}

impl MotionParameter {
    pub fn key(self) -> &'static str {
        match self {
            Self::Velocity => "VE",
            Self::Acceleration => "AC",
            Self::Deceleration => "DE",
        }
    }

    pub fn max(self) -> u32 {
        match self {
            Self::Velocity => VELOCITY_MAX,
            Self::Acceleration => ACCELERATION_MAX,
            Self::Deceleration => DECELERATION_MAX,
        }
    }

    /// 百分比换算为固件单位：`round(pct × max / 100)`
    pub fn scale(self, percent: f64) -> Result<u32, ProtocolError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(ProtocolError::PercentageOutOfRange {
                field: self.key().to_string(),
                value: percent,
            });
        }
        Ok((percent * self.max() as f64 / 100.0).round() as u32)
    }
}

// ============================================================================
// 指令
// ============================================================================

/// 一条完整的线路指令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Control(ControlCommand),
    /// `G07 GCM=<0|1>`
    SetReportMode(CoordinateReportMode),
    /// `G07 VE=<n>` / `AC=<n>` / `DE=<n>`，`value` 为已换算的固件单位
    SetMotionParameter {
        parameter: MotionParameter,
        value: u32,
    },
    CartesianMove {
        kind: MoveKind,
        target: CartesianTarget,
    },
    /// 调用方负责事先钳位（见 [`JointTarget::clamped`]）
    JointMove(JointTarget),
    JogStart {
        joint: Joint,
        direction: JogDirection,
    },
    JogStop(Joint),
    /// 单行原样透传（不含换行）
    Raw(String),
}

impl Command {
    /// 编码为线路字节
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let text = match self {
            Command::Control(ctrl) => return Ok(vec![ctrl.byte()]),
            Command::SetReportMode(mode) => format!("G07 GCM={}\n", mode.wire_value()),
            Command::SetMotionParameter { parameter, value } => {
                format!("G07 {}={}\n", parameter.key(), value)
            },
            Command::CartesianMove { kind, target } => target.encode(*kind)?,
            Command::JointMove(target) => target.encode()?,
            Command::JogStart { joint, direction } => {
                format!("{}{}\n", joint.key(), jog_token(*joint, *direction))
            },
            Command::JogStop(joint) => format!("{}0\n", joint.key()),
            Command::Raw(line) => format!("{}\n", line),
        };
        Ok(text.into_bytes())
    }

    /// 发送后的沉降延时
    pub fn settle_delay(&self) -> Duration {
        match self {
            Command::Control(ctrl) => ctrl.settle_delay(),
            Command::SetReportMode(_) => SETTLE_REPORT_MODE,
            Command::SetMotionParameter { .. } => SETTLE_MOTION_PARAMETER,
            Command::CartesianMove { .. } | Command::JointMove(_) | Command::Raw(_) => {
                SETTLE_MOTION
            },
            Command::JogStart { .. } | Command::JogStop(_) => SETTLE_JOG,
        }
    }

    /// 是否在沉降后读取回复
    ///
    /// 点动开始/停止不读取，避免阻塞在读超时上。
    pub fn expects_response(&self) -> bool {
        !matches!(self, Command::JogStart { .. } | Command::JogStop(_))
    }

    /// 是否会让机械臂运动（需要调试模式）
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Command::CartesianMove { .. }
                | Command::JointMove(_)
                | Command::JogStart { .. }
                | Command::Raw(_)
        )
    }
}

/// 拆分多行透传文本，跳过空行，去掉行尾 `\r` 与空白
pub fn split_raw_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn check_finite(field: &str, value: f64) -> Result<(), ProtocolError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

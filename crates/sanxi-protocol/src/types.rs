//! 数据模型
//!
//! 关节编号、关节角、笛卡尔位姿、工作模式、坐标返回模式、运动参数。

use crate::ProtocolError;
use crate::constants::*;
use std::fmt;

// ============================================================================
// 关节
// ============================================================================

/// 关节编号（J1..J6）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Joint {
    J1 = 1,
    J2 = 2,
    J3 = 3,
    J4 = 4,
    J5 = 5,
    J6 = 6,
}

impl Joint {
    /// 按顺序排列的全部关节
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::J1,
        Joint::J2,
        Joint::J3,
        Joint::J4,
        Joint::J5,
        Joint::J6,
    ];

    /// 关节号（1..=6）
    pub fn number(self) -> u8 {
        self as u8
    }

    /// 数组下标（0..=5）
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// 线路上的键名，如 `J4`
    pub fn key(self) -> &'static str {
        match self {
            Joint::J1 => "J1",
            Joint::J2 => "J2",
            Joint::J3 => "J3",
            Joint::J4 => "J4",
            Joint::J5 => "J5",
            Joint::J6 => "J6",
        }
    }
}

impl TryFrom<u8> for Joint {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Joint::J1),
            2 => Ok(Joint::J2),
            3 => Ok(Joint::J3),
            4 => Ok(Joint::J4),
            5 => Ok(Joint::J5),
            6 => Ok(Joint::J6),
            _ => Err(ProtocolError::InvalidJoint(value)),
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 六轴关节角（度）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointAngles(pub [f64; JOINT_COUNT]);

impl JointAngles {
    pub fn new(values: [f64; JOINT_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, joint: Joint) -> f64 {
        self.0[joint.index()]
    }

    pub fn as_array(&self) -> &[f64; JOINT_COUNT] {
        &self.0
    }
}

impl From<[f64; JOINT_COUNT]> for JointAngles {
    fn from(values: [f64; JOINT_COUNT]) -> Self {
        Self(values)
    }
}

// ============================================================================
// 笛卡尔空间
// ============================================================================

/// 笛卡尔字段（X Y Z 毫米，A B C 度，D 附加轴/工具偏置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartesianField {
    X,
    Y,
    Z,
    A,
    B,
    C,
    D,
}

impl CartesianField {
    /// 线路顺序
    pub const ALL: [CartesianField; CARTESIAN_FIELD_COUNT] = [
        CartesianField::X,
        CartesianField::Y,
        CartesianField::Z,
        CartesianField::A,
        CartesianField::B,
        CartesianField::C,
        CartesianField::D,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            CartesianField::X => "X",
            CartesianField::Y => "Y",
            CartesianField::Z => "Z",
            CartesianField::A => "A",
            CartesianField::B => "B",
            CartesianField::C => "C",
            CartesianField::D => "D",
        }
    }
}

/// 笛卡尔位姿（7 个有序标量）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CartesianPose {
    pub fn from_array(v: [f64; CARTESIAN_FIELD_COUNT]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
            a: v[3],
            b: v[4],
            c: v[5],
            d: v[6],
        }
    }

    pub fn to_array(&self) -> [f64; CARTESIAN_FIELD_COUNT] {
        [self.x, self.y, self.z, self.a, self.b, self.c, self.d]
    }

    pub fn get(&self, field: CartesianField) -> f64 {
        self.to_array()[field.index()]
    }
}

// ============================================================================
// 工作模式
// ============================================================================

/// 固件工作模式
///
/// 所有发出运动的指令都要求处于 [`OperatingMode::Debug`]，
/// 驱动层在发送前自动切换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OperatingMode {
    /// 未知（模式查询回复无法识别）
    Unknown = 0,
    /// 空闲模式
    #[default]
    Idle = 10,
    /// 文件运行模式
    FileRun = 11,
    /// 回零模式（搜寻原点）
    Homing = 12,
    /// 调试模式
    Debug = 14,
    /// 复位模式（回到原点）
    Reset = 15,
}

impl OperatingMode {
    /// 模式编号（10/11/12/14/15，未知为 0）
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 从模式编号转换，无效值返回 `Unknown`
    pub fn from_code(code: u8) -> Self {
        match code {
            10 => Self::Idle,
            11 => Self::FileRun,
            12 => Self::Homing,
            14 => Self::Debug,
            15 => Self::Reset,
            _ => Self::Unknown,
        }
    }

    /// 从模式查询（0x05）的单字节回显转换
    pub fn from_echo(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            CTRL_ENTER_IDLE => Ok(Self::Idle),
            CTRL_ENTER_DEBUG => Ok(Self::Debug),
            CTRL_ENTER_RESET => Ok(Self::Reset),
            CTRL_ENTER_HOMING => Ok(Self::Homing),
            ECHO_FILE_RUN => Ok(Self::FileRun),
            _ => Err(ProtocolError::InvalidValue {
                field: "OperatingMode".to_string(),
                value: byte,
            }),
        }
    }

    /// 是否允许发送运动指令
    pub fn accepts_motion(self) -> bool {
        self == Self::Debug
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Idle => "idle",
            Self::FileRun => "file-run",
            Self::Homing => "homing",
            Self::Debug => "debug",
            Self::Reset => "reset",
        };
        write!(f, "{}({})", name, self.code())
    }
}

/// 坐标返回模式
///
/// 决定哪一份坐标缓存是权威的。线路值：0 = 关节，1 = 笛卡尔。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoordinateReportMode {
    Joint = 0,
    #[default]
    Cartesian = 1,
}

impl CoordinateReportMode {
    pub fn wire_value(self) -> u8 {
        self as u8
    }

    /// 另一种模式
    pub fn other(self) -> Self {
        match self {
            Self::Joint => Self::Cartesian,
            Self::Cartesian => Self::Joint,
        }
    }
}

impl TryFrom<u8> for CoordinateReportMode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Joint),
            1 => Ok(Self::Cartesian),
            _ => Err(ProtocolError::InvalidValue {
                field: "CoordinateReportMode".to_string(),
                value,
            }),
        }
    }
}

// ============================================================================
// 运动参数
// ============================================================================

/// 运动参数（百分比，0..=100）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionParameters {
    /// 速度百分比
    pub velocity_pct: f64,
    /// 加速度百分比
    pub accel_pct: f64,
    /// 减速度百分比
    pub decel_pct: f64,
}

impl MotionParameters {
    pub fn new(velocity_pct: f64, accel_pct: f64, decel_pct: f64) -> Self {
        Self {
            velocity_pct,
            accel_pct,
            decel_pct,
        }
    }
}

impl Default for MotionParameters {
    fn default() -> Self {
        // 与原厂面板滑块的初始值一致：低速、中等加速、较低减速
        Self::new(5.0, 30.0, 10.0)
    }
}

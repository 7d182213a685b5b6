//! # Sanxi Protocol
//!
//! 三喜六轴机械臂串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 控制字节、沉降延时、参数上限等协议常量
//! - `types`: 笛卡尔位姿、关节角、工作模式等数据模型
//! - `command`: 运动/配置指令编码
//! - `limits`: 关节限位表与钳位
//! - `response`: 返回帧解析（关节 / 笛卡尔两种固定语法）
//!
//! ## 线路格式
//!
//! 协议混用两种帧：
//! - 单字节控制指令（无换行），如冻结 `0x30`、进入调试模式 `0x14`
//! - ASCII 文本指令（以 `\n` 结尾），如 `G21 X=10.00 Y=... \n`
//!
//! 固件没有"响应就绪"信号，因此每条指令都配有固定的沉降延时
//! （见 [`Command::settle_delay`]），由驱动层在发送后等待再读取。

pub mod command;
pub mod constants;
pub mod limits;
pub mod response;
pub mod types;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use limits::*;
pub use response::*;
pub use types::*;

use thiserror::Error;

/// 协议编码/解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Empty motion target: at least one field must be set")]
    EmptyTarget,

    #[error("Non-finite value for field {field}: {value}")]
    NonFinite { field: String, value: f64 },

    #[error("Percentage out of range for {field}: {value} (expected 0..=100)")]
    PercentageOutOfRange { field: String, value: f64 },

    #[error("Invalid joint number: {0} (expected 1..=6)")]
    InvalidJoint(u8),

    #[error("Invalid value for field {field}: 0x{value:02X}")]
    InvalidValue { field: String, value: u8 },
}

/// 数值格式化：四舍五入保留两位小数
///
/// 固件按文本解析数值，统一输出 `{:.2}`。`-0.00` 归一化为 `0.00`。
pub fn format_value(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", rounded)
}

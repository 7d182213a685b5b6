//! 协议常量定义
//!
//! 控制字节、沉降延时、运动参数上限、串口参数。

use std::time::Duration;

// ============================================================================
// 单字节控制指令（无换行）
// ============================================================================

/// 冻结/停止运动
pub const CTRL_FREEZE: u8 = 0x30;
/// 查询当前坐标（与冻结共用同一字节，查询前总是先冻结）
pub const CTRL_QUERY_COORDINATES: u8 = 0x30;
/// 进入空闲模式
pub const CTRL_ENTER_IDLE: u8 = 0x10;
/// 进入调试模式
pub const CTRL_ENTER_DEBUG: u8 = 0x14;
/// 进入复位模式（回到原点）
pub const CTRL_ENTER_RESET: u8 = 0x15;
/// 进入回零模式（搜寻原点）
pub const CTRL_ENTER_HOMING: u8 = 0x12;
/// 查询当前模式（固件回显 0x10/0x14/0x15/0x12/0x11 之一）
pub const CTRL_QUERY_MODE: u8 = 0x05;

/// 文件运行模式回显字节（只会出现在模式查询回复中）
pub const ECHO_FILE_RUN: u8 = 0x11;

// ============================================================================
// 沉降延时
// ============================================================================

/// 运动/查询指令沉降延时
pub const SETTLE_MOTION: Duration = Duration::from_millis(14);
/// 进入空闲/调试/复位模式
pub const SETTLE_MODE: Duration = Duration::from_millis(2);
/// 进入回零模式
pub const SETTLE_HOMING: Duration = Duration::from_millis(1);
/// 坐标返回模式配置（G07 GCM）
pub const SETTLE_REPORT_MODE: Duration = Duration::from_millis(3);
/// 运动参数配置（G07 VE/AC/DE）
pub const SETTLE_MOTION_PARAMETER: Duration = Duration::from_millis(4);
/// 单轴点动开始/停止，以及模式查询
pub const SETTLE_JOG: Duration = Duration::from_millis(1);
/// 点动停止时，首次裸写与第二次发送之间的间隔
pub const JOG_STOP_GAP: Duration = Duration::from_millis(2);

// ============================================================================
// 运动参数
// ============================================================================

/// 最大速度（固件单位）
pub const VELOCITY_MAX: u32 = 250_000;
/// 最大加速度（固件单位）
pub const ACCELERATION_MAX: u32 = 250_000;
/// 最大减速度（固件单位）
pub const DECELERATION_MAX: u32 = 250_000;

// ============================================================================
// 串口参数
// ============================================================================

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// 默认读超时
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// 关节数量
pub const JOINT_COUNT: usize = 6;
/// 笛卡尔字段数量（X Y Z A B C D）
pub const CARTESIAN_FIELD_COUNT: usize = 7;

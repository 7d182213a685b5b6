//! Sanxi SDK - 三喜六轴机械臂 Rust SDK
//!
//! 通过串口驱动三喜机械臂，并支持力反馈手柄遥操作。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 指令编码、关节限位、返回帧解析（无 I/O）
//! - **传输层** (`serial`): 串口字节通道抽象，`serialport` 后端与测试替身
//! - **驱动层** (`driver`): 协议引擎、工作模式状态机、只读观察者
//! - **遥操作层** (`teleop`): 设备帧线程、遥操作控制器与周期循环
//!
//! # 快速开始
//!
//! ```no_run
//! use sanxi_sdk::prelude::*;
//!
//! # fn main() -> Result<(), DriverError> {
//! sanxi_sdk::init_logger();
//! let mut arm = SanxiBuilder::new().open("/dev/ttyUSB0")?;
//! arm.set_motion_parameters(&MotionParameters::new(5.0, 30.0, 10.0))?;
//! arm.cartesian_move(
//!     MoveKind::PointToPoint,
//!     CartesianTarget::new().with(CartesianField::Z, 300.0),
//! )?;
//! if let Some(coords) = arm.query_coordinates()? {
//!     println!("{:?}", coords);
//! }
//! arm.disconnect()?;
//! # Ok(())
//! # }
//! ```

mod logging;

pub mod prelude;

pub use sanxi_driver as driver;
pub use sanxi_protocol as protocol;
pub use sanxi_serial as serial;
pub use sanxi_teleop as teleop;

pub use logging::{init_logger, init_logger_with};

// --- 常用类型 ---
pub use sanxi_driver::{Coordinates, DriverError, Observer, Sanxi, SanxiBuilder};
pub use sanxi_protocol::ProtocolError;
pub use sanxi_serial::{SerialConfig, SerialPortTransport, Transport, TransportError};
pub use sanxi_teleop::{TeleopConfig, TeleopError, TeleopSession};

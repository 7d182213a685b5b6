//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use sanxi_sdk::prelude::*;
//! ```

// 驱动层
pub use crate::driver::{Coordinates, Observer, Sanxi, SanxiBuilder};

// 协议层数据模型
pub use crate::protocol::{
    CartesianField, CartesianPose, CartesianTarget, CoordinateReportMode, JogDirection, Joint,
    JointAngles, JointClamp, JointLimits, JointTarget, MotionParameters, MoveKind, OperatingMode,
};

// 传输层
pub use crate::serial::{SerialConfig, SerialPortTransport, Transport};

// 遥操作
pub use crate::teleop::{
    ButtonState, DeviceSample, HapticDevice, ScriptedDevice, TeleopConfig, TeleopSession,
};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::serial::TransportError;
pub use crate::teleop::TeleopError;

//! # Sanxi Teleoperation
//!
//! 力反馈手柄遥操作三喜机械臂。
//!
//! ```text
//! HapticDevice ──(DeviceScheduler 帧线程)──▶ SampleSource
//!                                               │ 每 80ms 取一次
//!                                               ▼
//!                                    TeleopController::tick
//!                                               │
//!                                               ▼
//!                                      Sanxi 协议引擎 ──▶ 串口
//! ```
//!
//! - 按钮 0：空闲，清空两个采样窗口
//! - 按钮 1：姿态调整（手柄万向节角 → J4/J5）
//! - 按钮 2：位置调整（手柄位置 → 末端 XYZ，直线运动）
//! - 按钮 3：两键同按，保持（不运动，窗口保留）

mod config;
mod controller;
mod device;
mod error;
mod scheduler;
mod session;
mod window;

pub use config::TeleopConfig;
pub use controller::{TeleopController, TickOutcome, device_to_robot};
pub use device::{ButtonState, DeviceSample, HapticDevice, ScriptStep, ScriptedDevice};
pub use error::{DeviceError, TeleopError};
pub use scheduler::{DeviceScheduler, SampleReader, SampleSource};
pub use session::{CancelToken, StartFailure, TeleopSession, TeleopStats, run_teleop_loop};
pub use window::SampleWindow;

//! 驱动层模块
//!
//! 本模块提供三喜机械臂的协议引擎，包括：
//! - 连接生命周期（打开串口、初始化模式、断开）
//! - "发送 → 沉降 → 读取" 原语
//! - 工作模式状态机（命令驱动，不轮询）
//! - 坐标缓存与返回帧记录（ArcSwap 无锁读取）
//!
//! # 使用场景
//!
//! 协议引擎独占串口，由单一线程驱动；显示或监控代码通过
//! [`Observer`] 读取快照，不会与进行中的更新产生数据竞争。

mod buffer;
mod builder;
mod engine;
mod error;
pub mod mode;
mod observer;
pub mod state;

pub use buffer::ResponseBuffer;
pub use builder::SanxiBuilder;
pub use engine::Sanxi;
pub use error::DriverError;
pub use mode::{AtomicOperatingMode, transition_path};
pub use observer::Observer;
pub use state::{Coordinates, EngineContext};

//! 命令定义和实现

pub mod config;
pub mod jog;
pub mod r#move;
pub mod params;
pub mod query;
pub mod send;
pub mod teleop;

pub use config::ConfigCommand;
pub use jog::JogCommand;
pub use r#move::{MoveCartesianCommand, MoveJointsCommand};
pub use params::ParamsCommand;
pub use query::{ModeCommand, QueryCommand};
pub use send::SendCommand;
pub use teleop::TeleopCommand;

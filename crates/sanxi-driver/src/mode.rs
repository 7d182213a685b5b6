//! 工作模式状态机
//!
//! 模式只由显式的模式切换指令改变，引擎不会轮询固件的真实模式。
//! 跟踪值与固件真实模式可能因丢字节而分歧，只有显式的模式查询
//! （`0x05`）会用固件回显覆盖跟踪值。
//!
//! 每次切换都先冻结运动（`0x30`），再经由空闲模式（`0x10`）进入目标模式：
//!
//! | 目标 | 控制字节序列（冻结之后） |
//! |------|--------------------------|
//! | Idle   | `0x10` |
//! | Debug  | `0x10 0x14` |
//! | Reset  | `0x10 0x15` |
//! | Homing | `0x10 0x12` |

use crate::error::DriverError;
use sanxi_protocol::{ControlCommand, OperatingMode};
use std::sync::atomic::{AtomicU8, Ordering};

/// 冻结之后进入 `target` 所需的控制指令
///
/// 文件运行模式与未知模式无法通过控制字节进入。
pub fn transition_path(target: OperatingMode) -> Result<Vec<ControlCommand>, DriverError> {
    match target {
        OperatingMode::Idle => Ok(vec![ControlCommand::EnterIdle]),
        OperatingMode::Debug => Ok(vec![ControlCommand::EnterIdle, ControlCommand::EnterDebug]),
        OperatingMode::Reset => Ok(vec![ControlCommand::EnterIdle, ControlCommand::EnterReset]),
        OperatingMode::Homing => Ok(vec![ControlCommand::EnterIdle, ControlCommand::EnterHoming]),
        OperatingMode::FileRun | OperatingMode::Unknown => Err(DriverError::UnsupportedMode(target)),
    }
}

/// 工作模式（原子版本，用于引擎与观察者之间共享）
#[derive(Debug)]
pub struct AtomicOperatingMode {
    inner: AtomicU8,
}

impl AtomicOperatingMode {
    pub fn new(mode: OperatingMode) -> Self {
        Self {
            inner: AtomicU8::new(mode.code()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> OperatingMode {
        OperatingMode::from_code(self.inner.load(ordering))
    }

    pub fn set(&self, mode: OperatingMode, ordering: Ordering) {
        self.inner.store(mode.code(), ordering);
    }
}

impl Default for AtomicOperatingMode {
    fn default() -> Self {
        Self::new(OperatingMode::default())
    }
}

impl Clone for AtomicOperatingMode {
    fn clone(&self) -> Self {
        Self::new(self.get(Ordering::Relaxed))
    }
}

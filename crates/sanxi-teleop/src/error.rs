//! 遥操作错误类型

use sanxi_driver::DriverError;
use thiserror::Error;

/// 输入设备错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Device initialisation failed: {0}")]
    InitFailed(String),

    #[error("Invalid device script: {0}")]
    InvalidScript(String),
}

/// 遥操作错误
#[derive(Error, Debug)]
pub enum TeleopError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Invalid teleop config: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    #[error("Teleop loop exited without returning the engine")]
    EngineLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teleop_error_display() {
        let err = TeleopError::from(DeviceError::InitFailed("no device".to_string()));
        assert!(format!("{}", err).contains("no device"));

        let err = TeleopError::from(DriverError::NotConnected);
        assert_eq!(format!("{}", err), "Driver error: Not connected");

        let err = TeleopError::ThreadPanicked("sanxi-teleop");
        assert_eq!(format!("{}", err), "sanxi-teleop thread panicked");
    }
}

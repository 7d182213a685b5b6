//! 遥操作配置

use crate::error::TeleopError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 遥操作配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    /// 控制周期（毫秒）
    pub period_ms: u64,

    /// 手柄位移（mm）到末端位移（mm）的比例
    pub position_scale: f64,

    /// 万向节角（度）到关节角（度）的比例
    pub angle_scale: f64,

    /// 设备帧线程周期（毫秒）
    pub device_frame_period_ms: u64,

    /// 最大控制周期数（None 表示一直运行到取消）
    pub max_ticks: Option<u64>,
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            period_ms: 80,
            position_scale: 1.0,
            angle_scale: 1.0,
            device_frame_period_ms: 1,
            max_ticks: None,
        }
    }
}

impl TeleopConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn device_frame_period(&self) -> Duration {
        Duration::from_millis(self.device_frame_period_ms)
    }

    pub fn validate(&self) -> Result<(), TeleopError> {
        if self.period_ms == 0 {
            return Err(TeleopError::InvalidConfig(
                "period_ms must be > 0".to_string(),
            ));
        }
        if self.period_ms < 40 {
            tracing::warn!(
                "Teleop period {} ms is shorter than one query + move round trip",
                self.period_ms
            );
        }
        if self.device_frame_period_ms == 0 {
            return Err(TeleopError::InvalidConfig(
                "device_frame_period_ms must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("position_scale", self.position_scale),
            ("angle_scale", self.angle_scale),
        ] {
            if !value.is_finite() {
                return Err(TeleopError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TeleopConfig::default();
        assert_eq!(config.period(), Duration::from_millis(80));
        assert_eq!(config.device_frame_period(), Duration::from_millis(1));
        assert_eq!(config.position_scale, 1.0);
        assert_eq!(config.angle_scale, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = TeleopConfig {
            period_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TeleopError::InvalidConfig(_))));

        let config = TeleopConfig {
            position_scale: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TeleopConfig = serde_json::from_str(r#"{ "position_scale": 0.5 }"#).unwrap();
        assert_eq!(config.position_scale, 0.5);
        assert_eq!(config.period_ms, 80);
        assert_eq!(config.max_ticks, None);
    }
}

//! 力反馈输入设备接口
//!
//! 设备驱动由外部提供，这里只定义逐帧采样的窄接口：
//! `begin_frame → read_position → read_gimbal_angles → read_buttons → end_frame`，
//! 由 [`DeviceScheduler`](crate::DeviceScheduler) 的帧线程调用。

use crate::error::DeviceError;
use serde::{Deserialize, Serialize};

/// 按钮状态
///
/// 设备上报位掩码：bit0 = 按钮 1，bit1 = 按钮 2。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    /// 未按下
    #[default]
    Released,
    /// 按钮 1：姿态调整
    Orientation,
    /// 按钮 2：位置调整
    Position,
    /// 两键同按
    Both,
}

impl ButtonState {
    /// 从设备位掩码转换（只看低两位）
    pub fn from_raw(raw: u32) -> Self {
        match raw & 0b11 {
            0 => Self::Released,
            1 => Self::Orientation,
            2 => Self::Position,
            _ => Self::Both,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Released => 0,
            Self::Orientation => 1,
            Self::Position => 2,
            Self::Both => 3,
        }
    }
}

/// 一帧设备采样
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceSample {
    /// 手柄末端位置（毫米）
    pub position: [f64; 3],
    /// 万向节角（度）
    pub gimbal_angles: [f64; 3],
    pub buttons: ButtonState,
}

/// 力反馈输入设备
pub trait HapticDevice: Send {
    /// 打开设备
    fn initialize(&mut self) -> Result<(), DeviceError>;

    fn begin_frame(&mut self);

    /// 末端位置（毫米）
    fn read_position(&mut self) -> [f64; 3];

    /// 万向节角（度）
    fn read_gimbal_angles(&mut self) -> [f64; 3];

    /// 按钮位掩码
    fn read_buttons(&mut self) -> u32;

    fn end_frame(&mut self);

    /// 帧线程退出时调用
    fn shutdown(&mut self) {}
}

/// 脚本中的一步：保持 `frames` 帧
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    #[serde(flatten)]
    pub sample: DeviceSample,
    #[serde(default = "default_step_frames")]
    pub frames: u32,
}

fn default_step_frames() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct Script {
    steps: Vec<ScriptStep>,
}

/// 按脚本回放采样的确定性设备
///
/// 每次 `begin_frame` 前进一帧；脚本结束后保持最后一步。
///
/// ```json
/// { "steps": [
///   { "position": [0, 0, 0], "gimbal_angles": [0, 0, 0], "buttons": "position", "frames": 80 },
///   { "position": [1, 2, 3], "gimbal_angles": [0, 0, 0], "buttons": "position", "frames": 80 }
/// ] }
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedDevice {
    steps: Vec<ScriptStep>,
    step: usize,
    frames_in_step: u32,
    started: bool,
    current: DeviceSample,
    fail_init: bool,
}

impl ScriptedDevice {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        let current = steps.first().map(|s| s.sample).unwrap_or_default();
        Self {
            steps,
            step: 0,
            frames_in_step: 0,
            started: false,
            current,
            fail_init: false,
        }
    }

    /// 每个采样保持相同帧数
    pub fn from_samples(samples: &[DeviceSample], frames: u32) -> Self {
        Self::new(
            samples
                .iter()
                .map(|&sample| ScriptStep { sample, frames })
                .collect(),
        )
    }

    pub fn from_json(json: &str) -> Result<Self, DeviceError> {
        let script: Script =
            serde_json::from_str(json).map_err(|e| DeviceError::InvalidScript(e.to_string()))?;
        if script.steps.is_empty() {
            return Err(DeviceError::InvalidScript("script has no steps".to_string()));
        }
        Ok(Self::new(script.steps))
    }

    /// 让 `initialize` 失败（模拟设备未接入）
    pub fn failing() -> Self {
        let mut device = Self::new(Vec::new());
        device.fail_init = true;
        device
    }

    /// 是否已经播放到最后一步
    pub fn is_finished(&self) -> bool {
        self.steps.is_empty() || self.step + 1 >= self.steps.len()
    }

    fn advance(&mut self) {
        if !self.started {
            self.started = true;
            return;
        }
        let Some(step) = self.steps.get(self.step) else {
            return;
        };
        self.frames_in_step += 1;
        if self.frames_in_step >= step.frames.max(1) && self.step + 1 < self.steps.len() {
            self.step += 1;
            self.frames_in_step = 0;
        }
    }
}

impl HapticDevice for ScriptedDevice {
    fn initialize(&mut self) -> Result<(), DeviceError> {
        if self.fail_init {
            return Err(DeviceError::InitFailed("scripted device set to fail".to_string()));
        }
        Ok(())
    }

    fn begin_frame(&mut self) {
        self.advance();
        if let Some(step) = self.steps.get(self.step) {
            self.current = step.sample;
        }
    }

    fn read_position(&mut self) -> [f64; 3] {
        self.current.position
    }

    fn read_gimbal_angles(&mut self) -> [f64; 3] {
        self.current.gimbal_angles
    }

    fn read_buttons(&mut self) -> u32 {
        self.current.buttons.raw()
    }

    fn end_frame(&mut self) {}
}

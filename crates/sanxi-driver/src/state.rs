//! 共享状态
//!
//! 单写者（协议引擎线程）、多读者。所有字段以整值替换方式更新，
//! 读者总是拿到完整快照。

use crate::mode::AtomicOperatingMode;
use arc_swap::{ArcSwap, ArcSwapOption};
use sanxi_protocol::{CartesianPose, CoordinateReportMode, JointAngles, OperatingMode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// 当前权威坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    Cartesian(CartesianPose),
    Joint(JointAngles),
}

impl Coordinates {
    pub fn report_mode(&self) -> CoordinateReportMode {
        match self {
            Coordinates::Cartesian(_) => CoordinateReportMode::Cartesian,
            Coordinates::Joint(_) => CoordinateReportMode::Joint,
        }
    }

    pub fn as_cartesian(&self) -> Option<&CartesianPose> {
        match self {
            Coordinates::Cartesian(pose) => Some(pose),
            Coordinates::Joint(_) => None,
        }
    }

    pub fn as_joints(&self) -> Option<&JointAngles> {
        match self {
            Coordinates::Joint(angles) => Some(angles),
            Coordinates::Cartesian(_) => None,
        }
    }
}

/// 引擎上下文
///
/// 由协议引擎写入，由 [`Observer`](crate::Observer) 读取。
#[derive(Debug)]
pub struct EngineContext {
    connected: AtomicBool,
    mode: AtomicOperatingMode,
    report_mode: AtomicU8,
    /// `None` 表示尚无数据或已被清空
    cartesian: ArcSwapOption<CartesianPose>,
    joints: ArcSwapOption<JointAngles>,
    latest_frame: ArcSwap<String>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(false),
            mode: AtomicOperatingMode::default(),
            report_mode: AtomicU8::new(CoordinateReportMode::default().wire_value()),
            cartesian: ArcSwapOption::empty(),
            joints: ArcSwapOption::empty(),
            latest_frame: ArcSwap::from_pointee(String::new()),
        }
    }
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode.get(Ordering::Acquire)
    }

    pub(crate) fn set_mode(&self, mode: OperatingMode) {
        self.mode.set(mode, Ordering::Release);
    }

    pub fn report_mode(&self) -> CoordinateReportMode {
        CoordinateReportMode::try_from(self.report_mode.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    pub(crate) fn set_report_mode(&self, mode: CoordinateReportMode) {
        self.report_mode.store(mode.wire_value(), Ordering::Release);
    }

    pub fn cartesian(&self) -> Option<CartesianPose> {
        self.cartesian.load_full().map(|pose| *pose)
    }

    pub fn joints(&self) -> Option<JointAngles> {
        self.joints.load_full().map(|angles| *angles)
    }

    pub(crate) fn store_cartesian(&self, pose: Option<CartesianPose>) {
        self.cartesian.store(pose.map(Arc::new));
    }

    pub(crate) fn store_joints(&self, angles: Option<JointAngles>) {
        self.joints.store(angles.map(Arc::new));
    }

    /// 按当前坐标返回模式选出权威缓存
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self.report_mode() {
            CoordinateReportMode::Cartesian => self.cartesian().map(Coordinates::Cartesian),
            CoordinateReportMode::Joint => self.joints().map(Coordinates::Joint),
        }
    }

    pub fn latest_frame(&self) -> Arc<String> {
        self.latest_frame.load_full()
    }

    pub(crate) fn publish_frame(&self, frame: &str) {
        self.latest_frame.store(Arc::new(frame.to_string()));
    }
}

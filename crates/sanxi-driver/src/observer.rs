//! 只读观察者
//!
//! 供显示/监控代码轮询引擎状态。克隆成本为一次 `Arc` 计数。

use crate::state::{Coordinates, EngineContext};
use sanxi_protocol::{CartesianPose, CoordinateReportMode, JointAngles, OperatingMode};
use std::sync::Arc;

/// 引擎状态的只读句柄
#[derive(Debug, Clone)]
pub struct Observer {
    ctx: Arc<EngineContext>,
}

impl Observer {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.is_connected()
    }

    /// 跟踪的工作模式（不保证与固件一致）
    pub fn mode(&self) -> OperatingMode {
        self.ctx.mode()
    }

    pub fn report_mode(&self) -> CoordinateReportMode {
        self.ctx.report_mode()
    }

    /// 最近一次读取到的原始返回帧
    pub fn latest_frame(&self) -> Arc<String> {
        self.ctx.latest_frame()
    }

    pub fn cartesian(&self) -> Option<CartesianPose> {
        self.ctx.cartesian()
    }

    pub fn joints(&self) -> Option<JointAngles> {
        self.ctx.joints()
    }

    /// 当前坐标返回模式下的权威缓存
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.ctx.coordinates()
    }
}

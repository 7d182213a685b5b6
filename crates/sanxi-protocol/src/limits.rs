//! 关节限位
//!
//! 每轴机械限位表，以及越限时的钳位。越限不是致命错误：
//! 目标值被钳到最近的边界，并返回 [`JointClamp`] 供调用方提示。

use crate::constants::JOINT_COUNT;
use crate::types::Joint;

/// 单轴限位区间（度）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointRange {
    pub min: f64,
    pub max: f64,
}

impl JointRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// 越限方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSide {
    Lower,
    Upper,
}

/// 一次钳位记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointClamp {
    pub joint: Joint,
    /// 调用方请求的原始值
    pub requested: f64,
    /// 实际使用的边界值
    pub applied: f64,
    pub side: LimitSide,
}

/// 关节限位表
///
/// `None` 表示该轴无限位。J6 在现有文档中没有给出限位，保持无界。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointLimits {
    pub ranges: [Option<JointRange>; JOINT_COUNT],
}

impl JointLimits {
    /// 出厂限位表
    pub const FACTORY: JointLimits = JointLimits {
        ranges: [
            Some(JointRange::new(-160.0, 160.0)),
            Some(JointRange::new(-130.0, 118.0)),
            Some(JointRange::new(-180.0, 15.0)),
            Some(JointRange::new(-140.0, 140.0)),
            Some(JointRange::new(-130.0, 90.0)),
            None,
        ],
    };

    /// 所有轴无界
    pub fn unbounded() -> Self {
        Self {
            ranges: [None; JOINT_COUNT],
        }
    }

    pub fn range(&self, joint: Joint) -> Option<JointRange> {
        self.ranges[joint.index()]
    }

    /// 将目标值钳到限位内
    ///
    /// 返回实际使用的值，以及越限时的钳位记录。
    pub fn clamp(&self, joint: Joint, requested: f64) -> (f64, Option<JointClamp>) {
        let Some(range) = self.range(joint) else {
            return (requested, None);
        };

        let (applied, side) = if requested > range.max {
            (range.max, LimitSide::Upper)
        } else if requested < range.min {
            (range.min, LimitSide::Lower)
        } else {
            return (requested, None);
        };

        (
            applied,
            Some(JointClamp {
                joint,
                requested,
                applied,
                side,
            }),
        )
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::FACTORY
    }
}

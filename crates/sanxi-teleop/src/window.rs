//! 两点采样窗口

use nalgebra::Vector3;

/// 容量为 2 的滑动窗口，新样本挤掉最旧的
///
/// 遥操作用相邻两个控制周期的采样差作为增量。
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    older: Option<Vector3<f64>>,
    newer: Option<Vector3<f64>>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Vector3<f64>) {
        self.older = self.newer.take();
        self.newer = Some(sample);
    }

    /// 最新减最旧；不足两个样本时为 `None`
    pub fn delta(&self) -> Option<Vector3<f64>> {
        match (self.older, self.newer) {
            (Some(older), Some(newer)) => Some(newer - older),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.older = None;
        self.newer = None;
    }

    pub fn len(&self) -> usize {
        usize::from(self.older.is_some()) + usize::from(self.newer.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.newer.is_none()
    }
}

//! 返回数据缓冲区

/// 最近一帧 + 累计日志
///
/// 每次读取都会替换最近一帧（即使读到空数据）。累计日志只追加，
/// 在断开连接时清空。
#[derive(Debug, Clone, Default)]
pub struct ResponseBuffer {
    latest: String,
    log: String,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame: String) {
        self.log.push_str(&frame);
        self.latest = frame;
    }

    pub fn latest(&self) -> &str {
        &self.latest
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn clear(&mut self) {
        self.latest.clear();
        self.log.clear();
    }
}

//! 设备帧线程
//!
//! 以固定帧周期轮询 [`HapticDevice`]，把最新一帧发布到无锁快照中。
//! 控制循环随时读取最新帧，不等待设备。

use crate::device::{ButtonState, DeviceSample, HapticDevice};
use crate::error::TeleopError;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 最新设备采样的来源
pub trait SampleSource {
    fn latest(&self) -> DeviceSample;
}

impl<S: SampleSource + ?Sized> SampleSource for &S {
    fn latest(&self) -> DeviceSample {
        (**self).latest()
    }
}

/// 帧线程与读取端共享的状态
#[derive(Default)]
struct Shared {
    sample: ArcSwap<DeviceSample>,
    frames: AtomicU64,
}

/// 帧线程发布的最新采样的只读句柄（可跨线程克隆）
#[derive(Clone)]
pub struct SampleReader {
    shared: Arc<Shared>,
}

impl SampleReader {
    /// 已完成的设备帧数
    pub fn frame_count(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }
}

impl SampleSource for SampleReader {
    fn latest(&self) -> DeviceSample {
        **self.shared.sample.load()
    }
}

impl std::fmt::Debug for SampleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleReader")
            .field("frames", &self.frame_count())
            .finish()
    }
}

/// 设备帧调度器
///
/// `start` 先初始化设备，成功后启动名为 `sanxi-device` 的帧线程；
/// `stop` 或 drop 时设置关闭标志并等待线程退出。
pub struct DeviceScheduler {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl DeviceScheduler {
    pub fn start(
        mut device: Box<dyn HapticDevice>,
        frame_period: Duration,
    ) -> Result<Self, TeleopError> {
        device.initialize().map_err(|e| {
            warn!("Haptic device initialisation failed: {}", e);
            TeleopError::from(e)
        })?;

        let shared = Arc::new(Shared::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_shared = shared.clone();
        let thread_shutdown = shutdown.clone();
        let handle = thread::Builder::new()
            .name("sanxi-device".into())
            .spawn(move || frame_loop(device, frame_period, thread_shared, thread_shutdown))
            .map_err(|source| TeleopError::ThreadSpawn {
                name: "sanxi-device",
                source,
            })?;

        info!("Device scheduler started ({:?} per frame)", frame_period);
        Ok(Self {
            handle: Some(handle),
            shutdown,
            shared,
        })
    }

    pub fn reader(&self) -> SampleReader {
        SampleReader {
            shared: self.shared.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 停止帧线程并等待退出
    pub fn stop(mut self) -> Result<(), TeleopError> {
        self.join()
    }

    fn join(&mut self) -> Result<(), TeleopError> {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| TeleopError::ThreadPanicked("sanxi-device"))?;
            debug!(
                "Device scheduler stopped after {} frames",
                self.shared.frames.load(Ordering::Acquire)
            );
        }
        Ok(())
    }
}

impl SampleSource for DeviceScheduler {
    fn latest(&self) -> DeviceSample {
        **self.shared.sample.load()
    }
}

impl Drop for DeviceScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            warn!("{}", e);
        }
    }
}

fn frame_loop(
    mut device: Box<dyn HapticDevice>,
    frame_period: Duration,
    shared: Arc<Shared>,
    shutdown: Arc<AtomicBool>,
) {
    let mut next = Instant::now();
    while !shutdown.load(Ordering::Acquire) {
        device.begin_frame();
        let sample = DeviceSample {
            position: device.read_position(),
            gimbal_angles: device.read_gimbal_angles(),
            buttons: ButtonState::from_raw(device.read_buttons()),
        };
        device.end_frame();

        shared.sample.store(Arc::new(sample));
        shared.frames.fetch_add(1, Ordering::Release);

        next += frame_period;
        let now = Instant::now();
        if next > now {
            spin_sleep::sleep(next - now);
        } else {
            // 落后时不追帧
            next = now;
        }
    }
    device.shutdown();
}

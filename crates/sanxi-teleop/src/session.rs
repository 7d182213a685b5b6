//! 遥操作会话
//!
//! 控制循环是一个带取消令牌的周期任务：每个周期读取最新设备采样、
//! 执行一次 [`TeleopController::tick`]，然后睡到下一个周期边界。
//! 周期之间不会重叠；单个周期出错只记录日志，循环继续。

use crate::config::TeleopConfig;
use crate::controller::{TeleopController, TickOutcome};
use crate::device::HapticDevice;
use crate::error::TeleopError;
use crate::scheduler::{DeviceScheduler, SampleSource};
use crossbeam_channel::SendError;
use sanxi_driver::{DriverError, Observer, Sanxi};
use sanxi_serial::Transport;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 睡眠切片上限，保证取消在一个切片内生效
const CANCEL_POLL_SLICE: Duration = Duration::from_millis(5);

/// 取消令牌（可跨线程克隆）
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// 控制循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeleopStats {
    /// 已执行的周期数
    pub ticks: u64,
    /// 下发了运动的周期数
    pub moves: u64,
    /// 因没有坐标数据而跳过的周期数
    pub skipped: u64,
    /// 出错的周期数
    pub errors: u64,
    /// 超出周期预算的周期数
    pub overruns: u64,
}

/// 运行控制循环，直到取消或达到 `config.max_ticks`
///
/// 在调用线程上阻塞运行。
pub fn run_teleop_loop<T, S>(
    engine: &mut Sanxi<T>,
    source: &S,
    controller: &mut TeleopController,
    config: &TeleopConfig,
    cancel: &CancelToken,
) -> TeleopStats
where
    T: Transport,
    S: SampleSource + ?Sized,
{
    let period = config.period();
    let mut stats = TeleopStats::default();
    let mut next = Instant::now();

    while !cancel.is_cancelled() {
        if config.max_ticks.is_some_and(|max| stats.ticks >= max) {
            debug!("Teleop loop reached {} ticks", stats.ticks);
            break;
        }

        let sample = source.latest();
        match controller.tick(engine, &sample) {
            Ok(TickOutcome::NoData) => stats.skipped += 1,
            Ok(outcome) if outcome.moved() => stats.moves += 1,
            Ok(_) => {},
            Err(e) => {
                stats.errors += 1;
                warn!("Teleop tick failed: {}", e);
            },
        }
        stats.ticks += 1;

        next += period;
        let now = Instant::now();
        if now >= next {
            stats.overruns += 1;
            debug!("Teleop tick overran its {:?} period", period);
            next = now;
            continue;
        }
        sleep_until(next, cancel);
    }

    stats
}

fn sleep_until(deadline: Instant, cancel: &CancelToken) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        spin_sleep::sleep((deadline - now).min(CANCEL_POLL_SLICE));
    }
}

/// 启动失败：错误与原引擎一起返还
pub struct StartFailure<T: Transport> {
    pub error: TeleopError,
    pub engine: Sanxi<T>,
}

impl<T: Transport> StartFailure<T> {
    pub fn into_parts(self) -> (TeleopError, Sanxi<T>) {
        (self.error, self.engine)
    }

    pub fn into_error(self) -> TeleopError {
        self.error
    }
}

impl<T: Transport> fmt::Debug for StartFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartFailure")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> fmt::Display for StartFailure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to start teleoperation: {}", self.error)
    }
}

impl<T: Transport> std::error::Error for StartFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

type LoopResult<T> = Option<(Sanxi<T>, TeleopStats)>;

/// 遥操作会话
///
/// 持有设备帧线程和控制线程（`sanxi-teleop`）。协议引擎在会话期间
/// 移交给控制线程独占，`stop` 时返还。
///
/// # Example
///
/// ```no_run
/// use sanxi_driver::SanxiBuilder;
/// use sanxi_teleop::{ScriptedDevice, TeleopConfig, TeleopSession};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let arm = SanxiBuilder::new().open("/dev/ttyUSB0")?;
/// let device = ScriptedDevice::from_json(&std::fs::read_to_string("script.json")?)?;
/// let session = TeleopSession::start(arm, Box::new(device), TeleopConfig::default())
///     .map_err(|f| f.into_error())?;
/// std::thread::sleep(std::time::Duration::from_secs(5));
/// let (arm, stats) = session.stop()?;
/// println!("{} moves", stats.moves);
/// # drop(arm);
/// # Ok(())
/// # }
/// ```
pub struct TeleopSession<T: Transport + Send + 'static> {
    handle: Option<JoinHandle<LoopResult<T>>>,
    scheduler: Option<DeviceScheduler>,
    cancel: CancelToken,
    observer: Observer,
}

impl<T: Transport + Send + 'static> TeleopSession<T> {
    /// 初始化设备、启动帧线程，然后启动控制线程
    ///
    /// 引擎必须已连接。任一步失败时引擎随错误返还。
    pub fn start(
        engine: Sanxi<T>,
        device: Box<dyn HapticDevice>,
        config: TeleopConfig,
    ) -> Result<Self, StartFailure<T>> {
        if let Err(error) = config.validate() {
            return Err(StartFailure { error, engine });
        }
        if !engine.is_connected() {
            return Err(StartFailure {
                error: DriverError::NotConnected.into(),
                engine,
            });
        }

        let scheduler = match DeviceScheduler::start(device, config.device_frame_period()) {
            Ok(scheduler) => scheduler,
            Err(error) => return Err(StartFailure { error, engine }),
        };

        let observer = engine.observer();
        let cancel = CancelToken::new();
        let reader = scheduler.reader();
        let (engine_tx, engine_rx) = crossbeam_channel::bounded::<Sanxi<T>>(1);

        let thread_cancel = cancel.clone();
        let thread_config = config.clone();
        let spawned = thread::Builder::new()
            .name("sanxi-teleop".into())
            .spawn(move || {
                let mut engine = engine_rx.recv().ok()?;
                let mut controller = TeleopController::new(thread_config.clone());
                let stats = run_teleop_loop(
                    &mut engine,
                    &reader,
                    &mut controller,
                    &thread_config,
                    &thread_cancel,
                );
                info!(
                    "Teleop loop finished: {} ticks, {} moves, {} errors",
                    stats.ticks, stats.moves, stats.errors
                );
                Some((engine, stats))
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(source) => {
                let error = TeleopError::ThreadSpawn {
                    name: "sanxi-teleop",
                    source,
                };
                return Err(StartFailure { error, engine });
            },
        };

        // 引擎在线程启动成功后才移交，失败时仍可返还
        if let Err(SendError(engine)) = engine_tx.send(engine) {
            let _ = handle.join();
            return Err(StartFailure {
                error: TeleopError::ThreadPanicked("sanxi-teleop"),
                engine,
            });
        }

        info!("Teleop session started ({:?} period)", config.period());
        Ok(Self {
            handle: Some(handle),
            scheduler: Some(scheduler),
            cancel,
            observer,
        })
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 控制线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 引擎状态的只读句柄
    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// 取消控制循环、停止帧线程并返还引擎
    pub fn stop(mut self) -> Result<(Sanxi<T>, TeleopStats), TeleopError> {
        self.cancel.cancel();
        self.shutdown()
    }

    /// 等待控制循环自行结束（`max_ticks` 或外部取消），然后返还引擎
    pub fn wait(mut self) -> Result<(Sanxi<T>, TeleopStats), TeleopError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(Sanxi<T>, TeleopStats), TeleopError> {
        let joined = match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| TeleopError::ThreadPanicked("sanxi-teleop")),
            None => Ok(None),
        };
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop()?;
        }
        let result = joined?.ok_or(TeleopError::EngineLost)?;
        info!("Teleop session stopped");
        Ok(result)
    }
}

impl<T: Transport + Send + 'static> Drop for TeleopSession<T> {
    fn drop(&mut self) {
        if self.handle.is_none() && self.scheduler.is_none() {
            return;
        }
        self.cancel.cancel();
        if let Err(e) = self.shutdown() {
            warn!("Teleop session shutdown on drop failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ButtonState, DeviceSample, ScriptStep, ScriptedDevice};
    use sanxi_protocol::CartesianPose;
    use sanxi_serial::{FirmwareSim, MockTransport};
    use std::cell::Cell;

    /// 按调用顺序返回样本，末尾保持最后一个
    struct Sequence {
        samples: Vec<DeviceSample>,
        next: Cell<usize>,
    }

    impl Sequence {
        fn new(samples: Vec<DeviceSample>) -> Self {
            Self {
                samples,
                next: Cell::new(0),
            }
        }
    }

    impl SampleSource for Sequence {
        fn latest(&self) -> DeviceSample {
            let i = self.next.get().min(self.samples.len() - 1);
            self.next.set(self.next.get() + 1);
            self.samples[i]
        }
    }

    fn position(p: [f64; 3]) -> DeviceSample {
        DeviceSample {
            position: p,
            gimbal_angles: [0.0; 3],
            buttons: ButtonState::Position,
        }
    }

    fn connected() -> (Sanxi<MockTransport>, FirmwareSim) {
        let sim = FirmwareSim::new();
        let mut engine = Sanxi::new(MockTransport::with_firmware(sim.clone()));
        engine.connect("mock0").unwrap();
        (engine, sim)
    }

    fn fast_config(max_ticks: u64) -> TeleopConfig {
        TeleopConfig {
            period_ms: 2,
            max_ticks: Some(max_ticks),
            ..Default::default()
        }
    }

    #[test]
    fn test_loop_honours_max_ticks() {
        let (mut engine, sim) = connected();
        sim.set_pose(CartesianPose::from_array([10.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0]));
        let source = Sequence::new(vec![
            position([0.0, 0.0, 0.0]),
            position([1.0, 2.0, 3.0]),
            DeviceSample::default(),
        ]);
        let config = fast_config(4);
        let mut controller = TeleopController::new(config.clone());

        let stats = run_teleop_loop(
            &mut engine,
            &source,
            &mut controller,
            &config,
            &CancelToken::new(),
        );

        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.moves, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(sim.pose().x, 13.0);
    }

    #[test]
    fn test_loop_counts_errors_and_continues() {
        let mut engine = Sanxi::new(MockTransport::new());
        let source = Sequence::new(vec![position([0.0, 0.0, 0.0]), position([1.0, 0.0, 0.0])]);
        let config = fast_config(3);
        let mut controller = TeleopController::new(config.clone());

        let stats = run_teleop_loop(
            &mut engine,
            &source,
            &mut controller,
            &config,
            &CancelToken::new(),
        );

        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.moves, 0);
    }

    #[test]
    fn test_loop_skips_when_no_data() {
        let (mut engine, sim) = connected();
        sim.set_silent(true);
        let source = Sequence::new(vec![position([0.0, 0.0, 0.0]), position([1.0, 0.0, 0.0])]);
        let config = fast_config(2);
        let mut controller = TeleopController::new(config.clone());

        let stats = run_teleop_loop(
            &mut engine,
            &source,
            &mut controller,
            &config,
            &CancelToken::new(),
        );
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.moves, 0);
    }

    #[test]
    fn test_cancelled_loop_runs_no_ticks() {
        let (mut engine, _sim) = connected();
        let source = Sequence::new(vec![position([0.0, 0.0, 0.0])]);
        let config = TeleopConfig::default();
        let mut controller = TeleopController::new(config.clone());
        let cancel = CancelToken::new();
        cancel.cancel();

        let stats = run_teleop_loop(&mut engine, &source, &mut controller, &config, &cancel);
        assert_eq!(stats, TeleopStats::default());
    }

    #[test]
    fn test_start_requires_connected_engine() {
        let engine = Sanxi::new(MockTransport::new());
        let device = ScriptedDevice::from_samples(&[DeviceSample::default()], 1);

        let failure = match TeleopSession::start(engine, Box::new(device), TeleopConfig::default())
        {
            Err(failure) => failure,
            Ok(_) => panic!("session started without a connection"),
        };
        assert!(format!("{}", failure).contains("Not connected"));
        let (error, engine) = failure.into_parts();
        assert!(matches!(error, TeleopError::Driver(DriverError::NotConnected)));
        assert!(!engine.is_connected());
    }

    #[test]
    fn test_start_returns_engine_on_device_failure() {
        let (engine, _sim) = connected();
        let result = TeleopSession::start(
            engine,
            Box::new(ScriptedDevice::failing()),
            TeleopConfig::default(),
        );
        let Err(failure) = result else {
            panic!("session started with a failing device");
        };
        let (error, engine) = failure.into_parts();
        assert!(matches!(error, TeleopError::Device(_)));
        assert!(engine.is_connected());
    }

    #[test]
    fn test_session_moves_arm_and_returns_engine() {
        let (engine, sim) = connected();
        sim.set_pose(CartesianPose::from_array([10.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0]));
        let device = ScriptedDevice::new(vec![
            ScriptStep {
                sample: position([0.0, 0.0, 0.0]),
                frames: 200,
            },
            ScriptStep {
                sample: position([1.0, 2.0, 3.0]),
                frames: 1,
            },
        ]);
        let config = TeleopConfig {
            period_ms: 10,
            max_ticks: Some(60),
            ..Default::default()
        };

        let session = match TeleopSession::start(engine, Box::new(device), config) {
            Ok(session) => session,
            Err(failure) => panic!("{}", failure),
        };
        assert!(session.observer().is_connected());
        let (engine, stats) = session.wait().unwrap();

        assert_eq!(stats.ticks, 60);
        assert!(stats.moves >= 1);
        assert!(engine.is_connected());
        let pose = sim.pose();
        assert_eq!((pose.x, pose.y, pose.z), (13.0, 11.0, 12.0));
    }

    #[test]
    fn test_stop_cancels_running_session() {
        let (engine, _sim) = connected();
        let device = ScriptedDevice::from_samples(&[DeviceSample::default()], 1);
        let session =
            match TeleopSession::start(engine, Box::new(device), TeleopConfig::default()) {
                Ok(session) => session,
                Err(failure) => panic!("{}", failure),
            };
        let token = session.cancel_token();
        assert!(session.is_running());

        let (engine, _stats) = session.stop().unwrap();
        assert!(token.is_cancelled());
        assert!(engine.is_connected());
    }
}

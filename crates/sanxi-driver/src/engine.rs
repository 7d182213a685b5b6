//! 协议引擎
//!
//! 所有高层操作都由同一个原语组成：写入字节 → 等待沉降延时 → （可选）
//! 读取全部可用字节。固件没有"回复就绪"信号，沉降延时是协议规定的
//! 等待时间，不是重试机制。引擎内部没有任何自动重试。

use crate::buffer::ResponseBuffer;
use crate::error::DriverError;
use crate::mode::transition_path;
use crate::observer::Observer;
use crate::state::{Coordinates, EngineContext};
use sanxi_protocol::{
    CartesianTarget, Command, ControlCommand, CoordinateReportMode, JOG_STOP_GAP, JogDirection,
    Joint, JointClamp, JointLimits, JointTarget, LimitSide, MotionParameter, MotionParameters,
    MoveKind, OperatingMode, SETTLE_JOG, parse_response, split_raw_lines,
};
use sanxi_serial::{SerialConfig, Transport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 三喜机械臂协议引擎
///
/// 独占持有传输层，由单一线程驱动。状态通过 [`Observer`] 对外只读发布。
///
/// # Example
///
/// ```no_run
/// use sanxi_driver::Sanxi;
/// use sanxi_protocol::{CartesianField, CartesianTarget, MoveKind};
/// use sanxi_serial::SerialPortTransport;
///
/// # fn main() -> Result<(), sanxi_driver::DriverError> {
/// let mut arm = Sanxi::new(SerialPortTransport::new());
/// arm.connect("/dev/ttyUSB0")?;
/// let target = CartesianTarget::new().with(CartesianField::Z, 250.0);
/// arm.cartesian_move(MoveKind::Linear, target)?;
/// arm.disconnect()?;
/// # Ok(())
/// # }
/// ```
pub struct Sanxi<T: Transport> {
    transport: T,
    config: SerialConfig,
    limits: JointLimits,
    buffer: ResponseBuffer,
    ctx: Arc<EngineContext>,
    port: Option<String>,
}

impl<T: Transport> Sanxi<T> {
    /// 使用默认串口参数与出厂限位表创建引擎（未连接）
    pub fn new(transport: T) -> Self {
        Self::with_parts(transport, SerialConfig::default(), JointLimits::default())
    }

    pub(crate) fn with_parts(transport: T, config: SerialConfig, limits: JointLimits) -> Self {
        Self {
            transport,
            config,
            limits,
            buffer: ResponseBuffer::new(),
            ctx: Arc::new(EngineContext::new()),
            port: None,
        }
    }

    // ========================================================================
    // 状态访问
    // ========================================================================

    pub fn observer(&self) -> Observer {
        Observer::new(self.ctx.clone())
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.is_connected()
    }

    /// 当前连接的端口名
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// 跟踪的工作模式
    pub fn mode(&self) -> OperatingMode {
        self.ctx.mode()
    }

    pub fn report_mode(&self) -> CoordinateReportMode {
        self.ctx.report_mode()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.ctx.coordinates()
    }

    pub fn serial_config(&self) -> &SerialConfig {
        &self.config
    }

    pub fn joint_limits(&self) -> &JointLimits {
        &self.limits
    }

    pub fn set_joint_limits(&mut self, limits: JointLimits) {
        self.limits = limits;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 最近一次读取到的返回帧
    pub fn latest_frame(&self) -> &str {
        self.buffer.latest()
    }

    /// 本次连接以来的全部返回数据
    pub fn response_log(&self) -> &str {
        self.buffer.log()
    }

    // ========================================================================
    // 连接生命周期
    // ========================================================================

    /// 打开串口并初始化为调试模式 + 笛卡尔坐标返回
    ///
    /// 初始化指令发送失败时关闭串口并返回错误。
    pub fn connect(&mut self, port: &str) -> Result<(), DriverError> {
        if self.is_connected() {
            debug!("Reconnecting: closing {:?} before opening {}", self.port, port);
            if let Err(e) = self.transport.close() {
                warn!("Failed to close previous port: {}", e);
            }
            self.mark_disconnected();
        }

        self.transport.open(port, &self.config).map_err(|e| {
            warn!("Failed to connect to {}: {}", port, e);
            DriverError::from(e)
        })?;
        self.ctx.set_connected(true);
        self.port = Some(port.to_string());

        let init = self
            .enter_debug()
            .and_then(|_| self.set_coordinate_report_mode(CoordinateReportMode::Cartesian));
        if let Err(e) = init {
            warn!("Initialisation on {} failed: {}", port, e);
            if let Err(close_err) = self.transport.close() {
                warn!("Failed to close {} after failed initialisation: {}", port, close_err);
            }
            self.mark_disconnected();
            return Err(e);
        }

        info!("Connected to SANXI arm on {}", port);
        Ok(())
    }

    /// 停止运动、进入空闲模式、清空返回缓冲区并关闭串口
    ///
    /// 停止指令失败只记录日志；关闭失败时保持已连接状态并返回错误。
    pub fn disconnect(&mut self) -> Result<(), DriverError> {
        self.require_connected()?;

        if let Err(e) = self.stop_then_idle() {
            warn!("Failed to stop motion before disconnect: {}", e);
        }

        self.buffer.clear();
        self.ctx.publish_frame("");
        if let Err(e) = self.transport.clear_buffers() {
            debug!("Failed to clear serial buffers: {}", e);
        }

        self.transport.close().map_err(|e| {
            warn!("Failed to close {:?}: {}", self.port, e);
            DriverError::from(e)
        })?;

        info!("Disconnected from {:?}", self.port);
        self.mark_disconnected();
        Ok(())
    }

    fn mark_disconnected(&mut self) {
        self.ctx.set_connected(false);
        self.ctx.set_mode(OperatingMode::Idle);
        self.ctx.set_report_mode(CoordinateReportMode::Cartesian);
        self.port = None;
    }

    fn require_connected(&self) -> Result<(), DriverError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }

    // ========================================================================
    // 发送原语
    // ========================================================================

    /// 写入字节，等待 `settle`，然后在 `expect_response` 时读取全部可用字节
    pub fn send_bytes(
        &mut self,
        bytes: &[u8],
        settle: Duration,
        expect_response: bool,
    ) -> Result<(), DriverError> {
        self.require_connected()?;
        self.write(bytes)?;
        spin_sleep::sleep(settle);
        if expect_response {
            self.refresh_response()?;
        }
        Ok(())
    }

    /// 编码并发送一条指令
    ///
    /// - 多关节运动在编码前按限位表钳位，返回钳位记录
    /// - 运动指令在发送前自动切换到调试模式
    pub fn send_command(&mut self, command: &Command) -> Result<Vec<JointClamp>, DriverError> {
        self.require_connected()?;

        let mut command = command.clone();
        let mut clamps = Vec::new();
        if let Command::JointMove(target) = &command {
            let (clamped, applied) = target.clamped(&self.limits);
            for clamp in &applied {
                log_clamp(clamp);
            }
            command = Command::JointMove(clamped);
            clamps = applied;
        }

        let bytes = command.encode()?;
        if command.is_motion() {
            self.ensure_debug()?;
        }

        debug!("Dispatch {:?}", command);
        self.send_bytes(&bytes, command.settle_delay(), command.expects_response())?;
        Ok(clamps)
    }

    fn send_control(&mut self, control: ControlCommand) -> Result<(), DriverError> {
        self.send_command(&Command::Control(control)).map(|_| ())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), DriverError> {
        trace!("TX {:?}", String::from_utf8_lossy(bytes));
        self.transport.write(bytes).map_err(|e| {
            warn!("Serial write failed: {}", e);
            DriverError::from(e)
        })
    }

    fn refresh_response(&mut self) -> Result<(), DriverError> {
        let bytes = self.transport.read_available().map_err(|e| {
            warn!("Serial read failed: {}", e);
            DriverError::from(e)
        })?;
        let frame = String::from_utf8_lossy(&bytes).into_owned();
        if !frame.is_empty() {
            trace!("RX {:?}", frame);
        }
        self.ctx.publish_frame(&frame);
        self.buffer.record(frame);
        Ok(())
    }

    // ========================================================================
    // 模式
    // ========================================================================

    /// 冻结运动后经由空闲模式进入 `target`
    ///
    /// 不检查当前模式，重复调用即重复发送。
    pub fn change_mode(&mut self, target: OperatingMode) -> Result<(), DriverError> {
        self.require_connected()?;
        let path = transition_path(target)?;

        self.freeze_motion()?;
        for control in path {
            self.send_control(control)?;
        }

        self.ctx.set_mode(target);
        debug!("Operating mode -> {}", target);
        Ok(())
    }

    /// 跟踪模式不是调试模式时切换过去
    pub fn ensure_debug(&mut self) -> Result<(), DriverError> {
        if self.mode().accepts_motion() {
            return Ok(());
        }
        self.enter_debug()
    }

    pub fn enter_debug(&mut self) -> Result<(), DriverError> {
        self.change_mode(OperatingMode::Debug)
    }

    /// 启动内置的搜寻原点程序（限位光电开关）
    pub fn search_origin(&mut self) -> Result<(), DriverError> {
        self.change_mode(OperatingMode::Homing)
    }

    /// 复位：回到原点
    pub fn back_to_origin(&mut self) -> Result<(), DriverError> {
        self.change_mode(OperatingMode::Reset)
    }

    /// 终止运动并进入空闲模式
    pub fn stop_then_idle(&mut self) -> Result<(), DriverError> {
        self.change_mode(OperatingMode::Idle)
    }

    /// 冻结运动（取消未完成的运动，不改变模式）
    pub fn freeze_motion(&mut self) -> Result<(), DriverError> {
        self.send_control(ControlCommand::Freeze)
    }

    /// 向固件查询当前模式
    ///
    /// 回显可识别时覆盖跟踪值并返回；否则返回 `Unknown`，跟踪值不变。
    pub fn query_mode(&mut self) -> Result<OperatingMode, DriverError> {
        self.send_control(ControlCommand::QueryMode)?;

        let echoed = match self.buffer.latest().as_bytes() {
            [byte] => OperatingMode::from_echo(*byte).ok(),
            _ => None,
        };
        match echoed {
            Some(mode) => {
                if mode != self.mode() {
                    info!("Firmware reports {} while tracking {}", mode, self.mode());
                }
                self.ctx.set_mode(mode);
                Ok(mode)
            },
            None => {
                debug!("Unrecognised mode reply {:?}", self.buffer.latest());
                Ok(OperatingMode::Unknown)
            },
        }
    }

    // ========================================================================
    // 坐标
    // ========================================================================

    /// 切换坐标返回模式
    ///
    /// 真正发生切换时清空原模式的缓存，避免把旧值当成新值；目标模式的缓存不受影响。
    pub fn set_coordinate_report_mode(
        &mut self,
        mode: CoordinateReportMode,
    ) -> Result<(), DriverError> {
        self.require_connected()?;
        let previous = self.ctx.report_mode();

        self.send_command(&Command::SetReportMode(mode))?;

        if previous != mode {
            match previous {
                CoordinateReportMode::Cartesian => self.ctx.store_cartesian(None),
                CoordinateReportMode::Joint => self.ctx.store_joints(None),
            }
            debug!("Coordinate report mode {:?} -> {:?}", previous, mode);
        }
        self.ctx.set_report_mode(mode);
        Ok(())
    }

    /// 查询当前坐标
    ///
    /// 冻结运动，必要时进入调试模式，发送查询字节并解析回复。返回当前坐标
    /// 返回模式下的权威缓存；回复无法解析时缓存保持旧值，尚无数据时为 `None`。
    pub fn query_coordinates(&mut self) -> Result<Option<Coordinates>, DriverError> {
        self.require_connected()?;
        self.freeze_motion()?;
        self.ensure_debug()?;
        self.send_control(ControlCommand::QueryCoordinates)?;

        let parsed = parse_response(self.buffer.latest());
        if let Some(angles) = parsed.joints {
            self.ctx.store_joints(Some(angles));
        }
        if let Some(pose) = parsed.cartesian {
            self.ctx.store_cartesian(Some(pose));
        }
        if parsed.is_empty() {
            trace!("No coordinates in reply {:?}", self.buffer.latest());
        }

        Ok(self.ctx.coordinates())
    }

    // ========================================================================
    // 运动
    // ========================================================================

    /// 设置运动参数（百分比）
    ///
    /// 三个百分比全部校验通过后才发送；依次发送速度、加速度、减速度。
    pub fn set_motion_parameters(
        &mut self,
        params: &MotionParameters,
    ) -> Result<(), DriverError> {
        self.require_connected()?;

        let mut scaled = Vec::with_capacity(3);
        for (parameter, percent) in [
            (MotionParameter::Velocity, params.velocity_pct),
            (MotionParameter::Acceleration, params.accel_pct),
            (MotionParameter::Deceleration, params.decel_pct),
        ] {
            scaled.push((parameter, parameter.scale(percent)?));
        }

        self.ensure_debug()?;
        for (parameter, value) in scaled {
            self.send_command(&Command::SetMotionParameter { parameter, value })?;
        }

        info!(
            "Motion parameters set: velocity {}%, accel {}%, decel {}%",
            params.velocity_pct, params.accel_pct, params.decel_pct
        );
        Ok(())
    }

    /// 笛卡尔运动（点对点或直线）
    pub fn cartesian_move(
        &mut self,
        kind: MoveKind,
        target: CartesianTarget,
    ) -> Result<(), DriverError> {
        self.send_command(&Command::CartesianMove { kind, target }).map(|_| ())
    }

    /// 多关节运动
    ///
    /// 越限的轴被钳到边界后照常发送，钳位记录随结果返回。
    pub fn multi_joint_move(&mut self, target: JointTarget) -> Result<Vec<JointClamp>, DriverError> {
        self.send_command(&Command::JointMove(target))
    }

    /// 开始单轴点动（不读取回复）
    pub fn jog_start(&mut self, joint: Joint, direction: JogDirection) -> Result<(), DriverError> {
        self.send_command(&Command::JogStart { joint, direction }).map(|_| ())
    }

    /// 停止单轴点动
    ///
    /// 停止指令发送两次：先直接写入，间隔后再走一次发送沉降流程，
    /// 第一次丢失时电机仍能停下。
    pub fn jog_stop(&mut self, joint: Joint) -> Result<(), DriverError> {
        self.require_connected()?;
        let bytes = Command::JogStop(joint).encode()?;

        self.write(&bytes)?;
        spin_sleep::sleep(JOG_STOP_GAP);
        self.send_bytes(&bytes, SETTLE_JOG, false)
    }

    /// 透传多行文本
    ///
    /// 按行拆分、跳过空行，先确保调试模式，然后逐行发送。返回发送的行数。
    pub fn send_raw_text(&mut self, text: &str) -> Result<usize, DriverError> {
        self.require_connected()?;
        let lines = split_raw_lines(text);
        if lines.is_empty() {
            return Ok(0);
        }

        self.ensure_debug()?;
        for line in &lines {
            self.send_command(&Command::Raw(line.clone()))?;
        }
        Ok(lines.len())
    }
}

impl<T: Transport> Drop for Sanxi<T> {
    fn drop(&mut self) {
        if self.is_connected() {
            debug!("Sanxi dropped while connected, disconnecting");
            if let Err(e) = self.disconnect() {
                warn!("Disconnect on drop failed: {}", e);
            }
        }
    }
}

fn log_clamp(clamp: &JointClamp) {
    let side = match clamp.side {
        LimitSide::Upper => "upper",
        LimitSide::Lower => "lower",
    };
    warn!(
        "{} target {:.2} exceeds {} limit, clamped to {:.2}",
        clamp.joint, clamp.requested, side, clamp.applied
    );
}

//! Mock 传输层
//!
//! 用于无硬件测试。[`MockTransport`] 是共享句柄：克隆后交给协议引擎，
//! 测试代码保留另一份用于检查写入内容、注入回复与故障。
//!
//! [`FirmwareSim`] 是一个极简固件模拟器，按收到的指令维护模式、
//! 坐标返回模式与坐标，并在坐标查询时返回对应语法的文本帧。

use crate::{SerialConfig, Transport, TransportError};
use parking_lot::Mutex;
use sanxi_protocol::{
    CTRL_ENTER_DEBUG, CTRL_ENTER_HOMING, CTRL_ENTER_IDLE, CTRL_ENTER_RESET, CTRL_QUERY_COORDINATES,
    CTRL_QUERY_MODE, CartesianField, CartesianPose, CoordinateReportMode, Joint, JointAngles,
    format_value,
};
use std::sync::Arc;

/// 回复生成器：输入一次写入的字节，输出固件回复
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Default)]
struct MockState {
    open: bool,
    port: Option<String>,
    config: Option<SerialConfig>,
    writes: Vec<Vec<u8>>,
    pending: Vec<u8>,
    responder: Option<Responder>,
    fail_open: bool,
    fail_close: bool,
    fail_write: bool,
    clear_count: usize,
}

/// 记录写入并按脚本回复的传输层替身
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockTransport")
            .field("open", &state.open)
            .field("port", &state.port)
            .field("writes", &state.writes.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl MockTransport {
    /// 不回复任何数据的替身
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder(responder: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static) -> Self {
        let mock = Self::new();
        mock.set_responder(responder);
        mock
    }

    /// 由固件模拟器驱动的替身
    pub fn with_firmware(sim: FirmwareSim) -> Self {
        Self::with_responder(move |bytes| sim.respond(bytes))
    }

    pub fn set_responder(&self, responder: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static) {
        self.state.lock().responder = Some(Box::new(responder));
    }

    /// 追加一段待读取的回复
    pub fn push_response(&self, bytes: &[u8]) {
        self.state.lock().pending.extend_from_slice(bytes);
    }

    /// 所有写入（按写入调用分段）
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// 所有写入拼接成的文本（控制字节按 Latin-1 保留）
    pub fn written_text(&self) -> String {
        self.state
            .lock()
            .writes
            .iter()
            .flatten()
            .map(|&b| b as char)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.state.lock().fail_close = fail;
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.state.lock().fail_write = fail;
    }

    pub fn port_name(&self) -> Option<String> {
        self.state.lock().port.clone()
    }

    /// 最近一次打开时使用的参数
    pub fn config(&self) -> Option<SerialConfig> {
        self.state.lock().config
    }

    /// `clear_buffers` 被调用的次数
    pub fn clear_count(&self) -> usize {
        self.state.lock().clear_count
    }
}

impl Transport for MockTransport {
    fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(TransportError::Injected(format!("cannot open {}", port)));
        }
        state.open = true;
        state.port = Some(port.to_string());
        state.config = Some(*config);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if state.fail_close {
            return Err(TransportError::Injected("cannot close".to_string()));
        }
        state.open = false;
        state.port = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if state.fail_write {
            return Err(TransportError::Injected("write failed".to_string()));
        }
        state.writes.push(bytes.to_vec());
        let reply = match state.responder.as_mut() {
            Some(responder) => responder(bytes),
            None => Vec::new(),
        };
        state.pending.extend(reply);
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        Ok(std::mem::take(&mut state.pending))
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if state.pending.is_empty() {
            return Err(TransportError::Timeout);
        }
        let end = state
            .pending
            .iter()
            .position(|&b| b == b'\n')
            .map_or(state.pending.len(), |pos| pos + 1);
        let line: Vec<u8> = state.pending.drain(..end).collect();
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    fn clear_buffers(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.pending.clear();
        state.clear_count += 1;
        Ok(())
    }
}

// ============================================================================
// 固件模拟器
// ============================================================================

#[derive(Debug)]
struct SimState {
    mode_echo: u8,
    report_mode: CoordinateReportMode,
    pose: CartesianPose,
    joints: JointAngles,
    silent: bool,
    reply: Option<String>,
    lines: Vec<String>,
    parameters: Vec<(String, u32)>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            mode_echo: CTRL_ENTER_IDLE,
            report_mode: CoordinateReportMode::Cartesian,
            pose: CartesianPose::default(),
            joints: JointAngles::default(),
            silent: false,
            reply: None,
            lines: Vec::new(),
            parameters: Vec::new(),
        }
    }
}

/// 极简固件模拟器（共享句柄）
///
/// 运动指令立即"到位"：`G20`/`G21` 直接覆盖位姿字段，`G00` 直接覆盖关节角。
#[derive(Debug, Clone, Default)]
pub struct FirmwareSim {
    state: Arc<Mutex<SimState>>,
}

impl FirmwareSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pose(&self, pose: CartesianPose) {
        self.state.lock().pose = pose;
    }

    pub fn pose(&self) -> CartesianPose {
        self.state.lock().pose
    }

    pub fn set_joints(&self, joints: JointAngles) {
        self.state.lock().joints = joints;
    }

    pub fn joints(&self) -> JointAngles {
        self.state.lock().joints
    }

    /// 当前模式回显字节
    pub fn mode_echo(&self) -> u8 {
        self.state.lock().mode_echo
    }

    pub fn set_mode_echo(&self, byte: u8) {
        self.state.lock().mode_echo = byte;
    }

    pub fn report_mode(&self) -> CoordinateReportMode {
        self.state.lock().report_mode
    }

    /// 静默时坐标查询不返回任何数据
    pub fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    /// 坐标查询改为返回固定文本；`None` 恢复按当前坐标生成
    pub fn set_reply(&self, reply: Option<&str>) {
        self.state.lock().reply = reply.map(str::to_string);
    }

    /// 收到的全部文本行（不含换行）
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.clone()
    }

    /// 收到的运动参数（键，值）
    pub fn parameters(&self) -> Vec<(String, u32)> {
        self.state.lock().parameters.clone()
    }

    /// 处理一次写入并返回回复
    pub fn respond(&self, bytes: &[u8]) -> Vec<u8> {
        let mut state = self.state.lock();
        if let [byte] = bytes {
            return state.control(*byte);
        }

        let text = String::from_utf8_lossy(bytes);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            state.lines.push(line.to_string());
            state.text_command(line);
        }
        Vec::new()
    }
}

impl SimState {
    fn control(&mut self, byte: u8) -> Vec<u8> {
        match byte {
            CTRL_QUERY_MODE => vec![self.mode_echo],
            CTRL_ENTER_IDLE | CTRL_ENTER_DEBUG | CTRL_ENTER_RESET | CTRL_ENTER_HOMING => {
                self.mode_echo = byte;
                Vec::new()
            },
            CTRL_QUERY_COORDINATES if !self.silent => self.coordinate_frame().into_bytes(),
            _ => Vec::new(),
        }
    }

    fn coordinate_frame(&self) -> String {
        if let Some(reply) = &self.reply {
            return reply.clone();
        }
        let body: Vec<String> = match self.report_mode {
            CoordinateReportMode::Cartesian => CartesianField::ALL
                .iter()
                .map(|f| format!("{}={}", f.key(), format_value(self.pose.get(*f))))
                .collect(),
            CoordinateReportMode::Joint => Joint::ALL
                .iter()
                .map(|j| format!("{}={}", j.key(), format_value(self.joints.get(*j))))
                .collect(),
        };
        format!("{}\r\n", body.join(" "))
    }

    fn text_command(&mut self, line: &str) {
        let mut tokens = line.split_whitespace();
        let Some(code) = tokens.next() else {
            return;
        };
        let pairs: Vec<(&str, f64)> = tokens
            .filter_map(|t| t.split_once('='))
            .filter_map(|(k, v)| v.parse::<f64>().ok().map(|v| (k, v)))
            .collect();

        match code {
            "G07" => {
                for (key, value) in pairs {
                    match key {
                        "GCM" if value == 0.0 => self.report_mode = CoordinateReportMode::Joint,
                        "GCM" => self.report_mode = CoordinateReportMode::Cartesian,
                        _ => self.parameters.push((key.to_string(), value as u32)),
                    }
                }
            },
            "G20" | "G21" => {
                let mut values = self.pose.to_array();
                for (key, value) in pairs {
                    if let Some(field) = CartesianField::ALL.iter().find(|f| f.key() == key) {
                        values[field.index()] = value;
                    }
                }
                self.pose = CartesianPose::from_array(values);
            },
            "G00" => {
                for (key, value) in pairs {
                    if let Some(joint) = Joint::ALL.iter().find(|j| j.key() == key) {
                        self.joints.0[joint.index()] = value;
                    }
                }
            },
            _ => {},
        }
    }
}

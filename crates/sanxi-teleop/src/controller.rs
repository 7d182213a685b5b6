//! 遥操作控制器
//!
//! 每个控制周期调用一次 [`TeleopController::tick`]，在同一线程上依次完成：
//! 采样入窗 → 计算增量 → 检查坐标返回模式 → 查询坐标 → 下发运动。

use crate::config::TeleopConfig;
use crate::device::{ButtonState, DeviceSample};
use crate::window::SampleWindow;
use nalgebra::{Matrix3, Vector3};
use sanxi_driver::{DriverError, Sanxi};
use sanxi_protocol::{
    CartesianPose, CartesianTarget, CoordinateReportMode, Joint, JointClamp, JointTarget, MoveKind,
};
use sanxi_serial::Transport;
use tracing::{debug, warn};

/// 一次控制周期的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// 按钮未按下，窗口已清空
    Idle,
    /// 两键同按，不运动
    Hold,
    /// 窗口不足两个样本
    Priming,
    /// 查询没有拿到坐标，本周期不下发运动
    NoData,
    /// 已下发直线运动到该位姿
    PositionMoved(CartesianPose),
    /// 已下发 J4/J5 运动
    OrientationMoved {
        j4: f64,
        j5: f64,
        clamps: Vec<JointClamp>,
    },
}

impl TickOutcome {
    /// 本周期是否下发了运动
    pub fn moved(&self) -> bool {
        matches!(
            self,
            TickOutcome::PositionMoved(_) | TickOutcome::OrientationMoved { .. }
        )
    }
}

/// 手柄坐标系 → 机械臂坐标系
///
/// 手柄 Z → 机械臂 X，手柄 X → 机械臂 Y，手柄 Y → 机械臂 Z。
pub fn device_to_robot(delta: &Vector3<f64>) -> Vector3<f64> {
    #[rustfmt::skip]
    let permutation = Matrix3::new(
        0.0, 0.0, 1.0,
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
    );
    permutation * delta
}

/// 遥操作控制器
#[derive(Debug, Clone, Default)]
pub struct TeleopController {
    config: TeleopConfig,
    position_window: SampleWindow,
    angle_window: SampleWindow,
}

impl TeleopController {
    pub fn new(config: TeleopConfig) -> Self {
        Self {
            config,
            position_window: SampleWindow::new(),
            angle_window: SampleWindow::new(),
        }
    }

    pub fn config(&self) -> &TeleopConfig {
        &self.config
    }

    pub fn position_window(&self) -> &SampleWindow {
        &self.position_window
    }

    pub fn angle_window(&self) -> &SampleWindow {
        &self.angle_window
    }

    pub fn reset(&mut self) {
        self.position_window.clear();
        self.angle_window.clear();
    }

    /// 执行一个控制周期
    pub fn tick<T: Transport>(
        &mut self,
        engine: &mut Sanxi<T>,
        sample: &DeviceSample,
    ) -> Result<TickOutcome, DriverError> {
        match sample.buttons {
            ButtonState::Released => {
                self.reset();
                Ok(TickOutcome::Idle)
            },
            ButtonState::Both => Ok(TickOutcome::Hold),
            ButtonState::Position => self.adjust_position(engine, sample),
            ButtonState::Orientation => self.adjust_orientation(engine, sample),
        }
    }

    fn adjust_position<T: Transport>(
        &mut self,
        engine: &mut Sanxi<T>,
        sample: &DeviceSample,
    ) -> Result<TickOutcome, DriverError> {
        self.position_window.push(Vector3::from(sample.position));
        let Some(delta) = self.position_window.delta() else {
            return Ok(TickOutcome::Priming);
        };

        ensure_report_mode(engine, CoordinateReportMode::Cartesian)?;
        let current = engine
            .query_coordinates()?
            .and_then(|c| c.as_cartesian().copied());
        let Some(current) = current else {
            warn!("No Cartesian coordinates yet, skipping position move");
            return Ok(TickOutcome::NoData);
        };

        let offset = device_to_robot(&delta) * self.config.position_scale;
        let target = CartesianPose {
            x: current.x + offset.x,
            y: current.y + offset.y,
            z: current.z + offset.z,
            ..current
        };
        debug!(
            "Teleop position delta ({:.2}, {:.2}, {:.2})",
            offset.x, offset.y, offset.z
        );

        engine.cartesian_move(MoveKind::Linear, CartesianTarget::from_pose(&target))?;
        Ok(TickOutcome::PositionMoved(target))
    }

    fn adjust_orientation<T: Transport>(
        &mut self,
        engine: &mut Sanxi<T>,
        sample: &DeviceSample,
    ) -> Result<TickOutcome, DriverError> {
        self.angle_window.push(Vector3::from(sample.gimbal_angles));
        let Some(delta) = self.angle_window.delta() else {
            return Ok(TickOutcome::Priming);
        };

        ensure_report_mode(engine, CoordinateReportMode::Joint)?;
        let current = engine
            .query_coordinates()?
            .and_then(|c| c.as_joints().copied());
        let Some(current) = current else {
            warn!("No joint coordinates yet, skipping orientation move");
            return Ok(TickOutcome::NoData);
        };

        let scale = self.config.angle_scale;
        let j4 = current.get(Joint::J4) - delta[0] * scale;
        let j5 = current.get(Joint::J5) + delta[1] * scale;
        debug!("Teleop orientation J4 -> {:.2}, J5 -> {:.2}", j4, j5);

        let target = JointTarget::new().with(Joint::J4, j4).with(Joint::J5, j5);
        let clamps = engine.multi_joint_move(target)?;
        Ok(TickOutcome::OrientationMoved { j4, j5, clamps })
    }
}

fn ensure_report_mode<T: Transport>(
    engine: &mut Sanxi<T>,
    mode: CoordinateReportMode,
) -> Result<(), DriverError> {
    if engine.report_mode() != mode {
        engine.set_coordinate_report_mode(mode)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanxi_protocol::{JointAngles, LimitSide};
    use sanxi_serial::{FirmwareSim, MockTransport};

    fn connected() -> (Sanxi<MockTransport>, MockTransport, FirmwareSim) {
        let sim = FirmwareSim::new();
        let mock = MockTransport::with_firmware(sim.clone());
        let mut engine = Sanxi::new(mock.clone());
        engine.connect("mock0").unwrap();
        mock.clear_writes();
        (engine, mock, sim)
    }

    fn position(p: [f64; 3]) -> DeviceSample {
        DeviceSample {
            position: p,
            gimbal_angles: [0.0; 3],
            buttons: ButtonState::Position,
        }
    }

    fn gimbal(g: [f64; 3]) -> DeviceSample {
        DeviceSample {
            position: [0.0; 3],
            gimbal_angles: g,
            buttons: ButtonState::Orientation,
        }
    }

    #[test]
    fn test_device_to_robot_permutation() {
        let robot = device_to_robot(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(robot, Vector3::new(3.0, 1.0, 2.0));
    }

    #[test]
    fn test_position_adjust_moves_linearly() {
        let (mut engine, mock, sim) = connected();
        sim.set_pose(CartesianPose::from_array([10.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0]));
        let mut controller = TeleopController::default();

        let first = controller.tick(&mut engine, &position([0.0, 0.0, 0.0])).unwrap();
        assert_eq!(first, TickOutcome::Priming);
        assert!(mock.writes().is_empty());

        let second = controller.tick(&mut engine, &position([1.0, 2.0, 3.0])).unwrap();
        let expected = CartesianPose::from_array([13.0, 11.0, 12.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(second, TickOutcome::PositionMoved(expected));
        assert!(
            mock.written_text()
                .contains("G21 X=13.00 Y=11.00 Z=12.00 A=0.00 B=0.00 C=0.00 D=0.00 \n")
        );
        assert_eq!(sim.pose(), expected);
    }

    #[test]
    fn test_position_scale_and_orientation_carried() {
        let (mut engine, _mock, sim) = connected();
        sim.set_pose(CartesianPose::from_array([0.0, 0.0, 0.0, 1.5, -2.5, 3.0, 7.0]));
        let mut controller = TeleopController::new(TeleopConfig {
            position_scale: 2.0,
            ..Default::default()
        });

        controller.tick(&mut engine, &position([0.0, 0.0, 0.0])).unwrap();
        let outcome = controller.tick(&mut engine, &position([0.0, 0.0, 1.0])).unwrap();

        let expected = CartesianPose::from_array([2.0, 0.0, 0.0, 1.5, -2.5, 3.0, 7.0]);
        assert_eq!(outcome, TickOutcome::PositionMoved(expected));
    }

    #[test]
    fn test_orientation_adjust_switches_report_mode() {
        let (mut engine, mock, sim) = connected();
        sim.set_joints(JointAngles::new([0.0, 0.0, 0.0, 10.0, 20.0, 0.0]));
        let mut controller = TeleopController::default();

        controller.tick(&mut engine, &gimbal([0.0, 0.0, 0.0])).unwrap();
        let outcome = controller.tick(&mut engine, &gimbal([1.0, 2.0, 5.0])).unwrap();

        assert_eq!(
            outcome,
            TickOutcome::OrientationMoved {
                j4: 9.0,
                j5: 22.0,
                clamps: Vec::new(),
            }
        );
        assert_eq!(engine.report_mode(), CoordinateReportMode::Joint);
        assert!(mock.written_text().contains("G07 GCM=0\n"));
        let joints = sim.joints();
        assert_eq!(joints.get(Joint::J4), 9.0);
        assert_eq!(joints.get(Joint::J5), 22.0);
        assert_eq!(joints.get(Joint::J6), 0.0);
    }

    #[test]
    fn test_orientation_adjust_clamps() {
        let (mut engine, _mock, sim) = connected();
        sim.set_joints(JointAngles::new([0.0, 0.0, 0.0, 0.0, 89.0, 0.0]));
        let mut controller = TeleopController::default();

        controller.tick(&mut engine, &gimbal([0.0, 0.0, 0.0])).unwrap();
        let outcome = controller.tick(&mut engine, &gimbal([0.0, 5.0, 0.0])).unwrap();

        match outcome {
            TickOutcome::OrientationMoved { j5, clamps, .. } => {
                assert_eq!(j5, 94.0);
                assert_eq!(clamps.len(), 1);
                assert_eq!(clamps[0].joint, Joint::J5);
                assert_eq!(clamps[0].side, LimitSide::Upper);
                assert_eq!(clamps[0].applied, 90.0);
            },
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sim.joints().get(Joint::J5), 90.0);
    }

    #[test]
    fn test_release_clears_windows() {
        let (mut engine, _mock, _sim) = connected();
        let mut controller = TeleopController::default();

        controller.tick(&mut engine, &position([0.0, 0.0, 0.0])).unwrap();
        controller.tick(&mut engine, &gimbal([0.0, 0.0, 0.0])).unwrap();
        assert_eq!(controller.position_window().len(), 1);
        assert_eq!(controller.angle_window().len(), 1);

        let outcome = controller.tick(&mut engine, &DeviceSample::default()).unwrap();
        assert_eq!(outcome, TickOutcome::Idle);
        assert!(controller.position_window().is_empty());
        assert!(controller.angle_window().is_empty());

        // 释放后重新按下需要重新积累两个样本
        let outcome = controller.tick(&mut engine, &position([5.0, 5.0, 5.0])).unwrap();
        assert_eq!(outcome, TickOutcome::Priming);
    }

    #[test]
    fn test_hold_keeps_windows_and_sends_nothing() {
        let (mut engine, mock, _sim) = connected();
        let mut controller = TeleopController::default();
        controller.tick(&mut engine, &position([0.0, 0.0, 0.0])).unwrap();

        let held = DeviceSample {
            buttons: ButtonState::Both,
            ..position([9.0, 9.0, 9.0])
        };
        assert_eq!(controller.tick(&mut engine, &held).unwrap(), TickOutcome::Hold);
        assert_eq!(controller.position_window().len(), 1);
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_no_data_skips_move() {
        let (mut engine, mock, sim) = connected();
        sim.set_silent(true);
        let mut controller = TeleopController::default();

        controller.tick(&mut engine, &position([0.0, 0.0, 0.0])).unwrap();
        let outcome = controller.tick(&mut engine, &position([1.0, 0.0, 0.0])).unwrap();

        assert_eq!(outcome, TickOutcome::NoData);
        assert!(!outcome.moved());
        assert!(!mock.written_text().contains("G21"));
    }

    #[test]
    fn test_tick_requires_connection() {
        let mut engine = Sanxi::new(MockTransport::new());
        let mut controller = TeleopController::default();
        controller.tick(&mut engine, &position([0.0, 0.0, 0.0])).unwrap();
        assert!(matches!(
            controller.tick(&mut engine, &position([1.0, 0.0, 0.0])),
            Err(DriverError::NotConnected)
        ));
    }
}

//! Simulated controller state.
//!
//! The TCP moves around a circle in the XY plane while bobbing in Z, the
//! gripper closes at the far side of the circle and opens again at the near
//! side, and the reported TCP speed follows the motion.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    CtrlState,
    Execution,
    RobTarget,
    Gripper,
    TcpSpeed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Running,
    Stopped,
}

impl ExecState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecState::Running => "running",
            ExecState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerState {
    pub motors_on: bool,
    pub exec_state: ExecState,
    /// Span class the execution state is reported under.
    pub exec_state_class: String,
    pub gripper_closed: bool,
    /// Overrides the gripper's `lvalue` when set, e.g. to report a bad value.
    pub gripper_raw: Option<String>,
    /// TCP speed in m/s.
    pub tcp_speed: f64,
    /// TCP position in mm.
    pub position: [f64; 3],
    pub gripper_signal: String,
    pub speed_signal: String,
    /// Resources answering 503.
    pub failing: HashSet<Resource>,
    /// Resources answering only after this delay.
    pub delayed: Option<(Resource, Duration)>,
    phase: f64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            motors_on: true,
            exec_state: ExecState::Running,
            exec_state_class: "ctrlexecstate".to_string(),
            gripper_closed: false,
            gripper_raw: None,
            tcp_speed: 0.0,
            position: [CENTER[0] + RADIUS, CENTER[1], CENTER[2]],
            gripper_signal: "DI_Gripper1_Closed".to_string(),
            speed_signal: "AO_TCP_SPEED".to_string(),
            failing: HashSet::new(),
            delayed: None,
            phase: 0.0,
        }
    }
}

const CENTER: [f64; 3] = [500.0, 0.0, 600.0];
const RADIUS: f64 = 150.0;
const Z_AMPLITUDE: f64 = 40.0;
/// Radians per second of the circular path.
const ANGULAR_SPEED: f64 = 0.5;

impl ControllerState {
    /// Advances the simulated motion by `dt`. Nothing moves while the
    /// program is stopped or the motors are off.
    pub fn advance(&mut self, dt: Duration) {
        if !self.motors_on || self.exec_state != ExecState::Running {
            self.tcp_speed = 0.0;
            return;
        }
        let dt = dt.as_secs_f64();
        let previous = self.position;
        self.phase = (self.phase + ANGULAR_SPEED * dt) % std::f64::consts::TAU;

        self.position = [
            CENTER[0] + RADIUS * self.phase.cos(),
            CENTER[1] + RADIUS * self.phase.sin(),
            CENTER[2] + Z_AMPLITUDE * (2.0 * self.phase).sin(),
        ];
        self.gripper_closed = self.phase > std::f64::consts::PI;

        if dt > 0.0 {
            let distance_mm = previous
                .iter()
                .zip(self.position.iter())
                .map(|(a, b)| (b - a).powi(2))
                .sum::<f64>()
                .sqrt();
            self.tcp_speed = distance_mm / 1000.0 / dt;
        }
    }

    pub fn fail(&mut self, resource: Resource) {
        self.failing.insert(resource);
    }

    pub fn recover(&mut self, resource: Resource) {
        self.failing.remove(&resource);
    }

    pub fn is_failing(&self, resource: Resource) -> bool {
        self.failing.contains(&resource)
    }

    pub fn gripper_lvalue(&self) -> String {
        match &self.gripper_raw {
            Some(raw) => raw.clone(),
            None if self.gripper_closed => "1".to_string(),
            None => "0".to_string(),
        }
    }
}

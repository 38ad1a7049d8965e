use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::normalize::FETCHING;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Typed result of one poll cycle.
///
/// Every field is optional on its own: each comes from a separate endpoint
/// and any of them can fail while the others succeed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub captured_at: DateTime<Local>,
    pub motor_state: Option<String>,
    pub program_state: Option<String>,
    pub gripper: Option<bool>,
    pub tcp_speed: Option<f64>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub pos_z: Option<f64>,
}

impl Sample {
    /// The full XYZ triple, if all three coordinates were read.
    pub fn position(&self) -> Option<Position> {
        Some(Position {
            x: self.pos_x?,
            y: self.pos_y?,
            z: self.pos_z?,
        })
    }

    pub fn to_new_measurement(&self) -> NewMeasurement {
        NewMeasurement {
            gripper: self.gripper,
            tcp_speed: self.tcp_speed,
            pos_x: self.pos_x,
            pos_y: self.pos_y,
            pos_z: self.pos_z,
        }
    }
}

/// Display text of every field for one cycle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    pub motors: String,
    pub program: String,
    pub gripper: String,
    pub speed: String,
    pub pos_x: String,
    pub pos_y: String,
    pub pos_z: String,
}

impl Default for Readout {
    fn default() -> Self {
        Self {
            motors: FETCHING.to_string(),
            program: FETCHING.to_string(),
            gripper: FETCHING.to_string(),
            speed: FETCHING.to_string(),
            pos_x: FETCHING.to_string(),
            pos_y: FETCHING.to_string(),
            pos_z: FETCHING.to_string(),
        }
    }
}

/// Row to insert into `measurements`; `measured_at` is filled in by the database.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct NewMeasurement {
    pub gripper: Option<bool>,
    pub tcp_speed: Option<f64>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub pos_z: Option<f64>,
}

/// A persisted row of `measurements`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: i64,
    pub measured_at: NaiveDateTime,
    pub gripper: Option<bool>,
    pub tcp_speed: Option<f64>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub pos_z: Option<f64>,
}

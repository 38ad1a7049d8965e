//! Raw controller strings to typed values and display text.
//!
//! Parsing is locale-invariant (`.` decimal point, as RWS sends it) while
//! display text uses the Finnish convention of the operator UI: a comma
//! decimal separator and Finnish state labels.

use serde::{Deserialize, Serialize};

/// Shown for a field whose endpoint failed or whose value is blank.
pub const UNAVAILABLE: &str = "Ei saatavilla";
/// Shown for every field before the first poll cycle completes.
pub const FETCHING: &str = "Haetaan…";
/// Shown for a blank numeric value.
pub const BLANK: &str = "—";

const DISPLAY_DECIMALS: i32 = 3;

/// Locale-invariant float parse.
///
/// Surrounding whitespace is ignored. Blank, unparseable and non-finite
/// input yields `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Display text for a raw numeric string: at most three decimals with a
/// decimal comma, the raw text when it is not a number, or [`BLANK`].
pub fn format_number(raw: &str) -> String {
    match parse_number(raw) {
        Some(value) => format_value(value),
        None if raw.trim().is_empty() => BLANK.to_string(),
        None => raw.to_string(),
    }
}

/// `1234.5678` → `"1234,568"`, `200.50` → `"200,5"`, `100.0` → `"100"`.
pub fn format_value(value: f64) -> String {
    let scale = 10f64.powi(DISPLAY_DECIMALS);
    // Round half away from zero before formatting so ties do not go to even.
    // Past f64 range after scaling the value has no fractional digits left.
    let scaled = value * scale;
    let mut rounded = if scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    };
    if rounded == 0.0 {
        rounded = 0.0;
    }
    let text = format!("{:.*}", DISPLAY_DECIMALS as usize, rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.replace('.', ",")
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    On,
    Off,
}

impl MotorState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "motoron" => Some(MotorState::On),
            "motoroff" => Some(MotorState::Off),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MotorState::On => "Päällä (käyttövalmis)",
            MotorState::Off => "Pois päältä",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    Running,
    Stopped,
    Reset,
}

impl ProgramState {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => Some(ProgramState::Running),
            "stopped" | "stop" => Some(ProgramState::Stopped),
            "reset" => Some(ProgramState::Reset),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgramState::Running => "Käynnissä",
            ProgramState::Stopped => "Pysäytetty",
            ProgramState::Reset => "Nollattu",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperState {
    Closed,
    Open,
}

impl GripperState {
    /// `"1"` is closed and `"0"` is open; nothing else is a gripper state.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(GripperState::Closed),
            "0" => Some(GripperState::Open),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GripperState::Closed => "Kiinni",
            GripperState::Open => "Auki",
        }
    }

    pub fn is_closed(self) -> bool {
        self == GripperState::Closed
    }
}

pub fn motor_state_label(raw: Option<&str>) -> String {
    label_or_raw(raw, MotorState::parse, MotorState::label)
}

pub fn program_state_label(raw: Option<&str>) -> String {
    label_or_raw(raw, ProgramState::parse, ProgramState::label)
}

pub fn gripper_label(raw: Option<&str>) -> String {
    label_or_raw(raw, GripperState::parse, GripperState::label)
}

/// Value stored in the `gripper` column: closed → true, open → false,
/// anything else → NULL.
pub fn gripper_bit(raw: &str) -> Option<bool> {
    GripperState::parse(raw).map(GripperState::is_closed)
}

fn label_or_raw<T: Copy>(
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
    label: fn(T) -> &'static str,
) -> String {
    match raw {
        None => UNAVAILABLE.to_string(),
        Some(raw) if raw.trim().is_empty() => UNAVAILABLE.to_string(),
        Some(raw) => parse(raw).map(label).map(str::to_string).unwrap_or_else(|| raw.to_string()),
    }
}

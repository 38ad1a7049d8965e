//! Turns one cycle's endpoint responses into typed values, display text and
//! history entries. Pure: no I/O, no shared state.

use chrono::{DateTime, Local};

use crate::client::{Endpoint, EndpointResponses, FetchResult};
use crate::errors::{ErrorKind, IssueSubject, PollIssue};
use crate::extract::{
    extract_span, first_json_string, first_span, PROGRAM_STATE_CLASSES, SIGNAL_VALUE_KEYS,
};
use crate::history::{HistoryEntry, PositionHistoryEntry};
use crate::models::{Readout, Sample};
use crate::normalize::{
    format_number, format_value, gripper_bit, gripper_label, motor_state_label, parse_number,
    program_state_label, UNAVAILABLE,
};

/// Everything one cycle produced before touching shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReading {
    pub sample: Sample,
    pub readout: Readout,
    /// Present only when the gripper value parsed as a number.
    pub gripper_entry: Option<HistoryEntry>,
    /// Present only when the TCP speed parsed as a number.
    pub speed_entry: Option<HistoryEntry>,
    /// Present only when all of X, Y and Z parsed.
    pub position_entry: Option<PositionHistoryEntry>,
    pub issues: Vec<PollIssue>,
}

pub fn interpret(responses: &EndpointResponses, captured_at: DateTime<Local>) -> CycleReading {
    let mut issues = Vec::new();

    let (motors, motor_state) = read_label(
        Endpoint::ControllerState,
        &responses.controller_state,
        |body| extract_span(body, "ctrlstate"),
        motor_state_label,
        &mut issues,
    );

    let (program, program_state) = read_label(
        Endpoint::RapidExecution,
        &responses.rapid_execution,
        |body| first_span(body, &PROGRAM_STATE_CLASSES),
        program_state_label,
        &mut issues,
    );

    let gripper_raw = read_signal(Endpoint::Gripper, &responses.gripper, &mut issues);
    let gripper_text = gripper_label(gripper_raw.as_deref());
    let gripper_value = gripper_raw.as_deref().and_then(parse_number);
    // Anything but 0/1 is still plotted when numeric, but is stored as NULL.
    let gripper = gripper_raw.as_deref().and_then(gripper_bit);
    if let Some(raw) = gripper_raw.as_deref() {
        check_numeric(Endpoint::Gripper, raw, gripper_value, &mut issues);
    }

    let speed_raw = read_signal(Endpoint::TcpSpeed, &responses.tcp_speed, &mut issues);
    let tcp_speed = speed_raw.as_deref().and_then(parse_number);
    let speed_text = match (&responses.tcp_speed, speed_raw.as_deref()) {
        (Err(_), _) => UNAVAILABLE.to_string(),
        (Ok(_), raw) => format_number(raw.unwrap_or_default()),
    };
    if let Some(raw) = speed_raw.as_deref() {
        check_numeric(Endpoint::TcpSpeed, raw, tcp_speed, &mut issues);
    }

    let axes = read_position(&responses.rob_target, &mut issues);
    let [(x_text, pos_x), (y_text, pos_y), (z_text, pos_z)] = axes;

    let sample = Sample {
        captured_at,
        motor_state,
        program_state,
        gripper,
        tcp_speed,
        pos_x,
        pos_y,
        pos_z,
    };

    let gripper_entry = gripper_value.map(|value| HistoryEntry {
        captured_at,
        text: gripper_text.clone(),
        value,
    });
    let speed_entry = tcp_speed.map(|value| HistoryEntry {
        captured_at,
        text: speed_text.clone(),
        value,
    });
    let position_entry = sample.position().map(|p| PositionHistoryEntry {
        captured_at,
        x_text: format_value(p.x),
        y_text: format_value(p.y),
        z_text: format_value(p.z),
        x: p.x,
        y: p.y,
        z: p.z,
    });

    CycleReading {
        sample,
        readout: Readout {
            motors,
            program,
            gripper: gripper_text,
            speed: speed_text,
            pos_x: x_text,
            pos_y: y_text,
            pos_z: z_text,
        },
        gripper_entry,
        speed_entry,
        position_entry,
        issues,
    }
}

/// Display label and, when the state was read, the typed label for the sample.
fn read_label(
    endpoint: Endpoint,
    response: &FetchResult,
    extract: impl Fn(&str) -> Option<String>,
    label: fn(Option<&str>) -> String,
    issues: &mut Vec<PollIssue>,
) -> (String, Option<String>) {
    let body = match response {
        Ok(body) => body,
        Err(e) => {
            issues.push(network_issue(endpoint, e));
            return (UNAVAILABLE.to_string(), None);
        }
    };
    match extract(body) {
        Some(raw) if !raw.is_empty() => {
            let text = label(Some(raw.as_str()));
            (text.clone(), Some(text))
        }
        raw => {
            if raw.is_none() {
                issues.push(missing_issue(endpoint, "state"));
            }
            (label(raw.as_deref()), None)
        }
    }
}

/// Raw `lvalue`/`value` of a signal resource; `None` when the request failed.
/// A body without either key reads as blank.
fn read_signal(endpoint: Endpoint, response: &FetchResult, issues: &mut Vec<PollIssue>) -> Option<String> {
    match response {
        Ok(body) => Some(first_json_string(body, &SIGNAL_VALUE_KEYS).unwrap_or_else(|| {
            issues.push(missing_issue(endpoint, "lvalue"));
            String::new()
        })),
        Err(e) => {
            issues.push(network_issue(endpoint, e));
            None
        }
    }
}

/// Display text and parsed value for each of X, Y and Z.
fn read_position(response: &FetchResult, issues: &mut Vec<PollIssue>) -> [(String, Option<f64>); 3] {
    let body = match response {
        Ok(body) => body,
        Err(e) => {
            issues.push(network_issue(Endpoint::RobTarget, e));
            return [
                (UNAVAILABLE.to_string(), None),
                (UNAVAILABLE.to_string(), None),
                (UNAVAILABLE.to_string(), None),
            ];
        }
    };

    ["x", "y", "z"].map(|axis| match extract_span(body, axis) {
        Some(raw) => {
            let value = parse_number(&raw);
            check_numeric(Endpoint::RobTarget, &raw, value, issues);
            (format!("{}: {}", axis.to_uppercase(), format_number(&raw)), value)
        }
        None => {
            issues.push(missing_issue(Endpoint::RobTarget, axis));
            (UNAVAILABLE.to_string(), None)
        }
    })
}

fn check_numeric(endpoint: Endpoint, raw: &str, value: Option<f64>, issues: &mut Vec<PollIssue>) {
    if value.is_none() && !raw.trim().is_empty() {
        issues.push(PollIssue::new(
            ErrorKind::Parse,
            IssueSubject::Endpoint(endpoint),
            format!("not a number: {:?}", raw),
        ));
    }
}

fn network_issue(endpoint: Endpoint, error: &crate::errors::EndpointError) -> PollIssue {
    PollIssue::new(ErrorKind::Network, IssueSubject::Endpoint(endpoint), error.to_string())
}

fn missing_issue(endpoint: Endpoint, field: &str) -> PollIssue {
    PollIssue::new(
        ErrorKind::Extraction,
        IssueSubject::Endpoint(endpoint),
        format!("no {} in response", field),
    )
}

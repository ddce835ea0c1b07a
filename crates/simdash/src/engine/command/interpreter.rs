use tracing::debug;

use super::parser::Command;
use crate::engine::device::set_device;
use crate::engine::error::CommandError;
use crate::engine::event::LogEvent;
use crate::engine::state::State;
use crate::engine::state::TrafficMode;
use crate::engine::state::THERMOSTAT_BOUNDS;

/// Usage summary printed by `help` and for unknown commands.
pub const HELP: &str = "Commands: set, mode, thermostat, status, help
  set <device> <value>           home.light on|off, home.lock lock|unlock,
                                 city.lights on|off, factory.conveyor start|stop,
                                 factory.robot start|stop
  mode city.traffic auto|manual
  thermostat <16-30>
  status
  help";

const TRAFFIC_TARGET: &str = "city.traffic";

/// Run one command line against `state`.
///
/// Every check happens before any field is written, so a failed command
/// leaves `state` exactly as it was.
pub fn execute(raw: &str, state: &mut State) -> Result<LogEvent, CommandError> {
    let command = Command::parse(raw)?;
    debug!(?command, "executing command");

    match command {
        Command::Set { target, value } => {
            set_device(&target, &value, state)?;
            Ok(LogEvent::ok(format!("OK: set {} {}", target, value)))
        }
        Command::Mode { target, value } => {
            let target = target.unwrap_or_default();
            if target != TRAFFIC_TARGET {
                return Err(CommandError::UnsupportedTarget(target));
            }
            let mode: TrafficMode = value.parse().map_err(|_| CommandError::InvalidValue {
                target: TRAFFIC_TARGET.to_string(),
                expected: "auto|manual",
                value: value.clone(),
            })?;
            state.city.traffic.mode = mode;
            Ok(LogEvent::ok(format!("OK: mode {} {}", TRAFFIC_TARGET, mode)))
        }
        Command::Thermostat { value } => {
            let parsed = parse_number(&value).ok_or_else(|| thermostat_out_of_range(&value))?;
            state.home.thermostat =
                thermostat_setpoint(parsed).ok_or_else(|| thermostat_out_of_range(&value))?;
            Ok(LogEvent::ok(format!("OK: thermostat {}", parsed)))
        }
        Command::Status => Ok(LogEvent::info(status(state))),
        Command::Help => Ok(LogEvent::info(HELP)),
    }
}

/// Whole-degree setpoint for `value`, or None outside the thermostat range.
pub(crate) fn thermostat_setpoint(value: f64) -> Option<i64> {
    THERMOSTAT_BOUNDS
        .contains(value)
        .then(|| value.round() as i64)
}

pub(crate) fn thermostat_out_of_range(value: impl ToString) -> CommandError {
    CommandError::OutOfRange {
        name: "Thermostat",
        min: THERMOSTAT_BOUNDS.min as i64,
        max: THERMOSTAT_BOUNDS.max as i64,
        value: value.to_string(),
    }
}

/// Numeric argument: a decimal float, or an unsigned `0x`/`0o`/`0b` integer.
fn parse_number(raw: &str) -> Option<f64> {
    let lower = raw.to_ascii_lowercase();
    let radix = match lower.get(..2) {
        Some("0x") => 16,
        Some("0o") => 8,
        Some("0b") => 2,
        _ => return raw.parse().ok(),
    };
    let digits = &lower[2..];
    if digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}

fn status(state: &State) -> String {
    serde_json::to_string_pretty(state)
        .unwrap_or_else(|e| format!("state unavailable: {}", e))
}

use std::str::FromStr;

use super::device::DeviceId;

/// A discrete dashboard action (button or slider), as opposed to a typed
/// command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Flip a switchable device.
    Toggle(DeviceId),

    /// Flip city traffic between auto and manual.
    ToggleTrafficMode,

    /// Thermostat slider; validated like the `thermostat` command.
    SetThermostat(i64),

    /// Take a fresh (random) air quality reading.
    RefreshAqi,

    /// Knock five degrees off the factory temperature.
    CoolingBoost,
}

/// Dashboard key of the traffic mode toggle.
pub const TRAFFIC_MODE_KEY: &str = "city.traffic.auto";

impl Intent {
    /// The toggle intent for a dashboard key (a device name or
    /// `city.traffic.auto`).
    pub fn toggle(key: &str) -> Option<Self> {
        if key == TRAFFIC_MODE_KEY {
            return Some(Intent::ToggleTrafficMode);
        }
        DeviceId::from_str(key).ok().map(Intent::Toggle)
    }
}

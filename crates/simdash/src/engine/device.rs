use std::str::FromStr;

use serde::Serialize;

use super::error::CommandError;
use super::state::State;

/// A switchable device addressed by its dotted name (e.g. `home.light`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum DeviceId {
    #[strum(serialize = "home.light")]
    #[serde(rename = "home.light")]
    HomeLight,
    #[strum(serialize = "home.lock")]
    #[serde(rename = "home.lock")]
    HomeLock,
    #[strum(serialize = "city.lights")]
    #[serde(rename = "city.lights")]
    CityLights,
    #[strum(serialize = "factory.conveyor")]
    #[serde(rename = "factory.conveyor")]
    FactoryConveyor,
    #[strum(serialize = "factory.robot")]
    #[serde(rename = "factory.robot")]
    FactoryRobot,
}

/// The two words a device accepts, mapping to `true` and `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    pub on: &'static str,
    pub off: &'static str,
    /// Both words joined for error messages.
    pub expected: &'static str,
}

impl DeviceId {
    pub fn vocabulary(self) -> Vocabulary {
        match self {
            DeviceId::HomeLight | DeviceId::CityLights => Vocabulary {
                on: "on",
                off: "off",
                expected: "on|off",
            },
            DeviceId::HomeLock => Vocabulary {
                on: "lock",
                off: "unlock",
                expected: "lock|unlock",
            },
            DeviceId::FactoryConveyor | DeviceId::FactoryRobot => Vocabulary {
                on: "start",
                off: "stop",
                expected: "start|stop",
            },
        }
    }

    /// Current value of the device's boolean.
    pub fn get(self, state: &State) -> bool {
        match self {
            DeviceId::HomeLight => state.home.light,
            DeviceId::HomeLock => state.home.lock,
            DeviceId::CityLights => state.city.lights,
            DeviceId::FactoryConveyor => state.factory.conveyor,
            DeviceId::FactoryRobot => state.factory.robot,
        }
    }

    fn slot(self, state: &mut State) -> &mut bool {
        match self {
            DeviceId::HomeLight => &mut state.home.light,
            DeviceId::HomeLock => &mut state.home.lock,
            DeviceId::CityLights => &mut state.city.lights,
            DeviceId::FactoryConveyor => &mut state.factory.conveyor,
            DeviceId::FactoryRobot => &mut state.factory.robot,
        }
    }

    /// Map a vocabulary word (case-insensitive) to the boolean it selects.
    pub fn parse_value(self, value: &str) -> Result<bool, CommandError> {
        let vocabulary = self.vocabulary();
        if value.eq_ignore_ascii_case(vocabulary.on) {
            Ok(true)
        } else if value.eq_ignore_ascii_case(vocabulary.off) {
            Ok(false)
        } else {
            Err(CommandError::InvalidValue {
                target: self.to_string(),
                expected: vocabulary.expected,
                value: value.to_string(),
            })
        }
    }

    /// The word that would flip the device from its current value.
    pub fn toggle_word(self, state: &State) -> &'static str {
        let vocabulary = self.vocabulary();
        if self.get(state) {
            vocabulary.off
        } else {
            vocabulary.on
        }
    }

    /// Validate `value` and store it. Nothing changes on error.
    pub fn set(self, value: &str, state: &mut State) -> Result<(), CommandError> {
        let on = self.parse_value(value)?;
        *self.slot(state) = on;
        Ok(())
    }
}

/// Set a device from its dotted name and a vocabulary word.
pub fn set_device(target: &str, value: &str, state: &mut State) -> Result<DeviceId, CommandError> {
    let device = DeviceId::from_str(target)
        .map_err(|_| CommandError::UnknownDevice(target.to_string()))?;
    device.set(value, state)?;
    Ok(device)
}

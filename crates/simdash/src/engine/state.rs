use std::collections::VecDeque;

use serde::Serialize;

/// Number of samples kept in every history window.
pub const HISTORY_LEN: usize = 60;

/// Closed numeric range a simulated field is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const ENERGY_BOUNDS: Bounds = Bounds::new(0.0, 100.0);
pub const FLOW_BOUNDS: Bounds = Bounds::new(0.0, 100.0);
pub const OUTPUT_BOUNDS: Bounds = Bounds::new(0.0, 120.0);
pub const AQI_BOUNDS: Bounds = Bounds::new(8.0, 160.0);
pub const TEMPERATURE_BOUNDS: Bounds = Bounds::new(20.0, 120.0);
pub const THERMOSTAT_BOUNDS: Bounds = Bounds::new(16.0, 30.0);

/// Fixed-length window of recent samples, oldest first.
///
/// Pushing a sample drops the oldest one, so the length never changes after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    samples: VecDeque<f64>,
}

impl History {
    /// A window of `HISTORY_LEN` copies of `value`.
    pub fn filled(value: f64) -> Self {
        Self {
            samples: std::iter::repeat(value).take(HISTORY_LEN).collect(),
        }
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        self.samples.pop_front();
    }

    /// Most recent sample.
    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

/// City traffic controller mode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TrafficMode {
    #[default]
    Auto,
    Manual,
}

impl TrafficMode {
    pub fn toggled(self) -> Self {
        match self {
            TrafficMode::Auto => TrafficMode::Manual,
            TrafficMode::Manual => TrafficMode::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub light: bool,
    /// `true` when locked.
    pub lock: bool,
    pub thermostat: i64,
    pub energy_history: History,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Traffic {
    pub mode: TrafficMode,
    pub flow_history: History,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub traffic: Traffic,
    pub lights: bool,
    pub aqi: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    /// `true` when running.
    pub conveyor: bool,
    /// `true` when active.
    pub robot: bool,
    pub temperature: f64,
    pub output_history: History,
}

/// Every simulated device and its sample history.
///
/// Owned by the engine; frontends only ever see cloned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub home: Home,
    pub city: City,
    pub factory: Factory,
}

impl State {
    pub fn new() -> Self {
        Self {
            home: Home {
                light: false,
                lock: true,
                thermostat: 22,
                energy_history: History::filled(0.0),
            },
            city: City {
                traffic: Traffic {
                    mode: TrafficMode::Auto,
                    flow_history: History::filled(30.0),
                },
                lights: false,
                aqi: 22,
            },
            factory: Factory {
                conveyor: false,
                robot: false,
                temperature: 42.0,
                output_history: History::filled(40.0),
            },
        }
    }

    /// All three histories, for invariant checks.
    pub fn histories(&self) -> [&History; 3] {
        [
            &self.home.energy_history,
            &self.city.traffic.flow_history,
            &self.factory.output_history,
        ]
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

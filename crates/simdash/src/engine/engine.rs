use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::automation;
use super::command;
use super::command::thermostat_out_of_range;
use super::command::thermostat_setpoint;
use super::error::CommandError;
use super::event::LogBook;
use super::event::LogEntry;
use super::event::LogEvent;
use super::event::LogSink;
use super::event::Severity;
use super::intent::Intent;
use super::simulator;
use super::state::State;
use super::state::TEMPERATURE_BOUNDS;
use crate::config::SimulationConfig;

const COOLING_BOOST: f64 = 5.0;

/// simdash engine
///
/// Owns the simulated state and is the only place it is mutated: simulator
/// ticks, automation rules, typed commands and dashboard intents all go
/// through here. Every resulting log line lands in the engine's log book.
pub struct Engine {
    state: State,
    rng: StdRng,
    log: LogBook,
}

impl Engine {
    /// Create an engine with fresh state and the given RNG.
    pub fn new(rng: StdRng) -> Self {
        Self {
            state: State::new(),
            rng,
            log: LogBook::default(),
        }
    }

    /// Create an engine seeded from configuration (entropy when no seed is
    /// configured), and log the ready banner.
    pub fn from_config(cfg: &SimulationConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => {
                info!("Seeding simulation RNG with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        let mut engine = Self::new(rng);
        engine.emit(LogEvent::ok("Ready. Type 'help' for commands."));
        engine
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Copy of the current state for frontends.
    pub fn snapshot(&self) -> Arc<State> {
        Arc::new(self.state.clone())
    }

    pub fn log(&self) -> &LogBook {
        &self.log
    }

    /// Log entries with sequence number `>= since`.
    pub fn log_since(&self, since: u64) -> Vec<LogEntry> {
        self.log.since(since)
    }

    /// One logical tick: simulate, then apply the automation rules.
    pub fn tick(&mut self, now_ms: f64) {
        simulator::advance(&mut self.state, &mut self.rng, now_ms);
        for event in automation::apply_rules(&mut self.state) {
            self.emit(event);
        }
    }

    /// Run a typed command line.
    ///
    /// Blank input is ignored. Otherwise the line is echoed, then followed by
    /// the command's confirmation or its error.
    pub fn submit(&mut self, line: &str) -> Vec<LogEvent> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let echo = LogEvent::info(format!("> {}", line));
        let outcome = match command::execute(line, &mut self.state) {
            Ok(event) => event,
            Err(e) => rejected(e),
        };

        let events = vec![echo, outcome];
        for event in &events {
            self.emit(event.clone());
        }
        events
    }

    /// Apply a dashboard intent.
    pub fn apply(&mut self, intent: Intent) -> Vec<LogEvent> {
        debug!(?intent, "applying intent");
        let outcome = match self.apply_inner(intent) {
            Ok(event) => event,
            Err(e) => Some(rejected(e)),
        };

        let events: Vec<LogEvent> = outcome.into_iter().collect();
        for event in &events {
            self.emit(event.clone());
        }
        events
    }

    fn apply_inner(&mut self, intent: Intent) -> Result<Option<LogEvent>, CommandError> {
        match intent {
            Intent::Toggle(device) => {
                let word = device.toggle_word(&self.state);
                device.set(word, &mut self.state)?;
                Ok(None)
            }
            Intent::ToggleTrafficMode => {
                let traffic = &mut self.state.city.traffic;
                traffic.mode = traffic.mode.toggled();
                Ok(None)
            }
            Intent::SetThermostat(value) => {
                self.state.home.thermostat = thermostat_setpoint(value as f64)
                    .ok_or_else(|| thermostat_out_of_range(value))?;
                Ok(None)
            }
            Intent::RefreshAqi => {
                self.state.city.aqi = 10 + (self.rng.gen::<f64>() * 120.0).floor() as i64;
                Ok(Some(LogEvent::info("AQI refreshed")))
            }
            Intent::CoolingBoost => {
                let factory = &mut self.state.factory;
                factory.temperature = (factory.temperature - COOLING_BOOST).max(TEMPERATURE_BOUNDS.min);
                Ok(Some(LogEvent::ok("Cooling boost applied")))
            }
        }
    }

    fn emit(&mut self, event: LogEvent) {
        match event.severity {
            Severity::Warn => warn!("{}", event.message),
            Severity::Err => error!("{}", event.message),
            Severity::Info | Severity::Ok => debug!("{}", event.message),
        }
        self.log.emit(event);
    }
}

fn rejected(error: CommandError) -> LogEvent {
    LogEvent::err(format!("Error: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::device::DeviceId;
    use crate::engine::state::HISTORY_LEN;
    use crate::engine::state::TrafficMode;

    fn engine() -> Engine {
        Engine::new(StdRng::seed_from_u64(1))
    }

    #[test]
    fn test_ready_banner() {
        let engine = Engine::from_config(&SimulationConfig {
            tick_ms: 50,
            seed: Some(9),
        });
        let log = engine.log_since(0);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].event, LogEvent::ok("Ready. Type 'help' for commands."));
    }

    #[test]
    fn test_tick_keeps_history_lengths() {
        let mut engine = engine();
        for i in 0..250 {
            engine.tick(i as f64 * 16.0);
        }
        for history in engine.state().histories() {
            assert_eq!(history.len(), HISTORY_LEN);
        }
    }

    #[test]
    fn test_overheat_tick_logs_once() {
        let mut engine = engine();
        engine.state.factory.conveyor = true;
        engine.state.factory.robot = true;
        engine.state.factory.temperature = 91.0;

        engine.tick(0.0);

        assert!(!engine.state().factory.conveyor);
        assert!(!engine.state().factory.robot);
        let log = engine.log_since(0);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].event.severity, Severity::Err);
    }

    #[test]
    fn test_submit_echoes_and_confirms() {
        let mut engine = engine();
        let events = engine.submit("  set home.light on  ");
        assert_eq!(
            events,
            vec![
                LogEvent::info("> set home.light on"),
                LogEvent::ok("OK: set home.light on"),
            ]
        );
        assert!(engine.state().home.light);
        assert_eq!(engine.log().len(), 2);
    }

    #[test]
    fn test_submit_error_line() {
        let mut engine = engine();
        let events = engine.submit("thermostat 15");
        assert_eq!(events[1].severity, Severity::Err);
        assert_eq!(events[1].message, "Error: Thermostat range 16-30, got '15'");
        assert_eq!(engine.state().home.thermostat, 22);
    }

    #[test]
    fn test_submit_blank_is_ignored() {
        let mut engine = engine();
        let before = engine.state().clone();
        assert!(engine.submit("   ").is_empty());
        assert!(engine.log().is_empty());
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_manual_mode_then_ticks_use_constant_base() {
        let mut engine = engine();
        engine.submit("mode city.traffic manual");
        assert_eq!(engine.state().city.traffic.mode, TrafficMode::Manual);

        // The auto wave would sit near 10 here.
        let trough = 3.0 * std::f64::consts::FRAC_PI_2 * 20_000.0;
        for _ in 0..HISTORY_LEN {
            engine.tick(trough);
        }
        assert!(engine
            .state()
            .city
            .traffic
            .flow_history
            .iter()
            .all(|v| (35.0..=45.0).contains(&v)));
    }

    #[test]
    fn test_toggle_intents() {
        let mut engine = engine();
        assert!(engine.apply(Intent::Toggle(DeviceId::HomeLock)).is_empty());
        assert!(!engine.state().home.lock);
        engine.apply(Intent::Toggle(DeviceId::HomeLock));
        assert!(engine.state().home.lock);

        engine.apply(Intent::Toggle(DeviceId::FactoryConveyor));
        assert!(engine.state().factory.conveyor);

        engine.apply(Intent::ToggleTrafficMode);
        assert_eq!(engine.state().city.traffic.mode, TrafficMode::Manual);
    }

    #[test]
    fn test_thermostat_slider_is_validated() {
        let mut engine = engine();
        assert!(engine.apply(Intent::SetThermostat(27)).is_empty());
        assert_eq!(engine.state().home.thermostat, 27);

        let events = engine.apply(Intent::SetThermostat(40));
        assert_eq!(events, vec![LogEvent::err("Error: Thermostat range 16-30, got '40'")]);
        assert_eq!(engine.state().home.thermostat, 27);

        assert!(engine.apply(Intent::SetThermostat(16)).is_empty());
        assert_eq!(engine.state().home.thermostat, 16);
    }

    #[test]
    fn test_refresh_aqi() {
        let mut engine = engine();
        for _ in 0..100 {
            let events = engine.apply(Intent::RefreshAqi);
            assert_eq!(events, vec![LogEvent::info("AQI refreshed")]);
            assert!((10..130).contains(&engine.state().city.aqi));
        }
    }

    #[test]
    fn test_cooling_boost() {
        let mut engine = engine();
        let events = engine.apply(Intent::CoolingBoost);
        assert_eq!(events, vec![LogEvent::ok("Cooling boost applied")]);
        assert_eq!(engine.state().factory.temperature, 37.0);

        engine.state.factory.temperature = 22.0;
        engine.apply(Intent::CoolingBoost);
        assert_eq!(engine.state().factory.temperature, 20.0);
    }
}

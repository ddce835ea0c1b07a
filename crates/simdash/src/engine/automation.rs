//! Closed-loop threshold rules, applied after every simulator tick.
//!
//! Each rule reads the freshest sample and corrects device state in place.
//! Rules touch disjoint fields, so evaluation order does not matter.

use tracing::debug;

use super::event::LogEvent;
use super::state::State;
use super::state::TrafficMode;

/// Home energy above this turns the home light off.
pub const ENERGY_LIMIT: f64 = 80.0;

/// Traffic flow below this (in auto mode) turns the street lights on.
pub const FLOW_FLOOR: f64 = 20.0;

/// Factory temperature above this stops the conveyor and the robot.
pub const TEMPERATURE_LIMIT: f64 = 90.0;

/// Apply every rule once, returning the log events they raised.
pub fn apply_rules(state: &mut State) -> Vec<LogEvent> {
    let mut events = Vec::new();

    if state.home.energy_history.latest() > ENERGY_LIMIT && state.home.light {
        state.home.light = false;
        events.push(LogEvent::warn(
            "AI: High energy usage detected - turning off home.light",
        ));
    }

    // Street lights are only ever switched on here, never back off.
    if state.city.traffic.mode == TrafficMode::Auto
        && state.city.traffic.flow_history.latest() < FLOW_FLOOR
        && !state.city.lights
    {
        debug!("low traffic flow, switching city.lights on");
        state.city.lights = true;
    }

    if state.factory.temperature > TEMPERATURE_LIMIT {
        state.factory.conveyor = false;
        state.factory.robot = false;
        events.push(LogEvent::err(
            "AI: Factory temperature high - pausing conveyor and robot",
        ));
    }

    events
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::engine::testing::arb_state;
    use crate::engine::event::Severity;

    #[test]
    fn test_high_energy_turns_light_off() {
        let mut state = State::new();
        state.home.light = true;
        state.home.energy_history.push(81.0);

        let events = apply_rules(&mut state);
        assert!(!state.home.light);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warn);
    }

    #[test]
    fn test_high_energy_with_light_off_is_silent() {
        let mut state = State::new();
        state.home.energy_history.push(95.0);
        assert!(apply_rules(&mut state).is_empty());
    }

    #[test]
    fn test_energy_at_limit_does_not_trigger() {
        let mut state = State::new();
        state.home.light = true;
        state.home.energy_history.push(ENERGY_LIMIT);
        assert!(apply_rules(&mut state).is_empty());
        assert!(state.home.light);
    }

    #[test]
    fn test_low_flow_turns_city_lights_on() {
        let mut state = State::new();
        state.city.traffic.flow_history.push(12.0);

        let events = apply_rules(&mut state);
        assert!(state.city.lights);
        assert!(events.is_empty());
    }

    #[test]
    fn test_low_flow_in_manual_mode_is_ignored() {
        let mut state = State::new();
        state.city.traffic.mode = TrafficMode::Manual;
        state.city.traffic.flow_history.push(5.0);
        apply_rules(&mut state);
        assert!(!state.city.lights);
    }

    #[test]
    fn test_recovered_flow_keeps_lights_on() {
        let mut state = State::new();
        state.city.traffic.flow_history.push(5.0);
        apply_rules(&mut state);
        state.city.traffic.flow_history.push(70.0);
        apply_rules(&mut state);
        assert!(state.city.lights);
    }

    #[test]
    fn test_overheat_stops_factory() {
        let mut state = State::new();
        state.factory.conveyor = true;
        state.factory.robot = true;
        state.factory.temperature = 91.0;

        let events = apply_rules(&mut state);
        assert!(!state.factory.conveyor);
        assert!(!state.factory.robot);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Err);
    }

    #[test]
    fn test_rules_are_idempotent() {
        let mut state = State::new();
        state.home.light = true;
        state.home.energy_history.push(99.0);
        state.city.traffic.flow_history.push(1.0);
        state.factory.conveyor = true;
        state.factory.temperature = 100.0;

        apply_rules(&mut state);
        let once = state.clone();
        apply_rules(&mut state);
        assert_eq!(state, once);
    }

    proptest! {
        #[test]
        fn prop_rules_are_idempotent(mut state in arb_state()) {
            apply_rules(&mut state);
            let once = state.clone();
            apply_rules(&mut state);
            prop_assert_eq!(state, once);
        }

        #[test]
        fn prop_rules_leave_no_violation(mut state in arb_state()) {
            apply_rules(&mut state);
            if state.home.energy_history.latest() > ENERGY_LIMIT {
                prop_assert!(!state.home.light);
            }
            if state.city.traffic.mode == TrafficMode::Auto
                && state.city.traffic.flow_history.latest() < FLOW_FLOOR
            {
                prop_assert!(state.city.lights);
            }
            if state.factory.temperature > TEMPERATURE_LIMIT {
                prop_assert!(!state.factory.conveyor && !state.factory.robot);
            }
        }
    }
}

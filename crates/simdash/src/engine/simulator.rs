//! Synthetic sensor data.
//!
//! Each tick appends one sample to every history and walks the AQI and
//! factory temperature. The draws are decorative; callers that need
//! reproducible runs pass a seeded RNG.

use rand::Rng;

use super::state::Factory;
use super::state::Home;
use super::state::State;
use super::state::TrafficMode;
use super::state::AQI_BOUNDS;
use super::state::ENERGY_BOUNDS;
use super::state::FLOW_BOUNDS;
use super::state::OUTPUT_BOUNDS;
use super::state::TEMPERATURE_BOUNDS;

const ENERGY_JITTER: f64 = 3.0;
const FLOW_JITTER: f64 = 5.0;
const OUTPUT_JITTER: f64 = 6.0;
const AQI_JITTER: f64 = 2.0;
const TEMPERATURE_JITTER: f64 = 0.3;

/// Period scale of the auto-mode traffic wave, in milliseconds.
const TRAFFIC_WAVE_MS: f64 = 20_000.0;

/// Advance every simulated sensor by one sample.
pub fn advance(state: &mut State, rng: &mut impl Rng, now_ms: f64) {
    let energy = energy_base(&state.home) + jitter(rng, ENERGY_JITTER);
    state.home.energy_history.push(ENERGY_BOUNDS.clamp(energy));

    let flow = traffic_base(state.city.traffic.mode, now_ms) + jitter(rng, FLOW_JITTER);
    state.city.traffic.flow_history.push(FLOW_BOUNDS.clamp(flow));

    let output = output_base(&state.factory) + jitter(rng, OUTPUT_JITTER);
    state.factory.output_history.push(OUTPUT_BOUNDS.clamp(output));

    let aqi = state.city.aqi as f64 + jitter(rng, AQI_JITTER);
    state.city.aqi = AQI_BOUNDS.clamp(aqi).round() as i64;

    let temperature =
        state.factory.temperature + heat_drift(&state.factory) + jitter(rng, TEMPERATURE_JITTER);
    state.factory.temperature = TEMPERATURE_BOUNDS.clamp(round1(temperature));
}

/// Noise-free home energy draw for the current settings.
pub fn energy_base(home: &Home) -> f64 {
    let light = if home.light { 10.0 } else { 0.0 };
    let heating = (home.thermostat - 20).max(0) as f64 * 1.5;
    15.0 + light + heating
}

/// Noise-free traffic flow. Auto mode follows a slow sine wave; manual
/// mode holds a constant level.
pub fn traffic_base(mode: TrafficMode, now_ms: f64) -> f64 {
    match mode {
        TrafficMode::Auto => 30.0 + (now_ms / TRAFFIC_WAVE_MS).sin() * 20.0,
        TrafficMode::Manual => 40.0,
    }
}

/// Noise-free factory output for the conveyor/robot combination.
pub fn output_base(factory: &Factory) -> f64 {
    match (factory.conveyor, factory.robot) {
        (true, true) => 80.0,
        (true, false) | (false, true) => 40.0,
        (false, false) => 5.0,
    }
}

fn heat_drift(factory: &Factory) -> f64 {
    if factory.conveyor || factory.robot {
        0.25
    } else {
        -0.05
    }
}

fn jitter(rng: &mut impl Rng, spread: f64) -> f64 {
    rng.gen_range(-spread..=spread)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::engine::state::HISTORY_LEN;
    use crate::engine::testing::arb_state;

    #[test]
    fn test_energy_base() {
        let mut state = State::new();
        assert_eq!(energy_base(&state.home), 18.0);

        state.home.light = true;
        state.home.thermostat = 30;
        assert_eq!(energy_base(&state.home), 40.0);

        state.home.light = false;
        state.home.thermostat = 16;
        assert_eq!(energy_base(&state.home), 15.0);
    }

    #[test]
    fn test_output_base() {
        let mut state = State::new();
        assert_eq!(output_base(&state.factory), 5.0);
        state.factory.robot = true;
        assert_eq!(output_base(&state.factory), 40.0);
        state.factory.conveyor = true;
        assert_eq!(output_base(&state.factory), 80.0);
        state.factory.robot = false;
        assert_eq!(output_base(&state.factory), 40.0);
    }

    #[test]
    fn test_traffic_base() {
        assert_eq!(traffic_base(TrafficMode::Manual, 123_456.0), 40.0);
        assert_eq!(traffic_base(TrafficMode::Auto, 0.0), 30.0);
        let peak = std::f64::consts::FRAC_PI_2 * TRAFFIC_WAVE_MS;
        assert!((traffic_base(TrafficMode::Auto, peak) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_mode_samples_stay_near_constant_base() {
        let mut state = State::new();
        state.city.traffic.mode = TrafficMode::Manual;
        let mut rng = StdRng::seed_from_u64(11);

        // Pick a time where the auto wave would sit at its trough (10).
        let trough = 3.0 * std::f64::consts::FRAC_PI_2 * TRAFFIC_WAVE_MS;
        for _ in 0..HISTORY_LEN {
            advance(&mut state, &mut rng, trough);
        }
        for sample in state.city.traffic.flow_history.iter() {
            assert!((35.0..=45.0).contains(&sample), "sample {}", sample);
        }
    }

    #[test]
    fn test_temperature_rises_while_running() {
        let mut state = State::new();
        state.factory.conveyor = true;
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..400 {
            advance(&mut state, &mut rng, 0.0);
        }
        assert!(state.factory.temperature > 42.0);
        assert_eq!(state.factory.temperature, round1(state.factory.temperature));
    }

    #[test]
    fn test_temperature_floor() {
        let mut state = State::new();
        state.factory.temperature = 20.0;
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            advance(&mut state, &mut rng, 0.0);
            assert!(state.factory.temperature >= 20.0);
        }
    }

    proptest! {
        #[test]
        fn prop_bounds_and_lengths_hold(
            mut state in arb_state(),
            seed in any::<u64>(),
            now_ms in 0.0f64..1.0e13,
            ticks in 1usize..200,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..ticks {
                advance(&mut state, &mut rng, now_ms);

                for history in state.histories() {
                    prop_assert_eq!(history.len(), HISTORY_LEN);
                }
                prop_assert!(ENERGY_BOUNDS.contains(state.home.energy_history.latest()));
                prop_assert!(FLOW_BOUNDS.contains(state.city.traffic.flow_history.latest()));
                prop_assert!(OUTPUT_BOUNDS.contains(state.factory.output_history.latest()));
                prop_assert!(AQI_BOUNDS.contains(state.city.aqi as f64));
                prop_assert!(TEMPERATURE_BOUNDS.contains(state.factory.temperature));
            }
        }
    }
}

//! Proptest strategies shared by the engine's tests.

use proptest::collection::vec;
use proptest::prelude::*;

use super::state::State;
use super::state::TrafficMode;
use super::state::HISTORY_LEN;

fn arb_history(min: f64, max: f64) -> impl Strategy<Value = Vec<f64>> {
    vec(prop_oneof![Just(min), Just(max), min..=max], HISTORY_LEN)
}

/// Any state the engine can reach: every field within its declared range.
pub(crate) fn arb_state() -> impl Strategy<Value = State> {
    let devices = (
        any::<bool>(),
        any::<bool>(),
        16i64..=30,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    );
    let readings = (
        8i64..=160,
        prop_oneof![Just(20.0), Just(120.0), 20.0f64..=120.0],
        arb_history(0.0, 100.0),
        arb_history(0.0, 100.0),
        arb_history(0.0, 120.0),
    );

    (devices, readings).prop_map(
        |(
            (light, lock, thermostat, manual, lights, conveyor, robot),
            (aqi, temperature, energy, flow, output),
        )| {
            let mut state = State::new();
            state.home.light = light;
            state.home.lock = lock;
            state.home.thermostat = thermostat;
            if manual {
                state.city.traffic.mode = TrafficMode::Manual;
            }
            state.city.lights = lights;
            state.city.aqi = aqi;
            state.factory.conveyor = conveyor;
            state.factory.robot = robot;
            state.factory.temperature = (temperature * 10.0).round() / 10.0;
            for sample in energy {
                state.home.energy_history.push(sample);
            }
            for sample in flow {
                state.city.traffic.flow_history.push(sample);
            }
            for sample in output {
                state.factory.output_history.push(sample);
            }
            state
        },
    )
}

//! Projection of engine state into something a person can look at: toggle
//! labels, chart geometry, a one-line summary and the HTML dashboard.

use std::fmt::Write;

use serde::Serialize;

use crate::engine::state::Bounds;
use crate::engine::state::ENERGY_BOUNDS;
use crate::engine::state::FLOW_BOUNDS;
use crate::engine::state::OUTPUT_BOUNDS;
use crate::engine::DeviceId;
use crate::engine::LogEntry;
use crate::engine::State;
use crate::engine::TrafficMode;
use crate::engine::TRAFFIC_MODE_KEY;

/// A history series with the fixed vertical range it is drawn in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: &'static str,
    pub title: &'static str,
    pub color: &'static str,
    #[serde(flatten)]
    pub bounds: Bounds,
    pub values: Vec<f64>,
}

pub fn charts(state: &State) -> [Chart; 3] {
    [
        Chart {
            id: "home-energy-chart",
            title: "Home energy",
            color: "#00d280",
            bounds: ENERGY_BOUNDS,
            values: state.home.energy_history.to_vec(),
        },
        Chart {
            id: "city-traffic-chart",
            title: "City traffic flow",
            color: "#4da3ff",
            bounds: FLOW_BOUNDS,
            values: state.city.traffic.flow_history.to_vec(),
        },
        Chart {
            id: "factory-output-chart",
            title: "Factory output",
            color: "#ffcc00",
            bounds: OUTPUT_BOUNDS,
            values: state.factory.output_history.to_vec(),
        },
    ]
}

/// Map samples onto a `width`×`height` canvas, first sample at the left
/// edge, last at the right, `bounds.max` at the top.
pub fn chart_points(values: &[f64], bounds: Bounds, width: f64, height: f64) -> Vec<(f64, f64)> {
    let last = values.len().saturating_sub(1).max(1) as f64;
    let span = bounds.max - bounds.min;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = i as f64 / last * width;
            let y = height - (v - bounds.min) / span * height;
            (x, y)
        })
        .collect()
}

/// Label and on/off styling of one dashboard toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub key: &'static str,
    pub label: &'static str,
    pub on: bool,
}

pub fn toggles(state: &State) -> Vec<Toggle> {
    let device = |id: DeviceId, on_label, off_label| {
        let on = id.get(state);
        Toggle {
            key: id.into(),
            label: if on { on_label } else { off_label },
            on,
        }
    };
    let auto = state.city.traffic.mode == TrafficMode::Auto;

    vec![
        device(DeviceId::HomeLight, "On", "Off"),
        device(DeviceId::HomeLock, "Locked", "Unlocked"),
        Toggle {
            key: TRAFFIC_MODE_KEY,
            label: if auto { "Auto" } else { "Manual" },
            on: auto,
        },
        device(DeviceId::CityLights, "On", "Off"),
        device(DeviceId::FactoryConveyor, "Running", "Stopped"),
        device(DeviceId::FactoryRobot, "Active", "Idle"),
    ]
}

/// Single-line status for terminals.
pub fn summary_line(state: &State) -> String {
    let mut line = String::new();
    for toggle in toggles(state) {
        let _ = write!(line, "{}={} ", toggle.key, toggle.label);
    }
    let _ = write!(
        line,
        "thermostat={} aqi={} temp={:.1} energy={:.1} flow={:.1} output={:.1}",
        state.home.thermostat,
        state.city.aqi,
        state.factory.temperature,
        state.home.energy_history.latest(),
        state.city.traffic.flow_history.latest(),
        state.factory.output_history.latest(),
    );
    line
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

const CHART_WIDTH: f64 = 300.0;
const CHART_HEIGHT: f64 = 120.0;

/// Inline SVG line chart with four horizontal grid lines.
pub fn svg_chart(chart: &Chart) -> String {
    let mut svg = format!(
        r#"<svg id="{}" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
        chart.id,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    for i in 0..=4 {
        let y = CHART_HEIGHT / 4.0 * i as f64;
        let _ = write!(
            svg,
            r#"<line x1="0" y1="{y}" x2="{w}" y2="{y}" stroke="rgba(255,255,255,0.1)"/>"#,
            w = CHART_WIDTH
        );
    }
    let points: Vec<String> = chart_points(&chart.values, chart.bounds, CHART_WIDTH, CHART_HEIGHT)
        .into_iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect();
    let _ = write!(
        svg,
        r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/></svg>"#,
        chart.color,
        points.join(" ")
    );
    svg
}

/// Full HTML dashboard. Buttons post to the `/ui` routes, which redirect
/// back here.
pub fn page(state: &State, log: &[LogEntry], refresh_ms: u64) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>simdash</title>
<script>setTimeout(() => location.reload(), {refresh_ms});</script>
<style>
body {{ background: #111; color: #ddd; font-family: sans-serif; }}
.toggle.on {{ background: #1e5c3a; }} .toggle.off {{ background: #444; }}
.ok {{ color: #00d280; }} .warn {{ color: #ffcc00; }} .err {{ color: #ff5d5d; }}
</style></head><body>
"#
    );

    html.push_str("<section id=\"toggles\">\n");
    for toggle in toggles(state) {
        let _ = writeln!(
            html,
            r#"<form method="post" action="/ui/toggle/{key}"><button class="toggle {class}" data-device="{key}">{label}</button></form>"#,
            key = toggle.key,
            class = if toggle.on { "on" } else { "off" },
            label = toggle.label
        );
    }
    html.push_str("</section>\n");

    let _ = write!(
        html,
        r#"<section id="readings">
<p>Thermostat <span id="home-temp">{}</span></p>
<form method="post" action="/ui/thermostat"><input id="thermostat-slider" type="range" name="value" min="16" max="30" value="{}"><button>Set</button></form>
<p>AQI <span id="city-aqi">{}</span></p>
<form method="post" action="/ui/aqi"><button id="refresh-aqi">Refresh AQI</button></form>
<p>Factory temperature <span id="factory-temp">{}</span></p>
<form method="post" action="/ui/cooling"><button id="cooling-boost">Cooling boost</button></form>
</section>
"#,
        state.home.thermostat, state.home.thermostat, state.city.aqi, state.factory.temperature
    );

    html.push_str("<section id=\"charts\">\n");
    for chart in charts(state) {
        let _ = writeln!(html, "<h3>{}</h3>{}", chart.title, svg_chart(&chart));
    }
    html.push_str("</section>\n");

    html.push_str("<section id=\"console-output\">\n");
    for entry in log {
        let _ = writeln!(
            html,
            r#"<div class="log"><span class="{}">{}</span></div>"#,
            entry.event.severity,
            escape_html(&entry.event.message)
        );
    }
    html.push_str(
        r#"</section>
<form method="post" action="/ui/command"><input id="console-input" name="line" autofocus><button id="console-send">Send</button></form>
</body></html>
"#,
    );
    html
}

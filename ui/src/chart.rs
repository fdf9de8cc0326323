//! SVG charts. Geometry lives in plain functions so it can be tested without a renderer.

use std::f64::consts::{PI, TAU};

use dioxus::prelude::*;
use types::expense::format_amount;

pub const PALETTE: [&str; 6] = [
    "#2563eb", "#16a34a", "#f59e0b", "#dc2626", "#7c3aed", "#0891b2",
];

const PIE_SIZE: f64 = 200.0;
const PLOT_WIDTH: f64 = 480.0;
const PLOT_HEIGHT: f64 = 200.0;
const LABEL_Y: &str = "216";

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub percent: f64,
    pub path: String,
    pub color: &'static str,
}

fn point_on_circle(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}

/// Pie slices starting at twelve o'clock, clockwise. Non-positive values are skipped.
pub fn pie_slices(data: &[(String, f64)], cx: f64, cy: f64, r: f64) -> Vec<Slice> {
    let positive: Vec<_> = data.iter().filter(|(_, v)| *v > 0.0).collect();
    let total: f64 = positive.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut angle = -PI / 2.0;
    positive
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let sweep = value / total * TAU;
            let path = if is_full_turn(sweep) {
                // A single arc cannot close on itself; draw two halves.
                format!(
                    "M {:.2} {:.2} A {r} {r} 0 1 1 {:.2} {:.2} A {r} {r} 0 1 1 {:.2} {:.2} Z",
                    cx - r,
                    cy,
                    cx + r,
                    cy,
                    cx - r,
                    cy
                )
            } else {
                let (x0, y0) = point_on_circle(cx, cy, r, angle);
                let (x1, y1) = point_on_circle(cx, cy, r, angle + sweep);
                let large = if sweep > PI { 1 } else { 0 };
                format!("M {cx} {cy} L {x0:.2} {y0:.2} A {r} {r} 0 {large} 1 {x1:.2} {y1:.2} Z")
            };
            angle += sweep;

            Slice {
                label: label.clone(),
                value: *value,
                percent: value / total * 100.0,
                path,
                color: PALETTE[i % PALETTE.len()],
            }
        })
        .collect()
}

fn is_full_turn(sweep: f64) -> bool {
    (sweep - TAU).abs() < 1e-9
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bar {
    pub fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Vertical bars scaled to the largest value, each in an equal slot.
pub fn bar_layout(data: &[(String, f64)], width: f64, height: f64) -> Vec<Bar> {
    if data.is_empty() {
        return Vec::new();
    }

    let max = data.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let slot = width / data.len() as f64;

    data.iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let bar_height = if max > 0.0 { value.max(0.0) / max * height } else { 0.0 };
            Bar {
                label: label.clone(),
                value: *value,
                x: i as f64 * slot + slot * 0.15,
                y: height - bar_height,
                width: slot * 0.7,
                height: bar_height,
            }
        })
        .collect()
}

/// Points of a line chart; a single value sits in the middle.
pub fn line_points(data: &[(String, f64)], width: f64, height: f64) -> Vec<(f64, f64)> {
    let max = data.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let step = match data.len() {
        0 => return Vec::new(),
        1 => 0.0,
        n => width / (n - 1) as f64,
    };

    data.iter()
        .enumerate()
        .map(|(i, (_, value))| {
            let x = if data.len() == 1 { width / 2.0 } else { i as f64 * step };
            let y = if max > 0.0 { height - value.max(0.0) / max * height } else { height };
            (x, y)
        })
        .collect()
}

pub fn svg_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[component]
pub fn PieChart(data: Vec<(String, f64)>) -> Element {
    let half = PIE_SIZE / 2.0;
    let slices = pie_slices(&data, half, half, half - 4.0);

    if slices.is_empty() {
        return rsx! {
            p { class: "chart-empty text-muted", "Nothing to chart yet." }
        };
    }

    rsx! {
        div { class: "chart chart-pie",
            svg {
                view_box: "0 0 {PIE_SIZE} {PIE_SIZE}",
                width: "{PIE_SIZE}",
                height: "{PIE_SIZE}",
                for slice in slices.iter() {
                    path { key: "{slice.label}", d: "{slice.path}", fill: "{slice.color}" }
                }
            }
            ul { class: "chart-legend",
                for slice in slices {
                    li { key: "{slice.label}",
                        span { class: "chart-swatch", style: "background: {slice.color}" }
                        "{slice.label} "
                        span { class: "text-muted", "{slice.percent:.1}%" }
                    }
                }
            }
        }
    }
}

#[component]
pub fn BarChart(data: Vec<(String, f64)>) -> Element {
    let bars = bar_layout(&data, PLOT_WIDTH, PLOT_HEIGHT);

    if bars.is_empty() {
        return rsx! {
            p { class: "chart-empty text-muted", "Nothing to chart yet." }
        };
    }

    rsx! {
        div { class: "chart chart-bar",
            svg {
                view_box: format!("0 -10 {PLOT_WIDTH} {}", PLOT_HEIGHT + 30.0),
                width: "100%",
                for (i, bar) in bars.into_iter().enumerate() {
                    g { key: "{bar.label}",
                        rect {
                            x: "{bar.x:.1}",
                            y: "{bar.y:.1}",
                            width: "{bar.width:.1}",
                            height: "{bar.height:.1}",
                            fill: PALETTE[i % PALETTE.len()],
                        }
                        text {
                            x: format!("{:.1}", bar.center()),
                            y: LABEL_Y,
                            text_anchor: "middle",
                            class: "chart-label",
                            "{bar.label}"
                        }
                        text {
                            x: format!("{:.1}", bar.center()),
                            y: format!("{:.1}", bar.y - 4.0),
                            text_anchor: "middle",
                            class: "chart-value",
                            {format_amount(bar.value)}
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn LineChart(data: Vec<(String, f64)>) -> Element {
    let points = line_points(&data, PLOT_WIDTH, PLOT_HEIGHT);

    if points.is_empty() {
        return rsx! {
            p { class: "chart-empty text-muted", "Nothing to chart yet." }
        };
    }

    let polyline = svg_points(&points);

    rsx! {
        div { class: "chart chart-line",
            svg {
                view_box: format!("-20 -10 {} {}", PLOT_WIDTH + 40.0, PLOT_HEIGHT + 30.0),
                width: "100%",
                polyline {
                    points: "{polyline}",
                    fill: "none",
                    stroke: PALETTE[0],
                    stroke_width: "2",
                }
                for ((label, value), (x, y)) in data.iter().zip(points) {
                    g { key: "{label}",
                        circle { cx: "{x:.1}", cy: "{y:.1}", r: "3", fill: PALETTE[0] }
                        text {
                            x: "{x:.1}",
                            y: LABEL_Y,
                            text_anchor: "middle",
                            class: "chart-label",
                            "{label}"
                        }
                        text {
                            x: "{x:.1}",
                            y: format!("{:.1}", y - 6.0),
                            text_anchor: "middle",
                            class: "chart-value",
                            {format_amount(*value)}
                        }
                    }
                }
            }
        }
    }
}

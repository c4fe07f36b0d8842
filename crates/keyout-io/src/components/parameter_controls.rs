//! Processing parameter controls.
//!
//! Each control reports its own field, so one user action produces one
//! parameter change and at most one request.

use dioxus::prelude::*;
use keyout_session::types::{BLUR_RADIUS_MAX, BLUR_RADIUS_STEP, TOLERANCE_MAX};
use keyout_session::{Mode, ProcessingParameters};

/// Props for the [`ParameterControls`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ParameterControlsProps {
    /// Current parameters (read-only).
    parameters: ProcessingParameters,
    on_tolerance: EventHandler<i64>,
    on_blur_radius: EventHandler<f64>,
    on_mode: EventHandler<Mode>,
    on_refine_edges: EventHandler<bool>,
}

/// Tolerance and blur sliders, the mode selector and the edge toggle.
#[component]
pub fn ParameterControls(props: ParameterControlsProps) -> Element {
    let params = props.parameters;
    let on_tolerance = props.on_tolerance;
    let on_blur_radius = props.on_blur_radius;
    let on_mode = props.on_mode;
    let on_refine_edges = props.on_refine_edges;

    rsx! {
        div { class: "controls",
            {render_slider(
                "tolerance",
                "Tolerance",
                "How far a color may be from the seed and still count as background.",
                f64::from(params.tolerance),
                0.0,
                f64::from(TOLERANCE_MAX),
                1.0,
                0,
                move |v: f64| {
                    #[allow(clippy::cast_possible_truncation)]
                    on_tolerance.call(v.round() as i64);
                },
            )}
            {render_slider(
                "blur_radius",
                "Edge blur",
                "Feathering applied to the mask edge, in pixels.",
                params.blur_radius,
                0.0,
                BLUR_RADIUS_MAX,
                BLUR_RADIUS_STEP,
                1,
                move |v: f64| on_blur_radius.call(v),
            )}
            {render_mode(params.mode, move |mode| on_mode.call(mode))}
            {render_toggle(
                "refine_edges",
                "Refine edges",
                "Run the service's edge-refinement pass.",
                params.refine_edges,
                move |checked| on_refine_edges.call(checked),
            )}
        }
    }
}

/// Render a labeled range slider with its current value.
#[allow(clippy::too_many_arguments)]
fn render_slider(
    id: &str,
    label: &str,
    description: &str,
    value: f64,
    min: f64,
    max: f64,
    step: f64,
    decimals: usize,
    on_input: impl Fn(f64) + 'static,
) -> Element {
    let display = format!("{value:.decimals$}");
    let id = id.to_string();
    let label = label.to_string();
    let description = description.to_string();

    rsx! {
        div { class: "control",
            div { class: "control-row",
                label { r#for: "{id}", class: "control-label", "{label}" }
                span { class: "control-value", "{display}" }
            }
            p { class: "control-description", "{description}" }
            input {
                r#type: "range",
                id: "{id}",
                min: "{min}",
                max: "{max}",
                step: "{step}",
                value: "{value}",
                class: "control-slider",
                oninput: move |e| {
                    match e.value().parse::<f64>() {
                        Ok(v) => on_input(v),
                        Err(err) => {
                            web_sys::console::warn_1(
                                &format!("slider parse failure: {err:?} from {:?}", e.value())
                                    .into(),
                            );
                        }
                    }
                },
            }
        }
    }
}

/// Render the simple/advanced radio pair.
fn render_mode(selected: Mode, on_change: impl Fn(Mode) + Copy + 'static) -> Element {
    rsx! {
        fieldset { class: "control",
            legend { class: "control-label", "Mode" }
            for (mode, text) in [(Mode::Simple, "Simple"), (Mode::Advanced, "Advanced")] {
                label { class: "control-radio",
                    input {
                        r#type: "radio",
                        name: "mode",
                        value: mode.as_str(),
                        checked: mode == selected,
                        onchange: move |_| on_change(mode),
                    }
                    "{text}"
                }
            }
        }
    }
}

/// Render a labeled checkbox with a description.
fn render_toggle(
    id: &str,
    label: &str,
    description: &str,
    checked: bool,
    on_change: impl Fn(bool) + 'static,
) -> Element {
    let id = id.to_string();
    let label = label.to_string();
    let description = description.to_string();

    rsx! {
        div { class: "control",
            div { class: "control-row",
                label { r#for: "{id}", class: "control-label", "{label}" }
                input {
                    r#type: "checkbox",
                    id: "{id}",
                    checked: checked,
                    onchange: move |e| {
                        on_change(e.checked());
                    },
                }
            }
            p { class: "control-description", "{description}" }
        }
    }
}

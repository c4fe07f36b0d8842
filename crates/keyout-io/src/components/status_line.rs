//! One-line session status with the seed color swatch.

use dioxus::prelude::*;
use keyout_session::{SeedColor, SessionState};

#[derive(Props, Clone, PartialEq)]
pub struct StatusLineProps {
    state: SessionState,
    seed_color: Option<SeedColor>,
}

#[component]
pub fn StatusLine(props: StatusLineProps) -> Element {
    let label = props.state.label();
    let seed = props.seed_color.map(|color| (color.to_string(), color.to_css()));

    rsx! {
        div { class: "status",
            span { class: "status-state", "{label}" }
            if let Some((value, css)) = seed {
                span { class: "status-seed",
                    span { class: "swatch", style: "background-color: {css}" }
                    code { "{value}" }
                }
            }
        }
    }
}

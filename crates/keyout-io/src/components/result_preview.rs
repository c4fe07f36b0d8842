//! Processed result display.

use dioxus::prelude::*;

/// Props for the [`ResultPreview`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ResultPreviewProps {
    /// Display handle (Blob URL) of the latest result.
    result_url: Option<String>,
    /// Whether a request is awaiting its result.
    processing: bool,
    /// Message shown when the channel has failed and a new upload is
    /// required.
    unavailable: Option<String>,
    /// Download name of the displayed result; `None` disables saving.
    save_name: Option<String>,
    on_save: EventHandler<()>,
}

/// The latest result over a checkerboard, the "Processing…" line, the
/// unavailable banner and the save button.
#[component]
pub fn ResultPreview(props: ResultPreviewProps) -> Element {
    let on_save = props.on_save;

    rsx! {
        section { class: "result",
            if let Some(ref message) = props.unavailable {
                div { class: "banner banner-error", role: "alert",
                    p { "Processing unavailable: {message}" }
                    p { class: "banner-hint", "Select the image again to start a new session." }
                }
            }

            div { class: "result-frame checkerboard",
                if let Some(ref url) = props.result_url {
                    img { src: "{url}", alt: "Result with background removed", class: "result-image" }
                } else {
                    p { class: "result-empty", "The result appears here after you pick a color." }
                }
            }

            if props.processing {
                p { class: "result-status pulse", aria_live: "polite", "Processing…" }
            }

            button {
                class: "button",
                disabled: props.save_name.is_none(),
                title: props.save_name.clone().unwrap_or_default(),
                onclick: move |_| on_save.call(()),
                "Save result"
            }
        }
    }
}

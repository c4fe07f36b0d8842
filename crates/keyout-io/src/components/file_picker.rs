//! Image selection: a file input plus a drop zone.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use wasm_bindgen::JsCast;

/// DOM id of the hidden file input.
const INPUT_ID: &str = "keyout-file-input";

/// Extensions a browser can paint, with the label shown to the user.
const FORMATS: &[(&str, &str)] = &[
    ("png", "PNG"),
    ("jpg", "JPEG"),
    ("jpeg", "JPEG"),
    ("bmp", "BMP"),
    ("webp", "WebP"),
    ("gif", "GIF"),
];

/// Why a picked file is refused before reading it, or `None` to accept.
///
/// Only a first filter; the decoder sniffs the real format.
fn refusal(name: &str) -> Option<String> {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return Some(format!("{name} has no file extension"));
    };
    if FORMATS.iter().any(|(known, _)| known.eq_ignore_ascii_case(ext)) {
        None
    } else {
        Some(format!("Unsupported file type .{ext} ({name})"))
    }
}

/// The `accept` attribute, e.g. `.png,.jpg,…`.
fn accept_attribute() -> String {
    FORMATS
        .iter()
        .map(|(ext, _)| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Distinct format labels for the hint line.
fn format_labels() -> String {
    let mut labels: Vec<&str> = Vec::new();
    for &(_, label) in FORMATS {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels.join(", ")
}

/// Empty the file input so that choosing the same file again still
/// fires `change` (needed to retry after a failed upload).
fn reset_input() {
    let input = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(INPUT_ID))
        .and_then(|e| e.dyn_into::<web_sys::HtmlInputElement>().ok());
    if let Some(input) = input {
        input.set_value("");
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct FilePickerProps {
    /// Receives `(bytes, file_name)` of the picked image.
    on_select: EventHandler<(Vec<u8>, String)>,
    /// Name of the image currently shown.
    loaded: Option<String>,
    /// Decode or upload failure reported by the session.
    error: Option<String>,
    /// The session is still decoding the last pick.
    busy: bool,
}

/// Lets the user choose the source image by button or by dropping it.
///
/// Only the first of several files is used. Read failures and refused
/// names are shown here; session failures come in through `error`.
#[component]
pub fn FilePicker(props: FilePickerProps) -> Element {
    let mut over = use_signal(|| false);
    let mut reading = use_signal(|| false);
    let mut refused = use_signal(|| Option::<String>::None);

    let take_first = move |files: Vec<FileData>| async move {
        let mut files = files.into_iter();
        let Some(file) = files.next() else {
            return;
        };
        if files.next().is_some() {
            log::debug!("several files picked, using {}", file.name());
        }

        let name = file.name();
        if let Some(reason) = refusal(&name) {
            refused.set(Some(reason));
            return;
        }

        reading.set(true);
        let read = file.read_bytes().await;
        reading.set(false);
        match read {
            Ok(bytes) => {
                refused.set(None);
                props.on_select.call((bytes.to_vec(), name));
            }
            Err(e) => refused.set(Some(format!("Could not read {name}: {e}"))),
        }
    };

    let on_change = move |evt: FormEvent| async move {
        take_first(evt.files()).await;
        reset_input();
    };

    let on_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        over.set(false);
        take_first(evt.files()).await;
    };

    let zone_class = if over() { "picker picker-active" } else { "picker" };
    let message = refused().or_else(|| props.error.clone());
    let accept = accept_attribute();
    let hint = format!("or drop it here · {}", format_labels());

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                over.set(true);
            },
            ondragleave: move |_| over.set(false),
            ondrop: on_drop,

            if reading() || props.busy {
                p { class: "picker-status", "Decoding…" }
            } else if let Some(ref name) = props.loaded {
                p { class: "picker-status picker-loaded", "Loaded: {name}" }
            }

            if let Some(ref text) = message {
                p { class: "picker-error", role: "alert", "{text}" }
            }

            label { class: "button",
                input {
                    id: INPUT_ID,
                    r#type: "file",
                    accept: "{accept}",
                    class: "hidden",
                    onchange: on_change,
                }
                "Choose image"
            }
            p { class: "picker-hint", "{hint}" }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn browser_formats_are_accepted_in_any_case() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.bmp", "e.WebP", "f.gif", "photo.v2.png"] {
            assert_eq!(refusal(name), None, "{name}");
        }
    }

    #[test]
    fn other_names_are_refused_with_a_reason() {
        assert_eq!(
            refusal("scan.tiff").unwrap(),
            "Unsupported file type .tiff (scan.tiff)"
        );
        assert_eq!(refusal("README").unwrap(), "README has no file extension");
        assert!(refusal("archive.png.zip").is_some());
    }

    #[test]
    fn accept_attribute_lists_every_extension() {
        assert_eq!(accept_attribute(), ".png,.jpg,.jpeg,.bmp,.webp,.gif");
    }

    #[test]
    fn hint_labels_are_deduplicated() {
        assert_eq!(format_labels(), "PNG, JPEG, BMP, WebP, GIF");
    }
}

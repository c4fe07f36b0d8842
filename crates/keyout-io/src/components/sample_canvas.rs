//! Click-to-sample view of the source image.

use dioxus::prelude::*;
use keyout_session::{Dimensions, PointerPosition, RenderedBounds, SeedColor};

/// DOM id of the rendered source image.
const SOURCE_ID: &str = "keyout-source";

/// Props for the [`SampleCanvas`] component.
#[derive(Props, Clone, PartialEq)]
pub struct SampleCanvasProps {
    /// Display handle (Blob URL) of the source image.
    source_url: String,
    /// Natural size of the source image.
    dimensions: Dimensions,
    /// The current seed color, shown as a ring around the cursor hint.
    seed_color: Option<SeedColor>,
    /// Fired with the click position and the image's rendered bounds,
    /// both in client coordinates.
    on_sample: EventHandler<(PointerPosition, RenderedBounds)>,
}

/// Bounding box of the rendered source image.
fn rendered_bounds() -> Option<RenderedBounds> {
    let element = web_sys::window()?
        .document()?
        .get_element_by_id(SOURCE_ID)?;
    let rect = element.get_bounding_client_rect();
    Some(RenderedBounds {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    })
}

/// Renders the source image and reports clicks on it.
///
/// The image scales to its container; the bounds reported with each
/// click let the sampler map back to natural pixels.
#[component]
pub fn SampleCanvas(props: SampleCanvasProps) -> Element {
    let Dimensions { width, height } = props.dimensions;
    let ring = props
        .seed_color
        .map_or_else(|| "transparent".to_owned(), SeedColor::to_css);

    rsx! {
        figure { class: "sample",
            img {
                id: SOURCE_ID,
                src: "{props.source_url}",
                alt: "Source image, click the background to sample it",
                width: "{width}",
                height: "{height}",
                class: "sample-image",
                style: "outline-color: {ring}",
                draggable: "false",
                onclick: move |evt: MouseEvent| {
                    let point = evt.client_coordinates();
                    let position = PointerPosition { x: point.x, y: point.y };
                    match rendered_bounds() {
                        Some(bounds) => props.on_sample.call((position, bounds)),
                        None => log::warn!("source image is not in the document"),
                    }
                },
            }
            figcaption { class: "sample-caption", "{width} × {height} · click the background color" }
        }
    }
}

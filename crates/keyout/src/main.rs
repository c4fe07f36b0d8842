use dioxus::prelude::*;
use keyout_io::{
    FilePicker, ParameterControls, ResultPreview, SampleCanvas, SessionDriver, StatusLine,
};
use keyout_session::{FailureKind, Mode, PointerPosition, RenderedBounds, SessionState};

fn main() {
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already installed: {e}").into());
    }
    dioxus::launch(app);
}

/// Root application component.
///
/// Owns the [`SessionDriver`] and mirrors its [`keyout_io::SessionView`]
/// into a signal, so every network completion re-renders the page.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    let driver = use_hook(|| SessionDriver::new(keyout_io::location::endpoints_from_location()));
    let mut view = use_signal(|| driver.view());
    let mut decoding = use_signal(|| false);

    use_hook({
        let driver = driver.clone();
        move || {
            driver.set_on_change(move |next| {
                let mut view = view;
                view.set(next);
            });
        }
    });

    // --- File selection ---
    // Decoding is synchronous; yield first so "Decoding…" paints.
    let on_select = {
        let driver = driver.clone();
        move |(bytes, name): (Vec<u8>, String)| {
            let driver = driver.clone();
            decoding.set(true);
            spawn(async move {
                gloo_timers::future::TimeoutFuture::new(0).await;
                if let Err(e) = driver.select_file(&name, bytes) {
                    log::debug!("selection rejected: {e}");
                }
                decoding.set(false);
            });
        }
    };

    let on_sample = {
        let driver = driver.clone();
        move |(position, bounds): (PointerPosition, RenderedBounds)| {
            driver.click(position, bounds);
        }
    };

    let on_tolerance = {
        let driver = driver.clone();
        move |value: i64| driver.set_tolerance(value)
    };
    let on_blur_radius = {
        let driver = driver.clone();
        move |value: f64| driver.set_blur_radius(value)
    };
    let on_mode = {
        let driver = driver.clone();
        move |mode: Mode| driver.set_mode(mode)
    };
    let on_refine_edges = {
        let driver = driver.clone();
        move |refine: bool| driver.set_refine_edges(refine)
    };

    let on_save = {
        let driver = driver.clone();
        move |(): ()| {
            if let Err(e) = driver.save_result() {
                log::error!("saving result failed: {e}");
            }
        }
    };

    let current = view();
    let picker_error = current
        .notice
        .as_ref()
        .filter(|n| matches!(n.kind, FailureKind::Decode | FailureKind::Upload))
        .map(|n| n.message.clone());
    let unavailable = (current.state == SessionState::Unavailable).then(|| {
        current
            .notice
            .as_ref()
            .map_or_else(|| "the connection was lost".to_owned(), |n| n.message.clone())
    });
    let channel_error = current
        .notice
        .as_ref()
        .filter(|n| n.kind == FailureKind::Connection && unavailable.is_none())
        .map(|n| n.message.clone());

    rsx! {
        style { dangerous_inner_html: include_str!("../assets/keyout.css") }

        div { class: "page",
            header { class: "header",
                h1 { class: "title", "keyout" }
                p { class: "subtitle", "Click a background color to remove it" }
            }

            main { class: "layout",
                div { class: "column",
                    FilePicker {
                        on_select: on_select,
                        loaded: current.file_name.clone(),
                        error: picker_error,
                        busy: decoding(),
                    }

                    if let Some(ref message) = channel_error {
                        p { class: "picker-error", role: "alert", "{message}" }
                    }

                    if let (Some(url), Some(dimensions)) = (current.source_url.clone(), current.dimensions) {
                        SampleCanvas {
                            source_url: url,
                            dimensions: dimensions,
                            seed_color: current.seed_color,
                            on_sample: on_sample,
                        }
                    }

                    StatusLine { state: current.state, seed_color: current.seed_color }

                    ParameterControls {
                        parameters: current.parameters,
                        on_tolerance: on_tolerance,
                        on_blur_radius: on_blur_radius,
                        on_mode: on_mode,
                        on_refine_edges: on_refine_edges,
                    }
                }

                div { class: "column",
                    ResultPreview {
                        result_url: current.result_url.clone(),
                        processing: current.processing,
                        unavailable: unavailable,
                        save_name: current.result_file_name.clone(),
                        on_save: on_save,
                    }
                }
            }
        }
    }
}

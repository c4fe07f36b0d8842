//! Executes the orchestrator's commands against the browser.
//!
//! [`SessionDriver`] owns the [`SessionOrchestrator`], the live
//! [`ProcessingChannel`] and the service endpoints. UI events go in
//! through its methods; after every event or I/O completion it drains
//! the orchestrator's commands, executes them, and publishes a fresh
//! [`SessionView`] to the registered change callback.
//!
//! Callbacks from the network hold a `Weak` reference, so a dropped
//! driver silently ignores late completions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use keyout_session::{
    Command, ConnectionError, ConnectionState, Dimensions, FailureNotice, ImageAsset, Mode,
    PointerPosition, ProcessingParameters, RenderedBounds, SeedColor, ServiceEndpoints,
    SessionError, SessionOrchestrator, SessionState,
};

use crate::blob::{BlobError, BlobSurface};
use crate::channel::{ChannelEvent, ProcessingChannel};
use crate::download::trigger_download;
use crate::upload::upload_file;

/// Everything the UI renders, as one comparable snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub file_name: Option<String>,
    pub source_url: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub parameters: ProcessingParameters,
    pub seed_color: Option<SeedColor>,
    pub result_url: Option<String>,
    /// Suggested download name; `None` while there is no result.
    pub result_file_name: Option<String>,
    pub processing: bool,
    pub notice: Option<FailureNotice>,
}

type ChangeCallback = Box<dyn Fn(SessionView)>;

struct Inner {
    endpoints: ServiceEndpoints,
    orchestrator: RefCell<SessionOrchestrator<BlobSurface>>,
    channel: RefCell<Option<(u64, ProcessingChannel)>>,
    on_change: RefCell<Option<ChangeCallback>>,
}

/// Shared handle to the browser session.
#[derive(Clone)]
pub struct SessionDriver {
    inner: Rc<Inner>,
}

impl SessionDriver {
    #[must_use]
    pub fn new(endpoints: ServiceEndpoints) -> Self {
        log::info!(
            "upload endpoint {}, channel endpoint {}",
            endpoints.upload_url(),
            endpoints.channel_url()
        );
        Self {
            inner: Rc::new(Inner {
                endpoints,
                orchestrator: RefCell::new(SessionOrchestrator::new(BlobSurface::new())),
                channel: RefCell::new(None),
                on_change: RefCell::new(None),
            }),
        }
    }

    /// Register the callback receiving a [`SessionView`] after every
    /// change. Replaces any previous callback.
    pub fn set_on_change(&self, callback: impl Fn(SessionView) + 'static) {
        *self.inner.on_change.borrow_mut() = Some(Box::new(callback));
    }

    /// Snapshot of the current session for rendering.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let orch = self.inner.orchestrator.borrow();
        let image = orch.image();
        SessionView {
            state: orch.state(),
            file_name: image.map(|asset| asset.file_name().to_owned()),
            source_url: image.map(|asset| asset.display().to_string()),
            dimensions: image.map(ImageAsset::dimensions),
            parameters: orch.parameters(),
            seed_color: orch.seed_color(),
            result_url: orch.result().map(ToString::to_string),
            result_file_name: orch.result_file_name(),
            processing: orch.is_processing(),
            notice: orch.notice().cloned(),
        }
    }

    // ----------------------------------------------------------------
    // UI events
    // ----------------------------------------------------------------

    /// Load a newly selected file and start its session.
    ///
    /// # Errors
    ///
    /// Returns the decode failure; it is also shown as the notice.
    pub fn select_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), SessionError> {
        let outcome = self
            .inner
            .orchestrator
            .borrow_mut()
            .select_file(file_name, bytes);
        self.flush();
        outcome
    }

    /// Sample the source image under a click.
    pub fn click(&self, position: PointerPosition, bounds: RenderedBounds) -> Option<SeedColor> {
        let color = self.inner.orchestrator.borrow_mut().click(position, bounds);
        self.flush();
        color
    }

    pub fn set_tolerance(&self, value: i64) {
        self.inner.orchestrator.borrow_mut().set_tolerance(value);
        self.flush();
    }

    pub fn set_blur_radius(&self, value: f64) {
        self.inner.orchestrator.borrow_mut().set_blur_radius(value);
        self.flush();
    }

    pub fn set_mode(&self, mode: Mode) {
        self.inner.orchestrator.borrow_mut().set_mode(mode);
        self.flush();
    }

    pub fn set_refine_edges(&self, refine: bool) {
        self.inner.orchestrator.borrow_mut().set_refine_edges(refine);
        self.flush();
    }

    pub fn dismiss_notice(&self) {
        self.inner.orchestrator.borrow_mut().dismiss_notice();
        self.notify();
    }

    /// Download the displayed result as `<stem>-no-bg.png`.
    ///
    /// Does nothing when no result is displayed.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] if the browser refuses the download.
    pub fn save_result(&self) -> Result<(), BlobError> {
        let orch = self.inner.orchestrator.borrow();
        match (orch.result_bytes(), orch.result_file_name()) {
            (Some(bytes), Some(name)) => trigger_download(bytes, &name, "image/png"),
            _ => Ok(()),
        }
    }

    // ----------------------------------------------------------------
    // Command execution
    // ----------------------------------------------------------------

    /// Execute pending commands until none remain, then publish.
    fn flush(&self) {
        loop {
            let commands = self.inner.orchestrator.borrow_mut().take_commands();
            if commands.is_empty() {
                break;
            }
            for command in commands {
                self.execute(command);
            }
        }
        log::debug!(
            "{} live blob URLs",
            self.inner.orchestrator.borrow().surface().live_urls()
        );
        self.notify();
    }

    fn notify(&self) {
        let view = self.view();
        if let Some(callback) = self.inner.on_change.borrow().as_ref() {
            callback(view);
        }
    }

    fn weak(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    fn execute(&self, command: Command) {
        match command {
            Command::Upload {
                generation,
                file_name,
                bytes,
            } => self.start_upload(generation, file_name, bytes),
            Command::Open { generation } => self.open_channel(generation),
            Command::Send {
                generation,
                payload,
            } => self.send(generation, &payload),
            Command::Close { generation } => self.close_channel(generation),
        }
    }

    fn start_upload(&self, generation: u64, file_name: String, bytes: Vec<u8>) {
        let url = self.inner.endpoints.upload_url();
        let weak = self.weak();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = upload_file(&url, &file_name, &bytes).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let driver = Self { inner };
            driver
                .inner
                .orchestrator
                .borrow_mut()
                .upload_finished(generation, outcome);
            driver.flush();
        });
    }

    fn open_channel(&self, generation: u64) {
        let weak = self.weak();
        let connected = ProcessingChannel::connect(
            &self.inner.endpoints.channel_url(),
            move |event| {
                if let Some(inner) = weak.upgrade() {
                    Self { inner }.on_channel_event(generation, event);
                }
            },
        );

        match connected {
            Ok(channel) => {
                let previous = self.inner.channel.borrow_mut().replace((generation, channel));
                if let Some((_, previous)) = previous {
                    retire(previous);
                }
            }
            Err(err) => self
                .inner
                .orchestrator
                .borrow_mut()
                .channel_failed(generation, err),
        }
    }

    fn send(&self, generation: u64, payload: &str) {
        let sent = match self.inner.channel.borrow().as_ref() {
            Some((open, channel)) if *open == generation => channel.send_text(payload),
            _ => Err(ConnectionError::NotOpen),
        };
        if let Err(err) = sent {
            self.inner
                .orchestrator
                .borrow_mut()
                .channel_failed(generation, err);
        }
    }

    fn close_channel(&self, generation: u64) {
        let taken = {
            let mut slot = self.inner.channel.borrow_mut();
            match slot.as_ref() {
                Some((open, _)) if *open == generation => slot.take(),
                _ => None,
            }
        };
        if let Some((_, channel)) = taken {
            retire(channel);
        }
    }

    fn on_channel_event(&self, generation: u64, event: ChannelEvent) {
        {
            let mut orch = self.inner.orchestrator.borrow_mut();
            match event {
                ChannelEvent::Opened => orch.channel_opened(generation),
                ChannelEvent::Message(payload) => orch.result_received(generation, &payload),
                ChannelEvent::Failed(message) => {
                    let handshake = orch
                        .session()
                        .is_some_and(|s| s.connection_state() == ConnectionState::Connecting);
                    let err = if handshake {
                        ConnectionError::Handshake(message)
                    } else {
                        ConnectionError::Channel(message)
                    };
                    orch.channel_failed(generation, err);
                }
                ChannelEvent::Closed { code, reason } => {
                    orch.channel_closed(generation, code, reason);
                }
            }
        }
        self.flush();
    }
}

/// Close `channel` now and drop it on a later tick: it may be the
/// channel whose handler is currently running.
fn retire(channel: ProcessingChannel) {
    channel.close();
    wasm_bindgen_futures::spawn_local(async move {
        drop(channel);
    });
}

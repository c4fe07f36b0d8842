//! The session orchestrator.
//!
//! [`SessionOrchestrator`] composes the decoder, sampler, parameter store,
//! connection and result manager, and is the only place that decides when
//! a processing request goes out. It is driven from the outside:
//!
//! - UI events arrive as method calls (`select_file`, `click`, the
//!   parameter setters).
//! - I/O completions arrive tagged with the session generation that
//!   issued them (`upload_finished`, `channel_opened`, `channel_failed`,
//!   `channel_closed`, `result_received`). Completions for a superseded
//!   generation are dropped.
//! - Work for the driver is collected with [`SessionOrchestrator::take_commands`].
//!
//! At session start the orchestrator subscribes to the sampler, the
//! store and the connection; notifications land in an inbox that is
//! drained before each call returns. Teardown unsubscribes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::connection::{Command, ConnectionError, ConnectionState, UploadError};
use crate::decode::{DecodeError, ImageAsset, ImageDecoder};
use crate::notify::SubscriptionId;
use crate::params::{ParameterChange, ParameterStore};
use crate::results::ResultResourceManager;
use crate::sample::{ColorSampler, PointerPosition, RenderedBounds};
use crate::session::ProcessingSession;
use crate::surface::{DisplayError, DisplaySurface};
use crate::types::{Mode, ProcessingParameters, SeedColor};
use crate::wire::ProcessingRequest;

/// Where the orchestrator is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No image.
    #[default]
    Idle,
    /// Image decoded, no session.
    ImageLoaded,
    /// Upload in flight.
    Uploading,
    /// Upload acknowledged, channel handshake in flight.
    Connecting,
    /// Channel open, no seed color yet.
    AwaitingColor,
    /// Seed color known, nothing outstanding.
    Ready,
    /// At least one request is awaiting a result.
    Processing,
    /// The channel failed after opening. A new file is required.
    Unavailable,
}

impl SessionState {
    /// Short human-readable label for the status line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Choose an image",
            Self::ImageLoaded => "Image loaded",
            Self::Uploading => "Uploading…",
            Self::Connecting => "Connecting…",
            Self::AwaitingColor => "Click the background to pick a color",
            Self::Ready => "Ready",
            Self::Processing => "Processing…",
            Self::Unavailable => "Processing unavailable",
        }
    }

    /// States in which parameter changes are sent to the service.
    const fn dispatches(self) -> bool {
        matches!(self, Self::AwaitingColor | Self::Ready | Self::Processing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Any failure the orchestrator reports.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Display(#[from] DisplayError),
}

impl SessionError {
    /// Which control the failure belongs next to.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Decode(_) => FailureKind::Decode,
            Self::Upload(_) => FailureKind::Upload,
            Self::Connection(_) => FailureKind::Connection,
            Self::Display(_) => FailureKind::Display,
        }
    }
}

/// Category of a user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Decode,
    Upload,
    Connection,
    Display,
}

/// The most recent failure, kept for display until the next file is
/// selected or it is dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&SessionError> for FailureNotice {
    fn from(err: &SessionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Notifications collected from subscribed components.
#[derive(Debug)]
enum SessionEvent {
    SeedColor(SeedColor),
    Parameter(ParameterChange),
    Result(Vec<u8>),
}

type Inbox = Rc<RefCell<VecDeque<SessionEvent>>>;

#[derive(Debug, Clone, Copy)]
struct Subscriptions {
    sampler: SubscriptionId,
    params: SubscriptionId,
    results: Option<SubscriptionId>,
}

/// Owner of the session lifecycle.
pub struct SessionOrchestrator<S: DisplaySurface> {
    surface: S,
    decoder: ImageDecoder<S::Handle>,
    sampler: ColorSampler,
    params: ParameterStore,
    results: ResultResourceManager<S::Handle>,
    session: Option<ProcessingSession>,
    subscriptions: Option<Subscriptions>,
    inbox: Inbox,
    outbox: Vec<Command>,
    state: SessionState,
    generation: u64,
    notice: Option<FailureNotice>,
}

impl<S: DisplaySurface> SessionOrchestrator<S> {
    /// An idle orchestrator painting through `surface`.
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self::with_parameters(surface, ProcessingParameters::default())
    }

    /// An idle orchestrator starting from `initial` parameters.
    #[must_use]
    pub fn with_parameters(surface: S, mut initial: ProcessingParameters) -> Self {
        initial.color = None;
        Self {
            surface,
            decoder: ImageDecoder::new(),
            sampler: ColorSampler::new(),
            params: ParameterStore::with_parameters(initial),
            results: ResultResourceManager::new(),
            session: None,
            subscriptions: None,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            outbox: Vec::new(),
            state: SessionState::Idle,
            generation: 0,
            notice: None,
        }
    }

    // ----------------------------------------------------------------
    // UI events
    // ----------------------------------------------------------------

    /// A file was selected.
    ///
    /// Decodes the bytes and, on success, tears down any existing session
    /// and starts a new one with an upload. On a decode failure the
    /// existing image and session are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Decode`] if the file is not a supported
    /// image or the surface cannot display it.
    pub fn select_file(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<(), SessionError> {
        if let Err(err) = self.decoder.load(&mut self.surface, file_name, &bytes) {
            let err = SessionError::from(err);
            log::warn!("{file_name}: {err}");
            self.notice = Some(FailureNotice::from(&err));
            return Err(err);
        }

        self.teardown();
        self.notice = None;
        self.generation += 1;

        let session = ProcessingSession::new(self.generation);
        self.outbox
            .push(session.connection.start_upload(file_name, bytes));
        self.session = Some(session);
        self.subscribe();
        self.transition(SessionState::Uploading);
        Ok(())
    }

    /// The user clicked the rendered source image.
    ///
    /// Returns the sampled color, or `None` if there is no image or
    /// session, or the click fell outside the image. Those clicks change
    /// nothing: a color sampled without a session would be dropped by
    /// the next file selection.
    pub fn click(&mut self, position: PointerPosition, bounds: RenderedBounds) -> Option<SeedColor> {
        let image = self.decoder.current()?;
        if self.subscriptions.is_none() {
            log::debug!("click ignored with no session");
            return None;
        }
        match self.sampler.sample_at(image.pixels(), position, bounds) {
            Ok(color) => {
                self.pump();
                Some(color)
            }
            Err(miss) => {
                log::debug!("{miss}");
                None
            }
        }
    }

    pub fn set_tolerance(&mut self, value: i64) {
        self.params.set_tolerance(value);
        self.pump();
    }

    pub fn set_blur_radius(&mut self, value: f64) {
        self.params.set_blur_radius(value);
        self.pump();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.params.set_mode(mode);
        self.pump();
    }

    pub fn set_refine_edges(&mut self, refine: bool) {
        self.params.set_refine_edges(refine);
        self.pump();
    }

    /// Forget the current failure notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ----------------------------------------------------------------
    // I/O completions
    // ----------------------------------------------------------------

    /// The upload for `generation` finished.
    pub fn upload_finished(&mut self, generation: u64, outcome: Result<(), UploadError>) {
        if !self.is_current(generation, "upload completion") {
            return;
        }
        match outcome {
            Ok(()) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                session.connection.upload_acknowledged();
                if let Some(command) = session.connection.open() {
                    self.outbox.push(command);
                }
                self.transition(SessionState::Connecting);
            }
            Err(err) => self.abandon_session(err.into()),
        }
    }

    /// The channel for `generation` completed its handshake.
    pub fn channel_opened(&mut self, generation: u64) {
        if !self.is_current(generation, "channel open") {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.connection.opened();
        if session.connection.state() != ConnectionState::Open {
            return;
        }
        log::info!("session {generation} ready for requests");
        self.transition(SessionState::AwaitingColor);

        // A color picked during the upload goes out now.
        if self.params.snapshot().color.is_some() {
            self.dispatch();
        }
    }

    /// The channel for `generation` reported an error.
    ///
    /// During the handshake this abandons the session. After the channel
    /// was open it moves to [`SessionState::Unavailable`].
    pub fn channel_failed(&mut self, generation: u64, error: ConnectionError) {
        if !self.is_current(generation, "channel error") {
            return;
        }
        let Some(state) = self.session.as_ref().map(ProcessingSession::connection_state) else {
            return;
        };
        match state {
            ConnectionState::Connecting => self.abandon_session(error.into()),
            ConnectionState::Open => self.become_unavailable(error),
            ConnectionState::Closed | ConnectionState::Errored => {
                log::debug!("channel error after close: {error}");
            }
        }
    }

    /// The peer closed the channel for `generation`.
    pub fn channel_closed(&mut self, generation: u64, code: u16, reason: String) {
        self.channel_failed(generation, ConnectionError::Closed { code, reason });
    }

    /// A binary payload arrived on the channel for `generation`.
    pub fn result_received(&mut self, generation: u64, payload: &[u8]) {
        if !self.is_current(generation, "result") {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.connection.deliver(payload);
        }
        self.pump();
    }

    /// Drain the commands the driver must execute, in issue order.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    // ----------------------------------------------------------------
    // Read access
    // ----------------------------------------------------------------

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn session(&self) -> Option<&ProcessingSession> {
        self.session.as_ref()
    }

    /// The displayed source image.
    #[must_use]
    pub const fn image(&self) -> Option<&ImageAsset<S::Handle>> {
        self.decoder.current()
    }

    #[must_use]
    pub const fn parameters(&self) -> ProcessingParameters {
        self.params.snapshot()
    }

    #[must_use]
    pub const fn seed_color(&self) -> Option<SeedColor> {
        self.sampler.current()
    }

    /// The displayed result handle.
    #[must_use]
    pub fn result(&self) -> Option<&S::Handle> {
        self.results.handle()
    }

    /// Encoded bytes of the displayed result.
    #[must_use]
    pub fn result_bytes(&self) -> Option<&[u8]> {
        self.results.bytes()
    }

    /// Suggested file name for saving the displayed result.
    #[must_use]
    pub fn result_file_name(&self) -> Option<String> {
        self.results.handle()?;
        let stem = self.decoder.current().map_or("result", ImageAsset::file_stem);
        Some(format!("{stem}-no-bg.png"))
    }

    /// Whether a request is awaiting its result.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(ProcessingSession::pending_response)
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&FailureNotice> {
        self.notice.as_ref()
    }

    /// Generation of the newest session (0 before the first file).
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    // ----------------------------------------------------------------
    // Internals
    // ----------------------------------------------------------------

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::debug!("session state {:?} -> {next:?}", self.state);
            self.state = next;
        }
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        let current = self
            .session
            .as_ref()
            .is_some_and(|s| s.generation() == generation);
        if !current {
            log::warn!(
                "ignoring stale {what} for session {generation} (current {})",
                self.generation
            );
        }
        current
    }

    fn subscribe(&mut self) {
        let inbox = Rc::clone(&self.inbox);
        let sampler = self.sampler.subscribe(move |color| {
            inbox
                .borrow_mut()
                .push_back(SessionEvent::SeedColor(*color));
        });

        let inbox = Rc::clone(&self.inbox);
        let params = self.params.subscribe(move |change| {
            inbox
                .borrow_mut()
                .push_back(SessionEvent::Parameter(*change));
        });

        let results = self.session.as_mut().map(|session| {
            let inbox = Rc::clone(&self.inbox);
            session.connection.on_result(move |payload| {
                inbox
                    .borrow_mut()
                    .push_back(SessionEvent::Result(payload.to_vec()));
            })
        });

        self.subscriptions = Some(Subscriptions {
            sampler,
            params,
            results,
        });
    }

    /// Close the session and release everything it displayed.
    fn teardown(&mut self) {
        let results = self.subscriptions.take().and_then(|subs| {
            self.sampler.unsubscribe(subs.sampler);
            self.params.unsubscribe(subs.params);
            subs.results
        });
        if let Some(mut session) = self.session.take() {
            if let Some(id) = results {
                session.connection.remove_result_listener(id);
            }
            if let Some(command) = session.connection.close() {
                self.outbox.push(command);
            }
            log::info!(
                "closed session {} after {} requests, {} results",
                session.generation(),
                session.requests_sent,
                session.results_received
            );
        }
        self.results.clear(&mut self.surface);
        self.params.clear_color();
        self.sampler.reset();
        self.inbox.borrow_mut().clear();
    }

    /// Drop a session that never became usable, keeping the image.
    fn abandon_session(&mut self, err: SessionError) {
        log::warn!("session {} abandoned: {err}", self.generation);
        self.teardown();
        self.notice = Some(FailureNotice::from(&err));
        self.transition(SessionState::ImageLoaded);
    }

    fn become_unavailable(&mut self, error: ConnectionError) {
        if let Some(session) = self.session.as_mut() {
            session.connection.fail(&error);
            session.pending_response = false;
        }
        self.notice = Some(FailureNotice::from(&SessionError::from(error)));
        self.transition(SessionState::Unavailable);
    }

    fn next_event(&self) -> Option<SessionEvent> {
        self.inbox.borrow_mut().pop_front()
    }

    fn pump(&mut self) {
        while let Some(event) = self.next_event() {
            match event {
                SessionEvent::SeedColor(color) => {
                    self.params.set_color(color);
                }
                SessionEvent::Parameter(ParameterChange::Color(None)) => {}
                SessionEvent::Parameter(change) => {
                    if self.state.dispatches() {
                        self.dispatch();
                    } else {
                        log::debug!("{change:?} not sent in state {:?}", self.state);
                    }
                }
                SessionEvent::Result(payload) => self.present(payload),
            }
        }
    }

    /// Send the current snapshot.
    fn dispatch(&mut self) {
        let Some(request) = ProcessingRequest::from_parameters(&self.params.snapshot()) else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.connection.send(&request) {
            Ok(command) => {
                session.pending_response = true;
                session.requests_sent += 1;
                log::debug!(
                    "request #{} in session {}",
                    session.requests_sent,
                    session.generation()
                );
                self.outbox.push(command);
                self.transition(SessionState::Processing);
            }
            Err(err) => self.become_unavailable(err),
        }
    }

    fn present(&mut self, payload: Vec<u8>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.results_received += 1;
        session.pending_response = false;
        log::debug!(
            "result #{} in session {} ({} requests sent)",
            session.results_received,
            session.generation(),
            session.requests_sent
        );
        // A frame before any request leaves the user still picking a color.
        let requested = session.requests_sent > 0;

        if let Err(err) = self.results.present(&mut self.surface, payload) {
            log::warn!("{err}");
            self.notice = Some(FailureNotice::from(&SessionError::from(err)));
        }
        if self.state == SessionState::Processing
            || (self.state == SessionState::AwaitingColor && requested)
        {
            self.transition(SessionState::Ready);
        }
    }
}

impl<S: DisplaySurface> Drop for SessionOrchestrator<S> {
    fn drop(&mut self) {
        self.teardown();
        if let Some(asset) = self.decoder.take() {
            self.surface.release(asset.into_display());
        }
    }
}

impl<S: DisplaySurface> fmt::Debug for SessionOrchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("session", &self.session)
            .field("parameters", &self.params.snapshot())
            .field("pending_commands", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

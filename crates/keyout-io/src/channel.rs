//! The WebSocket processing channel.
//!
//! [`ProcessingChannel`] wraps a `web_sys::WebSocket` in `arraybuffer`
//! mode and reports everything that happens on it through one
//! [`ChannelEvent`] callback. The JS handlers are owned by the channel
//! and detached when it is dropped, so no event fires afterwards.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use keyout_session::ConnectionError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Something happened on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The handshake completed.
    Opened,
    /// A binary frame arrived.
    Message(Vec<u8>),
    /// The socket reported an error.
    Failed(String),
    /// The peer (or the network) closed the socket.
    Closed { code: u16, reason: String },
}

type Listener = Rc<RefCell<dyn FnMut(ChannelEvent)>>;

/// An open or opening processing channel.
pub struct ProcessingChannel {
    socket: web_sys::WebSocket,
    closed_locally: Rc<Cell<bool>>,
    _onopen: Closure<dyn FnMut(web_sys::Event)>,
    _onmessage: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _onerror: Closure<dyn FnMut(web_sys::Event)>,
    _onclose: Closure<dyn FnMut(web_sys::CloseEvent)>,
}

impl ProcessingChannel {
    /// Start connecting to `url`. `on_event` receives every event until
    /// the channel is closed locally or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Handshake`] if the socket cannot be
    /// created (for example a malformed URL).
    pub fn connect(
        url: &str,
        on_event: impl FnMut(ChannelEvent) + 'static,
    ) -> Result<Self, ConnectionError> {
        let socket = web_sys::WebSocket::new(url)
            .map_err(|e| ConnectionError::Handshake(format!("{e:?}")))?;
        socket.set_binary_type(web_sys::BinaryType::Arraybuffer);

        let listener: Listener = Rc::new(RefCell::new(on_event));
        let closed_locally = Rc::new(Cell::new(false));

        let emit = {
            let listener = Rc::clone(&listener);
            let closed_locally = Rc::clone(&closed_locally);
            move |event: ChannelEvent| {
                if closed_locally.get() {
                    return;
                }
                // A listener re-entering its own channel is dropped.
                if let Ok(mut listener) = listener.try_borrow_mut() {
                    (*listener)(event);
                } else {
                    log::warn!("dropping re-entrant channel event {event:?}");
                }
            }
        };

        let onopen = {
            let emit = emit.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                emit(ChannelEvent::Opened);
            })
        };

        let onmessage = {
            let emit = emit.clone();
            Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
                match event.data().dyn_into::<js_sys::ArrayBuffer>() {
                    Ok(buffer) => emit(ChannelEvent::Message(js_sys::Uint8Array::new(&buffer).to_vec())),
                    Err(other) => log::debug!("ignoring non-binary frame {other:?}"),
                }
            })
        };

        let onerror = {
            let emit = emit.clone();
            Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                emit(ChannelEvent::Failed(format!("socket error ({})", event.type_())));
            })
        };

        let onclose = Closure::<dyn FnMut(web_sys::CloseEvent)>::new(
            move |event: web_sys::CloseEvent| {
                emit(ChannelEvent::Closed {
                    code: event.code(),
                    reason: event.reason(),
                });
            },
        );

        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        log::info!("connecting to {url}");
        Ok(Self {
            socket,
            closed_locally,
            _onopen: onopen,
            _onmessage: onmessage,
            _onerror: onerror,
            _onclose: onclose,
        })
    }

    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotOpen`] after a local close and
    /// [`ConnectionError::Send`] if the socket rejects the frame.
    pub fn send_text(&self, payload: &str) -> Result<(), ConnectionError> {
        if self.closed_locally.get() {
            return Err(ConnectionError::NotOpen);
        }
        self.socket
            .send_with_str(payload)
            .map_err(|e| ConnectionError::Send(format!("{e:?}")))
    }

    /// Close with a normal closure code. Idempotent; no further events
    /// are reported.
    pub fn close(&self) {
        if self.closed_locally.replace(true) {
            return;
        }
        if let Err(e) = self
            .socket
            .close_with_code_and_reason(NORMAL_CLOSURE, "session replaced")
        {
            log::warn!("closing processing channel failed: {e:?}");
        }
    }
}

impl Drop for ProcessingChannel {
    fn drop(&mut self) {
        self.close();
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        self.socket.set_onclose(None);
    }
}

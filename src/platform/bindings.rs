//! JS surface for the render layer
//!
//! ```js
//! import init, { TarotChannel } from './pkg/tarot_link.js';
//!
//! await init();
//! const channel = new TarotChannel(JSON.stringify({ max_retries: 5 }));
//! channel.onMessage((msg) => {
//!     if (msg.type === 'interpretation_chunk') appendText(msg.text);
//! });
//! channel.startSession('What should I focus on this month?'); // queued
//! channel.connect();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::web::{WebChannel, init_logging};
use crate::channel::{ChannelObserver, CloseInfo};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::settings::ChannelConfig;

#[wasm_bindgen(start)]
pub fn start() {
    init_logging();
}

/// JSON-serializable value as a plain JS object
fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::NULL)
}

#[derive(Serialize)]
struct JsCloseInfo<'a> {
    code: u16,
    reason: &'a str,
    caller_initiated: bool,
    will_retry: bool,
}

/// Observer that forwards to JS functions registered after construction
#[derive(Default)]
struct JsObserver {
    on_open: RefCell<Option<Function>>,
    on_close: RefCell<Option<Function>>,
    on_error: RefCell<Option<Function>>,
    on_message: RefCell<Option<Function>>,
    on_give_up: RefCell<Option<Function>>,
}

fn invoke(slot: &RefCell<Option<Function>>, arg: Option<JsValue>) {
    // Clone out so the callback may replace itself
    let Some(f) = slot.borrow().clone() else { return };
    let result = match arg {
        Some(arg) => f.call1(&JsValue::NULL, &arg),
        None => f.call0(&JsValue::NULL),
    };
    if let Err(e) = result {
        log::error!("Channel callback threw: {:?}", e);
    }
}

impl ChannelObserver for JsObserver {
    fn on_open(&self) {
        invoke(&self.on_open, None);
    }

    fn on_close(&self, info: &CloseInfo) {
        let info = JsCloseInfo {
            code: info.code,
            reason: &info.reason,
            caller_initiated: info.caller_initiated,
            will_retry: info.will_retry,
        };
        invoke(&self.on_close, Some(to_js(&info)));
    }

    fn on_error(&self, message: &str) {
        invoke(&self.on_error, Some(JsValue::from_str(message)));
    }

    fn on_message(&self, message: ServerMessage) {
        invoke(&self.on_message, Some(to_js(&message)));
    }

    fn on_give_up(&self, attempts: u32) {
        invoke(&self.on_give_up, Some(JsValue::from(attempts)));
    }
}

/// Reconnecting channel to the reading server
#[wasm_bindgen]
pub struct TarotChannel {
    channel: WebChannel,
    observer: Rc<JsObserver>,
}

#[wasm_bindgen]
impl TarotChannel {
    /// `config_json` overrides individual `ChannelConfig` fields; when omitted
    /// the stored config (or the defaults) is used.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<TarotChannel, JsValue> {
        init_logging();

        let config = match config_json {
            Some(json) => ChannelConfig::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid channel config: {}", e)))?,
            None => ChannelConfig::load(),
        };

        let observer = Rc::new(JsObserver::default());
        let channel = WebChannel::new(config, observer.clone());
        Ok(TarotChannel { channel, observer })
    }

    pub fn connect(&self) {
        self.channel.connect();
    }

    pub fn disconnect(&self) {
        self.channel.disconnect();
    }

    /// Send a message given as JSON (`{"type": "...", ...}`).
    /// Returns `true` only if it was transmitted immediately.
    pub fn send(&self, message_json: &str) -> bool {
        match serde_json::from_str::<ClientMessage>(message_json) {
            Ok(message) => self.channel.send(message).sent(),
            Err(e) => {
                log::error!("[WS] Rejected outbound message: {}", e);
                false
            }
        }
    }

    #[wasm_bindgen(js_name = startSession)]
    pub fn start_session(&self, query: String) -> bool {
        self.channel.start_session(query).sent()
    }

    #[wasm_bindgen(js_name = selectCard)]
    pub fn select_card(&self, card_index: u32) -> bool {
        self.channel.select_card(card_index).sent()
    }

    #[wasm_bindgen(js_name = requestInterpretation)]
    pub fn request_interpretation(&self) -> bool {
        self.channel.request_interpretation().sent()
    }

    pub fn shuffle(&self) -> bool {
        self.channel.shuffle().sent()
    }

    pub fn ping(&self) -> bool {
        self.channel.ping().sent()
    }

    #[wasm_bindgen(getter, js_name = isConnected)]
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Numbered like `WebSocket.readyState`
    #[wasm_bindgen(getter, js_name = readyState)]
    pub fn ready_state(&self) -> u16 {
        self.channel.ready_state().as_u16()
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.channel.phase().as_str().to_string()
    }

    /// Persist this channel's config so later `new TarotChannel()` calls pick it up
    #[wasm_bindgen(js_name = saveConfig)]
    pub fn save_config(&self) -> bool {
        self.channel.config().save()
    }

    #[wasm_bindgen(js_name = onOpen)]
    pub fn set_on_open(&self, callback: Option<Function>) {
        *self.observer.on_open.borrow_mut() = callback;
    }

    #[wasm_bindgen(js_name = onClose)]
    pub fn set_on_close(&self, callback: Option<Function>) {
        *self.observer.on_close.borrow_mut() = callback;
    }

    #[wasm_bindgen(js_name = onError)]
    pub fn set_on_error(&self, callback: Option<Function>) {
        *self.observer.on_error.borrow_mut() = callback;
    }

    #[wasm_bindgen(js_name = onMessage)]
    pub fn set_on_message(&self, callback: Option<Function>) {
        *self.observer.on_message.borrow_mut() = callback;
    }

    /// Called with the attempt count once reconnection is abandoned
    #[wasm_bindgen(js_name = onGiveUp)]
    pub fn set_on_give_up(&self, callback: Option<Function>) {
        *self.observer.on_give_up.borrow_mut() = callback;
    }
}

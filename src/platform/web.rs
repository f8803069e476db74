//! Browser host for the channel
//!
//! `WebSocketTransport` and `BrowserScheduler` implement the channel seams on
//! top of `web_sys::WebSocket` and the global `setTimeout`/`setInterval`. Their JS
//! callbacks feed events back into a shared [`WebChannel`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Once;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::channel::{
    Channel, ChannelObserver, ConnectionId, Phase, ReadyState, Scheduler, SendOutcome, TimerId,
    Transport, TransportError, TransportEvent,
};
use crate::consts::{NORMAL_CLOSE_CODE, NORMAL_CLOSE_REASON};
use crate::context::Disconnect;
use crate::protocol::ClientMessage;
use crate::settings::ChannelConfig;

type EventSink = Rc<dyn Fn(ConnectionId, TransportEvent)>;
type TimerSink = Rc<dyn Fn(TimerId)>;

/// Install the console logger and panic hook (safe to call more than once)
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger already installed: {}", e).into());
        }
    });
}

fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Browser WebSocket transport
pub struct WebSocketTransport {
    sink: EventSink,
    sockets: HashMap<ConnectionId, WebSocket>,
}

impl WebSocketTransport {
    fn new(sink: EventSink) -> Self {
        Self {
            sink,
            sockets: HashMap::new(),
        }
    }

    fn attach_handlers(&self, ws: &WebSocket, conn: ConnectionId) {
        {
            let sink = self.sink.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
                sink(conn, TransportEvent::Open);
            });
            ws.set_onopen(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let sink = self.sink.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: CloseEvent| {
                sink(
                    conn,
                    TransportEvent::Close {
                        code: event.code(),
                        reason: event.reason(),
                    },
                );
            });
            ws.set_onclose(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        // Browsers report WebSocket errors as a plain Event with no detail
        {
            let sink = self.sink.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
                sink(
                    conn,
                    TransportEvent::Error {
                        message: format!("WebSocket {} event", event.type_()),
                    },
                );
            });
            ws.set_onerror(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let sink = self.sink.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
                match event.data().as_string() {
                    Some(text) => sink(conn, TransportEvent::Frame(text)),
                    None => log::warn!("[WS] Ignoring non-text frame"),
                }
            });
            ws.set_onmessage(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, conn: ConnectionId, url: &str) -> Result<(), TransportError> {
        self.sockets
            .retain(|_, ws| ws.ready_state() != WebSocket::CLOSED);

        let ws = WebSocket::new(url).map_err(|e| TransportError::Dial(js_error(&e)))?;
        self.attach_handlers(&ws, conn);
        self.sockets.insert(conn, ws);
        Ok(())
    }

    fn send(&mut self, conn: ConnectionId, frame: &str) -> Result<(), TransportError> {
        let ws = self.sockets.get(&conn).ok_or(TransportError::NotOpen)?;
        if ws.ready_state() != WebSocket::OPEN {
            return Err(TransportError::NotOpen);
        }
        ws.send_with_str(frame)
            .map_err(|e| TransportError::Send(js_error(&e)))
    }

    fn close(&mut self, conn: ConnectionId, code: u16, reason: &str) {
        if let Some(ws) = self.sockets.get(&conn) {
            if let Err(e) = ws.close_with_code_and_reason(code, reason) {
                log::warn!("[WS] Close failed: {}", js_error(&e));
            }
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        for (_, ws) in self.sockets.drain() {
            ws.set_onopen(None);
            ws.set_onclose(None);
            ws.set_onerror(None);
            ws.set_onmessage(None);
            let state = ws.ready_state();
            if state == WebSocket::CONNECTING || state == WebSocket::OPEN {
                let _ = ws.close_with_code_and_reason(NORMAL_CLOSE_CODE, NORMAL_CLOSE_REASON);
            }
        }
    }
}

// Bound on the global scope so timers also run where there is no `window`
// (workers, Node.js)
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn global_set_timeout(callback: &js_sys::Function, delay: i32) -> i32;

    #[wasm_bindgen(js_name = "setInterval")]
    fn global_set_interval(callback: &js_sys::Function, delay: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn global_clear_timeout(handle: i32);

    #[wasm_bindgen(js_name = "clearInterval")]
    fn global_clear_interval(handle: i32);
}

/// `setTimeout`/`setInterval` scheduler
pub struct BrowserScheduler {
    sink: TimerSink,
    timeouts: HashMap<TimerId, i32>,
    intervals: HashMap<TimerId, (i32, Closure<dyn FnMut()>)>,
}

impl BrowserScheduler {
    fn new(sink: TimerSink) -> Self {
        Self {
            sink,
            timeouts: HashMap::new(),
            intervals: HashMap::new(),
        }
    }
}

fn clamp_ms(ms: u64) -> i32 {
    ms.min(i32::MAX as u64) as i32
}

impl Scheduler for BrowserScheduler {
    fn set_timeout(&mut self, timer: TimerId, delay_ms: u64) {
        let sink = self.sink.clone();
        let callback = Closure::once_into_js(move || sink(timer));
        let handle = global_set_timeout(callback.unchecked_ref(), clamp_ms(delay_ms));
        self.timeouts.insert(timer, handle);
    }

    fn set_interval(&mut self, timer: TimerId, period_ms: u64) {
        let sink = self.sink.clone();
        let closure = Closure::<dyn FnMut()>::new(move || sink(timer));
        let handle = global_set_interval(closure.as_ref().unchecked_ref(), clamp_ms(period_ms));
        self.intervals.insert(timer, (handle, closure));
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(handle) = self.timeouts.remove(&timer) {
            global_clear_timeout(handle);
        }
        if let Some((handle, _closure)) = self.intervals.remove(&timer) {
            global_clear_interval(handle);
        }
    }

    fn expired(&mut self, timer: TimerId) {
        self.timeouts.remove(&timer);
    }
}

impl Drop for BrowserScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timeouts.drain() {
            global_clear_timeout(handle);
        }
        for (_, (handle, _closure)) in self.intervals.drain() {
            global_clear_interval(handle);
        }
    }
}

type WebInner = Channel<WebSocketTransport, BrowserScheduler>;

/// Run `f` against the channel, then hand queued notifications to the observer
/// after the borrow is released so callbacks may call back into the channel.
fn pump<R>(
    inner: &RefCell<WebInner>,
    observer: &dyn ChannelObserver,
    f: impl FnOnce(&mut WebInner) -> R,
) -> R {
    let (result, events) = {
        let mut channel = inner.borrow_mut();
        let result = f(&mut channel);
        (result, channel.drain_events())
    };
    for event in events {
        observer.dispatch(event);
    }
    result
}

/// Channel bound to the browser; cheap to clone, all clones share one channel
#[derive(Clone)]
pub struct WebChannel {
    inner: Rc<RefCell<WebInner>>,
    observer: Rc<dyn ChannelObserver>,
}

impl WebChannel {
    pub fn new(config: ChannelConfig, observer: Rc<dyn ChannelObserver>) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<WebInner>>| {
            let event_sink: EventSink = {
                let weak = weak.clone();
                let observer = observer.clone();
                Rc::new(move |conn, event| {
                    if let Some(inner) = weak.upgrade() {
                        pump(&inner, observer.as_ref(), |ch| ch.handle_event(conn, event));
                    }
                })
            };
            let timer_sink: TimerSink = {
                let weak = weak.clone();
                let observer = observer.clone();
                Rc::new(move |timer| {
                    if let Some(inner) = weak.upgrade() {
                        pump(&inner, observer.as_ref(), |ch| ch.handle_timer(timer));
                    }
                })
            };

            RefCell::new(Channel::new(
                config,
                WebSocketTransport::new(event_sink),
                BrowserScheduler::new(timer_sink),
            ))
        });

        Self { inner, observer }
    }

    fn with<R>(&self, f: impl FnOnce(&mut WebInner) -> R) -> R {
        pump(&self.inner, self.observer.as_ref(), f)
    }

    pub fn connect(&self) {
        self.with(|ch| ch.connect());
    }

    pub fn disconnect(&self) {
        self.with(|ch| ch.disconnect());
    }

    pub fn send(&self, message: ClientMessage) -> SendOutcome {
        self.with(|ch| ch.send(message))
    }

    pub fn start_session(&self, query: impl Into<String>) -> SendOutcome {
        let query = query.into();
        self.with(|ch| ch.start_session(query))
    }

    pub fn select_card(&self, card_index: u32) -> SendOutcome {
        self.with(|ch| ch.select_card(card_index))
    }

    pub fn request_interpretation(&self) -> SendOutcome {
        self.with(|ch| ch.request_interpretation())
    }

    pub fn shuffle(&self) -> SendOutcome {
        self.with(|ch| ch.shuffle())
    }

    pub fn ping(&self) -> SendOutcome {
        self.with(|ch| ch.ping())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.borrow().is_connected()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner.borrow().ready_state()
    }

    pub fn phase(&self) -> Phase {
        self.inner.borrow().phase()
    }

    pub fn config(&self) -> ChannelConfig {
        self.inner.borrow().config().clone()
    }
}

impl Disconnect for WebChannel {
    fn disconnect(&mut self) {
        WebChannel::disconnect(self);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    use super::*;

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            global_set_timeout(&resolve, ms);
        });
        let _ = JsFuture::from(promise).await;
    }

    fn counting_scheduler() -> (BrowserScheduler, Rc<Cell<u32>>) {
        let fired = Rc::new(Cell::new(0));
        let sink: TimerSink = {
            let fired = fired.clone();
            Rc::new(move |_timer| fired.set(fired.get() + 1))
        };
        (BrowserScheduler::new(sink), fired)
    }

    #[wasm_bindgen_test]
    async fn test_timeout_fires_through_global_scope() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.set_timeout(TimerId(1), 5);
        sleep(40).await;
        assert_eq!(fired.get(), 1);
    }

    #[wasm_bindgen_test]
    async fn test_interval_repeats_until_cancelled() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.set_interval(TimerId(1), 5);
        sleep(60).await;
        scheduler.cancel(TimerId(1));
        let count = fired.get();
        assert!(count >= 2);

        sleep(40).await;
        assert_eq!(fired.get(), count);
    }

    #[wasm_bindgen_test]
    async fn test_drop_clears_pending_timers() {
        let (mut scheduler, fired) = counting_scheduler();
        scheduler.set_timeout(TimerId(1), 5);
        scheduler.set_interval(TimerId(2), 5);
        drop(scheduler);

        sleep(40).await;
        assert_eq!(fired.get(), 0);
    }
}

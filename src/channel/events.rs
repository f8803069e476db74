//! Channel notifications and the observer interface
//!
//! The channel queues [`ChannelEvent`]s while it handles an input; the owner
//! drains them afterwards and hands them to a [`ChannelObserver`]. Keeping
//! dispatch outside the state machine lets observers call back into the
//! channel (e.g. `send` from `on_open`).

use std::fmt;
use std::rc::Rc;

use crate::protocol::ServerMessage;

/// Details of a closed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// WebSocket close code (1000 = normal, 1006 = abnormal)
    pub code: u16,
    pub reason: String,
    /// The close followed a `disconnect()` call
    pub caller_initiated: bool,
    /// A reconnect attempt has been scheduled
    pub will_retry: bool,
}

impl fmt::Display for CloseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "code {}", self.code)
        } else {
            write!(f, "code {}, reason: {}", self.code, self.reason)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Closed(CloseInfo),
    Error { message: String },
    Message(ServerMessage),
    /// Retry ceiling reached; no further attempts until `connect()`
    GaveUp { attempts: u32 },
}

/// Receives channel lifecycle callbacks. Every method defaults to a no-op.
pub trait ChannelObserver {
    fn on_open(&self) {}

    fn on_close(&self, _info: &CloseInfo) {}

    fn on_error(&self, _message: &str) {}

    fn on_message(&self, _message: ServerMessage) {}

    fn on_give_up(&self, _attempts: u32) {}

    /// Route one event to the matching callback
    fn dispatch(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened => self.on_open(),
            ChannelEvent::Closed(info) => self.on_close(&info),
            ChannelEvent::Error { message } => self.on_error(&message),
            ChannelEvent::Message(message) => self.on_message(message),
            ChannelEvent::GaveUp { attempts } => self.on_give_up(attempts),
        }
    }
}

/// Observer that ignores everything
impl ChannelObserver for () {}

pub type OnOpenCallback = Rc<dyn Fn()>;
pub type OnCloseCallback = Rc<dyn Fn(&CloseInfo)>;
pub type OnErrorCallback = Rc<dyn Fn(&str)>;
pub type OnMessageCallback = Rc<dyn Fn(ServerMessage)>;
pub type OnGiveUpCallback = Rc<dyn Fn(u32)>;

/// Closure-based observer; register only the callbacks you need
///
/// ```rust
/// use tarot_link::EventHandlers;
///
/// let handlers = EventHandlers::new()
///     .on_open(|| println!("connected"))
///     .on_message(|msg| println!("got {}", msg.kind()));
/// ```
#[derive(Clone, Default)]
pub struct EventHandlers {
    on_open: Option<OnOpenCallback>,
    on_close: Option<OnCloseCallback>,
    on_error: Option<OnErrorCallback>,
    on_message: Option<OnMessageCallback>,
    on_give_up: Option<OnGiveUpCallback>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_give_up", &self.on_give_up.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, f: impl Fn() + 'static) -> Self {
        self.on_open = Some(Rc::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn(&CloseInfo) + 'static) -> Self {
        self.on_close = Some(Rc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }

    pub fn on_message(mut self, f: impl Fn(ServerMessage) + 'static) -> Self {
        self.on_message = Some(Rc::new(f));
        self
    }

    /// Called once when the retry ceiling is reached
    pub fn on_give_up(mut self, f: impl Fn(u32) + 'static) -> Self {
        self.on_give_up = Some(Rc::new(f));
        self
    }
}

impl ChannelObserver for EventHandlers {
    fn on_open(&self) {
        if let Some(cb) = &self.on_open {
            cb();
        }
    }

    fn on_close(&self, info: &CloseInfo) {
        if let Some(cb) = &self.on_close {
            cb(info);
        }
    }

    fn on_error(&self, message: &str) {
        if let Some(cb) = &self.on_error {
            cb(message);
        }
    }

    fn on_message(&self, message: ServerMessage) {
        if let Some(cb) = &self.on_message {
            cb(message);
        }
    }

    fn on_give_up(&self, attempts: u32) {
        if let Some(cb) = &self.on_give_up {
            cb(attempts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_handlers_route_events() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handlers = {
            let (a, b, c, d, e) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
            EventHandlers::new()
                .on_open(move || a.borrow_mut().push("open".to_string()))
                .on_close(move |info| b.borrow_mut().push(format!("close {}", info.code)))
                .on_error(move |msg| c.borrow_mut().push(format!("error {}", msg)))
                .on_message(move |msg| d.borrow_mut().push(msg.kind().to_string()))
                .on_give_up(move |n| e.borrow_mut().push(format!("gave up {}", n)))
        };

        handlers.dispatch(ChannelEvent::Opened);
        handlers.dispatch(ChannelEvent::Message(ServerMessage::InterpretationComplete));
        handlers.dispatch(ChannelEvent::Error {
            message: "boom".to_string(),
        });
        handlers.dispatch(ChannelEvent::Closed(CloseInfo {
            code: 1006,
            reason: String::new(),
            caller_initiated: false,
            will_retry: true,
        }));
        handlers.dispatch(ChannelEvent::GaveUp { attempts: 3 });

        assert_eq!(
            *log.borrow(),
            vec![
                "open",
                "interpretation_complete",
                "error boom",
                "close 1006",
                "gave up 3"
            ]
        );
    }

    #[test]
    fn test_missing_handlers_are_noops() {
        let handlers = EventHandlers::new();
        handlers.dispatch(ChannelEvent::Opened);
        handlers.dispatch(ChannelEvent::GaveUp { attempts: 1 });
        assert!(format!("{:?}", handlers).contains("on_open: false"));
    }

    #[test]
    fn test_close_info_display() {
        let info = CloseInfo {
            code: 1000,
            reason: "Client disconnected".to_string(),
            caller_initiated: true,
            will_retry: false,
        };
        assert_eq!(info.to_string(), "code 1000, reason: Client disconnected");
    }
}

//! Application-owned default channel
//!
//! Holds the one channel the UI event loop talks to. The owner passes the
//! context around explicitly; there is no global instance.

use crate::channel::{Channel, Scheduler, Transport};
use crate::settings::ChannelConfig;

/// Teardown hook used when a context swaps channels
pub trait Disconnect {
    fn disconnect(&mut self);
}

impl<T: Transport, S: Scheduler> Disconnect for Channel<T, S> {
    fn disconnect(&mut self) {
        Channel::disconnect(self);
    }
}

type Factory<C> = Box<dyn FnMut(ChannelConfig) -> C>;

/// Lazily-built default channel
pub struct ChannelContext<C: Disconnect> {
    config: ChannelConfig,
    factory: Factory<C>,
    current: Option<C>,
}

impl<C: Disconnect> ChannelContext<C> {
    /// `factory` builds a channel from a config when one is first needed
    pub fn new(config: ChannelConfig, factory: impl FnMut(ChannelConfig) -> C + 'static) -> Self {
        Self {
            config,
            factory: Box::new(factory),
            current: None,
        }
    }

    /// The default channel, created from the current config on first use
    pub fn channel(&mut self) -> &mut C {
        let Self {
            config,
            factory,
            current,
        } = self;
        current.get_or_insert_with(|| factory(config.clone()))
    }

    /// Tear down the current channel (if any) and build a new one from `config`
    pub fn replace(&mut self, config: ChannelConfig) -> &mut C {
        if let Some(mut old) = self.current.take() {
            log::info!("Replacing channel (new endpoint {})", config.url);
            old.disconnect();
        }
        self.config = config;
        self.channel()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Phase, SendOutcome};
    use crate::sim::{self, CloseRequest, SimChannel, SimTransport, VirtualScheduler};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Shared<T> = Rc<RefCell<T>>;

    fn context() -> ChannelContext<SimChannel> {
        let config = ChannelConfig::new("ws://a.test/ws").with_jitter_seed(1);
        ChannelContext::new(config, sim::sim_channel)
    }

    #[test]
    fn test_channel_created_once() {
        let mut ctx = context();
        assert!(!ctx.is_initialized());

        ctx.channel().connect();
        assert!(ctx.is_initialized());
        // Same instance: still connecting, second connect is a no-op
        ctx.channel().connect();
        assert_eq!(ctx.channel().transport().dials.len(), 1);
    }

    #[test]
    fn test_replace_tears_down_old_channel() {
        let transports: Rc<RefCell<Vec<Shared<SimTransport>>>> = Rc::default();
        let mut ctx = {
            let transports = transports.clone();
            ChannelContext::new(
                ChannelConfig::new("ws://a.test/ws").with_jitter_seed(1),
                move |config| {
                    let transport = Rc::new(RefCell::new(SimTransport::new()));
                    transports.borrow_mut().push(transport.clone());
                    Channel::new(config, transport, VirtualScheduler::new())
                },
            )
        };

        ctx.channel().connect();
        let old_conn = transports.borrow()[0].borrow().last_conn().unwrap();
        ctx.channel().handle_open(old_conn);
        assert!(ctx.channel().is_connected());

        let fresh = ctx.replace(ChannelConfig::new("ws://b.test/ws").with_jitter_seed(2));
        assert_eq!(fresh.phase(), Phase::Idle);
        assert_eq!(fresh.config().url, "ws://b.test/ws");
        assert_eq!(fresh.ping(), SendOutcome::Queued);
        assert_eq!(ctx.config().url, "ws://b.test/ws");

        let transports = transports.borrow();
        assert_eq!(transports.len(), 2);
        assert_eq!(
            transports[0].borrow().closes,
            vec![CloseRequest {
                conn: old_conn,
                code: 1000,
                reason: "Client disconnected".to_string(),
            }]
        );
        assert!(transports[1].borrow().dials.is_empty());
    }
}

//! Tarot Link dry run
//!
//! The browser build is a library (`TarotChannel`); this binary drives the
//! channel against the simulated transport to show the reconnect schedule.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use tarot_link::sim;
    use tarot_link::{ChannelConfig, EventHandlers};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ChannelConfig::default()
        .with_max_retries(3)
        .with_backoff(1000, 30_000);
    log::info!("Tarot Link (native) dry run against {}", config.url);

    let observer = EventHandlers::new()
        .on_open(|| log::info!("observer: open"))
        .on_close(|info| log::info!("observer: close ({})", info))
        .on_give_up(|attempts| log::warn!("observer: gave up after {} attempts", attempts));

    let mut channel = sim::sim_channel(config);

    // Queued before any connection exists
    channel.start_session("What does the week ahead hold?");
    channel.connect();

    // Every dial is refused: the server is down
    loop {
        sim::drop_latest(&mut channel);
        channel.dispatch_events(&observer);
        if sim::run_until_idle(&mut channel, 1) == 0 {
            break;
        }
    }
    let delays = channel.scheduler().timeout_delays();
    log::info!("Reconnect delays (ms): {:?}", delays);

    // Server back: an explicit connect starts over and flushes the queue
    channel.connect();
    sim::accept_latest(&mut channel);
    channel.dispatch_events(&observer);
    let sent: Vec<&str> = channel
        .transport()
        .sent_messages()
        .iter()
        .map(|m| m.kind())
        .collect();
    log::info!("Flushed on open: {:?}", sent);

    channel.disconnect();
    if let Some(conn) = channel.transport().last_conn() {
        channel.handle_close(conn, 1000, "Client disconnected");
    }
    channel.dispatch_events(&observer);

    log::info!("Dry run finished ({} reconnect attempts)", delays.len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::bindings::start, this is just to satisfy the compiler
}

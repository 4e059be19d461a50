//! Infrastructure layer for rigsync-client.
//!
//! Concrete I/O behind the application layer's seams:
//!
//! - **`http`** – [`HttpTransport`](http::HttpTransport), the reqwest
//!   implementation of `RestTransport`, including login.
//! - **`feed`** – WebSocket pumps turning each feed into an `mpsc` channel
//!   of text frames.
//! - **`config`** – [`ClientConfig`](config::ClientConfig), loaded from TOML.
//!
//! [`connect`] wires all three into a running [`Machine`].

pub mod config;
pub mod feed;
pub mod http;

use std::sync::Arc;

use rigsync_core::protocol::{APPLICATION_STATE_FEED_PATH, MACHINE_STATE_FEED_PATH};
use tokio::sync::mpsc;

use crate::application::{FeedReceivers, Machine, RigError};
use config::ClientConfig;
use feed::run_feed;
use http::HttpTransport;

/// Frames buffered per feed before the pump waits on its listener.
const FEED_CAPACITY: usize = 256;

/// Logs in, opens both feeds and resolves the machine.
///
/// # Errors
///
/// - [`RigError::Transport`] if login or a required document read fails.
/// - [`RigError::MalformedDocument`] if a required document does not decode.
pub async fn connect(config: &ClientConfig) -> Result<Machine, RigError> {
    let base_url = config.base_url();
    let transport = HttpTransport::connect(config).await?;

    let (machine_tx, machine_rx) = mpsc::channel(FEED_CAPACITY);
    let (applications_tx, applications_rx) = mpsc::channel(FEED_CAPACITY);
    let interval = config.reconnect_interval();
    let pumps = [
        tokio::spawn(run_feed(
            config.feed_url(MACHINE_STATE_FEED_PATH),
            machine_tx,
            interval,
        )),
        tokio::spawn(run_feed(
            config.feed_url(APPLICATION_STATE_FEED_PATH),
            applications_tx,
            interval,
        )),
    ];

    let feeds = FeedReceivers {
        machine: machine_rx,
        applications: applications_rx,
    };
    match Machine::assemble(Arc::new(transport), base_url, feeds).await {
        Ok(mut machine) => {
            for pump in pumps {
                machine.supervise(pump);
            }
            Ok(machine)
        }
        Err(e) => {
            for pump in &pumps {
                pump.abort();
            }
            Err(e)
        }
    }
}

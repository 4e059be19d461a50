//! WebSocket feed pumps.
//!
//! Each feed is one long-lived task that connects with
//! `tokio_tungstenite::connect_async`, forwards every text frame on an
//! `mpsc` channel, and reconnects after a fixed interval when the socket
//! closes or fails.  Binary, ping and pong frames are not forwarded.
//!
//! ```text
//! connect ─ok─► read loop ─text─► tx.send
//!    │              │ close / error
//!    │ err          ▼
//!    └──────► sleep(reconnect_interval) ─► connect
//! ```
//!
//! The pump returns once the receiving side of `tx` is dropped.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Pumps text frames from `url` into `tx` until `tx` is closed.
pub async fn run_feed(url: String, tx: mpsc::Sender<String>, reconnect_interval: Duration) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut socket, _response)) => {
                info!("feed connected: {url}");
                loop {
                    tokio::select! {
                        _ = tx.closed() => {
                            debug!("feed {url}: receiver dropped");
                            return;
                        }
                        frame = socket.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                if tx.send(text).await.is_err() {
                                    return;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                info!("feed {url} closed by the machine");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("feed {url} failed: {e}");
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => warn!("could not connect feed {url}: {e}"),
        }

        debug!("feed {url}: reconnecting in {reconnect_interval:?}");
        tokio::select! {
            _ = tx.closed() => return,
            _ = time::sleep(reconnect_interval) => {}
        }
    }
}

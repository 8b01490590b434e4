//! Comms — the user-facing channels.
//!
//! Each channel (console, HTTP) implements [`runtime::Component`] and is
//! spawned as an independent task by [`start`]. Channels capture the shared
//! `Arc<ChatService>` at construction; that is their only capability.

pub mod runtime;
#[cfg(feature = "channel-pty")]
pub mod pty;
#[cfg(feature = "channel-axum")]
pub mod axum_channel;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chat::ChatService;
use crate::config::Config;
use runtime::{ChannelsHandle, Component, spawn_components};

/// Spawn all configured channels and return a handle that resolves once
/// every channel has exited.
#[cfg_attr(
    not(any(feature = "channel-pty", feature = "channel-axum")),
    allow(unused_variables)
)]
pub fn start(config: &Config, chat: Arc<ChatService>, shutdown: CancellationToken) -> ChannelsHandle {
    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-pty")]
    {
        if config.comms.pty.enabled {
            info!("loading pty channel");
            components.push(Box::new(pty::PtyChannel::new("pty0", chat.clone())));
        }
    }

    #[cfg(feature = "channel-axum")]
    {
        if config.comms.http.enabled {
            info!(bind = %config.comms.http.bind, "loading axum channel");
            components.push(Box::new(axum_channel::AxumChannel::new(
                "http0",
                config.comms.http.bind.clone(),
                chat.clone(),
            )));
        }
    }

    if components.is_empty() {
        warn!("no comms channels enabled, nothing to do");
    }
    spawn_components(components, shutdown)
}

//! Delivery of formatted records to the target channel.
//!
//! Delivery is an ordered chain of routes tried one after another until
//! one succeeds.

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::actions::Target;
use crate::config::ChannelId;
use crate::telegram::{TelegramError, UserSession};

/// A way of reaching the target channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// Resolve the channel through the session, then send to the handle.
    Resolved,

    /// Send to the raw configured id without resolving it.
    Direct,
}

impl DeliveryRoute {
    /// Routes in the order they are attempted.
    pub const CHAIN: [Self; 2] = [Self::Resolved, Self::Direct];
}

impl fmt::Display for DeliveryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolved => "resolved",
            Self::Direct => "direct",
        })
    }
}

/// The configured target channel and the peer it last resolved to.
///
/// Resolution runs once; the cached peer is reused until a send through
/// it fails.
pub struct TargetChannel<P> {
    id: ChannelId,
    resolved: Mutex<Option<P>>,
}

impl<P: Clone> TargetChannel<P> {
    #[must_use]
    pub fn new(id: ChannelId) -> Self {
        Self {
            id,
            resolved: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    async fn cached(&self) -> Option<P> {
        self.resolved.lock().await.clone()
    }

    async fn remember(&self, peer: Option<P>) {
        *self.resolved.lock().await = peer;
    }
}

impl<P> fmt::Debug for TargetChannel<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetChannel")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Every route failed.
#[derive(Debug, Error)]
#[error("all delivery routes failed ({})", summarize(.failures))]
pub struct DeliveryError {
    pub failures: Vec<(DeliveryRoute, TelegramError)>,
}

fn summarize(failures: &[(DeliveryRoute, TelegramError)]) -> String {
    failures
        .iter()
        .map(|(route, err)| format!("{route}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tries `attempt` on each route in order and returns the first success.
///
/// On exhaustion returns every route paired with its error, in order.
pub async fn first_success<R, T, E, F, Fut>(
    routes: impl IntoIterator<Item = R>,
    mut attempt: F,
) -> Result<(R, T), Vec<(R, E)>>
where
    R: Copy,
    F: FnMut(R) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();

    for route in routes {
        match attempt(route).await {
            Ok(value) => return Ok((route, value)),
            Err(err) => failures.push((route, err)),
        }
    }

    Err(failures)
}

/// Sends `text` through the cached peer, resolving the channel again when
/// there is none or the cached one stopped working.
async fn send_resolved<S: UserSession>(
    session: &S,
    target: &TargetChannel<S::Peer>,
    text: &str,
) -> Result<(), TelegramError> {
    if let Some(peer) = target.cached().await {
        match session.send_text(&peer, text).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                debug!("Cached peer for {} failed, resolving again: {}", target.id, err);
                target.remember(None).await;
            }
        }
    }

    let peer = match session.resolve(&Target::NumericId(target.id.get())).await {
        Ok(peer) => peer,
        Err(err) => {
            debug!("Could not resolve target channel {}: {}", target.id, err);
            return Err(err);
        }
    };
    target.remember(Some(peer.clone())).await;
    session.send_text(&peer, text).await
}

/// Sends `text` to the target channel, falling back to the direct route.
///
/// # Errors
///
/// Returns [`DeliveryError`] with each route's failure if none worked.
pub async fn deliver<S: UserSession>(
    session: &S,
    target: &TargetChannel<S::Peer>,
    text: &str,
) -> Result<DeliveryRoute, DeliveryError> {
    let channel = target.id;
    let result = first_success(DeliveryRoute::CHAIN, |route| async move {
        match route {
            DeliveryRoute::Resolved => send_resolved(session, target, text).await,
            DeliveryRoute::Direct => session.send_to_id(channel.get(), text).await,
        }
    })
    .await;

    match result {
        Ok((route, ())) => {
            if route != DeliveryRoute::Resolved {
                warn!("Delivered to {} via the {} route", channel, route);
            }
            Ok(route)
        }
        Err(failures) => Err(DeliveryError { failures }),
    }
}

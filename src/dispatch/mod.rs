//! Id → handler registry. Parses nothing itself — callers hand it an
//! already-split `(id, body)` pair; this module owns decode → invoke →
//! catch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::admin::AdminService;
use crate::codec;
use crate::error::HandlerResult;
use crate::lobby::Lobby;
use crate::protocol::types::PlayerId;
use crate::scheduler::Scheduler;
use crate::transport::DatagramHub;

/// Which wire channel a message arrived on, handed to handlers so they can
/// answer on the matching channel (or deliberately pick the other one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Reliable,
    Datagram,
}

/// Everything a handler needs beyond its decoded body.
#[derive(Clone)]
pub struct HandlerContext {
    pub caller: PlayerId,
    pub channel: Channel,
    pub lobby: Arc<Lobby>,
    pub admin: Arc<AdminService>,
    pub scheduler: Arc<Scheduler>,
    pub datagram: Arc<DatagramHub>,
}

type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult<()>> + Send>>;

struct HandlerEntry {
    invoke: Box<dyn Fn(HandlerContext, &[u8]) -> HandlerFuture + Send + Sync>,
}

/// Concurrent id → handler map, populated once at startup by the handler
/// catalogue and never mutated after `run()` begins.
pub struct Dispatcher {
    handlers: DashMap<&'static str, HandlerEntry>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Register a handler for `id`, whose wire body decodes to `T`.
    pub fn register<T, F, Fut>(&self, id: &'static str, handler: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(HandlerContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<()>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let invoke = Box::new(move |ctx: HandlerContext, body: &[u8]| -> HandlerFuture {
            match codec::decode_body::<T>(body) {
                Ok(value) => {
                    let handler = Arc::clone(&handler);
                    Box::pin(async move { handler(ctx, value).await })
                }
                Err(err) => Box::pin(async move { Err(err.into()) }),
            }
        });
        self.handlers.insert(id, HandlerEntry { invoke });
    }

    /// Parse nothing, just look up `id`, decode, invoke, and log failures.
    /// Never closes the session itself — only `ProtocolViolation` failures
    /// are treated as session-ending by the transport layer that calls this.
    pub async fn dispatch(&self, id: &str, ctx: HandlerContext, body: &[u8]) -> Option<crate::error::ErrorKind> {
        let Some(entry) = self.handlers.get(id) else {
            warn!(%id, "no handler registered for message id");
            return Some(crate::error::ErrorKind::UnknownMessage);
        };
        let fut = (entry.invoke)(ctx, body);
        drop(entry);
        match fut.await {
            Ok(()) => None,
            Err(err) => {
                match err.error_kind() {
                    Some(kind) => {
                        warn!(%id, ?kind, "handler returned a known error");
                        Some(kind)
                    }
                    None => {
                        error!(%id, error = %err, "handler failed internally");
                        None
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioConfig, ServerConfig};
    use crate::error::ErrorKind;
    use crate::store::memory::MemoryStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Echo {
        value: u32,
    }

    async fn context() -> HandlerContext {
        let lobby = Lobby::new(ServerConfig::default(), AudioConfig::default());
        let datagram = DatagramHub::bind_ephemeral(Arc::clone(&lobby)).await.unwrap();
        HandlerContext {
            caller: PlayerId::new(),
            channel: Channel::Reliable,
            admin: Arc::new(AdminService::new(
                Arc::clone(&lobby),
                Arc::new(MemoryStore::new()),
                "bans".into(),
            )),
            scheduler: Scheduler::new(crate::config::SchedulerConfig::default()),
            lobby,
            datagram,
        }
    }

    #[tokio::test]
    async fn unknown_id_reports_unknown_message() {
        let dispatcher = Dispatcher::new();
        let result = dispatcher.dispatch("Nope", context().await, &[]).await;
        assert_eq!(result, Some(ErrorKind::UnknownMessage));
    }

    #[tokio::test]
    async fn registered_handler_runs() {
        let dispatcher = Dispatcher::new();
        dispatcher.register::<Echo, _, _>("Echo", |_ctx, body| async move {
            assert_eq!(body.value, 7);
            Ok(())
        });
        let body = codec::encode_body(&Echo { value: 7 }).unwrap();
        let result = dispatcher.dispatch("Echo", context().await, &body).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn decode_failure_is_reported() {
        let dispatcher = Dispatcher::new();
        dispatcher.register::<Echo, _, _>("Echo", |_ctx, _body| async move { Ok(()) });
        let result = dispatcher
            .dispatch("Echo", context().await, &[0xFF, 0xFF])
            .await;
        assert_eq!(result, Some(ErrorKind::DecodeFailed));
    }
}

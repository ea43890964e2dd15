use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{StatusCode, Uri},
    Router,
};
use serde_json::Value;
use std::{
    future::{ready, Future, Ready},
    net::SocketAddr,
    sync::Arc,
};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{Instrument, Span};

use crate::{
    client::Client,
    error::Error,
    server::{Event, EventHandler, MessageEvent, MessageStatusEvent},
    subscription::Subscription,
};

/// State shared by every request of one webhook listener.
pub(crate) struct InnerWebhook {
    pub(crate) message_handler: Option<EventHandler<MessageEvent>>,
    pub(crate) status_handler: Option<EventHandler<MessageStatusEvent>>,
    /// Normalized: leading `/`, no trailing `/` unless it is the root.
    pub(crate) route_path: String,
    pub(crate) span: Span,
}

pub(crate) async fn bind(endpoint: SocketAddr) -> Result<(TcpListener, SocketAddr), Error> {
    let listener = TcpListener::bind(endpoint).await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

impl InnerWebhook {
    /// Builds the router and returns the serve future, which resolves once
    /// `shutdown` is notified.
    ///
    /// The route is matched by [`InnerWebhook::accepts`] rather than by the
    /// router, so any path string is usable and every method is answered.
    pub(crate) fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: Arc<Notify>,
    ) -> impl Future<Output = std::io::Result<()>> + Send + 'static {
        let app = Router::new()
            .fallback(handle_webhook)
            .layer(DefaultBodyLimit::disable())
            .with_state(self);

        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    }

    /// Whether a request path falls under the configured route: the route
    /// itself or anything below it.
    pub(crate) fn accepts(&self, path: &str) -> bool {
        let route = self.route_path.as_str();
        route == "/"
            || path
                .strip_prefix(route)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Parses one request body and spawns the matching handler, if any.
    pub(crate) fn dispatch(&self, body: &[u8]) {
        let _enter = self.span.enter();

        let payload: Value = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring webhook request with invalid JSON body");
                return;
            }
        };

        match payload.get("type").and_then(Value::as_str) {
            Some("MESSAGE" | "MESSAGE_STATUS") => {}
            kind => {
                tracing::debug!(?kind, "ignoring webhook event of unhandled type");
                return;
            }
        }

        match serde_json::from_value(payload) {
            Ok(Event::Message(event)) => {
                tracing::debug!(id = ?event.id, "received message event");
                spawn(&self.message_handler, event, &self.span);
            }
            Ok(Event::MessageStatus(event)) => {
                tracing::debug!(id = ?event.id, code = ?event.message_status.code, "received message status event");
                spawn(&self.status_handler, event, &self.span);
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed webhook event");
            }
        }
    }
}

fn spawn<E>(handler: &Option<EventHandler<E>>, event: E, span: &Span)
where
    E: Send + 'static,
{
    if let Some(handler) = handler {
        tokio::spawn(handler(event).instrument(span.clone()));
    }
}

// Every request on the route is acknowledged, whatever its method or body.
pub(crate) fn handle_webhook(
    State(state): State<Arc<InnerWebhook>>,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Ready<StatusCode> {
    if !state.accepts(uri.path()) {
        return ready(StatusCode::NOT_FOUND);
    }

    match body {
        Ok(body) => state.dispatch(&body),
        Err(err) => {
            let _enter = state.span.enter();
            tracing::warn!(error = %err, "ignoring webhook request with unreadable body");
        }
    }
    ready(StatusCode::OK)
}

/// Registers `subscriptions` one after the other. Subscriptions the platform
/// already has (`409`) are skipped; any other failure stops the loop.
pub(crate) async fn bootstrap(client: &Client, subscriptions: &[Subscription]) -> Result<(), Error> {
    for subscription in subscriptions {
        match client.create_subscription(subscription).await {
            Ok(created) => {
                tracing::info!(id = ?created.id, event_type = ?subscription.event_type, "subscription created");
            }
            Err(err) if err.is_conflict() => {
                tracing::debug!(
                    event_type = ?subscription.event_type,
                    url = %subscription.webhook.url,
                    "subscription already exists"
                );
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

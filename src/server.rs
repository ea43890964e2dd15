//! Webhook receiver
//!
//! [`Webhook`] runs a small HTTP listener that accepts Zenvia events on a
//! single `POST` route and hands them to your async callbacks. Given a
//! [`Client`], a public URL and a channel, it also registers the
//! subscriptions that produce those events right after it starts listening.
//!
//! Every request is answered with `200` and an empty body, whatever it
//! contains. Handlers are spawned on the runtime, so a slow handler never
//! delays the answer.
//!
//! # Example
//! ```rust,no_run
//! use zenvia::{Client, channel::Channel, server::Webhook};
//!
//! # async fn example() -> Result<(), zenvia::Error> {
//! let client = Client::new("YOUR_API_TOKEN")?;
//!
//! let mut webhook = Webhook::builder()
//!     .port(3000)
//!     .path("/zenvia")
//!     .message_event_handler(|event| async move {
//!         for text in event.message.texts() {
//!             println!("{} says: {text}", event.message.from);
//!         }
//!     })
//!     .message_status_event_handler(|event| async move {
//!         println!("{:?} is now {:?}", event.message_id, event.message_status.code);
//!     })
//!     .client(client)
//!     .url("https://my-app.example.com/zenvia")
//!     .channel(Channel::Whatsapp)
//!     .on_error(|err| eprintln!("webhook error: {err}"))
//!     .build();
//!
//! let addr = webhook.init().await?;
//! println!("listening on {addr}");
//!
//! tokio::signal::ctrl_c().await?;
//! webhook.close().await;
//! # Ok(()) }
//! ```

use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use futures::{future::BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{Instrument, Span};

use crate::{
    channel::Channel,
    client::Client,
    error::Error,
    message::{InboundMessage, MessageDirection},
    rest::server::{bind, bootstrap, InnerWebhook},
    subscription::{Criteria, Subscription},
};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ROUTE_PATH: &str = "/";

pub(crate) type EventHandler<E> = Arc<dyn Fn(E) -> BoxFuture<'static, ()> + Send + Sync>;
type ListeningCallback = Box<dyn Fn(SocketAddr) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&Error) + Send + Sync>;

/// Where a [`Webhook`] is in its life.
///
/// `Created → Starting → Running → Closing → Closed`. A webhook that fails
/// to bind goes straight from `Starting` to `Closed`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum WebhookState {
    Created,
    Starting,
    Running,
    Closing,
    Closed,
}

/// A Zenvia event receiver.
///
/// Create with [`Webhook::builder()`], start with [`Webhook::init`], stop
/// with [`Webhook::close`]. Dropping a running webhook stops its listener.
pub struct Webhook {
    config: WebhookBuilder,
    state: WebhookState,
    running: Option<Running>,
}

struct Running {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<std::io::Result<()>>,
}

impl Webhook {
    pub fn builder() -> WebhookBuilder {
        WebhookBuilder::new()
    }

    pub fn state(&self) -> WebhookState {
        self.state
    }

    /// The address the listener is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }

    /// Binds the listener, starts serving, then registers subscriptions.
    ///
    /// On success the `on_listening` callback fires once with the bound
    /// address. Subscription registration runs only when a client, a URL, a
    /// channel and at least one handler are configured; subscriptions that
    /// already exist (`409`) are skipped. A registration failure is reported
    /// through `on_error` and does not fail `init`: the listener keeps
    /// running.
    ///
    /// # Errors
    /// - [`Error::Io`] if the listener cannot be bound (also reported through
    ///   `on_error`). The webhook is then `Closed`.
    /// - [`Error::InvalidState`] if the webhook was already started.
    pub async fn init(&mut self) -> Result<SocketAddr, Error> {
        if self.state != WebhookState::Created {
            return Err(Error::InvalidState(self.state));
        }
        let span = self.config.span.clone().unwrap_or_else(Span::current);
        self.start().instrument(span).await
    }

    async fn start(&mut self) -> Result<SocketAddr, Error> {
        self.state = WebhookState::Starting;

        let inner = Arc::new(InnerWebhook {
            message_handler: self.config.message_handler.clone(),
            status_handler: self.config.status_handler.clone(),
            route_path: self.config.route_path.clone(),
            span: Span::current(),
        });

        let (listener, addr) = match bind(self.config.endpoint).await {
            Ok(bound) => bound,
            Err(err) => {
                tracing::error!(endpoint = %self.config.endpoint, error = %err, "failed to bind webhook listener");
                self.state = WebhookState::Closed;
                self.emit_error(&err);
                return Err(err);
            }
        };

        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(
            inner
                .serve(listener, shutdown.clone())
                .in_current_span(),
        );

        self.running = Some(Running {
            addr,
            shutdown,
            task,
        });
        self.state = WebhookState::Running;
        tracing::info!(%addr, path = %self.config.route_path, "webhook listening");
        if let Some(on_listening) = &self.config.on_listening {
            on_listening(addr);
        }

        if let Some((client, subscriptions)) = self.config.subscriptions() {
            if let Err(err) = bootstrap(&client, &subscriptions).await {
                tracing::error!(error = %err, "subscription bootstrap failed");
                self.emit_error(&err);
            }
        }

        Ok(addr)
    }

    /// Stops the listener and waits until the port is released.
    ///
    /// Requests in flight may be cut. Does nothing unless the webhook is
    /// running.
    pub async fn close(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        self.state = WebhookState::Closing;

        running.shutdown.notify_one();
        running.task.abort();
        match running.task.await {
            Ok(Err(err)) => tracing::warn!(error = %err, "webhook listener stopped with an error"),
            Err(err) if err.is_panic() => tracing::warn!("webhook listener panicked"),
            _ => {}
        }

        self.state = WebhookState::Closed;
        tracing::info!(addr = %running.addr, "webhook closed");
    }

    fn emit_error(&self, err: &Error) {
        if let Some(on_error) = &self.config.on_error {
            on_error(err);
        }
    }
}

impl Drop for Webhook {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

/// Builder for a [`Webhook`].
///
/// Defaults: listens on `0.0.0.0:3000`, route `/`, no handlers, no
/// subscription registration.
#[must_use]
pub struct WebhookBuilder {
    endpoint: SocketAddr,
    route_path: String,
    message_handler: Option<EventHandler<MessageEvent>>,
    status_handler: Option<EventHandler<MessageStatusEvent>>,
    client: Option<Client>,
    url: Option<String>,
    channel: Option<Channel>,
    direction: Option<MessageDirection>,
    span: Option<Span>,
    on_listening: Option<ListeningCallback>,
    on_error: Option<ErrorCallback>,
}

impl Default for WebhookBuilder {
    fn default() -> Self {
        Self {
            endpoint: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            route_path: DEFAULT_ROUTE_PATH.to_owned(),
            message_handler: None,
            status_handler: None,
            client: None,
            url: None,
            channel: None,
            direction: None,
            span: None,
            on_listening: None,
            on_error: None,
        }
    }
}

impl WebhookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens on `0.0.0.0:{port}`. Port `0` picks a free port; read it back
    /// from [`Webhook::init`] or [`Webhook::local_addr`].
    pub fn port(mut self, port: u16) -> Self {
        self.endpoint.set_port(port);
        self
    }

    /// Sets the full bind address, e.g. `127.0.0.1:8080`.
    pub fn endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the route events are posted to. Requests to that path, or to
    /// any path below it, are handled.
    ///
    /// A missing leading `/` is added and trailing ones are dropped. The path
    /// is matched literally: `:name` or `*` segments are not captures.
    pub fn path(mut self, path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim_end_matches('/');
        self.route_path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        self
    }

    /// Called with every `MESSAGE` event.
    pub fn message_event_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(MessageEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.message_handler = Some(Arc::new(move |event| handler(event).boxed()));
        self
    }

    /// Called with every `MESSAGE_STATUS` event.
    pub fn message_status_event_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(MessageStatusEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.status_handler = Some(Arc::new(move |event| handler(event).boxed()));
        self
    }

    /// The client used to register subscriptions.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// The public URL the platform should deliver events to.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The channel to register subscriptions for.
    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Restricts the registered `MESSAGE` subscription to one direction.
    pub fn direction(mut self, direction: MessageDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Parent span of every log line the webhook emits. Defaults to the span
    /// current when [`Webhook::init`] is called.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Called once with the bound address when the listener is ready.
    pub fn on_listening<F>(mut self, callback: F) -> Self
    where
        F: Fn(SocketAddr) + Send + Sync + 'static,
    {
        self.on_listening = Some(Box::new(callback));
        self
    }

    /// Called with bind and subscription registration failures.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Webhook {
        Webhook {
            config: self,
            state: WebhookState::Created,
            running: None,
        }
    }

    /// The subscriptions to register, `MESSAGE` first, if registration is
    /// configured.
    fn subscriptions(&self) -> Option<(Client, Vec<Subscription>)> {
        let (Some(client), Some(url), Some(channel)) = (&self.client, &self.url, self.channel)
        else {
            return None;
        };

        let mut subscriptions = Vec::with_capacity(2);
        if self.message_handler.is_some() {
            let mut criteria = Criteria::new(channel);
            criteria.direction = self.direction;
            subscriptions.push(Subscription::message(url.as_str(), criteria));
        }
        if self.status_handler.is_some() {
            subscriptions.push(Subscription::message_status(url.as_str(), channel));
        }

        (!subscriptions.is_empty()).then(|| (client.clone(), subscriptions))
    }
}

/// An event delivered to the webhook, tagged on `type`.
///
/// Only the `type` tag is required: any other field may be missing, and
/// fields not modelled here are kept in each event's `extra`, so an event
/// serializes back to the body it was read from.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Message(MessageEvent),
    MessageStatus(MessageStatusEvent),
}

/// A message was received or sent on a subscribed channel.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct MessageEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    /// Channel id, e.g. `whatsapp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<MessageDirection>,
    #[serde(default)]
    pub message: InboundMessage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The delivery status of a sent message changed.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct MessageStatusEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Index of the content the status refers to, when the message had several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_index: Option<u32>,
    #[serde(default)]
    pub message_status: MessageStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct MessageStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<MessageStatusCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causes: Option<Vec<StatusCause>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A delivery status code. Codes this crate does not know are kept as sent.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatusCode {
    Rejected,
    Sent,
    Delivered,
    NotDelivered,
    Read,
    #[serde(untagged)]
    Other(String),
}

/// Why a message was rejected or not delivered.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct StatusCause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::Content;
    use serde_json::json;

    #[test]
    fn builder_defaults() {
        let builder = WebhookBuilder::new();
        assert_eq!(builder.endpoint, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(builder.route_path, "/");

        let builder = WebhookBuilder::new().port(8080).path("zenvia");
        assert_eq!(builder.endpoint.port(), 8080);
        assert_eq!(builder.route_path, "/zenvia");

        assert_eq!(WebhookBuilder::new().path("/zenvia/").route_path, "/zenvia");
        assert_eq!(WebhookBuilder::new().path("/").route_path, "/");
        assert_eq!(WebhookBuilder::new().path("").route_path, "/");
    }

    #[test]
    fn no_subscriptions_without_full_config() {
        let client = Client::new("SOME_TOKEN").unwrap();

        let builder = WebhookBuilder::new()
            .message_event_handler(|_| async {})
            .client(client.clone())
            .channel(Channel::Whatsapp);
        assert!(builder.subscriptions().is_none(), "missing url");

        let builder = WebhookBuilder::new()
            .client(client)
            .url("https://my-webhook.com")
            .channel(Channel::Whatsapp);
        assert!(builder.subscriptions().is_none(), "no handler");
    }

    #[test]
    fn subscriptions_follow_handlers() {
        let builder = WebhookBuilder::new()
            .message_event_handler(|_| async {})
            .message_status_event_handler(|_| async {})
            .client(Client::new("SOME_TOKEN").unwrap())
            .url("https://my-webhook.com")
            .channel(Channel::Whatsapp)
            .direction(MessageDirection::In);

        let (_, subscriptions) = builder.subscriptions().unwrap();
        assert_eq!(
            serde_json::to_value(&subscriptions).unwrap(),
            json!([
                {
                    "eventType": "MESSAGE",
                    "webhook": {"url": "https://my-webhook.com"},
                    "criteria": {"channel": "whatsapp", "direction": "IN"},
                    "status": "ACTIVE"
                },
                {
                    "eventType": "MESSAGE_STATUS",
                    "webhook": {"url": "https://my-webhook.com"},
                    "criteria": {"channel": "whatsapp"},
                    "status": "ACTIVE"
                }
            ])
        );

        let builder = WebhookBuilder::new()
            .message_status_event_handler(|_| async {})
            .client(Client::new("SOME_TOKEN").unwrap())
            .url("https://my-webhook.com")
            .channel(Channel::Sms);
        let (_, subscriptions) = builder.subscriptions().unwrap();
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(
            subscriptions[0].event_type,
            crate::subscription::EventType::MessageStatus
        );
    }

    #[test]
    fn parses_message_event() {
        let event: Event = serde_json::from_value(json!({
            "type": "MESSAGE",
            "id": "event-id",
            "timestamp": "2020-01-10T02:09:26.390Z",
            "subscriptionId": "subscription-id",
            "channel": "whatsapp",
            "direction": "IN",
            "message": {
                "id": "message-id",
                "from": "5511999999999",
                "to": "my-number",
                "direction": "IN",
                "channel": "whatsapp",
                "contents": [{"type": "text", "text": "Hi"}]
            }
        }))
        .unwrap();

        let Event::Message(event) = event else {
            panic!("expected a message event");
        };
        assert_eq!(event.subscription_id.as_deref(), Some("subscription-id"));
        assert_eq!(event.direction, Some(MessageDirection::In));
        assert_eq!(event.message.texts().collect::<Vec<_>>(), ["Hi"]);
    }

    #[test]
    fn parses_status_event_with_unknown_code() {
        let raw = json!({
            "type": "MESSAGE_STATUS",
            "id": "event-id",
            "timestamp": "2020-01-10T02:09:26.390Z",
            "subscriptionId": "subscription-id",
            "channel": "sms",
            "messageId": "message-id",
            "contentIndex": 0,
            "messageStatus": {
                "timestamp": "2020-01-10T02:09:26.390Z",
                "code": "SOMETHING_NEW",
                "causes": [{"reason": "BLOCKED", "details": "blocked by carrier"}]
            }
        });
        let event: Event = serde_json::from_value(raw.clone()).unwrap();

        let Event::MessageStatus(status) = &event else {
            panic!("expected a status event");
        };
        assert_eq!(status.content_index, Some(0));
        assert_eq!(
            status.message_status.code,
            Some(MessageStatusCode::Other("SOMETHING_NEW".into()))
        );
        let causes = status.message_status.causes.as_deref().unwrap();
        assert_eq!(causes[0].reason.as_deref(), Some("BLOCKED"));

        // The unknown code is written back as received
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn known_status_codes() {
        let code: MessageStatusCode = serde_json::from_value(json!("NOT_DELIVERED")).unwrap();
        assert_eq!(code, MessageStatusCode::NotDelivered);
        assert_eq!(serde_json::to_value(MessageStatusCode::Read).unwrap(), json!("READ"));
    }

    #[test]
    fn status_with_single_cause_string() {
        let raw = json!({
            "type": "MESSAGE_STATUS",
            "id": "10ce99e9-340b-4c0a-81d1-df07d94971f8",
            "timestamp": "2019-09-17T18:15:38.667Z",
            "subscriptionId": "4df603ec-b37a-4ffb-9e0a-02eec57dca96",
            "channel": "whatsapp",
            "messageId": "7391518c-e719-468c-812a-ab00a8b442e4",
            "messageStatus": {
                "timestamp": "2019-09-17T18:15:38+00:00",
                "code": "REJECTED",
                "description": "The message was rejected by the provider",
                "cause": "415:Template id template-identifier cannot be found"
            }
        });
        let event: Event = serde_json::from_value(raw.clone()).unwrap();

        let Event::MessageStatus(status) = &event else {
            panic!("expected a status event");
        };
        assert_eq!(status.message_status.code, Some(MessageStatusCode::Rejected));
        assert_eq!(
            status.message_status.extra["cause"],
            "415:Template id template-identifier cannot be found"
        );
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn message_event_keeps_every_field() {
        let raw = json!({
            "type": "MESSAGE",
            "id": "event-id",
            "timestamp": "2020-01-10T02:09:26.390Z",
            "subscriptionId": "subscription-id",
            "channel": "whatsapp",
            "direction": "IN",
            "message": {
                "id": "message-id",
                "from": "5511999999999",
                "to": "my-number",
                "direction": "IN",
                "channel": "whatsapp",
                "timestamp": "2020-01-10T02:09:26.000Z",
                "visitor": {"name": "John", "firstName": "John"},
                "contents": [{
                    "type": "file",
                    "fileUrl": "https://example.com/doc.pdf",
                    "fileMimeType": "application/pdf",
                    "fileName": "doc.pdf",
                    "fileSize": 1024
                }]
            }
        });
        let event: Event = serde_json::from_value(raw.clone()).unwrap();

        let Event::Message(message) = &event else {
            panic!("expected a message event");
        };
        assert_eq!(message.message.extra["visitor"]["name"], "John");
        let Content::File(file) = &message.message.contents[0] else {
            panic!("expected a file content");
        };
        assert_eq!(file.file_name.as_deref(), Some("doc.pdf"));
        assert_eq!(file.extra["fileSize"], 1024);

        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn sparse_events_still_parse() {
        let event: Event =
            serde_json::from_value(json!({"type": "MESSAGE", "id": "only-id"})).unwrap();
        let Event::Message(message) = event else {
            panic!("expected a message event");
        };
        assert_eq!(message.id.as_deref(), Some("only-id"));
        assert_eq!(message.subscription_id, None);
        assert!(message.message.contents.is_empty());

        let event: Event = serde_json::from_value(json!({"type": "MESSAGE_STATUS"})).unwrap();
        assert!(matches!(event, Event::MessageStatus(_)));
    }

    #[tokio::test]
    async fn init_twice_is_rejected() {
        let mut webhook = Webhook::builder()
            .endpoint("127.0.0.1:0".parse().unwrap())
            .build();
        assert_eq!(webhook.state(), WebhookState::Created);

        let addr = webhook.init().await.unwrap();
        assert_eq!(webhook.state(), WebhookState::Running);
        assert_eq!(webhook.local_addr(), Some(addr));

        let err = webhook.init().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(WebhookState::Running)));

        webhook.close().await;
        assert_eq!(webhook.state(), WebhookState::Closed);
        assert_eq!(webhook.local_addr(), None);

        // Closing again is a no-op
        webhook.close().await;
        assert_eq!(webhook.state(), WebhookState::Closed);
    }
}

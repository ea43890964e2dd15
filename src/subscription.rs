//! Event subscriptions
//!
//! A subscription tells the platform to deliver events of one type, for one
//! channel, to a webhook URL. See [`crate::server::Webhook`] for a receiver
//! that can register its own subscriptions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    channel::Channel,
    client::Client,
    error::Error,
    message::MessageDirection,
};

const SUBSCRIPTIONS: &str = "/v1/subscriptions";

/// The kind of event a subscription delivers.
///
/// Types this crate does not know are kept as sent.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Message,
    MessageStatus,
    #[serde(untagged)]
    Other(String),
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Inactive,
    #[serde(untagged)]
    Other(String),
}

/// Where events are delivered.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct WebhookTarget {
    pub url: String,
    /// Extra headers the platform sends along with every event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<serde_json::Map<String, serde_json::Value>>,
}

impl WebhookTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: None,
        }
    }
}

/// Which events a subscription selects.
///
/// `channel` is the raw channel id, so subscriptions on channels this crate
/// cannot send through (e.g. `instagram`) still read back.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Criteria {
    pub channel: String,
    /// Only meaningful for [`EventType::Message`] subscriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<MessageDirection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Criteria {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel: channel.as_str().to_owned(),
            direction: None,
            extra: Map::new(),
        }
    }

    /// The criteria's channel, if it is one this crate supports.
    pub fn known_channel(&self) -> Option<Channel> {
        self.channel.parse().ok()
    }

    pub fn direction(mut self, direction: MessageDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// A subscription, as sent to and returned by the platform.
///
/// Server-assigned fields (`id`, `version`, timestamps) are left out of the
/// request body when unset.
///
/// # Example
/// ```rust
/// use zenvia::{channel::Channel, subscription::{Criteria, Subscription, SubscriptionStatus}};
///
/// let subscription = Subscription::message("https://my-webhook.com", Criteria::new(Channel::Whatsapp))
///     .status(SubscriptionStatus::Inactive);
/// ```
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_type: EventType,
    pub webhook: WebhookTarget,
    pub criteria: Criteria,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Subscription {
    fn new(event_type: EventType, url: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            id: None,
            event_type,
            webhook: WebhookTarget::new(url),
            criteria,
            status: SubscriptionStatus::default(),
            version: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// A subscription to inbound and outbound messages.
    pub fn message(url: impl Into<String>, criteria: Criteria) -> Self {
        Self::new(EventType::Message, url, criteria)
    }

    /// A subscription to status updates of messages sent through `channel`.
    pub fn message_status(url: impl Into<String>, channel: Channel) -> Self {
        Self::new(EventType::MessageStatus, url, Criteria::new(channel))
    }

    pub fn status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }
}

/// The updatable part of a subscription.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct PartialSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
}

impl Client {
    /// Lists every subscription of the account.
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Error> {
        self.execute(self.get(SUBSCRIPTIONS)).await
    }

    /// Creates a subscription and returns it as stored by the platform.
    ///
    /// # Errors
    /// An equivalent subscription that already exists is rejected with a
    /// `409` [`Error::Request`] (see [`Error::is_conflict`]).
    pub async fn create_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, Error> {
        self.execute(self.post(SUBSCRIPTIONS).json(subscription))
            .await
    }

    pub async fn get_subscription(&self, id: &str) -> Result<Subscription, Error> {
        self.execute(self.get(&format!("{SUBSCRIPTIONS}/{id}")))
            .await
    }

    /// Applies `changes` to the subscription `id`.
    ///
    /// # Example
    /// ```rust,no_run
    /// use zenvia::subscription::{PartialSubscription, SubscriptionStatus};
    ///
    /// # async fn example(client: zenvia::Client) -> Result<(), zenvia::Error> {
    /// let changes = PartialSubscription {
    ///     status: Some(SubscriptionStatus::Inactive),
    ///     ..Default::default()
    /// };
    /// client.update_subscription("SUBSCRIPTION_ID", &changes).await?;
    /// # Ok(()) }
    /// ```
    pub async fn update_subscription(
        &self,
        id: &str,
        changes: &PartialSubscription,
    ) -> Result<Subscription, Error> {
        self.execute(self.patch(&format!("{SUBSCRIPTIONS}/{id}")).json(changes))
            .await
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<(), Error> {
        self.execute_empty(self.delete(&format!("{SUBSCRIPTIONS}/{id}")))
            .await
    }
}

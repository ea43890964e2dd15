//! Zenvia API client implementation
//!
//! This module provides the main client used to interact with the Zenvia
//! platform. It handles authentication and gives scoped access to the channel
//! senders, subscriptions, templates, reports and batches.
//!
//! # Example – Creating a Client
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use zenvia::client::Client;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .token("YOUR_API_TOKEN")
//!     .timeout(Duration::from_secs(15))
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! # Example – Sending a Message
//!
//! ```rust,no_run
//! use zenvia::{Client, channel::Channel, message::Content};
//!
//! # async fn run(client: Client) -> Result<(), Box<dyn std::error::Error>> {
//! client
//!     .channel(Channel::Sms)
//!     .send_message("FROM", "5511999999999", [Content::text("Hello from Rust!")])?
//!     .await?;
//! # Ok(()) }
//! ```

use std::{sync::Arc, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client as HttpClient, ClientBuilder as HttpClientBuilder,
};

use crate::{
    channel::{Channel, ChannelClient, ContentPolicy},
    error::Error,
    message::ContentType,
};

/// Default base URL of the Zenvia API
const DEFAULT_BASE_URL: &str = "https://api.zenvia.com";
/// Header carrying the API token (`X-API-Token`)
const TOKEN_HEADER: &str = "x-api-token";
/// Default user agent for the client
const USER_AGENT: &str = concat!("zenvia-rs/", env!("CARGO_PKG_VERSION"), " (Rust)");

/// The primary entry point for interacting with the **Zenvia API**.
///
/// The `Client` injects the API token into every request and holds the
/// per-channel [`ContentPolicy`]. It is cheap to clone and can be shared
/// across tasks.
///
/// # Key Capabilities
///
/// - `.channel(channel)`: send messages through a channel.
/// - `.list_subscriptions()`, `.create_subscription(..)`, ...: manage webhook subscriptions.
/// - `.list_templates()`, `.create_template(..)`, ...: manage templates.
/// - `.reports()`: read flow and message reports.
/// - `.send_batch(..)`: submit a message batch.
///
/// # Example
/// ```rust,no_run
/// use zenvia::Client;
///
/// let client = Client::new("YOUR_API_TOKEN").unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<InnerClient>,
}

#[derive(Debug)]
struct InnerClient {
    http_client: HttpClient,
    base_url: String,
    policy: ContentPolicy,
}

impl Client {
    /// Creates a new client with default configuration.
    ///
    /// # Arguments
    /// * `token` - The API token used to authenticate with the Zenvia API
    pub fn new(token: impl Into<String>) -> Result<Self, Error> {
        Self::builder().token(token).build()
    }

    /// Starts building a new client with custom settings.
    ///
    /// Allows setting timeouts, the base URL and channel content policies.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns a sender bound to `channel`.
    ///
    /// # Example
    /// ```rust,no_run
    /// # fn example(client: zenvia::Client) {
    /// use zenvia::channel::Channel;
    ///
    /// let whatsapp = client.channel(Channel::Whatsapp);
    /// # }
    /// ```
    pub fn channel(&self, channel: Channel) -> ChannelClient {
        ChannelClient::new(self, channel)
    }

    /// Returns a sender bound to the channel with the given id.
    ///
    /// # Errors
    /// [`Error::UnsupportedChannel`] if `id` is not `sms`, `rcs`, `facebook`
    /// or `whatsapp`.
    ///
    /// # Example
    /// ```rust,no_run
    /// # fn example(client: zenvia::Client) {
    /// let err = client.get_channel("invalid").unwrap_err();
    /// assert_eq!(err.to_string(), "Unsupported channel");
    /// # }
    /// ```
    pub fn get_channel(&self, id: &str) -> Result<ChannelClient, Error> {
        Ok(self.channel(id.parse()?))
    }

    /// The content kinds each channel permits for this client.
    pub fn content_policy(&self) -> &ContentPolicy {
        &self.inner.policy
    }

    #[inline(always)]
    pub(crate) fn http(&self) -> &HttpClient {
        &self.inner.http_client
    }

    #[inline]
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }
}

/// Builder for a [`Client`].
///
/// # Example
/// ```rust,no_run
/// use zenvia::{client::ClientBuilder, channel::Channel, message::ContentType};
///
/// let client = ClientBuilder::new()
///     .token("YOUR_API_TOKEN")
///     .content_policy(Channel::Rcs, [ContentType::Text, ContentType::File, ContentType::Location])
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
#[must_use]
pub struct ClientBuilder {
    http: HttpClientBuilder,
    token: Option<String>,
    base_url: String,
    policy: ContentPolicy,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            http: HttpClientBuilder::new(),
            token: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            policy: ContentPolicy::default(),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API token sent with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout for all API calls.
    ///
    /// If a request takes longer than this, it fails with [`Error::Technical`].
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.http = self.http.timeout(duration);
        self
    }

    /// Overrides the API base URL (`https://api.zenvia.com` by default).
    ///
    /// A trailing `/` is ignored.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Replaces the content kinds `channel` permits.
    ///
    /// The defaults are: SMS text only; RCS and Facebook text and file;
    /// WhatsApp every kind.
    pub fn content_policy(
        mut self,
        channel: Channel,
        kinds: impl IntoIterator<Item = ContentType>,
    ) -> Self {
        self.policy.set(channel, kinds);
        self
    }

    /// Finishes building the client.
    ///
    /// # Errors
    /// [`Error::Internal`] if no token was given, the token is not a valid
    /// header value, or the HTTP client cannot be built.
    pub fn build(self) -> Result<Client, Error> {
        let token = self
            .token
            .ok_or_else(|| Error::internal("An API token is required".into()))?;
        let mut token: HeaderValue = token
            .parse()
            .map_err(|err| Error::internal(format!("Invalid token: {err}").into()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(TOKEN_HEADER, token);

        let http_client = self.http.default_headers(headers).build()?;
        Ok(Client {
            inner: Arc::new(InnerClient {
                http_client,
                base_url: self.base_url,
                policy: self.policy,
            }),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_requires_a_token() {
        let err = ClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let err = Client::new("bad\ntoken").unwrap_err();
        assert!(err.to_string().contains("Invalid token"));
    }

    #[test]
    fn urls_join_base_and_path() {
        let client = Client::builder()
            .token("SOME_TOKEN")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(
            client.url("/v1/subscriptions"),
            "http://localhost:8080/v1/subscriptions"
        );

        let client = Client::new("SOME_TOKEN").unwrap();
        assert_eq!(
            client.url("/v1/channels/sms/messages"),
            "https://api.zenvia.com/v1/channels/sms/messages"
        );
    }

    #[test]
    fn custom_policy_reaches_channels() {
        let client = Client::builder()
            .token("SOME_TOKEN")
            .content_policy(Channel::Sms, [ContentType::Text, ContentType::File])
            .build()
            .unwrap();
        assert_eq!(
            client.channel(Channel::Sms).allowed_contents(),
            [ContentType::Text, ContentType::File]
        );
        assert!(client.get_channel("invalid").is_err());
    }
}

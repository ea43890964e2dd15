//! Channels and their content policies
//!
//! Every Zenvia channel accepts a different subset of [`Content`] kinds. The
//! subsets live in a [`ContentPolicy`] table held by the [`Client`]; a single
//! validation routine ([`ContentPolicy::validate`]) checks an outbound message
//! against it before anything is sent.
//!
//! # Example
//! ```rust,no_run
//! use zenvia::{Client, channel::Channel, message::Content};
//!
//! # async fn example() -> Result<(), zenvia::Error> {
//! let client = Client::new("YOUR_API_TOKEN")?;
//! let sms = client.channel(Channel::Sms);
//!
//! // Validation happens here, synchronously...
//! let pending = sms.send_message("FROM", "TO", [Content::text("Hello!")])?;
//! // ...and the request is performed here.
//! let echoed = pending.await?;
//! # Ok(()) }
//! ```

use std::{collections::HashMap, fmt::Display, str::FromStr};

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    client::Client,
    error::Error,
    message::{Content, ContentType, Message},
};

/// A messaging medium with its own content restrictions and endpoint.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Rcs,
    Facebook,
    Whatsapp,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Self::Sms, Self::Rcs, Self::Facebook, Self::Whatsapp];

    /// The lowercase id used on the wire and in endpoint paths.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Rcs => "rcs",
            Self::Facebook => "facebook",
            Self::Whatsapp => "whatsapp",
        }
    }

    /// The human-readable name used in error messages.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Rcs => "RCS",
            Self::Facebook => "Facebook",
            Self::Whatsapp => "WhatsApp",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| Error::UnsupportedChannel(s.to_owned()))
    }
}

// Default permitted contents per channel. RCS is configuration, see
// `ClientBuilder::content_policy`.
const DEFAULT_POLICY: [(Channel, &[ContentType]); 4] = [
    (Channel::Sms, &[ContentType::Text]),
    (Channel::Rcs, &[ContentType::Text, ContentType::File]),
    (Channel::Facebook, &[ContentType::Text, ContentType::File]),
    (Channel::Whatsapp, &ContentType::ALL),
];

/// The table of content kinds each channel permits.
///
/// # Example
/// ```rust
/// use zenvia::{channel::{Channel, ContentPolicy}, message::{Content, ContentType}};
///
/// let policy = ContentPolicy::default();
/// assert!(policy.permits(Channel::Facebook, ContentType::File));
/// assert!(!policy.permits(Channel::Sms, ContentType::File));
///
/// let err = policy
///     .validate(Channel::Facebook, &[Content::text("hi"), Content::template("id")])
///     .unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "Content of type template is not supported in Facebook channel"
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ContentPolicy {
    allowed: HashMap<Channel, Vec<ContentType>>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_POLICY
                .iter()
                .map(|(channel, kinds)| (*channel, kinds.to_vec()))
                .collect(),
        }
    }
}

impl ContentPolicy {
    /// Replaces the permitted kinds of one channel.
    pub fn set(&mut self, channel: Channel, kinds: impl IntoIterator<Item = ContentType>) {
        let mut unique: Vec<ContentType> = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        self.allowed.insert(channel, unique);
    }

    /// The kinds `channel` permits.
    pub fn allowed(&self, channel: Channel) -> &[ContentType] {
        self.allowed.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn permits(&self, channel: Channel, kind: ContentType) -> bool {
        self.allowed(channel).contains(&kind)
    }

    /// Checks `contents` left to right and fails on the first one the channel
    /// does not permit. Later contents are not inspected.
    pub fn validate(&self, channel: Channel, contents: &[Content]) -> Result<(), Error> {
        let rejected = contents.iter().find(|content| {
            !content
                .kind()
                .is_some_and(|kind| self.permits(channel, kind))
        });

        let Some(content) = rejected else {
            return Ok(());
        };

        let content_type = content.content_type().to_owned();
        match ContentType::from_wire(&content_type) {
            // A known kind that failed to parse, but one the channel accepts
            Some(kind) if self.permits(channel, kind) => {
                Err(Error::MalformedContent { content_type })
            }
            _ => Err(Error::UnsupportedContent {
                channel,
                content_type,
            }),
        }
    }
}

/// A client bound to one channel.
///
/// Obtained through [`Client::channel`].
#[derive(Clone, Debug)]
pub struct ChannelClient {
    client: Client,
    channel: Channel,
}

impl ChannelClient {
    pub(crate) fn new(client: &Client, channel: Channel) -> Self {
        Self {
            client: client.clone(),
            channel,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The content kinds this channel permits.
    pub fn allowed_contents(&self) -> &[ContentType] {
        self.client.content_policy().allowed(self.channel)
    }

    /// Validates a message and prepares it for sending.
    ///
    /// The contents are checked against the channel's policy right away; an
    /// unsupported content fails here with [`Error::UnsupportedContent`],
    /// naming the first offending content. The returned [`SendMessage`]
    /// performs the request when `.await`ed.
    ///
    /// # Arguments
    /// * `from` - Sender id (phone number, page id, ... depending on the channel).
    /// * `to` - Recipient id.
    /// * `contents` - One or more contents, sent in order.
    ///
    /// # Example
    /// ```rust,no_run
    /// use zenvia::{channel::Channel, message::{Content, FileContent}};
    ///
    /// # async fn example(client: zenvia::Client) -> Result<(), zenvia::Error> {
    /// let whatsapp = client.channel(Channel::Whatsapp);
    /// let response = whatsapp
    ///     .send_message(
    ///         "5511999999999",
    ///         "5511888888888",
    ///         [
    ///             Content::text("Here you go"),
    ///             FileContent::new("https://example.com/a.png", "image/png").into(),
    ///         ],
    ///     )?
    ///     .await?;
    /// println!("{response}");
    /// # Ok(()) }
    /// ```
    pub fn send_message<C>(
        &self,
        from: impl Into<String>,
        to: impl Into<String>,
        contents: impl IntoIterator<Item = C>,
    ) -> Result<SendMessage, Error>
    where
        C: Into<Content>,
    {
        let contents: Vec<Content> = contents.into_iter().map(Into::into).collect();
        if contents.is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.client
            .content_policy()
            .validate(self.channel, &contents)?;

        let message = Message::new(from.into(), to.into(), contents);
        let path = format!("/v1/channels/{}/messages", self.channel);

        Ok(SendMessage {
            request: self.client.post(&path).json(&message),
            client: self.client.clone(),
        })
    }
}

/// A validated message, ready to be sent.
///
/// This struct is returned by [`ChannelClient::send_message`]. It does not
/// perform the network request until it is `.await`ed (due to its
/// `IntoFuture` implementation) or its `execute().await` method is called.
#[derive(Debug)]
#[must_use = "SendMessage does nothing unless you `.await` or `.execute().await` it"]
pub struct SendMessage {
    client: Client,
    request: RequestBuilder,
}

IntoFuture! {
    impl SendMessage {
        /// Posts the message and returns the platform's response body unchanged.
        ///
        /// # Errors
        /// [`Error::Request`] on a non-2xx answer, [`Error::Technical`] when the
        /// platform cannot be reached.
        pub fn execute(self) -> impl Future<Output = Result<Value, Error>> + 'static {
            async move { self.client.execute(self.request).await }
        }
    }
}

//! Zenvia Message Types and Builders
//!
//! This module defines the building blocks for composing, sending, and receiving
//! messages through the Zenvia channels.
//!
//! ## Key Types
//!
//! - [`Content`]: the closed set of payload kinds a message can carry
//!   (text, file, template, location, contacts and raw JSON). The wire `type`
//!   tag is derived from the variant.
//! - [`Message`]: an outbound message, `from`, `to` and one or more contents.
//! - [`InboundMessage`]: a message delivered by the platform in a webhook event.
//!
//! ## Example
//! ```rust
//! use zenvia::message::{Content, FileContent, Location};
//!
//! let contents = [
//!     Content::text("Here is your receipt"),
//!     FileContent::new("https://example.com/receipt.pdf", "application/pdf")
//!         .caption("Receipt #42")
//!         .into(),
//!     Location::new(-46.511170, -23.442930).name("Our store").into(),
//! ];
//! assert_eq!(contents[1].content_type(), "file");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of message payload.
///
/// Serialized internally tagged on `type`:
///
/// ```rust
/// use zenvia::message::Content;
///
/// let json = serde_json::to_value(Content::text("hi")).unwrap();
/// assert_eq!(json, serde_json::json!({"type": "text", "text": "hi"}));
/// ```
///
/// Inbound messages may contain kinds this crate does not model; those are kept
/// verbatim in [`Content::Unknown`].
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text(TextContent),
    File(FileContent),
    Template(TemplateContent),
    Location(Location),
    Contacts(ContactsContent),
    Json(JsonContent),
    /// Any content object whose `type` is missing or not one of the above.
    ///
    /// A known `type` lacking one of its required fields (e.g. a `text`
    /// without `text`) also lands here; sending it fails with
    /// [`Error::MalformedContent`](crate::Error::MalformedContent).
    #[serde(untagged)]
    Unknown(Value),
}

impl Content {
    /// Creates a text content.
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextContent::new(text))
    }

    /// Creates a file content from a public URL and its MIME type.
    #[inline]
    pub fn file(file_url: impl Into<String>, file_mime_type: impl Into<String>) -> Self {
        Self::File(FileContent::new(file_url, file_mime_type))
    }

    /// Creates a template content with no fields.
    #[inline]
    pub fn template(template_id: impl Into<String>) -> Self {
        Self::Template(TemplateContent::new(template_id))
    }

    /// Creates a location content.
    #[inline]
    pub fn location(longitude: f64, latitude: f64) -> Self {
        Self::Location(Location::new(longitude, latitude))
    }

    /// Creates a contacts content.
    #[inline]
    pub fn contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        Self::Contacts(ContactsContent::new(contacts))
    }

    /// Creates a JSON content with an arbitrary payload.
    #[inline]
    pub fn json(payload: Value) -> Self {
        Self::Json(JsonContent {
            payload,
            extra: Map::new(),
        })
    }

    /// The modelled kind of this content, `None` for [`Content::Unknown`].
    pub fn kind(&self) -> Option<ContentType> {
        match self {
            Self::Text(_) => Some(ContentType::Text),
            Self::File(_) => Some(ContentType::File),
            Self::Template(_) => Some(ContentType::Template),
            Self::Location(_) => Some(ContentType::Location),
            Self::Contacts(_) => Some(ContentType::Contacts),
            Self::Json(_) => Some(ContentType::Json),
            Self::Unknown(_) => None,
        }
    }

    /// The wire `type` of this content.
    ///
    /// For an unknown content this is its own non-empty `type` string, or
    /// `"undefined"` when it has none.
    pub fn content_type(&self) -> &str {
        match self {
            Self::Unknown(value) => value
                .get("type")
                .and_then(Value::as_str)
                .filter(|ty| !ty.is_empty())
                .unwrap_or("undefined"),
            known => known.kind().map(ContentType::as_str).unwrap_or("undefined"),
        }
    }
}

/// The content kinds the platform accepts, independent of their fields.
///
/// Used to describe which contents a channel permits.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    File,
    Template,
    Location,
    Contacts,
    Json,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        Self::Text,
        Self::File,
        Self::Template,
        Self::Location,
        Self::Contacts,
        Self::Json,
    ];

    /// The kind named by a wire `type`, if it is one of the modelled kinds.
    pub fn from_wire(ty: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == ty)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Template => "template",
            Self::Location => "location",
            Self::Contacts => "contacts",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plain text message.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct TextContent {
    pub text: String,
    /// Fields the platform sends that are not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextContent {
    #[inline]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// A file served from a public URL (image, audio, video, document...).
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct FileContent {
    pub file_url: String,
    pub file_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_caption: Option<String>,
    /// Original file name, set on inbound files.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileContent {
    #[inline]
    pub fn new(file_url: impl Into<String>, file_mime_type: impl Into<String>) -> Self {
        Self {
            file_url: file_url.into(),
            file_mime_type: file_mime_type.into(),
            file_caption: None,
            file_name: None,
            extra: Map::new(),
        }
    }

    #[inline]
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.file_caption = Some(caption.into());
        self
    }

    #[inline]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// A pre-approved template, filled with field values.
///
/// # Example
/// ```rust
/// use zenvia::message::TemplateContent;
///
/// let content = TemplateContent::new("templateId")
///     .field("name", "John")
///     .field("ticketId", "123");
/// assert_eq!(content.fields.len(), 2);
/// ```
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TemplateContent {
    pub template_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateContent {
    #[inline]
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            fields: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    #[inline]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn fields<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Geographical coordinates, optionally named.
///
/// # Example
/// ```rust
/// use zenvia::message::Location;
///
/// let store = Location::new(-46.511170, -23.442930)
///     .name("Awesome Store")
///     .address("123 Main St, Anytown");
/// ```
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    #[inline]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            name: None,
            address: None,
            url: None,
            extra: Map::new(),
        }
    }

    #[inline]
    pub fn name(mut self, location_name: impl Into<String>) -> Self {
        self.name = Some(location_name.into());
        self
    }

    #[inline]
    pub fn address(mut self, location_address: impl Into<String>) -> Self {
        self.address = Some(location_address.into());
        self
    }

    #[inline]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One or more contact cards.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct ContactsContent {
    pub contacts: Vec<Contact>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContactsContent {
    #[inline]
    pub fn new(contacts: impl IntoIterator<Item = Contact>) -> Self {
        Self {
            contacts: contacts.into_iter().collect(),
            extra: Map::new(),
        }
    }
}

/// A contact card. Every part is optional.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<ContactName>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub phones: Vec<ContactPhone>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub emails: Vec<ContactEmail>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub addresses: Vec<ContactAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub urls: Vec<ContactUrl>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub org: Option<ContactOrg>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub birthday: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactName {
    pub formatted_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suffix: Option<String>,
}

/// A phone number. `kind` is the platform label, e.g. `CELL`, `MAIN`, `HOME`, `WORK`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactPhone {
    pub phone: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wa_id: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct ContactEmail {
    pub email: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactAddress {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub country_code: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct ContactUrl {
    pub url: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct ContactOrg {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
}

/// Arbitrary structured data, e.g. a web chat visitor profile.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct JsonContent {
    pub payload: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&str> for Content {
    #[inline]
    fn from(value: &str) -> Self {
        Content::text(value)
    }
}

impl From<String> for Content {
    #[inline]
    fn from(value: String) -> Self {
        Content::text(value)
    }
}

macro_rules! content_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Content {
                #[inline]
                fn from(value: $ty) -> Self {
                    Content::$variant(value)
                }
            }
        )*
    };
}

content_from! {
    TextContent => Text,
    FileContent => File,
    TemplateContent => Template,
    Location => Location,
    ContactsContent => Contacts,
    JsonContent => Json,
}

/// An outbound message, as posted to `/v1/channels/{channel}/messages`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[non_exhaustive]
pub struct Message {
    pub from: String,
    pub to: String,
    pub contents: Vec<Content>,
}

impl Message {
    pub(crate) fn new(from: String, to: String, contents: Vec<Content>) -> Self {
        Self { from, to, contents }
    }
}

/// Whether a message was received (`IN`) or sent (`OUT`) by the business.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageDirection {
    In,
    Out,
}

/// A message carried by a webhook event.
///
/// Every field the platform sends is kept: those not modelled here (the
/// message `timestamp`, the web chat `visitor`...) are in `extra`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct InboundMessage {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub direction: Option<MessageDirection>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub contents: Vec<Content>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundMessage {
    /// Iterates over the text of every text content, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.contents.iter().filter_map(|content| match content {
            Content::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
    }
}

//! Message batches
//!
//! A batch sends one message to every contact of a CSV file. The upload is a
//! multipart form with two parts:
//!
//! - `batch`: the JSON batch descriptor,
//! - `contacts`: the CSV bytes, named `contacts.csv` with type `text/csv`.
//!
//! The batch message's contents are checked against the channel's content
//! policy before the upload, like [`ChannelClient::send_message`] does.
//!
//! [`ChannelClient::send_message`]: crate::channel::ChannelClient::send_message
//!
//! # Example
//! ```rust,no_run
//! use zenvia::{batch::{Batch, BatchMessage}, channel::Channel, message::Content};
//!
//! # async fn example(client: zenvia::Client) -> Result<(), zenvia::Error> {
//! let batch = Batch::new(
//!     "Black Friday",
//!     Channel::Sms,
//!     BatchMessage::new("sender", [Content::text("Hi {{name}}, 50% off today!")]),
//! )
//! .column_mapper("recipient_number_column", "phone");
//!
//! let created = client.send_batch_file("contacts.csv", &batch).await?;
//! println!("batch id: {:?}", created.id);
//! # Ok(()) }
//! ```

use std::{collections::BTreeMap, path::Path};

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    channel::Channel,
    client::Client,
    error::Error,
    message::Content,
};

const MESSAGE_BATCHES: &str = "/v2/message-batches";
const CONTACTS_FILE_NAME: &str = "contacts.csv";
const CONTACTS_MIME_TYPE: &str = "text/csv";

/// A batch descriptor, as sent to and returned by the platform.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Channel id, e.g. `sms`.
    pub channel: String,
    pub message: BatchMessage,
    /// Maps placeholders and recipient columns to CSV header names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_mapper: Option<BTreeMap<String, String>>,
    /// Server metadata (creation time, status, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Batch {
    pub fn new(name: impl Into<String>, channel: Channel, message: BatchMessage) -> Self {
        Self {
            id: None,
            name: name.into(),
            channel: channel.as_str().to_owned(),
            message,
            column_mapper: None,
            extra: Map::new(),
        }
    }

    pub fn column_mapper(mut self, key: impl Into<String>, column: impl Into<String>) -> Self {
        self.column_mapper
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), column.into());
        self
    }
}

/// The message every contact of a batch receives.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct BatchMessage {
    pub from: String,
    pub contents: Vec<Content>,
}

impl BatchMessage {
    pub fn new<C>(from: impl Into<String>, contents: impl IntoIterator<Item = C>) -> Self
    where
        C: Into<Content>,
    {
        Self {
            from: from.into(),
            contents: contents.into_iter().map(Into::into).collect(),
        }
    }
}

impl Client {
    /// Uploads a batch with the given contacts CSV.
    ///
    /// # Errors
    /// [`Error::UnsupportedChannel`], [`Error::EmptyMessage`] or
    /// [`Error::UnsupportedContent`] before any request is made; otherwise
    /// the usual request errors.
    pub async fn send_batch(
        &self,
        contacts: impl Into<Vec<u8>>,
        batch: &Batch,
    ) -> Result<Batch, Error> {
        let channel: Channel = batch.channel.parse()?;
        if batch.message.contents.is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.content_policy()
            .validate(channel, &batch.message.contents)?;

        let descriptor = serde_json::to_string(batch).map_err(|err| Error::internal(err.into()))?;
        let contacts = Part::bytes(contacts.into())
            .file_name(CONTACTS_FILE_NAME)
            .mime_str(CONTACTS_MIME_TYPE)?;

        let form = Form::new()
            .text("batch", descriptor)
            .part("contacts", contacts);

        self.execute(self.post(MESSAGE_BATCHES).multipart(form))
            .await
    }

    /// Reads the contacts CSV at `path` and uploads the batch.
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be read, then as [`Client::send_batch`].
    pub async fn send_batch_file(
        &self,
        path: impl AsRef<Path>,
        batch: &Batch,
    ) -> Result<Batch, Error> {
        let contacts = tokio::fs::read(path).await?;
        self.send_batch(contacts, batch).await
    }
}

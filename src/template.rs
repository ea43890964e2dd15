//! Message templates
//!
//! Templates are pre-approved message layouts (mostly for WhatsApp). The
//! platform reports the channel types of a template in uppercase; this crate
//! lowercases them on every read so they line up with [`crate::channel::Channel`]
//! ids.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{client::Client, error::Error};

const TEMPLATES: &str = "/v1/templates";

/// A template as sent to and returned by the platform.
///
/// Listing endpoints return a reduced view, so every field is optional.
/// Fields this crate does not model are kept in `extra` and sent back
/// unchanged.
///
/// # Example
/// ```rust
/// use zenvia::template::{Template, TemplateComponent, TemplateComponents};
///
/// let template = Template {
///     name: Some("Ticket update".into()),
///     locale: Some("pt_BR".into()),
///     channel: Some("WHATSAPP".into()),
///     category: Some("ACCOUNT_UPDATE".into()),
///     sender_id: Some("sender_id".into()),
///     notification_email: Some("mail@example.com".into()),
///     components: Some(TemplateComponents {
///         body: Some(TemplateComponent::new("TEXT_TEMPLATE").text("Hello, {{name}}.")),
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
/// ```
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Channel id as the template API spells it (`WHATSAPP`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<TemplateComponents>,
    /// Rendered text with `{{field}}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<TemplateChannel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    fn lowercase_channels(mut self) -> Self {
        for channel in self.channels.iter_mut().flatten() {
            channel.kind.make_ascii_lowercase();
        }
        self
    }
}

/// The approval state of a template on one sender.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TemplateChannel {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct TemplateComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<TemplateComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<TemplateComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<TemplateComponent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One section of a template, e.g. `{"type": "TEXT_FIXED", "text": "..."}`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateComponent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: None,
            extra: Map::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// The updatable part of a template.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartialTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<TemplateComponents>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    /// Lists the account's templates, with channel types lowercased.
    pub async fn list_templates(&self) -> Result<Vec<Template>, Error> {
        let templates: Vec<Template> = self.execute(self.get(TEMPLATES)).await?;
        Ok(templates
            .into_iter()
            .map(Template::lowercase_channels)
            .collect())
    }

    /// Fetches one template, with channel types lowercased.
    pub async fn get_template(&self, id: &str) -> Result<Template, Error> {
        let template: Template = self
            .execute(self.get(&format!("{TEMPLATES}/{id}")))
            .await?;
        Ok(template.lowercase_channels())
    }

    /// Submits a template for approval.
    ///
    /// The platform validates required fields; a missing one comes back as a
    /// `400` [`Error::Request`] whose body names it.
    pub async fn create_template(&self, template: &Template) -> Result<Template, Error> {
        self.execute(self.post(TEMPLATES).json(template)).await
    }

    pub async fn update_template(
        &self,
        id: &str,
        changes: &PartialTemplate,
    ) -> Result<Template, Error> {
        self.execute(self.patch(&format!("{TEMPLATES}/{id}")).json(changes))
            .await
    }

    pub async fn delete_template(&self, id: &str) -> Result<(), Error> {
        self.execute_empty(self.delete(&format!("{TEMPLATES}/{id}")))
            .await
    }
}

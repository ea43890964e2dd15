//! Reports
//!
//! Read-only aggregate data about flows and messages. Dates are passed
//! through as given (`YYYY-MM-DD`); the platform validates them.
//!
//! # Example
//! ```rust,no_run
//! # async fn example(client: zenvia::Client) -> Result<(), zenvia::Error> {
//! let reports = client.reports();
//!
//! for entry in reports.messages("2020-01-10", "2020-01-11").await? {
//!     println!("{}: {} messages", entry.channel, entry.total);
//! }
//! # Ok(()) }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{client::Client, error::Error};

const FLOW_ENTRIES: &str = "/v1/reports/flow/entries";
const MESSAGE_ENTRIES: &str = "/v1/reports/message/entries";

/// A flow session summary.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FlowReportEntry {
    pub session_id: String,
    pub flow_id: String,
    pub first_event_timestamp: String,
    pub last_event_timestamp: String,
    /// Flow variables captured during the session.
    #[serde(default)]
    pub variables: Map<String, Value>,
}

/// Message totals for one channel and message type.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageReportEntry {
    pub channel: String,
    /// `message` or `notification`.
    #[serde(rename = "type")]
    pub kind: String,
    pub direction_in_total: u64,
    pub direction_out_total: u64,
    pub total: u64,
}

/// Access to the report endpoints, obtained through [`Client::reports`].
#[derive(Debug)]
pub struct ReportManager<'c> {
    client: &'c Client,
}

impl ReportManager<'_> {
    /// Flow sessions from `start_date` on.
    pub async fn flow(&self, start_date: &str) -> Result<Vec<FlowReportEntry>, Error> {
        let request = self
            .client
            .get(FLOW_ENTRIES)
            .query(&[("startDate", start_date)]);
        self.client.execute(request).await
    }

    /// Message totals between `start_date` and `end_date`.
    pub async fn messages(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<MessageReportEntry>, Error> {
        let request = self
            .client
            .get(MESSAGE_ENTRIES)
            .query(&[("startDate", start_date), ("endDate", end_date)]);
        self.client.execute(request).await
    }
}

impl Client {
    pub fn reports(&self) -> ReportManager<'_> {
        ReportManager { client: self }
    }
}

#![deny(clippy::future_not_send)]
#![deny(clippy::large_enum_variant)]

//! # zenvia
//!
//! A Rust SDK for the Zenvia messaging platform: send messages over SMS, RCS,
//! Facebook Messenger and WhatsApp, manage subscriptions and templates, read
//! reports, submit message batches, and receive events with a built-in
//! webhook listener.
//!
//! ## Features
//!
//! - **Channels**: every channel accepts its own set of content kinds. Sends
//!   are checked against that set before any request is made.
//! - **Client API**: a builder for the token, base URL, timeout and per-channel
//!   content policy.
//! - **Webhook**: a single-route listener that parses `MESSAGE` and
//!   `MESSAGE_STATUS` events, hands them to async callbacks and can register
//!   its own subscriptions.
//! - **REST resources**: subscriptions, templates, flow and message reports,
//!   multipart message batches.
//!
//! ## Examples
//!
//! ### Send a text message
//! ```rust,no_run
//! use zenvia::{Client, channel::Channel, message::Content};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new("YOUR_API_TOKEN")?;
//!
//! let response = client
//!     .channel(Channel::Sms)
//!     .send_message("sender-id", "5511999999999", [Content::text("Hello from Rust!")])?
//!     .await?;
//!
//! println!("sent: {}", response["id"]);
//! # Ok(()) }
//! ```
//!
//! ### Content that a channel does not support
//! ```rust
//! use zenvia::{Client, channel::Channel, message::Content};
//!
//! let client = Client::new("YOUR_API_TOKEN").unwrap();
//! let err = client
//!     .channel(Channel::Sms)
//!     .send_message("FROM", "TO", [Content::template("template-id")])
//!     .err()
//!     .unwrap();
//!
//! assert_eq!(err.to_string(), "Content of type template is not supported in SMS channel");
//! ```
//!
//! ### Receive events
//! ```rust,no_run
//! use zenvia::{Client, channel::Channel, server::Webhook};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut webhook = Webhook::builder()
//!     .message_event_handler(|event| async move {
//!         println!("message from {}", event.message.from);
//!     })
//!     .client(Client::new("YOUR_API_TOKEN")?)
//!     .url("https://my-app.example.com/")
//!     .channel(Channel::Whatsapp)
//!     .build();
//!
//! webhook.init().await?;
//! # Ok(()) }
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]. It never installs a subscriber; wire
//! one up in your application to see request and webhook activity.

#[macro_use]
mod rest;

pub mod batch;
pub mod channel;
pub mod client;
pub mod error;
pub mod message;
pub mod report;
pub mod server;
pub mod subscription;
pub mod template;

pub use channel::Channel;
pub use client::Client;
pub use error::Error;
pub use message::Content;
pub use server::Webhook;

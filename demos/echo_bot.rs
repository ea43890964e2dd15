//! # WhatsApp Echo Bot
//!
//! Answers every WhatsApp message with the text it contained.
//!
//! The webhook registers its own `MESSAGE` subscription on startup, so the
//! only setup is a public URL that reaches this process.
//!
//! ```sh
//! ZENVIA_API_TOKEN=... WEBHOOK_URL=https://my-webhook.company.com \
//!     cargo run --example echo_bot
//! ```

use std::env;

use zenvia::{
    channel::Channel,
    message::{Content, MessageDirection},
    server::Webhook,
    Client,
};

/// Settings read from the environment.
#[derive(Debug)]
struct Config {
    api_token: String,
    webhook_url: String,
    port: u16,
}

impl Config {
    fn load() -> Result<Config, Box<dyn std::error::Error>> {
        Ok(Config {
            api_token: env::var("ZENVIA_API_TOKEN")
                .map_err(|_| "Please set the `ZENVIA_API_TOKEN` env-var")?,
            webhook_url: env::var("WEBHOOK_URL")
                .map_err(|_| "Please set the `WEBHOOK_URL` env-var")?,
            port: env::var("PORT")
                .ok()
                .map(|port| port.parse())
                .transpose()?
                .unwrap_or(3000),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let client = Client::new(config.api_token)?;
    let whatsapp = client.channel(Channel::Whatsapp);

    let mut webhook = Webhook::builder()
        .port(config.port)
        .message_event_handler(move |event| {
            let whatsapp = whatsapp.clone();
            async move {
                // Reply from the number that was written to
                let sender = event.message.to;
                let recipient = event.message.from;
                let contents: Vec<Content> = event
                    .message
                    .contents
                    .into_iter()
                    .filter(|content| matches!(content, Content::Text(_)))
                    .collect();
                if contents.is_empty() {
                    return;
                }

                let sent = match whatsapp.send_message(sender, recipient, contents) {
                    Ok(request) => request.await,
                    Err(err) => Err(err),
                };
                if let Err(err) = sent {
                    eprintln!("could not echo message: {err}");
                }
            }
        })
        .client(client)
        .url(config.webhook_url)
        .channel(Channel::Whatsapp)
        .direction(MessageDirection::In)
        .on_listening(|addr| println!("echo bot listening on {addr}"))
        .on_error(|err| eprintln!("webhook error: {err}"))
        .build();

    webhook.init().await?;
    tokio::signal::ctrl_c().await?;
    webhook.close().await;
    Ok(())
}

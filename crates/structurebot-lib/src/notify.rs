//! Slack incoming-webhook notifications.

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::esi::build_client;

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
}

/// Posts findings to a Slack incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    channel: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>, channel: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            webhook_url: webhook_url.into(),
            channel,
        })
    }

    /// Send all messages as a single post, separated by blank lines.
    ///
    /// Nothing is sent when there are no messages.
    pub fn notify(&self, messages: &[String]) -> Result<()> {
        if messages.is_empty() {
            debug!("no messages to send");
            return Ok(());
        }

        let payload = SlackMessage {
            text: messages.join("\n\n"),
            channel: self.channel.as_deref(),
        };
        let response = self.client.post(&self.webhook_url).json(&payload).send()?;
        response.error_for_status().map_err(Error::Http)?;

        info!(count = messages.len(), channel = ?self.channel, "posted notification");
        Ok(())
    }
}

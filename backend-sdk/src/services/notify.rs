//! Notification sink selection

use async_trait::async_trait;
use tracing::warn;

use shared_types::config::SlackConfig;
use shared_types::{Attachment, Notification, Setting};

use crate::core::NotificationSink;
use crate::error::Result;
use crate::services::common::HttpSettings;
use crate::services::slack::SlackClient;

/// Configured notification channel, or nothing
pub enum Notifier {
    Disabled,
    Slack(SlackClient),
}

impl Notifier {
    pub fn from_setting(setting: &Setting<SlackConfig>, settings: &HttpSettings) -> Result<Self> {
        match setting.enabled() {
            Some(config) => Ok(Notifier::Slack(SlackClient::new(config.clone(), settings)?)),
            None => Ok(Notifier::Disabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Notifier::Disabled)
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    fn name(&self) -> &str {
        match self {
            Notifier::Disabled => "disabled",
            Notifier::Slack(slack) => NotificationSink::name(slack),
        }
    }

    async fn send_message(&self, notification: &Notification) -> Result<()> {
        match self {
            Notifier::Disabled => {
                warn!(header = %notification.header, "skipping notification (no notification channel configured)");
                Ok(())
            }
            Notifier::Slack(slack) => slack.send_message(notification).await,
        }
    }

    async fn send_file_attachment(&self, notification: &Notification, attachment: &Attachment) -> Result<()> {
        match self {
            Notifier::Disabled => {
                warn!(
                    header = %notification.header,
                    file = %attachment.filename,
                    "skipping notification with attachment (no notification channel configured)"
                );
                Ok(())
            }
            Notifier::Slack(slack) => slack.send_file_attachment(notification, attachment).await,
        }
    }
}

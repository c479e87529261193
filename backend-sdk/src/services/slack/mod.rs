//! Slack Web API client implementation
//!
//! Messages go through `chat.postMessage`. Messages with a file use the
//! external upload flow so the blocks and the file arrive as one post.

mod models;
pub use models::*;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Serialize;
use tracing::{debug, info};

use shared_types::config::SlackConfig;
use shared_types::{Attachment, Notification};

use crate::core::{NotificationSink, ServiceClient};
use crate::error::mapping::map_slack_error;
use crate::error::{ErrorContext, Result, ServiceError};
use crate::resilience::RetryExecutor;
use crate::services::common::{build_http_client, parse_error_response, transport_error, HttpSettings, UserAgent};

const SERVICE: &str = "slack";

/// Slack bot client posting to a single channel
pub struct SlackClient {
    http_client: Client,
    config: SlackConfig,
    retry: RetryExecutor,
}

impl SlackClient {
    pub fn new(config: SlackConfig, settings: &HttpSettings) -> Result<Self> {
        let http_client = build_http_client(Some(UserAgent::for_client(SERVICE)), Some(settings.timeout))?;

        Ok(Self {
            http_client,
            config,
            retry: RetryExecutor::new(settings.retry.clone()),
        })
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// `chat.postMessage`
    pub async fn post_message(&self, request: &PostMessageRequest) -> Result<ApiResponse> {
        self.retry
            .execute("slack.chat.postMessage", || self.post_json("chat.postMessage", request))
            .await
    }

    /// `files.getUploadURLExternal`; returns the upload URL and file id
    pub async fn get_upload_url(&self, filename: &str, length: usize) -> Result<(String, String)> {
        let response = self
            .retry
            .execute("slack.files.getUploadURLExternal", || async {
                let url = self.method_url("files.getUploadURLExternal");
                let response = self
                    .http_client
                    .post(&url)
                    .bearer_auth(&self.config.bot_token)
                    .form(&[("filename", filename.to_string()), ("length", length.to_string())])
                    .send()
                    .await
                    .map_err(|e| transport_error(SERVICE, &url, e))?;
                Self::read_api_response(&url, response).await
            })
            .await?;

        match (response.upload_url, response.file_id) {
            (Some(upload_url), Some(file_id)) => Ok((upload_url, file_id)),
            _ => Err(ServiceError::parsing("files.getUploadURLExternal returned no upload_url or file_id")
                .with_context(ErrorContext::for_service(SERVICE))),
        }
    }

    /// Send the file bytes to the URL handed out by `files.getUploadURLExternal`
    pub async fn upload_file(&self, upload_url: &str, filename: &str, content: &str) -> Result<()> {
        self.retry
            .execute("slack.upload", || async {
                let part = multipart::Part::text(content.to_string())
                    .file_name(filename.to_string())
                    .mime_str("text/plain")
                    .map_err(|e| ServiceError::internal(format!("Invalid upload mime type: {}", e)))?;
                let form = multipart::Form::new().part("file", part);

                let response = self
                    .http_client
                    .post(upload_url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| transport_error(SERVICE, upload_url, e))?;
                if !response.status().is_success() {
                    return Err(parse_error_response(SERVICE, upload_url, response).await);
                }
                Ok(())
            })
            .await
    }

    /// `files.completeUploadExternal`
    pub async fn complete_upload(&self, request: &CompleteUploadRequest) -> Result<ApiResponse> {
        self.retry
            .execute("slack.files.completeUploadExternal", || {
                self.post_json("files.completeUploadExternal", request)
            })
            .await
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_url, method)
    }

    async fn post_json<T: Serialize + Sync>(&self, method: &str, body: &T) -> Result<ApiResponse> {
        let url = self.method_url(method);
        debug!(method, "calling Slack API");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.bot_token)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &url, e))?;
        Self::read_api_response(&url, response).await
    }

    async fn read_api_response(url: &str, response: reqwest::Response) -> Result<ApiResponse> {
        if !response.status().is_success() {
            return Err(parse_error_response(SERVICE, url, response).await);
        }
        let body = response
            .json::<ApiResponse>()
            .await
            .map_err(|e| ServiceError::parsing(format!("Failed to parse Slack response: {}", e)))?;
        if !body.ok {
            return Err(map_slack_error(body.error.as_deref().unwrap_or("unknown_error")));
        }
        Ok(body)
    }
}

impl ServiceClient for SlackClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn base_url(&self) -> &str {
        &self.config.api_url
    }
}

#[async_trait]
impl NotificationSink for SlackClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn send_message(&self, notification: &Notification) -> Result<()> {
        let request = PostMessageRequest {
            channel: self.config.channel.clone(),
            text: notification.fallback_text.clone(),
            blocks: blocks_for(notification),
        };
        let response = self.post_message(&request).await?;
        info!(channel = %self.config.channel, ts = ?response.ts, "Slack message sent");
        Ok(())
    }

    async fn send_file_attachment(&self, notification: &Notification, attachment: &Attachment) -> Result<()> {
        let (upload_url, file_id) = self
            .get_upload_url(&attachment.filename, attachment.content.len())
            .await?;
        self.upload_file(&upload_url, &attachment.filename, &attachment.content)
            .await?;

        let request = CompleteUploadRequest {
            files: vec![CompleteUploadFile {
                id: file_id,
                title: attachment.title.clone(),
            }],
            channel_id: self.config.channel.clone(),
            initial_comment: None,
            blocks: blocks_for(notification),
        };
        self.complete_upload(&request).await?;
        info!(channel = %self.config.channel, file = %attachment.filename, "Slack message sent with attachment");
        Ok(())
    }
}

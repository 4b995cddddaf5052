//! Lark/Feishu Open API client. Implements [`MessagingGateway`] and
//! [`AuthorDirectory`] over HTTPS.
//!
//! Authenticates with an app-level tenant access token which is cached until
//! shortly before it expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cards::ForwardCard;
use crate::channels::gateway::{AuthorDirectory, MessagingGateway};
use crate::config::LarkConfig;
use crate::error::{ChannelError, LookupError};

const CHANNEL_NAME: &str = "lark";

/// Refresh the tenant token this long before Lark expires it.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Standard Lark response envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

/// The token endpoint returns its fields at the top level, not under `data`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Deserialize)]
struct UserData {
    user: Option<LarkUser>,
}

#[derive(Debug, Deserialize)]
struct LarkUser {
    #[serde(default)]
    name: String,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Lark Open API client.
pub struct LarkClient {
    config: LarkConfig,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl LarkClient {
    pub fn new(config: LarkConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Current tenant access token, fetching a fresh one when needed.
    async fn tenant_token(&self) -> Result<String, ChannelError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let body = serde_json::json!({
            "app_id": self.config.app_id,
            "app_secret": self.config.app_secret.expose_secret(),
        });
        let resp = self
            .client
            .post(self.api_url("/open-apis/auth/v3/tenant_access_token/internal"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::AuthFailed {
                name: CHANNEL_NAME.into(),
                reason: e.to_string(),
            })?;

        let token: TokenResponse = resp.json().await.map_err(|e| ChannelError::AuthFailed {
            name: CHANNEL_NAME.into(),
            reason: format!("invalid token response: {e}"),
        })?;
        if token.code != 0 || token.tenant_access_token.is_empty() {
            return Err(ChannelError::AuthFailed {
                name: CHANNEL_NAME.into(),
                reason: format!("code {}: {}", token.code, token.msg),
            });
        }

        let ttl = Duration::from_secs(token.expire).saturating_sub(TOKEN_REFRESH_MARGIN);
        debug!(expires_in = token.expire, "Fetched tenant access token");
        *cached = Some(CachedToken {
            value: token.tenant_access_token.clone(),
            refresh_at: Instant::now() + ttl,
        });
        Ok(token.tenant_access_token)
    }

    /// Send an authenticated request and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ChannelError> {
        let token = self.tenant_token().await?;
        let resp = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;
        parse_envelope(status, &text)
    }
}

/// Interpret a Lark API response body. A non-zero `code` is a failure even
/// on HTTP 200.
fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Option<T>, ChannelError> {
    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) if envelope.code == 0 && status.is_success() => Ok(envelope.data),
        Ok(envelope) => Err(ChannelError::Api {
            name: CHANNEL_NAME.into(),
            code: envelope.code,
            msg: envelope.msg,
        }),
        Err(_) if !status.is_success() => Err(ChannelError::Http(format!(
            "status {status}: {}",
            body.chars().take(200).collect::<String>()
        ))),
        Err(e) => Err(ChannelError::InvalidMessage(format!(
            "unexpected response body: {e}"
        ))),
    }
}

/// Body for a plain-text reply. `content` is itself a JSON string.
fn text_message_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "msg_type": "text",
        "content": serde_json::json!({ "text": text }).to_string(),
    })
}

/// Body for an interactive card sent to a chat.
fn card_message_body(chat_id: &str, card: &ForwardCard) -> Result<serde_json::Value, ChannelError> {
    let content = serde_json::to_string(card)
        .map_err(|e| ChannelError::InvalidMessage(format!("card serialization: {e}")))?;
    Ok(serde_json::json!({
        "receive_id": chat_id,
        "msg_type": "interactive",
        "content": content,
    }))
}

#[async_trait]
impl MessagingGateway for LarkClient {
    async fn reply_text(&self, message_id: &str, text: &str) -> Result<(), ChannelError> {
        let request = self
            .client
            .post(self.api_url(&format!("/open-apis/im/v1/messages/{message_id}/reply")))
            .json(&text_message_body(text));
        self.call::<serde_json::Value>(request).await?;
        debug!(message_id, "Replied to message");
        Ok(())
    }

    async fn send_card(&self, chat_id: &str, card: &ForwardCard) -> Result<(), ChannelError> {
        let request = self
            .client
            .post(self.api_url("/open-apis/im/v1/messages"))
            .query(&[("receive_id_type", "chat_id")])
            .json(&card_message_body(chat_id, card)?);
        self.call::<serde_json::Value>(request).await?;
        debug!(chat_id, "Sent card message");
        Ok(())
    }
}

#[async_trait]
impl AuthorDirectory for LarkClient {
    async fn lookup(&self, user_id: &str) -> Result<String, LookupError> {
        let request = self
            .client
            .get(self.api_url(&format!("/open-apis/contact/v3/users/{user_id}")))
            .query(&[("user_id_type", "open_id")]);

        let data: Option<UserData> = self.call(request).await.map_err(|e| {
            warn!(user_id, error = %e, "Contact API call failed");
            LookupError::Failed {
                user_id: user_id.into(),
                reason: e.to_string(),
            }
        })?;

        match data.and_then(|d| d.user) {
            Some(user) if !user.name.is_empty() => Ok(user.name),
            _ => Err(LookupError::MissingName {
                user_id: user_id.into(),
            }),
        }
    }
}

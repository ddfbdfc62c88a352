//! Email transports.
//!
//! `HttpRelaySender` posts each message to an HTTP mail relay. `ureq` is
//! synchronous, so the request runs inside `tokio::task::spawn_blocking`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::NotifyError;

/// A fully rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    /// `"html"` or `"text"`.
    pub format: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Posts `{from, to, subject, body, format}` as JSON to a relay endpoint.
pub struct HttpRelaySender {
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpRelaySender {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            token,
            timeout,
        }
    }
}

#[async_trait]
impl EmailSender for HttpRelaySender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let url = self.url.clone();
        let token = self.token.clone();
        let timeout = self.timeout;
        let payload = message.clone();

        tokio::task::spawn_blocking(move || {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build()
                .into();
            let mut request = agent.post(&url);
            if let Some(ref token) = token {
                request = request.header("Authorization", &format!("Bearer {token}"));
            }
            request.send_json(&payload).map_err(|e| NotifyError::Send {
                transport: "relay".to_string(),
                message: e.to_string(),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| NotifyError::Send {
            transport: "relay".to_string(),
            message: format!("task join error: {e}"),
        })?
    }
}

/// Logs messages instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogSender;

#[async_trait]
impl EmailSender for LogSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "email (log transport, not delivered)"
        );
        Ok(())
    }
}

/// Records every message it is asked to send. Can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MemorySender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemorySender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for MemorySender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        if *self.failing.lock().await {
            return Err(NotifyError::Send {
                transport: "memory".to_string(),
                message: "configured to fail".to_string(),
            });
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

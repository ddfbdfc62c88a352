use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::attributes::MessageAttributes;
use crate::error::NotifyError;
use crate::sender::{EmailMessage, EmailSender};
use crate::template::{render, ProposalEvent, TemplateSource};

/// Sends the email for each proposal lifecycle event.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn proposal_submitted(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError>;

    async fn proposal_withdrawn(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError>;

    async fn proposal_accepted(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError>;

    async fn proposal_rejected(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError>;
}

/// Drop blank addresses and collapse duplicates, keeping first-seen order.
pub fn normalize_recipients<I, S>(addresses: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for address in addresses {
        let address = address.as_ref().trim();
        if address.is_empty() || out.iter().any(|a| a.eq_ignore_ascii_case(address)) {
            continue;
        }
        out.push(address.to_string());
    }
    out
}

/// Loads the event's template, renders it, and hands it to a transport.
pub struct EmailNotifier {
    from: String,
    templates: Arc<dyn TemplateSource>,
    transport: Arc<dyn EmailSender>,
}

impl EmailNotifier {
    pub fn new(
        from: impl Into<String>,
        templates: Arc<dyn TemplateSource>,
        transport: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            from: from.into(),
            templates,
            transport,
        }
    }

    async fn notify(
        &self,
        event: ProposalEvent,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        info!(%event, attributes = %attributes, recipients = ?recipients, "sending notification");
        if recipients.is_empty() {
            warn!(%event, "notification has no recipients");
            return Err(NotifyError::NoRecipients {
                event: event.to_string(),
            });
        }

        let template = self.templates.load(event).await?;
        let message = EmailMessage {
            from: self.from.clone(),
            to: recipients.to_vec(),
            subject: event.subject().to_string(),
            body: render(&template, attributes),
            format: "html".to_string(),
        };
        self.transport.send(&message).await
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn proposal_submitted(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        self.notify(ProposalEvent::Submitted, attributes, recipients)
            .await
    }

    async fn proposal_withdrawn(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        self.notify(ProposalEvent::Withdrawn, attributes, recipients)
            .await
    }

    async fn proposal_accepted(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        self.notify(ProposalEvent::Accepted, attributes, recipients)
            .await
    }

    async fn proposal_rejected(
        &self,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotifyError> {
        self.notify(ProposalEvent::Rejected, attributes, recipients)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_blanks_and_duplicates() {
        let out = normalize_recipients([
            "a@example.org",
            "",
            "  ",
            "b@example.org",
            "A@example.org",
            " b@example.org ",
        ]);
        assert_eq!(out, vec!["a@example.org", "b@example.org"]);
    }
}

//! Email templates: `${key}` substitution and where template text comes from.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::attributes::MessageAttributes;
use crate::error::NotifyError;

/// The four lifecycle events that produce an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProposalEvent {
    Submitted,
    Withdrawn,
    Accepted,
    Rejected,
}

impl ProposalEvent {
    pub const ALL: [ProposalEvent; 4] = [
        ProposalEvent::Submitted,
        ProposalEvent::Withdrawn,
        ProposalEvent::Accepted,
        ProposalEvent::Rejected,
    ];

    pub fn subject(&self) -> &'static str {
        match self {
            ProposalEvent::Submitted => "A Dataset Proposal has been submitted",
            ProposalEvent::Withdrawn => "A Dataset Proposal has been withdrawn",
            ProposalEvent::Accepted => "Your Dataset Proposal has been accepted",
            ProposalEvent::Rejected => "Your Dataset Proposal has been rejected",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalEvent::Submitted => "submitted",
            ProposalEvent::Withdrawn => "withdrawn",
            ProposalEvent::Accepted => "accepted",
            ProposalEvent::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProposalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace every `${key}` in `template` with the attribute value for `key`.
///
/// Placeholders without a matching attribute, and unterminated `${`, are
/// left verbatim. Substituted values are not scanned again.
pub fn render(template: &str, attributes: &MessageAttributes) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match attributes.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Where to find the template object for each event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateKeys {
    pub bucket: String,
    pub submitted: String,
    pub withdrawn: String,
    pub accepted: String,
    pub rejected: String,
}

impl TemplateKeys {
    pub fn key(&self, event: ProposalEvent) -> &str {
        match event {
            ProposalEvent::Submitted => &self.submitted,
            ProposalEvent::Withdrawn => &self.withdrawn,
            ProposalEvent::Accepted => &self.accepted,
            ProposalEvent::Rejected => &self.rejected,
        }
    }
}

/// Loads the raw template text for an event.
#[async_trait]
pub trait TemplateSource: Send + Sync + 'static {
    async fn load(&self, event: ProposalEvent) -> Result<String, NotifyError>;
}

/// Templates stored as files laid out like object storage:
/// `<root>/<bucket>/<key>`.
pub struct BlobDirTemplateSource {
    root: PathBuf,
    keys: TemplateKeys,
}

impl BlobDirTemplateSource {
    pub fn new(root: impl Into<PathBuf>, keys: TemplateKeys) -> Self {
        Self {
            root: root.into(),
            keys,
        }
    }
}

#[async_trait]
impl TemplateSource for BlobDirTemplateSource {
    async fn load(&self, event: ProposalEvent) -> Result<String, NotifyError> {
        let key = self.keys.key(event);
        let path = self.root.join(&self.keys.bucket).join(key);
        debug!(path = %path.display(), %event, "loading email template");

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => NotifyError::TemplateNotFound {
                    bucket: self.keys.bucket.clone(),
                    key: key.to_string(),
                },
                _ => NotifyError::TemplateRead {
                    bucket: self.keys.bucket.clone(),
                    key: key.to_string(),
                    message: e.to_string(),
                },
            })
    }
}

/// Templates held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateSource {
    templates: BTreeMap<ProposalEvent, String>,
}

impl StaticTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default templates compiled into the binary.
    pub fn builtin() -> Self {
        Self::new()
            .with(
                ProposalEvent::Submitted,
                include_str!("../templates/proposal_submitted.html"),
            )
            .with(
                ProposalEvent::Withdrawn,
                include_str!("../templates/proposal_withdrawn.html"),
            )
            .with(
                ProposalEvent::Accepted,
                include_str!("../templates/proposal_accepted.html"),
            )
            .with(
                ProposalEvent::Rejected,
                include_str!("../templates/proposal_rejected.html"),
            )
    }

    pub fn with(mut self, event: ProposalEvent, template: impl Into<String>) -> Self {
        self.templates.insert(event, template.into());
        self
    }
}

#[async_trait]
impl TemplateSource for StaticTemplateSource {
    async fn load(&self, event: ProposalEvent) -> Result<String, NotifyError> {
        self.templates
            .get(&event)
            .cloned()
            .ok_or_else(|| NotifyError::TemplateNotFound {
                bucket: "builtin".to_string(),
                key: event.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> MessageAttributes {
        [
            ("AuthorName", "Ada Lovelace"),
            ("ProposalTitle", "Study A"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = render("${AuthorName} wrote ${ProposalTitle}; thanks ${AuthorName}", &attrs());
        assert_eq!(out, "Ada Lovelace wrote Study A; thanks Ada Lovelace");
    }

    #[test]
    fn unknown_placeholder_left_verbatim() {
        let out = render("Hello ${AuthorName}, see ${WorkspaceName}", &attrs());
        assert_eq!(out, "Hello Ada Lovelace, see ${WorkspaceName}");
    }

    #[test]
    fn unterminated_placeholder_left_verbatim() {
        assert_eq!(render("cost ${AuthorName", &attrs()), "cost ${AuthorName");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let attrs: MessageAttributes = [("A", "${B}"), ("B", "oops")].into_iter().collect();
        assert_eq!(render("${A}", &attrs), "${B}");
    }

    #[test]
    fn bare_dollar_and_braces_untouched() {
        assert_eq!(render("$5 {x} $", &attrs()), "$5 {x} $");
    }

    #[tokio::test]
    async fn builtin_has_every_event() {
        let source = StaticTemplateSource::builtin();
        for event in ProposalEvent::ALL {
            let template = source.load(event).await.unwrap();
            assert!(template.contains("${ProposalTitle}"), "{event}");
        }
    }
}

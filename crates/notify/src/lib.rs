//! Email notifications for dataset proposal lifecycle events.
//!
//! A [`Notifier`] turns an event, a flat attribute map, and a recipient list
//! into an email: it loads the event's template from a [`TemplateSource`],
//! substitutes `${key}` placeholders, and sends through an [`EmailSender`].

mod attributes;
mod error;
mod notifier;
mod sender;
mod template;

pub use attributes::MessageAttributes;
pub use error::NotifyError;
pub use notifier::{normalize_recipients, EmailNotifier, Notifier};
pub use sender::{EmailMessage, EmailSender, HttpRelaySender, LogSender, MemorySender};
pub use template::{
    render, BlobDirTemplateSource, ProposalEvent, StaticTemplateSource, TemplateKeys,
    TemplateSource,
};

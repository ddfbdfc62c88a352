use std::fmt;

/// One step of the dataset provisioning performed when a proposal is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionStep {
    ResolveUser,
    ResolveOrganization,
    AddGuestMembership,
    ResolveDatasetStatus,
    ResolveDataUseAgreement,
    CreateDataset,
    AddContributor,
    AttachContributor,
    AddOwner,
}

impl ProvisionStep {
    /// Every step, in execution order.
    pub const ORDER: [ProvisionStep; 9] = [
        ProvisionStep::ResolveUser,
        ProvisionStep::ResolveOrganization,
        ProvisionStep::AddGuestMembership,
        ProvisionStep::ResolveDatasetStatus,
        ProvisionStep::ResolveDataUseAgreement,
        ProvisionStep::CreateDataset,
        ProvisionStep::AddContributor,
        ProvisionStep::AttachContributor,
        ProvisionStep::AddOwner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionStep::ResolveUser => "resolve user",
            ProvisionStep::ResolveOrganization => "resolve organization",
            ProvisionStep::AddGuestMembership => "add guest membership",
            ProvisionStep::ResolveDatasetStatus => "resolve default dataset status",
            ProvisionStep::ResolveDataUseAgreement => "resolve default data use agreement",
            ProvisionStep::CreateDataset => "create dataset",
            ProvisionStep::AddContributor => "add contributor",
            ProvisionStep::AttachContributor => "attach contributor to dataset",
            ProvisionStep::AddOwner => "add dataset owner",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a relational store implementation.
#[derive(Debug, thiserror::Error)]
pub enum RelationalError {
    #[error("user {user_id} not found")]
    UserNotFound { user_id: i64 },

    /// No organization matches the given id, node id, or slug.
    #[error("organization not found: {key}")]
    OrganizationNotFound { key: String },

    /// Provisioning aborted at `step`; nothing it wrote was kept.
    #[error("dataset provisioning failed at step '{step}': {message}")]
    StepFailed { step: ProvisionStep, message: String },

    #[error("relational backend error: {0}")]
    Backend(String),
}

impl RelationalError {
    pub(crate) fn step(step: ProvisionStep, message: impl Into<String>) -> Self {
        RelationalError::StepFailed {
            step,
            message: message.into(),
        }
    }

    /// The provisioning step that failed, if this error came from one.
    pub fn failed_step(&self) -> Option<ProvisionStep> {
        match self {
            RelationalError::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

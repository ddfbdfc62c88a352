//! Builds the [`PublishingService`] and its backends from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use publishing_notify::{
    BlobDirTemplateSource, EmailNotifier, EmailSender, HttpRelaySender, LogSender,
    StaticTemplateSource, TemplateKeys, TemplateSource,
};
use publishing_relational::{MemoryDirectory, RelationalStore};
use publishing_service::{PublishingService, ServiceConfig, SignedUrlSigner};
use publishing_storage::{MemoryStore, PublishingStore};
use tracing::{info, warn};

use crate::config::{DocumentBackend, EmailTransport, RelationalBackend, ServeConfig};
use crate::seed::Seed;

pub async fn build_service(config: &ServeConfig) -> anyhow::Result<PublishingService> {
    let seed = match &config.seed {
        Some(path) => {
            info!(path = %path.display(), "loading seed");
            Seed::load(path)?
        }
        None => Seed::default(),
    };

    let store = document_store(config, &seed).await?;
    let directory = relational_store(config, &seed).await?;
    let notifier = Arc::new(EmailNotifier::new(
        config.notifications.email_from.clone(),
        template_source(config),
        email_sender(config)?,
    ));
    let signer = Arc::new(SignedUrlSigner::new(
        config.files.file_base_url.clone(),
        config
            .files
            .url_signing_secret
            .clone()
            .context("URL_SIGNING_SECRET is required")?,
    ));

    let service_config = ServiceConfig {
        app_url: config.app_url(),
        overview_url_expiry: Duration::from_secs(config.files.overview_url_expiry_secs),
        logo_url_expiry: Duration::from_secs(config.files.logo_url_expiry_secs),
        notification_timeout: Duration::from_secs(config.notifications.notification_timeout_secs),
    };
    Ok(PublishingService::new(
        store,
        directory,
        notifier,
        signer,
        service_config,
    ))
}

async fn document_store(
    config: &ServeConfig,
    seed: &Seed,
) -> anyhow::Result<Arc<dyn PublishingStore>> {
    match config.documents.document_store {
        DocumentBackend::Memory => {
            info!(
                repositories = seed.documents.repositories.len(),
                questions = seed.documents.questions.len(),
                "using in-memory document store"
            );
            Ok(Arc::new(MemoryStore::with_seed(seed.documents.clone())))
        }
        #[cfg(feature = "mongo")]
        DocumentBackend::Mongo => {
            let mongo = publishing_storage::MongoConfig::new(
                config.documents.mongodb_uri.clone(),
                config.documents.mongodb_db.clone(),
            );
            let store = publishing_storage::MongoStore::connect(&mongo)
                .await
                .context("failed to connect to MongoDB")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo"))]
        DocumentBackend::Mongo => anyhow::bail!("built without the `mongo` feature"),
    }
}

async fn relational_store(
    config: &ServeConfig,
    seed: &Seed,
) -> anyhow::Result<Arc<dyn RelationalStore>> {
    let args = &config.relational;
    match args.relational_store {
        RelationalBackend::Memory => {
            let mut directory = seed.directory.clone();
            if let Some(id) = args.publishing_organization_id {
                directory.publishing_organization_id = id;
            }
            if directory.welcome_workspace_slug.is_empty() {
                directory.welcome_workspace_slug = args.welcome_workspace_slug.clone();
            }
            info!(
                users = directory.users.len(),
                organizations = directory.organizations.len(),
                "using in-memory relational store"
            );
            Ok(Arc::new(MemoryDirectory::new(directory)))
        }
        #[cfg(feature = "postgres")]
        RelationalBackend::Postgres => {
            let pg = publishing_relational::PostgresConfig {
                url: args
                    .database_url
                    .clone()
                    .context("DATABASE_URL is required")?,
                max_connections: args.database_max_connections,
                publishing_organization_id: args
                    .publishing_organization_id
                    .context("PUBLISHING_ORGANIZATION_ID is required")?,
                welcome_workspace_slug: args.welcome_workspace_slug.clone(),
            };
            let store = publishing_relational::PostgresStore::connect(&pg)
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        RelationalBackend::Postgres => anyhow::bail!("built without the `postgres` feature"),
    }
}

fn template_source(config: &ServeConfig) -> Arc<dyn TemplateSource> {
    let args = &config.notifications;
    match &args.template_dir {
        Some(root) => {
            info!(root = %root.display(), bucket = %args.template_bucket, "loading email templates from directory");
            Arc::new(BlobDirTemplateSource::new(
                root.clone(),
                TemplateKeys {
                    bucket: args.template_bucket.clone(),
                    submitted: args.template_submitted.clone(),
                    withdrawn: args.template_withdrawn.clone(),
                    accepted: args.template_accepted.clone(),
                    rejected: args.template_rejected.clone(),
                },
            ))
        }
        None => Arc::new(StaticTemplateSource::builtin()),
    }
}

fn email_sender(config: &ServeConfig) -> anyhow::Result<Arc<dyn EmailSender>> {
    let args = &config.notifications;
    match args.email_transport {
        EmailTransport::Relay => {
            let url = args
                .email_relay_url
                .clone()
                .context("EMAIL_RELAY_URL is required")?;
            Ok(Arc::new(HttpRelaySender::new(
                url,
                args.email_relay_token.clone(),
                Duration::from_secs(args.notification_timeout_secs),
            )))
        }
        EmailTransport::Log => {
            warn!("email transport is log-only; notifications will not be delivered");
            Ok(Arc::new(LogSender))
        }
    }
}

//! Server configuration.
//!
//! Every flag falls back to an environment variable, and `.env` files are
//! loaded before parsing. [`ServeConfig::validate`] runs once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is required {when}")]
    Missing { name: &'static str, when: &'static str },
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelationalBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmailTransport {
    /// POST each message as JSON to an HTTP relay.
    Relay,
    /// Log each message instead of sending it.
    Log,
}

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub documents: DocumentStoreArgs,

    #[command(flatten)]
    pub relational: RelationalStoreArgs,

    #[command(flatten)]
    pub notifications: NotificationArgs,

    #[command(flatten)]
    pub files: FileUrlArgs,

    /// JSON seed for the in-memory backends
    #[arg(long, env = "PUBLISHING_SEED")]
    pub seed: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Upper bound on one request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Shared API key required on every route but /health
    #[arg(long, env = "PUBLISHING_API_KEY")]
    pub api_key: Option<String>,

    /// TLS certificate PEM file (requires --tls-key)
    #[arg(long, env = "TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// TLS private key PEM file (requires --tls-cert)
    #[arg(long, env = "TLS_KEY")]
    pub tls_key: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DocumentStoreArgs {
    #[arg(long, env = "DOCUMENT_STORE", value_enum, default_value = "mongo")]
    pub document_store: DocumentBackend,

    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    #[arg(long, env = "MONGODB_DB", default_value = "publishing")]
    pub mongodb_db: String,
}

#[derive(Args, Debug, Clone)]
pub struct RelationalStoreArgs {
    #[arg(long, env = "RELATIONAL_STORE", value_enum, default_value = "postgres")]
    pub relational_store: RelationalBackend,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub database_max_connections: u32,

    /// Organization that receives datasets for accepted proposals
    #[arg(long, env = "PUBLISHING_ORGANIZATION_ID")]
    pub publishing_organization_id: Option<i64>,

    /// Workspace linked from acceptance and rejection emails
    #[arg(long, env = "WELCOME_WORKSPACE_SLUG", default_value = "welcome")]
    pub welcome_workspace_slug: String,
}

#[derive(Args, Debug, Clone)]
pub struct NotificationArgs {
    #[arg(long, env = "EMAIL_TRANSPORT", value_enum, default_value = "relay")]
    pub email_transport: EmailTransport,

    #[arg(long, env = "EMAIL_RELAY_URL")]
    pub email_relay_url: Option<String>,

    #[arg(long, env = "EMAIL_RELAY_TOKEN")]
    pub email_relay_token: Option<String>,

    #[arg(long, env = "EMAIL_FROM", default_value = "publishing@localhost")]
    pub email_from: String,

    /// Domain of the web application; emails link to `app.<domain>`
    #[arg(long, env = "APP_DOMAIN", default_value = "localhost")]
    pub app_domain: String,

    /// Root directory holding template buckets; built-in templates when unset
    #[arg(long, env = "TEMPLATE_DIR")]
    pub template_dir: Option<PathBuf>,

    #[arg(long, env = "TEMPLATE_BUCKET", default_value = "templates")]
    pub template_bucket: String,

    #[arg(long, env = "TEMPLATE_SUBMITTED", default_value = "proposal_submitted.html")]
    pub template_submitted: String,

    #[arg(long, env = "TEMPLATE_WITHDRAWN", default_value = "proposal_withdrawn.html")]
    pub template_withdrawn: String,

    #[arg(long, env = "TEMPLATE_ACCEPTED", default_value = "proposal_accepted.html")]
    pub template_accepted: String,

    #[arg(long, env = "TEMPLATE_REJECTED", default_value = "proposal_rejected.html")]
    pub template_rejected: String,

    /// Upper bound on one notification step, in seconds
    #[arg(long, env = "NOTIFICATION_TIMEOUT_SECS", default_value_t = 10)]
    pub notification_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct FileUrlArgs {
    /// Base URL presigned file links point at
    #[arg(long, env = "FILE_BASE_URL", default_value = "http://localhost:9000")]
    pub file_base_url: String,

    #[arg(long, env = "URL_SIGNING_SECRET")]
    pub url_signing_secret: Option<String>,

    #[arg(long, env = "OVERVIEW_URL_EXPIRY_SECS", default_value_t = 12 * 60 * 60)]
    pub overview_url_expiry_secs: u64,

    #[arg(long, env = "LOGO_URL_EXPIRY_SECS", default_value_t = 60 * 60)]
    pub logo_url_expiry_secs: u64,
}

impl ServeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .files
            .url_signing_secret
            .as_deref()
            .map_or(true, str::is_empty)
        {
            return Err(ConfigError::Missing {
                name: "URL_SIGNING_SECRET",
                when: "to sign file URLs",
            });
        }

        if self.relational.relational_store == RelationalBackend::Postgres {
            if self.relational.database_url.is_none() {
                return Err(ConfigError::Missing {
                    name: "DATABASE_URL",
                    when: "when the relational store is postgres",
                });
            }
            if self.relational.publishing_organization_id.is_none() {
                return Err(ConfigError::Missing {
                    name: "PUBLISHING_ORGANIZATION_ID",
                    when: "when the relational store is postgres",
                });
            }
        }

        if self.notifications.email_transport == EmailTransport::Relay
            && self.notifications.email_relay_url.is_none()
        {
            return Err(ConfigError::Missing {
                name: "EMAIL_RELAY_URL",
                when: "when the email transport is relay",
            });
        }

        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(ConfigError::Invalid {
                name: "TLS_CERT/TLS_KEY",
                reason: "both must be provided or neither".to_string(),
            });
        }

        for (name, secs) in [
            ("REQUEST_TIMEOUT_SECS", self.server.request_timeout_secs),
            (
                "NOTIFICATION_TIMEOUT_SECS",
                self.notifications.notification_timeout_secs,
            ),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn app_url(&self) -> String {
        format!("app.{}", self.notifications.app_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: ServeConfig,
    }

    fn parse(args: &[&str]) -> ServeConfig {
        let mut argv = vec!["publishing"];
        argv.extend_from_slice(args);
        Harness::parse_from(argv).config
    }

    const DEV: &[&str] = &[
        "--document-store",
        "memory",
        "--relational-store",
        "memory",
        "--email-transport",
        "log",
        "--url-signing-secret",
        "s3cr3t",
    ];

    #[test]
    fn development_config_is_valid() {
        let config = parse(DEV);
        config.validate().unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.files.overview_url_expiry_secs, 43_200);
        assert_eq!(config.app_url(), "app.localhost");
    }

    #[test]
    fn signing_secret_is_required() {
        let config = parse(&DEV[..6]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                name: "URL_SIGNING_SECRET",
                ..
            })
        ));
    }

    #[test]
    fn postgres_needs_url_and_organization() {
        let mut args = DEV.to_vec();
        args[3] = "postgres";
        let config = parse(&args);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                name: "DATABASE_URL",
                ..
            })
        ));

        args.extend(["--database-url", "postgres://localhost/pennsieve"]);
        let config = parse(&args);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                name: "PUBLISHING_ORGANIZATION_ID",
                ..
            })
        ));
    }

    #[test]
    fn relay_needs_url() {
        let mut args = DEV.to_vec();
        args[5] = "relay";
        assert!(matches!(
            parse(&args).validate(),
            Err(ConfigError::Missing {
                name: "EMAIL_RELAY_URL",
                ..
            })
        ));
    }
}

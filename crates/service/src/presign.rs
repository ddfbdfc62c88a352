//! Time-limited URLs for files in object storage.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Produces a URL granting read access to `bucket/key` until it expires.
pub trait UrlSigner: Send + Sync + 'static {
    fn presign(&self, bucket: &str, key: &str, expires_in: Duration, now: i64) -> String;
}

/// Signs URLs as
/// `<base>/<bucket>/<key>?expires=<unix>&signature=<b64url(sha256(secret\nbucket\nkey\nexpires))>`.
#[derive(Clone)]
pub struct SignedUrlSigner {
    base_url: String,
    secret: String,
}

impl SignedUrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    /// Signature over the canonical `(bucket, key, expires)` triple.
    pub fn signature(&self, bucket: &str, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"\n");
        hasher.update(bucket.as_bytes());
        hasher.update(b"\n");
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
        hasher.update(expires.to_string().as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// True if `signature` is valid for the triple and `expires` is not past `now`.
    pub fn verify(&self, bucket: &str, key: &str, expires: i64, signature: &str, now: i64) -> bool {
        expires >= now && self.signature(bucket, key, expires) == signature
    }
}

impl UrlSigner for SignedUrlSigner {
    fn presign(&self, bucket: &str, key: &str, expires_in: Duration, now: i64) -> String {
        if bucket.is_empty() || key.is_empty() {
            return String::new();
        }
        let lifetime = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(lifetime);
        let path = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url,
            urlencoding::encode(bucket),
            path,
            expires,
            self.signature(bucket, key, expires)
        )
    }
}

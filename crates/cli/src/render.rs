//! `publishing render-template`: preview an email template.

use std::path::Path;

use anyhow::Context;
use publishing_notify::{render, MessageAttributes};

/// Parse a `KEY=VALUE` pair. The value may itself contain `=`.
pub fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

pub async fn render_file(path: &Path, attributes: Vec<(String, String)>) -> anyhow::Result<()> {
    let template = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read template {}", path.display()))?;
    let attributes: MessageAttributes = attributes.into_iter().collect();
    println!("{}", render(&template, &attributes));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value() {
        assert_eq!(
            parse_attribute("AppURL=app.example.org"),
            Ok(("AppURL".to_string(), "app.example.org".to_string()))
        );
        assert_eq!(
            parse_attribute("Query=a=b"),
            Ok(("Query".to_string(), "a=b".to_string()))
        );
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=value").is_err());
    }
}

use super::*;
use anyhow::{anyhow, Result};
use appherd_managed_process::expand_template;

/// Validate a complete settings record
pub fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.rules_path.trim().is_empty() {
        return Err(anyhow!("rules_path cannot be empty"));
    }

    validate_interval("poll_interval", settings.poll_interval)?;
    validate_interval("liveness_requery_interval", settings.liveness_requery_interval)?;

    for (extension, template) in &settings.associations {
        validate_association(extension, template)?;
    }

    Ok(())
}

fn validate_interval(name: &str, interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(anyhow!("{} must be greater than 0", name));
    }
    Ok(())
}

/// Validate one extension → template entry
fn validate_association(extension: &str, template: &str) -> Result<()> {
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(anyhow!(
            "Association extension must start with '.' and name an extension, got: {:?}",
            extension
        ));
    }

    let argv = expand_template(template, Path::new("sample"))
        .map_err(|e| anyhow!("Invalid template for {}: {}", extension, e))?;
    if argv.is_empty() {
        return Err(anyhow!("Template for {} has no command tokens", extension));
    }

    Ok(())
}

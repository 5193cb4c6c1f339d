use anyhow::{Result, bail};
use pkg_constants::scheduling::MAX_NAME_LEN;

/// Validate an entity identifier from a scenario file.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("identifier must not be empty");
    }
    if name.len() > MAX_NAME_LEN {
        bail!(
            "identifier '{}' exceeds {} characters (got {})",
            name,
            MAX_NAME_LEN,
            name.len()
        );
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("identifier '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "identifier '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

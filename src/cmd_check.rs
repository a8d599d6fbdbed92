//! `pantera check`: configuration validation.

use anyhow::bail;
use tracing::info;

use pantera_config::{Config, ConfigValidator};

/// Validate the configuration, print warnings and fail on errors.
pub(crate) fn check(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;

    for warning in &result.warnings {
        println!("warning: {warning}");
    }
    for error in &result.errors {
        println!("error: {error}");
    }

    if !result.is_valid() {
        bail!("configuration has {} error(s)", result.errors.len());
    }

    info!(
        package = %config.target.package,
        autobid = config.action.autobid_enabled,
        "Configuration is valid"
    );
    println!("ok ({} warning(s))", result.warnings.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantera_config::ConfigLoader;
    use std::path::Path;

    #[test]
    fn test_shipped_config_is_valid() {
        let config = ConfigLoader::load(Path::new("config/default.toml")).unwrap();
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_inverted_bid_bounds_fail() {
        let config =
            ConfigLoader::load_str("[pricing]\nmin_bid = 700\nmax_bid = 600\n").unwrap();
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("1 error"));
    }
}

use crate::config::types::{
    BackoffConfig, CollaboratorConfig, Config, CrawlerConfig, ModeConfig, OutputConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound for day-valued windows (a century)
const MAX_WINDOW_DAYS: u64 = 36_500;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_mode_config("stars", &config.stars)?;
    validate_mode_config("gazers", &config.gazers)?;
    validate_backoff_config(&config.backoff)?;
    validate_collaborator_config(&config.collaborators)?;
    validate_output_config(&config.output)?;
    for node in &config.seed.nodes {
        validate_identifier(node)?;
    }
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.parallel_workers < 1 || config.parallel_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "parallel_workers must be between 1 and 100, got {}",
            config.parallel_workers
        )));
    }

    if config.freshness_days > MAX_WINDOW_DAYS {
        return Err(ConfigError::Validation(format!(
            "freshness_days must be <= {}, got {}",
            MAX_WINDOW_DAYS, config.freshness_days
        )));
    }

    if let Some(days) = config.retry_failed_after_days {
        if days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Validation(format!(
                "retry_failed_after_days must be <= {}, got {}",
                MAX_WINDOW_DAYS, days
            )));
        }
    }

    if config.log_frequency < 1 {
        return Err(ConfigError::Validation(
            "log_frequency must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_mode_config(mode: &str, config: &ModeConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "{}.batch_size must be >= 1, got {}",
            mode, config.batch_size
        )));
    }
    Ok(())
}

fn validate_backoff_config(config: &BackoffConfig) -> Result<(), ConfigError> {
    // One day; anything longer is almost certainly a unit mistake
    if config.duration_secs > 86_400 {
        return Err(ConfigError::Validation(format!(
            "backoff duration must be <= 86400s, got {}s",
            config.duration_secs
        )));
    }
    Ok(())
}

fn validate_collaborator_config(config: &CollaboratorConfig) -> Result<(), ConfigError> {
    for (name, value) in [("fetch_url", &config.fetch_url), ("rank_url", &config.rank_url)] {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{} must use http or https, got '{}'",
                name, value
            )));
        }
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a node identifier
///
/// Users are bare logins; repositories are `owner/name` with exactly one
/// separator and both halves non-empty.
pub fn validate_identifier(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidIdentifier(format!(
            "'{}' contains whitespace",
            id
        )));
    }

    let parts: Vec<&str> = id.split('/').collect();
    match parts.as_slice() {
        [_user] => Ok(()),
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidIdentifier(format!(
            "'{}' must be a login or owner/name",
            id
        ))),
    }
}

use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("fetch.workers must be at least 1")]
    ZeroWorkers,

    #[error("render.deadline must be greater than zero")]
    ZeroDeadline,

    #[error("fetch.schema_wait ({schema_wait}ms) must fit within render.deadline ({deadline}ms)")]
    SchemaWaitExceedsDeadline { schema_wait: u64, deadline: u64 },

    #[error("store.path must not be empty")]
    EmptyStorePath,
}

/// Validate cross-field constraints after deserialization
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.fetch.workers == 0 {
        return Err(ValidationError::ZeroWorkers);
    }

    if config.render.deadline.as_millis() == 0 {
        return Err(ValidationError::ZeroDeadline);
    }

    // The render deadline is inclusive of the schema wait; a schema wait at or
    // beyond the deadline would starve the formatting step of any budget.
    if config.fetch.schema_wait.as_millis() >= config.render.deadline.as_millis() {
        return Err(ValidationError::SchemaWaitExceedsDeadline {
            schema_wait: config.fetch.schema_wait.as_millis(),
            deadline: config.render.deadline.as_millis(),
        });
    }

    if config.store.path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyStorePath);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.fetch.workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroWorkers)
        ));
    }

    #[test]
    fn test_schema_wait_must_fit_inside_deadline() {
        let mut config = Config::default();
        config.fetch.schema_wait = HumanDuration(2_000);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::SchemaWaitExceedsDeadline { .. })
        ));
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let mut config = Config::default();
        config.render.deadline = HumanDuration(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroDeadline)
        ));
    }
}

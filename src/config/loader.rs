//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::SystemConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_board::load_config;
///
/// let config = load_config("boards.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SystemConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(content).map_err(|e| {
        let msg = truncated(e.message());
        Error::Config(ConfigError::ParseError(msg))
    })?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

// Keep as much of the message as fits instead of dropping it entirely.
fn truncated(message: &str) -> heapless::String<128> {
    let mut out = heapless::String::new();
    for c in message.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::Microsteps;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
[boards.gantry]
address = 0
"#;

        let config = parse_config(toml).unwrap();
        let board = config.board("gantry").unwrap();
        assert_eq!(board.address.value(), 0);
        assert!(board.axes.is_empty());
        assert_eq!(config.transport.max_attempts, 3);
        assert_eq!(config.wait.poll_interval_ms, 20);
    }

    #[test]
    fn test_parse_with_axes() {
        let toml = r#"
[wait]
timeout_ms = 30000

[boards.gantry]
address = 1
microstepping = 8
enabled = true

[[boards.gantry.axes]]
axis = 0
speed_steps_per_sec = 1600.0
steps_per_millimeter = 64.0

[[boards.gantry.axes]]
axis = 2
steps_per_revolution = 1600.0
"#;

        let config = parse_config(toml).unwrap();
        let board = config.board("gantry").unwrap();
        assert_eq!(board.microstepping, Some(Microsteps::EIGHTH));
        assert!(board.enabled);
        assert_eq!(board.axis(0).unwrap().steps_per_millimeter, Some(64.0));
        assert_eq!(board.axis(2).unwrap().speed, None);
        assert!(board.axis(1).is_none());
        assert_eq!(config.wait.timeout_ms, Some(30000));
    }

    #[test]
    fn test_parse_rejects_bad_microstepping() {
        let toml = r#"
[boards.gantry]
address = 0
microstepping = 3
"#;

        assert!(matches!(
            parse_config(toml),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_truncated_message() {
        let long = "x".repeat(300);
        assert_eq!(truncated(&long).len(), 128);
    }
}

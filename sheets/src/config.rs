use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("spreadsheet_id cannot be empty")]
    EmptySpreadsheetId,

    #[error("range cannot be empty")]
    EmptyRange,

    #[error("http_timeout_secs cannot be 0")]
    ZeroTimeout,
}

/// Spreadsheet delivery configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Identifier of the target spreadsheet
    pub spreadsheet_id: String,
    /// Sheet (A1 notation) that rows are appended to
    #[serde(default = "default_range")]
    pub range: String,
    /// Base URL of the spreadsheet API
    ///
    /// Note: Uses the `url::Url` type for compile-time URL validation.
    /// Pointed at a local server in tests.
    #[serde(default = "default_api_base")]
    pub api_base: Url,
    /// Timeout for one append call, connection setup included
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_range() -> String {
    "Sheet1".to_string()
}

fn default_api_base() -> Url {
    Url::parse("https://sheets.googleapis.com").expect("static URL is valid")
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Validates the delivery configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.spreadsheet_id.is_empty() {
            return Err(ValidationError::EmptySpreadsheetId);
        }
        if self.range.is_empty() {
            return Err(ValidationError::EmptyRange);
        }
        if self.http_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
spreadsheet_id: 1aBcDeFgHiJ
range: "Intake"
api_base: "http://127.0.0.1:9000"
http_timeout_secs: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.range, "Intake");
        assert_eq!(config.api_base.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.http_timeout_secs, 5);
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("spreadsheet_id: 1aBcDeFgHiJ").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.range, "Sheet1");
        assert_eq!(config.api_base.as_str(), "https://sheets.googleapis.com/");
        assert_eq!(config.http_timeout_secs, 10);
    }

    #[test]
    fn test_validation_errors() {
        let base: Config = serde_yaml::from_str("spreadsheet_id: 1aBcDeFgHiJ").unwrap();

        let mut config = base.clone();
        config.spreadsheet_id = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptySpreadsheetId
        ));

        let mut config = base.clone();
        config.range = String::new();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyRange
        ));

        let mut config = base;
        config.http_timeout_secs = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::ZeroTimeout
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Missing spreadsheet_id
        assert!(serde_yaml::from_str::<Config>("range: Sheet1").is_err());

        // Invalid base URL
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
spreadsheet_id: abc
api_base: "not-a-url"
"#
            )
            .is_err()
        );
    }
}

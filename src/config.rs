use std::{convert::TryFrom, error::Error as StdError, fmt::Display, time::Duration};
use serde::Deserialize;

use crate::intent::Identity;

const DEFAULT_ACTIVITY_TIMEOUT_SECS: u64 = 120;

#[derive(Debug)]
pub enum Error {
    YamlError(serde_yaml::Error),
    Invalid(&'static str),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        Error::YamlError(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::YamlError(e) => e.fmt(f),
            Error::Invalid(what) => write!(f, "Invalid configuration: {}", what),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::YamlError(e) => Some(e),
            Error::Invalid(_) => None,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RawConfig {
    package_name: String,
    program_guid: String,
    reliant_guid: String,
    bridge_url: String,
    activity_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    identity: Identity,
    bridge_url: reqwest::Url,
    activity_timeout: Duration,
}

impl TryFrom<RawConfig> for Config {
    type Error = Error;
    fn try_from(config: RawConfig) -> Result<Config, Error> {
        if config.package_name.trim().is_empty() {
            return Err(Error::Invalid("package_name must not be empty"));
        }
        if config.program_guid.trim().is_empty() {
            return Err(Error::Invalid("program_guid must not be empty"));
        }
        if config.reliant_guid.trim().is_empty() {
            return Err(Error::Invalid("reliant_guid must not be empty"));
        }

        let bridge_url = reqwest::Url::parse(&config.bridge_url)
            .map_err(|_| Error::Invalid("bridge_url is not a valid url"))?;

        let timeout_secs = config
            .activity_timeout_secs
            .unwrap_or(DEFAULT_ACTIVITY_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::Invalid("activity_timeout_secs must be positive"));
        }

        Ok(Config {
            identity: Identity::new(config.package_name, config.program_guid, config.reliant_guid),
            bridge_url,
            activity_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Config {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn bridge_url(&self) -> &reqwest::Url {
        &self.bridge_url
    }

    pub fn activity_timeout(&self) -> Duration {
        self.activity_timeout
    }

    pub fn from_string(config: &str) -> Result<Config, Error> {
        Ok(serde_yaml::from_str(config)?)
    }

    pub fn from_reader<T: std::io::Read>(reader: T) -> Result<Config, Error> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "
package_name: com.mastercard.cp3.bridge
program_guid: 6f3b2c1e-program
reliant_guid: 9a8d7c6b-reliant
bridge_url: http://127.0.0.1:8400/intent
";

    #[test]
    fn parses_identity_and_defaults_timeout() {
        let config = Config::from_string(BASE).unwrap();
        assert_eq!(config.identity().package_name(), "com.mastercard.cp3.bridge");
        assert_eq!(config.identity().program_guid(), "6f3b2c1e-program");
        assert_eq!(config.identity().reliant_guid(), "9a8d7c6b-reliant");
        assert_eq!(config.bridge_url().as_str(), "http://127.0.0.1:8400/intent");
        assert_eq!(config.activity_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn explicit_timeout() {
        let config = Config::from_string(&format!("{}activity_timeout_secs: 15\n", BASE)).unwrap();
        assert_eq!(config.activity_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Config::from_string(&format!("{}activity_timeout_secs: 0\n", BASE));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_guid() {
        let result = Config::from_string(
            "
package_name: com.mastercard.cp3.bridge
program_guid: ''
reliant_guid: 9a8d7c6b-reliant
bridge_url: http://127.0.0.1:8400/intent
",
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_url() {
        let result = Config::from_string(
            "
package_name: com.mastercard.cp3.bridge
program_guid: 6f3b2c1e-program
reliant_guid: 9a8d7c6b-reliant
bridge_url: not a url
",
        );
        assert!(result.is_err());
    }
}

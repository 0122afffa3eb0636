use once_cell::sync::Lazy;
use regex::Regex;

use platform_utils::error::{ConfigError, EngineError};

use super::Config;

static REGION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d$").ok());
static STACK_PREFIX: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").ok());
static IPV4_CIDR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$").ok());

fn matches(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(value))
}

fn invalid(key: &str, value: impl Into<String>) -> EngineError {
    EngineError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    })
}

/// Whether `value` is a dotted-quad IPv4 CIDR with in-range octets and prefix.
pub(crate) fn is_ipv4_cidr(value: &str) -> bool {
    let Some(caps) = IPV4_CIDR.as_ref().and_then(|re| re.captures(value)) else {
        return false;
    };
    let octets_ok = (1..=4).all(|i| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u16>().ok())
            .is_some_and(|octet| octet <= 255)
    });
    let prefix_ok = caps
        .get(5)
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .is_some_and(|prefix| prefix <= 32);
    octets_ok && prefix_ok
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), EngineError> {
        if let Some(region) = &self.defaults.region
            && !matches(&REGION, region)
        {
            return Err(invalid(
                "region",
                format!("'{region}' is not a region identifier"),
            ));
        }

        if let Some(prefix) = &self.defaults.stack_prefix
            && !matches(&STACK_PREFIX, prefix)
        {
            return Err(invalid(
                "stack_prefix",
                format!("'{prefix}' must be lowercase letters, digits and hyphens"),
            ));
        }

        if let Some(url) = &self.defaults.backend_url
            && !url.contains("://")
        {
            return Err(invalid(
                "backend_url",
                format!("'{url}' must include a scheme such as s3://"),
            ));
        }

        if let Some(infra) = &self.infrastructure {
            if infra.vpc_id.is_empty() {
                return Err(EngineError::Config(ConfigError::MissingRequired(
                    "infrastructure.vpc_id".to_string(),
                )));
            }
            if !is_ipv4_cidr(&infra.vpc_cidr) {
                return Err(invalid(
                    "vpc_cidr",
                    format!("'{}' is not an IPv4 CIDR block", infra.vpc_cidr),
                ));
            }
        }

        Ok(())
    }
}

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use reqwest::Url;
use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env().unwrap_or_else(|e| panic!("Invalid bikefinder configuration: {e}"))
});

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub debounce: Duration,
    pub min_query_len: usize,
    pub toast_duration: Duration,
    pub session_cookie: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            debounce: Duration::from_millis(250),
            min_query_len: 2,
            toast_duration: Duration::from_millis(3000),
            session_cookie: None,
        }
    }
}

impl Config {
    /// Reads `BIKEFINDER_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let base_url = match lookup("BIKEFINDER_BASE_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                key: "BIKEFINDER_BASE_URL",
                reason: e.to_string(),
            })?,
            None => defaults.base_url,
        };

        let debounce = get_millis_or(&lookup, "BIKEFINDER_DEBOUNCE_MS", defaults.debounce)?;
        let toast_duration = get_millis_or(&lookup, "BIKEFINDER_TOAST_MS", defaults.toast_duration)?;

        let min_query_len = match lookup("BIKEFINDER_MIN_QUERY_LEN") {
            Some(raw) => match parse_number("BIKEFINDER_MIN_QUERY_LEN", &raw)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "BIKEFINDER_MIN_QUERY_LEN",
                        reason: "must be at least 1".to_string(),
                    });
                }
                n => n as usize,
            },
            None => defaults.min_query_len,
        };

        let session_cookie = lookup("BIKEFINDER_SESSION_COOKIE").filter(|c| !c.trim().is_empty());

        Ok(Config {
            base_url,
            debounce,
            min_query_len,
            toast_duration,
            session_cookie,
        })
    }
}

fn get_millis_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => Ok(Duration::from_millis(parse_number(key, &raw)?)),
        None => Ok(default),
    }
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.min_query_len, 2);
        assert_eq!(config.toast_duration, Duration::from_millis(3000));
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BIKEFINDER_BASE_URL", "https://bikes.example.org"),
            ("BIKEFINDER_DEBOUNCE_MS", " 100 "),
            ("BIKEFINDER_MIN_QUERY_LEN", "3"),
            ("BIKEFINDER_SESSION_COOKIE", "session=abc"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.host_str(), Some("bikes.example.org"));
        assert_eq!(config.debounce, Duration::from_millis(100));
        assert_eq!(config.min_query_len, 3);
        assert_eq!(config.session_cookie.as_deref(), Some("session=abc"));
    }

    #[test]
    fn test_blank_cookie_is_ignored() {
        let config =
            Config::from_lookup(lookup_from(&[("BIKEFINDER_SESSION_COOKIE", "  ")])).unwrap();
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("BIKEFINDER_DEBOUNCE_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("BIKEFINDER_DEBOUNCE_MS"));

        let err =
            Config::from_lookup(lookup_from(&[("BIKEFINDER_BASE_URL", "not a url")])).unwrap_err();
        assert!(err.to_string().contains("BIKEFINDER_BASE_URL"));
    }

    #[test]
    fn test_zero_min_query_len_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("BIKEFINDER_MIN_QUERY_LEN", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("BIKEFINDER_MIN_QUERY_LEN"));
        assert!(err.to_string().contains("at least 1"));

        let config =
            Config::from_lookup(lookup_from(&[("BIKEFINDER_MIN_QUERY_LEN", "1")])).unwrap();
        assert_eq!(config.min_query_len, 1);
    }
}

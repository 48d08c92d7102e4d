use std::path::PathBuf;
use std::str::FromStr;

/// Per-IP rate limit applied to the prediction route.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the timestamped model files and the preprocessor.
    pub model_dir: PathBuf,
    pub model_prefix: String,
    /// Model file extension, without the leading dot.
    pub model_extension: String,
    pub preprocessor_file: String,
    pub port: u16,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimit>,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            model_prefix: "xgboost_model".to_string(),
            model_extension: "json".to_string(),
            preprocessor_file: "preprocessor.json".to_string(),
            port: 8000,
            rate_limit: Some(RateLimit {
                per_second: 10,
                burst: 20,
            }),
            request_timeout_secs: 10,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let per_second: u64 = parse_var("RATE_LIMIT_PER_SECOND", 10)?;
        let burst: u32 = parse_var("RATE_LIMIT_BURST", 20)?;

        let config = Self {
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            model_prefix: non_empty_var("MODEL_PREFIX", &defaults.model_prefix)?,
            model_extension: non_empty_var("MODEL_EXTENSION", &defaults.model_extension)
                .map(|ext| ext.trim_start_matches('.').to_string())
                .and_then(|ext| {
                    if ext.is_empty() {
                        anyhow::bail!("MODEL_EXTENSION cannot be just a dot");
                    }
                    Ok(ext)
                })?,
            preprocessor_file: non_empty_var("PREPROCESSOR_FILE", &defaults.preprocessor_file)
                .and_then(|name| {
                    if name.contains('/') || name.contains('\\') {
                        anyhow::bail!("PREPROCESSOR_FILE must be a file name, not a path");
                    }
                    Ok(name)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            rate_limit: if per_second == 0 {
                None
            } else {
                if burst == 0 {
                    anyhow::bail!("RATE_LIMIT_BURST must be at least 1");
                }
                Some(RateLimit { per_second, burst })
            },
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)
                .and_then(|secs| {
                    if secs == 0 {
                        anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1");
                    }
                    Ok(secs)
                })?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", defaults.max_body_bytes)?,
        };

        tracing::debug!("Model directory: {}", config.model_dir.display());
        tracing::debug!(
            "Model files: {}_<timestamp>.{}, preprocessor: {}",
            config.model_prefix,
            config.model_extension,
            config.preprocessor_file
        );
        tracing::debug!("Server Port: {}", config.port);
        match &config.rate_limit {
            Some(limit) => tracing::debug!(
                "Rate limit: {} req/s, burst {}",
                limit.per_second,
                limit.burst
            ),
            None => tracing::info!("Rate limiting disabled"),
        }

        Ok(config)
    }
}

fn non_empty_var(key: &str, default: &str) -> anyhow::Result<String> {
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", key);
    }
    Ok(value)
}

fn parse_var<T: FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_training_conventions() {
        let config = Config::default();
        assert_eq!(config.model_prefix, "xgboost_model");
        assert_eq!(config.model_extension, "json");
        assert_eq!(config.preprocessor_file, "preprocessor.json");
        assert_eq!(config.port, 8000);
        assert_eq!(
            config.rate_limit,
            Some(RateLimit {
                per_second: 10,
                burst: 20
            })
        );
    }

    #[test]
    fn parse_var_uses_default_when_unset() {
        let value: u64 = parse_var("HOUSE_PRICE_API_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}

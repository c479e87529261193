//! Centralized configuration loader for the ECS crash monitor.
//!
//! Every value comes from a `ConfigProvider`, normally the process
//! environment. Optional integrations whose parameters are only partly set
//! are reported as `Setting::Incomplete` and stay switched off.

use std::collections::HashMap;
use std::env;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;
use std::time::Duration;

use crate::logs::BackendKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Source of raw configuration strings
pub trait ConfigProvider: Send + Sync {
    fn get_string(&self, key: &str) -> Result<String, ConfigError>;
}

/// Typed accessors on top of [`ConfigProvider`]
pub trait ConfigProviderExt: ConfigProvider {
    /// Value if present and not blank
    fn get_optional(&self, key: &str) -> Option<String> {
        self.get_string(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_required(&self, key: &str) -> Result<String, ConfigError> {
        self.get_optional(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get_optional(key) {
            None => Ok(None),
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidValue(format!("{}={} is not a boolean", key, value))),
            },
        }
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value, falling back to `default` when it is absent.
    /// A present but unparseable value is an error.
    fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_optional(key) {
            None => Ok(default),
            Some(value) => value
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue(format!("{}={}: {}", key, value, e))),
        }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// `cluster_name` becomes `CLUSTER_NAME` (or `PREFIX_CLUSTER_NAME`)
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();
        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }
        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        let env_key = self.format_key(key);
        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => ConfigError::Missing(env_key),
            env::VarError::NotUnicode(_) => {
                ConfigError::InvalidValue(format!("{} is not valid unicode", env_key))
            }
        })
    }
}

/// In-memory config provider for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }

    /// Builder-style `set`
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.set(key, value);
        self
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }
}

/// State of an optional integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting<T> {
    Enabled(T),
    Disabled,
    /// Some but not all required parameters were given
    Incomplete { missing: Vec<String> },
    /// Parameters were given but could not be used
    Invalid { reason: String },
}

impl<T> Setting<T> {
    pub fn enabled(&self) -> Option<&T> {
        match self {
            Setting::Enabled(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Setting::Enabled(_))
    }

    /// Configured but unusable
    pub fn needs_attention(&self) -> bool {
        matches!(self, Setting::Incomplete { .. } | Setting::Invalid { .. })
    }
}

impl<T> fmt::Display for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Enabled(_) => f.write_str("enabled"),
            Setting::Disabled => f.write_str("disabled"),
            Setting::Incomplete { missing } => write!(f, "incomplete (missing {})", missing.join(", ")),
            Setting::Invalid { reason } => write!(f, "invalid ({})", reason),
        }
    }
}

/// Outcome of checking an integration's required keys
enum Gate {
    Off,
    Missing(Vec<String>),
    Unusable(String),
    Ready(Vec<String>),
}

/// Integrations with an enable flag are on only when it is `true`; without
/// one they are on when every required key is set. A requested integration
/// with only some keys set is incomplete.
fn gate<P: ConfigProvider + ?Sized>(provider: &P, enable_key: Option<&str>, required: &[&str]) -> Gate {
    if let Some(key) = enable_key {
        match provider.get_bool(key) {
            Ok(Some(true)) => {}
            Ok(_) => return Gate::Off,
            Err(e) => return Gate::Unusable(e.to_string()),
        }
    }

    let values: Vec<Option<String>> = required.iter().map(|key| provider.get_optional(key)).collect();
    let missing: Vec<String> = required
        .iter()
        .zip(&values)
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key.to_uppercase())
        .collect();

    if missing.is_empty() {
        Gate::Ready(values.into_iter().flatten().collect())
    } else if missing.len() == required.len() && enable_key.is_none() {
        Gate::Off
    } else {
        Gate::Missing(missing)
    }
}

/// Primary search engine connection
#[derive(Clone)]
pub struct ElasticsearchConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub index_pattern: String,
    /// Document field holding the task ARN
    pub task_field: String,
    pub kibana_url: Option<String>,
}

impl Debug for ElasticsearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticsearchConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("index_pattern", &self.index_pattern)
            .field("task_field", &self.task_field)
            .field("kibana_url", &self.kibana_url)
            .finish()
    }
}

impl ElasticsearchConfig {
    /// Never fails; unusable values come back as [`Setting::Invalid`]
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Setting<Self> {
        let values = match gate(
            provider,
            Some("enable_elasticsearch_integration"),
            &["elasticsearch_endpoint", "elasticsearch_username", "elasticsearch_password"],
        ) {
            Gate::Off => return Setting::Disabled,
            Gate::Missing(missing) => return Setting::Incomplete { missing },
            Gate::Unusable(reason) => return Setting::Invalid { reason },
            Gate::Ready(values) => values,
        };
        let [endpoint, username, password]: [String; 3] = match values.try_into() {
            Ok(values) => values,
            Err(_) => return Setting::Invalid { reason: "elasticsearch settings".to_string() },
        };

        let config = Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            username,
            password,
            index_pattern: provider.get_string_or("elasticsearch_index_pattern", "*"),
            task_field: provider.get_string_or("elasticsearch_task_field", "ecs_task_arn"),
            kibana_url: provider
                .get_optional("kibana_url")
                .map(|url| url.trim_end_matches('/').to_string()),
        };
        match config.validate() {
            Ok(()) => Setting::Enabled(config),
            Err(e) => Setting::Invalid { reason: e.to_string() },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "ELASTICSEARCH_ENDPOINT must be an http(s) URL, got {}",
                self.endpoint
            )));
        }
        if self.task_field.is_empty() {
            return Err(ConfigError::InvalidValue("ELASTICSEARCH_TASK_FIELD is empty".to_string()));
        }
        Ok(())
    }
}

/// Secondary search engine connection
#[derive(Clone)]
pub struct CoralogixConfig {
    pub api_key: String,
    pub region: String,
    /// Team subdomain used for UI links
    pub account: Option<String>,
    pub api_url: String,
}

impl Debug for CoralogixConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoralogixConfig")
            .field("api_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("account", &self.account)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl CoralogixConfig {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Setting<Self> {
        let values = match gate(
            provider,
            Some("enable_coralogix_integration"),
            &["coralogix_api_key", "coralogix_region"],
        ) {
            Gate::Off => return Setting::Disabled,
            Gate::Missing(missing) => return Setting::Incomplete { missing },
            Gate::Unusable(reason) => return Setting::Invalid { reason },
            Gate::Ready(values) => values,
        };
        let [api_key, region]: [String; 2] = match values.try_into() {
            Ok(values) => values,
            Err(_) => return Setting::Invalid { reason: "coralogix settings".to_string() },
        };

        let api_url = provider
            .get_optional("coralogix_api_url")
            .unwrap_or_else(|| format!("https://api.{}.coralogix.com", region));

        let config = Self {
            api_key,
            account: provider.get_optional("coralogix_account"),
            api_url: api_url.trim_end_matches('/').to_string(),
            region,
        };
        match config.validate() {
            Ok(()) => Setting::Enabled(config),
            Err(e) => Setting::Invalid { reason: e.to_string() },
        }
    }

    /// Base URL of the Coralogix UI, when the account is known
    pub fn ui_url(&self) -> Option<String> {
        self.account
            .as_ref()
            .map(|account| format!("https://{}.app.{}.coralogix.com", account, self.region))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.contains(|c: char| c == '/' || c.is_whitespace()) {
            return Err(ConfigError::InvalidValue(format!("CORALOGIX_REGION '{}'", self.region)));
        }
        Ok(())
    }
}

/// Notification channel
#[derive(Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub channel: String,
    pub api_url: String,
}

impl Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("channel", &self.channel)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SlackConfig {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Setting<Self>, ConfigError> {
        let values = match gate(provider, None, &["slack_bot_token", "slack_channel"]) {
            Gate::Off => return Ok(Setting::Disabled),
            Gate::Missing(missing) => return Ok(Setting::Incomplete { missing }),
            Gate::Unusable(reason) => return Err(ConfigError::InvalidValue(reason)),
            Gate::Ready(values) => values,
        };
        let [bot_token, channel]: [String; 2] = values
            .try_into()
            .map_err(|_| ConfigError::InvalidValue("slack settings".to_string()))?;

        let config = Self {
            bot_token,
            channel,
            api_url: provider
                .get_string_or("slack_api_url", "https://slack.com/api")
                .trim_end_matches('/')
                .to_string(),
        };
        config.validate()?;
        Ok(Setting::Enabled(config))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!("SLACK_API_URL must be an http(s) URL, got {}", self.api_url)));
        }
        Ok(())
    }
}

/// Baseline log store and record store settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudWatchConfig {
    /// Used when the task definition has no awslogs group
    pub fallback_log_group: Option<String>,
    /// Where failure events are retained for the daily summary
    pub crash_events_log_group: String,
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryConfig {
    pub top_n: usize,
    pub schedule: Option<String>,
}

/// Complete runtime configuration shared by both entry points
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub cluster_name: String,
    pub environment: String,
    pub slack: Setting<SlackConfig>,
    pub elasticsearch: Setting<ElasticsearchConfig>,
    pub coralogix: Setting<CoralogixConfig>,
    /// Priority of the optional search engines; the baseline always comes last
    pub search_order: Vec<BackendKind>,
    pub cloudwatch: CloudWatchConfig,
    pub log_lookback: Duration,
    pub log_line_limit: usize,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub summary: SummaryConfig,
}

const DEFAULT_SEARCH_ORDER: [BackendKind; 2] = [BackendKind::Elasticsearch, BackendKind::Coralogix];

impl MonitorConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_provider(&EnvConfigProvider::new())
    }

    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self, ConfigError> {
        let cluster_name = provider.get_required("cluster_name")?;
        let environment = provider.get_required("environment")?;

        let search_order = match provider.get_optional("log_backend_order") {
            Some(raw) => parse_search_order(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring LOG_BACKEND_ORDER, using the default order");
                DEFAULT_SEARCH_ORDER.to_vec()
            }),
            None => DEFAULT_SEARCH_ORDER.to_vec(),
        };

        let lookback_minutes: u64 = positive(provider, "log_lookback_minutes", 60)?;
        let timeout_secs: u64 = positive(provider, "request_timeout_secs", 10)?;

        let crash_events_log_group = provider.get_string_or(
            "crash_events_log_group",
            &format!("/aws/ecs/monitoring/{}/crash-events", cluster_name),
        );

        Ok(Self {
            slack: SlackConfig::from_provider(provider)?,
            elasticsearch: ElasticsearchConfig::from_provider(provider),
            coralogix: CoralogixConfig::from_provider(provider),
            search_order,
            cloudwatch: CloudWatchConfig {
                fallback_log_group: provider.get_optional("cloudwatch_log_group"),
                crash_events_log_group,
                retention_days: match provider.get_optional("log_retention_days") {
                    Some(_) => Some(positive(provider, "log_retention_days", 1)?),
                    None => None,
                },
            },
            log_lookback: Duration::from_secs(lookback_minutes * 60),
            log_line_limit: positive(provider, "log_line_limit", 50)?,
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries: provider.get_parsed_or("max_retries", 2)?,
            summary: SummaryConfig {
                top_n: positive(provider, "summary_top_n", 5)?,
                schedule: provider.get_optional("daily_summary_schedule"),
            },
            cluster_name,
            environment,
        })
    }

    /// Search engines to query, in priority order, skipping any that are off
    pub fn enabled_search_engines(&self) -> Vec<BackendKind> {
        self.search_order
            .iter()
            .copied()
            .filter(|kind| match kind {
                BackendKind::Elasticsearch => self.elasticsearch.is_enabled(),
                BackendKind::Coralogix => self.coralogix.is_enabled(),
                BackendKind::CloudWatch => false,
            })
            .collect()
    }

    /// Log the state of each optional integration. Incomplete or invalid ones are warnings.
    pub fn report_integrations(&self) {
        let integrations = [
            ("slack", self.slack.to_string(), self.slack.needs_attention()),
            ("elasticsearch", self.elasticsearch.to_string(), self.elasticsearch.needs_attention()),
            ("coralogix", self.coralogix.to_string(), self.coralogix.needs_attention()),
        ];
        for (name, state, attention) in integrations {
            if attention {
                tracing::warn!(integration = name, state = %state, "integration configuration unusable, disabled");
            } else {
                tracing::info!(integration = name, state = %state, "integration configured");
            }
        }
        if let Some(days) = self.cloudwatch.retention_days {
            tracing::info!(
                log_group = %self.cloudwatch.crash_events_log_group,
                retention_days = days,
                "crash event retention"
            );
        }
    }
}

fn positive<P, T>(provider: &P, key: &str, default: T) -> Result<T, ConfigError>
where
    P: ConfigProvider + ?Sized,
    T: FromStr + PartialOrd + Default + Display + Copy,
    T::Err: Display,
{
    let value = provider.get_parsed_or(key, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue(format!("{} must be greater than zero, got {}", key.to_uppercase(), value)));
    }
    Ok(value)
}

fn parse_search_order(raw: &str) -> Result<Vec<BackendKind>, ConfigError> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: BackendKind = part
            .parse()
            .map_err(|e| ConfigError::InvalidValue(format!("LOG_BACKEND_ORDER: {}", e)))?;
        if !kind.is_search_engine() {
            return Err(ConfigError::InvalidValue(format!(
                "LOG_BACKEND_ORDER: {} is always queried last and cannot be ordered",
                kind
            )));
        }
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> MemoryConfigProvider {
        MemoryConfigProvider::new()
            .with("cluster_name", "prod")
            .with("environment", "production")
    }

    #[test]
    fn test_env_key_format() {
        let provider = EnvConfigProvider::new().with_prefix("CRASH");
        assert_eq!(provider.format_key("slack_bot_token"), "CRASH_SLACK_BOT_TOKEN");
        assert_eq!(EnvConfigProvider::new().format_key("log-line-limit"), "LOG_LINE_LIMIT");
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_provider(&base()).unwrap();
        assert_eq!(config.cluster_name, "prod");
        assert_eq!(config.environment, "production");
        assert_eq!(config.search_order, vec![BackendKind::Elasticsearch, BackendKind::Coralogix]);
        assert_eq!(config.log_line_limit, 50);
        assert_eq!(config.log_lookback, Duration::from_secs(3600));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.summary.top_n, 5);
        assert_eq!(config.cloudwatch.crash_events_log_group, "/aws/ecs/monitoring/prod/crash-events");
        assert!(matches!(config.slack, Setting::Disabled));
        assert!(config.enabled_search_engines().is_empty());
    }

    #[test]
    fn test_required_values() {
        let provider = MemoryConfigProvider::new().with("cluster_name", "prod");
        assert!(matches!(
            MonitorConfig::from_provider(&provider),
            Err(ConfigError::Missing(key)) if key == "environment"
        ));

        let blank = base().with("cluster_name", "  ");
        assert!(matches!(MonitorConfig::from_provider(&blank), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_incomplete_integration_is_disabled() {
        let provider = base()
            .with("enable_elasticsearch_integration", "true")
            .with("elasticsearch_endpoint", "https://es.internal:9200")
            .with("elasticsearch_username", "reader");
        let config = MonitorConfig::from_provider(&provider).unwrap();
        assert_eq!(
            config.elasticsearch.enabled().map(|c| c.endpoint.clone()),
            None
        );
        match &config.elasticsearch {
            Setting::Incomplete { missing } => assert_eq!(missing, &vec!["ELASTICSEARCH_PASSWORD".to_string()]),
            other => panic!("expected incomplete, got {}", other),
        }
        assert!(config.enabled_search_engines().is_empty());
    }

    #[test]
    fn test_explicit_flag_without_values_is_incomplete() {
        let provider = base().with("enable_coralogix_integration", "true");
        let config = MonitorConfig::from_provider(&provider).unwrap();
        assert!(matches!(config.coralogix, Setting::Incomplete { ref missing } if missing.len() == 2));
    }

    #[test]
    fn test_explicit_false_wins() {
        let provider = base()
            .with("enable_coralogix_integration", "false")
            .with("coralogix_api_key", "key")
            .with("coralogix_region", "eu2");
        let config = MonitorConfig::from_provider(&provider).unwrap();
        assert_eq!(config.coralogix.to_string(), "disabled");
    }

    #[test]
    fn test_credentials_without_flag_stay_disabled() {
        let provider = base()
            .with("elasticsearch_endpoint", "https://es.internal:9200")
            .with("elasticsearch_username", "reader")
            .with("elasticsearch_password", "secret")
            .with("coralogix_api_key", "key")
            .with("coralogix_region", "eu2");
        let config = MonitorConfig::from_provider(&provider).unwrap();

        assert!(matches!(config.elasticsearch, Setting::Disabled));
        assert!(matches!(config.coralogix, Setting::Disabled));
        assert!(config.enabled_search_engines().is_empty());
    }

    #[test]
    fn test_full_integrations() {
        let provider = base()
            .with("enable_elasticsearch_integration", "true")
            .with("enable_coralogix_integration", "TRUE")
            .with("elasticsearch_endpoint", "https://es.internal:9200/")
            .with("elasticsearch_username", "reader")
            .with("elasticsearch_password", "secret")
            .with("kibana_url", "https://kibana.internal/")
            .with("coralogix_api_key", "key")
            .with("coralogix_region", "eu2")
            .with("coralogix_account", "acme")
            .with("slack_bot_token", "xoxb-1")
            .with("slack_channel", "C123");
        let config = MonitorConfig::from_provider(&provider).unwrap();

        let es = config.elasticsearch.enabled().unwrap();
        assert_eq!(es.endpoint, "https://es.internal:9200");
        assert_eq!(es.index_pattern, "*");
        assert_eq!(es.task_field, "ecs_task_arn");
        assert_eq!(es.kibana_url.as_deref(), Some("https://kibana.internal"));
        assert!(!format!("{:?}", es).contains("secret"));

        let cx = config.coralogix.enabled().unwrap();
        assert_eq!(cx.api_url, "https://api.eu2.coralogix.com");
        assert_eq!(cx.ui_url().as_deref(), Some("https://acme.app.eu2.coralogix.com"));

        assert_eq!(config.slack.enabled().unwrap().api_url, "https://slack.com/api");
        assert_eq!(
            config.enabled_search_engines(),
            vec![BackendKind::Elasticsearch, BackendKind::Coralogix]
        );
    }

    #[test]
    fn test_search_order_is_configurable() {
        let provider = base()
            .with("log_backend_order", "coralogix, elasticsearch")
            .with("enable_elasticsearch_integration", "true")
            .with("enable_coralogix_integration", "true")
            .with("elasticsearch_endpoint", "https://es")
            .with("elasticsearch_username", "u")
            .with("elasticsearch_password", "p")
            .with("coralogix_api_key", "key")
            .with("coralogix_region", "us1");
        let config = MonitorConfig::from_provider(&provider).unwrap();
        assert_eq!(
            config.enabled_search_engines(),
            vec![BackendKind::Coralogix, BackendKind::Elasticsearch]
        );

        let only_coralogix = provider.clone().with("log_backend_order", "coralogix");
        let config = MonitorConfig::from_provider(&only_coralogix).unwrap();
        assert_eq!(config.enabled_search_engines(), vec![BackendKind::Coralogix]);

    }

    #[test]
    fn test_unusable_search_order_falls_back_to_default() {
        for raw in ["cloudwatch,coralogix", "coralogx,elasticsearch"] {
            let provider = base().with("log_backend_order", raw);
            let config = MonitorConfig::from_provider(&provider).unwrap();
            assert_eq!(config.search_order, vec![BackendKind::Elasticsearch, BackendKind::Coralogix]);
        }
    }

    #[test]
    fn test_invalid_numbers() {
        let zero = base().with("log_line_limit", "0");
        assert!(matches!(MonitorConfig::from_provider(&zero), Err(ConfigError::InvalidValue(_))));

        let junk = base().with("request_timeout_secs", "soon");
        assert!(matches!(MonitorConfig::from_provider(&junk), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_unusable_optional_backends_are_disabled() {
        let provider = base()
            .with("enable_elasticsearch_integration", "true")
            .with("elasticsearch_endpoint", "es.internal:9200")
            .with("elasticsearch_username", "u")
            .with("elasticsearch_password", "p")
            .with("enable_coralogix_integration", "yes please")
            .with("coralogix_api_key", "key")
            .with("coralogix_region", "eu2")
            .with("slack_bot_token", "xoxb-1")
            .with("slack_channel", "C123");
        let config = MonitorConfig::from_provider(&provider).unwrap();

        assert!(matches!(config.elasticsearch, Setting::Invalid { ref reason } if reason.contains("ELASTICSEARCH_ENDPOINT")));
        assert!(matches!(config.coralogix, Setting::Invalid { ref reason } if reason.contains("enable_coralogix_integration")));
        assert!(config.elasticsearch.needs_attention());
        assert!(config.enabled_search_engines().is_empty());
        assert!(config.slack.is_enabled());
        assert_eq!(config.cluster_name, "prod");
    }

    #[test]
    fn test_invalid_slack_is_fatal() {
        let provider = base()
            .with("slack_bot_token", "xoxb-1")
            .with("slack_channel", "C123")
            .with("slack_api_url", "slack.com/api");
        assert!(matches!(MonitorConfig::from_provider(&provider), Err(ConfigError::InvalidValue(_))));
    }
}

use crate::errors::ConfigError;
use crate::model::MetricKey;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Upper bound for `session.max_retries`.
pub const MAX_RETRIES: u32 = 10;

/// Minimum acceptable value per metric, in each metric's natural range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    pub similarity_score: f64,
    pub keyword_match: f64,
    pub fuzzy_score: f64,
    pub levenshtein_similarity: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            similarity_score: 0.7,
            keyword_match: 0.6,
            fuzzy_score: 60.0,
            levenshtein_similarity: 0.5,
        }
    }
}

impl ThresholdConfig {
    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::SimilarityScore => self.similarity_score,
            MetricKey::KeywordMatch => self.keyword_match,
            MetricKey::FuzzyScore => self.fuzzy_score,
            MetricKey::LevenshteinSimilarity => self.levenshtein_similarity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in MetricKey::ALL {
            let v = self.get(key);
            if !v.is_finite() || v < 0.0 || v > key.range_max() {
                return Err(ConfigError(format!(
                    "thresholds.{key} = {v} is outside [0, {}]",
                    key.range_max()
                )));
            }
        }
        Ok(())
    }
}

/// Relative weight per metric in the composite score. Need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    pub similarity_score: f64,
    pub keyword_match: f64,
    pub fuzzy_score: f64,
    pub levenshtein_similarity: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            similarity_score: 0.4,
            keyword_match: 0.2,
            fuzzy_score: 0.2,
            levenshtein_similarity: 0.2,
        }
    }
}

impl WeightConfig {
    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::SimilarityScore => self.similarity_score,
            MetricKey::KeywordMatch => self.keyword_match,
            MetricKey::FuzzyScore => self.fuzzy_score,
            MetricKey::LevenshteinSimilarity => self.levenshtein_similarity,
        }
    }

    pub fn total(&self) -> f64 {
        MetricKey::ALL.iter().map(|k| self.get(*k)).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in MetricKey::ALL {
            let w = self.get(key);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError(format!(
                    "weights.{key} = {w} must be a finite, non-negative number"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(ConfigError("weights must not all be zero".into()));
        }
        Ok(())
    }
}

pub const DEFAULT_MAX_INPUT_CHARS: usize = 20_000;

/// Everything the validator reads. Built once at startup, passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub thresholds: ThresholdConfig,
    pub weights: WeightConfig,
    pub max_input_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            weights: WeightConfig::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ValidationSettings {
    pub max_input_chars: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

/// Timing and retry bounds for the chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SessionPolicy {
    pub navigation_timeout_ms: u64,
    pub login_timeout_ms: u64,
    pub response_timeout_ms: u64,
    /// Resubmissions after the first attempt times out.
    pub max_retries: u32,
    pub poll_interval_ms: u64,
    /// Consecutive identical polls before a reply counts as complete.
    pub stable_polls: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 30_000,
            login_timeout_ms: 5_000,
            response_timeout_ms: 20_000,
            max_retries: 2,
            poll_interval_ms: 500,
            stable_polls: 2,
        }
    }
}

impl SessionPolicy {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.navigation_timeout_ms == 0
            || self.login_timeout_ms == 0
            || self.response_timeout_ms == 0
        {
            return Err(ConfigError("session timeouts must be greater than zero".into()));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms >= self.response_timeout_ms {
            return Err(ConfigError(format!(
                "session.poll_interval_ms ({}) must be > 0 and below response_timeout_ms ({})",
                self.poll_interval_ms, self.response_timeout_ms
            )));
        }
        if self.stable_polls == 0 {
            return Err(ConfigError("session.stable_polls must be at least 1".into()));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError(format!(
                "session.max_retries = {} exceeds the limit of {MAX_RETRIES}",
                self.max_retries
            )));
        }
        Ok(())
    }
}

/// CSS selectors for the chat UI. Defaults match Le Chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChatSelectors {
    pub login_form: String,
    pub username_input: String,
    pub password_input: String,
    pub login_submit: String,
    pub chat_input: String,
    pub reply_container: String,
    pub reply_parts: String,
    pub typing_indicator: Option<String>,
}

impl Default for ChatSelectors {
    fn default() -> Self {
        Self {
            login_form: "[data-testid='login-flow']".into(),
            username_input: "input[name='identifier']".into(),
            password_input: "input[name='password']".into(),
            login_submit: "button[type='submit']".into(),
            chat_input: "textarea[placeholder=\"Ask anything!\"]".into(),
            reply_container: "div.prose".into(),
            reply_parts: "p, li".into(),
            typing_indicator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChatSettings {
    pub url: String,
    pub selectors: ChatSelectors,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            url: "https://chat.mistral.ai/chat".into(),
            selectors: ChatSelectors::default(),
        }
    }
}

/// Top-level `chatprobe.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    pub version: u32,
    pub thresholds: ThresholdConfig,
    pub weights: WeightConfig,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub session: SessionPolicy,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            thresholds: ThresholdConfig::default(),
            weights: WeightConfig::default(),
            validation: ValidationSettings::default(),
            session: SessionPolicy::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl ProbeConfig {
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            thresholds: self.thresholds,
            weights: self.weights,
            max_input_chars: self.validation.max_input_chars,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        self.thresholds.validate()?;
        self.weights.validate()?;
        self.session.validate()?;
        if self.validation.max_input_chars == 0 {
            return Err(ConfigError(
                "validation.max_input_chars must be greater than zero".into(),
            ));
        }
        if self.chat.url.trim().is_empty() {
            return Err(ConfigError("chat.url must not be empty".into()));
        }
        Ok(())
    }
}

pub fn parse_config(raw: &str) -> Result<ProbeConfig, ConfigError> {
    let cfg: ProbeConfig = serde_yaml::from_str(raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<ProbeConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw)
}

pub const SAMPLE_CONFIG: &str = include_str!("../chatprobe.sample.yaml");

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version: 1
thresholds:
  similarity_score: 0.7
  keyword_match: 0.6
  fuzzy_score: 60
  levenshtein_similarity: 0.5
weights:
  similarity_score: 0.4
  keyword_match: 0.2
  fuzzy_score: 0.2
  levenshtein_similarity: 0.2
"#;

    #[test]
    fn sample_config_parses_and_matches_defaults() {
        let cfg = parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn minimal_config_fills_session_and_chat_defaults() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.session, SessionPolicy::default());
        assert_eq!(cfg.chat.url, "https://chat.mistral.ai/chat");
        assert_eq!(cfg.validation_config(), ValidationConfig::default());
    }

    #[test]
    fn unknown_metric_key_is_rejected() {
        let raw = MINIMAL.replace("  fuzzy_score: 60", "  fuzzy_score: 60\n  bleu: 0.3");
        let err = parse_config(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{err}");
    }

    #[test]
    fn missing_metric_key_is_rejected() {
        let raw = MINIMAL.replace("  keyword_match: 0.2\n", "");
        let err = parse_config(&raw).unwrap_err();
        assert!(err.to_string().contains("missing field"), "{err}");
    }

    #[test]
    fn threshold_outside_natural_range_is_rejected() {
        let raw = MINIMAL.replace("similarity_score: 0.7", "similarity_score: 70");
        let err = parse_config(&raw).unwrap_err();
        assert!(err.to_string().contains("thresholds.similarity_score"), "{err}");

        // fuzzy_score lives on a 0..100 scale, so 60 is fine but 101 is not
        let raw = MINIMAL.replace("fuzzy_score: 60", "fuzzy_score: 101");
        assert!(parse_config(&raw).is_err());
    }

    #[test]
    fn negative_or_all_zero_weights_are_rejected() {
        let raw = MINIMAL.replace(
            "  keyword_match: 0.2\n  fuzzy_score: 0.2",
            "  keyword_match: -0.2\n  fuzzy_score: 0.2",
        );
        assert!(parse_config(&raw).is_err());

        let cfg = ProbeConfig {
            weights: WeightConfig {
                similarity_score: 0.0,
                keyword_match: 0.0,
                fuzzy_score: 0.0,
                levenshtein_similarity: 0.0,
            },
            ..ProbeConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("all be zero"));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let raw = MINIMAL.replace("version: 1", "version: 2");
        let err = parse_config(&raw).unwrap_err();
        assert!(err.to_string().contains("unsupported config version 2"));
    }

    #[test]
    fn poll_interval_must_fit_inside_response_timeout() {
        let mut cfg = ProbeConfig::default();
        cfg.session.poll_interval_ms = cfg.session.response_timeout_ms;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn retry_budget_is_bounded() {
        let at_limit = format!("{MINIMAL}session:\n  max_retries: {MAX_RETRIES}\n");
        assert_eq!(parse_config(&at_limit).unwrap().session.max_retries, MAX_RETRIES);

        let huge = format!("{MINIMAL}session:\n  max_retries: 4294967295\n");
        let err = parse_config(&huge).unwrap_err();
        assert!(err.0.contains("session.max_retries"), "{err}");
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn write_sample_config_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatprobe.yaml");
        write_sample_config(&path).unwrap();
        assert!(load_config(&path).is_ok());
    }
}

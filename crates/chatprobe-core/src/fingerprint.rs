use crate::config::ValidationConfig;
use crate::model::MetricKey;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub hex: String,
    pub components: Vec<String>,
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Identifies the grading policy of a run: two runs with equal fingerprints
/// judged their answers with the same thresholds, weights and metric code.
pub fn compute(config: &ValidationConfig, metrics_name: &str, metrics_version: &str) -> Fingerprint {
    let mut parts = Vec::new();

    for key in MetricKey::ALL {
        parts.push(format!("threshold.{key}={}", config.thresholds.get(key)));
    }
    for key in MetricKey::ALL {
        parts.push(format!("weight.{key}={}", config.weights.get(key)));
    }
    parts.push(format!("max_input_chars={}", config.max_input_chars));
    parts.push(format!("metrics={metrics_name}:{metrics_version}"));
    parts.push(format!("chatprobe_version={}", env!("CARGO_PKG_VERSION")));

    let hex = sha256_hex(&parts.join("\n"));
    Fingerprint {
        hex,
        components: parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_policy_yields_identical_fingerprint() {
        let cfg = ValidationConfig::default();
        let a = compute(&cfg, "lexical", "1");
        let b = compute(&cfg, "lexical", "1");
        assert_eq!(a.hex, b.hex);
        assert_eq!(a.hex.len(), 64);
    }

    #[test]
    fn threshold_or_metric_version_change_alters_fingerprint() {
        let cfg = ValidationConfig::default();
        let base = compute(&cfg, "lexical", "1");

        let mut stricter = cfg.clone();
        stricter.thresholds.keyword_match = 0.9;
        assert_ne!(base.hex, compute(&stricter, "lexical", "1").hex);

        assert_ne!(base.hex, compute(&cfg, "lexical", "2").hex);
    }
}

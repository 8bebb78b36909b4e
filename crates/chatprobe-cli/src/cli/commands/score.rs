use crate::cli::args::ScoreArgs;
use crate::exit_codes::{ReasonCode, EXIT_SUCCESS, EXIT_TEST_FAILURE};
use chatprobe_core::config::{load_config, ValidationConfig};
use chatprobe_core::engine::TestRunner;
use chatprobe_core::model::TestCase;
use chatprobe_metrics::LexicalMetrics;
use std::sync::Arc;

pub fn run(args: ScoreArgs) -> anyhow::Result<i32> {
    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(cfg) => cfg.validation_config(),
            Err(e) => {
                eprintln!("❌ {}: {}", path.display(), e);
                return Ok(ReasonCode::ECfgParse.exit_code());
            }
        },
        None => ValidationConfig::default(),
    };

    let mut tc = TestCase::new(1, "", args.expected);
    if let Some(data) = args.expected_data {
        tc = tc.with_expected_data(data);
    }

    let runner = TestRunner::new(Arc::new(LexicalMetrics::new()), config);
    let verdict = runner.evaluate(&tc, &args.actual);
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(if verdict.passed {
        EXIT_SUCCESS
    } else {
        EXIT_TEST_FAILURE
    })
}

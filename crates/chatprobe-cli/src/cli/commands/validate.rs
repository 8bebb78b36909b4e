use crate::cli::args::ValidateArgs;
use crate::exit_codes::{ReasonCode, EXIT_SUCCESS};
use chatprobe_core::config::load_config;
use chatprobe_core::dataset::load_dataset;
use chatprobe_core::fingerprint;
use chatprobe_core::metrics_api::SimilarityMetrics;
use chatprobe_metrics::LexicalMetrics;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let cfg = match load_config(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ {}: {}", args.config.display(), e);
            return Ok(ReasonCode::ECfgParse.exit_code());
        }
    };
    let metrics = LexicalMetrics::new();
    let fp = fingerprint::compute(&cfg.validation_config(), metrics.name(), metrics.version());
    println!("✅ {} (policy {})", args.config.display(), &fp.hex[..12]);

    if let Some(path) = &args.dataset {
        match load_dataset(path) {
            Ok(cases) => println!("✅ {} ({} questions)", path.display(), cases.len()),
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(ReasonCode::EDatasetInvalid.exit_code());
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

use crate::cli::args::RunArgs;
use crate::exit_codes::{ReasonCode, EXIT_SUCCESS};
use crate::playwright::PlaywrightDriver;
use anyhow::Context;
use chatprobe_core::config::load_config;
use chatprobe_core::dataset::load_dataset;
use chatprobe_core::engine::TestRunner;
use chatprobe_core::errors::RunAbortKind;
use chatprobe_core::fingerprint;
use chatprobe_core::metrics_api::SimilarityMetrics;
use chatprobe_core::report::summary::{write_summary, Summary};
use chatprobe_core::report::{console, json::write_json, RunReport};
use chatprobe_core::session::{ChatSession, Credentials};
use chatprobe_metrics::LexicalMetrics;
use std::sync::Arc;
use tracing::info;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = match load_config(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ {}: {}", args.config.display(), e);
            return Ok(ReasonCode::ECfgParse.exit_code());
        }
    };
    let cases = match load_dataset(&args.dataset) {
        Ok(cases) => cases,
        Err(e) => {
            eprintln!("❌ {e}");
            return Ok(ReasonCode::EDatasetInvalid.exit_code());
        }
    };
    let credentials = match (args.username.as_deref(), args.password.as_deref()) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
            Credentials::new(u, p, args.headless)
        }
        _ => {
            eprintln!("❌ Username and password must be set (--username/--password or CHATBOT_USERNAME/CHATBOT_PASSWORD)");
            return Ok(ReasonCode::EMissingCredentials.exit_code());
        }
    };

    let metrics = Arc::new(LexicalMetrics::new());
    let validation = cfg.validation_config();
    let fp = fingerprint::compute(&validation, metrics.name(), metrics.version());
    info!(
        config = %args.config.display(),
        questions = cases.len(),
        fingerprint = %fp.hex,
        "configuration loaded"
    );

    let driver = PlaywrightDriver::new(
        args.node.clone(),
        cfg.chat.clone(),
        cfg.session.navigation_timeout(),
    );
    let mut session = ChatSession::new(driver, cfg.session.clone());
    let runner = TestRunner::new(metrics, validation);
    let progress = console::default_progress_sink(cases.len());

    let outcome = runner.run(&cases, &mut session, &credentials, progress).await;
    let report = RunReport::from_outcome(outcome, &fp);

    let reason = match report.abort.as_ref().map(|a| a.kind) {
        Some(RunAbortKind::Auth) => Some(ReasonCode::EAuthFailed),
        Some(RunAbortKind::SessionFatal) => Some(ReasonCode::ESessionTerminated),
        None if report.failed() > 0 => Some(ReasonCode::ETestFailed),
        None => None,
    };
    let exit_code = reason.map_or(EXIT_SUCCESS, ReasonCode::exit_code);
    let summary = Summary::from_report(
        &report,
        exit_code,
        reason.map(ReasonCode::as_str).unwrap_or_default(),
    );

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let results_path = args.out_dir.join("results.json");
    let summary_path = args.out_dir.join("summary.json");
    write_json(&report, &results_path)
        .with_context(|| format!("failed to write {}", results_path.display()))?;
    write_summary(&summary, &summary_path)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    console::print_summary(&report);
    eprintln!("Reports: {}", args.out_dir.display());

    Ok(exit_code)
}

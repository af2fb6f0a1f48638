//! Scan execution: wires parsed flags into the engine and reports.

use crate::cli::{Cli, OutputFormat};
use crate::config::{AppSettings, Paths};
use crate::engine::{EngineSettings, ScanEngine};
use crate::error::{CliError, CliResult};
use crate::http::{HttpClient, HttpSettings};
use crate::output::{self, ConsoleSink, RunReport};
use crate::reverse::Correlator;
use crate::rules::{RuleLocator, RuleRegistry};
use crate::types::Target;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Run one scan from parsed arguments: assemble targets and rules, build
/// the engine, drain the batch, print and optionally export the report.
pub async fn execute(cli: &Cli) -> CliResult<()> {
    let settings = AppSettings::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load settings, using defaults");
        AppSettings::default()
    });

    let concurrency = cli.num.unwrap_or(settings.default_concurrency);
    let rate = cli.rate.unwrap_or(settings.default_rate);
    let timeout_ms = cli.timeout.unwrap_or(settings.default_timeout_ms);
    let proxy = cli.proxy.clone().or_else(|| settings.proxy.clone());
    let reverse = cli.reverse.clone().or_else(|| settings.reverse_uri.clone());
    let output_format = resolve_output_format(cli.output, &settings);

    let targets = assemble_targets(cli)?;
    if targets.is_empty() {
        return Err(CliError::Other(
            "no targets given; use --target, --target-file or --raw".to_string(),
        ));
    }

    // Client pool misconfiguration is fatal before any task runs.
    let mut http = HttpSettings::default()
        .with_max_connections(concurrency)
        .with_timeout(Duration::from_millis(timeout_ms));
    if let Some(proxy) = proxy {
        http = http.with_proxy(proxy);
    }
    let transport = HttpClient::configure(&http)?;

    // A bad callback URI degrades the run instead of killing it.
    let correlator = match reverse.as_deref() {
        Some(uri) => match Correlator::configure(uri) {
            Ok(correlator) => correlator,
            Err(e) => {
                output::print_warning(&format!("no dnslog service set: {e}"));
                Correlator::disabled()
            }
        },
        None => {
            output::print_warning("no dnslog service set");
            Correlator::disabled()
        }
    };

    let mut registry = RuleRegistry::with_builtins();
    let standing = Paths::get().rules_dir();
    if standing.is_dir() {
        registry.load_dir(&standing)?;
    }
    if let Some(dir) = &cli.poc_dir {
        registry.load_dir(dir)?;
    }

    let locator = RuleLocator::parse(cli.poc.as_deref().unwrap_or("*"));
    // Resolve once up front so a bad selector aborts before scanning and
    // the progress bar knows the batch size.
    let selected = registry.select(&locator)?.len();
    let total_tasks = targets.len() * selected;

    let verbose = cli.debug || cli.info;
    let mut sink = ConsoleSink::new(verbose);
    let progress = if output_format == OutputFormat::Plain && total_tasks > 1 {
        let pb = ProgressBar::new(total_tasks as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };
    if let Some(pb) = &progress {
        sink = sink.with_progress(pb.clone());
    }

    let engine = ScanEngine::new(
        Arc::new(transport),
        correlator,
        Arc::new(registry),
        EngineSettings::default()
            .with_concurrency(concurrency)
            .with_rate(rate),
    )
    .with_sink(Arc::new(sink));

    // Ctrl-C stops further dispatch; in-flight probes finish and settle.
    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            output::print_warning("interrupt received, letting in-flight probes finish");
            cancel.cancel();
        }
    });

    if output_format == OutputFormat::Plain {
        output::print_run_header(targets.len(), selected, concurrency, rate);
    }

    let started = Utc::now();
    let verdicts = match (&targets[..], &locator) {
        ([single], RuleLocator::Exact(name)) => vec![engine.probe_single(single, name).await?],
        ([single], _) => engine.probe_target(single, &locator).await?,
        (_, RuleLocator::Exact(name)) => engine.probe_targets(&targets, name).await?,
        _ => engine.probe_batch(&targets, &locator).await?,
    };
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = RunReport::new(targets.len(), selected, started, verdicts);
    output::format_report(&report, output_format)?;

    if let Some(path) = &cli.out {
        let rendered = output::render_report(&report, output_format)?;
        fs::write(path, rendered)?;
        output::print_info(&format!("report written to {}", path.display()));
    }

    Ok(())
}

/// The `-o` flag wins; otherwise the settings file supplies the format,
/// falling back to plain when its value is unrecognized.
fn resolve_output_format(flag: Option<OutputFormat>, settings: &AppSettings) -> OutputFormat {
    flag.unwrap_or_else(|| {
        settings.default_output_format.parse().unwrap_or_else(|e| {
            warn!("{e} in settings, falling back to plain");
            OutputFormat::Plain
        })
    })
}

/// Collect targets from the three input flags, in flag order.
fn assemble_targets(cli: &Cli) -> CliResult<Vec<Target>> {
    let mut targets = Vec::new();

    if let Some(raw) = &cli.target {
        targets.push(Target::parse(raw)?);
    }
    if let Some(file) = &cli.target_file {
        for line in fs::read_to_string(file)?.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            targets.push(Target::parse(line)?);
        }
    }
    if let Some(file) = &cli.raw_file {
        let raw = fs::read_to_string(file)?;
        targets.push(Target::from_raw(&raw, cli.ssl)?);
    }

    if let Some(cookie) = &cli.cookie {
        targets = targets
            .into_iter()
            .map(|target| target.with_cookie(cookie))
            .collect::<Result<_, _>>()?;
    }

    Ok(targets)
}

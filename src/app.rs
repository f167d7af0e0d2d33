//! Command execution: file resolution, engine wiring and exit codes.
//!
//! This module turns CLI parameters into engine invocations. It resolves
//! file and directory arguments into a sorted, de-duplicated list of `.sol`
//! paths, wires the cache and the progress bar, runs the fix pipeline when
//! requested and maps the aggregate report onto the process exit code:
//!
//! - `0` - no findings at `ERROR` severity
//! - `1` - at least one `ERROR` finding
//! - `2` - invalid usage, or files that only produced parse errors

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cache::{AnalysisCache, CacheConfig},
    cli::Format,
    config::{AnalyzerConfig, CONFIG_FILE_NAME},
    engine::{AnalysisEngine, AnalyzeOptions},
    error::{AppResult, config_error},
    fix::{apply_fixes, render_diff, write_fixed},
    output::{OutputFormat, OutputOptions, format_report},
    rules::AnalysisReport
};

/// Parameters for the check command.
#[derive(Debug, Clone)]
pub struct CheckParams {
    /// Files or directories to analyze.
    pub paths:           Vec<PathBuf>,
    /// Explicit config file path; discovered otherwise.
    pub config_path:     Option<PathBuf>,
    /// Output format for the report.
    pub output_format:   Format,
    /// Rewrite files with their fixable issues applied.
    pub fix:             bool,
    /// Print fixes as a diff without writing.
    pub diff:            bool,
    /// Keep a backup next to every rewritten file.
    pub backup:          bool,
    /// Parallel files, 0 meaning one per CPU.
    pub max_concurrency: usize,
    /// Directory for the persistent cache snapshot.
    pub cache_dir:       Option<PathBuf>,
    /// Disable caching entirely.
    pub no_cache:        bool,
    /// Include suggestions in text output.
    pub verbose:         bool,
    /// Suppress the progress bar.
    pub quiet:           bool,
    /// Disable colored terminal output.
    pub no_color:        bool
}

/// Output from a command execution, ready for display.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code for the process (0, 1, or 2).
    pub exit_code: i32,
    /// Lines to print to stdout.
    pub stdout:    Vec<String>
}

/// Execute the check command.
///
/// # Errors
///
/// Fails on invalid usage: no Solidity files resolved, or an unreadable or
/// structurally invalid configuration file.
pub fn run_check(params: CheckParams) -> AppResult<CommandOutput> {
    let config = load_config(params.config_path.as_deref())?;
    let files = resolve_files(&params.paths)?;
    let total = files.len();

    let cache = (!params.no_cache).then(|| {
        Arc::new(AnalysisCache::load(CacheConfig {
            directory: params.cache_dir.clone(),
            ..CacheConfig::default()
        }))
    });

    let mut engine = AnalysisEngine::new();
    if let Some(cache) = &cache {
        engine = engine.with_cache(Arc::clone(cache));
    }

    let progress = (!params.quiet).then(|| {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{bar:30} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("analyzing");
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });
    let on_progress = progress.clone().map(|bar| {
        let callback: crate::engine::ProgressCallback =
            Arc::new(move |completed, _total| bar.set_position(completed as u64));
        callback
    });

    let report = engine.analyze(AnalyzeOptions {
        files,
        config,
        max_concurrency: params.max_concurrency,
        on_progress,
        ..AnalyzeOptions::default()
    })?;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    if let Some(cache) = &cache
        && let Err(error) = cache.save()
    {
        eprintln!("warning: could not save cache snapshot: {}", error);
    }

    let mut stdout = Vec::new();
    if params.fix || params.diff {
        stdout.extend(run_fixes(&report, &params)?);
    }

    let output_opts = OutputOptions {
        format:  match params.output_format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json
        },
        colored: !params.no_color,
        verbose: params.verbose
    };
    stdout.push(format_report(&report, &output_opts));

    Ok(CommandOutput {
        exit_code: calculate_exit_code(&report),
        stdout
    })
}

/// Load the effective configuration.
///
/// Uses the explicit path when given, otherwise `.solidity-analyzer.json`
/// in the working directory when present, otherwise defaults.
fn load_config(explicit: Option<&Path>) -> AppResult<AnalyzerConfig> {
    if let Some(path) = explicit {
        return AnalyzerConfig::load(&path.to_string_lossy());
    }
    if Path::new(CONFIG_FILE_NAME).exists() {
        return AnalyzerConfig::load(CONFIG_FILE_NAME);
    }
    Ok(AnalyzerConfig::default())
}

/// Resolve file and directory arguments into a sorted, de-duplicated list
/// of Solidity files.
///
/// Explicit file arguments are kept even when missing so the report carries
/// one entry (with a read failure) per requested file.
///
/// # Errors
///
/// Fails when no Solidity files are resolved at all.
pub fn resolve_files(paths: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_sol_files(path, &mut files);
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    if files.is_empty() {
        return Err(config_error("No Solidity files found in the given paths"));
    }
    Ok(files)
}

fn collect_sol_files(directory: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(directory) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_sol_files(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "sol") {
            files.push(path);
        }
    }
}

/// Apply or preview fixes for every file with fixable issues.
fn run_fixes(report: &AnalysisReport, params: &CheckParams) -> AppResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut applied_total = 0usize;
    let mut skipped_total = 0usize;

    for file in &report.files {
        if !file.issues.iter().any(|issue| issue.fix.is_some()) {
            continue;
        }
        let path = Path::new(&file.file_path);
        let Ok(source) = fs::read_to_string(path) else {
            continue;
        };
        let result = apply_fixes(&file.file_path, &source, &file.issues);
        applied_total += result.fixes_applied();
        skipped_total += result.fixes_skipped();
        if params.diff {
            lines.push(render_diff(&result, !params.no_color));
        }
        if params.fix && result.fixes_applied() > 0 {
            let backup_extension = params.backup.then_some(".bak");
            write_fixed(path, &result.output, backup_extension)?;
        }
    }

    if params.fix || params.diff {
        lines.push(format!(
            "{} fix(es) {}, {} skipped",
            applied_total,
            if params.fix { "applied" } else { "previewed" },
            skipped_total
        ));
    }
    Ok(lines)
}

/// Calculates the process exit code from the aggregate report.
///
/// Error-severity findings dominate; a run whose only output is parse
/// errors signals `2` so CI can distinguish broken inputs from findings.
pub fn calculate_exit_code(report: &AnalysisReport) -> i32 {
    if report.error_count() > 0 {
        1
    } else if report.has_parse_errors {
        2
    } else {
        0
    }
}

//! Analysis orchestration.
//!
//! [`AnalysisEngine`] ties the pieces together: for every input file it
//! probes the cache, parses the source, runs each registered rule against a
//! shared [`AnalysisContext`], sorts the collected issues and stores the
//! result. Files are processed on a bounded [`rayon`] pool; rules within a
//! single file always run sequentially, in registry order, so output is
//! deterministic regardless of the concurrency setting.
//!
//! Failure containment:
//! - a file that cannot be read or parsed yields a report with
//!   `parse_errors` and no issues, and the run continues;
//! - a rule that returns an error or panics yields one internal-rule-error
//!   diagnostic naming the rule, and the remaining rules still run.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering}
    },
    time::Instant
};

use rayon::prelude::*;

use crate::{
    cache::{AnalysisCache, config_signature, fingerprint, rule_set_signature},
    config::AnalyzerConfig,
    context::AnalysisContext,
    error::{AppError, AppResult},
    parser::{ParseOptions, SolidityParser, SourceParser},
    rules::{AnalysisReport, FileReport, Issue, RuleRegistry, Severity},
    source::{Position, SourceRange, SourceView}
};

/// Serialized progress callback: `(completed, total)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Cooperative cancellation flag checked between files and between rules.
///
/// An in-flight file completes before the engine returns; files not yet
/// started are omitted from the aggregate.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Inputs of one [`AnalysisEngine::analyze`] run.
pub struct AnalyzeOptions {
    /// Files to analyze; sorted and de-duplicated by the engine
    pub files:           Vec<PathBuf>,
    /// Effective configuration
    pub config:          AnalyzerConfig,
    /// Parallel files; `0` means one per available CPU
    pub max_concurrency: usize,
    /// Invoked after each file with a monotonically increasing counter
    pub on_progress:     Option<ProgressCallback>,
    /// Checked between files and between rules
    pub cancellation:    CancellationToken
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            files:           Vec::new(),
            config:          AnalyzerConfig::default(),
            max_concurrency: 0,
            on_progress:     None,
            cancellation:    CancellationToken::new()
        }
    }
}

/// The core analysis engine.
pub struct AnalysisEngine {
    registry: Arc<RuleRegistry>,
    parser:   Arc<dyn SourceParser>,
    cache:    Option<Arc<AnalysisCache>>
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    /// Engine with all built-in rules, the bundled parser and no cache.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RuleRegistry::with_builtin_rules()),
            parser:   Arc::new(SolidityParser),
            cache:    None
        }
    }

    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_cache(mut self, cache: Arc<AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn cache(&self) -> Option<&AnalysisCache> {
        self.cache.as_deref()
    }

    /// Analyze a set of files on a bounded worker pool.
    ///
    /// Files are reported in resolved-path order independent of completion
    /// order, one report per input file. Progress callbacks are serialized
    /// and the counter is monotonically increasing.
    ///
    /// # Errors
    ///
    /// Only worker-pool construction can fail; per-file and per-rule
    /// failures are contained in the report.
    pub fn analyze(&self, options: AnalyzeOptions) -> AppResult<AnalysisReport> {
        let started = Instant::now();
        let mut files = options.files;
        files.sort();
        files.dedup();
        let total = files.len();

        let threads = if options.max_concurrency == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            options.max_concurrency
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build worker pool: {}", e)))?;

        let rule_signature = rule_set_signature(&self.registry, &options.config);
        let cfg_signature = config_signature(&options.config);
        let progress = Mutex::new(0usize);
        let config = &options.config;
        let cancellation = &options.cancellation;
        let on_progress = options.on_progress.as_ref();

        let reports: Vec<FileReport> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    if cancellation.is_cancelled() {
                        return None;
                    }
                    let report = self.analyze_path(path, config, rule_signature, cfg_signature, cancellation);
                    if let Ok(mut completed) = progress.lock() {
                        *completed += 1;
                        if let Some(callback) = on_progress {
                            callback(*completed, total);
                        }
                    }
                    Some(report)
                })
                .filter_map(|report| report)
                .collect()
        });

        Ok(AnalysisReport::from_files(
            reports,
            started.elapsed().as_millis() as u64
        ))
    }

    /// Analyze a single file.
    ///
    /// Read failures are recorded as parse failures on the report, never
    /// returned as errors.
    pub fn analyze_file(&self, path: &std::path::Path, config: &AnalyzerConfig) -> FileReport {
        let rule_signature = rule_set_signature(&self.registry, config);
        let cfg_signature = config_signature(config);
        self.analyze_path(path, config, rule_signature, cfg_signature, &CancellationToken::new())
    }

    fn analyze_path(
        &self,
        path: &std::path::Path,
        config: &AnalyzerConfig,
        rule_signature: u64,
        config_signature: u64,
        cancellation: &CancellationToken
    ) -> FileReport {
        let file_path = path.to_string_lossy().into_owned();
        match std::fs::read_to_string(path) {
            Ok(source) => self.analyze_source(
                &file_path,
                &source,
                config,
                rule_signature,
                config_signature,
                cancellation
            ),
            Err(error) => FileReport {
                file_path,
                duration_ms: 0,
                parse_errors: vec![crate::parser::ParseDiagnostic {
                    message:  format!("Cannot read file: {}", error),
                    location: None
                }],
                issues: Vec::new()
            }
        }
    }

    /// Analyze in-memory source, going through the cache when one is set.
    pub fn analyze_source(
        &self,
        file_path: &str,
        source: &str,
        config: &AnalyzerConfig,
        rule_signature: u64,
        config_signature: u64,
        cancellation: &CancellationToken
    ) -> FileReport {
        let key = fingerprint(source, rule_signature, config_signature);
        match &self.cache {
            Some(cache) => {
                let (report, _hit) = cache.get_or_compute(key, || {
                    self.run_rules(file_path, source, config, cancellation)
                });
                report
            }
            None => self.run_rules(file_path, source, config, cancellation)
        }
    }

    fn run_rules(
        &self,
        file_path: &str,
        source: &str,
        config: &AnalyzerConfig,
        cancellation: &CancellationToken
    ) -> FileReport {
        let started = Instant::now();
        let outcome = self.parser.parse(source, &ParseOptions::default());
        let Some(ast) = outcome.ast else {
            return FileReport {
                file_path:    file_path.to_string(),
                duration_ms:  started.elapsed().as_millis() as u64,
                parse_errors: outcome.errors,
                issues:       Vec::new()
            };
        };

        let view = SourceView::new(source);
        let mut context = AnalysisContext::new(file_path, &view, &ast, config);
        let mut internal_errors: Vec<Issue> = Vec::new();

        for (rule_id, rule) in self.registry.iter() {
            if cancellation.is_cancelled() {
                break;
            }
            let meta = rule.meta();
            let severity = config.severity_for(rule_id, meta.severity);
            if severity == Severity::Off {
                continue;
            }
            context.begin_rule(rule_id, meta.category, severity);
            let outcome = catch_unwind(AssertUnwindSafe(|| rule.analyze(&mut context)));
            context.end_rule();
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(error)) => Some(error.to_string()),
                Err(panic) => Some(panic_message(panic))
            };
            if let Some(failure) = failure {
                internal_errors.push(internal_rule_error(rule_id, &meta, file_path, &failure));
            }
        }

        let mut issues = context.into_issues();
        issues.extend(internal_errors);
        sort_issues(&mut issues);

        FileReport {
            file_path: file_path.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            parse_errors: outcome.errors,
            issues
        }
    }
}

/// Issues are reported sorted by `(start.line, start.column, rule_id)`.
fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        (a.location.start.line, a.location.start.column, a.rule_id.as_str()).cmp(&(
            b.location.start.line,
            b.location.start.column,
            b.rule_id.as_str()
        ))
    });
}

/// Diagnostic synthesized when a rule fails; the engine keeps running.
fn internal_rule_error(
    rule_id: &str,
    meta: &crate::rules::RuleMeta,
    file_path: &str,
    failure: &str
) -> Issue {
    Issue {
        rule_id:    rule_id.into(),
        category:   meta.category,
        severity:   Severity::Error,
        message:    format!("INTERNAL_RULE_ERROR: rule '{}' failed: {}", rule_id, failure),
        file_path:  file_path.to_string(),
        location:   SourceRange::new(Position::file_start(), Position::file_start()),
        fix:        None,
        suggestion: None
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}

mod types;
mod error;
mod config;
mod filters;
mod ingest;
mod attribution;
mod analyzers;
mod report;
mod reporters;
mod export;

use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use attribution::resolver::AuthorResolver;
use config::BylineConfig;
use error::AnalysisError;
use report::RankSettings;
use types::*;

#[derive(Parser, Debug)]
#[command(
    name = "byline-rank",
    about = "📰 Rank article contributors from web-analytics exports",
    version,
    long_about = "Reads article-level analytics exports (CSV) and ranks contributors by\n\
                  views, visitors, social referrals, new visitors and engaged minutes,\n\
                  overall and month by month, with tie-aware top-N tables and a\n\
                  months-won tally.\n\n\
                  Accepts CSV files and/or directories of CSV files."
)]
struct Args {
    /// CSV export files or directories containing them. Defaults to the current directory.
    #[arg(value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Keep articles published on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    min_date: Option<String>,

    /// Contributors shown in overall rankings [default: 5]
    #[arg(long)]
    top: Option<usize>,

    /// Contributors shown per month [default: 3]
    #[arg(long)]
    top_monthly: Option<usize>,

    /// Exact author name to leave out (repeatable)
    #[arg(long = "ignore-author", value_name = "NAME")]
    ignore_author: Vec<String>,

    /// How a shared article's numbers are credited [default: split]
    #[arg(long, value_enum)]
    credit: Option<CreditPolicy>,

    /// Names in monthly lines and win tables [default: first]
    #[arg(long, value_enum)]
    names: Option<NameStyle>,

    /// Output format: terminal, json [default: terminal]
    #[arg(long)]
    format: Option<String>,

    /// JSON output file (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write CSV slices (per month, per contributor) under this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// YAML config file. CLI flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print an annotated config template (to --output if given) and exit
    #[arg(long)]
    generate_config: bool,

    /// Debug-level diagnostics on stderr
    #[arg(long, short)]
    verbose: bool,
}

/// Run settings after merging CLI flags over the config file.
#[derive(Debug)]
struct Settings {
    inputs:      Vec<PathBuf>,
    min_date:    Option<NaiveDate>,
    top:         usize,
    top_monthly: usize,
    ignored:     Vec<String>,
    credit:      CreditPolicy,
    names:       NameStyle,
    format:      String,
    output:      Option<PathBuf>,
    output_dir:  Option<PathBuf>,
    cohort:      Vec<ContributorId>,
    metrics:     Vec<MetricSpec>,
    averages:    Vec<String>,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.generate_config {
        if let Err(e) = config::print_template(args.output.as_deref()) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let settings = match load_settings(args) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = run_analysis(&settings) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Settings ───────────────────────────────────────────────────────────────────

fn load_settings(args: Args) -> Result<Settings, AnalysisError> {
    let cfg = match &args.config {
        Some(path) => config::load_config(path).map_err(AnalysisError::Config)?,
        None => BylineConfig::default(),
    };
    resolve_settings(args, cfg)
}

/// Merges CLI flags over config values and validates the result. Runs before
/// any input is read so a bad date filter costs nothing.
fn resolve_settings(args: Args, cfg: BylineConfig) -> Result<Settings, AnalysisError> {
    let min_date = match args.min_date.as_deref().or(cfg.min_date.as_deref()) {
        Some(raw) => Some(filters::parse_min_date(raw)?),
        None => None,
    };

    let top = args.top.or(cfg.top).unwrap_or(5);
    let top_monthly = args.top_monthly.or(cfg.top_monthly).unwrap_or(3);
    if top == 0 || top_monthly == 0 {
        return Err(AnalysisError::Config("--top and --top-monthly must be 1 or greater".to_string()));
    }

    let format = args.format.or(cfg.format).unwrap_or_else(|| "terminal".to_string());
    if !matches!(format.as_str(), "terminal" | "json") {
        return Err(AnalysisError::Config(format!(
            "Invalid format \"{format}\". Expected one of: \"terminal\", \"json\""
        )));
    }

    let ignored = if args.ignore_author.is_empty() {
        cfg.ignore_authors.unwrap_or_default()
    } else {
        args.ignore_author
    };

    let inputs = if args.inputs.is_empty() { vec![PathBuf::from(".")] } else { args.inputs };

    Ok(Settings {
        inputs,
        min_date,
        top,
        top_monthly,
        ignored,
        credit: args.credit.or(cfg.credit).unwrap_or(CreditPolicy::EqualSplit),
        names: args.names.or(cfg.names).unwrap_or(NameStyle::First),
        format,
        output: args.output.or(cfg.output.map(PathBuf::from)),
        output_dir: args.output_dir.or(cfg.output_dir.map(PathBuf::from)),
        cohort: cfg.baseline_cohort.unwrap_or_default()
            .into_iter()
            .map(|name| ContributorId::new(name.trim()))
            .collect(),
        metrics: cfg.metrics.unwrap_or_else(default_metrics),
        averages: cfg.averages.unwrap_or_else(|| vec!["engaged_minutes".to_string()]),
    })
}

// ── Analysis pipeline ──────────────────────────────────────────────────────────

fn run_analysis(settings: &Settings) -> Result<(), AnalysisError> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(80));

    let total_start = Instant::now();
    let result = analyze(settings, &pb);
    pb.finish_and_clear();
    let report = result?;

    eprintln!("✔ {} articles, {} contributors from {} file(s) — ⏱ {}",
        report.meta.article_count,
        report.meta.contributor_count,
        report.meta.inputs.len(),
        fmt_dur(total_start.elapsed()),
    );

    match settings.format.as_str() {
        "json" => reporters::json::report_json(&report, settings.output.as_deref())?,
        _ => reporters::terminal::report_terminal(&report, settings.names),
    }
    Ok(())
}

/// Runs every stage up to the finished report, writing slice exports on the way.
fn analyze(settings: &Settings, pb: &ProgressBar) -> Result<Report, AnalysisError> {
    let mut step_start = Instant::now();

    pb.set_message("[1/6] Discovering input files...");
    let paths = ingest::loader::discover_inputs(&settings.inputs)?;
    let t1 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [1/6] Discovering input files ({})          {t1}", paths.len()));

    pb.set_message(format!("[2/6] Parsing {} file(s) in parallel...", paths.len()));
    let loaded = ingest::loader::load_all(&paths, &settings.metrics)?;
    let export_window = ingest::loader::common_export_window(&loaded);
    let mut stats = ingest::normalizer::RowStats::default();
    let mut inputs = Vec::with_capacity(loaded.len());
    let mut records = Vec::new();
    for file in loaded {
        stats.merge(file.stats);
        inputs.push(file.meta);
        records.extend(file.records);
    }
    warn_row_problems(&stats);
    let t2 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [2/6] Parsing {} rows                      {t2}", stats.rows));

    pb.set_message("[3/6] Applying date filter...");
    let records = filters::apply_min_date(records, settings.min_date);
    if records.is_empty() {
        return Err(AnalysisError::NoData { filter: settings.min_date.map(|d| d.to_string()) });
    }
    let undated_count = records.iter().filter(|r| r.published.is_none()).count();
    let article_count = records.iter().map(|r| &r.id).collect::<HashSet<_>>().len();
    let t3 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [3/6] Applying date filter ({} kept)       {t3}", records.len()));

    pb.set_message("[4/6] Attributing and aggregating credit...");
    let resolver = AuthorResolver::new(&settings.ignored);
    let articles = attribution::attribute(records, &resolver);
    let aggregates = analyzers::aggregate::aggregate(&articles, settings.credit);
    let t4 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [4/6] Attributing and aggregating credit    {t4}"));

    pb.set_message("[5/6] Ranking contributors...");
    let overall_range = analyzers::publications::overall_range(&articles, settings.min_date, export_window);
    let rank_settings = RankSettings {
        top: settings.top,
        top_monthly: settings.top_monthly,
        ranked: report::ranked_metrics(&settings.metrics, &settings.averages),
        baseline_cohort: settings.cohort.clone(),
    };
    let metric_reports = report::build_metric_reports(&articles, &aggregates, overall_range, &rank_settings);
    let (contributor_count, collaborator_count) = report::collaboration_summary(&aggregates);
    let t5 = fmt_dur(step_start.elapsed()); step_start = Instant::now();
    pb.println(format!("  ✓ [5/6] Ranking contributors                  {t5}"));

    let now = chrono::Local::now();
    if let Some(root) = &settings.output_dir {
        pb.set_message("[6/6] Exporting CSV slices...");
        let run_name = export::run_dir_name(&now.format("%Y%m%d_%H%M%S").to_string(), settings.min_date, settings.top);
        let summary = export::export_slices(root, &run_name, &articles, &settings.metrics)?;
        let t6 = fmt_dur(step_start.elapsed());
        pb.println(format!("  ✓ [6/6] Exported {} CSV file(s) to {}  {t6}", summary.files, summary.dir.display()));
    }

    Ok(Report {
        meta: ReportMeta {
            inputs,
            min_date: settings.min_date,
            top: settings.top,
            top_monthly: settings.top_monthly,
            ignored_authors: settings.ignored.clone(),
            credit_policy: settings.credit,
            metrics: rank_settings.ranked.iter().map(RankedMetric::label).collect(),
            article_count,
            undated_count,
            contributor_count,
            collaborator_count,
            overall_range,
            analyzed_at: now.to_rfc3339(),
        },
        metrics: metric_reports,
    })
}

/// One warn-level line for all locally recovered row problems.
fn warn_row_problems(stats: &ingest::normalizer::RowStats) {
    if stats.bad_dates > 0 {
        tracing::warn!("{} of {} rows have no usable publish date; they count toward overall totals only",
            stats.bad_dates, stats.rows);
    }
    if stats.bad_numbers > 0 {
        tracing::warn!("{} metric values were not numeric and were counted as 0", stats.bad_numbers);
    }
    if stats.no_authors > 0 {
        tracing::debug!("{} rows have no authors and credit nobody", stats.no_authors);
    }
}

// ── Duration formatting ────────────────────────────────────────────────────────

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 { format!("{:.1}s", d.as_secs_f64()) } else { format!("{ms}ms") }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

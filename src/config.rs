use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use crate::filters::parse_min_date;
use crate::types::{CreditPolicy, MetricSpec, NameStyle};

/// All settings that can be placed in a byline-rank.yml config file.
/// Every field is optional; omitted fields fall back to CLI defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BylineConfig {
    // Analysis defaults (overridden by the corresponding CLI flag)
    pub min_date: Option<String>,
    pub top: Option<usize>,
    pub top_monthly: Option<usize>,
    pub ignore_authors: Option<Vec<String>>,
    pub credit: Option<CreditPolicy>,
    pub names: Option<NameStyle>,
    pub format: Option<String>,
    pub output: Option<String>,
    pub output_dir: Option<String>,

    // File-only settings
    pub baseline_cohort: Option<Vec<String>>,
    pub metrics: Option<Vec<MetricSpec>>,
    pub averages: Option<Vec<String>>,
}

impl BylineConfig {
    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Returns a human-readable error describing exactly what is wrong and what
    /// values are accepted. Called automatically by [`load_config`].
    pub fn validate(&self) -> Result<(), String> {
        if let Some(fmt) = &self.format {
            match fmt.as_str() {
                "terminal" | "json" => {}
                other => {
                    return Err(format!(
                        "Invalid 'format' value: \"{other}\". \
                         Expected one of: \"terminal\", \"json\""
                    ))
                }
            }
        }

        for (name, value) in [("top", self.top), ("top_monthly", self.top_monthly)] {
            if let Some(0) = value {
                return Err(format!("Invalid '{name}' value: 0. Must be 1 or greater"));
            }
        }

        if let Some(raw) = &self.min_date {
            parse_min_date(raw).map_err(|e| format!("Invalid 'min_date': {e}"))?;
        }

        let mut keys: HashSet<&str> = HashSet::new();
        if let Some(metrics) = &self.metrics {
            if metrics.is_empty() {
                return Err("'metrics' must list at least one column (or be omitted)".to_string());
            }
            for m in metrics {
                if m.key.trim().is_empty() || m.column.trim().is_empty() {
                    return Err(format!(
                        "Invalid metric entry (key: \"{}\", column: \"{}\"): \
                         key and column must not be empty",
                        m.key, m.column
                    ));
                }
                if !keys.insert(m.key.as_str()) {
                    return Err(format!("Duplicate metric key '{}'", m.key));
                }
            }
        } else {
            keys.extend(["views", "visitors", "social_refs", "new_visitors", "engaged_minutes"]);
        }

        if let Some(averages) = &self.averages {
            for key in averages {
                if !keys.contains(key.as_str()) {
                    let mut known: Vec<&str> = keys.iter().copied().collect();
                    known.sort_unstable();
                    return Err(format!(
                        "Invalid 'averages' entry '{key}'. Known metric keys: {}",
                        known.join(", ")
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<BylineConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file '{}': {e}", path.display()))?;
    let cfg: BylineConfig = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid config file '{}': {e}", path.display()))?;
    cfg.validate()
        .map_err(|e| format!("Config file '{}': {e}", path.display()))?;
    Ok(cfg)
}

/// Annotated YAML template printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# byline-rank configuration file
# Generated by: byline-rank --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
#
#   byline-rank --config byline-rank.yml exports/

# ── Analysis scope ─────────────────────────────────────────────────────────────

# Keep articles published on or after this date (YYYY-MM-DD). Omit for all dates.
# Undated articles are dropped whenever a date is set.
# min_date: "2024-01-01"

# Number of contributors in the overall rankings. Ties at the cutoff are kept.
# top: 5

# Number of contributors listed per month.
# top_monthly: 3

# Exact author names to drop before credit is allocated.
# ignore_authors:
#   - "Staff"
#   - "Wire Service"

# How a shared article's numbers are credited: split (divide evenly) or full
# (every co-author gets the whole value, so totals can exceed the export).
# credit: split

# Names in monthly lines and win tables: first (first name) or full.
# names: first

# ── Output ─────────────────────────────────────────────────────────────────────

# Output format: terminal, json
# format: "terminal"

# JSON output file. Defaults to stdout.
# output: "ranking.json"

# Directory for per-month and per-author CSV slices. Omit to skip exports.
# output_dir: "exports"

# ── Comparisons ────────────────────────────────────────────────────────────────

# Contributors whose average (of non-zero values) the leader is compared against.
# baseline_cohort:
#   - "Jane Doe"
#   - "John Roe"

# ── Metrics ────────────────────────────────────────────────────────────────────
# Additive columns to rank by. Replaces the built-in list when set.

# metrics:
#   - { key: views,           column: "Views",           label: "VIEWS" }
#   - { key: visitors,        column: "Visitors",        label: "VISITORS" }
#   - { key: social_refs,     column: "Social refs",     label: "SOCIAL REFS" }
#   - { key: new_visitors,    column: "New vis.",        label: "NEW VISITORS" }
#   - { key: engaged_minutes, column: "Engaged minutes", label: "ENGAGED MINUTES" }

# Metric keys also ranked as a per-article average.
# averages:
#   - engaged_minutes
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE)
            .map_err(|e| format!("Cannot write config template to '{}': {e}", path.display())),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

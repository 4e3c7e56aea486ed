use colored::Colorize;
use comfy_table::{Table, Cell, Color, Attribute, presets::UTF8_FULL};
use crate::types::{MetricReport, NameStyle, PeriodRanking, RankedMetric, Ranking, Report, ReportMeta, WinRecord};

pub fn report_terminal(report: &Report, names: NameStyle) {
    eprintln!();
    print_header(&report.meta);

    for m in &report.metrics {
        print_overall(m, report.meta.top);
    }

    println!("{}", "═".repeat(62).bright_black());
    println!("{}", "📅 MONTHLY LEADERS".cyan().bold());
    println!("{}", "═".repeat(62).bright_black());
    for m in &report.metrics {
        print_monthly(m, names);
    }
    println!();
}

// ─── Sections ─────────────────────────────────────────────────────────────────

fn print_header(meta: &ReportMeta) {
    println!(
        "{} — {} articles, {} contributors",
        "📰 byline-rank".cyan().bold(),
        meta.article_count.to_string().bright_black(),
        meta.contributor_count.to_string().bright_black(),
    );
    println!();

    println!("{}", "Input files:".bold());
    for f in &meta.inputs {
        println!(
            "   {} {} {}",
            "•".white(),
            f.name,
            format!(
                "({} rows, modified {})",
                f.rows,
                f.modified.as_deref().unwrap_or("unknown"),
            ).bright_black(),
        );
    }

    let filter = meta.min_date
        .map_or_else(|| "all dates".to_string(), |d| format!("on or after {d}"));
    println!("{} {}", "Published:".bold(), filter);
    if let Some(range) = &meta.overall_range {
        println!("{} {} to {}", "Range:".bold(), range.start, range.last_day());
    }
    println!("{} {} overall, {} per month", "Top N:".bold(), meta.top, meta.top_monthly);
    let ignored = if meta.ignored_authors.is_empty() {
        "none".to_string()
    } else {
        meta.ignored_authors.join(", ")
    };
    println!("{} {}", "Ignored authors:".bold(), ignored);
    println!("{} {}", "Credit:".bold(), meta.credit_policy);
    println!("{} {}", "Metrics:".bold(), meta.metrics.join(", "));
    println!();

    println!(
        "{} {} unique contributors, {} ({}) with collaborations",
        "Summary:".bold(),
        meta.contributor_count,
        meta.collaborator_count,
        share(meta.collaborator_count, meta.contributor_count),
    );
    if meta.undated_count > 0 {
        println!(
            "{}",
            format!("   {} undated article(s) count toward overall totals only", meta.undated_count).yellow()
        );
    }
    println!();
}

fn print_overall(m: &MetricReport, top: usize) {
    let label = m.metric.label();
    let title = format!("🏆 TOP {top} BY {label}");
    match m.overall.leader_gap {
        Some(gap) => println!("{}   {}", title.cyan().bold(), format!("1st vs 2nd: {}", signed_pct(gap)).bright_black()),
        None      => println!("{}", title.cyan().bold()),
    }

    if m.overall.is_empty() {
        println!("{}", "  No contributors to rank.".yellow());
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["RANK", "CONTRIBUTOR", label.as_str(), "ARTICLES", "SOLO/COLLAB"]);

    for e in &m.overall.entries {
        let tied = m.overall.groups.iter().any(|g| g.rank == e.rank && g.is_tie());
        table.add_row(vec![
            rank_cell(e.rank, tied),
            Cell::new(e.contributor.as_str()),
            Cell::new(format_value(&m.metric, e.value)),
            Cell::new(e.article_count.to_string()),
            Cell::new(format!("{}/{}", e.solo_count, e.collab_count)).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");

    if let Some(b) = &m.baseline {
        println!(
            "   {} {}",
            format!("Leader vs baseline avg ({}):", format_value(&m.metric, b.mean)).bright_black(),
            signed_pct(b.gap),
        );
    }
    println!();
}

fn print_monthly(m: &MetricReport, names: NameStyle) {
    println!();
    println!("{}", format!("{} BY MONTH", m.metric.label()).cyan().bold());

    if !m.wins.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["CONTRIBUTOR", "MONTHS WON", "TIED"]);
        for w in &m.wins {
            table.add_row(win_row(w, names));
        }
        println!("{table}");
    }

    for p in &m.periods {
        println!("  {}", format_period_line(p, &m.metric, names));
    }
}

// ─── Cell builders ────────────────────────────────────────────────────────────

/// Tied ranks are repeated and highlighted so the tie is visible in the table.
fn rank_cell(rank: usize, tied: bool) -> Cell {
    let text = format!("{rank:3}");
    match (rank, tied) {
        (1, _)     => Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold),
        (_, true)  => Cell::new(text).fg(Color::Yellow),
        _          => Cell::new(text),
    }
}

fn win_row(w: &WinRecord, names: NameStyle) -> Vec<Cell> {
    let tied = if w.tied_wins > 0 {
        Cell::new(format!("({} tied)", w.tied_wins)).fg(Color::Yellow)
    } else {
        Cell::new("").fg(Color::DarkGrey)
    };
    vec![
        Cell::new(names.render(&w.contributor)),
        Cell::new(w.wins.to_string()),
        tied,
    ]
}

// ─── Formatting helpers ───────────────────────────────────────────────────────

/// `2024-07  [Jane, John] TIE, Bob - 100, 100, 50 - 2, 1, 3`
///
/// Only a tied first place is bracket-grouped; lower ties are listed plainly.
pub fn format_period_line(p: &PeriodRanking, metric: &RankedMetric, names: NameStyle) -> String {
    if p.ranking.is_empty() {
        return format!("{}  [No data]", p.period);
    }
    let shown = names_for(&p.ranking, names);
    let values: Vec<String> = p.ranking.entries.iter().map(|e| format_value(metric, e.value)).collect();
    let articles: Vec<String> = p.ranking.entries.iter().map(|e| e.article_count.to_string()).collect();
    format!("{}  {} - {} - {}", p.period, shown.join(", "), values.join(", "), articles.join(", "))
}

fn names_for(ranking: &Ranking, names: NameStyle) -> Vec<String> {
    ranking.groups.iter().flat_map(|g| {
        let rendered: Vec<String> = g.members.iter().map(|m| names.render(m).to_string()).collect();
        if g.rank == 1 && g.is_tie() {
            vec![format!("[{}] TIE", rendered.join(", "))]
        } else {
            rendered
        }
    }).collect()
}

/// Counts and sums print as whole numbers; averages keep one decimal.
pub fn format_value(metric: &RankedMetric, value: f64) -> String {
    if metric.is_average() { format!("{value:.1}") } else { format!("{value:.0}") }
}

fn signed_pct(gap: f64) -> String {
    if gap >= 0.0 { format!("+{gap:.1}%") } else { format!("{gap:.1}%") }
}

fn share(part: usize, whole: usize) -> String {
    if whole == 0 { return "0%".to_string(); }
    format!("{:.0}%", part as f64 / whole as f64 * 100.0)
}

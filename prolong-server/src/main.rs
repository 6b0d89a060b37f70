use std::process;
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use serde::Serialize;

use prolong_pipeline::cohort::{ManagerCohort, MonthlyCohort};
use prolong_pipeline::report::{CohortReport, ProlongationReport};
use prolong_pipeline::table_loader::{load_roster_file, load_shipments_file};
use prolong_pipeline::types::{CohortQuery, ProjectSummary};
use prolong_pipeline::ProlongationPipeline;

/// Contract prolongation cohort report.
#[derive(Parser, Debug)]
#[command(name = "prolong-server", version, about)]
struct Args {
    /// Roster CSV: project id, account manager, scheduled renewal month
    #[arg(long)]
    roster: String,

    /// Shipment CSV: project id plus one column per "<month> <year>"
    #[arg(long)]
    shipments: String,

    /// Reporting year (default: latest year in the shipment table)
    #[arg(long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    /// Number of top managers in the overview
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Number of per-project diagnostic rows in text output
    #[arg(long, default_value_t = 5)]
    diagnostics: usize,
}

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReportJson<'a> {
    generated_at: String,
    load_ms: u128,
    pipeline_ms: u128,
    report: &'a CohortReport,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn format_amount(amount: f64) -> String {
    let whole = amount.abs().round() as u64;
    let sign = if amount < 0.0 { "-" } else { "" };

    let s = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped.chars().rev().collect::<String>())
}

fn print_banner(title: &str) {
    let width = 62;
    println!();
    println!("  \u{2554}{}\u{2557}", "\u{2550}".repeat(width));
    println!("  \u{2551}{:^width$}\u{2551}", title, width = width);
    println!("  \u{255a}{}\u{255d}", "\u{2550}".repeat(width));
    println!();
}

fn print_section(title: &str) {
    println!("  {}", title);
    println!("  {:\u{2500}<64}", "");
}

fn print_monthly(rows: &[MonthlyCohort]) {
    print_section("Monthly cohorts");
    println!(
        "  {:<10} {:>7} {:>7} {:>12} {:>12} {:>12} {:>12}",
        "Month", "M1", "M2", "Base M1", "Fwd M1", "Base M2", "Fwd M2"
    );
    for row in rows {
        println!(
            "  {:<10} {:>7.3} {:>7.3} {:>12} {:>12} {:>12} {:>12}",
            row.title,
            row.coef_m1,
            row.coef_m2,
            format_amount(row.sums.base_m1),
            format_amount(row.sums.forward_m1),
            format_amount(row.sums.base_m2),
            format_amount(row.sums.forward_m2)
        );
    }
    println!();
}

fn print_managers(rows: &[ManagerCohort]) {
    print_section("Manager cohorts");
    println!(
        "  {:<24} {:>8} {:>7} {:>7} {:>12} {:>12}",
        "Manager", "Projects", "M1", "M2", "Base M1", "Base M2"
    );
    for row in rows {
        if row.is_department {
            println!("  {:\u{2500}<64}", "");
        }
        println!(
            "  {:<24} {:>8} {:>7.3} {:>7.3} {:>12} {:>12}",
            row.manager,
            row.project_count,
            row.coef_m1,
            row.coef_m2,
            format_amount(row.sums.base_m1),
            format_amount(row.sums.base_m2)
        );
    }
    println!();
}

fn print_diagnostics(projects: &[ProjectSummary], limit: usize) {
    if limit == 0 || projects.is_empty() {
        return;
    }
    print_section(&format!("Projects (first {} of {})", limit.min(projects.len()), projects.len()));
    for p in projects.iter().take(limit) {
        let terminal = p
            .terminal_period()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".into());
        let scheduled = p
            .scheduled_renewal
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "  #{:<8} {:<20} last {}  scheduled {}  ship {} / {} / {}",
            p.project_id,
            p.manager.as_deref().unwrap_or("-"),
            terminal,
            scheduled,
            format_amount(p.ship_last),
            format_amount(p.ship_m1),
            format_amount(p.ship_m2)
        );
        if let Some(reason) = &p.duplicate_reason {
            println!("            duplicate: {}", reason);
        }
    }
    println!();
}

fn print_human(report: &ProlongationReport, diagnostics: usize, load_ms: u128, pipeline_ms: u128) {
    print_banner(&format!("PROLONGATION REPORT \u{00b7} {}", report.reporting_year));

    let overview = &report.overview;
    println!(
        "  {} projects in scope  \u{00b7}  department M1 {:.3}  \u{00b7}  M2 {:.3}",
        overview.project_count, overview.coef_m1, overview.coef_m2
    );
    if !overview.top_managers.is_empty() {
        let top: Vec<String> = overview
            .top_managers
            .iter()
            .map(|m| format!("{} ({:.3})", m.manager, m.coef_m1))
            .collect();
        println!("  Top by M1: {}", top.join(", "));
    }
    println!();

    print_monthly(&report.monthly);
    print_managers(&report.managers);
    print_diagnostics(&report.projects, diagnostics);

    println!("  Loaded in {}ms  \u{00b7}  pipeline {}ms", load_ms, pipeline_ms);
    println!();
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let load_start = Instant::now();
    let shipments = match load_shipments_file(&args.shipments) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error loading shipments: {}", e);
            process::exit(1);
        }
    };
    let roster = match load_roster_file(&args.roster) {
        Ok(roster) => roster,
        Err(e) => {
            eprintln!("Error loading roster: {}", e);
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();
    log::info!(
        "loaded {} shipment rows, {} month columns, {} roster entries",
        shipments.rows.len(),
        shipments.months.len(),
        roster.len()
    );

    let pipeline_start = Instant::now();
    let pipeline = ProlongationPipeline::new(shipments, roster);
    let query = CohortQuery::new("prolongation-001", args.year);
    let report = match pipeline.report(query, args.top).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let pipeline_ms = pipeline_start.elapsed().as_millis();

    if args.json {
        let output = ReportJson {
            generated_at: Utc::now().to_rfc3339(),
            load_ms,
            pipeline_ms,
            report: &report,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    match &report {
        CohortReport::Ready(report) => print_human(report, args.diagnostics, load_ms, pipeline_ms),
        CohortReport::NoData { reporting_year } => {
            println!();
            println!("  No projects with a renewal window in {}.", reporting_year);
            println!();
        }
    }
}

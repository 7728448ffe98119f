//! Offline inspection of the report store.
//!
//! Lists stored reports with optional filters, either as a readable
//! table or as JSON for further processing.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use report_bot::reports::{
    ReportFilter, ReportStatus, StatusCounts, load_reports, render::truncate,
};

/// Report store inspector.
#[derive(Parser, Debug)]
#[command(name = "report_admin")]
#[command(about = "Lists reports collected by the report bot")]
#[command(version)]
struct Args {
    /// Path to the reports JSON file.
    #[arg(short, long, default_value = "reports.json")]
    file: String,

    /// Only show reports with this status (pending, resolved, rejected).
    #[arg(short, long)]
    status: Option<ReportStatus>,

    /// Only show reports filed by this user id.
    #[arg(short, long)]
    reporter: Option<i64>,

    /// Show at most this many reports, newest first.
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print the matching reports as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let reports = match load_reports(Path::new(&args.file)).await {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("✗ Failed to load reports: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = ReportFilter {
        status: args.status,
        reporter: args.reporter,
        limit: args.limit,
    };
    let selected = filter.apply(&reports);

    if args.json {
        return match serde_json::to_string_pretty(&selected) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("✗ Failed to encode reports: {e}");
                ExitCode::FAILURE
            }
        };
    }

    println!("Reports in: {}\n", args.file);

    for report in &selected {
        println!(
            "#{} {} [{}] {} {} ({})",
            report.id,
            report.created_at.format("%Y-%m-%d %H:%M"),
            report.status,
            report.kind,
            report.target,
            report.reason.title(),
        );
        println!(
            "  by {} ({}): {}",
            report.reporter.full_name,
            report.reporter.id,
            truncate(&report.details, 60)
        );
        if let Some(admin) = report.reviewed_by {
            println!("  reviewed by {admin}");
        }
    }

    let counts = StatusCounts::tally(&reports);
    if !selected.is_empty() {
        println!();
    }
    println!("Shown: {}/{}", selected.len(), counts.total());
    println!(
        "Pending: {}  Resolved: {}  Rejected: {}",
        counts.pending, counts.resolved, counts.rejected
    );

    ExitCode::SUCCESS
}

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use obligo_report::config::AppConfig;
use obligo_report::error::AppError;
use obligo_report::report::{
    self, table::DataTable, OutputSelection, ReportError, ReportRequest, REQUIRED_COLUMNS,
};
use obligo_report::telemetry;
use obligo_report::workbook::{self, SourceWorkbook};

#[derive(Parser, Debug)]
#[command(
    name = "obligo-report",
    about = "Filter a weekly work-order export and generate a styled Obligo report",
    version
)]
struct Cli {
    /// Work-order export for the current week (.xlsx or .xls)
    input: PathBuf,

    /// Previous-week export(s) for the comparison sheet (repeatable)
    #[arg(long = "previous", value_name = "FILE")]
    previous: Vec<PathBuf>,

    /// Sheet to read from the current file (default: first sheet whose name
    /// contains DOWNLOAD)
    #[arg(long)]
    sheet: Option<String>,

    /// Sheet to read from every previous-week file (default: the DOWNLOAD
    /// heuristic per file)
    #[arg(long)]
    previous_sheet: Option<String>,

    /// Column to include in the combined and per-person sheets (repeatable;
    /// default: the standard selection)
    #[arg(long = "column", value_name = "NAME")]
    columns: Vec<String>,

    /// Keep automated orders (descriptions ending in digits followed by 'w')
    #[arg(long)]
    keep_automated: bool,

    /// Skip the combined AllesBijElkaar sheet
    #[arg(long)]
    no_everything: bool,

    /// Write one sheet per person
    #[arg(long)]
    per_name: bool,

    /// Skip the GegroepeerdOverzicht task-count sheet
    #[arg(long)]
    no_aggregated: bool,

    /// Output path (default: output_<date>.xlsx in the configured output
    /// directory)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Evaluation date for the delivery-date cutoff (YYYY-MM-DD, defaults to
    /// today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    output: PathBuf,
    sheets: Vec<String>,
    filtered_rows: usize,
    previous_files_used: usize,
    previous_files_skipped: usize,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let current = load_table(&cli.input, cli.sheet.as_deref())?;

    let selected_columns = if cli.columns.is_empty() {
        report::default_column_selection(&current)
    } else {
        cli.columns.clone()
    };

    let mut previous_tables = Vec::new();
    let mut previous_skipped = 0usize;
    for path in &cli.previous {
        match load_table(path, cli.previous_sheet.as_deref()) {
            Ok(table) => previous_tables.push(table),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping previous-week file");
                previous_skipped += 1;
            }
        }
    }
    if !cli.previous.is_empty() && previous_tables.is_empty() {
        warn!("no previous-week file could be read; the comparison sheet is skipped");
    }

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let request = ReportRequest {
        selected_columns,
        exclude_automated: !cli.keep_automated,
        outputs: OutputSelection {
            everything: !cli.no_everything,
            per_name: cli.per_name,
            aggregated: !cli.no_aggregated,
            comparison: !previous_tables.is_empty(),
        },
        today,
    };

    let bundle = report::build_report(&current, &previous_tables, &request)?;
    let bytes = workbook::write_workbook(&bundle.sheets)?;
    let output = cli.output.unwrap_or_else(|| {
        config
            .output_dir
            .join(format!("output_{}.xlsx", today.format("%Y-%m-%d")))
    });
    std::fs::write(&output, &bytes)?;
    info!(file = %output.display(), sheets = bundle.sheets.len(), "report written");

    let summary = RunSummary {
        output,
        sheets: bundle.sheets.into_iter().map(|sheet| sheet.name).collect(),
        filtered_rows: bundle.filtered_rows,
        previous_files_used: previous_tables.len(),
        previous_files_skipped: previous_skipped,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Open a workbook, pick its sheet, and locate + normalize the embedded table.
fn load_table(path: &Path, sheet_override: Option<&str>) -> Result<DataTable, AppError> {
    let mut source = SourceWorkbook::open(path)?;
    let sheet = source.pick_sheet(sheet_override)?;
    info!(file = %path.display(), sheet = %sheet, "reading work-order sheet");

    let grid = source.read_grid(&sheet)?;
    let mut table =
        report::locate_table(&grid, &REQUIRED_COLUMNS).ok_or(ReportError::TableNotFound)?;
    table.normalize_headers();
    Ok(table)
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(
            parse_date(" 2026-08-28 ").expect("valid date"),
            NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date")
        );
        assert!(parse_date("28-08-2026").is_err());
    }

    #[test]
    fn cli_parses_repeatable_flags() {
        let cli = Cli::parse_from([
            "obligo-report",
            "huidige.xlsx",
            "--previous",
            "wk33.xlsx",
            "--previous",
            "wk32.xlsx",
            "--column",
            "Naam",
            "--per-name",
        ]);
        assert_eq!(cli.previous.len(), 2);
        assert_eq!(cli.columns, ["Naam"]);
        assert!(cli.per_name);
        assert!(!cli.keep_automated);
    }
}

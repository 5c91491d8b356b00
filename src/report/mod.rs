mod aggregate;
mod compare;
mod filter;
mod locate;
pub mod table;

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::warn;

use table::DataTable;

pub use aggregate::{count_by_name, group_by_name, GroupedByName, NAME_COLUMN, TASK_COUNT_COLUMN};
pub use compare::{compare_tasks, FALLBACK_IDENTIFIER_COLUMN, IDENTIFIER_COLUMN_FRAGMENT};
pub use filter::{
    apply_filters, DELIVERY_DATE_COLUMN, DESCRIPTION_COLUMN, STATUS_COLUMN, WORKPLACE_COLUMN,
};
pub use locate::locate_table;

/// Header names that must all appear verbatim in a row before it is accepted as
/// the table header.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "OH-planningsgroep",
    "Naam",
    "Status",
    "Omschrijving middel",
    "Verantw. Werkplek",
    "Leverdatum",
    "OH-order",
];

pub const EVERYTHING_SHEET: &str = "AllesBijElkaar";
pub const AGGREGATED_SHEET: &str = "GegroepeerdOverzicht";
pub const COMPARISON_SHEET: &str = "Vergelijking";

/// Hard limit of the xlsx container format.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Column-name fragments that make a column part of the default selection.
const DEFAULT_COLUMN_FRAGMENTS: [&str; 11] = [
    "Naam",
    "OH-order",
    "Status",
    "Ord.srt",
    "Verpl. Srt",
    "Obligo extern formaa",
    "Omschrijving middel",
    "Leverdatum",
    "Leverancier",
    "Met SES",
    "SES ontvangen",
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("no table found containing the required columns")]
    TableNotFound,
    #[error("required column '{0}' is missing from the table")]
    MissingColumn(String),
    #[error("no columns selected for the output")]
    NoColumnsSelected,
    #[error("no output sheets selected")]
    NoOutputsSelected,
}

/// Which sheets end up in the output document.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputSelection {
    pub everything: bool,
    pub per_name: bool,
    pub aggregated: bool,
    pub comparison: bool,
}

/// One pipeline run: the column selection for the combined and per-person
/// sheets, the optional automated-order exclusion, the requested outputs, and
/// the evaluation date for the delivery-date cutoff.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub selected_columns: Vec<String>,
    pub exclude_automated: bool,
    pub outputs: OutputSelection,
    pub today: NaiveDate,
}

/// A named table destined for one worksheet.
#[derive(Debug)]
pub struct Sheet {
    pub name: String,
    pub table: DataTable,
}

/// The assembled output document plus run statistics for reporting.
#[derive(Debug)]
pub struct ReportBundle {
    pub sheets: Vec<Sheet>,
    /// Row count of the filtered current-week table, independent of which
    /// sheets were requested.
    pub filtered_rows: usize,
}

/// Run the full filter/aggregate/compare pipeline over a located current-week
/// table and zero or more located previous-week tables, yielding the sheets for
/// the output document in their fixed order.
///
/// Previous-week tables are filtered with the same predicates as the current
/// one and merged into a single comparison input. An empty column selection
/// halts the run before any work. The comparison sheet is dropped with a
/// warning when no previous table was supplied; if nothing remains to write
/// afterwards the run halts before producing a document.
pub fn build_report(
    current: &DataTable,
    previous: &[DataTable],
    request: &ReportRequest,
) -> Result<ReportBundle, ReportError> {
    let mut outputs = request.outputs;
    if outputs.comparison && previous.is_empty() {
        warn!("comparison requested without valid previous-week data; skipping the sheet");
        outputs.comparison = false;
    }
    if request.selected_columns.is_empty() {
        return Err(ReportError::NoColumnsSelected);
    }
    if !(outputs.everything || outputs.per_name || outputs.aggregated || outputs.comparison) {
        return Err(ReportError::NoOutputsSelected);
    }

    let filtered = apply_filters(current, request.exclude_automated, request.today)?;

    let mut sheets = Vec::new();
    let mut used_names: HashSet<String> = HashSet::new();
    if outputs.everything {
        used_names.insert(EVERYTHING_SHEET.to_string());
    }
    if outputs.aggregated {
        used_names.insert(AGGREGATED_SHEET.to_string());
    }
    if outputs.comparison {
        used_names.insert(COMPARISON_SHEET.to_string());
    }

    if outputs.everything || outputs.per_name {
        let grouped = group_by_name(&filtered, &request.selected_columns)?;
        if outputs.everything {
            sheets.push(Sheet {
                name: EVERYTHING_SHEET.to_string(),
                table: grouped.combined,
            });
        }
        if outputs.per_name {
            for (name, group) in grouped.per_name {
                sheets.push(Sheet {
                    name: sheet_name_for(&name, &mut used_names),
                    table: group,
                });
            }
        }
    }

    if outputs.aggregated {
        sheets.push(Sheet {
            name: AGGREGATED_SHEET.to_string(),
            table: count_by_name(&filtered)?,
        });
    }

    if outputs.comparison {
        let mut filtered_previous = Vec::with_capacity(previous.len());
        for table in previous {
            filtered_previous.push(apply_filters(
                table,
                request.exclude_automated,
                request.today,
            )?);
        }
        let merged = DataTable::concat(&filtered_previous);
        sheets.push(Sheet {
            name: COMPARISON_SHEET.to_string(),
            table: compare_tasks(&filtered, &merged)?,
        });
    }

    Ok(ReportBundle {
        filtered_rows: filtered.len(),
        sheets,
    })
}

/// The column set checked by default in the original intake form: any column
/// containing one of the fixed fragments, plus Obligo EUR amount columns.
/// Boundary logic; the core pipeline only ever sees the explicit list.
pub fn default_column_selection(table: &DataTable) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|column| {
            DEFAULT_COLUMN_FRAGMENTS
                .iter()
                .any(|fragment| column.contains(fragment))
                || (column.starts_with("Obligo") && column.contains("EUR"))
        })
        .cloned()
        .collect()
}

/// Worksheet name for an assignee: truncated to the container limit, never
/// empty, made unique against the names already taken.
fn sheet_name_for(assignee: &str, used: &mut HashSet<String>) -> String {
    let base: String = assignee.chars().take(MAX_SHEET_NAME_LEN).collect();
    let base = if base.trim().is_empty() {
        "(leeg)".to_string()
    } else {
        base
    };

    if used.insert(base.clone()) {
        return base;
    }

    let mut counter = 2;
    loop {
        let suffix = format!("~{counter}");
        let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::table::CellValue;
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date")
    }

    fn export_table(rows: Vec<(&str, &str)>) -> DataTable {
        DataTable::new(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .map(|(name, order)| {
                    vec![
                        "PG1".into(),
                        name.into(),
                        "VRIJ".into(),
                        "pomp".into(),
                        "VKS Noord".into(),
                        CellValue::Date(today()),
                        order.into(),
                    ]
                })
                .collect(),
        )
    }

    fn request(outputs: OutputSelection) -> ReportRequest {
        ReportRequest {
            selected_columns: vec!["Naam".to_string(), "OH-order".to_string()],
            exclude_automated: true,
            outputs,
            today: today(),
        }
    }

    #[test]
    fn produces_sheets_in_fixed_order() {
        let current = export_table(vec![("Anna", "1"), ("Bram", "2")]);
        let previous = export_table(vec![("Anna", "1"), ("Anna", "3")]);

        let bundle = build_report(
            &current,
            &[previous],
            &request(OutputSelection {
                everything: true,
                per_name: true,
                aggregated: true,
                comparison: true,
            }),
        )
        .expect("report");

        assert_eq!(bundle.filtered_rows, 2);
        let names: Vec<&str> = bundle
            .sheets
            .iter()
            .map(|sheet| sheet.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                EVERYTHING_SHEET,
                "Anna",
                "Bram",
                AGGREGATED_SHEET,
                COMPARISON_SHEET
            ]
        );
    }

    #[test]
    fn no_outputs_selected_is_an_error() {
        let current = export_table(vec![("Anna", "1")]);
        assert!(matches!(
            build_report(&current, &[], &request(OutputSelection::default())),
            Err(ReportError::NoOutputsSelected)
        ));
    }

    #[test]
    fn empty_column_selection_halts_before_filtering() {
        let current = export_table(vec![("Anna", "1")]);
        let mut req = request(OutputSelection {
            everything: true,
            ..OutputSelection::default()
        });
        req.selected_columns.clear();

        assert!(matches!(
            build_report(&current, &[], &req),
            Err(ReportError::NoColumnsSelected)
        ));
    }

    #[test]
    fn comparison_without_previous_tables_is_skipped() {
        let current = export_table(vec![("Anna", "1")]);
        let bundle = build_report(
            &current,
            &[],
            &request(OutputSelection {
                aggregated: true,
                comparison: true,
                ..OutputSelection::default()
            }),
        )
        .expect("report");

        assert_eq!(bundle.sheets.len(), 1);
        assert_eq!(bundle.sheets[0].name, AGGREGATED_SHEET);
    }

    #[test]
    fn empty_column_selection_halts_even_for_aggregated_only_runs() {
        let current = export_table(vec![("Anna", "1")]);
        let mut req = request(OutputSelection {
            aggregated: true,
            ..OutputSelection::default()
        });
        req.selected_columns.clear();

        assert!(matches!(
            build_report(&current, &[], &req),
            Err(ReportError::NoColumnsSelected)
        ));
    }

    #[test]
    fn filtered_row_count_is_reported_without_the_combined_sheet() {
        let current = export_table(vec![("Anna", "1"), ("Bram", "2")]);
        let bundle = build_report(
            &current,
            &[],
            &request(OutputSelection {
                aggregated: true,
                ..OutputSelection::default()
            }),
        )
        .expect("report");

        assert_eq!(bundle.filtered_rows, 2);
        assert_eq!(bundle.sheets.len(), 1);
    }

    #[test]
    fn comparison_as_only_output_without_previous_halts() {
        let current = export_table(vec![("Anna", "1")]);
        assert!(matches!(
            build_report(
                &current,
                &[],
                &request(OutputSelection {
                    comparison: true,
                    ..OutputSelection::default()
                }),
            ),
            Err(ReportError::NoOutputsSelected)
        ));
    }

    #[test]
    fn empty_filter_result_still_produces_a_document() {
        let table = export_table(vec![]);
        let bundle = build_report(
            &table,
            &[],
            &request(OutputSelection {
                everything: true,
                aggregated: true,
                ..OutputSelection::default()
            }),
        )
        .expect("report");

        assert_eq!(bundle.filtered_rows, 0);
        assert_eq!(bundle.sheets.len(), 2);
        assert!(bundle.sheets.iter().all(|sheet| sheet.table.is_empty()));
    }

    #[test]
    fn default_selection_picks_fragment_and_obligo_eur_columns() {
        let table = DataTable::new(
            vec![
                "Naam".to_string(),
                "Obligo's EUR".to_string(),
                "Vrijgave".to_string(),
                "Leverdatum week".to_string(),
            ],
            vec![],
        );

        assert_eq!(
            default_column_selection(&table),
            ["Naam", "Obligo's EUR", "Leverdatum week"]
        );
    }

    #[test]
    fn assignee_sheet_names_are_truncated_and_deduplicated() {
        let mut used = HashSet::new();
        let long = "Medewerker met een bijzonder lange naam";
        let first = sheet_name_for(long, &mut used);
        let second = sheet_name_for(long, &mut used);

        assert_eq!(first.chars().count(), MAX_SHEET_NAME_LEN);
        assert_eq!(second.chars().count(), MAX_SHEET_NAME_LEN);
        assert_ne!(first, second);
        assert!(second.ends_with("~2"));

        assert_eq!(sheet_name_for("", &mut used), "(leeg)");
    }
}

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::table::{CellValue, DataTable};
use super::ReportError;

pub const WORKPLACE_COLUMN: &str = "Verantw. Werkplek";
pub const STATUS_COLUMN: &str = "Status";
pub const DELIVERY_DATE_COLUMN: &str = "Leverdatum";
pub const DESCRIPTION_COLUMN: &str = "Omschrijving middel";

const WORKPLACE_FRAGMENT: &str = "VKS";
const OPEN_STATUSES: [&str; 2] = ["VRIJ", "OPEN"];

/// Automated orders carry a description ending in digits followed by a literal
/// `w`, e.g. "12w".
static AUTOMATED_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+w$").expect("automated-order pattern compiles"));

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d %H:%M:%S"];

/// Apply the fixed business predicates, and the automated-order exclusion when
/// `exclude_automated` is set, to a located table.
///
/// A row survives iff the workplace contains "VKS", the status is VRIJ or OPEN,
/// and the delivery date parses to a date on or before `today`. An unparsable
/// delivery date fails the comparison and excludes the row; a missing referenced
/// column is fatal. The description column is only required when the optional
/// predicate is active, and rows without a description pass it.
pub fn apply_filters(
    table: &DataTable,
    exclude_automated: bool,
    today: NaiveDate,
) -> Result<DataTable, ReportError> {
    let workplace = table.require_column(WORKPLACE_COLUMN)?;
    let status = table.require_column(STATUS_COLUMN)?;
    let delivery = table.require_column(DELIVERY_DATE_COLUMN)?;
    let description = if exclude_automated {
        Some(table.require_column(DESCRIPTION_COLUMN)?)
    } else {
        None
    };

    let rows = table
        .rows()
        .iter()
        .filter(|row| {
            workplace_matches(&row[workplace])
                && status_is_open(&row[status])
                && delivered_on_or_before(&row[delivery], today)
                && description.map_or(true, |idx| !is_automated_order(&row[idx]))
        })
        .cloned()
        .collect();

    Ok(DataTable::new(table.columns().to_vec(), rows))
}

fn workplace_matches(cell: &CellValue) -> bool {
    cell.as_text()
        .map(|text| text.contains(WORKPLACE_FRAGMENT))
        .unwrap_or(false)
}

fn status_is_open(cell: &CellValue) -> bool {
    cell.as_text()
        .map(|text| OPEN_STATUSES.contains(&text))
        .unwrap_or(false)
}

fn delivered_on_or_before(cell: &CellValue, today: NaiveDate) -> bool {
    parse_delivery_date(cell).map_or(false, |date| date <= today)
}

fn is_automated_order(cell: &CellValue) -> bool {
    cell.as_text()
        .map(|text| AUTOMATED_ORDER.is_match(text))
        .unwrap_or(false)
}

/// Date cells come through typed when the source sheet stores real dates; text
/// cells get a small fallback format chain. Anything else is the not-a-date
/// sentinel.
fn parse_delivery_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(date) => Some(*date),
        CellValue::Text(text) => {
            let trimmed = text.trim();
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        }
        _ => None,
    }
}

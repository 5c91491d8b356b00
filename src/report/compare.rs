use std::collections::{BTreeSet, HashMap, HashSet};

use super::aggregate::NAME_COLUMN;
use super::table::{CellValue, DataTable};
use super::ReportError;

/// Preferred identifier column: matched by substring because the export
/// truncates the header ("Obligo extern formaa..."). The truncation is part of
/// the source format, not a typo.
pub const IDENTIFIER_COLUMN_FRAGMENT: &str = "Obligo extern formaa";
pub const FALLBACK_IDENTIFIER_COLUMN: &str = "OH-order";

pub const NEW_TASKS_COLUMN: &str = "Aantal nieuwe taken";
pub const RETAINED_TASKS_COLUMN: &str = "Aantal oude taken";
pub const PREVIOUS_TOTAL_COLUMN: &str = "Aantal taken vorige week";
pub const EDITED_TASKS_COLUMN: &str = "Aantal bewerkte taken";
pub const PERCENTAGE_COLUMN: &str = "Percentage bewerkt";

/// Week-over-week task churn per assignee, computed with set arithmetic over
/// the task-identifier column.
///
/// For every assignee seen in either week: new = current minus previous,
/// retained = intersection, edited = previous minus current, and the percentage
/// edited relative to the previous-week total (0 when that total is 0). The
/// final column lists the retained identifiers, comma-joined and sorted
/// lexicographically. Assignees iterate in current-table first-appearance
/// order, then previous-only names.
pub fn compare_tasks(
    current: &DataTable,
    previous: &DataTable,
) -> Result<DataTable, ReportError> {
    let identifier_column = current
        .find_column_containing(IDENTIFIER_COLUMN_FRAGMENT)
        .unwrap_or(FALLBACK_IDENTIFIER_COLUMN)
        .to_string();

    let current_sets = identifier_sets(current, &identifier_column)?;
    let previous_sets = identifier_sets(previous, &identifier_column)?;

    let mut names = assignee_union(current, previous)?;
    let empty = BTreeSet::new();

    let rows = names
        .drain(..)
        .map(|name| {
            let current_set = current_sets.get(&name).unwrap_or(&empty);
            let previous_set = previous_sets.get(&name).unwrap_or(&empty);

            let new_count = current_set.difference(previous_set).count();
            let retained: Vec<&String> = current_set.intersection(previous_set).collect();
            let previous_total = previous_set.len();
            let edited_count = previous_set.difference(current_set).count();
            let percentage = if previous_total > 0 {
                round_one_decimal(edited_count as f64 / previous_total as f64 * 100.0)
            } else {
                0.0
            };
            let common_list = retained
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ");

            vec![
                CellValue::Text(name),
                CellValue::Number(new_count as f64),
                CellValue::Number(retained.len() as f64),
                CellValue::Number(previous_total as f64),
                CellValue::Number(edited_count as f64),
                CellValue::Number(percentage),
                CellValue::Text(common_list),
            ]
        })
        .collect();

    Ok(DataTable::new(
        vec![
            NAME_COLUMN.to_string(),
            NEW_TASKS_COLUMN.to_string(),
            RETAINED_TASKS_COLUMN.to_string(),
            PREVIOUS_TOTAL_COLUMN.to_string(),
            EDITED_TASKS_COLUMN.to_string(),
            PERCENTAGE_COLUMN.to_string(),
            format!("{identifier_column} (oude taken)"),
        ],
        rows,
    ))
}

/// Distinct non-empty identifiers per assignee. Rows without an identifier
/// cannot take part in set arithmetic and simply drop out here.
fn identifier_sets(
    table: &DataTable,
    identifier_column: &str,
) -> Result<HashMap<String, BTreeSet<String>>, ReportError> {
    let name_idx = table.require_column(NAME_COLUMN)?;
    let id_idx = table.require_column(identifier_column)?;

    let mut sets: HashMap<String, BTreeSet<String>> = HashMap::new();
    for row in table.rows() {
        if row[id_idx].is_empty() {
            continue;
        }
        let identifier = row[id_idx].display();
        sets.entry(row[name_idx].display())
            .or_default()
            .insert(identifier);
    }

    Ok(sets)
}

fn assignee_union(current: &DataTable, previous: &DataTable) -> Result<Vec<String>, ReportError> {
    let current_idx = current.require_column(NAME_COLUMN)?;
    let previous_idx = previous.require_column(NAME_COLUMN)?;

    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for row in current.rows() {
        let name = row[current_idx].display();
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    for row in previous.rows() {
        let name = row[previous_idx].display();
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }

    Ok(names)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

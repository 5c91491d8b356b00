use std::collections::HashMap;

use super::table::{CellValue, DataTable};
use super::ReportError;

pub const NAME_COLUMN: &str = "Naam";
pub const TASK_COUNT_COLUMN: &str = "Aantal Taken";

/// Result of grouping the filtered table by assignee: one combined table with
/// the groups laid out back to back, plus the per-assignee subsets in the same
/// order.
#[derive(Debug)]
pub struct GroupedByName {
    pub combined: DataTable,
    pub per_name: Vec<(String, DataTable)>,
}

/// Project the table onto `selected_columns` (caller order preserved) and group
/// the rows by assignee. Groups appear in first-appearance order of the Naam
/// value; rows keep their original relative order inside a group. An empty Naam
/// cell is a valid group key, not an error.
pub fn group_by_name(
    table: &DataTable,
    selected_columns: &[String],
) -> Result<GroupedByName, ReportError> {
    let name_idx = table.require_column(NAME_COLUMN)?;
    let projected = table.project(selected_columns)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Vec<CellValue>>> = HashMap::new();

    for (source_row, projected_row) in table.rows().iter().zip(projected.rows()) {
        let name = source_row[name_idx].display();
        groups
            .entry(name.clone())
            .or_insert_with(|| {
                order.push(name.clone());
                Vec::new()
            })
            .push(projected_row.clone());
    }

    let mut combined_rows = Vec::with_capacity(table.len());
    let mut per_name = Vec::with_capacity(order.len());
    for name in order {
        let rows = groups.remove(&name).unwrap_or_default();
        combined_rows.extend(rows.iter().cloned());
        per_name.push((name, DataTable::new(selected_columns.to_vec(), rows)));
    }

    Ok(GroupedByName {
        combined: DataTable::new(selected_columns.to_vec(), combined_rows),
        per_name,
    })
}

/// One row per distinct assignee with the number of rows carrying that name, in
/// first-appearance order. Runs against the unprojected filtered table.
pub fn count_by_name(table: &DataTable) -> Result<DataTable, ReportError> {
    let name_idx = table.require_column(NAME_COLUMN)?;

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for row in table.rows() {
        let name = row[name_idx].display();
        let count = counts.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            0
        });
        *count += 1;
    }

    let rows = order
        .into_iter()
        .map(|name| {
            let count = counts.get(&name).copied().unwrap_or(0);
            vec![CellValue::Text(name), CellValue::Number(count as f64)]
        })
        .collect();

    Ok(DataTable::new(
        vec![NAME_COLUMN.to_string(), TASK_COUNT_COLUMN.to_string()],
        rows,
    ))
}

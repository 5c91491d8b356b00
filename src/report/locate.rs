use super::table::{normalize_header_text, unique_headers, CellValue, DataTable};

/// Scan a raw grid top to bottom for the first row whose cells contain every
/// required column name, promote that row to a header, and materialize all rows
/// below it as the table body.
///
/// Cell text is newline-normalized and trimmed before the containment test so a
/// header that differs only by surrounding whitespace or an embedded line break
/// still matches. Matching is otherwise exact: no case folding, no fuzzing.
pub fn locate_table(grid: &[Vec<CellValue>], required: &[&str]) -> Option<DataTable> {
    let header_index = grid.iter().position(|row| {
        required
            .iter()
            .all(|name| row.iter().any(|cell| header_text(cell) == *name))
    })?;

    let columns = unique_headers(grid[header_index].iter().map(header_text).collect());
    let width = columns.len();

    let rows = grid[header_index + 1..]
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            let mut body_row: Vec<CellValue> = row.iter().take(width).cloned().collect();
            body_row.resize(width, CellValue::Empty);
            body_row
        })
        .collect();

    Some(DataTable::new(columns, rows))
}

fn header_text(cell: &CellValue) -> String {
    normalize_header_text(&cell.display()).trim().to_string()
}

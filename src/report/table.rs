use chrono::NaiveDate;

use super::ReportError;

/// A single spreadsheet cell after import. The container format is gone at this
/// point; only the value kinds the pipeline cares about survive.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Render the cell as the string used for group keys and identifier sets.
    /// Integral numbers are printed without a trailing `.0` so identifiers read
    /// from numeric cells match their text form.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    format!("{value}")
                }
            }
            CellValue::Date(value) => value.format("%Y-%m-%d").to_string(),
            CellValue::Bool(value) => value.to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// An ordered set of named columns plus rows aligned to them. Produced once by
/// the table locator and treated as read-only afterwards; every transforming
/// operation returns a fresh table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// Rows are padded or truncated to the column count so indexing by column
    /// position is always in bounds.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// A referenced column that does not exist is a data error, never a silent
    /// skip.
    pub fn require_column(&self, name: &str) -> Result<usize, ReportError> {
        self.column_index(name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    /// First column whose name contains `fragment`, in column order.
    pub fn find_column_containing(&self, fragment: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.contains(fragment))
            .map(String::as_str)
    }

    /// Project onto `selected` in the caller-given order.
    pub fn project(&self, selected: &[String]) -> Result<DataTable, ReportError> {
        let indices = selected
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();

        Ok(DataTable {
            columns: selected.to_vec(),
            rows,
        })
    }

    /// Replace embedded newlines in header names with spaces and restore the
    /// unique-name invariant. Runs once, right after table location.
    pub fn normalize_headers(&mut self) {
        let normalized = self
            .columns
            .iter()
            .map(|column| normalize_header_text(column).trim().to_string())
            .collect();
        self.columns = unique_headers(normalized);
    }

    /// Merge tables by column name: the result carries the union of all columns
    /// in encounter order, with cells absent from a source row left empty.
    pub fn concat(tables: &[DataTable]) -> DataTable {
        let mut columns: Vec<String> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<Option<usize>> = columns
                .iter()
                .map(|column| table.column_index(column))
                .collect();
            for row in &table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map_or(CellValue::Empty, |i| row[i].clone()))
                        .collect(),
                );
            }
        }

        DataTable { columns, rows }
    }
}

pub(crate) fn normalize_header_text(text: &str) -> String {
    text.replace('\n', " ")
}

/// Blank header cells get a positional name and duplicates a numeric suffix, so
/// body rows stay addressable by unique column names.
pub(crate) fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Kolom {}", idx + 1)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut counter = 2;
        while seen.contains(&candidate) {
            candidate = format!("{base} ({counter})");
            counter += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        DataTable::new(
            vec!["Naam".to_string(), "Status".to_string()],
            vec![
                vec!["Anna".into(), "VRIJ".into()],
                vec!["Bram".into(), "OPEN".into()],
            ],
        )
    }

    #[test]
    fn require_column_reports_missing_names() {
        let table = sample();
        assert_eq!(table.require_column("Naam").expect("present"), 0);
        match table.require_column("Leverdatum") {
            Err(ReportError::MissingColumn(name)) => assert_eq!(name, "Leverdatum"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn project_preserves_caller_order() {
        let table = sample();
        let projected = table
            .project(&["Status".to_string(), "Naam".to_string()])
            .expect("projection");
        assert_eq!(projected.columns(), ["Status", "Naam"]);
        assert_eq!(projected.rows()[0][1], CellValue::from("Anna"));
    }

    #[test]
    fn normalize_headers_replaces_newlines_with_spaces() {
        let mut table = DataTable::new(
            vec!["Lever\ndatum".to_string(), "Leverdatum".to_string()],
            vec![vec![CellValue::Empty, CellValue::Empty]],
        );
        table.normalize_headers();
        assert_eq!(table.columns(), ["Lever datum", "Leverdatum"]);
    }

    #[test]
    fn normalize_headers_dedups_names_that_collide() {
        let mut table = DataTable::new(
            vec!["Leverdatum".to_string(), "Leverdatum\n".to_string()],
            vec![vec![CellValue::Empty, CellValue::Empty]],
        );
        table.normalize_headers();
        assert_eq!(table.columns(), ["Leverdatum", "Leverdatum (2)"]);
    }

    #[test]
    fn unique_headers_names_blank_cells_by_position() {
        let headers = unique_headers(vec!["".to_string(), "  ".to_string(), "Naam".to_string()]);
        assert_eq!(headers, ["Kolom 1", "Kolom 2", "Naam"]);
    }

    #[test]
    fn concat_takes_union_of_columns() {
        let left = DataTable::new(
            vec!["Naam".to_string(), "Status".to_string()],
            vec![vec!["Anna".into(), "VRIJ".into()]],
        );
        let right = DataTable::new(
            vec!["Naam".to_string(), "OH-order".to_string()],
            vec![vec!["Bram".into(), "900123".into()]],
        );
        let merged = DataTable::concat(&[left, right]);
        assert_eq!(merged.columns(), ["Naam", "Status", "OH-order"]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.rows()[0][2], CellValue::Empty);
        assert_eq!(merged.rows()[1][1], CellValue::Empty);
        assert_eq!(merged.rows()[1][2], CellValue::from("900123"));
    }

    #[test]
    fn display_prints_integral_numbers_without_fraction() {
        assert_eq!(CellValue::Number(900123.0).display(), "900123");
        assert_eq!(CellValue::Number(12.5).display(), "12.5");
        assert_eq!(CellValue::Empty.display(), "");
    }

    #[test]
    fn rows_are_padded_to_column_count() {
        let table = DataTable::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![vec!["x".into()]],
        );
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.rows()[0][2], CellValue::Empty);
    }
}

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::NaiveDate;

use super::WorkbookError;
use crate::report::table::CellValue;

/// Fragment used to auto-select the sheet holding the work-order export.
const DOWNLOAD_SHEET_FRAGMENT: &str = "DOWNLOAD";

/// An opened spreadsheet file (.xlsx or .xls). Only capable of handing out a
/// raw 2-D grid of cell values; everything structural happens downstream.
pub struct SourceWorkbook {
    sheets: Sheets<BufReader<File>>,
    sheet_names: Vec<String>,
}

impl SourceWorkbook {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorkbookError> {
        let sheets = open_workbook_auto(path)?;
        let sheet_names = sheets.sheet_names().to_owned();
        if sheet_names.is_empty() {
            return Err(WorkbookError::NoSheets);
        }
        Ok(Self {
            sheets,
            sheet_names,
        })
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// With an explicit override, that sheet must exist. Otherwise the first
    /// sheet whose name contains "DOWNLOAD" (case-insensitive) is selected.
    pub fn pick_sheet(&self, override_name: Option<&str>) -> Result<String, WorkbookError> {
        select_sheet(&self.sheet_names, override_name)
    }

    /// Materialize one worksheet as a grid of cell values.
    pub fn read_grid(&mut self, sheet: &str) -> Result<Vec<Vec<CellValue>>, WorkbookError> {
        let range = self.sheets.worksheet_range(sheet)?;
        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_value).collect())
            .collect())
    }
}

fn select_sheet(sheet_names: &[String], override_name: Option<&str>) -> Result<String, WorkbookError> {
    if let Some(name) = override_name {
        return if sheet_names.iter().any(|sheet| sheet == name) {
            Ok(name.to_string())
        } else {
            Err(WorkbookError::SheetNotFound(name.to_string()))
        };
    }

    sheet_names
        .iter()
        .find(|sheet| sheet.to_uppercase().contains(DOWNLOAD_SHEET_FRAGMENT))
        .cloned()
        .ok_or(WorkbookError::NoSheetSelected)
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(value) => {
            if value.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(value.clone())
            }
        }
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => value
            .as_datetime()
            .map(|datetime| CellValue::Date(datetime.date()))
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(value) => parse_iso_date(value)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(value.clone())),
        Data::DurationIso(value) => CellValue::Text(value.clone()),
        // Cell-level errors (#N/A and friends) are treated as missing values.
        Data::Error(_) => CellValue::Empty,
    }
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalar_cells() {
        assert_eq!(
            cell_value(&Data::String("VRIJ".to_string())),
            CellValue::Text("VRIJ".to_string())
        );
        assert_eq!(cell_value(&Data::Float(12.0)), CellValue::Number(12.0));
        assert_eq!(cell_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(cell_value(&Data::String(String::new())), CellValue::Empty);
    }

    #[test]
    fn iso_datetime_strings_become_dates() {
        assert_eq!(
            cell_value(&Data::DateTimeIso("2026-08-20T00:00:00".to_string())),
            CellValue::Date(NaiveDate::from_ymd_opt(2026, 8, 20).expect("valid date"))
        );
        assert_eq!(
            cell_value(&Data::DateTimeIso("geen datum".to_string())),
            CellValue::Text("geen datum".to_string())
        );
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn select_sheet_prefers_first_download_sheet_case_insensitively() {
        let sheets = names(&["Toelichting", "wk34 download", "DOWNLOAD 2"]);
        assert_eq!(
            select_sheet(&sheets, None).expect("sheet selected"),
            "wk34 download"
        );
    }

    #[test]
    fn select_sheet_without_download_sheet_requires_an_override() {
        let sheets = names(&["Blad1", "Blad2"]);
        assert!(matches!(
            select_sheet(&sheets, None),
            Err(WorkbookError::NoSheetSelected)
        ));
        assert_eq!(
            select_sheet(&sheets, Some("Blad2")).expect("sheet selected"),
            "Blad2"
        );
    }

    #[test]
    fn select_sheet_rejects_an_override_that_does_not_exist() {
        let sheets = names(&["wk34 download"]);
        match select_sheet(&sheets, Some("Blad9")) {
            Err(WorkbookError::SheetNotFound(name)) => assert_eq!(name, "Blad9"),
            other => panic!("expected missing sheet, got {other:?}"),
        }
    }

    #[test]
    fn select_sheet_override_wins_over_the_heuristic() {
        let sheets = names(&["DOWNLOAD", "Blad2"]);
        assert_eq!(
            select_sheet(&sheets, Some("Blad2")).expect("sheet selected"),
            "Blad2"
        );
    }

    #[test]
    fn open_reports_missing_files() {
        assert!(matches!(
            SourceWorkbook::open("./bestaat-niet.xlsx"),
            Err(WorkbookError::Read(_))
        ));
    }
}

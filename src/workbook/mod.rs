mod reader;
mod writer;

pub use reader::SourceWorkbook;
pub use writer::write_workbook;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::Error),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),
    #[error("no sheet name contains 'DOWNLOAD' and no sheet was specified")]
    NoSheetSelected,
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

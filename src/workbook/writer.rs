use rust_xlsxwriter::{
    Color, ConditionalFormatFormula, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};

use super::WorkbookError;
use crate::report::table::CellValue;
use crate::report::{Sheet, COMPARISON_SHEET};

const HEADER_FILL: Color = Color::RGB(0x4F81BD);
const BAND_EVEN: Color = Color::RGB(0xDCE6F1);
const BAND_ODD: Color = Color::RGB(0xB8CCE4);

/// Serialize the named tables into one styled multi-sheet document, returned as
/// in-memory xlsx bytes.
///
/// Every sheet gets a bold header row on a blue fill, alternating row banding,
/// autofitted column widths, and date-typed cells wherever a value is a real
/// date (the Leverdatum columns). The sheet named "Vergelijking" additionally colors
/// its first column by the percentage in column F: green above 70, yellow
/// between 40 and 70, red below 40.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>, WorkbookError> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(HEADER_FILL)
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);
    let date_format = Format::new().set_num_format("mm/dd/yyyy");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &header_format, &date_format)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &Sheet,
    header_format: &Format,
    date_format: &Format,
) -> Result<(), WorkbookError> {
    let table = &sheet.table;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header_format)?;
    }

    for (idx, row) in table.rows().iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            match cell {
                CellValue::Text(value) => {
                    worksheet.write_string(row_num, col_num, value)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(row_num, col_num, *value)?;
                }
                CellValue::Date(value) => {
                    worksheet.write_datetime_with_format(row_num, col_num, *value, date_format)?;
                }
                CellValue::Bool(value) => {
                    worksheet.write_boolean(row_num, col_num, *value)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    if !table.is_empty() && !table.columns().is_empty() {
        let last_row = table.len() as u32;
        let last_col = (table.columns().len() - 1) as u16;
        add_row_banding(worksheet, last_row, last_col)?;
        if sheet.name == COMPARISON_SHEET {
            add_percentage_coloring(worksheet, last_row)?;
        }
    }

    worksheet.autofit();
    Ok(())
}

fn add_row_banding(
    worksheet: &mut Worksheet,
    last_row: u32,
    last_col: u16,
) -> Result<(), WorkbookError> {
    let even = ConditionalFormatFormula::new()
        .set_rule("=MOD(ROW(),2)=0")
        .set_format(Format::new().set_background_color(BAND_EVEN));
    let odd = ConditionalFormatFormula::new()
        .set_rule("=MOD(ROW(),2)=1")
        .set_format(Format::new().set_background_color(BAND_ODD));
    worksheet.add_conditional_format(1, 0, last_row, last_col, &even)?;
    worksheet.add_conditional_format(1, 0, last_row, last_col, &odd)?;
    Ok(())
}

/// Three mutually exclusive font-color rules on the assignee column, driven by
/// the "Percentage bewerkt" value in column F.
fn add_percentage_coloring(worksheet: &mut Worksheet, last_row: u32) -> Result<(), WorkbookError> {
    let rules = [
        ("=$F2>70", Color::Green),
        ("=AND($F2<=70,$F2>=40)", Color::Yellow),
        ("=$F2<40", Color::Red),
    ];
    for (formula, color) in rules {
        let rule = ConditionalFormatFormula::new()
            .set_rule(formula)
            .set_format(Format::new().set_font_color(color).set_bold());
        worksheet.add_conditional_format(1, 0, last_row, 0, &rule)?;
    }
    Ok(())
}

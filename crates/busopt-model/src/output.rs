use std::path::Path;

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, XlsxError};
use thiserror::Error;
use tracing::info;

use crate::assignment::{AssignmentPlan, ResultRow};
use crate::sheet::{Cell, SheetRef, Workbook};

pub const RESULT_SHEET: &str = "Hasil";
pub const RESULT_HEADERS: [&str; 4] = ["Armada", "Rute", "Jumlah_Perjalanan", "Total_Biaya"];

static EMPTY: Cell = Cell::Empty;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot write result workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Cannot read result workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("{0} result rows do not fit in one sheet")]
    TooManyRows(usize),
    #[error("Malformed result workbook: {0}")]
    Malformed(String),
}

/// Write the plan as a single-sheet workbook: a bold header row followed by
/// one row per used (unit, route) pair.
pub fn write_results(path: impl AsRef<Path>, plan: &AssignmentPlan) -> Result<(), OutputError> {
    let path = path.as_ref();
    let mut workbook = XlsxWorkbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(RESULT_SHEET)?;

    for (col, header) in (0u16..).zip(RESULT_HEADERS) {
        worksheet.write_string_with_format(0, col, header, &bold)?;
    }

    for (i, row) in plan.rows.iter().enumerate() {
        let r = u32::try_from(i + 1).map_err(|_| OutputError::TooManyRows(plan.rows.len()))?;
        worksheet.write_string(r, 0, &row.unit)?;
        worksheet.write_string(r, 1, &row.route)?;
        worksheet.write_number(r, 2, row.trips)?;
        worksheet.write_number(r, 3, row.cost)?;
    }
    worksheet.autofit();

    workbook.save(path)?;
    info!(rows = plan.rows.len(), "Wrote {}", path.display());
    Ok(())
}

/// Read a workbook produced by [`write_results`] back into rows.
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<ResultRow>, OutputError> {
    let mut workbook = Workbook::open(path)?;
    let grid = workbook
        .grid(&SheetRef::Index(0))?
        .ok_or_else(|| OutputError::Malformed("workbook has no sheets".to_string()))?;

    let header = grid
        .rows
        .iter()
        .position(|cells| {
            cells
                .first()
                .is_some_and(|c| c.as_text().eq_ignore_ascii_case(RESULT_HEADERS[0]))
        })
        .ok_or_else(|| OutputError::Malformed(format!("no '{}' header row", RESULT_HEADERS[0])))?;

    let mut rows = Vec::new();
    for (i, cells) in grid.rows.iter().enumerate().skip(header + 1) {
        if cells.iter().all(Cell::is_missing) {
            continue;
        }

        let row_number = grid.sheet_row(i) + 1;
        let cell = |col: usize| cells.get(col).unwrap_or(&EMPTY);
        let number = |col: usize| {
            cell(col).as_number().ok_or_else(|| {
                OutputError::Malformed(format!(
                    "row {}: {} is not a number ({})",
                    row_number,
                    RESULT_HEADERS[col],
                    cell(col)
                ))
            })
        };

        rows.push(ResultRow {
            unit: cell(0).as_text(),
            route: cell(1).as_text(),
            trips: number(2)?,
            cost: number(3)?,
        });
    }

    Ok(rows)
}

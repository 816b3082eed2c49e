use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};

/// A single spreadsheet cell, reduced to what the loaders care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetRef {
    /// 0-based position in the workbook
    Index(usize),
    Name(String),
}

/// A rectangular block of cells read from one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Sheet name, used in error messages
    pub name: String,
    /// 0-based sheet row of `rows[0]`
    pub first_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

/// An open workbook in any format calamine understands.
pub struct Workbook {
    sheets: Sheets<BufReader<File>>,
}

impl Cell {
    /// Empty cells, whitespace-only text, and error values all count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(v) => v.is_nan(),
            Cell::Bool(_) => false,
        }
    }

    /// Text form of the cell; integral numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => format_number(*v),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }

    /// Numeric value, parsing text if needed. Booleans are not numbers here.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, "<empty>"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetRef::Index(i) => write!(f, "sheet #{}", i + 1),
            SheetRef::Name(name) => write!(f, "sheet '{}'", name),
        }
    }
}

impl Grid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            first_row: 0,
            rows,
        }
    }

    pub fn with_first_row(mut self, first_row: usize) -> Self {
        self.first_row = first_row;
        self
    }

    /// Build a grid from a calamine range. Ranges start at the first used
    /// cell, so the grid's first column is the sheet's first used column.
    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let first_row = range.start().map_or(0, |(row, _)| row as usize);
        let rows = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        Self::new(name, rows).with_first_row(first_row)
    }

    /// 0-based sheet row of the grid row at `index`.
    pub fn sheet_row(&self, index: usize) -> usize {
        self.first_row + index
    }
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, calamine::Error> {
        let sheets = open_workbook_auto(path)?;
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Read one sheet, or `None` if the workbook has no such sheet.
    pub fn grid(&mut self, sheet: &SheetRef) -> Result<Option<Grid>, calamine::Error> {
        let names = self.sheet_names();
        let name = match sheet {
            SheetRef::Index(i) => match names.get(*i) {
                Some(name) => name.clone(),
                None => return Ok(None),
            },
            SheetRef::Name(name) => match names.iter().find(|n| *n == name) {
                Some(name) => name.clone(),
                None => return Ok(None),
            },
        };

        let range = self.sheets.worksheet_range(&name)?;
        Ok(Some(Grid::from_range(name, &range)))
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

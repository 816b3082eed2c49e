use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::{Dataset, FleetUnit, Route};
use crate::sheet::{Cell, Grid, SheetRef, Workbook};

/// Marker searched for in the first column of the fleet sheet
pub const FLEET_MARKER: &str = "Armada";
/// Marker searched for in the first column of the route sheet
pub const ROUTE_MARKER: &str = "Rute";

/// Columns read from each table, in order
const COLUMNS: usize = 3;
const FLEET_COLUMNS: [&str; COLUMNS] = ["name", "capacity", "cost_per_km"];
const ROUTE_COLUMNS: [&str; COLUMNS] = ["name", "demand", "distance"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read workbook {path}: {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },
    #[error("Workbook has no {0}")]
    MissingSheet(SheetRef),
    #[error("Sheet '{0}' has no data rows after cleanup")]
    EmptyTable(String),
    #[error("Sheet '{sheet}' row {row}: column {column} is not a number ({value})")]
    TypeConversion {
        sheet: String,
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("Sheet '{sheet}' row {row}: column {column} must not be negative ({value})")]
    NegativeValue {
        sheet: String,
        row: usize,
        column: &'static str,
        value: f64,
    },
    #[error("Sheet '{sheet}' lists {id} more than once")]
    DuplicateId { sheet: String, id: String },
}

/// How the header row of a table is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRow {
    /// First remaining row whose first cell contains this text (case-insensitive).
    /// Without a match the data starts at the top.
    Marker(String),
    /// Explicit 0-based sheet row of the header.
    Index(usize),
    /// The sheet has no header; every complete row is data.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    pub sheet: SheetRef,
    pub header: HeaderRow,
}

/// Where to find the fleet and route tables in a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub fleet: TableOptions,
    pub routes: TableOptions,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            fleet: TableOptions {
                sheet: SheetRef::Index(0),
                header: HeaderRow::Marker(FLEET_MARKER.to_string()),
            },
            routes: TableOptions {
                sheet: SheetRef::Index(1),
                header: HeaderRow::Marker(ROUTE_MARKER.to_string()),
            },
        }
    }
}

impl LoaderOptions {
    pub fn with_fleet_header(mut self, header: HeaderRow) -> Self {
        self.fleet.header = header;
        self
    }

    pub fn with_route_header(mut self, header: HeaderRow) -> Self {
        self.routes.header = header;
        self
    }

    pub fn with_fleet_sheet(mut self, sheet: SheetRef) -> Self {
        self.fleet.sheet = sheet;
        self
    }

    pub fn with_route_sheet(mut self, sheet: SheetRef) -> Self {
        self.routes.sheet = sheet;
        self
    }
}

/// Load and clean both tables from a workbook.
pub fn load_dataset(path: impl AsRef<Path>, options: &LoaderOptions) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let workbook_err = |source| LoadError::Workbook {
        path: path.display().to_string(),
        source,
    };

    let mut workbook = Workbook::open(path).map_err(workbook_err)?;
    debug!("Opened {} with sheets {:?}", path.display(), workbook.sheet_names());

    let fleet_grid = workbook
        .grid(&options.fleet.sheet)
        .map_err(workbook_err)?
        .ok_or_else(|| LoadError::MissingSheet(options.fleet.sheet.clone()))?;
    let route_grid = workbook
        .grid(&options.routes.sheet)
        .map_err(workbook_err)?
        .ok_or_else(|| LoadError::MissingSheet(options.routes.sheet.clone()))?;

    let dataset = Dataset::new(
        parse_fleet(&fleet_grid, &options.fleet.header)?,
        parse_routes(&route_grid, &options.routes.header)?,
    );

    info!(
        fleet = dataset.fleet.len(),
        routes = dataset.routes.len(),
        "Loaded {}",
        path.display()
    );
    Ok(dataset)
}

/// Clean the fleet sheet into fleet units.
pub fn parse_fleet(grid: &Grid, header: &HeaderRow) -> Result<Vec<FleetUnit>, LoadError> {
    let rows = data_rows(grid, header)?;
    let mut fleet = Vec::with_capacity(rows.len());

    for (row, cells) in rows {
        let unit = FleetUnit {
            name: cells[0].as_text(),
            capacity: non_negative(grid, row, FLEET_COLUMNS[1], &cells[1])?,
            cost_per_km: non_negative(grid, row, FLEET_COLUMNS[2], &cells[2])?,
        };
        debug!("Fleet unit {:?}", unit);
        fleet.push(unit);
    }

    ensure_unique(grid, fleet.iter().map(|u| u.name.as_str()))?;
    Ok(fleet)
}

/// Clean the route sheet into routes.
pub fn parse_routes(grid: &Grid, header: &HeaderRow) -> Result<Vec<Route>, LoadError> {
    let rows = data_rows(grid, header)?;
    let mut routes = Vec::with_capacity(rows.len());

    for (row, cells) in rows {
        let route = Route {
            name: cells[0].as_text(),
            demand: non_negative(grid, row, ROUTE_COLUMNS[1], &cells[1])?,
            distance: non_negative(grid, row, ROUTE_COLUMNS[2], &cells[2])?,
        };
        debug!("Route {:?}", route);
        routes.push(route);
    }

    ensure_unique(grid, routes.iter().map(|r| r.name.as_str()))?;
    Ok(routes)
}

/// Drop incomplete rows, then everything up to and including the header.
/// Returns (0-based sheet row, first three cells) pairs.
fn data_rows<'a>(grid: &'a Grid, header: &HeaderRow) -> Result<Vec<(usize, &'a [Cell])>, LoadError> {
    let complete: Vec<(usize, &[Cell])> = grid
        .rows
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells.len() >= COLUMNS && cells[..COLUMNS].iter().all(|c| !c.is_missing()))
        .map(|(i, cells)| (grid.sheet_row(i), &cells[..COLUMNS]))
        .collect();

    let dropped = grid.rows.len() - complete.len();
    if dropped > 0 {
        debug!("Sheet '{}': dropped {} incomplete row(s)", grid.name, dropped);
    }

    let rows: Vec<(usize, &[Cell])> = match header {
        HeaderRow::Marker(marker) => {
            let needle = marker.to_lowercase();
            let found = complete
                .iter()
                .position(|(_, cells)| cells[0].as_text().to_lowercase().contains(&needle));
            match found {
                Some(pos) => {
                    debug!(
                        "Sheet '{}': header '{}' found on row {}",
                        grid.name,
                        marker,
                        complete[pos].0 + 1
                    );
                    complete[pos + 1..].to_vec()
                }
                None => {
                    warn!(
                        "Sheet '{}': no header containing '{}', reading from the first row",
                        grid.name, marker
                    );
                    complete
                }
            }
        }
        HeaderRow::Index(index) => complete.into_iter().filter(|(row, _)| row > index).collect(),
        HeaderRow::None => complete,
    };

    if rows.is_empty() {
        return Err(LoadError::EmptyTable(grid.name.clone()));
    }
    Ok(rows)
}

fn non_negative(grid: &Grid, row: usize, column: &'static str, cell: &Cell) -> Result<f64, LoadError> {
    let value = cell.as_number().ok_or_else(|| LoadError::TypeConversion {
        sheet: grid.name.clone(),
        row: row + 1,
        column,
        value: cell.to_string(),
    })?;

    if value < 0.0 {
        return Err(LoadError::NegativeValue {
            sheet: grid.name.clone(),
            row: row + 1,
            column,
            value,
        });
    }
    Ok(value)
}

fn ensure_unique<'a>(grid: &Grid, names: impl Iterator<Item = &'a str>) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(LoadError::DuplicateId {
                sheet: grid.name.clone(),
                id: name.to_string(),
            });
        }
    }
    Ok(())
}

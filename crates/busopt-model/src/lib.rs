pub mod assignment;
pub mod data;
pub mod loader;
pub mod model;
pub mod output;
pub mod sheet;

pub use assignment::{extract, optimize, AssignmentPlan, OptimizeOptions, ResultRow, SolveError, DEFAULT_THRESHOLD};
pub use data::{Dataset, FleetUnit, Route};
pub use loader::{load_dataset, parse_fleet, parse_routes, HeaderRow, LoadError, LoaderOptions, TableOptions};
pub use model::{build_model, TransportModel};
pub use output::{read_results, write_results, OutputError};
pub use sheet::{Cell, Grid, SheetRef, Workbook};

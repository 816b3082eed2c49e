use busopt_solver::{Solution, SolutionStatus, Solver};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::Dataset;
use crate::model::{build_model, TransportModel};

/// Trips below this are treated as solver noise, not assignments.
pub const DEFAULT_THRESHOLD: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Nothing to solve: {units} fleet unit(s) and {routes} route(s)")]
    EmptyModel { units: usize, routes: usize },
    #[error("Invalid input data: {0}")]
    InvalidData(String),
    #[error("Trip threshold must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),
    #[error("No feasible assignment: total capacity {total_capacity} cannot cover total demand {total_demand}")]
    Infeasible { total_capacity: f64, total_demand: f64 },
    #[error("The assignment problem is unbounded")]
    Unbounded,
    #[error("LP solver failed: {0}")]
    SolverUnavailable(String),
}

/// One used (fleet unit, route) pair.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub unit: String,
    pub route: String,
    pub trips: f64,
    /// trips * cost_per_km * distance
    pub cost: f64,
}

/// The extracted solution of one solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPlan {
    /// Fleet-major, route-minor
    pub rows: Vec<ResultRow>,
    /// Sum of row costs
    pub total_cost: f64,
    /// Objective evaluated at the solver's point, before threshold filtering
    pub objective_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeOptions {
    /// Minimum trip count for a pair to be reported
    pub threshold: f64,
    /// Constraint check tolerance handed to the solver
    pub tolerance: f64,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            tolerance: 1e-6,
        }
    }
}

impl OptimizeOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl AssignmentPlan {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn trips_for_route(&self, route: &str) -> f64 {
        self.rows.iter().filter(|r| r.route == route).map(|r| r.trips).sum()
    }

    pub fn trips_for_unit(&self, unit: &str) -> f64 {
        self.rows.iter().filter(|r| r.unit == unit).map(|r| r.trips).sum()
    }

    pub fn total_trips(&self) -> f64 {
        self.rows.iter().map(|r| r.trips).sum()
    }
}

/// Build, solve and extract the minimum-cost assignment for `dataset`.
pub fn optimize(dataset: &Dataset, options: &OptimizeOptions) -> Result<AssignmentPlan, SolveError> {
    if dataset.fleet.is_empty() || dataset.routes.is_empty() {
        return Err(SolveError::EmptyModel {
            units: dataset.fleet.len(),
            routes: dataset.routes.len(),
        });
    }
    if let Some(problem) = dataset.invalid_value() {
        return Err(SolveError::InvalidData(problem));
    }
    if !options.threshold.is_finite() || options.threshold < 0.0 {
        return Err(SolveError::InvalidThreshold(options.threshold));
    }

    let model = build_model(dataset);
    let solver = Solver::new().with_tolerance(options.tolerance);
    let solution = check_status(dataset, solver.solve(&model.problem))?;

    let plan = extract(dataset, &model, &solution, options.threshold);
    info!(
        rows = plan.rows.len(),
        pairs = model.num_pairs(),
        total_cost = plan.total_cost,
        "Optimal assignment found"
    );
    Ok(plan)
}

/// Map a non-optimal solver status to the matching error.
fn check_status(dataset: &Dataset, solution: Solution) -> Result<Solution, SolveError> {
    match solution.status {
        SolutionStatus::Optimal => Ok(solution),
        SolutionStatus::Infeasible => {
            let total_capacity = dataset.total_capacity();
            let total_demand = dataset.total_demand();
            warn!(total_capacity, total_demand, "Assignment is infeasible");
            Err(SolveError::Infeasible {
                total_capacity,
                total_demand,
            })
        }
        SolutionStatus::Unbounded => Err(SolveError::Unbounded),
        SolutionStatus::Error => {
            let message = solution
                .message
                .unwrap_or_else(|| "solver returned no message".to_string());
            Err(SolveError::SolverUnavailable(message))
        }
    }
}

/// Turn solver values into result rows, keeping only pairs with more than
/// `threshold` trips.
pub fn extract(dataset: &Dataset, model: &TransportModel, solution: &Solution, threshold: f64) -> AssignmentPlan {
    let mut rows = Vec::new();
    // f64::max ignores NaN, so a bad threshold still drops zero rows
    let threshold = threshold.max(0.0);

    for (&(u, r), &trips) in model.pairs.iter().zip(&solution.values) {
        if trips <= threshold {
            if trips > 0.0 {
                debug!(
                    "Ignoring {:e} trips of {} on {}",
                    trips, dataset.fleet[u].name, dataset.routes[r].name
                );
            }
            continue;
        }

        rows.push(ResultRow {
            unit: dataset.fleet[u].name.clone(),
            route: dataset.routes[r].name.clone(),
            trips,
            cost: trips * dataset.trip_cost(u, r),
        });
    }

    let total_cost = rows.iter().map(|row| row.cost).sum();

    AssignmentPlan {
        rows,
        total_cost,
        objective_value: solution.objective_value,
    }
}

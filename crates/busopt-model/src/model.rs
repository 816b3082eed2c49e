use busopt_solver::{ConstraintOp, LpProblem};
use tracing::debug;

use crate::data::Dataset;

/// The transport LP for one dataset, plus the mapping from variable index
/// back to the (fleet unit, route) pair it stands for.
#[derive(Debug, Clone)]
pub struct TransportModel {
    pub problem: LpProblem,
    /// `pairs[k]` is (fleet index, route index) of variable `k`
    pub pairs: Vec<(usize, usize)>,
}

impl TransportModel {
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }
}

/// Build the minimum-cost assignment model.
///
/// One variable per (unit, route) pair, fleet-major. The objective charges
/// each trip `cost_per_km * distance`. Each unit gets a `capacity_<name>`
/// row (sum over routes <= capacity), each route a `demand_<name>` row
/// (sum over units == demand).
pub fn build_model(dataset: &Dataset) -> TransportModel {
    let n_units = dataset.fleet.len();
    let n_routes = dataset.routes.len();

    let mut pairs = Vec::with_capacity(n_units * n_routes);
    let mut variables = Vec::with_capacity(n_units * n_routes);
    let mut costs = Vec::with_capacity(n_units * n_routes);

    for (u, unit) in dataset.fleet.iter().enumerate() {
        for (r, route) in dataset.routes.iter().enumerate() {
            pairs.push((u, r));
            variables.push(format!("x_{}_{}", unit.name, route.name));
            costs.push(dataset.trip_cost(u, r));
        }
    }

    let mut problem = LpProblem::new(variables);
    problem.set_objective(costs, true);

    for (u, unit) in dataset.fleet.iter().enumerate() {
        let coefficients = pairs
            .iter()
            .map(|&(pu, _)| if pu == u { 1.0 } else { 0.0 })
            .collect();
        problem.add_constraint(format!("capacity_{}", unit.name), coefficients, ConstraintOp::Le, unit.capacity);
    }

    for (r, route) in dataset.routes.iter().enumerate() {
        let coefficients = pairs
            .iter()
            .map(|&(_, pr)| if pr == r { 1.0 } else { 0.0 })
            .collect();
        problem.add_constraint(format!("demand_{}", route.name), coefficients, ConstraintOp::Eq, route.demand);
    }

    debug!(
        variables = problem.num_variables(),
        constraints = problem.num_constraints(),
        "Built transport model"
    );

    TransportModel { problem, pairs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FleetUnit, Route};

    fn dataset() -> Dataset {
        Dataset::new(
            vec![FleetUnit::new("A", 3.0, 1.0), FleetUnit::new("B", 10.0, 5.0)],
            vec![
                Route::new("R1", 5.0, 1.0),
                Route::new("R2", 2.0, 4.0),
                Route::new("R3", 0.0, 2.0),
            ],
        )
    }

    #[test]
    fn test_variables_cover_cross_product() {
        let model = build_model(&dataset());

        assert_eq!(model.num_pairs(), 6);
        assert_eq!(model.problem.num_variables(), 6);
        assert_eq!(model.pairs[0], (0, 0));
        assert_eq!(model.pairs[4], (1, 1));
        assert_eq!(model.problem.variables[4], "x_B_R2");
    }

    #[test]
    fn test_objective_is_cost_times_distance() {
        let model = build_model(&dataset());

        assert!(model.problem.objective.minimize);
        assert_eq!(model.problem.objective.coefficients, vec![1.0, 4.0, 2.0, 5.0, 20.0, 10.0]);
    }

    #[test]
    fn test_capacity_and_demand_rows() {
        let model = build_model(&dataset());
        let constraints = &model.problem.constraints;

        // 2 capacity rows then 3 demand rows
        assert_eq!(constraints.len(), 5);

        assert_eq!(constraints[0].name, "capacity_A");
        assert_eq!(constraints[0].op, ConstraintOp::Le);
        assert_eq!(constraints[0].rhs, 3.0);
        assert_eq!(constraints[0].coefficients, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);

        assert_eq!(constraints[3].name, "demand_R2");
        assert_eq!(constraints[3].op, ConstraintOp::Eq);
        assert_eq!(constraints[3].rhs, 2.0);
        assert_eq!(constraints[3].coefficients, vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_model_is_well_formed() {
        assert!(build_model(&dataset()).problem.validate().is_ok());
    }
}

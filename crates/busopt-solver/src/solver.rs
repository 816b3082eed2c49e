use good_lp::{
    default_solver, variable, variables, Expression, ResolutionError, Solution as _, SolverModel, Variable,
};
use tracing::{debug, warn};

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{ConstraintViolation, Solution};

/// Adapter that hands an [`LpProblem`] to the external LP engine.
///
/// The engine is whatever `good_lp` selects as its default solver; with the
/// `minilp` feature that is a pure-Rust simplex, so there is no separate
/// solver binary to install.
pub struct Solver {
    /// Tolerance for constraint checks, scaled by max(1, |rhs|)
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP problem. All variables are continuous with a lower bound of zero.
    ///
    /// The returned point is checked against every constraint; if the backend
    /// reports success for a point outside the feasible region the solution is
    /// downgraded to [`SolutionStatus::Error`](crate::SolutionStatus::Error).
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            return Solution::error(e.to_string());
        }

        if problem.num_variables() == 0 {
            return self.solve_trivial(problem);
        }

        debug!(
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            minimize = problem.objective.minimize,
            "Handing problem to LP backend"
        );

        let mut vars = variables!();
        let xs: Vec<Variable> = problem
            .variables
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let objective = linear_expression(&xs, &problem.objective.coefficients);
        let unsolved = if problem.objective.minimize {
            vars.minimise(objective)
        } else {
            vars.maximise(objective)
        };

        let mut model = unsolved.using(default_solver);
        for c in &problem.constraints {
            let lhs = linear_expression(&xs, &c.coefficients);
            let constraint = match c.op {
                ConstraintOp::Le => lhs.leq(c.rhs),
                ConstraintOp::Ge => lhs.geq(c.rhs),
                ConstraintOp::Eq => lhs.eq(c.rhs),
            };
            model = model.with(constraint);
        }

        let solved = match model.solve() {
            Ok(s) => s,
            Err(ResolutionError::Infeasible) => {
                debug!("LP backend reported infeasible");
                return Solution::infeasible();
            }
            Err(ResolutionError::Unbounded) => {
                debug!("LP backend reported unbounded");
                return Solution::unbounded();
            }
            Err(other) => {
                warn!("LP backend failed: {}", other);
                return Solution::error(other.to_string());
            }
        };

        let values: Vec<f64> = xs.iter().map(|&x| solved.value(x)).collect();
        let objective_value = problem.evaluate(&values);

        let violations = self.find_violations(problem, &values);
        if !violations.is_empty() {
            warn!(
                count = violations.len(),
                worst = %violations[0].description,
                "LP backend returned an infeasible point"
            );
            return Solution::rejected(values, objective_value, violations);
        }

        debug!(objective = objective_value, "LP backend reported optimal");
        Solution::optimal(values, objective_value)
    }

    /// A problem without variables is feasible exactly when every constraint
    /// holds with an empty left-hand side.
    fn solve_trivial(&self, problem: &LpProblem) -> Solution {
        if self.find_violations(problem, &[]).is_empty() {
            Solution::optimal(Vec::new(), 0.0)
        } else {
            Solution::infeasible()
        }
    }

    /// Find which constraints are violated by a given point
    pub fn find_violations(&self, problem: &LpProblem, values: &[f64]) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &problem.constraints {
            let lhs = c.lhs(values);
            let slack = self.tolerance * c.rhs.abs().max(1.0);

            let violation = match c.op {
                ConstraintOp::Le if lhs > c.rhs + slack => {
                    let amt = lhs - c.rhs;
                    Some((amt, format!("{} exceeds maximum of {:.2} by {:.6}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Ge if lhs < c.rhs - slack => {
                    let amt = c.rhs - lhs;
                    Some((amt, format!("{} is below minimum of {:.2} by {:.6}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Eq if (lhs - c.rhs).abs() > slack => {
                    let amt = (lhs - c.rhs).abs();
                    Some((amt, format!("{} requires exactly {:.2} but got {:.6}", c.name, c.rhs, lhs)))
                }
                _ => None,
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        // Worst first
        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));

        violations
    }
}

fn linear_expression(xs: &[Variable], coefficients: &[f64]) -> Expression {
    let mut expr = Expression::with_capacity(xs.len());
    for (&x, &coef) in xs.iter().zip(coefficients) {
        if coef != 0.0 {
            expr.add_mul(coef, x);
        }
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolutionStatus;

    #[test]
    fn test_maximize_picks_the_richer_variable() {
        // max 4a + b, a + b <= 6, a <= 4  =>  a = 4, b = 2, obj 18
        let mut problem = LpProblem::new(vec!["a".to_string(), "b".to_string()]);
        problem.set_objective(vec![4.0, 1.0], false);
        problem.add_constraint("shared", vec![1.0, 1.0], ConstraintOp::Le, 6.0);
        problem.add_constraint("a_cap", vec![1.0, 0.0], ConstraintOp::Le, 4.0);

        let solution = Solver::new().solve(&problem);

        assert!(solution.is_optimal(), "status = {:?}", solution.status);
        let (a, b) = (solution.values[0], solution.values[1]);
        assert!((a - 4.0).abs() < 1e-6 && (b - 2.0).abs() < 1e-6, "a = {}, b = {}", a, b);
        assert!((solution.objective_value - 18.0).abs() < 1e-6);
        assert!((solution.objective_value - problem.evaluate(&solution.values)).abs() < 1e-12);
    }

    #[test]
    fn test_minimization_with_equality() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y == 4
        //   x <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Eq, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.values[1] - 1.0).abs() < 1e-6);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);
        assert!(solution.violations.is_empty());
    }

    #[test]
    fn test_infeasible_equality_against_capacity() {
        // x + y == 10 with x <= 3, y <= 3 cannot be met
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("demand", vec![1.0, 1.0], ConstraintOp::Eq, 10.0);
        problem.add_constraint("x_cap", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_cap", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
        assert!(!solution.is_optimal());
    }

    #[test]
    fn test_unbounded_maximization() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], false);
        problem.add_constraint("x_min", vec![1.0], ConstraintOp::Ge, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.add_constraint("bad", vec![1.0, 1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Error);
        assert!(solution.message.unwrap().contains("bad"));
    }

    #[test]
    fn test_trivial_problem() {
        let mut problem = LpProblem::new(Vec::new());
        problem.add_constraint("zero", Vec::new(), ConstraintOp::Eq, 0.0);
        assert_eq!(Solver::new().solve(&problem).status, SolutionStatus::Optimal);

        problem.add_constraint("five", Vec::new(), ConstraintOp::Eq, 5.0);
        assert_eq!(Solver::new().solve(&problem).status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_find_violations_sorted_worst_first() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.add_constraint("small", vec![1.0, 0.0], ConstraintOp::Le, 1.0);
        problem.add_constraint("large", vec![0.0, 1.0], ConstraintOp::Ge, 10.0);
        problem.add_constraint("ok", vec![1.0, 1.0], ConstraintOp::Eq, 2.0);

        let violations = Solver::new().find_violations(&problem, &[1.5, 0.5]);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].constraint, "large");
        assert!((violations[0].violation_amount - 9.5).abs() < 1e-12);
        assert_eq!(violations[1].constraint, "small");
    }

    #[test]
    fn test_tolerance_scales_with_rhs() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.add_constraint("big", vec![1.0], ConstraintOp::Eq, 1_000_000.0);

        let solver = Solver::new().with_tolerance(1e-6);
        assert!(solver.find_violations(&problem, &[1_000_000.5]).is_empty());
        assert_eq!(solver.find_violations(&problem, &[1_000_002.0]).len(), 1);
    }
}

mod problem;
mod solution;
mod solver;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, ProblemError};
pub use solution::{ConstraintViolation, Solution, SolutionStatus};
pub use solver::Solver;

pub mod common;
pub mod community;
pub mod propagation;

pub use common::{GraphView, NodeId};
pub use community::component_indices;
pub use propagation::{
    harmonic_function, ComponentSolve, HarmonicConfig, HarmonicResult, PropagationError,
    PropagationResult, SolveMethod, Solver,
};

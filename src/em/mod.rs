//! Expectation-Maximization
//!
//! The E-step, M-step, log-likelihood and lower bound are pure functions of
//! their arguments. [`Em`] strings them together into the iteration
//! `Initialized → EStepDone → MStepDone → EStepDone → … → Stopped`.
mod driver;
mod error;
mod step;

pub use driver::{fit, Em, EmFit, EmParams, EmState, StopReason, Transition};
pub use error::{Degeneracy, EmError};
pub use step::{
    e_step, ln_likelihood, lower_bound, m_step, m_step_with, q_function,
    responsibility_entropy, DegeneratePolicy,
};

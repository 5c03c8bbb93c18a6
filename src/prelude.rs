//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::data::{ResponsibilityMatrix, Sample};
#[doc(no_inline)]
pub use crate::dist::*;
#[doc(no_inline)]
pub use crate::em::{
    e_step, fit, ln_likelihood, lower_bound, m_step, m_step_with,
    DegeneratePolicy, Em, EmError, EmFit, EmParams, EmState, StopReason,
};
#[doc(no_inline)]
pub use crate::traits::*;

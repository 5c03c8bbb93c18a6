//! Mathematical constants and tolerances

/// 0.5 ln(2π)
pub const HALF_LN_2PI: f64 = 0.918_938_533_204_672_7;
/// How far the mixture weights may stray from summing to one
pub const WEIGHT_SUM_TOL: f64 = 1E-9;

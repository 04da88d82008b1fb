pub mod cnumber;
pub mod symbol;

/// Distance below which a floating point component is considered to be the
/// nearest integer.
pub const SNAP_TOLERANCE: f64 = 1e-12;

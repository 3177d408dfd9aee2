//! Constant-time byte comparison.

use subtle::ConstantTimeEq;

/// Compares two byte slices without short-circuiting on the first
/// difference.
///
/// Lengths are compared first (length is not secret). The contents are then
/// compared with [`subtle`], which folds every position before deciding.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

//! One-shot transfer-table materialisation: bakes a 1-input, 1-output
//! function into a fixed 256-entry fixed-point table, for backends
//! that want direct table lookups rather than repeated function calls.

use crate::consts::{TRANSFER_TABLE_MAX, TRANSFER_TABLE_SIZE};
use crate::error::{FnResult, FunctionError};
use crate::function::Function;
use crate::host::CalculatorHost;

/// A materialised 256-entry 1-D transfer table, values fixed-point in
/// `0..=TRANSFER_TABLE_MAX`.
#[derive(Debug, Clone)]
pub struct TransferTable {
    entries: [u16; TRANSFER_TABLE_SIZE],
}

impl TransferTable {
    /// Evaluate `function` at `i / (TRANSFER_TABLE_SIZE - 1)` for each
    /// table index, quantising each result into `0..=TRANSFER_TABLE_MAX`.
    /// `function` must be the usual 1-input, 1-output, `[0,1]` transfer
    /// shape (validated separately by [`crate::validators`] before this is
    /// called from the cache).
    pub fn create<H: CalculatorHost>(function: &Function, host: &mut H) -> FnResult<Self> {
        if function.m() != 1 || function.n() != 1 {
            return Err(FunctionError::range_check("transfer table requires a 1-input, 1-output function"));
        }
        let mut entries = [0u16; TRANSFER_TABLE_SIZE];
        let mut out = [0.0f64];
        for (i, entry) in entries.iter_mut().enumerate() {
            let t = i as f64 / (TRANSFER_TABLE_SIZE - 1) as f64;
            function.evaluate(&[t], &mut out, true, host)?;
            let clamped = out[0].clamp(0.0, 1.0);
            *entry = (clamped * TRANSFER_TABLE_MAX as f64).round() as u16;
        }
        Ok(Self { entries })
    }

    /// The raw entries, for callers that want to inspect the baked table
    /// directly.
    pub fn entries(&self) -> &[u16; TRANSFER_TABLE_SIZE] {
        &self.entries
    }

    /// Look up a 16-bit query: the high 8 bits select the base entry, the
    /// low 8 bits are the linear interpolation fraction towards the next
    /// entry (saturating at the last), rounded to the nearest integer.
    pub fn evaluate(&self, query: u16) -> u16 {
        let index = (query >> 8) as usize;
        let frac = (query & 0xFF) as f64 / 256.0;
        let idx0 = index.min(TRANSFER_TABLE_SIZE - 1);
        let idx1 = (idx0 + 1).min(TRANSFER_TABLE_SIZE - 1);
        let a = self.entries[idx0] as f64;
        let b = self.entries[idx1] as f64;
        (a + frac * (b - a)).round() as u16
    }
}

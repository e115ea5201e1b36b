//! The front-end surface exposed to the rasterizer: evaluate,
//! find-discontinuity, get-info, invalidate/lock/unlock, and the
//! transfer-table trio, all routed through a [`FunctionCache`].

use crate::cache::{FunctionCache, Usage};
use crate::error::{FnResult, FunctionError};
use crate::function::Discontinuity;
use crate::host::{CalculatorHost, DictAccessor};
use crate::transfer::TransferTable;
use crate::validators::ValidatorData;

/// Arity reported by [`get_info`] after a successful unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Input arity.
    pub m: usize,
    /// Output arity.
    pub n: usize,
}

fn resolve<'a>(
    cache: &'a mut FunctionCache,
    dict: &dyn DictAccessor,
    usage: Usage,
    slot: usize,
    gen1: u32,
    gen2: u32,
    data: &ValidatorData,
) -> FnResult<&'a crate::function::Function> {
    let index = cache.cache_entry(dict, usage, slot, gen1, gen2, data)?;
    cache.get(index).ok_or_else(|| FunctionError::VmError("cache slot empty after successful unpack".into()))
}

/// Evaluate a cached function, widening single-precision-sized `inputs`
/// into the core and narrowing `outputs` back is the caller's job; this
/// entry point works in `f64` throughout.
#[allow(clippy::too_many_arguments)]
pub fn evaluate<H: CalculatorHost>(
    cache: &mut FunctionCache,
    dict: &dyn DictAccessor,
    usage: Usage,
    slot: usize,
    gen1: u32,
    gen2: u32,
    data: &ValidatorData,
    inputs: &[f64],
    outputs: &mut [f64],
    upwards: bool,
    host: &mut H,
) -> FnResult<()> {
    let f = resolve(cache, dict, usage, slot, gen1, gen2, data)?;
    if inputs.len() != f.m() {
        return Err(FunctionError::range_check(format!("expected {} inputs, found {}", f.m(), inputs.len())));
    }
    if outputs.len() != f.n() {
        return Err(FunctionError::range_check(format!("expected {} outputs, found {}", f.n(), outputs.len())));
    }
    f.evaluate(inputs, outputs, upwards, host)
}

/// Find the next discontinuity strictly inside `bounds`.
#[allow(clippy::too_many_arguments)]
pub fn find_discontinuity(
    cache: &mut FunctionCache,
    dict: &dyn DictAccessor,
    usage: Usage,
    slot: usize,
    gen1: u32,
    gen2: u32,
    data: &ValidatorData,
    bounds: (f64, f64),
) -> FnResult<Discontinuity> {
    let f = resolve(cache, dict, usage, slot, gen1, gen2, data)?;
    f.find_discontinuity(bounds)
}

/// Report `(M, N)` for a cached function without evaluating it.
#[allow(clippy::too_many_arguments)]
pub fn get_info(
    cache: &mut FunctionCache,
    dict: &dyn DictAccessor,
    usage: Usage,
    slot: usize,
    gen1: u32,
    gen2: u32,
    data: &ValidatorData,
) -> FnResult<FunctionInfo> {
    let f = resolve(cache, dict, usage, slot, gen1, gen2, data)?;
    Ok(FunctionInfo { m: f.m(), n: f.n() })
}

/// Mark a cache entry stale without freeing it.
pub fn invalidate(cache: &mut FunctionCache, usage: Usage, slot: usize) -> FnResult<()> {
    cache.invalidate(usage, slot)
}

/// Set a cache entry's lock bit, suppressing purge.
pub fn lock(cache: &mut FunctionCache, usage: Usage, slot: usize) -> FnResult<()> {
    cache.lock(usage, slot)
}

/// Clear a cache entry's lock bit.
pub fn unlock(cache: &mut FunctionCache, usage: Usage, slot: usize) -> FnResult<()> {
    cache.unlock(usage, slot)
}

/// Bake a cached function into a 256-entry transfer table.
#[allow(clippy::too_many_arguments)]
pub fn create_transfer_table<H: CalculatorHost>(
    cache: &mut FunctionCache,
    dict: &dyn DictAccessor,
    usage: Usage,
    slot: usize,
    gen1: u32,
    gen2: u32,
    data: &ValidatorData,
    host: &mut H,
) -> FnResult<TransferTable> {
    let f = resolve(cache, dict, usage, slot, gen1, gen2, data)?;
    TransferTable::create(f, host)
}

/// Look up a baked transfer table.
pub fn evaluate_table(table: &TransferTable, query: u16) -> u16 {
    table.evaluate(query)
}

/// Release a transfer table. A plain drop suffices in Rust; this exists so
/// callers porting the four-call rasterizer protocol have a literal
/// `destroy_table` to call.
pub fn destroy_table(_table: TransferTable) {}

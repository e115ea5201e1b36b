//! The function cache: a statically partitioned, fixed-slot table keyed by
//! (usage, slot, two generations), with an explicit lock bit and a
//! low-memory purge policy.

use tracing::{trace, warn};

use crate::consts::INVALID_GENERATION;
use crate::error::{FnResult, FunctionError};
use crate::function::{Function, UnpackDepth};
use crate::host::DictAccessor;
use crate::validators::{self, ValidatorData};

/// The usage tag partitioning the cache table, one entry per row of the
/// partition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Halftone transfer functions.
    Halftone,
    /// Black-generation curve.
    BlackGen,
    /// Under-color removal curve.
    Ucr,
    /// Device transfer function.
    Transfer,
    /// Spot-function (halftone cell shape).
    Spot,
    /// Shading (gradient fill) function.
    Shading,
    /// Shading opacity function.
    ShadingOpacity,
    /// CIE-based tint transform.
    CieTint,
    /// Non-CIE tint transform.
    Tint,
    /// Soft-mask transfer function.
    Softmask,
    /// The one-shot front-end evaluate operator.
    EvalOperator,
}

/// `(usage, slot count)` pairs, in partition order, reproducing the fixed
/// partition table exactly.
const DEFAULT_PARTITIONS: [(Usage, usize); 11] = [
    (Usage::Halftone, 20),
    (Usage::BlackGen, 1),
    (Usage::Ucr, 1),
    (Usage::Transfer, 4),
    (Usage::Spot, 1),
    (Usage::Shading, 10),
    (Usage::ShadingOpacity, 1),
    (Usage::CieTint, 1),
    (Usage::Tint, 2),
    (Usage::Softmask, 1),
    (Usage::EvalOperator, 1),
];

/// Cache-wide configuration: the usage partition table plus the tunables
/// (linearity tolerance, recursion depth, low-memory purge offer).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `(usage, slot count)` partition table.
    pub partitions: Vec<(Usage, usize)>,
    /// Default Type 0 discontinuity-segment linearity tolerance.
    pub linearity_tolerance: f64,
    /// Type 3 recursion-depth bound.
    pub recursion_depth: u32,
    /// Low-memory purge offer size, in bytes.
    pub purge_offer_bytes: usize,
    /// Low-memory purge offer cost.
    pub purge_offer_cost: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS.to_vec(),
            linearity_tolerance: crate::consts::DEFAULT_LINEARITY_TOLERANCE,
            recursion_depth: crate::consts::MAX_STITCH_RECURSION_DEPTH,
            purge_offer_bytes: crate::consts::LOW_MEMORY_PURGE_OFFER_BYTES,
            purge_offer_cost: crate::consts::LOW_MEMORY_PURGE_COST,
        }
    }
}

/// Current external state a purge pass is preserved against: the "current
/// id" per usage, and whether the host is between operator executions
/// (gating the low-memory offer).
#[derive(Debug, Clone, Copy, Default)]
pub struct PurgeContext {
    /// The rasterizer's current halftone type (5 and 195 are the special
    /// "transfer table halftone" types).
    pub halftone_type: i32,
    /// Current halftone id, compared against a halftone-transfer entry's
    /// first generation.
    pub current_halftone_id: u32,
    /// Current black-generation id.
    pub current_blackgen_id: u32,
    /// Current UCR id.
    pub current_ucr_id: u32,
    /// Current device-transfer id.
    pub current_transfer_id: u32,
    /// True when the host is between operator executions; gates the
    /// low-memory solicit/release offer.
    pub between_operators: bool,
}

#[derive(Debug)]
struct Slot {
    locked: bool,
    gen1: u32,
    gen2: u32,
    function: Option<Function>,
}

impl Default for Slot {
    fn default() -> Self {
        Self { locked: false, gen1: INVALID_GENERATION, gen2: INVALID_GENERATION, function: None }
    }
}

impl Slot {
    fn is_valid_for(&self, gen1: u32, gen2: u32) -> bool {
        self.function.is_some() && self.gen1 == gen1 && self.gen2 == gen2
    }

    fn invalidate(&mut self) {
        self.gen1 = INVALID_GENERATION;
        self.gen2 = INVALID_GENERATION;
    }
}

/// The statically partitioned function cache.
#[derive(Debug)]
pub struct FunctionCache {
    config: CacheConfig,
    slots: Vec<Slot>,
    bases: Vec<(Usage, usize, usize)>, // usage, base offset, count
}

impl FunctionCache {
    /// Build a cache with the given configuration, allocating all slots
    /// up front (the table is statically sized).
    pub fn new(config: CacheConfig) -> Self {
        let mut bases = Vec::with_capacity(config.partitions.len());
        let mut total = 0usize;
        for &(usage, count) in &config.partitions {
            bases.push((usage, total, count));
            total += count;
        }
        let slots = (0..total).map(|_| Slot::default()).collect();
        Self { config, slots, bases }
    }

    /// The cache's tunable configuration.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve `(usage, slot)` to a global slot index, collapsing
    /// out-of-range requests to the usage's last slot ("truncated-offset"
    /// mode) and reporting whether truncation occurred.
    fn resolve(&self, usage: Usage, slot: usize) -> FnResult<(usize, bool)> {
        let (_, base, count) = self
            .bases
            .iter()
            .find(|(u, _, _)| *u == usage)
            .copied()
            .ok_or_else(|| FunctionError::ConfigurationError(format!("usage {usage:?} has no partition")))?;
        if count == 0 {
            return Err(FunctionError::ConfigurationError(format!("usage {usage:?} has zero slots")));
        }
        if slot < count {
            Ok((base + slot, false))
        } else {
            Ok((base + count - 1, true))
        }
    }

    /// Select the slot for `(usage, slot, gen1, gen2)`; if stale, free the
    /// previous type-specific state, unpack `dict`, validate it for
    /// `usage`, and cache it. Returns the global slot index as an opaque
    /// handle for `get`/`lock`/`unlock`.
    pub fn cache_entry(
        &mut self,
        dict: &dyn DictAccessor,
        usage: Usage,
        slot: usize,
        gen1: u32,
        gen2: u32,
        data: &ValidatorData,
    ) -> FnResult<usize> {
        let (index, truncated) = self.resolve(usage, slot)?;

        if self.slots[index].is_valid_for(gen1, gen2) {
            trace!(?usage, slot, "function cache hit");
            if truncated {
                self.slots[index].invalidate();
            }
            return Ok(index);
        }

        trace!(?usage, slot, "function cache miss, unpacking");
        self.slots[index].function = None;
        self.slots[index].invalidate();

        let unpacked = Function::unpack(dict, UnpackDepth(self.config.recursion_depth));
        let unpacked = match unpacked {
            Ok(f) => f,
            Err(e) => {
                warn!(?usage, slot, error = %e, "function unpack failed");
                return Err(e);
            }
        };

        if let Err(e) = validators::validate(usage, &unpacked, data) {
            warn!(?usage, slot, error = %e, "function validator failed");
            return Err(e);
        }

        self.slots[index].function = Some(unpacked);
        if truncated {
            self.slots[index].invalidate();
        } else {
            self.slots[index].gen1 = gen1;
            self.slots[index].gen2 = gen2;
        }
        Ok(index)
    }

    /// Borrow the function at a handle returned by [`Self::cache_entry`].
    pub fn get(&self, index: usize) -> Option<&Function> {
        self.slots[index].function.as_ref()
    }

    /// Set the lock bit; a locked entry is never purged.
    pub fn lock(&mut self, usage: Usage, slot: usize) -> FnResult<()> {
        let (index, _) = self.resolve(usage, slot)?;
        self.slots[index].locked = true;
        Ok(())
    }

    /// Clear the lock bit.
    pub fn unlock(&mut self, usage: Usage, slot: usize) -> FnResult<()> {
        let (index, _) = self.resolve(usage, slot)?;
        self.slots[index].locked = false;
        Ok(())
    }

    /// Mark an entry stale without freeing storage; the next lookup will
    /// re-unpack.
    pub fn invalidate(&mut self, usage: Usage, slot: usize) -> FnResult<()> {
        let (index, _) = self.resolve(usage, slot)?;
        self.slots[index].invalidate();
        Ok(())
    }

    fn preserved(&self, usage: Usage, slot: &Slot, ctx: &PurgeContext) -> bool {
        match usage {
            Usage::Halftone => {
                (ctx.halftone_type == 5 || ctx.halftone_type == 195) && slot.gen1 == ctx.current_halftone_id
            }
            Usage::BlackGen => slot.gen1 == ctx.current_blackgen_id,
            Usage::Ucr => slot.gen1 == ctx.current_ucr_id,
            Usage::Transfer => slot.gen1 == ctx.current_transfer_id,
            Usage::Spot
            | Usage::Shading
            | Usage::Tint
            | Usage::CieTint
            | Usage::Softmask
            | Usage::EvalOperator
            | Usage::ShadingOpacity => slot.locked,
        }
    }

    /// Return the number of purgeable entries, freeing them when
    /// `do_free` is set. An entry is purgeable iff it holds a function,
    /// is not locked, and is not preserved under `ctx`'s usage-specific
    /// rule ("purge rules differ per usage region").
    pub fn purge(&mut self, ctx: &PurgeContext, do_free: bool) -> usize {
        let mut count = 0;
        for (usage, base, n) in self.bases.clone() {
            for i in base..base + n {
                let slot = &self.slots[i];
                if slot.function.is_none() || slot.locked {
                    continue;
                }
                if self.preserved(usage, slot, ctx) {
                    continue;
                }
                count += 1;
                if do_free {
                    self.slots[i].function = None;
                    self.slots[i].invalidate();
                }
            }
        }
        count
    }

    /// The low-memory solicit/release pair: offers
    /// [`CacheConfig::purge_offer_bytes`] at
    /// [`CacheConfig::purge_offer_cost`] only when `ctx.between_operators`
    /// and at least one entry is purgeable; otherwise the offer is
    /// withheld.
    pub fn solicit_low_memory(&mut self, ctx: &PurgeContext) -> Option<(usize, f64)> {
        if !ctx.between_operators {
            return None;
        }
        if self.purge(ctx, false) == 0 {
            return None;
        }
        Some((self.config.purge_offer_bytes, self.config.purge_offer_cost))
    }

    /// Accept a previously solicited low-memory offer: actually purge.
    pub fn release_low_memory(&mut self, ctx: &PurgeContext) -> usize {
        self.purge(ctx, true)
    }
}

//! Function-core constants

/* ARITY LIMITS */

/// Minimum input arity `M` for any function (exclusive upper bound is
/// [`MAX_FUNCTION_INPUTS`]).
pub const MIN_FUNCTION_INPUTS: usize = 1;

/// Exclusive upper bound on input arity `M`. Interpolation corner counts
/// (`2^M`) and sample-grid strides are only guaranteed not to overflow
/// below this bound.
pub const MAX_FUNCTION_INPUTS: usize = 32;

/// Domain/range entries up to this many axes are stored inline in the
/// function header; beyond it a heap buffer is allocated lazily.
pub const INLINE_ARITY: usize = 4;

/* TYPE 0 */

/// Bits-per-sample values a Type 0 sample grid may declare.
pub const ALLOWED_BITS_PER_SAMPLE: [u32; 8] = [1, 2, 4, 8, 12, 16, 24, 32];

/// Requested interpolation order that is accepted without downgrade.
pub const INTERPOLATION_ORDER_LINEAR: i32 = 1;

/// Requested interpolation order that is silently downgraded to
/// [`INTERPOLATION_ORDER_LINEAR`] for multi-dimensional samples (cubic
/// spline fitting is only implemented for a single input axis).
pub const INTERPOLATION_ORDER_CUBIC: i32 = 3;

/// Default linearity tolerance, in grid units, used by the Type 0
/// discontinuity-segment merge for shading usage.
pub const DEFAULT_LINEARITY_TOLERANCE: f64 = 3.0;

/* TYPE 3 */

/// Maximum Type 3 sub-function nesting depth. A 33rd nested level yields
/// `UndefinedResult`.
pub const MAX_STITCH_RECURSION_DEPTH: u32 = 32;

/// The `epsilon * |t|` bias applied to the Type 3 selection input to break
/// ties at sub-function boundaries.
pub const STITCH_BIAS_EPSILON: f64 = 1.0e-9;

/* TRANSFER TABLES */

/// Entry count of a materialised transfer table.
pub const TRANSFER_TABLE_SIZE: usize = 256;

/// Fixed-point ceiling a transfer table entry represents (matches the
/// `COLORVALUE` convention of the reference rasterizer).
pub const TRANSFER_TABLE_MAX: u16 = 0xFF00;

/* CACHE */

/// Sentinel generation value marking a cache entry as stale/invalidated.
pub const INVALID_GENERATION: u32 = u32::MAX;

/// Notional bytes a single low-memory purge offer advertises.
pub const LOW_MEMORY_PURGE_OFFER_BYTES: usize = 64 * 1024;

/// Relative cost advertised alongside [`LOW_MEMORY_PURGE_OFFER_BYTES`].
pub const LOW_MEMORY_PURGE_COST: f64 = 1.0;

/* SPREAD */

/// Minimum accepted spread factor; 0 is a range-check error.
pub const MIN_SPREAD_FACTOR: u32 = 1;

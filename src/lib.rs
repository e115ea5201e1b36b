//! PDF/PostScript Function (types 0, 2, 3, 4) evaluation core: unpack,
//! cache, evaluate, find-discontinuity, spread, and transfer-table
//! materialisation, for rasterizers that need color transforms, shading
//! gradients, halftone transfer curves, and tint/UCR/black-generation
//! functions without depending on a particular host interpreter.

pub mod cache;
pub mod consts;
pub mod error;
pub mod function;
pub mod header;
pub mod host;
pub mod ops;
pub mod spread;
pub mod transfer;
pub mod types;
pub mod validators;

pub mod prelude {
    //! Common imports for embedders driving the whole pipeline.

    pub use crate::cache::{CacheConfig, FunctionCache, PurgeContext, Usage};
    pub use crate::error::{FnResult, FunctionError};
    pub use crate::function::{Discontinuity, Function, Order};
    pub use crate::header::{FunctionHeader, FunctionTypeTag, Spread, SpreadMethod};
    pub use crate::host::{ByteSource, CalculatorHost, DictAccessor, DictValue, MemoryPool, SliceSource};
    pub use crate::ops::{
        create_transfer_table, destroy_table, evaluate, evaluate_table, find_discontinuity, get_info, invalidate,
        lock, unlock, FunctionInfo,
    };
    pub use crate::transfer::TransferTable;
    pub use crate::types::calculator::StackMachine;
    pub use crate::validators::ValidatorData;
}

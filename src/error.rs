//! Function-core error implementation

use std::io;
use thiserror::Error;

use crate::cache::Usage;

/// Error kinds produced by unpack, evaluate, find-discontinuity, and cache
/// operations.
///
/// These mirror the error kind table of the function evaluation core: every
/// variant here corresponds to exactly one row of that table (type-check,
/// range-check, undefined-result, vm-error, io-error, stack-underflow,
/// invalid-access, configuration-error).
#[derive(Debug, Error)]
pub enum FunctionError {
    /// Missing required dictionary key, or wrong object kind for a key.
    #[error("type check failed: {0}")]
    TypeCheck(String),

    /// Out-of-range numeric value: bad bits-per-sample, zero spread factor,
    /// negative size, non-monotone domain, wrong arity for a usage, Type 3
    /// bounds outside the domain, or mismatched sub-function arity.
    #[error("range check failed: {0}")]
    RangeCheck(String),

    /// Degenerate domain (`lb == ub` outside the documented Type 3 quirk),
    /// a Type 2 `pow` precondition violation, or Type 3 recursion depth
    /// exceeded.
    #[error("undefined result: {0}")]
    UndefinedResult(String),

    /// Allocation failure while unpacking or growing cache storage.
    #[error("vm error: allocation failed ({0})")]
    VmError(String),

    /// The byte source backing a Type 0 sample table or Type 4 procedure
    /// could not be read, or ended early.
    #[error("io error: {0}")]
    IoError(#[from] io::Error),

    /// A Type 4 calculator procedure left fewer values on the stack than
    /// the function's declared output arity.
    #[error("stack underflow: expected {expected} outputs, found {found}")]
    StackUnderflow {
        /// Declared output arity `N`.
        expected: usize,
        /// Values actually present on the stack.
        found: usize,
    },

    /// A Type 4 procedure is not executable/readable, or contains a token
    /// outside the calculator-function operator subset.
    #[error("invalid access: {0}")]
    InvalidAccess(String),

    /// The low-memory handler could not be registered at startup.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl FunctionError {
    /// Build a [`FunctionError::TypeCheck`] naming the offending key.
    pub fn type_check(key: &str) -> Self {
        Self::TypeCheck(key.to_string())
    }

    /// Build a [`FunctionError::RangeCheck`] with a free-form reason.
    pub fn range_check(reason: impl Into<String>) -> Self {
        Self::RangeCheck(reason.into())
    }

    /// Build a [`FunctionError::UndefinedResult`] with a free-form reason.
    pub fn undefined_result(reason: impl Into<String>) -> Self {
        Self::UndefinedResult(reason.into())
    }

    /// Build a [`FunctionError::RangeCheck`] reporting a usage/arity mismatch.
    pub fn bad_arity(usage: Usage, expected_m: Option<usize>, m: usize, expected_n: Option<usize>, n: usize) -> Self {
        Self::RangeCheck(format!(
            "usage {usage:?} expects arity ({expected_m:?}, {expected_n:?}), found ({m}, {n})"
        ))
    }

    /// True if this error leaves room for the caller to retry with a
    /// different (usage, slot) rather than treating it as fatal. Only
    /// allocation and registration failures are non-recoverable in this
    /// sense.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::VmError(_) | Self::ConfigurationError(_))
    }
}

/// Convenience alias used throughout the crate.
pub type FnResult<T> = Result<T, FunctionError>;

//! Usage-specific validator predicates, run once a function has been
//! unpacked and before its cache entry is accepted.

use crate::error::{FnResult, FunctionError};
use crate::function::Function;
use crate::cache::Usage;

/// Extra, usage-specific data a validator needs beyond the unpacked
/// function itself: the caller-supplied sub-domain for shading, or the
/// expected output arity for non-CIE tint transforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorData {
    /// Shading: the caller-supplied sub-domain the function's domain must
    /// contain.
    pub sub_domain: Option<(f64, f64)>,
    /// Tint (non-CIE): the expected output arity.
    pub expected_n: Option<usize>,
}

fn check_unit_1_1(f: &Function, usage: Usage) -> FnResult<()> {
    if f.m() != 1 || f.n() != 1 {
        return Err(FunctionError::bad_arity(usage, Some(1), f.m(), Some(1), f.n()));
    }
    let (lo, hi) = f.header.domain.axis(0);
    if lo != 0.0 || hi != 1.0 {
        return Err(FunctionError::range_check("Domain must be [0, 1]"));
    }
    if let Some(range) = &f.header.range {
        let (rlo, rhi) = range.axis(0);
        if rlo != 0.0 || rhi != 1.0 {
            return Err(FunctionError::range_check("Range must be [0, 1] when present"));
        }
    }
    Ok(())
}

fn check_ucr(f: &Function) -> FnResult<()> {
    if f.m() != 1 || f.n() != 1 {
        return Err(FunctionError::bad_arity(Usage::Ucr, Some(1), f.m(), Some(1), f.n()));
    }
    let (lo, hi) = f.header.domain.axis(0);
    if lo != 0.0 || hi != 1.0 {
        return Err(FunctionError::range_check("Domain must be [0, 1]"));
    }
    if let Some(range) = &f.header.range {
        let (rlo, rhi) = range.axis(0);
        if rlo != -1.0 || rhi != 1.0 {
            return Err(FunctionError::range_check("Range must be [-1, 1] when present"));
        }
    }
    Ok(())
}

fn check_spot(f: &Function) -> FnResult<()> {
    if f.m() != 2 || f.n() != 1 {
        return Err(FunctionError::bad_arity(Usage::Spot, Some(2), f.m(), Some(1), f.n()));
    }
    for axis in 0..2 {
        let (lo, hi) = f.header.domain.axis(axis);
        if lo != -1.0 || hi != 1.0 {
            return Err(FunctionError::range_check("Domain must be [-1, 1]^2"));
        }
    }
    if let Some(range) = &f.header.range {
        let (rlo, rhi) = range.axis(0);
        if rlo != -1.0 || rhi != 1.0 {
            return Err(FunctionError::range_check("Range must be [-1, 1] when present"));
        }
    }
    Ok(())
}

fn check_shading(f: &Function, data: &ValidatorData) -> FnResult<()> {
    if let Some((lo, hi)) = data.sub_domain {
        let (dlo, dhi) = f.header.domain.axis(0);
        if dlo > lo || dhi < hi {
            return Err(FunctionError::range_check("Domain must contain the caller-supplied sub-domain"));
        }
    }
    Ok(())
}

fn check_tint(f: &Function, data: &ValidatorData) -> FnResult<()> {
    if !f.header.domain.strictly_monotone() {
        return Err(FunctionError::range_check("tint Domain axes must be strictly monotone"));
    }
    if let Some(range) = &f.header.range {
        if !range.non_decreasing() {
            return Err(FunctionError::range_check("tint Range axes must be non-decreasing"));
        }
    }
    if let Some(expected_n) = data.expected_n {
        if f.n() != expected_n {
            return Err(FunctionError::bad_arity(Usage::Tint, None, f.m(), Some(expected_n), f.n()));
        }
    }
    Ok(())
}

/// Run the validator for `usage` against an unpacked function.
pub fn validate(usage: Usage, f: &Function, data: &ValidatorData) -> FnResult<()> {
    match usage {
        Usage::Halftone | Usage::Transfer | Usage::Softmask | Usage::ShadingOpacity | Usage::BlackGen => {
            check_unit_1_1(f, usage)
        }
        Usage::Ucr => check_ucr(f),
        Usage::Spot => check_spot(f),
        Usage::Shading => check_shading(f, data),
        Usage::Tint => check_tint(f, data),
        Usage::CieTint | Usage::EvalOperator => Ok(()),
    }
}

//! Common function header: domain/range boxes, spread, and the generic
//! unpack dispatcher that reads them from a dictionary before delegating to
//! a type-specific unpacker.

use crate::consts::INLINE_ARITY;
use crate::error::{FnResult, FunctionError};
use crate::host::{DictAccessor, DictValue};

/// An axis-aligned box (a flat `2*arity` list of `lo, hi` pairs) stored
/// inline for small arities and on the heap beyond [`INLINE_ARITY`] axes,
/// matching the function cache's "inlined small-arity storage... plus a
/// lazy heap-allocated buffer when arity exceeds 4".
#[derive(Debug, Clone)]
pub enum AxisBox {
    /// `arity <= INLINE_ARITY`: the `2*arity` bounds live in a fixed array.
    Inline {
        /// Number of valid entries (`2 * arity`).
        len: usize,
        /// Backing storage; only `[..len]` is meaningful.
        data: [f64; INLINE_ARITY * 2],
    },
    /// `arity > INLINE_ARITY`: heap-allocated.
    Heap(Vec<f64>),
}

impl AxisBox {
    /// Build an [`AxisBox`] from a flat bounds list, choosing inline or
    /// heap storage based on length.
    pub fn from_slice(values: &[f64]) -> Self {
        if values.len() <= INLINE_ARITY * 2 {
            let mut data = [0.0; INLINE_ARITY * 2];
            data[..values.len()].copy_from_slice(values);
            Self::Inline { len: values.len(), data }
        } else {
            Self::Heap(values.to_vec())
        }
    }

    /// The flat bounds list.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Self::Inline { len, data } => &data[..*len],
            Self::Heap(v) => v.as_slice(),
        }
    }

    /// Number of axes (`len / 2`).
    pub fn arity(&self) -> usize {
        self.as_slice().len() / 2
    }

    /// The `(lo, hi)` pair for axis `i`.
    pub fn axis(&self, i: usize) -> (f64, f64) {
        let s = self.as_slice();
        (s[2 * i], s[2 * i + 1])
    }

    /// Clip `value` to axis `i`'s `[lo, hi]` bounds.
    pub fn clip(&self, i: usize, value: f64) -> f64 {
        let (lo, hi) = self.axis(i);
        value.clamp(lo, hi)
    }

    /// True iff every axis is strictly increasing (`lo < hi`), the
    /// invariant required of `Domain`.
    pub fn strictly_monotone(&self) -> bool {
        (0..self.arity()).all(|i| {
            let (lo, hi) = self.axis(i);
            lo < hi
        })
    }

    /// True iff every axis is non-decreasing (`lo <= hi`), the weaker
    /// invariant accepted for some `Range` validators.
    pub fn non_decreasing(&self) -> bool {
        (0..self.arity()).all(|i| {
            let (lo, hi) = self.axis(i);
            lo <= hi
        })
    }
}

/// Repeat/reflect outer transform tiling a function over an integer
/// multiple of its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadMethod {
    /// No spread; the function is evaluated as-is.
    None,
    /// Tile the domain, wrapping each repetition to the same orientation.
    Repeat,
    /// Tile the domain, alternating orientation each repetition.
    Reflect,
}

/// The spread outer transform: a method plus a factor (`factor == 1` is a
/// no-op regardless of method).
#[derive(Debug, Clone, Copy)]
pub struct Spread {
    /// Tiling method.
    pub method: SpreadMethod,
    /// Tiling factor; must be `>= 1`.
    pub factor: u32,
}

impl Default for Spread {
    fn default() -> Self {
        Self { method: SpreadMethod::None, factor: 1 }
    }
}

impl Spread {
    /// True when spread has no observable effect.
    pub fn is_identity(&self) -> bool {
        matches!(self.method, SpreadMethod::None) || self.factor <= 1
    }
}

/// The header common to every function type: arity, domain, range, spread.
/// Type-specific unpackers read this before building their own state.
#[derive(Debug, Clone)]
pub struct FunctionHeader {
    /// Input arity.
    pub m: usize,
    /// Output arity (0 when Range is absent, resolved later for types 2/3).
    pub n: usize,
    /// `Domain`: `2*m` monotone reals.
    pub domain: AxisBox,
    /// `Range`, when present (required for types 0 and 4).
    pub range: Option<AxisBox>,
    /// Outer repeat/reflect transform.
    pub spread: Spread,
}

fn read_numbers(dict: &dyn DictAccessor, key: &str) -> FnResult<Option<Vec<f64>>> {
    match dict.get(key) {
        None => Ok(None),
        Some(DictValue::Numbers(v)) => Ok(Some(v)),
        Some(DictValue::Number(n)) => Ok(Some(vec![n])),
        Some(_) => Err(FunctionError::type_check(key)),
    }
}

fn read_required_numbers(dict: &dyn DictAccessor, key: &str) -> FnResult<Vec<f64>> {
    read_numbers(dict, key)?.ok_or_else(|| FunctionError::type_check(key))
}

/// The function type tag read from `FunctionType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionTypeTag {
    /// Type 0: sampled.
    Sampled,
    /// Type 2: exponential interpolation.
    Exponential,
    /// Type 3: stitching.
    Stitching,
    /// Type 4: calculator.
    Calculator,
}

impl FunctionTypeTag {
    fn from_code(code: f64) -> FnResult<Self> {
        match code as i64 {
            0 => Ok(Self::Sampled),
            2 => Ok(Self::Exponential),
            3 => Ok(Self::Stitching),
            4 => Ok(Self::Calculator),
            other => Err(FunctionError::range_check(format!("unsupported FunctionType {other}"))),
        }
    }
}

/// Read the common header fields out of a function dictionary: `Domain`,
/// optional `Range`, optional `HqnSpreadMethod`/`HqnSpreadFactor`, and the
/// `FunctionType` tag, validating the shared invariants (even, non-empty
/// lengths; Range required for types 0 and 4).
pub fn read_header(dict: &dyn DictAccessor) -> FnResult<(FunctionTypeTag, FunctionHeader)> {
    let type_code = match dict.require("FunctionType")? {
        DictValue::Number(n) => n,
        _ => return Err(FunctionError::type_check("FunctionType")),
    };
    let tag = FunctionTypeTag::from_code(type_code)?;

    let domain_values = read_required_numbers(dict, "Domain")?;
    if domain_values.is_empty() || domain_values.len() % 2 != 0 {
        return Err(FunctionError::range_check("Domain length must be even and non-zero"));
    }
    let domain = AxisBox::from_slice(&domain_values);
    if !domain.strictly_monotone() {
        return Err(FunctionError::range_check("Domain axis lo must be strictly less than hi"));
    }
    let m = domain.arity();
    if m == 0 || m >= crate::consts::MAX_FUNCTION_INPUTS {
        return Err(FunctionError::range_check(format!("input arity {m} out of range")));
    }

    let range = match read_numbers(dict, "Range")? {
        Some(values) => {
            if values.is_empty() || values.len() % 2 != 0 {
                return Err(FunctionError::range_check("Range length must be even and non-zero"));
            }
            Some(AxisBox::from_slice(&values))
        }
        None => None,
    };

    if range.is_none() && matches!(tag, FunctionTypeTag::Sampled | FunctionTypeTag::Calculator) {
        return Err(FunctionError::type_check("Range"));
    }
    let n = range.as_ref().map_or(0, AxisBox::arity);

    let spread_method = match dict.get("HqnSpreadMethod") {
        None => SpreadMethod::None,
        Some(DictValue::Name(name)) => match name.as_str() {
            "Repeat" => SpreadMethod::Repeat,
            "Reflect" => SpreadMethod::Reflect,
            other => return Err(FunctionError::range_check(format!("unknown HqnSpreadMethod {other}"))),
        },
        Some(_) => return Err(FunctionError::type_check("HqnSpreadMethod")),
    };
    let spread_factor = match dict.get("HqnSpreadFactor") {
        None => 1u32,
        Some(DictValue::Number(n)) => {
            if n < crate::consts::MIN_SPREAD_FACTOR as f64 {
                return Err(FunctionError::range_check("HqnSpreadFactor must be >= 1"));
            }
            n as u32
        }
        Some(_) => return Err(FunctionError::type_check("HqnSpreadFactor")),
    };

    Ok((
        tag,
        FunctionHeader {
            m,
            n,
            domain,
            range,
            spread: Spread { method: spread_method, factor: spread_factor },
        },
    ))
}

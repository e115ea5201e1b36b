//! Generic unpack dispatcher and the tagged-variant function representation.
//!
//! The reference rasterizer dispatches through a struct of function
//! pointers (`evaluate`, `free`, `find-discontinuity`) cast through an
//! opaque type-specific pointer. Here that becomes a plain tagged enum:
//! ownership of the type-specific payload moves with the variant, and
//! dispatch is a `match` instead of an indirect call.

use crate::error::FnResult;
use crate::header::{read_header, FunctionHeader, FunctionTypeTag};
use crate::host::{CalculatorHost, DictAccessor};
use crate::types::calculator::Calculator;
use crate::types::exponential::Exponential;
use crate::types::sampled::Sampled;
use crate::types::stitching::Stitching;

/// Discontinuity order as reported by `find_discontinuity`: `None` means
/// "no discontinuity in this interval" (encoded as `-1` at the FFI-ish
/// boundary in [`Discontinuity::order_code`]), `Value` is a jump (order 0),
/// `Derivative` is a first-derivative discontinuity (order 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// No discontinuity within the searched interval.
    None,
    /// A value (jump) discontinuity.
    Value,
    /// A first-derivative discontinuity.
    Derivative,
}

impl Order {
    /// The `-1/0/1` integer encoding used by the external evaluate-table
    /// style interface.
    pub const fn order_code(self) -> i32 {
        match self {
            Self::None => -1,
            Self::Value => 0,
            Self::Derivative => 1,
        }
    }
}

/// A located discontinuity: the input position plus its order.
#[derive(Debug, Clone, Copy)]
pub struct Discontinuity {
    /// The input-space position of the discontinuity.
    pub at: f64,
    /// Its order.
    pub order: Order,
}

/// The depth-bounded recursion budget Type 3 unpack carries through nested
/// sub-function unpacking.
#[derive(Debug, Clone, Copy)]
pub struct UnpackDepth(pub u32);

impl UnpackDepth {
    /// A fresh top-level budget.
    pub const fn top() -> Self {
        Self(crate::consts::MAX_STITCH_RECURSION_DEPTH)
    }

    /// Consume one level of recursion, erroring if the budget is exhausted.
    pub fn descend(self) -> FnResult<Self> {
        if self.0 == 0 {
            return Err(crate::error::FunctionError::undefined_result("Type 3 recursion depth exceeded"));
        }
        Ok(Self(self.0 - 1))
    }
}

/// The tagged-variant function representation: unpacked state for exactly
/// one of the four function types, plus the shared header.
#[derive(Debug, Clone)]
pub struct Function {
    /// Shared domain/range/arity/spread header.
    pub header: FunctionHeader,
    /// Type-specific unpacked state.
    pub kind: FunctionKind,
}

/// Type-specific unpacked state, one variant per PDF/PostScript function
/// type.
#[derive(Debug, Clone)]
pub enum FunctionKind {
    /// Type 0: sampled.
    Sampled(Sampled),
    /// Type 2: exponential.
    Exponential(Exponential),
    /// Type 3: stitching.
    Stitching(Stitching),
    /// Type 4: calculator.
    Calculator(Calculator),
}

impl Function {
    /// Run the generic unpack dispatcher: read the common header, then
    /// delegate to the type-specific unpacker. Recursion depth for nested
    /// Type 3 sub-functions is bounded by `depth`.
    pub fn unpack(dict: &dyn DictAccessor, depth: UnpackDepth) -> FnResult<Self> {
        let (tag, mut header) = read_header(dict)?;
        let kind = match tag {
            FunctionTypeTag::Sampled => FunctionKind::Sampled(Sampled::unpack(dict, &header)?),
            FunctionTypeTag::Exponential => {
                let exp = Exponential::unpack(dict, &header)?;
                if header.n == 0 {
                    header.n = exp.output_arity();
                }
                FunctionKind::Exponential(exp)
            }
            FunctionTypeTag::Stitching => {
                let stitch = Stitching::unpack(dict, &header, depth)?;
                if header.n == 0 {
                    header.n = stitch.output_arity();
                }
                FunctionKind::Stitching(stitch)
            }
            FunctionTypeTag::Calculator => FunctionKind::Calculator(Calculator::unpack(dict, &header)?),
        };
        Ok(Self { header, kind })
    }

    /// Input arity.
    pub const fn m(&self) -> usize {
        self.header.m
    }

    /// Output arity.
    pub const fn n(&self) -> usize {
        self.header.n
    }

    /// Evaluate the function. `inputs`/`outputs` are clipped to
    /// domain/range respectively; `upwards` selects Type 3/spread tie-break
    /// direction and is ignored by types 0, 2, and 4. A non-identity spread
    /// pre-wraps a single-input function's domain before dispatch.
    pub fn evaluate<H: CalculatorHost>(
        &self,
        inputs: &[f64],
        outputs: &mut [f64],
        upwards: bool,
        host: &mut H,
    ) -> FnResult<()> {
        debug_assert_eq!(inputs.len(), self.header.m);
        debug_assert_eq!(outputs.len(), self.header.n);
        let mut wrapped_inputs: Vec<f64> = inputs.to_vec();
        if !self.header.spread.is_identity() && self.header.m == 1 {
            let (dom_lo, dom_hi) = self.header.domain.axis(0);
            let span = dom_hi - dom_lo;
            if span > 0.0 {
                let norm = (inputs[0] - dom_lo) / span;
                let s = crate::spread::forward(self.header.spread, norm, upwards);
                wrapped_inputs[0] = dom_lo + s.wrapped * span;
            }
        }
        let clipped: Vec<f64> =
            (0..self.header.m).map(|i| self.header.domain.clip(i, wrapped_inputs[i])).collect();
        match &self.kind {
            FunctionKind::Sampled(s) => s.evaluate(&clipped, outputs)?,
            FunctionKind::Exponential(e) => e.evaluate(&clipped, outputs)?,
            FunctionKind::Stitching(st) => st.evaluate(&clipped, outputs, upwards, host)?,
            FunctionKind::Calculator(c) => c.evaluate(&clipped, outputs, host)?,
        }
        if let Some(range) = &self.header.range {
            for (i, v) in outputs.iter_mut().enumerate() {
                *v = range.clip(i, *v);
            }
        }
        Ok(())
    }

    /// Find the next discontinuity strictly inside `[bounds.0, bounds.1]`
    /// along the single input axis, accounting for a non-identity spread
    /// by checking both the next wrap boundary and the wrapped base
    /// function's own discontinuity.
    pub fn find_discontinuity(&self, bounds: (f64, f64)) -> FnResult<Discontinuity> {
        let (lo, hi) = if bounds.0 <= bounds.1 { bounds } else { (bounds.1, bounds.0) };
        if self.header.spread.is_identity() || self.header.m != 1 {
            return self.find_discontinuity_base(lo, hi);
        }
        self.find_discontinuity_spread(lo, hi)
    }

    fn find_discontinuity_base(&self, lo: f64, hi: f64) -> FnResult<Discontinuity> {
        match &self.kind {
            FunctionKind::Sampled(s) => s.find_discontinuity(&self.header, (lo, hi)),
            FunctionKind::Exponential(e) => Ok(e.find_discontinuity(&self.header, (lo, hi))),
            FunctionKind::Stitching(st) => st.find_discontinuity(&self.header, (lo, hi)),
            FunctionKind::Calculator(_) => Ok(Discontinuity { at: lo, order: Order::None }),
        }
    }

    fn find_discontinuity_spread(&self, lo: f64, hi: f64) -> FnResult<Discontinuity> {
        let (dom_lo, dom_hi) = self.header.domain.axis(0);
        let span = dom_hi - dom_lo;
        if span <= 0.0 {
            return self.find_discontinuity_base(lo, hi);
        }
        let spread = self.header.spread;
        let norm_lo = (lo - dom_lo) / span;
        let norm_hi = (hi - dom_lo) / span;

        let wrap_candidate =
            crate::spread::next_wrap_boundary(spread, norm_lo, norm_hi).map(|w| dom_lo + w * span);

        let mid = (norm_lo + norm_hi) / 2.0;
        let s = crate::spread::forward(spread, mid, true);
        let step = 1.0 / spread.factor as f64;
        let wrap_lo_norm = s.wrap_count as f64 * step;
        let wrap_hi_norm = wrap_lo_norm + step;
        let inner_lo_norm = norm_lo.max(wrap_lo_norm);
        let inner_hi_norm = norm_hi.min(wrap_hi_norm);

        let sub_candidate = if inner_lo_norm < inner_hi_norm {
            let map = |n: f64| {
                let frac = (n - wrap_lo_norm) / step;
                let w = if s.reflected { 1.0 - frac } else { frac };
                dom_lo + w * span
            };
            let (sub_lo, sub_hi) = (map(inner_lo_norm), map(inner_hi_norm));
            let (sub_lo, sub_hi) = if sub_lo <= sub_hi { (sub_lo, sub_hi) } else { (sub_hi, sub_lo) };
            let base = self.find_discontinuity_base(sub_lo, sub_hi)?;
            if base.order != Order::None {
                let base_norm = (base.at - dom_lo) / span;
                let at = dom_lo
                    + crate::spread::unwrap_discontinuity(spread, s.wrap_count, base_norm, s.reflected) * span;
                Some((at, base.order))
            } else {
                None
            }
        } else {
            None
        };

        match (wrap_candidate, sub_candidate) {
            (Some(w), Some((a, ord))) => {
                if w <= a {
                    Ok(Discontinuity { at: w, order: Order::Value })
                } else {
                    Ok(Discontinuity { at: a, order: ord })
                }
            }
            (Some(w), None) => Ok(Discontinuity { at: w, order: Order::Value }),
            (None, Some((a, ord))) => Ok(Discontinuity { at: a, order: ord }),
            (None, None) => Ok(Discontinuity { at: lo, order: Order::None }),
        }
    }
}

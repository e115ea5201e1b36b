//! Type 2: exponential interpolation, `C0 + t^N * (C1 - C0)`.

use crate::error::{FnResult, FunctionError};
use crate::function::{Discontinuity, Order};
use crate::header::FunctionHeader;
use crate::host::{DictAccessor, DictValue};

/// Unpacked Type 2 state.
#[derive(Debug, Clone)]
pub struct Exponential {
    c0: Vec<f64>,
    c1: Vec<f64>,
    exponent: f64,
}

fn read_coeffs(dict: &dyn DictAccessor, key: &str) -> FnResult<Option<Vec<f64>>> {
    match dict.get(key) {
        None => Ok(None),
        Some(DictValue::Numbers(v)) => Ok(Some(v)),
        Some(DictValue::Number(n)) => Ok(Some(vec![n])),
        Some(_) => Err(FunctionError::type_check(key)),
    }
}

impl Exponential {
    /// Unpack `C0`, `C1`, and `N` from the function dictionary, validating
    /// the `pow` preconditions on `N` vs. `Domain`.
    pub fn unpack(dict: &dyn DictAccessor, header: &FunctionHeader) -> FnResult<Self> {
        let exponent = match dict.require("N")? {
            DictValue::Number(n) => n,
            _ => return Err(FunctionError::type_check("N")),
        };

        // `Range`, when present, fixes the output arity before `C0`/`C1` are
        // read; default coefficient vectors must match it or a later
        // `evaluate` indexes past the end of a length-1 default.
        let target_n = if header.n != 0 { Some(header.n) } else { None };
        let c0 = match read_coeffs(dict, "C0")? {
            Some(v) => v,
            None => vec![0.0; target_n.unwrap_or(1)],
        };
        let c1 = match read_coeffs(dict, "C1")? {
            Some(v) => v,
            None => vec![1.0; target_n.unwrap_or(1)],
        };
        if c0.len() != c1.len() {
            return Err(FunctionError::range_check("C0 and C1 must have the same length"));
        }
        if let Some(n) = target_n {
            if c0.len() != n {
                return Err(FunctionError::range_check("C0/C1 length must match Range arity"));
            }
        }

        let (dom_lo, dom_hi) = header.domain.axis(0);
        let domain_excludes_zero = dom_hi < 0.0 || dom_lo > 0.0;
        if exponent < 0.0 && !domain_excludes_zero {
            return Err(FunctionError::range_check("N < 0 requires Domain to exclude 0"));
        }
        if exponent.fract() != 0.0 && dom_lo < 0.0 {
            return Err(FunctionError::range_check("non-integer N requires Domain >= 0"));
        }

        Ok(Self { c0, c1, exponent })
    }

    /// Output arity, taken from `C0`'s length (always equal to `C1`'s).
    pub fn output_arity(&self) -> usize {
        self.c0.len()
    }

    /// Build a constant (`N=1`, `C0=C1=value`) exponential for use as a
    /// lightweight sub-function stand-in in other modules' tests.
    #[cfg(test)]
    pub(crate) fn unpack_for_test(value: f64) -> Self {
        Self { c0: vec![value], c1: vec![value], exponent: 1.0 }
    }

    /// Build a `C0=0, C1=1, N=1` identity ramp for use in other modules'
    /// tests.
    #[cfg(test)]
    pub(crate) fn unpack_for_test_ramp() -> Self {
        Self { c0: vec![0.0], c1: vec![1.0], exponent: 1.0 }
    }

    /// Evaluate `C0 + t^N * (C1 - C0)` for each output channel.
    pub fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> FnResult<()> {
        let t = inputs[0];
        let t_pow = if self.exponent == 1.0 { t } else { t.powf(self.exponent) };
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = self.c0[i] + t_pow * (self.c1[i] - self.c0[i]);
        }
        Ok(())
    }

    /// Type 2 is analytically smooth on its domain; only a domain-edge
    /// crossing is reported.
    pub fn find_discontinuity(&self, header: &FunctionHeader, bounds: (f64, f64)) -> Discontinuity {
        let (lo, hi) = header.domain.axis(0);
        if lo > bounds.0 && lo < bounds.1 {
            return Discontinuity { at: lo, order: Order::Value };
        }
        if hi > bounds.0 && hi < bounds.1 {
            return Discontinuity { at: hi, order: Order::Value };
        }
        Discontinuity { at: bounds.0, order: Order::None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::AxisBox;

    fn header(domain: [f64; 2]) -> FunctionHeader {
        FunctionHeader {
            m: 1,
            n: 1,
            domain: AxisBox::from_slice(&domain),
            range: Some(AxisBox::from_slice(&[0.0, 1.0])),
            spread: Default::default(),
        }
    }

    #[test]
    fn exponential_ramp() {
        let exp = Exponential { c0: vec![0.0], c1: vec![1.0], exponent: 2.0 };
        let mut out = [0.0];
        exp.evaluate(&[0.5], &mut out).unwrap();
        assert!((out[0] - 0.25).abs() < 1e-12);
        exp.evaluate(&[0.0], &mut out).unwrap();
        assert_eq!(out[0], 0.0);
        exp.evaluate(&[1.0], &mut out).unwrap();
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn no_discontinuity_inside_domain() {
        let exp = Exponential { c0: vec![0.0], c1: vec![1.0], exponent: 2.0 };
        let h = header([0.0, 1.0]);
        let d = exp.find_discontinuity(&h, (0.0, 1.0));
        assert_eq!(d.order, Order::None);
    }
}

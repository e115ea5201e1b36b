//! Type 3: stitching (piecewise composition of sub-functions).

use crate::consts::STITCH_BIAS_EPSILON;
use crate::error::{FnResult, FunctionError};
use crate::function::{Discontinuity, Function, Order, UnpackDepth};
use crate::header::FunctionHeader;
use crate::host::{CalculatorHost, DictAccessor, DictValue};

/// One sub-function's bounds and encode interval within the parent domain.
#[derive(Debug, Clone, Copy)]
struct SubRange {
    lb: f64,
    ub: f64,
    elb: f64,
    eub: f64,
}

/// Unpacked Type 3 state: owned sub-functions plus their bounds/encode.
#[derive(Debug, Clone)]
pub struct Stitching {
    functions: Vec<Function>,
    ranges: Vec<SubRange>,
}

impl Stitching {
    /// Unpack `Functions`, `Bounds`, and `Encode`, recursively unpacking
    /// each sub-function with one less unit of recursion budget, and
    /// verifying all sub-functions share the same output arity.
    pub fn unpack(dict: &dyn DictAccessor, header: &FunctionHeader, depth: UnpackDepth) -> FnResult<Self> {
        let depth = depth.descend()?;

        let sub_dicts = match dict.require("Functions")? {
            DictValue::Dicts(v) => v,
            _ => return Err(FunctionError::type_check("Functions")),
        };
        let k = sub_dicts.len();
        if k == 0 {
            return Err(FunctionError::range_check("Functions must have at least one entry"));
        }

        let bounds = match dict.get("Bounds") {
            None if k == 1 => Vec::new(),
            Some(DictValue::Numbers(v)) => v,
            _ => return Err(FunctionError::type_check("Bounds")),
        };
        if bounds.len() != k - 1 {
            return Err(FunctionError::range_check("Bounds length must be Functions length - 1"));
        }
        let (dom_lo, dom_hi) = header.domain.axis(0);
        if !bounds.windows(2).all(|w| w[0] <= w[1]) {
            return Err(FunctionError::range_check("Bounds must be non-decreasing"));
        }
        if bounds.iter().any(|&b| b < dom_lo || b > dom_hi) {
            return Err(FunctionError::range_check("Bounds must lie within Domain"));
        }

        let encode = match dict.require("Encode")? {
            DictValue::Numbers(v) => v,
            _ => return Err(FunctionError::type_check("Encode")),
        };
        if encode.len() != 2 * k {
            return Err(FunctionError::range_check("Encode length must be 2 * Functions length"));
        }

        let mut lower_bounds = Vec::with_capacity(k);
        lower_bounds.push(dom_lo);
        lower_bounds.extend_from_slice(&bounds);
        let mut upper_bounds = bounds;
        upper_bounds.push(dom_hi);

        let mut functions = Vec::with_capacity(k);
        let mut ranges = Vec::with_capacity(k);
        let mut output_arity = None;
        for (i, sub_dict) in sub_dicts.iter().enumerate() {
            let sub = Function::unpack(sub_dict.as_ref(), depth)?;
            match output_arity {
                None => output_arity = Some(sub.n()),
                Some(n) if n != sub.n() => {
                    return Err(FunctionError::range_check("sub-function output arity mismatch"))
                }
                Some(_) => {}
            }
            ranges.push(SubRange {
                lb: lower_bounds[i],
                ub: upper_bounds[i],
                elb: encode[2 * i],
                eub: encode[2 * i + 1],
            });
            functions.push(sub);
        }

        Ok(Self { functions, ranges })
    }

    /// Output arity, propagated from the (uniform) sub-function arity.
    pub fn output_arity(&self) -> usize {
        self.functions[0].n()
    }

    fn select(&self, biased: f64, upwards: bool) -> usize {
        let last = self.functions.len() - 1;
        if upwards {
            for i in (0..=last).rev() {
                let r = self.ranges[i];
                let hi_inclusive = i == last;
                if biased >= r.lb && (biased < r.ub || (hi_inclusive && biased <= r.ub)) {
                    return i;
                }
            }
            last
        } else {
            for (i, r) in self.ranges.iter().enumerate() {
                let hi_inclusive = i == last;
                if biased >= r.lb && (biased < r.ub || (hi_inclusive && biased <= r.ub)) {
                    return i;
                }
            }
            0
        }
    }

    /// Evaluate: bias for selection, clip, select by direction, remap
    /// through the sub-function's encode interval, and dispatch.
    pub fn evaluate<H: CalculatorHost>(
        &self,
        inputs: &[f64],
        outputs: &mut [f64],
        upwards: bool,
        host: &mut H,
    ) -> FnResult<()> {
        let t = inputs[0];
        let bias = if upwards { STITCH_BIAS_EPSILON } else { -STITCH_BIAS_EPSILON };
        let dom_lo = self.ranges.first().map_or(t, |r| r.lb);
        let dom_hi = self.ranges.last().map_or(t, |r| r.ub);
        let biased = (t + bias * t.abs()).clamp(dom_lo, dom_hi);

        let idx = self.select(biased, upwards);
        let r = self.ranges[idx];

        // `lb == ub` is the documented Adobe quirk: pick the lower encoded
        // bound rather than erroring.
        let (sub_input, sub_upwards) = if r.lb == r.ub {
            (r.elb, upwards)
        } else {
            let frac = (t - r.lb) / (r.ub - r.lb);
            let sub_input = r.elb + frac * (r.eub - r.elb);
            let flipped = if r.eub < r.elb { !upwards } else { upwards };
            (sub_input, flipped)
        };

        self.functions[idx].evaluate(&[sub_input], outputs, sub_upwards, host)
    }

    /// Find-discontinuity: a sub-function boundary strictly inside
    /// `bounds` is a value discontinuity; otherwise recurse into the
    /// containing sub-function via its encode interval.
    pub fn find_discontinuity(&self, header: &FunctionHeader, bounds: (f64, f64)) -> FnResult<Discontinuity> {
        let (lo, hi) = bounds;
        for r in &self.ranges[..self.ranges.len() - 1] {
            if r.ub > lo && r.ub < hi {
                return Ok(Discontinuity { at: r.ub, order: Order::Value });
            }
        }

        let idx = self.select((lo + hi) / 2.0, true);
        let r = self.ranges[idx];
        if r.lb == r.ub {
            let _ = header;
            return Ok(Discontinuity { at: lo, order: Order::None });
        }
        let map = |t: f64| r.elb + (t.clamp(r.lb, r.ub) - r.lb) / (r.ub - r.lb) * (r.eub - r.elb);
        let (sub_lo, sub_hi) = (map(lo.max(r.lb)), map(hi.min(r.ub)));

        let sub_result = self.functions[idx].find_discontinuity((sub_lo, sub_hi))?;
        if sub_result.order != Order::None {
            let inv_frac = if r.eub != r.elb { (sub_result.at - r.elb) / (r.eub - r.elb) } else { 0.0 };
            let at = r.lb + inv_frac * (r.ub - r.lb);
            return Ok(Discontinuity { at, order: sub_result.order });
        }

        if r.lb > lo && r.lb < hi {
            return Ok(Discontinuity { at: r.lb, order: Order::Value });
        }
        if r.ub > lo && r.ub < hi {
            return Ok(Discontinuity { at: r.ub, order: Order::Value });
        }
        Ok(Discontinuity { at: lo, order: Order::None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::AxisBox;
    use crate::types::calculator::stub_host;
    use crate::types::exponential::Exponential;

    fn const_fn(value: f64) -> Function {
        let header = FunctionHeader {
            m: 1,
            n: 1,
            domain: AxisBox::from_slice(&[0.0, 1.0]),
            range: Some(AxisBox::from_slice(&[0.0, 1.0])),
            spread: Default::default(),
        };
        Function {
            header,
            kind: crate::function::FunctionKind::Exponential(Exponential::unpack_for_test(value)),
        }
    }

    fn step_stitch() -> (Stitching, FunctionHeader) {
        let header = FunctionHeader {
            m: 1,
            n: 1,
            domain: AxisBox::from_slice(&[0.0, 1.0]),
            range: Some(AxisBox::from_slice(&[0.0, 1.0])),
            spread: Default::default(),
        };
        let stitch = Stitching {
            functions: vec![const_fn(0.0), const_fn(1.0)],
            ranges: vec![
                SubRange { lb: 0.0, ub: 0.5, elb: 0.0, eub: 1.0 },
                SubRange { lb: 0.5, ub: 1.0, elb: 0.0, eub: 1.0 },
            ],
        };
        (stitch, header)
    }

    #[test]
    fn upward_prefers_function_above_boundary() {
        let (stitch, _h) = step_stitch();
        let mut out = [0.0];
        let mut host = stub_host();
        stitch.evaluate(&[0.5], &mut out, true, &mut host).unwrap();
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn downward_prefers_function_below_boundary() {
        let (stitch, _h) = step_stitch();
        let mut out = [0.0];
        let mut host = stub_host();
        stitch.evaluate(&[0.5], &mut out, false, &mut host).unwrap();
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn discontinuity_at_boundary() {
        let (stitch, header) = step_stitch();
        let d = stitch.find_discontinuity(&header, (0.25, 0.75)).unwrap();
        assert_eq!(d.order, Order::Value);
        assert!((d.at - 0.5).abs() < 1e-9);
    }
}

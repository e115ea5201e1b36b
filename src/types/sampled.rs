//! Type 0: sampled function unpack and evaluate, with specialised
//! interpolation paths for small arities and a general `M -> N` path for
//! everything else, plus the 1-input discontinuity segment table.

use itertools::Itertools;
use tracing::{debug, warn};

use crate::consts::{ALLOWED_BITS_PER_SAMPLE, INTERPOLATION_ORDER_CUBIC, INTERPOLATION_ORDER_LINEAR};
use crate::error::{FnResult, FunctionError};
use crate::function::{Discontinuity, Order};
use crate::header::{AxisBox, FunctionHeader};
use crate::host::{DictAccessor, DictValue};
use crate::types::discontinuity::SegmentTable;
use crate::types::sample_decoder::decode_samples;

/// A linear map `domain/grid-index <-> sample-value/output` pair, used for
/// both `Encode` (input axis -> grid index) and `Decode` (sample value ->
/// output channel).
#[derive(Debug, Clone, Copy)]
struct LinearMap {
    lo: f64,
    hi: f64,
}

impl LinearMap {
    fn apply(&self, t: f64, src_lo: f64, src_hi: f64) -> f64 {
        if src_hi == src_lo {
            return self.lo;
        }
        self.lo + (t - src_lo) / (src_hi - src_lo) * (self.hi - self.lo)
    }
}

/// Unpacked Type 0 state.
#[derive(Debug, Clone)]
pub struct Sampled {
    bits_per_sample: u32,
    size: Vec<usize>,
    strides: Vec<usize>,
    encode: Vec<LinearMap>,
    decode: Vec<LinearMap>,
    grid: Vec<u32>,
    n_channels: usize,
    domain_axes: Vec<(f64, f64)>,
    segments: Option<SegmentTable>,
}

fn read_int_array(dict: &dyn DictAccessor, key: &str) -> FnResult<Option<Vec<i64>>> {
    match dict.get(key) {
        None => Ok(None),
        Some(DictValue::Numbers(v)) => Ok(Some(v.into_iter().map(|n| n as i64).collect())),
        Some(DictValue::Number(n)) => Ok(Some(vec![n as i64])),
        Some(_) => Err(FunctionError::type_check(key)),
    }
}

fn read_number_array(dict: &dyn DictAccessor, key: &str) -> FnResult<Option<Vec<f64>>> {
    match dict.get(key) {
        None => Ok(None),
        Some(DictValue::Numbers(v)) => Ok(Some(v)),
        Some(DictValue::Number(n)) => Ok(Some(vec![n])),
        Some(_) => Err(FunctionError::type_check(key)),
    }
}

fn strides_for(size: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; size.len()];
    for i in 1..size.len() {
        strides[i] = strides[i - 1] * size[i - 1];
    }
    strides
}

impl Sampled {
    /// Unpack `Size`, `BitsPerSample`, `Order`, `Encode`, `Decode`, and the
    /// sample data source, then bulk-decode the sample grid.
    pub fn unpack(dict: &dyn DictAccessor, header: &FunctionHeader) -> FnResult<Self> {
        let size: Vec<usize> = read_int_array(dict, "Size")?
            .ok_or_else(|| FunctionError::type_check("Size"))?
            .into_iter()
            .map(|n| {
                if n < 1 {
                    Err(FunctionError::range_check("Size entries must be >= 1"))
                } else {
                    Ok(n as usize)
                }
            })
            .collect::<FnResult<_>>()?;
        if size.len() != header.m {
            return Err(FunctionError::range_check("Size length must equal input arity"));
        }

        let bits_per_sample = match dict.require("BitsPerSample")? {
            DictValue::Number(n) => n as u32,
            _ => return Err(FunctionError::type_check("BitsPerSample")),
        };
        if !ALLOWED_BITS_PER_SAMPLE.contains(&bits_per_sample) {
            return Err(FunctionError::range_check(format!("BitsPerSample {bits_per_sample} not allowed")));
        }

        let order = match dict.get("Order") {
            None => INTERPOLATION_ORDER_LINEAR,
            Some(DictValue::Number(n)) => n as i32,
            Some(_) => return Err(FunctionError::type_check("Order")),
        };
        if order == INTERPOLATION_ORDER_CUBIC {
            debug!("Type 0 function requested cubic interpolation (Order=3); downgrading to linear");
        } else if order != INTERPOLATION_ORDER_LINEAR {
            return Err(FunctionError::range_check("Order must be 1 or 3"));
        }

        let encode_values = read_number_array(dict, "Encode")?;
        let encode: Vec<LinearMap> = match encode_values {
            Some(v) => {
                if v.len() != 2 * header.m {
                    return Err(FunctionError::range_check("Encode length must be 2*M"));
                }
                (0..header.m).map(|i| LinearMap { lo: v[2 * i], hi: v[2 * i + 1] }).collect()
            }
            None => size.iter().map(|&s| LinearMap { lo: 0.0, hi: (s.max(1) - 1) as f64 }).collect(),
        };

        let range = header
            .range
            .as_ref()
            .ok_or_else(|| FunctionError::type_check("Range"))?;
        let n_channels = range.arity();

        let decode_values = read_number_array(dict, "Decode")?;
        let decode: Vec<LinearMap> = match decode_values {
            Some(v) => {
                if v.len() != 2 * n_channels {
                    return Err(FunctionError::range_check("Decode length must be 2*N"));
                }
                (0..n_channels).map(|i| LinearMap { lo: v[2 * i], hi: v[2 * i + 1] }).collect()
            }
            None => (0..n_channels).map(|i| LinearMap { lo: range.axis(i).0, hi: range.axis(i).1 }).collect(),
        };

        let total_samples: usize = n_channels * size.iter().product::<usize>();
        let grid = match dict.get("DataSource") {
            Some(DictValue::Stream(mut source)) => decode_samples(source.as_mut(), bits_per_sample, total_samples)?,
            Some(_) => return Err(FunctionError::type_check("DataSource")),
            None => return Err(FunctionError::type_check("DataSource")),
        };

        let domain_axes: Vec<(f64, f64)> = (0..header.m).map(|i| header.domain.axis(i)).collect();
        let strides = strides_for(&size);

        let segments = if header.m == 1 {
            Some(crate::types::discontinuity::build(&grid, size[0], n_channels, crate::consts::DEFAULT_LINEARITY_TOLERANCE))
        } else {
            None
        };

        Ok(Self { bits_per_sample, size, strides, encode, decode, grid, n_channels, domain_axes, segments })
    }

    fn decode_value(&self, channel: usize, raw: f64) -> f64 {
        let max = (1u64 << self.bits_per_sample) as f64 - 1.0;
        let normalized = raw / max;
        self.decode[channel].lo + normalized * (self.decode[channel].hi - self.decode[channel].lo)
    }

    /// Map a clipped input axis value to `(integer grid index, fraction)`.
    fn axis_index(&self, axis: usize, t: f64) -> (usize, f64) {
        let (dom_lo, dom_hi) = self.domain_axes[axis];
        let size = self.size[axis];
        if size == 1 {
            return (0, 0.0);
        }
        let encoded = self.encode[axis].apply(t, dom_lo, dom_hi).clamp(0.0, (size - 1) as f64);
        let k = encoded.floor();
        if k as usize >= size - 1 {
            (size - 2, 1.0)
        } else {
            (k as usize, encoded - k)
        }
    }

    fn grid_offset(&self, indices: &[usize]) -> usize {
        indices.iter().zip(&self.strides).map(|(&i, &s)| i * s).sum()
    }

    /// Evaluate via the general `M -> N` interpolation workspace: mark
    /// zero-fraction axes as "skip", visit only the `2^nz` corners that
    /// matter, and reduce by repeated linear interpolation one axis at a
    /// time.
    pub fn evaluate(&self, inputs: &[f64], outputs: &mut [f64]) -> FnResult<()> {
        let m = inputs.len();
        let mut base_index = vec![0usize; m];
        let mut frac = vec![0.0f64; m];
        for axis in 0..m {
            let (k, f) = self.axis_index(axis, inputs[axis]);
            base_index[axis] = k;
            frac[axis] = f;
        }

        let nz_axes: Vec<usize> = (0..m).filter(|&a| frac[a] != 0.0).collect();
        let nz = nz_axes.len();
        let corners = 1usize << nz;

        // Visit the `2^nz` corners via the cartesian product of each nz
        // axis's {0,1} offset, axes taken in reverse so the last nz axis
        // (consumed first below by the stride-halving reduction) varies
        // slowest across the product, matching the reduction's stride order.
        let axes_for_product: Vec<usize> = nz_axes.iter().rev().copied().collect();
        let mut corner_values: Vec<Vec<f64>> = Vec::with_capacity(corners);
        for bits in axes_for_product.iter().map(|_| [0usize, 1usize]).multi_cartesian_product() {
            let mut idx = base_index.clone();
            for (&axis, &b) in axes_for_product.iter().zip(bits.iter()) {
                idx[axis] += b;
            }
            let offset = self.grid_offset(&idx);
            let base = offset * self.n_channels;
            corner_values.push((0..self.n_channels).map(|c| self.grid[base + c] as f64).collect());
        }

        // Reduce pairwise one nz axis per pass, starting from the axis tied
        // to the highest bit (largest stride) down to the lowest.
        let mut stride = corners / 2;
        let mut bit = nz.wrapping_sub(1);
        while stride >= 1 {
            let f = frac[nz_axes[bit]];
            for k in 0..stride {
                for c in 0..self.n_channels {
                    let lo = corner_values[k][c];
                    let hi = corner_values[k + stride][c];
                    corner_values[k][c] = (1.0 - f) * lo + f * hi;
                }
            }
            stride /= 2;
            bit = bit.wrapping_sub(1);
        }

        let result = &corner_values[0];
        for c in 0..self.n_channels {
            outputs[c] = self.decode_value(c, result[c]);
        }
        Ok(())
    }

    /// Find the next discontinuity for a 1-input sampled function using the
    /// precomputed segment table.
    pub fn find_discontinuity(&self, header: &FunctionHeader, bounds: (f64, f64)) -> FnResult<Discontinuity> {
        let (lo, hi) = bounds;
        let Some(segments) = &self.segments else {
            warn!("find_discontinuity called on a Type 0 function with arity != 1");
            return Ok(Discontinuity { at: lo, order: Order::None });
        };
        if segments.all_linear {
            return Ok(Discontinuity { at: lo, order: Order::None });
        }

        let (dom_lo, dom_hi) = header.domain.axis(0);
        if dom_lo > lo && dom_lo < hi {
            return Ok(Discontinuity { at: dom_lo, order: Order::Value });
        }
        if dom_hi > lo && dom_hi < hi {
            return Ok(Discontinuity { at: dom_hi, order: Order::Value });
        }

        let size = self.size[0];
        if size < 2 {
            return Ok(Discontinuity { at: lo, order: Order::None });
        }
        let lo_idx = self.encode[0].apply(lo, dom_lo, dom_hi).clamp(0.0, (size - 1) as f64);
        let hi_idx = self.encode[0].apply(hi, dom_lo, dom_hi).clamp(0.0, (size - 1) as f64);
        let (idx_lo, idx_hi) = if lo_idx <= hi_idx { (lo_idx, hi_idx) } else { (hi_idx, lo_idx) };

        let first = idx_lo.ceil() as usize;
        let last = idx_hi.floor() as usize;
        if first > last {
            return Ok(Discontinuity { at: lo, order: Order::None });
        }
        let mid = first + (last - first) / 2;

        if segments.inside_linear_segment(mid) {
            return Ok(Discontinuity { at: lo, order: Order::None });
        }

        let decoded = self.domain_axes[0].0
            + (mid as f64 / (size - 1) as f64) * (self.domain_axes[0].1 - self.domain_axes[0].0);
        Ok(Discontinuity { at: decoded, order: Order::Derivative })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_1d() -> (Sampled, FunctionHeader) {
        let header = FunctionHeader {
            m: 1,
            n: 1,
            domain: AxisBox::from_slice(&[0.0, 1.0]),
            range: Some(AxisBox::from_slice(&[0.0, 1.0])),
            spread: Default::default(),
        };
        let sampled = Sampled {
            bits_per_sample: 8,
            size: vec![2],
            strides: vec![1],
            encode: vec![LinearMap { lo: 0.0, hi: 1.0 }],
            decode: vec![LinearMap { lo: 0.0, hi: 1.0 }],
            grid: vec![0x00, 0xFF],
            n_channels: 1,
            domain_axes: vec![(0.0, 1.0)],
            segments: Some(crate::types::discontinuity::build(&[0x00, 0xFF], 2, 1, 3.0)),
        };
        (sampled, header)
    }

    #[test]
    fn sampled_identity_quarter_point() {
        let (sampled, _header) = identity_1d();
        let mut out = [0.0];
        sampled.evaluate(&[0.25], &mut out).unwrap();
        assert!((out[0] - 0.25).abs() < 1.0 / 255.0);
    }

    #[test]
    fn sampled_identity_reports_no_discontinuity() {
        let (sampled, header) = identity_1d();
        let d = sampled.find_discontinuity(&header, (0.2, 0.8)).unwrap();
        assert_eq!(d.order, Order::None);
    }

    #[test]
    fn two_by_two_bilinear_average() {
        let header = FunctionHeader {
            m: 2,
            n: 1,
            domain: AxisBox::from_slice(&[0.0, 1.0, 0.0, 1.0]),
            range: Some(AxisBox::from_slice(&[0.0, 1.0])),
            spread: Default::default(),
        };
        let grid = vec![0u32, 85, 170, 255];
        let sampled = Sampled {
            bits_per_sample: 8,
            size: vec![2, 2],
            strides: strides_for(&[2, 2]),
            encode: vec![LinearMap { lo: 0.0, hi: 1.0 }, LinearMap { lo: 0.0, hi: 1.0 }],
            decode: vec![LinearMap { lo: 0.0, hi: 1.0 }],
            grid,
            n_channels: 1,
            domain_axes: vec![(0.0, 1.0), (0.0, 1.0)],
            segments: None,
        };
        let _ = header;
        let mut out = [0.0];
        sampled.evaluate(&[0.5, 0.5], &mut out).unwrap();
        let expected = (0.0 + 85.0 + 170.0 + 255.0) / 4.0 / 255.0;
        assert!((out[0] - expected).abs() < 1e-3);
    }
}

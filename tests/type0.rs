//! Type 0 (sampled) integration tests: bit-packed decode through to
//! evaluate, via the public cache/ops surface.

use std::collections::HashMap;

use pdffn_core::prelude::*;

#[derive(Debug)]
struct FakeDict(HashMap<String, DictValue>);

impl DictAccessor for FakeDict {
    fn get(&self, key: &str) -> Option<DictValue> {
        self.0.get(key).cloned()
    }
}

fn identity_ramp_dict(size: usize, bits: u32) -> FakeDict {
    let max = (1u64 << bits) - 1;
    let bytes: Vec<u8> = if bits == 8 {
        (0..size).map(|i| ((i as u64 * max) / (size as u64 - 1)) as u8).collect()
    } else {
        panic!("only 8-bit fixture supported here")
    };
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(0.0));
    m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("Range".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("Size".into(), DictValue::Numbers(vec![size as f64]));
    m.insert("BitsPerSample".into(), DictValue::Number(bits as f64));
    m.insert("DataSource".into(), DictValue::Stream(Box::new(ByteVec::new(bytes))));
    FakeDict(m)
}

#[derive(Debug)]
struct ByteVec {
    bytes: Vec<u8>,
    pos: usize,
}

impl ByteVec {
    fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl ByteSource for ByteVec {
    fn rewind(&mut self) -> FnResult<()> {
        self.pos = 0;
        Ok(())
    }
    fn read_byte(&mut self) -> FnResult<Option<u8>> {
        let b = self.bytes.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        Ok(b)
    }
    fn set_position(&mut self, offset: u64) -> FnResult<()> {
        self.pos = offset as usize;
        Ok(())
    }
}

#[test]
fn identity_ramp_reconstructs_input() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = identity_ramp_dict(16, 8);
    let data = ValidatorData::default();
    let mut host = StackMachine::new();

    for i in 0..=16 {
        let t = i as f64 / 16.0;
        let mut out = [0.0];
        evaluate(&mut cache, &dict, Usage::Shading, 0, 1, 1, &data, &[t], &mut out, true, &mut host).unwrap();
        assert!((out[0] - t).abs() < 1.0 / 15.0);
    }
}

#[test]
fn boundary_clipping() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = identity_ramp_dict(16, 8);
    let data = ValidatorData::default();
    let mut host = StackMachine::new();

    let mut below = [0.0];
    evaluate(&mut cache, &dict, Usage::Shading, 0, 1, 1, &data, &[-5.0], &mut below, true, &mut host).unwrap();
    assert!((below[0] - 0.0).abs() < 1e-6);

    let mut above = [0.0];
    evaluate(&mut cache, &dict, Usage::Shading, 0, 1, 1, &data, &[5.0], &mut above, true, &mut host).unwrap();
    assert!((above[0] - 1.0).abs() < 1e-6);
}

#[test]
fn bad_bits_per_sample_is_range_check() {
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(0.0));
    m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("Range".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("Size".into(), DictValue::Numbers(vec![2.0]));
    m.insert("BitsPerSample".into(), DictValue::Number(7.0));
    m.insert("DataSource".into(), DictValue::Stream(Box::new(ByteVec::new(vec![0, 0]))));
    let dict = FakeDict(m);

    let mut cache = FunctionCache::new(CacheConfig::default());
    let data = ValidatorData::default();
    let err = get_info(&mut cache, &dict, Usage::Shading, 0, 1, 1, &data).unwrap_err();
    assert!(matches!(err, FunctionError::RangeCheck(_)));
}

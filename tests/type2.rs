//! Type 2 (exponential) integration tests, driven through the public
//! `ops`/`cache` surface rather than the internal `Exponential` type.

use std::collections::HashMap;

use pdffn_core::prelude::*;
use quickcheck_macros::quickcheck;

#[derive(Debug)]
struct FakeDict(HashMap<String, DictValue>);

impl DictAccessor for FakeDict {
    fn get(&self, key: &str) -> Option<DictValue> {
        self.0.get(key).cloned()
    }
}

fn exponential(c0: f64, c1: f64, n: f64, domain: [f64; 2]) -> FakeDict {
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(2.0));
    m.insert("Domain".into(), DictValue::Numbers(domain.to_vec()));
    m.insert("C0".into(), DictValue::Numbers(vec![c0]));
    m.insert("C1".into(), DictValue::Numbers(vec![c1]));
    m.insert("N".into(), DictValue::Number(n));
    FakeDict(m)
}

#[test]
fn identity_on_unit_interval() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = exponential(0.0, 1.0, 1.0, [0.0, 1.0]);
    let data = ValidatorData::default();
    let mut host = StackMachine::new();

    for t in [0.0, 0.25, 0.5, 0.75, 1.0] {
        let mut out = [0.0];
        evaluate(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data, &[t], &mut out, true, &mut host).unwrap();
        assert!((out[0] - t).abs() < 1e-12);
    }
}

#[test]
fn negative_exponent_requires_domain_excluding_zero() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = exponential(1.0, 2.0, -1.0, [0.0, 1.0]);
    let data = ValidatorData::default();
    let err = get_info(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data).unwrap_err();
    assert!(matches!(err, FunctionError::RangeCheck(_)));
}

#[test]
fn negative_exponent_accepted_when_domain_excludes_zero() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = exponential(1.0, 2.0, -1.0, [1.0, 2.0]);
    let data = ValidatorData::default();
    let info = get_info(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data).unwrap();
    assert_eq!(info, FunctionInfo { m: 1, n: 1 });
}

#[quickcheck]
fn ramp_clips_to_range(t: f64) -> bool {
    if !t.is_finite() {
        return true;
    }
    let mut cache = FunctionCache::new(CacheConfig::default());
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(2.0));
    m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("Range".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("C0".into(), DictValue::Numbers(vec![0.0]));
    m.insert("C1".into(), DictValue::Numbers(vec![1.0]));
    m.insert("N".into(), DictValue::Number(1.0));
    let dict = FakeDict(m);
    let data = ValidatorData::default();
    let mut host = StackMachine::new();
    let mut out = [0.0];
    if evaluate(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data, &[t], &mut out, true, &mut host).is_err() {
        return true;
    }
    (0.0..=1.0).contains(&out[0])
}

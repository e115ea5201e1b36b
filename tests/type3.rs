//! Type 3 (stitching) integration tests: boundary bias direction and
//! whole-domain identity composition.

use std::collections::HashMap;

use pdffn_core::prelude::*;

#[derive(Debug, Clone)]
struct FakeDict(HashMap<String, DictValue>);

impl DictAccessor for FakeDict {
    fn get(&self, key: &str) -> Option<DictValue> {
        self.0.get(key).cloned()
    }
}

fn constant_sub(value: f64) -> Box<dyn DictAccessor> {
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(2.0));
    m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("C0".into(), DictValue::Numbers(vec![value]));
    m.insert("C1".into(), DictValue::Numbers(vec![value]));
    m.insert("N".into(), DictValue::Number(1.0));
    Box::new(FakeDict(m))
}

fn identity_sub() -> Box<dyn DictAccessor> {
    ramp_sub(0.0, 1.0)
}

/// A Type 2 sub-function that, given an input in `[0,1]`, linearly ramps
/// across `[lb, ub]` — the shape a Type 3 piece needs so that composing it
/// with an `Encode` interval of `[0,1]` reconstructs the identity on
/// `[lb, ub]`.
fn ramp_sub(lb: f64, ub: f64) -> Box<dyn DictAccessor> {
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(2.0));
    m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("C0".into(), DictValue::Numbers(vec![lb]));
    m.insert("C1".into(), DictValue::Numbers(vec![ub]));
    m.insert("N".into(), DictValue::Number(1.0));
    Box::new(FakeDict(m))
}

fn two_piece_step_stitch() -> FakeDict {
    let mut m = HashMap::new();
    m.insert("FunctionType".into(), DictValue::Number(3.0));
    m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    m.insert("Bounds".into(), DictValue::Numbers(vec![0.5]));
    m.insert("Encode".into(), DictValue::Numbers(vec![0.0, 1.0, 0.0, 1.0]));
    m.insert("Functions".into(), DictValue::Dicts(vec![constant_sub(0.0), constant_sub(1.0)]));
    FakeDict(m)
}

#[test]
fn upward_bias_selects_upper_sub_function_at_boundary() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = two_piece_step_stitch();
    let data = ValidatorData::default();
    let mut host = StackMachine::new();
    let mut out = [0.0];
    evaluate(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data, &[0.5], &mut out, true, &mut host).unwrap();
    assert_eq!(out[0], 1.0);
}

#[test]
fn downward_bias_selects_lower_sub_function_at_boundary() {
    let mut cache = FunctionCache::new(CacheConfig::default());
    let dict = two_piece_step_stitch();
    let data = ValidatorData::default();
    let mut host = StackMachine::new();
    let mut out = [0.0];
    evaluate(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data, &[0.5], &mut out, false, &mut host).unwrap();
    assert_eq!(out[0], 0.0);
}

#[test]
fn stitching_identity_sub_functions_reconstruct_whole_domain_identity() {
    // Three identity ramps over [0,1/3], [1/3,2/3], [2/3,1], each encoded
    // back onto [0,1], compose to the identity on the whole domain.
    let mut top = HashMap::new();
    top.insert("FunctionType".into(), DictValue::Number(3.0));
    top.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
    top.insert("Bounds".into(), DictValue::Numbers(vec![1.0 / 3.0, 2.0 / 3.0]));
    top.insert("Encode".into(), DictValue::Numbers(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]));
    top.insert(
        "Functions".into(),
        DictValue::Dicts(vec![ramp_sub(0.0, 1.0 / 3.0), ramp_sub(1.0 / 3.0, 2.0 / 3.0), ramp_sub(2.0 / 3.0, 1.0)]),
    );
    let dict = FakeDict(top);

    let mut cache = FunctionCache::new(CacheConfig::default());
    let data = ValidatorData::default();
    let mut host = StackMachine::new();
    for i in 0..=12 {
        let t = i as f64 / 12.0;
        let mut out = [0.0];
        evaluate(&mut cache, &dict, Usage::Tint, 0, 1, 1, &data, &[t], &mut out, true, &mut host).unwrap();
        assert!((out[0] - t).abs() < 1e-9, "t={t} got={}", out[0]);
    }
}

#[test]
fn recursion_depth_limit_is_enforced() {
    // Build a chain of 34 nested Type 3 single-sub-function dictionaries;
    // the recursion budget starts at 32 so this must fail.
    fn wrap(inner: Box<dyn DictAccessor>) -> Box<dyn DictAccessor> {
        let mut m = HashMap::new();
        m.insert("FunctionType".into(), DictValue::Number(3.0));
        m.insert("Domain".into(), DictValue::Numbers(vec![0.0, 1.0]));
        m.insert("Encode".into(), DictValue::Numbers(vec![0.0, 1.0]));
        m.insert("Functions".into(), DictValue::Dicts(vec![inner]));
        Box::new(FakeDict(m))
    }
    let mut d = identity_sub();
    for _ in 0..34 {
        d = wrap(d);
    }
    let mut cache = FunctionCache::new(CacheConfig::default());
    let data = ValidatorData::default();
    let err = get_info(&mut cache, d.as_ref(), Usage::Tint, 0, 1, 1, &data).unwrap_err();
    assert!(matches!(err, FunctionError::UndefinedResult(_)));
}

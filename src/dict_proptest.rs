#![cfg(test)]

// Property tests for Dict: random byte and string keys against a std
// HashMap model, with the table checked after every operation.

use crate::dict::{Dict, LOAD_FACTOR};
use crate::hash::{is_prime, HashFn};
use crate::Str;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

static VALUES: [i32; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, Option<usize>),
    SetStr(usize, Option<usize>),
    Get(usize),
    Contains(String),
    Iterate,
    Resize,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), proptest::option::of(0..VALUES.len())).prop_map(|(i, v)| OpI::Set(i, v)),
            2 => (idx.clone(), proptest::option::of(0..VALUES.len())).prop_map(|(i, v)| OpI::SetStr(i, v)),
            2 => idx.prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Resize),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn zero_hash(_: &[u8]) -> u64 {
    0
}

fn value(v: Option<usize>) -> Option<&'static i32> {
    v.map(|i| &VALUES[i])
}

fn with_nul(s: &str) -> Vec<u8> {
    let mut k = s.as_bytes().to_vec();
    k.push(0);
    k
}

fn run_scenario(
    pool: &[String],
    ops: Vec<OpI>,
    hash_fn: Option<HashFn>,
) -> Result<(), TestCaseError> {
    let mut sut: Dict<i32> = Dict::with_fns_in(0, &crate::alloc::Heap, hash_fn, None)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    let mut model: HashMap<Vec<u8>, Option<usize>> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = pool[i].as_bytes().to_vec();
                prop_assert!(sut.set(&k, value(v)).is_ok());
                model.insert(k, v);
            }
            OpI::SetStr(i, v) => {
                let s = Str::from_bytes(pool[i].as_bytes()).expect("heap string");
                prop_assert!(sut.set_str(&s, value(v)).is_ok());
                model.insert(with_nul(&pool[i]), v);
            }
            OpI::Get(i) => {
                for k in [pool[i].as_bytes().to_vec(), with_nul(&pool[i])] {
                    prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
                    prop_assert_eq!(sut.get(&k), model.get(&k).copied().flatten().map(|v| &VALUES[v]));
                }
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_bytes()), model.contains_key(s.as_bytes()));
            }
            OpI::Iterate => {
                let m_keys: BTreeSet<Vec<u8>> = model.keys().cloned().collect();

                let mut stateless = Vec::new();
                let mut key = sut.next_key(None);
                while let Some(k) = key {
                    stateless.push(k.to_vec());
                    key = sut.next_key(Some(k));
                }
                prop_assert_eq!(stateless.len(), model.len(), "each key visited once");
                let s_keys: BTreeSet<Vec<u8>> = stateless.iter().cloned().collect();
                prop_assert_eq!(&s_keys, &m_keys);

                let cursor: Vec<Vec<u8>> = sut.keys().map(<[u8]>::to_vec).collect();
                prop_assert_eq!(&cursor, &stateless, "cursor order matches stateless order");
            }
            OpI::Resize => {
                prop_assert!(sut.resize().is_ok());
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(is_prime(sut.bucket_count() as u64));
        prop_assert!(sut.len() * LOAD_FACTOR < sut.bucket_count());
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `get`/`contains_key` parity with the model, including keys mapped to no value.
// - Overwrites keep `len`; new keys grow it by exactly one.
// - Byte keys and string keys (NUL included) live side by side.
// - Stateless iteration and the cursor iterator agree and visit each key once.
// - `bucket_count` stays prime and above `len * LOAD_FACTOR`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, None)?;
    }
}

// Property: Same state-machine invariants under worst-case collisions (every
// key hashes to 0), so every lookup walks one long chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(&pool, ops, Some(zero_hash))?;
    }
}

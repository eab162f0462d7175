#![no_main]

use hll_cardinality::Estimator;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut estimator) = serde_json::from_slice::<Estimator>(data) {
        estimator.insert(&1);
        let serialized = serde_json::to_vec(&estimator).unwrap();
        let restored: Estimator = serde_json::from_slice(&serialized).unwrap();
        assert_eq!(restored.estimate(), estimator.estimate());
    }
});

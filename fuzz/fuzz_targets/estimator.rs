#![no_main]

use hll_cardinality::Estimator;
use libfuzzer_sys::fuzz_target;
use wyhash::{wyhash, WyHash};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // first byte selects accuracy, the rest is split into two streams
    let index_bits = 4 + data[0] % 13;
    let data = &data[1..];
    let split_index = wyhash(data, 0) as usize % data.len();
    let (first_half, second_half) = data.split_at(split_index);

    let mut estimator1 = Estimator::<WyHash>::new(index_bits).unwrap();
    for chunk in first_half.chunks(4) {
        estimator1.insert(chunk);
        assert!(estimator1.estimate() > 0);
        assert!(estimator1.size_of() > 0);
    }

    let mut estimator2 = Estimator::<WyHash>::new(index_bits).unwrap();
    for chunk in second_half.chunks(4) {
        estimator2.insert(chunk);
        assert!(estimator2.estimate() > 0);
        assert!(estimator2.size_of() > 0);
    }

    let merged = Estimator::merged(&estimator2, &estimator1).unwrap();
    estimator1.merge(&estimator2).unwrap();
    assert_eq!(estimator1, merged);

    let restored = Estimator::<WyHash>::from_snapshot(estimator1.snapshot()).unwrap();
    assert_eq!(restored.estimate(), estimator1.estimate());
});

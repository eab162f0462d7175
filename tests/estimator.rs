use hll_cardinality::{Config, Error, Estimator, Representation, DIRECT_COUNTER_MAX_ELEMENTS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;
use tracing_subscriber::EnvFilter;
use wyhash::WyHash;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn relative_error(estimate: usize, n: usize) -> f64 {
    (estimate as f64 - n as f64).abs() / n as f64
}

#[test_case(4)]
#[test_case(12)]
#[test_case(14)]
#[test_case(16)]
fn test_million_random_hashes(index_bits: u8) {
    init_tracing();
    let n = 1_000_000;
    let mut rng = StdRng::seed_from_u64(u64::from(index_bits));
    let mut estimator = Estimator::<WyHash>::new(index_bits).unwrap();
    for _ in 0..n {
        estimator.insert_hash(rng.gen());
    }

    assert_eq!(estimator.representation(), Representation::Dense);
    assert!(!estimator.is_exact());
    let max_error = 5.0 * estimator.config().standard_error();
    let error = relative_error(estimator.estimate(), n);
    assert!(error <= max_error, "error {} > {}", error, max_error);
}

#[test]
fn test_merge_sixty_estimators() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(60);
    let mut single = Estimator::<WyHash>::new(14).unwrap();
    let mut merged = Estimator::<WyHash>::new(14).unwrap();
    for _ in 0..60 {
        let mut part = Estimator::<WyHash>::new(14).unwrap();
        for _ in 0..10_000 {
            let hash = rng.gen();
            part.insert_hash(hash);
            single.insert_hash(hash);
        }
        merged.merge(&part).unwrap();
    }

    assert_eq!(merged.estimate(), single.estimate());
    assert_eq!(merged, single);
    let error = relative_error(merged.estimate(), 600_000);
    assert!(error <= 5.0 * merged.config().standard_error());
}

#[test]
fn test_merge_small_sets_is_exact() {
    let mut lhs = Estimator::<WyHash>::new(14).unwrap();
    let mut rhs = Estimator::<WyHash>::new(14).unwrap();
    for i in 0..60u32 {
        lhs.insert(&i);
    }
    for i in 40..99u32 {
        rhs.insert(&i);
    }

    let merged = Estimator::merged(&lhs, &rhs).unwrap();
    assert!(merged.is_exact());
    assert_eq!(merged.estimate(), 99);
    assert_eq!(lhs.estimate(), 60);
    assert_eq!(rhs.estimate(), 59);
}

#[test]
fn test_exact_up_to_direct_counter_capacity() {
    let mut estimator = Estimator::<WyHash>::default();
    for i in 0..DIRECT_COUNTER_MAX_ELEMENTS {
        estimator.insert(&format!("user-{}", i));
        assert_eq!(estimator.estimate(), i + 1);
    }
    estimator.insert("one more");
    assert!(!estimator.is_exact());
}

#[test]
fn test_merge_different_accuracy_fails() {
    let mut lhs = Estimator::<WyHash>::with_standard_error(0.01625).unwrap();
    let rhs = Estimator::<WyHash>::with_standard_error(0.008125).unwrap();
    assert_eq!(lhs.config().index_bits(), 12);
    assert_eq!(rhs.config().index_bits(), 14);
    assert!(matches!(
        lhs.merge(&rhs),
        Err(Error::IncompatibleConfiguration { .. })
    ));
}

#[test]
fn test_snapshot_restores_estimate() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut estimator = Estimator::<WyHash>::with_config(Config::new(10).unwrap());
    for _ in 0..5_000 {
        estimator.insert_hash(rng.gen());
    }
    let restored = Estimator::<WyHash>::from_snapshot(estimator.snapshot()).unwrap();
    assert_eq!(restored.estimate(), estimator.estimate());
}

#[test]
fn test_unsupported_accuracy() {
    assert_eq!(
        Estimator::<WyHash>::new(17).err(),
        Some(Error::UnsupportedAccuracy(17))
    );
    assert_eq!(
        Estimator::<WyHash>::new(3).err(),
        Some(Error::UnsupportedAccuracy(3))
    );
}

#[test]
fn test_estimator_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Estimator<WyHash>>();
}

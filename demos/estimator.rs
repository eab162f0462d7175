use hll_cardinality::{Estimator, Result};
use tracing_subscriber::EnvFilter;
use wyhash::WyHash;

fn main() -> Result<()> {
    // RUST_LOG=hll_cardinality=debug shows representation changes
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut estimator1 = Estimator::<WyHash>::new(14)?;
    for i in 0..10 {
        estimator1.insert(&i);
    }
    println!("estimator1 estimate = {}", estimator1.estimate());

    let mut estimator2 = Estimator::<WyHash>::new(14)?;
    for i in 10..15 {
        estimator2.insert(&i);
    }
    println!("estimator2 estimate = {}", estimator2.estimate());

    estimator1.merge(&estimator2)?;
    println!("merged estimate = {}", estimator1.estimate());

    let mut large = Estimator::<WyHash>::with_standard_error(0.01)?;
    for i in 0..1_000_000 {
        large.insert(&i);
    }
    println!(
        "large estimate = {} ({:?}, index bits = {})",
        large.estimate(),
        large.representation(),
        large.config().index_bits()
    );

    Ok(())
}

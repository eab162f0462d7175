//! # Serde module for Estimator
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `Estimator`. It uses `serde`'s custom serialization and deserialization mechanisms.
//!
//! During serialization the estimator state is written as a tuple of ten elements, in the same
//! order as the fields of `Snapshot`:
//! `(index_bits, hash_bits, m, alpha_m, linear_counting_threshold, Option<dense>,
//! Option<sparse>, sparse_max_elements, is_sparse, Option<direct>)`.
//!
//! During deserialization the tuple is validated and converted back into an `Estimator`, so that
//! inconsistent input (for example both or neither register forms present) is rejected.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hasher;

use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::estimator::Estimator;
use crate::snapshot::Snapshot;

type SnapshotTuple = (
    u8,
    u8,
    usize,
    f64,
    u32,
    Option<Vec<u8>>,
    Option<BTreeMap<u16, u8>>,
    usize,
    bool,
    Option<BTreeSet<u64>>,
);

impl<H: Hasher + Default> Serialize for Estimator<H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let snapshot = self.snapshot();

        let mut tup = serializer.serialize_tuple(10)?;
        tup.serialize_element(&snapshot.index_bits)?;
        tup.serialize_element(&snapshot.hash_bits)?;
        tup.serialize_element(&snapshot.m)?;
        tup.serialize_element(&snapshot.alpha_m)?;
        tup.serialize_element(&snapshot.linear_counting_threshold)?;
        // exactly one of the two register forms is `Some`
        tup.serialize_element(&snapshot.dense)?;
        tup.serialize_element(&snapshot.sparse)?;
        tup.serialize_element(&snapshot.sparse_max_elements)?;
        tup.serialize_element(&snapshot.is_sparse)?;
        tup.serialize_element(&snapshot.direct)?;
        tup.end()
    }
}

impl<'de, H: Hasher + Default> Deserialize<'de> for Estimator<H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (
            index_bits,
            hash_bits,
            m,
            alpha_m,
            linear_counting_threshold,
            dense,
            sparse,
            sparse_max_elements,
            is_sparse,
            direct,
        ): SnapshotTuple = Deserialize::deserialize(deserializer)?;

        Estimator::from_snapshot(Snapshot {
            index_bits,
            hash_bits,
            m,
            alpha_m,
            linear_counting_threshold,
            dense,
            sparse,
            sparse_max_elements,
            is_sparse,
            direct,
        })
        .map_err(Error::custom)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::representation::Representation;
    use test_case::test_case;

    #[test_case(0; "empty set")]
    #[test_case(1; "single element")]
    #[test_case(2; "two distinct elements")]
    #[test_case(100; "hundred distinct elements")]
    #[test_case(10000; "ten thousand distinct elements")]
    fn test_serde(n: usize) {
        let mut original_estimator = Estimator::<wyhash::WyHash>::default();

        for i in 0..n {
            let item = &format!("item{}", i);
            original_estimator.insert(item);
        }

        let serialized = serde_json::to_string(&original_estimator).expect("serialization failed");
        assert!(
            !serialized.is_empty(),
            "serialized string should not be empty"
        );

        let deserialized_estimator: Estimator =
            serde_json::from_str(&serialized).expect("deserialization failed");

        assert_eq!(
            original_estimator.representation(),
            deserialized_estimator.representation()
        );
        assert_eq!(original_estimator.estimate(), deserialized_estimator.estimate());
        assert_eq!(original_estimator, deserialized_estimator);
    }

    #[test]
    fn test_serialized_layout() {
        let mut e = Estimator::<wyhash::WyHash>::new(8).unwrap();
        e.insert_hash(0x0100_0000_0000_0001);
        let serialized = serde_json::to_string(&e).unwrap();
        assert!(serialized.starts_with("[8,56,256,"), "{}", serialized);
        assert!(
            serialized.ends_with(",null,{\"1\":56},7,true,[72057594037927937]]"),
            "{}",
            serialized
        );
    }

    #[test]
    fn test_snapshot_serde() {
        let mut e = Estimator::<wyhash::WyHash>::new(10).unwrap();
        (0..500).for_each(|i| e.insert(&i));
        let serialized = serde_json::to_string(&e.snapshot()).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&serialized).unwrap();
        let restored = Estimator::<wyhash::WyHash>::from_snapshot(snapshot).unwrap();
        assert_eq!(restored.representation(), Representation::Dense);
        assert_eq!(restored.estimate(), e.estimate());
    }

    #[test]
    fn test_deserialize_invalid_json() {
        let invalid_json = "{ invalid_json_string }";
        let result: Result<Estimator, _> = serde_json::from_str(invalid_json);

        assert!(
            result.is_err(),
            "Deserialization should fail for invalid JSON"
        );
    }

    #[test_case("[12345,null]".as_bytes(); "too short tuple")]
    #[test_case("[4,60,16,0.673,10,[0,0],null,0,false,null]".as_bytes(); "wrong dense length")]
    #[test_case("[4,60,16,0.673,10,null,null,0,false,null]".as_bytes(); "no registers")]
    #[test_case("[20,44,1048576,0.7,10,null,{},0,true,null]".as_bytes(); "unsupported index bits")]
    #[test_case(&[91, 49, 55, 44, 13, 10, 91, 13, 93, 93]; "case 2")]
    #[test_case(&[91, 51, 44, 10, 110, 117, 108, 108, 93, 122]; "case 3")]
    #[test_case(&[91, 51, 44, 10, 110, 117, 108, 108, 93]; "case 4")]
    fn test_failed_deserialization(input: &[u8]) {
        let result: Result<Estimator, _> = serde_json::from_slice(input);
        assert!(result.is_err());
    }
}

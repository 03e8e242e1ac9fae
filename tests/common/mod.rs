//! Common test utilities for integration tests.
#![allow(dead_code)]

use widecol::{
    AtomicCell, ClusteringKey, ColumnKind, DataType, GcTimePoint, MutationPartition, Schema,
    SchemaBuilder, SchemaRef, Timestamp, Tombstone, Value,
};

/// Read time used by every observation.
pub const NOW: GcTimePoint = GcTimePoint::from_secs(1_000);

/// `(pk utf8 | a utf8, b int32 | s utf8 static | v0, v1 utf8)`.
pub fn two_component_schema() -> SchemaRef {
    SchemaBuilder::new("ks", "events")
        .with_column("pk", DataType::Utf8, ColumnKind::PartitionKey)
        .with_column("a", DataType::Utf8, ColumnKind::ClusteringKey)
        .with_column("b", DataType::Int32, ColumnKind::ClusteringKey)
        .with_column("s", DataType::Utf8, ColumnKind::Static)
        .with_column("v0", DataType::Utf8, ColumnKind::Regular)
        .with_column("v1", DataType::Utf8, ColumnKind::Regular)
        .build()
        .expect("schema builder configuration should succeed")
}

/// Serialized clustering key `(a, b)`.
pub fn ck(schema: &Schema, a: &str, b: i32) -> ClusteringKey {
    schema
        .clustering_key(&[Value::from(a), Value::from(b)])
        .expect("clustering key")
}

/// Tombstone at `ts` with an epoch expiry.
pub fn tomb(ts: i64) -> Tombstone {
    Tombstone::new(Timestamp::new(ts), GcTimePoint::EPOCH)
}

const FIRSTS: [&str; 2] = ["a", "b"];
const SECONDS: [i32; 2] = [1, 2];
const VALUES: [&str; 3] = ["x", "y", "z"];

/// Every clustering key the random generator can touch.
pub fn universe(schema: &Schema) -> Vec<ClusteringKey> {
    FIRSTS
        .iter()
        .flat_map(|a| SECONDS.iter().map(move |b| (*a, *b)))
        .map(|(a, b)| ck(schema, a, b))
        .collect()
}

fn random_cell(rng: &mut fastrand::Rng) -> AtomicCell {
    let ts = Timestamp::new(rng.i64(1..=20));
    if rng.u8(0..4) == 0 {
        AtomicCell::dead(ts, GcTimePoint::from_secs(rng.i64(0..3)))
    } else {
        let expiry = (rng.u8(0..4) == 0).then(|| GcTimePoint::from_secs(rng.i64(990..1_010)));
        AtomicCell::live(ts, expiry, VALUES[rng.usize(0..VALUES.len())])
    }
}

fn random_tomb(rng: &mut fastrand::Rng) -> Tombstone {
    Tombstone::new(
        Timestamp::new(rng.i64(1..=20)),
        GcTimePoint::from_secs(rng.i64(0..3)),
    )
}

/// A partition with a random mix of cells, row, range and partition deletes.
pub fn random_partition(schema: &Schema, rng: &mut fastrand::Rng) -> MutationPartition {
    let mut p = MutationPartition::new(schema);
    for _ in 0..rng.usize(0..8) {
        let a = FIRSTS[rng.usize(0..FIRSTS.len())];
        let b = SECONDS[rng.usize(0..SECONDS.len())];
        match rng.u8(0..10) {
            0 => p.apply_tombstone(random_tomb(rng)),
            1 => p
                .apply_delete(schema, &[Value::from(a)], random_tomb(rng))
                .expect("range delete"),
            2 => p
                .apply_delete(schema, &[Value::from(a), Value::from(b)], random_tomb(rng))
                .expect("row delete"),
            3 => p.static_row_mut().set_cell(0, random_cell(rng)),
            _ => p
                .clustered_row(ck(schema, a, b))
                .set_cell(rng.u32(0..2), random_cell(rng)),
        }
    }
    p
}

/// Everything a reader can observe about a partition.
pub fn observe(schema: &Schema, p: &MutationPartition) -> Vec<String> {
    let mut out = vec![format!(
        "static={:?}",
        p.static_live_cell(0, NOW).map(|c| c.value.clone())
    )];
    for key in universe(schema) {
        out.push(format!(
            "tombstone={} v0={:?} v1={:?}",
            p.tombstone_for_row(schema, &key),
            p.live_cell(schema, &key, 0, NOW).map(|c| c.value.clone()),
            p.live_cell(schema, &key, 1, NOW).map(|c| c.value.clone()),
        ));
    }
    out
}

/// `left` merged with `right`, leaving both untouched.
pub fn merged(schema: &Schema, left: &MutationPartition, right: &MutationPartition) -> MutationPartition {
    let mut out = left.clone();
    out.apply(schema, right);
    out
}


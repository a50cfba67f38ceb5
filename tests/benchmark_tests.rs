//! Performance benchmarks for roster operations

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use roster::{
    ClientId, ClientIdentity, ClientRoster, ControlQueue, EndpointList, LocalConfig, NoUnits,
    RosterSnapshot,
};
use std::time::Instant;

fn roster() -> ClientRoster {
    ClientRoster::new(LocalConfig::default(), NoUnits, ControlQueue::new())
}

fn identity(id: ClientId) -> ClientIdentity {
    ClientIdentity::new(id, &format!("Client{}", id), "")
}

/// Benchmarks ordered insertion in random order
#[test]
fn benchmark_random_insertion() {
    let mut ids: Vec<ClientId> = (0..2_000).collect();
    ids.shuffle(&mut thread_rng());

    let mut roster = roster();
    let start = Instant::now();

    for &id in &ids {
        roster.insert(identity(id)).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Random insertion: {} clients in {:?} ({:.2} μs/insert)",
        ids.len(),
        duration,
        duration.as_micros() as f64 / ids.len() as f64
    );

    let sorted = roster.ids();
    assert_eq!(sorted.len(), ids.len());
    assert!(sorted.windows(2).all(|w| w[0] < w[1]));

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks duplicate rejection on a full roster
#[test]
fn benchmark_duplicate_rejection() {
    let mut roster = roster();
    for id in 0..500 {
        roster.insert(identity(id)).unwrap();
    }

    let mut rng = thread_rng();
    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let id = rng.gen_range(0..500);
        assert!(roster.insert(identity(id)).is_err());
    }

    let duration = start.elapsed();
    println!(
        "Duplicate rejection: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(roster.count(), 500);
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks reconciliation against shifting snapshots
#[test]
fn benchmark_reconciliation() {
    let mut rng = thread_rng();
    let mut roster = roster();
    roster.insert_local(0, true, false).unwrap();
    roster.attach_network(EndpointList::new());

    let iterations = 200;
    let start = Instant::now();

    for _ in 0..iterations {
        // Random membership, always including the local client
        let mut ids: Vec<ClientId> = (1..200).filter(|_| rng.gen_bool(0.5)).collect();
        ids.push(0);
        ids.shuffle(&mut rng);

        let snapshot = RosterSnapshot::new(ids.iter().map(|&id| identity(id)).collect());
        roster.reconcile_with(&snapshot);

        let mut expected = ids.clone();
        expected.sort_unstable();
        assert_eq!(roster.ids(), expected);
        assert_eq!(roster.network().unwrap().len(), expected.len());
    }

    let duration = start.elapsed();
    println!(
        "Reconciliation: {} snapshots in {:?} ({:.2} μs/snapshot)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks snapshot encoding for the wire and for storage
#[test]
fn benchmark_snapshot_encoding() {
    let mut roster = roster();
    for id in 0..64 {
        roster.insert(identity(id)).unwrap();
    }
    let snapshot = roster.save();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = snapshot.to_bytes().unwrap();
        let decoded = RosterSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.len(), 64);
    }

    let binary = start.elapsed();
    let start = Instant::now();

    for _ in 0..iterations / 10 {
        let json = snapshot.to_json().unwrap();
        let decoded = RosterSnapshot::from_json(&json).unwrap();
        assert_eq!(decoded.len(), 64);
    }

    let json = start.elapsed();
    println!(
        "Snapshot encoding: binary {:?} for {} rounds, json {:?} for {} rounds",
        binary,
        iterations,
        json,
        iterations / 10
    );

    assert!(binary.as_millis() < 2000);
    assert!(json.as_millis() < 2000);
}

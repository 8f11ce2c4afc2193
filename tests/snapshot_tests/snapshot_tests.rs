//! Snapshot Tests
//!
//! Tests verify:
//! - One record per device, in index order
//! - Segment lines for the whole chain, block lines for the last segment
//! - Restarting from a device index
//! - Interrupted visits stop the walk and can be resumed
//! - The bounded legacy report

use std::thread;
use std::time::Duration;

use crossbeam::channel;
use scull::snapshot::{self, Snapshot};
use scull::{AccessMode, CancelToken, Config, Engine, ScullError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine {
    let config = Config::builder().nr_devs(3).quantum(4).qset(2).build();
    Engine::open(config).unwrap()
}

fn fill(engine: &Engine, index: usize, offset: u64, data: &[u8]) {
    let handle = engine.open_device(index, AccessMode::ReadWrite).unwrap();
    let mut cursor = offset;
    let mut done = 0;
    while done < data.len() {
        done += handle.write(&data[done..], data.len() - done, &mut cursor).unwrap();
    }
}

// =============================================================================
// Record Tests
// =============================================================================

#[test]
fn test_one_record_per_device_in_order() {
    let engine = setup_engine();
    let reports: Vec<_> = engine.snapshot().map(|r| r.unwrap()).collect();

    assert_eq!(reports.len(), 3);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.index, i);
        assert_eq!((report.qset, report.quantum, report.size), (2, 4, 0));
        assert!(report.segments.is_empty());
    }
}

#[test]
fn test_record_lists_chain_and_last_segment_blocks() {
    let engine = setup_engine();
    fill(&engine, 1, 0, b"ABCDEFGHIJ");

    let report = engine.snapshot().nth(1).unwrap().unwrap();
    assert_eq!(report.size, 10);
    assert_eq!(report.segments.len(), 2);

    // Blocks are only listed for the last segment
    assert!(report.segments[0].blocks.is_empty());
    assert!(report.segments[0].slots_addr.is_some());
    assert_eq!(report.segments[1].blocks.len(), 1);
    assert_eq!(report.segments[1].blocks[0].slot, 0);
    assert_eq!(report.listed_blocks(), 1);
}

#[test]
fn test_record_skips_holes() {
    let engine = setup_engine();
    fill(&engine, 0, 4, b"EFGH");

    let report = engine.snapshot().next().unwrap().unwrap();
    assert_eq!(report.segments.len(), 1);
    let blocks = &report.segments[0].blocks;
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].slot, 1);
}

#[test]
fn test_text_rendering() {
    let engine = setup_engine();
    fill(&engine, 2, 0, b"ABCDEFGHIJ");

    let text = engine.report().unwrap();
    assert!(text.contains("Device 0: qset 2, quantum 4, size 0\n"));
    assert!(text.contains("Device 1: qset 2, quantum 4, size 0\n"));
    assert!(text.contains("Device 2: qset 2, quantum 4, size 10\n"));

    let device2 = &text[text.find("Device 2").unwrap()..];
    assert_eq!(device2.matches("item at").count(), 2);
    assert_eq!(device2.lines().filter(|l| l.trim_start().starts_with("0:")).count(), 1);

    let first = text.find("Device 0").unwrap();
    let second = text.find("Device 1").unwrap();
    assert!(first < second);
}

// =============================================================================
// Restart Tests
// =============================================================================

#[test]
fn test_start_mid_table() {
    let engine = setup_engine();
    let indices: Vec<usize> = Snapshot::start(engine.devices(), 1)
        .map(|r| r.unwrap().index)
        .collect();
    assert_eq!(indices, vec![1, 2]);

    assert_eq!(Snapshot::start(engine.devices(), 3).count(), 0);
}

#[test]
fn test_stop_is_harmless() {
    let engine = setup_engine();
    let mut snap = engine.snapshot();
    snap.next().unwrap().unwrap();
    snap.stop();

    fill(&engine, 0, 0, b"ok");
    assert_eq!(engine.snapshot().next().unwrap().unwrap().size, 2);
}

#[test]
fn test_interrupted_visit_resumes() {
    let engine = setup_engine();
    let token = CancelToken::new();
    let held = engine.device(1).unwrap().lock(&CancelToken::new()).unwrap();

    let (first_tx, first_rx) = channel::bounded(1);
    let (resume_at, interrupted) = crossbeam::thread::scope(|s| {
        let walker = s.spawn(|_| {
            let mut snap = engine.snapshot().with_token(token.clone());
            let first = snap.next().unwrap().map(|r| r.index);
            first_tx.send(first.is_ok()).unwrap();
            let second = snap.next().unwrap();
            assert!(snap.next().is_none());
            (snap.position(), matches!(second, Err(ScullError::Interrupted)))
        });

        assert!(first_rx.recv().unwrap());
        thread::sleep(Duration::from_millis(50));
        token.cancel();
        walker.join().unwrap()
    })
    .unwrap();

    assert!(interrupted);
    assert_eq!(resume_at, 1);
    drop(held);

    let rest: Vec<usize> = Snapshot::start(engine.devices(), resume_at)
        .map(|r| r.unwrap().index)
        .collect();
    assert_eq!(rest, vec![1, 2]);
}

// =============================================================================
// Bounded Report Tests
// =============================================================================

#[test]
fn test_bounded_report_stops_early() {
    let engine = setup_engine();

    let small = snapshot::render_bounded(engine.devices(), 80).unwrap();
    assert_eq!(small.matches("Device").count(), 1);

    let large = snapshot::render_bounded(engine.devices(), 4096).unwrap();
    assert_eq!(large.matches("Device").count(), 3);
    assert!(large.contains("Device 0: qset 2, q 4, sz 0\n"));
}

#[test]
fn test_bounded_report_empty_below_reserve() {
    let engine = setup_engine();

    assert_eq!(snapshot::render_bounded(engine.devices(), 0).unwrap(), "");
    assert_eq!(snapshot::render_bounded(engine.devices(), 40).unwrap(), "");
    assert_eq!(snapshot::render_bounded(engine.devices(), 79).unwrap(), "");
}

#[test]
fn test_bounded_report_dumps_single_segment_slots() {
    let engine = setup_engine();
    fill(&engine, 0, 0, b"ABCD");
    fill(&engine, 1, 0, b"ABCDEFGHIJ");

    let text = snapshot::render_bounded(engine.devices(), 4096).unwrap();
    let device0 = &text[..text.find("Device 1").unwrap()];
    assert!(device0.contains("   0: 0x"));
    assert!(device0.contains("   1: null"));

    // Two segments: no slot dump
    let device1 = &text[text.find("Device 1").unwrap()..text.find("Device 2").unwrap()];
    assert_eq!(device1.lines().count(), 1);
}

// =============================================================================
// JSON Export Tests
// =============================================================================

#[test]
fn test_reports_serialize() {
    let engine = setup_engine();
    fill(&engine, 0, 0, b"AB");

    let reports: Vec<_> = engine.snapshot().collect::<scull::Result<_>>().unwrap();
    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[0]["size"], 2);
    assert_eq!(json[0]["segments"][0]["blocks"][0]["slot"], 0);
}

//! Tests for Engine
//!
//! These tests verify:
//! - Device table creation and validation
//! - Open semantics (write-only open trims)
//! - Access mode enforcement
//! - The std::io adapters on handles
//! - Engine lifecycle (open/close)

use std::io::{Read, Seek, SeekFrom, Write};

use scull::{AccessMode, CancelToken, Config, Engine, Geometry, ScullError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine {
    let config = Config::builder().nr_devs(4).quantum(4).qset(2).build();
    Engine::open(config).unwrap()
}

fn fill(engine: &Engine, index: usize, data: &[u8]) {
    let handle = engine.open_device(index, AccessMode::ReadWrite).unwrap();
    let mut cursor = 0;
    let mut done = 0;
    while done < data.len() {
        done += handle.write(&data[done..], data.len() - done, &mut cursor).unwrap();
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_devices() {
    let engine = setup_engine();

    assert_eq!(engine.device_count(), 4);
    for (i, device) in engine.devices().iter().enumerate() {
        assert_eq!(device.index(), i);
        assert_eq!(device.size(), 0);
        assert_eq!(device.geometry(), Geometry::new(4, 2).unwrap());
    }
}

#[test]
fn test_engine_default_config() {
    let engine = Engine::open(Config::default()).unwrap();
    assert_eq!(engine.device_count(), 4);
    assert_eq!(engine.defaults().quantum(), 2000);
    assert_eq!(engine.defaults().qset(), 1000);
}

#[test]
fn test_engine_rejects_bad_config() {
    let zero_devices = Config::builder().nr_devs(0).build();
    assert!(matches!(Engine::open(zero_devices), Err(ScullError::Config(_))));

    let zero_quantum = Config::builder().quantum(0).build();
    assert!(matches!(Engine::open(zero_quantum), Err(ScullError::Config(_))));
}

#[test]
fn test_engine_close_releases_devices() {
    let engine = setup_engine();
    fill(&engine, 0, b"some data");
    let device = std::sync::Arc::clone(engine.device(0).unwrap());

    engine.close();

    assert_eq!(device.size(), 0);
    assert_eq!(device.stats().blocks, 0);
}

#[test]
fn test_no_such_device() {
    let engine = setup_engine();
    let err = engine.open_device(4, AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, ScullError::NoSuchDevice { index: 4, count: 4 }));
}

// =============================================================================
// Open Semantics Tests
// =============================================================================

#[test]
fn test_write_only_open_trims() {
    let engine = setup_engine();
    fill(&engine, 1, b"ABCDEFGHIJ");
    assert_eq!(engine.device(1).unwrap().size(), 10);

    let handle = engine.open_device(1, AccessMode::WriteOnly).unwrap();
    let device = handle.device();
    assert_eq!(device.size(), 0);
    assert_eq!(device.stats(), Default::default());
    assert_eq!(device.geometry(), engine.defaults());
}

#[test]
fn test_write_only_open_resets_geometry() {
    let engine = setup_engine();
    let device = engine.device(2).unwrap();
    device.set_geometry(&CancelToken::new(), 32, 16).unwrap();

    let _handle = engine.open_device(2, AccessMode::WriteOnly).unwrap();
    assert_eq!(device.geometry(), Geometry::new(4, 2).unwrap());
}

#[test]
fn test_read_write_open_keeps_contents() {
    let engine = setup_engine();
    fill(&engine, 0, b"keep me");

    let _rw = engine.open_device(0, AccessMode::ReadWrite).unwrap();
    let _ro = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    assert_eq!(engine.device(0).unwrap().size(), 7);
}

#[test]
fn test_trim_by_index() {
    let engine = setup_engine();
    fill(&engine, 3, b"xyz");
    engine.trim(3, &CancelToken::new()).unwrap();
    assert_eq!(engine.device(3).unwrap().size(), 0);
}

// =============================================================================
// Access Mode Tests
// =============================================================================

#[test]
fn test_read_only_handle_cannot_write() {
    let engine = setup_engine();
    let handle = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    let mut cursor = 0;
    let err = handle.write(&b"no"[..], 2, &mut cursor).unwrap_err();
    assert!(matches!(err, ScullError::AccessDenied(_)));
}

#[test]
fn test_write_only_handle_cannot_read() {
    let engine = setup_engine();
    let handle = engine.open_device(0, AccessMode::WriteOnly).unwrap();
    let mut buf = [0u8; 2];
    let mut cursor = 0;
    let err = handle.read(&mut buf[..], 2, &mut cursor).unwrap_err();
    assert!(matches!(err, ScullError::AccessDenied(_)));
}

#[test]
fn test_independent_cursors() {
    let engine = setup_engine();
    fill(&engine, 0, b"ABCDEFGH");

    let handle = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    let mut first = 0;
    let mut second = 4;
    let mut buf = [0u8; 4];

    handle.read(&mut buf[..], 4, &mut first).unwrap();
    assert_eq!(&buf, b"ABCD");
    handle.read(&mut buf[..], 4, &mut second).unwrap();
    assert_eq!(&buf, b"EFGH");
    assert_eq!((first, second), (4, 8));
}

// =============================================================================
// std::io Adapter Tests
// =============================================================================

#[test]
fn test_io_write_all_and_read_to_end() {
    let engine = setup_engine();

    let mut writer = engine.open_device(0, AccessMode::WriteOnly).unwrap();
    writer.write_all(b"The quick brown fox").unwrap();
    assert_eq!(writer.position(), 19);
    writer.close();

    let mut reader = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents).unwrap();
    assert_eq!(contents, b"The quick brown fox");
}

#[test]
fn test_io_seek() {
    let engine = setup_engine();
    fill(&engine, 0, b"0123456789");

    let mut handle = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    assert_eq!(handle.seek(SeekFrom::End(-3)).unwrap(), 7);

    let mut buf = Vec::new();
    handle.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"789");

    assert_eq!(handle.seek(SeekFrom::Start(2)).unwrap(), 2);
    assert_eq!(handle.seek(SeekFrom::Current(1)).unwrap(), 3);
    assert!(handle.seek(SeekFrom::Current(-10)).is_err());
}

#[test]
fn test_io_read_stops_at_hole() {
    let config = Config::builder().nr_devs(1).quantum(10).qset(10).build();
    let engine = Engine::open(config).unwrap();

    let mut writer = engine.open_device(0, AccessMode::ReadWrite).unwrap();
    writer.seek(SeekFrom::Start(100)).unwrap();
    writer.write_all(b"!").unwrap();

    let mut reader = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    reader.seek(SeekFrom::Start(50)).unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(Read::read(&mut reader, &mut buf).unwrap(), 0);
}

#[test]
fn test_io_error_kinds() {
    let engine = setup_engine();
    let mut handle = engine.open_device(0, AccessMode::ReadOnly).unwrap();
    let err = Write::write(&mut handle, b"x").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
}

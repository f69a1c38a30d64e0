//! Integration coverage for the Forensic Scanner's aligned sweep and
//! bounded-concurrency pipeline against a synthetic, severely damaged image
//! (every other candidate header zeroed out).

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use btrfs_kit::device::{DeviceReader, MemoryDevice};
use btrfs_kit::scanner::{
    run_concurrent_scan, ConcurrencyConfig, Direction, ProcessFn, ScanConfig, ScanIter,
};
use btrfs_kit::schema::{BuildCtx, ToBytes};
use btrfs_kit::structure::Header;
use uuid::Uuid;

struct InMemoryOpener(Vec<u8>);

impl btrfs_kit::scanner::DeviceOpener for InMemoryOpener {
    fn open(&self) -> btrfs_kit::Result<Box<dyn DeviceReader>> {
        Ok(Box::new(MemoryDevice::new(self.0.clone())))
    }
}

const ALIGNMENT: u64 = 1024;

fn build_damaged_image(fsid: Uuid, slot_count: u64) -> Vec<u8> {
    let mut buf = vec![0u8; (ALIGNMENT as usize) * (slot_count as usize) + Header::SIZE];
    for i in 0..slot_count {
        // Every third slot is left zeroed, simulating overwritten metadata.
        if i % 3 == 2 {
            continue;
        }
        let header = Header {
            csum: [0u8; 32],
            fsid,
            bytenr: i * ALIGNMENT,
            flags: 0,
            chunk_tree_uuid: Uuid::nil(),
            generation: 100 + i,
            owner: 5,
            nritems: 0,
            level: 0,
        };
        let mut encoded = Vec::new();
        header.build(&mut encoded, &BuildCtx::default()).unwrap();
        let start = (i * ALIGNMENT) as usize;
        buf[start..start + encoded.len()].copy_from_slice(&encoded);
    }
    buf
}

#[test]
fn sweep_finds_only_the_surviving_headers() {
    let fsid = Uuid::from_u128(0xabc);
    let image = build_damaged_image(fsid, 9);
    let dev = MemoryDevice::new(image);

    let cfg = ScanConfig { alignment: ALIGNMENT, expected_fsid: Some(fsid), ..ScanConfig::default() };
    let found: Vec<_> = ScanIter::new(&dev, cfg).collect();

    // Slots 0,1,3,4,6,7 survive; 2,5,8 were zeroed.
    assert_eq!(found.len(), 6);
    for candidate in &found {
        assert_eq!(candidate.header.fsid, fsid);
    }
}

#[test]
fn reverse_sweep_over_damaged_image_still_skips_zeroed_slots() {
    let fsid = Uuid::from_u128(0xdef);
    let image = build_damaged_image(fsid, 6);
    let dev = MemoryDevice::new(image);

    let cfg = ScanConfig {
        alignment: ALIGNMENT,
        direction: Direction::Reverse,
        expected_fsid: Some(fsid),
        ..ScanConfig::default()
    };
    let found: Vec<_> = ScanIter::new(&dev, cfg).collect();
    assert_eq!(found.len(), 4);
    assert!(found.windows(2).all(|w| w[0].offset > w[1].offset));
}

#[test]
fn concurrent_pipeline_processes_every_surviving_candidate() {
    let fsid = Uuid::from_u128(0x1234);
    let image = build_damaged_image(fsid, 12);
    let opener: Arc<dyn btrfs_kit::scanner::DeviceOpener> = Arc::new(InMemoryOpener(image));

    let cfg = ScanConfig { alignment: ALIGNMENT, expected_fsid: Some(fsid), ..ScanConfig::default() };
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let process: ProcessFn = Arc::new(move |_dev, candidate| {
        seen_clone.lock().unwrap().push(candidate.offset);
        Ok(())
    });

    let report = run_concurrent_scan(
        opener,
        cfg,
        ConcurrencyConfig { workers: 4, queue_depth: 16, inflight_cap: 3 },
        process,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    assert_eq!(report.processed, 8);
    assert!(report.failures.is_empty());
    assert_eq!(seen.lock().unwrap().len(), 8);
}

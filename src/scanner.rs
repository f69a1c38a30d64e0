//! Forensic Scanner: finds surviving tree-node headers in a damaged
//! image by probing every aligned position, grounded in
//! `pegasusheavy-btrf-mount-windows`'s superblock-mirror probe
//! (`src/core/superblock.rs`'s `SUPERBLOCK_OFFSET` plus its documented
//! mirror offsets) generalized from "check three fixed offsets" to a full
//! aligned sweep, and in `original_source/btrfs_recon/recovery.py`'s
//! forward/reverse aligned scan.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::device::{DeviceReader, MmapDevice};
use crate::error::{ReconError, Result};
use crate::schema::{Cursor, FromCursor, ParseCtx};
use crate::structure::Header;

/// Sweep direction, honored by the producer only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// A user-supplied filter evaluated after the fsid check. Returning `false`
/// skips the candidate without logging it as an error.
pub type Predicate = Arc<dyn Fn(&Header) -> bool + Send + Sync>;

/// Static configuration for one sweep. Cheap to clone so a producer thread
/// can own its copy independently of the caller.
#[derive(Clone)]
pub struct ScanConfig {
    pub alignment: u64,
    pub start: u64,
    pub end: Option<u64>,
    pub direction: Direction,
    pub expected_fsid: Option<Uuid>,
    pub predicate: Option<Predicate>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            alignment: 0x10000,
            start: 0,
            end: None,
            direction: Direction::Forward,
            expected_fsid: None,
            predicate: None,
        }
    }
}

impl ScanConfig {
    /// Aligned candidate positions within `[0, file_size - header_size]`,
    /// clipped to `[start, end]` and ordered per `direction`.
    fn positions(&self, file_len: u64) -> VecDeque<u64> {
        let header_size = Header::SIZE as u64;
        if file_len < header_size {
            return VecDeque::new();
        }
        let last_valid = file_len - header_size;
        let lo = self.start.max(0);
        let hi = self.end.unwrap_or(last_valid).min(last_valid);
        if lo > hi {
            return VecDeque::new();
        }
        let first = lo.div_ceil(self.alignment) * self.alignment;
        let mut positions = VecDeque::new();
        let mut pos = first;
        while pos <= hi {
            positions.push_back(pos);
            pos += self.alignment;
        }
        if self.direction == Direction::Reverse {
            let mut v: Vec<u64> = positions.into();
            v.reverse();
            positions = v.into();
        }
        positions
    }
}

/// One header found during a sweep, paired with its logical... actually its
/// *physical* offset within the probed device (the scanner has no chunk
/// cache and never translates logical addresses).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub offset: u64,
    pub header: Header,
}

fn try_parse_header_at(device: &dyn DeviceReader, offset: u64, cfg: &ScanConfig) -> Option<Header> {
    let header_size = Header::SIZE as usize;
    let bytes = match device.read_at(offset, header_size) {
        Ok(b) => b,
        Err(e) => {
            debug!("scan: short read at {offset:#x}: {e}");
            return None;
        }
    };
    let mut cur = Cursor::new(bytes);
    let header = match Header::parse(&mut cur, &ParseCtx::root()) {
        Ok(h) => h,
        Err(e) => {
            debug!("scan: unparseable header at {offset:#x}: {e}");
            return None;
        }
    };
    if let Some(expected) = cfg.expected_fsid {
        if header.fsid != expected {
            return None;
        }
    }
    if let Some(pred) = &cfg.predicate {
        if !pred(&header) {
            return None;
        }
    }
    Some(header)
}

/// A lazy, restartable sweep over one device: construct it, iterate it, drop
/// it, repeat from any offset by re-slicing the config — no internal thread
/// or generator state to tear down.
pub struct ScanIter<'a> {
    device: &'a dyn DeviceReader,
    cfg: ScanConfig,
    positions: VecDeque<u64>,
}

impl<'a> ScanIter<'a> {
    pub fn new(device: &'a dyn DeviceReader, cfg: ScanConfig) -> Self {
        let positions = cfg.positions(device.len());
        ScanIter { device, cfg, positions }
    }
}

impl<'a> Iterator for ScanIter<'a> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        while let Some(offset) = self.positions.pop_front() {
            if let Some(header) = try_parse_header_at(self.device, offset, &self.cfg) {
                return Some(Candidate { offset, header });
            }
        }
        None
    }
}

/// Opens an independent handle onto the same underlying device, so each
/// worker thread gets its own file cursor — workers never share a file
/// cursor.
pub trait DeviceOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn DeviceReader>>;
}

/// The common case: reopen a path with a fresh [`MmapDevice`] per worker.
pub struct PathOpener(pub PathBuf);

impl DeviceOpener for PathOpener {
    fn open(&self) -> Result<Box<dyn DeviceReader>> {
        Ok(Box::new(MmapDevice::open(&self.0)?))
    }
}

/// Everything a worker needs to process one candidate once it has its own
/// device handle: parse the full node, map it to records, commit it. Kept
/// generic over the caller's record-store choice instead of baking in
/// [`crate::record::RecordStore`] directly, since the scanner doesn't know
/// which store (or dry-run no-op) the caller wants.
pub type ProcessFn = Arc<dyn Fn(&dyn DeviceReader, &Candidate) -> Result<()> + Send + Sync>;

/// Outcome of one concurrent sweep: how many candidates were processed, and
/// the (offset, error) pairs for ones that failed — failures are collected,
/// not fatal: a worker exception does not terminate the sweep.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub processed: u64,
    pub failures: Vec<(u64, String)>,
}

/// Knobs for the bounded producer/worker pipeline.
pub struct ConcurrencyConfig {
    pub workers: usize,
    pub queue_depth: usize,
    pub inflight_cap: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        ConcurrencyConfig { workers: 4, queue_depth: 256, inflight_cap: 16 }
    }
}

/// Runs the bounded-concurrency sweep: a single producer thread walks
/// aligned offsets into
/// a bounded work queue; a worker pool drains it, each with its own device
/// handle; a second, smaller semaphore-style queue caps concurrent commits;
/// `cancel` stops the producer promptly and lets in-flight work drain.
pub fn run_concurrent_scan(
    opener: Arc<dyn DeviceOpener>,
    cfg: ScanConfig,
    concurrency: ConcurrencyConfig,
    process: ProcessFn,
    cancel: Arc<AtomicBool>,
) -> Result<ScanReport> {
    let probe = opener.open()?;
    let positions = cfg.positions(probe.len());
    drop(probe);

    let (offset_tx, offset_rx): (SyncSender<u64>, Receiver<u64>) = sync_channel(concurrency.queue_depth);
    let offset_rx = Arc::new(Mutex::new(offset_rx));

    // Caps concurrent in-flight commits independently of how deep the work
    // queue itself is allowed to get, via a plain counter + condvar (no
    // counting-semaphore type in std).
    let inflight_permits: Arc<(Mutex<usize>, std::sync::Condvar)> =
        Arc::new((Mutex::new(concurrency.inflight_cap), std::sync::Condvar::new()));

    let (result_tx, result_rx): (SyncSender<(u64, Result<()>)>, Receiver<(u64, Result<()>)>) =
        sync_channel(concurrency.queue_depth);

    let producer_cancel = cancel.clone();
    let producer = thread::spawn(move || {
        let mut positions = positions;
        for offset in positions.drain(..) {
            if producer_cancel.load(Ordering::Relaxed) {
                break;
            }
            if offset_tx.send(offset).is_err() {
                break;
            }
        }
    });

    let mut worker_handles = Vec::new();
    for worker_id in 0..concurrency.workers {
        let rx = offset_rx.clone();
        let opener = opener.clone();
        let cfg = cfg.clone();
        let process = process.clone();
        let result_tx = result_tx.clone();
        let cancel = cancel.clone();
        let permits = inflight_permits.clone();
        worker_handles.push(thread::spawn(move || {
            let device = match opener.open() {
                Ok(d) => d,
                Err(e) => {
                    warn!("worker {worker_id}: failed to open device handle: {e}");
                    return;
                }
            };
            loop {
                let offset = {
                    let guard = rx.lock().expect("offset queue mutex poisoned");
                    guard.recv()
                };
                let offset = match offset {
                    Ok(o) => o,
                    Err(_) => break,
                };
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                let (lock, cvar) = &*permits;
                {
                    let mut slots = lock.lock().expect("inflight mutex poisoned");
                    while *slots == 0 {
                        slots = cvar.wait(slots).expect("inflight condvar poisoned");
                    }
                    *slots -= 1;
                }
                let outcome = match try_parse_header_at(device.as_ref(), offset, &cfg) {
                    Some(header) => {
                        let candidate = Candidate { offset, header };
                        process(device.as_ref(), &candidate)
                    }
                    None => Ok(()),
                };
                {
                    let mut slots = lock.lock().expect("inflight mutex poisoned");
                    *slots += 1;
                    cvar.notify_one();
                }
                if result_tx.send((offset, outcome)).is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);
    producer.join().map_err(|_| ReconError::BootstrapFailure { reason: "scanner producer thread panicked".into() })?;

    let mut report = ScanReport::default();
    for (offset, outcome) in result_rx {
        match outcome {
            Ok(()) => report.processed += 1,
            Err(e) => {
                warn!("scan worker failed at offset {offset:#x}: {e}");
                report.failures.push((offset, e.to_string()));
            }
        }
    }
    for h in worker_handles {
        let _ = h.join();
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDevice;
    use crate::schema::{BuildCtx, ToBytes};

    fn header_at(offset: u64, buf: &mut Vec<u8>, fsid: Uuid, generation: u64) {
        let header = Header {
            csum: [0u8; 32],
            fsid,
            bytenr: offset,
            flags: 0,
            chunk_tree_uuid: Uuid::nil(),
            generation,
            owner: 5,
            nritems: 0,
            level: 0,
        };
        if buf.len() < (offset as usize) {
            buf.resize(offset as usize, 0);
        }
        let mut encoded = Vec::new();
        header.build(&mut encoded, &BuildCtx::default()).unwrap();
        let end = offset as usize + encoded.len();
        if buf.len() < end {
            buf.resize(end, 0xAA);
        }
        buf[offset as usize..end].copy_from_slice(&encoded);
    }

    #[test]
    fn scan_finds_headers_at_every_aligned_offset() {
        let fsid = Uuid::nil();
        let alignment = 256u64;
        let mut buf = vec![0xAAu8; (alignment as usize) * 3 + Header::SIZE];
        header_at(0, &mut buf, fsid, 1);
        header_at(alignment, &mut buf, fsid, 2);
        header_at(alignment * 2, &mut buf, fsid, 3);

        let dev = MemoryDevice::new(buf);
        let cfg = ScanConfig { alignment, expected_fsid: Some(fsid), ..ScanConfig::default() };
        let found: Vec<Candidate> = ScanIter::new(&dev, cfg).collect();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].header.generation, 1);
        assert_eq!(found[2].header.generation, 3);
    }

    #[test]
    fn scan_skips_fsid_mismatch() {
        let alignment = 256u64;
        let mut buf = vec![0xAAu8; (alignment as usize) * 2 + Header::SIZE];
        header_at(0, &mut buf, Uuid::nil(), 1);
        header_at(alignment, &mut buf, Uuid::from_u128(1), 2);

        let dev = MemoryDevice::new(buf);
        let cfg = ScanConfig { alignment, expected_fsid: Some(Uuid::nil()), ..ScanConfig::default() };
        let found: Vec<Candidate> = ScanIter::new(&dev, cfg).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, 0);
    }

    #[test]
    fn reverse_direction_walks_high_to_low() {
        let alignment = 256u64;
        let mut buf = vec![0xAAu8; (alignment as usize) * 3 + Header::SIZE];
        header_at(0, &mut buf, Uuid::nil(), 1);
        header_at(alignment, &mut buf, Uuid::nil(), 2);
        header_at(alignment * 2, &mut buf, Uuid::nil(), 3);

        let dev = MemoryDevice::new(buf);
        let cfg = ScanConfig {
            alignment,
            direction: Direction::Reverse,
            expected_fsid: Some(Uuid::nil()),
            ..ScanConfig::default()
        };
        let found: Vec<Candidate> = ScanIter::new(&dev, cfg).collect();
        assert_eq!(found.iter().map(|c| c.offset).collect::<Vec<_>>(), vec![alignment * 2, alignment, 0]);
    }

    #[test]
    fn window_clips_the_swept_range() {
        let alignment = 256u64;
        let mut buf = vec![0xAAu8; (alignment as usize) * 4 + Header::SIZE];
        for i in 0..4u64 {
            header_at(alignment * i, &mut buf, Uuid::nil(), i);
        }
        let dev = MemoryDevice::new(buf);
        let cfg = ScanConfig {
            alignment,
            start: alignment,
            end: Some(alignment * 2),
            expected_fsid: Some(Uuid::nil()),
            ..ScanConfig::default()
        };
        let found: Vec<Candidate> = ScanIter::new(&dev, cfg).collect();
        assert_eq!(found.iter().map(|c| c.offset).collect::<Vec<_>>(), vec![alignment, alignment * 2]);
    }

    struct PathlessOpener(Vec<u8>);
    impl DeviceOpener for PathlessOpener {
        fn open(&self) -> Result<Box<dyn DeviceReader>> {
            Ok(Box::new(MemoryDevice::new(self.0.clone())))
        }
    }

    #[test]
    fn concurrent_scan_processes_every_candidate_exactly_once() {
        let alignment = 512u64;
        let mut buf = vec![0xAAu8; (alignment as usize) * 6 + Header::SIZE];
        for i in 0..6u64 {
            header_at(alignment * i, &mut buf, Uuid::nil(), i);
        }
        let opener: Arc<dyn DeviceOpener> = Arc::new(PathlessOpener(buf));
        let cfg = ScanConfig { alignment, expected_fsid: Some(Uuid::nil()), ..ScanConfig::default() };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_for_closure = seen.clone();
        let process: ProcessFn = Arc::new(move |_dev, candidate| {
            seen_for_closure.lock().unwrap().push(candidate.header.generation);
            Ok(())
        });
        let report = run_concurrent_scan(
            opener,
            cfg,
            ConcurrencyConfig { workers: 3, queue_depth: 8, inflight_cap: 2 },
            process,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        assert_eq!(report.processed, 6);
        assert!(report.failures.is_empty());
        let mut generations = seen.lock().unwrap().clone();
        generations.sort();
        assert_eq!(generations, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn concurrent_scan_collects_worker_failures_without_aborting() {
        let alignment = 512u64;
        let mut buf = vec![0xAAu8; (alignment as usize) * 3 + Header::SIZE];
        for i in 0..3u64 {
            header_at(alignment * i, &mut buf, Uuid::nil(), i);
        }
        let opener: Arc<dyn DeviceOpener> = Arc::new(PathlessOpener(buf));
        let cfg = ScanConfig { alignment, expected_fsid: Some(Uuid::nil()), ..ScanConfig::default() };
        let process: ProcessFn = Arc::new(move |_dev, candidate| {
            if candidate.header.generation == 1 {
                Err(ReconError::parse("test", candidate.offset, "synthetic failure"))
            } else {
                Ok(())
            }
        });
        let report = run_concurrent_scan(
            opener,
            cfg,
            ConcurrencyConfig::default(),
            process,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
    }
}

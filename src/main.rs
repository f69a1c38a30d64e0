use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use btrfs_kit::device::{DeviceReader, MmapDevice};
use btrfs_kit::scanner::{ConcurrencyConfig, Direction, PathOpener, ScanConfig};
use btrfs_kit::schema::{Cursor, FromCursor, ParseCtx};
use btrfs_kit::structure::Superblock;

/// inspect and scan btrfs images too damaged for a normal mount
///
/// Each available block device in the filesystem should be specified on the
/// command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and print the superblock found at each of an image's three
    /// candidate offsets.
    Sb {
        #[clap(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Sweep an image for surviving tree-node headers.
    Scan {
        path: PathBuf,

        #[clap(long, default_value_t = 0x10000)]
        alignment: u64,

        #[clap(long, default_value_t = 0)]
        start: u64,

        #[clap(long)]
        end: Option<u64>,

        #[clap(long)]
        reverse: bool,

        #[clap(long, default_value_t = 4)]
        workers: usize,

        #[clap(long, default_value_t = 256)]
        queue_depth: usize,
    },
}

const SUPERBLOCK_OFFSETS: [u64; 3] = [0x10000, 0x4000_0000, 0x40_0000_0000];

fn sb_list(paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        let device = MmapDevice::open(path)?;
        for offset in SUPERBLOCK_OFFSETS {
            if offset + 0x1000 > device.len() {
                continue;
            }
            let raw = device.read_at(offset, 0x1000)?;
            let mut cur = Cursor::new(raw);
            match Superblock::parse(&mut cur, &ParseCtx::root()) {
                Ok(sb) if sb.has_valid_magic() => {
                    println!(
                        "{}: offset={offset:#x} fsid={} generation={} label={:?} root={:#x} chunk_root={:#x}",
                        path.display(),
                        sb.fsid,
                        sb.generation,
                        sb.label,
                        sb.root,
                        sb.chunk_root,
                    );
                }
                Ok(_) => tracing::warn!("{}: offset={offset:#x} bad magic", path.display()),
                Err(e) => tracing::warn!("{}: offset={offset:#x} unparseable: {e}", path.display()),
            }
        }
    }
    Ok(())
}

fn fs_scan(
    path: PathBuf,
    alignment: u64,
    start: u64,
    end: Option<u64>,
    reverse: bool,
    workers: usize,
    queue_depth: usize,
) -> anyhow::Result<()> {
    let cfg = ScanConfig {
        alignment,
        start,
        end,
        direction: if reverse { Direction::Reverse } else { Direction::Forward },
        expected_fsid: None,
        predicate: None,
    };

    let opener: Arc<dyn btrfs_kit::scanner::DeviceOpener> = Arc::new(PathOpener(path.clone()));
    let process: btrfs_kit::scanner::ProcessFn = Arc::new(|_device, candidate| {
        println!("{:#x} generation={} owner={} level={}", candidate.offset, candidate.header.generation, candidate.header.owner, candidate.header.level);
        Ok(())
    });
    let report = btrfs_kit::scanner::run_concurrent_scan(
        opener,
        cfg,
        ConcurrencyConfig { workers, queue_depth, inflight_cap: workers.max(1) * 2 },
        process,
        Arc::new(AtomicBool::new(false)),
    )?;
    tracing::info!("scan of {} complete: {} candidates, {} failures", path.display(), report.processed, report.failures.len());
    for (offset, reason) in &report.failures {
        tracing::warn!("offset {offset:#x}: {reason}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Sb { paths } => sb_list(&paths)?,
        Command::Scan { path, alignment, start, end, reverse, workers, queue_depth } => {
            fs_scan(path, alignment, start, end, reverse, workers, queue_depth)?
        }
    }

    Ok(())
}

//! Integration coverage for parsing a superblock at its fixed on-disk
//! offset, using literal fixture values from a real-world capture.

use btrfs_kit::schema::{BuildCtx, Cursor, FromCursor, ParseCtx, ToBytes};
use btrfs_kit::structure::{DevItem, Key, KeyType, Superblock, SuperblockFlags};
use uuid::Uuid;

const FIXTURE_FSID: &str = "bba692f7-5be7-4173-bc27-bb3e21644739";
const FIXTURE_BYTENR: u64 = 65536;
const FIXTURE_GENERATION: u64 = 2907003;
const FIXTURE_ROOT: u64 = 257423802368;
const FIXTURE_CHUNK_ROOT: u64 = 4585107275776;
const FIXTURE_LABEL: &str = "yakbtrfs";

fn fixture_superblock() -> Superblock {
    Superblock {
        csum: [0u8; 32],
        fsid: Uuid::parse_str(FIXTURE_FSID).unwrap(),
        bytenr: FIXTURE_BYTENR,
        flags: SuperblockFlags::empty(),
        magic: btrfs_kit::structure::MAGIC,
        generation: FIXTURE_GENERATION,
        root: FIXTURE_ROOT,
        chunk_root: FIXTURE_CHUNK_ROOT,
        log_root: 0,
        log_root_transid: 0,
        total_bytes: 2_000_000_000_000,
        bytes_used: 900_000_000_000,
        root_dir_objectid: 6,
        num_devices: 1,
        sectorsize: 4096,
        nodesize: 16384,
        leafsize: 16384,
        stripesize: 4096,
        sys_chunk_array_size: 0,
        chunk_root_generation: FIXTURE_GENERATION,
        compat_flags: 0,
        compat_ro_flags: 0,
        incompat_flags: 0,
        csum_type: 0,
        root_level: 1,
        chunk_root_level: 1,
        log_root_level: 0,
        dev_item: DevItem {
            devid: 1,
            total_bytes: 2_000_000_000_000,
            bytes_used: 900_000_000_000,
            io_align: 4096,
            io_width: 4096,
            sector_size: 4096,
            ty: 0,
            generation: 0,
            start_offset: 0,
            dev_group: 0,
            seek_speed: 0,
            bandwidth: 0,
            uuid: Uuid::nil(),
            fsid: Uuid::parse_str(FIXTURE_FSID).unwrap(),
        },
        label: FIXTURE_LABEL.to_string(),
        cache_generation: 0,
        uuid_tree_generation: 0,
        metadata_uuid: Uuid::parse_str(FIXTURE_FSID).unwrap(),
        nr_global_roots: 0,
        sys_chunk_array: Vec::new(),
        sys_chunks: Vec::new(),
    }
}

#[test]
fn fixture_superblock_round_trips_and_reports_valid_magic() {
    let sb = fixture_superblock();
    assert!(sb.has_valid_magic());

    let mut bytes = Vec::new();
    sb.build(&mut bytes, &BuildCtx::default()).unwrap();

    let mut cur = Cursor::new(&bytes);
    let parsed = Superblock::parse(&mut cur, &ParseCtx::root()).unwrap();

    assert_eq!(parsed.fsid, sb.fsid);
    assert_eq!(parsed.bytenr, FIXTURE_BYTENR);
    assert_eq!(parsed.generation, FIXTURE_GENERATION);
    assert_eq!(parsed.root, FIXTURE_ROOT);
    assert_eq!(parsed.chunk_root, FIXTURE_CHUNK_ROOT);
    assert_eq!(parsed.label, FIXTURE_LABEL);
}

#[test]
fn bad_magic_is_rejected() {
    let mut sb = fixture_superblock();
    sb.magic = 0;
    assert!(!sb.has_valid_magic());
}

#[test]
fn key_ordering_matches_objectid_then_type_then_offset() {
    let a = Key { objectid: 256, ty: KeyType::ChunkItem, offset: 0 };
    let b = Key { objectid: 256, ty: KeyType::ChunkItem, offset: 1 };
    let c = Key { objectid: 257, ty: KeyType::ChunkItem, offset: 0 };
    assert_eq!(a.cmp_order(&b), std::cmp::Ordering::Less);
    assert_eq!(b.cmp_order(&c), std::cmp::Ordering::Less);
}

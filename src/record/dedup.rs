//! Address Dedup Hook, grounded in
//! `original_source/btrfs_recon/persistence/models/address.py`'s unique
//! `(device_id, phys, phys_size)` constraint and the generic owner
//! relationship it backs.

use std::collections::HashMap;

use crate::error::Result;

use super::{Address, AddressKey, Record, RecordStore};

/// Outcome of reconciling one candidate [`Record`] against existing
/// [`Address`] rows.
enum Plan {
    /// No existing address at this key: insert as-is.
    Insert(Record),
    /// Existing address belongs to the same type tag: convert to an update
    /// targeting the existing row.
    Update(Record, Address),
    /// Existing address belongs to a different type tag: the existing
    /// owner must be evicted before the candidate can be inserted.
    Evict(Record, Address),
}

/// A minimal in-process [`RecordStore`] for tests and the CLI's `--dry-run`
/// path — not a production backend (see module docs on `record/mod.rs`).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    next_id: u64,
    addresses: HashMap<AddressKey, Address>,
    owners: HashMap<u64, (super::TypeTag, Record)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore { next_id: 1, addresses: HashMap::new(), owners: HashMap::new() }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.owners.get(&id).map(|(_, r)| r)
    }
}

impl RecordStore for InMemoryStore {
    fn find_addresses(&self, keys: &[AddressKey]) -> Result<Vec<Address>> {
        Ok(keys.iter().filter_map(|k| self.addresses.get(k).copied()).collect())
    }

    fn commit(&mut self, records: Vec<Record>) -> Result<()> {
        let keys: Vec<AddressKey> = records.iter().filter_map(|r| r.address).collect();
        let existing = self.find_addresses(&keys)?;
        let plans = reconcile_with_store(self, &existing, records);

        for plan in plans {
            match plan {
                Plan::Insert(record) => self.insert_new(record),
                Plan::Update(record, existing_addr) => self.update_existing(record, existing_addr),
                Plan::Evict(record, existing_addr) => {
                    self.owners.remove(&existing_addr.id);
                    self.addresses.remove(&existing_addr.key);
                    self.insert_new(record);
                }
            }
        }
        Ok(())
    }
}

/// Partitions `candidates` into inserts,
/// updates (same type tag as the existing owner, reuse its id), and
/// evictions (different type tag, existing row must be removed first).
fn reconcile_with_store(store: &InMemoryStore, existing: &[Address], candidates: Vec<Record>) -> Vec<Plan> {
    let by_key: HashMap<AddressKey, Address> = existing.iter().map(|a| (a.key, *a)).collect();
    candidates
        .into_iter()
        .map(|candidate| match candidate.address.and_then(|k| by_key.get(&k)) {
            None => Plan::Insert(candidate),
            Some(existing_addr) => {
                let same_tag = store
                    .owners
                    .get(&existing_addr.id)
                    .map(|(tag, _)| *tag == candidate.payload.tag())
                    .unwrap_or(false);
                if same_tag {
                    Plan::Update(candidate, *existing_addr)
                } else {
                    Plan::Evict(candidate, *existing_addr)
                }
            }
        })
        .collect()
}

impl InMemoryStore {
    fn insert_new(&mut self, mut record: Record) {
        let id = self.alloc_id();
        record.id = Some(id);
        if let Some(key) = record.address {
            self.addresses.insert(key, Address { id, key });
        }
        self.owners.insert(id, (record.payload.tag(), record));
    }

    fn update_existing(&mut self, mut record: Record, existing_addr: Address) {
        record.id = Some(existing_addr.id);
        self.owners.insert(existing_addr.id, (record.payload.tag(), record));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::mapper;
    use crate::structure::{BlockGroupFlags, ChunkItem};

    fn sample_chunk() -> ChunkItem {
        ChunkItem {
            length: 0x1000,
            owner: 2,
            stripe_len: 0x1000,
            ty: BlockGroupFlags::DATA,
            io_align: 4096,
            io_width: 4096,
            sector_size: 4096,
            num_stripes: 1,
            sub_stripes: 1,
            stripes: vec![],
        }
    }

    #[test]
    fn reparsing_same_location_is_idempotent() {
        let mut store = InMemoryStore::new();
        let record = mapper::map_chunk_item(sample_chunk(), 1, 0x4000, None).unwrap();
        store.commit(record).unwrap();
        assert_eq!(store.len(), 1);

        let record_again = mapper::map_chunk_item(sample_chunk(), 1, 0x4000, None).unwrap();
        store.commit(record_again).unwrap();
        assert_eq!(store.len(), 1, "re-parsing the same physical location must not duplicate the row");
    }

    #[test]
    fn distinct_locations_both_persist() {
        let mut store = InMemoryStore::new();
        store.commit(mapper::map_chunk_item(sample_chunk(), 1, 0x4000, None).unwrap()).unwrap();
        store.commit(mapper::map_chunk_item(sample_chunk(), 1, 0x8000, None).unwrap()).unwrap();
        assert_eq!(store.len(), 2);
    }
}

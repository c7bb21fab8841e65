use crate::contract::DeleteEntry;

/// Partition acknowledgement entries into consecutive chunks of at most
/// `max_batch_size`, the downstream delete call's per-request limit. The last
/// chunk may be smaller; an exact multiple yields no empty trailing chunk.
pub fn plan_delete_batches(entries: &[DeleteEntry], max_batch_size: usize) -> Vec<Vec<DeleteEntry>> {
    if max_batch_size == 0 || entries.is_empty() {
        return Vec::new();
    }

    entries
        .chunks(max_batch_size)
        .map(<[DeleteEntry]>::to_vec)
        .collect()
}

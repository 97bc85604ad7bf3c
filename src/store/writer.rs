//! Buffered writer spanning several tables

use super::{KvStore, Mutation, StoreError, StoreResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Buffers mutations for many tables and applies them in insertion order
///
/// Consecutive mutations for the same table go out as one batch. A flush
/// with nothing buffered touches nothing.
pub struct MultiTableWriter {
    store: Arc<dyn KvStore>,
    pending: Mutex<Vec<(String, Mutation)>>,
    max_buffered: usize,
}

impl MultiTableWriter {
    pub fn new(store: Arc<dyn KvStore>, max_buffered: usize) -> Self {
        Self {
            store,
            pending: Mutex::new(Vec::new()),
            max_buffered: max_buffered.max(1),
        }
    }

    /// Queue one mutation; flushes early if the buffer is full.
    pub fn add_mutation(&self, table: &str, mutation: Mutation) -> StoreResult<()> {
        self.add_mutations(table, std::iter::once(mutation))
    }

    pub fn add_mutations<I>(&self, table: &str, mutations: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = Mutation>,
    {
        let full = {
            let mut pending = self.lock()?;
            pending.extend(
                mutations
                    .into_iter()
                    .filter(|m| !m.is_empty())
                    .map(|m| (table.to_string(), m)),
            );
            pending.len() >= self.max_buffered
        };
        if full {
            self.flush()?;
        }
        Ok(())
    }

    /// Write everything buffered. Returns the number of mutations written.
    ///
    /// When a batch is rejected its mutations are dropped and reported, and
    /// every batch after it goes back to the front of the buffer.
    pub fn flush(&self) -> StoreResult<usize> {
        let drained = {
            let mut pending = self.lock()?;
            std::mem::take(&mut *pending)
        };
        if drained.is_empty() {
            return Ok(0);
        }

        let mut batches: Vec<(String, Vec<Mutation>)> = Vec::new();
        for (table, mutation) in drained {
            match batches.last_mut() {
                Some((last, batch)) if *last == table => batch.push(mutation),
                _ => batches.push((table, vec![mutation])),
            }
        }

        let mut written = 0;
        let mut remaining = batches.into_iter();
        while let Some((table, batch)) = remaining.next() {
            if let Err(source) = self.store.write(&table, &batch) {
                let rest: Vec<(String, Mutation)> = remaining
                    .flat_map(|(t, b)| b.into_iter().map(move |m| (t.clone(), m)))
                    .collect();
                let requeued = rest.len();
                {
                    let mut pending = self.lock()?;
                    let newer = std::mem::replace(&mut *pending, rest);
                    pending.extend(newer);
                }
                warn!(
                    "Flush rejected {} mutations for {}, {} requeued",
                    batch.len(),
                    table,
                    requeued
                );
                return Err(StoreError::BatchRejected {
                    table,
                    rejected: batch.len(),
                    requeued,
                    source: Box::new(source),
                });
            }
            written += batch.len();
        }
        debug!("Flushed {} buffered mutations", written);
        Ok(written)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<(String, Mutation)>>> {
        self.pending
            .lock()
            .map_err(|_| StoreError::Poisoned("writer buffer"))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ScanSpec};

    fn setup() -> (Arc<MemoryStore>, MultiTableWriter) {
        let store = Arc::new(MemoryStore::new());
        store.create_table("a").unwrap();
        store.create_table("b").unwrap();
        let writer = MultiTableWriter::new(store.clone(), 100);
        (store, writer)
    }

    fn put(row: &str, value: &str) -> Mutation {
        let mut m = Mutation::new(row);
        m.put("f", "", value);
        m
    }

    #[test]
    fn test_buffer_until_flush() {
        let (store, writer) = setup();
        writer.add_mutation("a", put("r1", "1")).unwrap();
        writer.add_mutation("b", put("r1", "2")).unwrap();
        assert_eq!(writer.pending_count(), 2);
        assert_eq!(store.cell_count("a").unwrap(), 0);

        assert_eq!(writer.flush().unwrap(), 2);
        assert_eq!(store.cell_count("a").unwrap(), 1);
        assert_eq!(store.cell_count("b").unwrap(), 1);
        assert_eq!(writer.pending_count(), 0);
    }

    #[test]
    fn test_empty_flush_is_noop() {
        let (_store, writer) = setup();
        assert_eq!(writer.flush().unwrap(), 0);
        writer.add_mutation("a", Mutation::new("r")).unwrap();
        assert_eq!(writer.pending_count(), 0);
    }

    #[test]
    fn test_insertion_order_across_tables() {
        let (store, writer) = setup();
        writer.add_mutation("a", put("r", "first")).unwrap();
        writer.add_mutation("b", put("x", "x")).unwrap();
        let mut delete = Mutation::new("r");
        delete.put_delete("f", "");
        writer.add_mutation("a", delete).unwrap();
        writer.add_mutation("a", put("r", "last")).unwrap();
        writer.flush().unwrap();

        let cells: Vec<_> = store
            .scan("a", ScanSpec::row("r"))
            .unwrap()
            .map(|c| c.unwrap().value)
            .collect();
        assert_eq!(cells, vec![b"last".to_vec()]);
    }

    #[test]
    fn test_auto_flush_when_full() {
        let store = Arc::new(MemoryStore::new());
        store.create_table("a").unwrap();
        let writer = MultiTableWriter::new(store.clone(), 2);
        writer.add_mutation("a", put("r1", "1")).unwrap();
        assert_eq!(store.cell_count("a").unwrap(), 0);
        writer.add_mutation("a", put("r2", "2")).unwrap();
        assert_eq!(store.cell_count("a").unwrap(), 2);
    }

    #[test]
    fn test_rejected_batch_keeps_later_mutations() {
        let (store, writer) = setup();
        writer.add_mutation("a", put("r1", "1")).unwrap();
        writer.add_mutation("missing", put("r", "v")).unwrap();
        writer.add_mutation("missing", put("s", "v")).unwrap();
        writer.add_mutation("b", put("r2", "2")).unwrap();
        writer.add_mutation("a", put("r3", "3")).unwrap();

        match writer.flush() {
            Err(StoreError::BatchRejected {
                table,
                rejected,
                requeued,
                source,
            }) => {
                assert_eq!(table, "missing");
                assert_eq!((rejected, requeued), (2, 2));
                assert!(matches!(*source, StoreError::TableNotFound(_)));
            }
            other => panic!("expected a rejected batch, got {:?}", other),
        }
        assert_eq!(store.cell_count("a").unwrap(), 1);
        assert_eq!(writer.pending_count(), 2);

        assert_eq!(writer.flush().unwrap(), 2);
        assert_eq!(store.cell_count("a").unwrap(), 2);
        assert_eq!(store.cell_count("b").unwrap(), 1);
    }
}

//! The benchmark driver.
//!
//! A [BenchContext] holds the input records and one store per selected
//! backend. [BenchContext::run] takes all stores through the phases in a
//! fixed order, one phase at a time and backend after backend within a
//! phase:
//!
//! 1. insert every record in input order, then check the store size;
//! 2. optionally write the memory snapshot;
//! 3. look up every record;
//! 4. walk the store and check the number of visited entries;
//! 5. delete every record in input order, then check the store is empty.
//!
//! Every phase reports the wall-clock time per input record, averaged over
//! the configured number of repetitions. Repeating the insert phase starts
//! from a fresh store every time, and every delete run after the first is
//! preceded by an untimed insert of all records.

use std::collections::HashSet;
use std::fs::File;
use std::hint::black_box;
use std::io::BufWriter;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::backends::{BackendKind, PrefixStore};
use crate::types::errors::BenchError;
use crate::types::stats::{
    BackendMemory, BenchReport, MemorySnapshot, Phase, PhaseTiming,
};
use crate::types::{NetPrefix, PrefixRecord};

pub mod alloc;
pub mod check;
mod config;

pub use config::BenchConfig;

/// The store type the driver runs: values are borrowed input records.
pub type RecordStore<'a, M> = dyn PrefixStore<&'a PrefixRecord<M>> + 'a;

//------------ BenchContext --------------------------------------------------

pub struct BenchContext<'a, M> {
    records: &'a [PrefixRecord<M>],
    // The number of distinct prefixes in `records`.
    distinct: usize,
    stores: Vec<Box<RecordStore<'a, M>>>,
    // Per store, the number of distinct prefixes its key encoding supports.
    supported: Vec<usize>,
    config: BenchConfig,
    memory: Vec<BackendMemory>,
}

impl<'a, M> BenchContext<'a, M> {
    pub fn new(records: &'a [PrefixRecord<M>], config: BenchConfig) -> Self {
        let distinct: HashSet<NetPrefix> =
            records.iter().map(|r| r.prefix).collect();
        if distinct.len() != records.len() {
            warn!(
                "input holds {} records but only {} distinct prefixes",
                records.len(),
                distinct.len()
            );
        }
        let stores: Vec<Box<RecordStore<'a, M>>> =
            config.backends.iter().map(|kind| kind.build()).collect();
        // Counted here so that no phase pays for it.
        let supported = stores
            .iter()
            .map(|s| check::supported(&**s, &distinct))
            .collect();
        Self {
            records,
            distinct: distinct.len(),
            stores,
            supported,
            config,
            memory: Vec::new(),
        }
    }

    pub fn records(&self) -> &'a [PrefixRecord<M>] {
        self.records
    }

    pub fn stores(&self) -> impl Iterator<Item = &RecordStore<'a, M>> {
        self.stores.iter().map(|s| &**s)
    }

    pub fn store(&self, kind: BackendKind) -> Option<&RecordStore<'a, M>> {
        self.stores().find(|s| s.kind() == kind)
    }

    /// Runs all phases on all backends.
    pub fn run(&mut self) -> Result<BenchReport, BenchError> {
        let mut timings = self.insert_phase()?;
        if self.config.snapshot.is_some() {
            self.write_snapshot()?;
        }
        timings.extend(self.lookup_phase());
        timings.extend(self.walk_phase()?);
        timings.extend(self.delete_phase()?);

        Ok(BenchReport {
            prefixes: self.records.len(),
            repetitions: self.config.runs(),
            timings,
            unsupported: self.unsupported(),
        })
    }

    /// The backends that could not store some of the input, with the number
    /// of prefixes they skipped.
    pub fn unsupported(&self) -> Vec<(BackendKind, usize)> {
        self.stores
            .iter()
            .zip(&self.supported)
            .filter_map(|(s, supported)| {
                let skipped = self.distinct.saturating_sub(*supported);
                (skipped > 0).then(|| (s.kind(), skipped))
            })
            .collect()
    }

    pub fn insert_phase(&mut self) -> Result<Vec<PhaseTiming>, BenchError> {
        info!("{} {} prefixes", Phase::Insert, self.records.len());
        let records = self.records;
        let runs = self.config.runs();
        let mut timings = Vec::with_capacity(self.stores.len());
        self.memory.clear();

        for (store, &supported) in self.stores.iter_mut().zip(&self.supported) {
            let kind = store.kind();
            let mut per_run = Vec::with_capacity(runs);
            let mut bytes = 0;
            for _ in 0..runs {
                *store = kind.build();
                let before = alloc::live_bytes();
                per_run.push(timed(|| insert_all(&mut **store, records)));
                bytes = alloc::live_bytes().saturating_sub(before);
            }
            check::check_inserted(&**store, supported)?;
            debug!("{}: {} entries, {} bytes", kind, store.len(), bytes);

            self.memory.push(BackendMemory {
                backend: kind,
                bytes,
                bytes_per_prefix: bytes as f64 / store.len().max(1) as f64,
            });
            timings.push(PhaseTiming::from_runs(
                Phase::Insert,
                kind,
                &per_run,
                records.len(),
            ));
        }
        Ok(timings)
    }

    pub fn lookup_phase(&self) -> Vec<PhaseTiming> {
        info!("{}", Phase::Lookup);
        self.stores
            .iter()
            .map(|store| {
                let per_run = (0..self.config.runs())
                    .map(|_| {
                        timed(|| {
                            for record in self.records {
                                black_box(store.lookup(&record.prefix));
                            }
                        })
                    })
                    .collect::<Vec<_>>();
                PhaseTiming::from_runs(
                    Phase::Lookup,
                    store.kind(),
                    &per_run,
                    self.records.len(),
                )
            })
            .collect()
    }

    pub fn walk_phase(&self) -> Result<Vec<PhaseTiming>, BenchError> {
        info!("{}", Phase::Walk);
        let mut timings = Vec::with_capacity(self.stores.len());
        for store in &self.stores {
            let mut per_run = Vec::with_capacity(self.config.runs());
            for _ in 0..self.config.runs() {
                let mut visited = 0;
                per_run.push(timed(|| {
                    visited = store.walk(&mut |v| {
                        black_box(v);
                    });
                }));
                check::check_walked(&**store, visited)?;
            }
            timings.push(PhaseTiming::from_runs(
                Phase::Walk,
                store.kind(),
                &per_run,
                self.records.len(),
            ));
        }
        Ok(timings)
    }

    pub fn delete_phase(&mut self) -> Result<Vec<PhaseTiming>, BenchError> {
        info!("{}", Phase::Delete);
        let records = self.records;
        let runs = self.config.runs();
        let mut timings = Vec::with_capacity(self.stores.len());

        for store in self.stores.iter_mut() {
            let mut per_run = Vec::with_capacity(runs);
            for run in 0..runs {
                if run > 0 {
                    insert_all(&mut **store, records);
                }
                per_run.push(timed(|| {
                    for record in records {
                        black_box(store.delete(&record.prefix));
                    }
                }));
                check::check_emptied(&**store)?;
            }
            timings.push(PhaseTiming::from_runs(
                Phase::Delete,
                store.kind(),
                &per_run,
                records.len(),
            ));
        }
        Ok(timings)
    }

    /// The heap usage recorded by the last insert phase.
    pub fn memory_snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            heap_live: alloc::live_bytes(),
            backends: self.memory.clone(),
        }
    }

    fn write_snapshot(&self) -> Result<(), BenchError> {
        let Some(path) = &self.config.snapshot else {
            return Ok(());
        };
        if !alloc::is_counting() {
            warn!("heap accounting is not active, snapshot holds zeros");
        }
        let file = File::create(path).map_err(BenchError::Snapshot)?;
        serde_json::to_writer_pretty(
            BufWriter::new(file),
            &self.memory_snapshot(),
        )?;
        info!("wrote memory snapshot to {}", path.display());
        Ok(())
    }
}

fn insert_all<'a, M>(
    store: &mut dyn PrefixStore<&'a PrefixRecord<M>>,
    records: &'a [PrefixRecord<M>],
) {
    for record in records {
        store.insert(&record.prefix, record);
    }
}

fn timed(f: impl FnOnce()) -> Duration {
    let t0 = Instant::now();
    f();
    t0.elapsed()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::test_types::{ipv4_slash24s, PrefixAs};

    #[test]
    fn repeated_phases_keep_counts() -> Result<(), BenchError> {
        let records = ipv4_slash24s(1000);
        let config = BenchConfig {
            repetitions: 3,
            ..Default::default()
        };
        let mut ctx = BenchContext::new(&records, config);
        let report = ctx.run()?;

        assert_eq!(report.prefixes, 1000);
        assert_eq!(report.repetitions, 3);
        assert_eq!(report.timings.len(), 4 * BackendKind::ALL.len());
        assert!(report.unsupported.is_empty());
        assert!(ctx.stores().all(|s| s.is_empty()));
        Ok(())
    }

    #[test]
    fn lookups_return_the_input_record() -> Result<(), BenchError> {
        let records = ipv4_slash24s(300);
        let mut ctx = BenchContext::new(&records, BenchConfig::default());
        ctx.insert_phase()?;
        for store in ctx.stores() {
            for record in &records {
                let found = store.lookup(&record.prefix);
                assert_eq!(found.map(|r| r.meta), Some(record.meta));
            }
        }
        let memory = ctx.memory_snapshot();
        assert_eq!(memory.backends.len(), BackendKind::ALL.len());
        Ok(())
    }

    #[test]
    fn duplicates_in_input_are_counted_once() -> Result<(), BenchError> {
        let mut records = ipv4_slash24s(10);
        records.extend(ipv4_slash24s(5));
        let config = BenchConfig {
            backends: vec![BackendKind::ByteKeyMap, BackendKind::CritBit],
            ..Default::default()
        };
        let mut ctx = BenchContext::new(&records, config);
        ctx.insert_phase()?;
        assert!(ctx.stores().all(|s| s.len() == 10));
        // Later records overwrite earlier ones for the same prefix.
        let found = ctx
            .store(BackendKind::CritBit)
            .and_then(|s| s.lookup(&records[0].prefix).copied());
        assert!(found.is_some_and(|r| std::ptr::eq(r, &records[10])));
        assert_eq!(found.map(|r| r.meta), Some(PrefixAs(0)));
        ctx.delete_phase()?;
        Ok(())
    }

    #[test]
    fn unsupported_prefixes_are_known_before_any_phase(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut records = ipv4_slash24s(20);
        for p in ["2001:db8::/32", "2001:db8::/32", "::/0"] {
            records.push(PrefixRecord::new(p.parse()?, PrefixAs(0)));
        }
        let mut ctx = BenchContext::new(&records, BenchConfig::default());
        assert_eq!(ctx.unsupported(), vec![(BackendKind::IntKeyMap, 2)]);
        assert!(ctx.stores().all(|s| s.is_empty()));

        ctx.insert_phase()?;
        let int_map = ctx.store(BackendKind::IntKeyMap).map(|s| s.len());
        assert_eq!(int_map, Some(20));
        assert_eq!(ctx.unsupported(), vec![(BackendKind::IntKeyMap, 2)]);
        Ok(())
    }
}

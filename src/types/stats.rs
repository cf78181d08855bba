//------------ Types for Statistics -----------------------------------------

use std::fmt;
use std::time::Duration;

use serde_derive::Serialize;

use crate::backends::BackendKind;

//------------ Phase ---------------------------------------------------------

/// The timed phases of a benchmark run, in the order they are run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Insert,
    Lookup,
    Walk,
    Delete,
}

impl Phase {
    pub const ALL: [Phase; 4] =
        [Phase::Insert, Phase::Lookup, Phase::Walk, Phase::Delete];

    /// The operation label used in the per-backend report lines.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Insert => "insert",
            Phase::Lookup => "lookup",
            Phase::Walk => "walk",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Insert => write!(f, "INSERT"),
            Phase::Lookup => write!(f, "LOOKUP"),
            Phase::Walk => write!(f, "WALK"),
            Phase::Delete => write!(f, "DELETE"),
        }
    }
}

//------------ PhaseTiming ---------------------------------------------------

/// The averaged cost of one operation of a phase on one backend.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub backend: BackendKind,
    pub ns_per_op: f64,
}

impl PhaseTiming {
    /// Averages the duration of every run over `ops` operations, then over
    /// the runs.
    pub fn from_runs(
        phase: Phase,
        backend: BackendKind,
        per_run: &[Duration],
        ops: usize,
    ) -> Self {
        let ops = ops.max(1) as f64;
        let sum = per_run
            .iter()
            .map(|d| d.as_nanos() as f64 / ops)
            .sum::<f64>();
        Self {
            phase,
            backend,
            ns_per_op: sum / per_run.len().max(1) as f64,
        }
    }
}

impl fmt::Display for PhaseTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("{} {}", self.backend, self.phase.label());
        write!(f, "{:<30}{:10.5} ns/op", name, self.ns_per_op)
    }
}

//------------ BenchReport ---------------------------------------------------

/// The outcome of a complete benchmark run.
#[derive(Clone, Debug, Serialize)]
pub struct BenchReport {
    pub prefixes: usize,
    pub repetitions: usize,
    pub timings: Vec<PhaseTiming>,
    /// Per backend, the number of input records its key encoder could not
    /// represent. Only backends with at least one such record are listed.
    pub unsupported: Vec<(BackendKind, usize)>,
}

impl BenchReport {
    pub fn timings_for(
        &self,
        phase: Phase,
    ) -> impl Iterator<Item = &PhaseTiming> + '_ {
        self.timings.iter().filter(move |t| t.phase == phase)
    }

    pub fn get(&self, phase: Phase, backend: BackendKind) -> Option<f64> {
        self.timings
            .iter()
            .find(|t| t.phase == phase && t.backend == backend)
            .map(|t| t.ns_per_op)
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for phase in Phase::ALL {
            writeln!(f, "{}", phase)?;
            for timing in self.timings_for(phase) {
                writeln!(f, "{}", timing)?;
            }
        }
        for (backend, count) in &self.unsupported {
            writeln!(f, "{}: {} unsupported prefixes skipped", backend, count)?;
        }
        write!(f, "\nthe number of prefixes = {}", self.prefixes)
    }
}

//------------ MemorySnapshot ------------------------------------------------

/// Heap usage right after the insert phase.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemorySnapshot {
    /// Total bytes live on the heap when the snapshot was taken.
    pub heap_live: usize,
    /// Net bytes allocated by each backend during its (last) insert run.
    pub backends: Vec<BackendMemory>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BackendMemory {
    pub backend: BackendKind,
    pub bytes: usize,
    pub bytes_per_prefix: f64,
}

//------------ Config --------------------------------------------------------

//! Configuration of a benchmark run.
//!
//! ```
//! use rib_bench::backends::BackendKind;
//! use rib_bench::bench::BenchConfig;
//!
//! let config = BenchConfig {
//!     repetitions: 3,
//!     backends: vec![BackendKind::CritBit, BackendKind::MutableRadix],
//!     ..Default::default()
//! };
//! assert!(config.snapshot.is_none());
//! ```

use std::path::PathBuf;

use crate::backends::BackendKind;

#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// How often every phase is run. Timings are averaged over all runs.
    /// Zero is treated as one.
    pub repetitions: usize,
    /// The backends to run, in reporting order.
    pub backends: Vec<BackendKind>,
    /// Where to write the memory snapshot taken after the insert phase.
    pub snapshot: Option<PathBuf>,
}

impl BenchConfig {
    pub(crate) fn runs(&self) -> usize {
        self.repetitions.max(1)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            repetitions: 1,
            backends: BackendKind::ALL.to_vec(),
            snapshot: None,
        }
    }
}

use std::fmt;
use std::path::PathBuf;

use crate::backends::BackendKind;
use crate::types::af::Family;
use crate::types::stats::Phase;

//------------ PrefixError ---------------------------------------------------

/// A prefix could not be created from the given address and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixError {
    /// The length exceeds the number of bits of the address family.
    LengthInvalid { family: Family, len: u8 },
    /// The string is not of the form `address/length`.
    Parse(String),
}

impl std::error::Error for PrefixError {}

impl fmt::Display for PrefixError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrefixError::LengthInvalid { family, len } => write!(
                f,
                "Error: Prefix length {} is invalid for {} (max {}).",
                len,
                family,
                family.bits()
            ),
            PrefixError::Parse(s) => {
                write!(f, "Error: Cannot parse '{}' as a prefix.", s)
            }
        }
    }
}

//------------ InputError ----------------------------------------------------

/// The RIB dump could not be read. A benchmark over a partially read dump
/// can't be trusted, so all of these are fatal.
#[derive(Debug)]
pub enum InputError {
    /// The dump file can't be opened or mapped.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The MRT decoder rejected the file.
    Decode(String),
    /// The CSV reader failed.
    Csv(csv::Error),
    /// A row or entry in the dump does not describe a valid prefix.
    Record { line: u64, reason: String },
    /// The input format is not compiled into this binary.
    FormatUnavailable(&'static str),
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Open { source, .. } => Some(source),
            InputError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputError::Open { path, source } => {
                write!(f, "Error: Cannot open {}: {}", path.display(), source)
            }
            InputError::Decode(e) => {
                write!(f, "Error: Cannot decode RIB dump: {}", e)
            }
            InputError::Csv(e) => write!(f, "Error: Cannot read CSV: {}", e),
            InputError::Record { line, reason } => {
                write!(f, "Error: Invalid record at line {}: {}", line, reason)
            }
            InputError::FormatUnavailable(format) => write!(
                f,
                "Error: Input format '{}' is not enabled in this build.",
                format
            ),
        }
    }
}

impl From<csv::Error> for InputError {
    fn from(e: csv::Error) -> Self {
        InputError::Csv(e)
    }
}

//------------ ConsistencyError ----------------------------------------------

/// A backend holds a different number of entries than the benchmark put in.
/// All timings for that backend are meaningless, so the whole run must be
/// aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyError {
    pub backend: BackendKind,
    pub phase: Phase,
    pub expected: usize,
    pub actual: usize,
}

impl std::error::Error for ConsistencyError {}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "FATAL: size of {} is {} but {} is expected (after {})",
            self.backend, self.actual, self.expected, self.phase
        )
    }
}

//------------ BenchError ----------------------------------------------------

/// Everything that can end a benchmark run.
#[derive(Debug)]
pub enum BenchError {
    Input(InputError),
    Consistency(ConsistencyError),
    /// The memory snapshot could not be written.
    Snapshot(std::io::Error),
    /// The report or snapshot could not be serialized.
    Serialize(serde_json::Error),
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Input(e) => Some(e),
            BenchError::Consistency(e) => Some(e),
            BenchError::Snapshot(e) => Some(e),
            BenchError::Serialize(e) => Some(e),
        }
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BenchError::Input(e) => fmt::Display::fmt(e, f),
            BenchError::Consistency(e) => fmt::Display::fmt(e, f),
            BenchError::Snapshot(e) => {
                write!(f, "Error: Cannot write memory snapshot: {}", e)
            }
            BenchError::Serialize(e) => {
                write!(f, "Error: Cannot serialize output: {}", e)
            }
        }
    }
}

impl From<InputError> for BenchError {
    fn from(e: InputError) -> Self {
        BenchError::Input(e)
    }
}

impl From<ConsistencyError> for BenchError {
    fn from(e: ConsistencyError) -> Self {
        BenchError::Consistency(e)
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(e: serde_json::Error) -> Self {
        BenchError::Serialize(e)
    }
}

//! Loading the prefix sequence from a RIB dump.
//!
//! The loaders produce an ordered `Vec` of records once, before the
//! benchmark starts. Only the first record for every prefix is kept, so the
//! benchmark input is a set of distinct prefixes in the order the dump
//! lists them.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::types::errors::InputError;
use crate::types::{Family, NetPrefix, PrefixRecord, RouteMeta};

pub mod csv;
#[cfg(feature = "mrt")]
pub mod mrt;

//------------ InputFormat ---------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// An MRT TABLE_DUMPv2 file.
    Mrt,
    /// `prefix,len,asn` rows.
    Csv,
}

impl InputFormat {
    /// Guesses the format from the file name: `.csv` is CSV, anything else
    /// is taken to be MRT.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Mrt,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Mrt => write!(f, "mrt"),
            InputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mrt" => Ok(InputFormat::Mrt),
            "csv" => Ok(InputFormat::Csv),
            _ => Err(format!("unknown input format '{}'", s)),
        }
    }
}

//------------ FamilyFilter --------------------------------------------------

/// Which address families to keep from the dump.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FamilyFilter {
    #[default]
    Ipv4,
    Ipv6,
    All,
}

impl FamilyFilter {
    pub fn accepts(&self, prefix: &NetPrefix) -> bool {
        match self {
            FamilyFilter::Ipv4 => prefix.family() == Family::Ipv4,
            FamilyFilter::Ipv6 => prefix.family() == Family::Ipv6,
            FamilyFilter::All => true,
        }
    }
}

impl FromStr for FamilyFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipv4" | "v4" | "4" => Ok(FamilyFilter::Ipv4),
            "ipv6" | "v6" | "6" => Ok(FamilyFilter::Ipv6),
            "all" | "any" => Ok(FamilyFilter::All),
            _ => Err(format!("unknown address family '{}'", s)),
        }
    }
}

//------------ LoadOptions ---------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// The input format. `None` guesses it from the file name.
    pub format: Option<InputFormat>,
    pub family: FamilyFilter,
}

//------------ Loading -------------------------------------------------------

/// Reads all records from the dump at `path`.
pub fn load_prefixes(
    path: &Path,
    options: &LoadOptions,
) -> Result<Vec<PrefixRecord<RouteMeta>>, InputError> {
    let format = options
        .format
        .unwrap_or_else(|| InputFormat::from_path(path));
    debug!("loading {} as {}", path.display(), format);

    let t0 = std::time::Instant::now();
    let records = match format {
        InputFormat::Csv => csv::load(path, options.family)?,
        #[cfg(feature = "mrt")]
        InputFormat::Mrt => mrt::load(path, options.family)?,
        #[cfg(not(feature = "mrt"))]
        InputFormat::Mrt => return Err(InputError::FormatUnavailable("mrt")),
    };

    info!(
        "loaded {} prefixes from {} in {}ms",
        records.len(),
        path.display(),
        t0.elapsed().as_millis()
    );
    Ok(records)
}

// Collects the records the filter accepts, dropping all but the first
// record for every prefix.
pub(crate) struct Collector<M> {
    family: FamilyFilter,
    seen: HashSet<NetPrefix>,
    records: Vec<PrefixRecord<M>>,
    skipped: usize,
}

impl<M> Collector<M> {
    pub(crate) fn new(family: FamilyFilter) -> Self {
        Self {
            family,
            seen: HashSet::new(),
            records: Vec::new(),
            skipped: 0,
        }
    }

    pub(crate) fn push(&mut self, prefix: NetPrefix, meta: impl FnOnce() -> M) {
        if !self.family.accepts(&prefix) || !self.seen.insert(prefix) {
            self.skipped += 1;
            return;
        }
        self.records.push(PrefixRecord::new(prefix, meta()));
    }

    pub(crate) fn finish(self) -> Vec<PrefixRecord<M>> {
        debug!(
            "kept {} records, skipped {} (duplicate or filtered)",
            self.records.len(),
            self.skipped
        );
        self.records
    }
}

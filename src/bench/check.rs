//! Cardinality checks between the phases.
//!
//! A backend that holds a different number of entries than was put into it
//! invalidates every timing taken for it. All checks return a
//! [ConsistencyError] that the driver passes straight up, ending the run.

use std::collections::HashSet;

use log::trace;

use crate::backends::{BackendKind, PrefixStore};
use crate::types::errors::ConsistencyError;
use crate::types::stats::Phase;
use crate::types::NetPrefix;

pub fn check_len(
    backend: BackendKind,
    phase: Phase,
    expected: usize,
    actual: usize,
) -> Result<(), ConsistencyError> {
    trace!("{} after {}: {} of {}", backend, phase, actual, expected);
    if expected == actual {
        Ok(())
    } else {
        Err(ConsistencyError {
            backend,
            phase,
            expected,
            actual,
        })
    }
}

/// After insert the store holds every distinct prefix of the input that its
/// key encoding supports, `supported` of them.
pub fn check_inserted<V>(
    store: &dyn PrefixStore<V>,
    supported: usize,
) -> Result<(), ConsistencyError> {
    check_len(store.kind(), Phase::Insert, supported, store.len())
}

/// The number of prefixes in `distinct` the store's key encoding supports.
pub fn supported<V>(
    store: &dyn PrefixStore<V>,
    distinct: &HashSet<NetPrefix>,
) -> usize {
    distinct.iter().filter(|p| store.supports(p)).count()
}

/// A walk visits every entry exactly once.
pub fn check_walked<V>(
    store: &dyn PrefixStore<V>,
    visited: usize,
) -> Result<(), ConsistencyError> {
    check_len(store.kind(), Phase::Walk, store.len(), visited)
}

/// After delete the store is empty.
pub fn check_emptied<V>(
    store: &dyn PrefixStore<V>,
) -> Result<(), ConsistencyError> {
    check_len(store.kind(), Phase::Delete, 0, store.len())
}

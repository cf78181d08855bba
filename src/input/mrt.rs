//! MRT TABLE_DUMPv2 RIB dumps.
//!
//! The file is mapped into memory and walked entry by entry. A dump holds
//! one RIB entry per prefix and peer; only the first one for every prefix
//! is kept.

use std::fs::File;
use std::path::Path;

use log::trace;
use inetnum::addr::Prefix;
use memmap2::Mmap;
use routecore::mrt::MrtFile;

use super::{Collector, FamilyFilter};
use crate::types::errors::InputError;
use crate::types::{NetPrefix, PrefixRecord, RouteMeta};

pub fn load(
    path: &Path,
    family: FamilyFilter,
) -> Result<Vec<PrefixRecord<RouteMeta>>, InputError> {
    let open_err = |source| InputError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_err)?;
    // SAFETY: the mapping is only read, and dropped before this returns.
    let mmap = unsafe { Mmap::map(&file) }.map_err(open_err)?;
    trace!("mapped {} ({}MiB)", path.display(), mmap.len() >> 20);

    let mrt_file = MrtFile::new(&*mmap);
    let entries = mrt_file
        .rib_entries()
        .map_err(|e| InputError::Decode(format!("{:?}", e)))?;

    Ok(collect_entries(entries, family))
}

// Turns the `(_, peer index, _, prefix, path attributes)` tuples of a RIB
// entry iterator into records.
fn collect_entries<A, B>(
    entries: impl IntoIterator<Item = (A, u16, B, Prefix, Vec<u8>)>,
    family: FamilyFilter,
) -> Vec<PrefixRecord<RouteMeta>> {
    let mut collector = Collector::new(family);
    for (_, peer_index, _, prefix, bytes) in entries {
        collector.push(NetPrefix::from(prefix), || {
            RouteMeta::PathAttributes { peer_index, bytes }
        });
    }
    collector.finish()
}

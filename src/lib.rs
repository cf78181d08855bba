#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

//! A benchmark of in-memory storage backends for a BGP Routing Information
//! Base (RIB).
//!
//! The same sequence of prefixes, usually read from an MRT RIB dump, is
//! inserted into, looked up in, walked over and deleted from five
//! structurally different containers:
//!
//! * a hash map keyed by a fixed width byte encoding of the prefix,
//! * a hash map keyed by a packed integer (IPv4 only),
//! * a mutable radix tree keyed by the prefix as a string of bits,
//! * a persistent radix tree with structural sharing between versions,
//! * a crit-bit tree.
//!
//! The time per operation of every phase is reported per backend. Between
//! the phases the number of entries in every backend is checked against the
//! input; a mismatch aborts the run, since it makes the timings for that
//! backend meaningless.
//!
//! ```
//! use rib_bench::bench::{BenchConfig, BenchContext};
//! use rib_bench::test_types::ipv4_slash24s;
//!
//! let records = ipv4_slash24s(1_000);
//! let mut ctx = BenchContext::new(&records, BenchConfig::default());
//! let report = ctx.run().unwrap();
//! println!("{}", report);
//! ```

mod types;

pub mod backends;
pub mod bench;
pub mod input;
pub mod keys;

// re-exports
pub use inetnum::addr;

/// Prefixes of both address families, and the trait describing them
pub use types::{Family, Ipv4Prefix, Ipv6Prefix, NetPrefix, PrefixVariant};

/// Records, as loaded from a dump and stored in the backends
pub use types::{PrefixRecord, RouteMeta};

/// Error types returned by the loaders and the benchmark driver
pub use types::errors;

/// Timing reports and memory snapshots
pub use types::stats;

/// The underlying values (u32 and u128) for IPv4 and IPv6 addresses
pub use types::af::{IPv4, IPv6};

// Used in tests
#[doc(hidden)]
pub use types::test_types;

pub(crate) mod af;
pub(crate) mod prefix_record;

pub mod errors;
pub mod stats;
pub mod test_types;

pub use af::{Family, Ipv4Prefix, Ipv6Prefix, NetPrefix, PrefixVariant};
pub use prefix_record::{PrefixRecord, RouteMeta};

//! CSV dumps with one `address,length,asn` row per prefix.
//!
//! A first row that does not start with an address is taken to be a header
//! and skipped.

use std::fs::File;
use std::io::Read;
use std::net::IpAddr;
use std::path::Path;

use super::{Collector, FamilyFilter};
use crate::types::errors::InputError;
use crate::types::{NetPrefix, PrefixRecord, RouteMeta};

pub fn load(
    path: &Path,
    family: FamilyFilter,
) -> Result<Vec<PrefixRecord<RouteMeta>>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read(file, family)
}

/// Reads CSV rows from any reader.
pub fn read<R: Read>(
    reader: R,
    family: FamilyFilter,
) -> Result<Vec<PrefixRecord<RouteMeta>>, InputError> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(::csv::Trim::All)
        .from_reader(reader);
    let mut collector = Collector::new(family);

    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record.position().map_or(idx as u64 + 1, |p| p.line());
        let invalid = |reason: String| InputError::Record { line, reason };

        let Some(addr) = record.get(0) else {
            continue;
        };
        let addr: IpAddr = match addr.parse() {
            Ok(addr) => addr,
            Err(_) if idx == 0 => continue,
            Err(_) => {
                return Err(invalid(format!("invalid address '{}'", addr)))
            }
        };
        let len: u8 = record
            .get(1)
            .and_then(|l| l.parse().ok())
            .ok_or_else(|| invalid("missing or invalid length".into()))?;
        let asn: u32 = record
            .get(2)
            .and_then(|a| a.trim_start_matches("AS").parse().ok())
            .ok_or_else(|| invalid("missing or invalid origin AS".into()))?;

        let prefix =
            NetPrefix::new(addr, len).map_err(|e| invalid(e.to_string()))?;
        collector.push(prefix, || RouteMeta::OriginAs(asn));
    }

    Ok(collector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_after_header() -> Result<(), InputError> {
        let data = "prefix,len,asn\n\
                    1.0.0.0,24,13335\n\
                    2001:db8::,32,AS64496\n\
                    1.0.0.0,24,1\n\
                    1.0.4.0 , 22 , 38803\n";
        let records = read(data.as_bytes(), FamilyFilter::All)?;
        let got: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            got,
            vec![
                "1.0.0.0/24 AS13335",
                "2001:db8::/32 AS64496",
                "1.0.4.0/22 AS38803"
            ]
        );
        Ok(())
    }

    #[test]
    fn invalid_rows_are_fatal() {
        let data = "1.0.0.0,24,13335\n1.0.1.0,33,13335\n";
        assert!(matches!(
            read(data.as_bytes(), FamilyFilter::Ipv4),
            Err(InputError::Record { line: 2, .. })
        ));

        let data = "1.0.0.0,24,13335\nnot-an-address,24,1\n";
        assert!(read(data.as_bytes(), FamilyFilter::Ipv4).is_err());
    }

    #[test]
    fn missing_file() {
        let err = load(Path::new("/nonexistent/rib.csv"), FamilyFilter::All);
        assert!(matches!(err, Err(InputError::Open { .. })));
    }
}

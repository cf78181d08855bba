mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::fs;
    use std::path::PathBuf;

    use log::info;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rib_bench::backends::BackendKind;
    use rib_bench::bench::{BenchConfig, BenchContext};
    use rib_bench::input::{load_prefixes, FamilyFilter, InputFormat, LoadOptions};
    use rib_bench::stats::Phase;
    use rib_bench::test_types::ipv4_slash24s;
    use rib_bench::NetPrefix;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rib-bench-{}-{}", std::process::id(), name))
    }

    #[test]
    fn full_run_over_100k_slash24s() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let mut records = ipv4_slash24s(100_000);
        records.shuffle(&mut StdRng::seed_from_u64(42));
        let mut ctx = BenchContext::new(&records, BenchConfig::default());

        ctx.insert_phase()?;
        let absent: NetPrefix = "1.0.0.0/23".parse()?;
        let beyond: NetPrefix = "200.0.0.0/24".parse()?;
        for store in ctx.stores() {
            assert_eq!(store.len(), 100_000, "{}", store.kind());
            assert!(store.lookup(&absent).is_none());
            assert!(store.lookup(&beyond).is_none());
            for record in records.iter().step_by(997) {
                let found = store.lookup(&record.prefix);
                assert_eq!(found.map(|r| r.meta), Some(record.meta));
            }
        }

        let lookups = ctx.lookup_phase();
        let walks = ctx.walk_phase()?;
        let deletes = ctx.delete_phase()?;
        for store in ctx.stores() {
            assert_eq!(store.len(), 0, "{}", store.kind());
            assert!(store.lookup(&records[0].prefix).is_none());
        }
        for timings in [lookups, walks, deletes] {
            assert_eq!(timings.len(), BackendKind::ALL.len());
            assert!(timings.iter().all(|t| t.ns_per_op >= 0.0));
        }
        Ok(())
    }

    #[test]
    fn report_lists_every_phase_and_backend() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let records = ipv4_slash24s(500);
        let config = BenchConfig {
            repetitions: 2,
            backends: vec![BackendKind::CritBit, BackendKind::IntKeyMap],
            ..Default::default()
        };
        let report = BenchContext::new(&records, config).run()?;
        let text = report.to_string();
        info!("{}", text);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 * 3 + 2);
        assert_eq!(lines[0], "INSERT");
        assert!(lines[1].starts_with("critbit insert "));
        assert!(lines[2].starts_with("int key map insert "));
        assert_eq!(lines[3], "LOOKUP");
        assert_eq!(lines[6], "WALK");
        assert_eq!(lines[9], "DELETE");
        assert!(lines[1..12]
            .iter()
            .filter(|l| !l.chars().all(|c| c.is_ascii_uppercase()))
            .all(|l| l.ends_with(" ns/op") && l.len() >= 30 + 10 + 6));
        assert_eq!(lines[12], "");
        assert_eq!(lines[13], "the number of prefixes = 500");

        assert!(report.get(Phase::Walk, BackendKind::CritBit).is_some());
        assert!(report.get(Phase::Walk, BackendKind::ByteKeyMap).is_none());
        Ok(())
    }

    #[test]
    fn csv_dump_to_report_and_snapshot() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let dump = scratch_file("dump.csv");
        let snapshot = scratch_file("snapshot.json");
        fs::write(
            &dump,
            "prefix,len,asn\n\
             1.0.0.0,24,13335\n\
             1.0.4.0,22,38803\n\
             2001:db8::,32,64496\n\
             1.0.0.0,24,13335\n\
             8.8.8.0,24,15169\n",
        )?;

        let options = LoadOptions {
            format: None,
            family: FamilyFilter::All,
        };
        let records = load_prefixes(&dump, &options)?;
        assert_eq!(records.len(), 4);

        let config = BenchConfig {
            snapshot: Some(snapshot.clone()),
            ..Default::default()
        };
        let report = BenchContext::new(&records, config).run()?;
        assert_eq!(report.prefixes, 4);
        assert_eq!(report.unsupported, vec![(BackendKind::IntKeyMap, 1)]);
        assert!(report
            .to_string()
            .contains("int key map: 1 unsupported prefixes skipped"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&snapshot)?)?;
        let backends = json["backends"].as_array().map(|b| b.len());
        assert_eq!(backends, Some(BackendKind::ALL.len()));
        assert_eq!(json["backends"][0]["backend"], "byte_key_map");

        let report = serde_json::to_value(&report)?;
        assert_eq!(report["timings"].as_array().map(|t| t.len()), Some(20));

        let v4_only = load_prefixes(
            &dump,
            &LoadOptions {
                format: Some(InputFormat::Csv),
                ..Default::default()
            },
        )?;
        assert_eq!(v4_only.len(), 3);

        fs::remove_file(dump)?;
        fs::remove_file(snapshot)?;
        Ok(())
    }

    #[cfg(not(feature = "mrt"))]
    #[test]
    fn mrt_needs_the_feature() {
        let options = LoadOptions::default();
        let err = load_prefixes(&scratch_file("rib.mrt"), &options);
        assert!(matches!(
            err,
            Err(rib_bench::errors::InputError::FormatUnavailable("mrt"))
        ));
    }

    #[cfg(feature = "mrt")]
    #[test]
    fn missing_mrt_dump_is_an_open_error() {
        let options = LoadOptions::default();
        let err = load_prefixes(&scratch_file("missing.mrt"), &options);
        assert!(matches!(
            err,
            Err(rib_bench::errors::InputError::Open { .. })
        ));
    }
}

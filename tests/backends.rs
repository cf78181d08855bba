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
    use std::collections::HashSet;
    use std::error::Error;

    use log::trace;
    use rib_bench::backends::{
        BackendKind, ImmutableRadixTrie, PrefixStore, StorageBackend,
    };
    use rib_bench::keys::{ByteKey, ByteKeyEncoder, KeyEncoder};
    use rib_bench::test_types::{NoMeta, PrefixAs};
    use rib_bench::{NetPrefix, PrefixRecord};

    fn records(prefixes: &[&str]) -> Result<Vec<PrefixRecord<NoMeta>>, Box<dyn Error>> {
        let mut records = vec![];
        for p in prefixes {
            records.push(PrefixRecord::new(p.parse()?, NoMeta::Empty));
        }
        Ok(records)
    }

    fn walked<'a, M>(
        store: &dyn PrefixStore<&'a PrefixRecord<M>>,
    ) -> Vec<NetPrefix> {
        let mut prefixes = vec![];
        store.walk(&mut |r| prefixes.push(r.prefix));
        prefixes
    }

    #[test]
    fn ordered_backends_walk_in_address_order() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let input = records(&["10.0.0.0/24", "10.0.1.0/24", "1.0.0.0/24"])?;
        let expected: Vec<NetPrefix> = ["1.0.0.0/24", "10.0.0.0/24", "10.0.1.0/24"]
            .iter()
            .map(|p| p.parse())
            .collect::<Result<_, _>>()?;

        for kind in [
            BackendKind::MutableRadix,
            BackendKind::ImmutableRadix,
            BackendKind::CritBit,
        ] {
            let mut store = kind.build();
            for r in &input {
                assert!(store.insert(&r.prefix, r));
            }
            let got = walked(&*store);
            trace!("{}: {:?}", kind, got);
            assert_eq!(got, expected, "{}", kind);
        }
        Ok(())
    }

    #[test]
    fn ordered_walk_puts_shorter_prefixes_first() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let input = records(&["10.0.0.0/9", "10.0.0.0/8", "0.0.0.0/0", "10.128.0.0/9"])?;
        for kind in [BackendKind::MutableRadix, BackendKind::CritBit] {
            let mut store = kind.build();
            for r in &input {
                store.insert(&r.prefix, r);
            }
            // A prefix sorts before its more specifics.
            let got: Vec<String> =
                walked(&*store).iter().map(|p| p.to_string()).collect();
            assert_eq!(
                got,
                vec!["0.0.0.0/0", "10.0.0.0/8", "10.0.0.0/9", "10.128.0.0/9"],
                "{}",
                kind
            );
        }
        Ok(())
    }

    #[test]
    fn walks_visit_every_entry_once() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let mut input = vec![];
        for i in 0..2_000u32 {
            let len = 8 + (i % 25) as u8;
            let addr = std::net::Ipv4Addr::from(i.wrapping_mul(0x9e37_79b9));
            input.push(PrefixRecord::new(
                NetPrefix::new(addr.into(), len)?,
                PrefixAs(i),
            ));
        }
        let distinct: HashSet<NetPrefix> = input.iter().map(|r| r.prefix).collect();

        for kind in BackendKind::ALL {
            let mut store = kind.build();
            for (i, r) in input.iter().enumerate() {
                store.insert(&r.prefix, r);
                if i % 500 == 0 {
                    assert_eq!(walked(&*store).len(), store.len());
                }
            }
            assert_eq!(store.len(), distinct.len(), "{}", kind);

            let visited = walked(&*store);
            let unique: HashSet<NetPrefix> = visited.iter().copied().collect();
            assert_eq!(visited.len(), store.len(), "{}", kind);
            assert_eq!(unique, distinct, "{}", kind);

            for r in input.iter().step_by(2) {
                store.delete(&r.prefix);
            }
            let visited = walked(&*store);
            let unique: HashSet<NetPrefix> = visited.iter().copied().collect();
            assert_eq!(visited.len(), store.len(), "{}", kind);
            assert_eq!(unique.len(), visited.len(), "{}", kind);
        }
        Ok(())
    }

    #[test]
    fn mixed_families_do_not_alias() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let input = records(&[
            "0.0.0.0/0",
            "::/0",
            "192.0.2.0/24",
            "2001:db8::/32",
            "2001:db8:1::/48",
            "::ffff:192.0.2.0/120",
        ])?;

        for kind in BackendKind::ALL {
            let mut store = kind.build();
            let mut supported = 0;
            for r in &input {
                let stored = store.insert(&r.prefix, r);
                assert_eq!(stored, store.supports(&r.prefix));
                supported += stored as usize;
            }
            match kind {
                BackendKind::IntKeyMap => assert_eq!(supported, 2),
                _ => assert_eq!(supported, input.len(), "{}", kind),
            }
            assert_eq!(store.len(), supported, "{}", kind);

            for r in &input {
                let found = store.lookup(&r.prefix);
                if r.prefix.family() == rib_bench::Family::Ipv6
                    && kind == BackendKind::IntKeyMap
                {
                    assert!(found.is_none());
                } else {
                    assert!(
                        found.is_some_and(|f| std::ptr::eq(*f, r)),
                        "{} {}",
                        kind,
                        r.prefix
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn immutable_root_survives_delete() -> Result<(), Box<dyn Error>> {
        crate::common::init();

        let mut trie: ImmutableRadixTrie<ByteKey, usize> = ImmutableRadixTrie::new();
        let prefixes: Vec<NetPrefix> = ["10.0.0.0/8", "10.1.0.0/16", "2001:db8::/32"]
            .iter()
            .map(|p| p.parse())
            .collect::<Result<_, _>>()?;
        let keys: Vec<_> = prefixes
            .iter()
            .filter_map(ByteKeyEncoder::encode)
            .collect();
        for (i, key) in keys.iter().enumerate() {
            trie.insert(*key, i);
        }

        let before = trie.clone();
        assert!(trie.delete(&keys[1]));
        assert!(trie.delete(&keys[2]));

        assert_eq!(trie.get(&keys[1]), None);
        assert_eq!(trie.len(), 1);
        assert_eq!(before.len(), 3);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(before.get(key), Some(&i));
        }
        let walked: Vec<usize> = before.walk().map(|(_, v)| *v).collect();
        assert_eq!(walked, vec![0, 1, 2]);
        Ok(())
    }
}

use std::collections::{BTreeMap, BTreeSet};

use fsindex_common::error::ErrorKind;

use crate::{ExternalSorter, Group, SorterKind, SorterOptions};

fn create_options() -> Vec<SorterOptions> {
    SorterKind::ALL
        .into_iter()
        .map(|kind| SorterOptions {
            kind,
            // Small enough that the spill store writes several runs.
            memory_budget: 4096,
            ..Default::default()
        })
        .collect()
}

fn drain(sorter: &mut ExternalSorter) -> Vec<Group> {
    sorter
        .finalize()
        .expect("finalize")
        .collect::<Result<Vec<_>, _>>()
        .expect("groups")
}

fn test_grouping_scenario_impl(options: &SorterOptions) {
    let mut sorter = ExternalSorter::with_options(options).unwrap();
    let pairs: [(&[u8], u64); 5] = [
        (&b"cat"[..], 1),
        (&b"dog"[..], 2),
        (&b"cat"[..], 5),
        (&b"dog"[..], 5),
        (&b"cat"[..], 5),
    ];
    for (term, doc) in pairs {
        sorter.insert(term, Some(&doc.to_be_bytes()[..])).unwrap();
    }
    assert_eq!(sorter.inserted(), 5);
    let groups = drain(&mut sorter);
    let be = |v: u64| v.to_be_bytes().to_vec();
    assert_eq!(
        groups,
        vec![
            Group {
                key: b"cat".to_vec(),
                values: vec![be(1), be(5)],
            },
            Group {
                key: b"dog".to_vec(),
                values: vec![be(2), be(5)],
            },
        ],
        "sorter {}",
        options.kind
    );
}

#[test]
fn test_grouping_scenario() {
    for options in create_options() {
        test_grouping_scenario_impl(&options);
    }
}

fn test_random_pairs_impl(options: &SorterOptions) {
    let mut rng = fastrand::Rng::with_seed(11);
    let mut expected: BTreeMap<Vec<u8>, BTreeSet<u64>> = BTreeMap::new();
    let mut sorter = ExternalSorter::with_options(options).unwrap();
    for _ in 0..5000 {
        let len = rng.usize(0..4);
        // Include zero bytes so that key escaping is exercised.
        let term: Vec<u8> = (0..len).map(|_| rng.u8(0..4)).collect();
        let doc = rng.u64(0..300);
        expected.entry(term.clone()).or_default().insert(doc);
        sorter.insert(&term, Some(&doc.to_be_bytes()[..])).unwrap();
    }
    let groups = drain(&mut sorter);
    let actual: BTreeMap<Vec<u8>, BTreeSet<u64>> = groups
        .iter()
        .map(|g| {
            let docs = g
                .values
                .iter()
                .map(|v| u64::from_be_bytes(v.as_slice().try_into().unwrap()))
                .collect();
            (g.key.clone(), docs)
        })
        .collect();
    assert_eq!(actual, expected, "sorter {}", options.kind);

    let keys: Vec<&Vec<u8>> = groups.iter().map(|g| &g.key).collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    for group in &groups {
        assert!(group.values.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_random_pairs() {
    for options in create_options() {
        test_random_pairs_impl(&options);
    }
}

#[test]
fn test_very_long_terms() {
    let long_a = vec![b'a'; 70_000];
    let mut long_b = long_a.clone();
    long_b.push(b'b');
    for options in create_options() {
        let mut sorter = ExternalSorter::with_options(&options).unwrap();
        sorter.insert(&long_b, Some(&b"2"[..])).unwrap();
        sorter.insert(&long_a, Some(&b"9"[..])).unwrap();
        sorter.insert(b"b", Some(&b"1"[..])).unwrap();
        sorter.insert(&long_a, Some(&b"3"[..])).unwrap();
        sorter.insert(&long_a, Some(&b"9"[..])).unwrap();
        let groups = drain(&mut sorter);
        assert_eq!(
            groups,
            vec![
                Group {
                    key: long_a.clone(),
                    values: vec![b"3".to_vec(), b"9".to_vec()],
                },
                Group {
                    key: long_b.clone(),
                    values: vec![b"2".to_vec()],
                },
                Group {
                    key: b"b".to_vec(),
                    values: vec![b"1".to_vec()],
                },
            ],
            "sorter {}",
            options.kind
        );
    }
}

#[test]
fn test_keys_without_values() {
    for options in create_options() {
        let mut sorter = ExternalSorter::with_options(&options).unwrap();
        sorter.insert(b"b", None).unwrap();
        sorter.insert(b"a", None).unwrap();
        sorter.insert(b"b", Some(&b"x"[..])).unwrap();
        let groups = drain(&mut sorter);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].values.is_empty());
        assert_eq!(groups[1].values, vec![b"x".to_vec()]);
    }
}

#[test]
fn test_ingest_after_drain() {
    for options in create_options() {
        let mut sorter = ExternalSorter::with_options(&options).unwrap();
        sorter.insert(b"a", Some(&b"1"[..])).unwrap();
        assert!(!sorter.is_drained());
        assert_eq!(drain(&mut sorter).len(), 1);
        assert!(sorter.is_drained());

        let err = sorter.insert(b"b", None).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::IngestAfterDrain));
        assert!(err.is_contract_violation());
        assert!(matches!(
            sorter.finalize().err().unwrap().kind(),
            ErrorKind::IngestAfterDrain
        ));
    }
}

#[test]
fn test_empty_drain() {
    for options in create_options() {
        let mut sorter = ExternalSorter::with_options(&options).unwrap();
        assert!(drain(&mut sorter).is_empty());
    }
}

#[test]
fn test_options_from_json() {
    let options: SorterOptions =
        serde_json::from_str(r#"{ "kind": "spill", "pivot": "tukey-ninther" }"#).unwrap();
    assert_eq!(options.kind, SorterKind::Spill);
    assert_eq!(options.pivot, crate::PivotSelector::TukeyNinther);
    assert_eq!(options.cutoff, SorterOptions::default().cutoff);
    assert_eq!("FJALL".parse::<SorterKind>().unwrap(), SorterKind::Fjall);
}

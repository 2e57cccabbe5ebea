use std::collections::{BTreeMap, BTreeSet};

use fsindex::{BuildOptions, DocId, Index, IndexBuilder, build};
use fsindex_common::error::ErrorKind;
use fsindex_fsas::{Backend, StoreOptions};
use fsindex_intersect::Strategy;
use fsindex_sort::{SorterKind, SorterOptions};
use fsindex_testkit::data_gen::posting_pairs;

fn create_build_options() -> Vec<BuildOptions> {
    let mut options = Vec::new();
    for backend in Backend::ALL {
        for kind in SorterKind::ALL {
            options.push(BuildOptions {
                store: StoreOptions::with_backend(backend),
                sorter: SorterOptions {
                    kind,
                    memory_budget: 16 * 1024,
                    ..Default::default()
                },
                min_frequency: 0,
            });
        }
    }
    options
}

fn scenario_pairs() -> Vec<(&'static str, DocId)> {
    vec![("cat", 1), ("dog", 2), ("cat", 5), ("dog", 5), ("cat", 5)]
}

fn test_scenario_impl(options: &BuildOptions) {
    let dir = tempfile::tempdir().unwrap();
    let (index, stats) = build(dir.path(), scenario_pairs(), options.clone()).unwrap();
    assert_eq!(stats.pairs, 5);
    assert_eq!(stats.terms, 2);
    assert_eq!(stats.postings, 4);

    let cat = index.lookup(b"cat").unwrap().unwrap();
    assert_eq!(index.postings(&cat).unwrap().as_slice(), &[1, 5]);
    let dog = index.lookup(b"dog").unwrap().unwrap();
    assert_eq!(index.postings(&dog).unwrap().as_slice(), &[2, 5]);
    assert!(index.lookup(b"cow").unwrap().is_none());

    assert_eq!(index.query(&["cat", "dog"]).unwrap(), vec![5]);
    assert_eq!(index.query(&["cat"]).unwrap(), vec![1, 5]);
    assert_eq!(index.query(&["cat", "cat", "dog"]).unwrap(), vec![5]);
    assert!(index.query(&["cat", "cow"]).unwrap().is_empty());
    assert!(index.query::<&str>(&[]).unwrap().is_empty());
}

#[test]
fn test_scenario() {
    for options in create_build_options() {
        test_scenario_impl(&options);
    }
}

fn reference_index(pairs: &[(String, DocId)]) -> BTreeMap<Vec<u8>, BTreeSet<DocId>> {
    let mut map: BTreeMap<Vec<u8>, BTreeSet<DocId>> = BTreeMap::new();
    for (term, doc) in pairs {
        map.entry(term.as_bytes().to_vec()).or_default().insert(*doc);
    }
    map
}

fn test_dictionary_correctness_impl(options: &BuildOptions) {
    let mut rng = fastrand::Rng::with_seed(31);
    let pairs = posting_pairs(&mut rng, 200, 2000, 20_000);
    let expected = reference_index(&pairs);

    let dir = tempfile::tempdir().unwrap();
    let (index, stats) = build(
        dir.path(),
        pairs.iter().map(|(t, d)| (t.as_str(), *d)),
        options.clone(),
    )
    .unwrap();
    assert_eq!(stats.terms as usize, expected.len());

    let terms: Vec<Vec<u8>> = index.terms().map(|r| r.unwrap().0).collect();
    assert_eq!(terms, expected.keys().cloned().collect::<Vec<_>>());

    for (term, docs) in &expected {
        let result = index.query(&[term.as_slice()]).unwrap();
        assert!(result.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(result, docs.iter().copied().collect::<Vec<_>>());
    }

    let terms: Vec<&Vec<u8>> = expected.keys().take(3).collect();
    let reference: BTreeSet<DocId> = expected[terms[0]]
        .intersection(&expected[terms[1]])
        .copied()
        .filter(|d| expected[terms[2]].contains(d))
        .collect();
    let query: Vec<&[u8]> = terms.iter().map(|t| t.as_slice()).collect();
    for strategy in Strategy::ALL {
        assert_eq!(
            index.query_with(&query, strategy).unwrap(),
            reference.iter().copied().collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_dictionary_correctness() {
    for options in create_build_options() {
        test_dictionary_correctness_impl(&options);
    }
}

#[test]
fn test_reopen_round_trip() {
    let mut rng = fastrand::Rng::with_seed(4);
    let pairs = posting_pairs(&mut rng, 50, 500, 3000);
    let dir = tempfile::tempdir().unwrap();
    let queries: Vec<Vec<String>> = vec![
        vec!["t00000".into()],
        vec!["t00000".into(), "t00001".into()],
        vec!["t00002".into(), "t00003".into(), "t00004".into()],
    ];

    let before: Vec<Vec<DocId>> = {
        let (index, _) = build(dir.path(), pairs.iter().cloned(), BuildOptions::default()).unwrap();
        queries.iter().map(|q| index.query(q).unwrap()).collect()
    };

    for backend in Backend::ALL {
        let index = Index::open(dir.path(), &StoreOptions::with_backend(backend)).unwrap();
        let after: Vec<Vec<DocId>> = queries.iter().map(|q| index.query(q).unwrap()).collect();
        assert_eq!(after, before, "backend {backend}");
        assert_eq!(index.manifest().stats.pairs, 3000);
    }
}

#[test]
fn test_build_into_existing_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), scenario_pairs(), BuildOptions::default()).unwrap();
    let err = IndexBuilder::new(dir.path(), BuildOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_open_detects_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    build(dir.path(), scenario_pairs(), BuildOptions::default()).unwrap();

    let manifest_path = dir.path().join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path).unwrap();
    let mut manifest: serde_json::Value = serde_json::from_str(&json).unwrap();
    manifest["postings"]["len"] = serde_json::json!(99);
    std::fs::write(&manifest_path, manifest.to_string()).unwrap();

    let err = Index::open(dir.path(), &StoreOptions::default()).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::SchemaMismatch { .. }));
}

#[test]
fn test_min_frequency() {
    let dir = tempfile::tempdir().unwrap();
    let options = BuildOptions {
        min_frequency: 2,
        sorter: SorterOptions::with_kind(SorterKind::Memory),
        ..Default::default()
    };
    let pairs = vec![("rare", 1), ("common", 1), ("common", 2), ("rare", 1)];
    let (index, stats) = build(dir.path(), pairs, options).unwrap();
    assert_eq!(stats.terms, 1);
    assert_eq!(stats.terms_dropped, 1);
    assert!(index.lookup(b"rare").unwrap().is_none());
    assert_eq!(index.query(&["common"]).unwrap(), vec![1, 2]);
}

#[test]
fn test_query_short_circuit_reads() {
    let dir = tempfile::tempdir().unwrap();
    let mut pairs: Vec<(&str, DocId)> = vec![("a", 1), ("a", 3), ("b", 2), ("b", 4), ("b", 6)];
    pairs.extend((0..100).map(|d| ("c", d)));
    pairs.extend((0..200).map(|d| ("d", d)));
    let (index, _) = build(dir.path(), pairs, BuildOptions::default()).unwrap();

    let before = index.posting_reads();
    assert!(index.query(&["d", "c", "b", "a"]).unwrap().is_empty());
    // "a" and "b" intersect to nothing, so "c" and "d" are never read.
    assert_eq!(index.posting_reads() - before, 2);
}

#[test]
fn test_concurrent_queries() {
    let mut rng = fastrand::Rng::with_seed(8);
    let pairs = posting_pairs(&mut rng, 30, 1000, 5000);
    let expected = reference_index(&pairs);
    let dir = tempfile::tempdir().unwrap();
    let (index, _) = build(dir.path(), pairs, BuildOptions::default()).unwrap();

    std::thread::scope(|s| {
        for t in 0..4 {
            let index = &index;
            let expected = &expected;
            s.spawn(move || {
                for (i, (term, docs)) in expected.iter().enumerate() {
                    if i % 4 != t {
                        continue;
                    }
                    let result = index.query(&[term.as_slice()]).unwrap();
                    assert_eq!(result, docs.iter().copied().collect::<Vec<_>>());
                }
            });
        }
    });
}

#[test]
fn test_query_to_store_and_zero_copy() {
    let dir = tempfile::tempdir().unwrap();
    let (index, _) = build(dir.path(), scenario_pairs(), BuildOptions::default()).unwrap();
    let cat = index.lookup(b"cat").unwrap().unwrap();
    if cfg!(target_endian = "little") {
        assert!(index.postings(&cat).unwrap().is_zero_copy());
    }

    let out = dir.path().join("result.fsas");
    let written = index
        .query_to_store(&["cat", "dog"], Strategy::Adaptive, &out)
        .unwrap();
    assert_eq!(written, 1);
    let store = fsindex_fsas::open_with_width(&out, 8, &StoreOptions::default()).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.read(0).unwrap().as_ref(), &5u64.to_le_bytes());

    let err = index
        .query_to_store(&["cat"], Strategy::Adaptive, &out)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_export_delta() {
    let mut rng = fastrand::Rng::with_seed(12);
    let pairs = posting_pairs(&mut rng, 40, 10_000, 8000);
    let dir = tempfile::tempdir().unwrap();
    let (index, _) = build(dir.path(), pairs, BuildOptions::default()).unwrap();

    let coded = index.export_delta().unwrap();
    assert_eq!(coded.list_count() as u64, index.term_count());
    assert_eq!(coded.id_count(), index.posting_count());
    for i in 0..index.term_count() {
        let entry = index.entry(i).unwrap();
        assert_eq!(
            coded.decode_list(i as usize).unwrap(),
            index.postings(&entry).unwrap().into_vec()
        );
    }
}

#[test]
fn test_index_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Index>();
}

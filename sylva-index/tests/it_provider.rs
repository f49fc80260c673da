//! Provider integration tests: layout selection, read-only gating, failure
//! retrieval, and end-to-end populate-then-serve against real files.

use std::sync::Arc;
use sylva_index::{
    IndexDescriptor, IndexEntry, IndexError, IndexId, IndexSamplingConfig, IndexState,
    NumberIndexProvider, NumberLayout, ProviderConfig, Support,
};
use sylva_tree::{CleanupScheduler, TreeSpec, TreeWriter};
use tempfile::TempDir;

fn provider_at(dir: &TempDir, read_only: bool) -> (NumberIndexProvider, Arc<CleanupScheduler>) {
    let cleanup = Arc::new(CleanupScheduler::new());
    let provider = NumberIndexProvider::new(
        dir.path(),
        Arc::clone(&cleanup),
        ProviderConfig { read_only },
    );
    (provider, cleanup)
}

fn populate(
    provider: &NumberIndexProvider,
    id: IndexId,
    descriptor: &IndexDescriptor,
    entries: &[(f64, u64)],
) {
    let mut populator = provider
        .populator(id, descriptor, IndexSamplingConfig::default())
        .expect("populator");
    populator.create().expect("create");
    for (value, entity) in entries {
        populator.add(IndexEntry::new(*value, *entity).expect("finite value"));
    }
    populator.close(true).expect("close").expect("sample");
}

#[test]
fn populator_and_accessor_select_identical_layouts() {
    for descriptor in [IndexDescriptor::general(7), IndexDescriptor::unique(7)] {
        let dir = TempDir::new().unwrap();
        let (provider, _) = provider_at(&dir, false);
        let id = IndexId::new(1);

        let mut populator = provider
            .populator(id, &descriptor, IndexSamplingConfig::default())
            .unwrap();
        let populator_tag = populator.layout_tag();
        populator.create().unwrap();
        populator.close(true).unwrap();

        let accessor = provider
            .accessor(id, &descriptor, IndexSamplingConfig::default())
            .unwrap();
        // Same (identifier, major, minor) chosen on both paths, and the
        // on-disk header agrees.
        assert_eq!(accessor.layout_tag(), populator_tag);
        assert_eq!(accessor.layout().tag(), populator_tag);
    }
}

#[test]
fn read_only_provider_refuses_populators_for_every_kind() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, true);
    for descriptor in [IndexDescriptor::general(1), IndexDescriptor::unique(1)] {
        let err = provider
            .populator(IndexId::new(1), &descriptor, IndexSamplingConfig::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::ReadOnly));
    }
}

#[test]
fn unknown_kind_code_is_unsupported_on_both_paths() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let descriptor = IndexDescriptor::with_kind_code(1, 9);

    let err = provider
        .populator(IndexId::new(1), &descriptor, IndexSamplingConfig::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::UnsupportedKind(9)));

    let err = provider
        .accessor(IndexId::new(1), &descriptor, IndexSamplingConfig::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::UnsupportedKind(9)));
}

#[test]
fn population_failure_without_stored_message_is_no_failure_recorded() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let id = IndexId::new(3);
    populate(&provider, id, &IndexDescriptor::general(1), &[(1.0, 10)]);

    let err = provider.population_failure(id).unwrap_err();
    assert!(matches!(err, IndexError::NoFailureRecorded(failed) if failed == id));
}

#[test]
fn population_failure_returns_stored_message_verbatim() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let id = IndexId::new(4);

    let mut populator = provider
        .populator(id, &IndexDescriptor::unique(1), IndexSamplingConfig::default())
        .unwrap();
    populator.create().unwrap();
    populator.mark_failed("disk full");
    assert!(populator.close(false).unwrap().is_none());

    assert_eq!(provider.population_failure(id).unwrap(), "disk full");
}

#[test]
fn failure_close_over_crashed_file_rewrites_header_in_place() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let id = IndexId::new(12);
    let descriptor = IndexDescriptor::general(1);

    // An earlier populator created the file and crashed before closing.
    let mut crashed = provider
        .populator(id, &descriptor, IndexSamplingConfig::default())
        .unwrap();
    crashed.create().unwrap();
    drop(crashed);

    // A fresh populator records the failure without reopening a writer.
    let mut populator = provider
        .populator(id, &descriptor, IndexSamplingConfig::default())
        .unwrap();
    populator.mark_failed("page cache exhausted");
    populator.close(false).unwrap();

    assert_eq!(
        provider.population_failure(id).unwrap(),
        "page cache exhausted"
    );
    // Header fields from the original creation survive the rewrite.
    let header = sylva_tree::read_header(&provider.files().path(id)).unwrap();
    assert_eq!(header.layout, NumberLayout::NonUnique.tag());
}

#[test]
fn population_failure_on_missing_file_is_environment() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let err = provider.population_failure(IndexId::new(99)).unwrap_err();
    assert!(matches!(err, IndexError::Environment(_)));
}

#[test]
fn population_failure_on_foreign_layout_is_environment() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let id = IndexId::new(5);

    // A tree file built by some other index family: valid header, but a
    // layout triple no registered layout matches.
    let alien = TreeSpec {
        tag: sylva_tree::LayoutTag {
            identifier: 0xDEAD,
            major: 9,
            minor: 9,
        },
        key_width: 4,
        payload_width: 0,
        unique: false,
    };
    TreeWriter::create(&provider.files().path(id), alien)
        .unwrap()
        .finish()
        .unwrap();

    let err = provider.population_failure(id).unwrap_err();
    assert!(matches!(err, IndexError::Environment(_)));
}

#[test]
fn accessor_on_missing_file_is_storage_open_failure() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let err = provider
        .accessor(
            IndexId::new(8),
            &IndexDescriptor::general(1),
            IndexSamplingConfig::default(),
        )
        .unwrap_err();
    assert!(matches!(err, IndexError::StorageOpen(_)));
}

#[test]
fn lifecycle_hooks_are_explicitly_unsupported() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    assert_eq!(
        provider.initial_state(IndexId::new(1), &IndexDescriptor::general(1)),
        Support::<IndexState>::Unsupported
    );
    assert_eq!(provider.migration_participant(), Support::Unsupported);
}

#[test]
fn unique_index_serves_point_and_range_lookups() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let id = IndexId::new(1);
    let descriptor = IndexDescriptor::unique(1);
    populate(
        &provider,
        id,
        &descriptor,
        &[(3.5, 30), (-2.0, 20), (10.0, 40)],
    );

    let accessor = provider
        .accessor(id, &descriptor, IndexSamplingConfig::default())
        .unwrap();
    assert_eq!(accessor.len(), 3);
    assert_eq!(accessor.lookup(3.5).unwrap(), vec![30]);
    assert_eq!(accessor.lookup(4.0).unwrap(), Vec::<u64>::new());
    assert_eq!(accessor.range(-2.0, 3.5).unwrap(), vec![20, 30]);
}

#[test]
fn general_index_keeps_duplicate_values_ordered_by_entity() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let id = IndexId::new(2);
    let descriptor = IndexDescriptor::general(1);
    populate(
        &provider,
        id,
        &descriptor,
        &[(5.0, 300), (5.0, 100), (5.0, 200), (1.0, 400)],
    );

    let accessor = provider
        .accessor(id, &descriptor, IndexSamplingConfig::default())
        .unwrap();
    assert_eq!(accessor.lookup(5.0).unwrap(), vec![100, 200, 300]);
    assert_eq!(accessor.range(0.0, 9.0).unwrap(), vec![400, 100, 200, 300]);
}

#[test]
fn unique_index_rejects_duplicate_value_at_populate() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let mut populator = provider
        .populator(
            IndexId::new(6),
            &IndexDescriptor::unique(1),
            IndexSamplingConfig::default(),
        )
        .unwrap();
    populator.create().unwrap();
    populator.add(IndexEntry::new(7.0, 1).unwrap());
    populator.add(IndexEntry::new(7.0, 2).unwrap());
    assert!(populator.close(true).is_err());
}

#[test]
fn dirty_file_opens_empty_and_schedules_cleanup() {
    let dir = TempDir::new().unwrap();
    let (provider, cleanup) = provider_at(&dir, false);
    let id = IndexId::new(7);
    let descriptor = IndexDescriptor::general(1);

    // Populator created the file but never closed: simulated crash.
    let mut populator = provider
        .populator(id, &descriptor, IndexSamplingConfig::default())
        .unwrap();
    populator.create().unwrap();
    drop(populator);

    let accessor = provider
        .accessor(id, &descriptor, IndexSamplingConfig::default())
        .unwrap();
    assert!(accessor.is_empty());
    assert_eq!(cleanup.pending(), 1);
    cleanup.run_all();
    assert_eq!(cleanup.pending(), 0);
}

#[test]
fn end_to_end_writable_then_read_only_over_same_directory() {
    let dir = TempDir::new().unwrap();
    let unique_descriptor = IndexDescriptor::unique(11);
    let general_descriptor = IndexDescriptor::general(12);
    let (id1, id2) = (IndexId::new(1), IndexId::new(2));

    {
        let (provider, _) = provider_at(&dir, false);

        let populator1 = provider
            .populator(id1, &unique_descriptor, IndexSamplingConfig::default())
            .unwrap();
        assert_eq!(populator1.layout(), NumberLayout::Unique);
        assert_eq!(populator1.path(), dir.path().join("1"));

        let populator2 = provider
            .populator(id2, &general_descriptor, IndexSamplingConfig::default())
            .unwrap();
        assert_eq!(populator2.layout(), NumberLayout::NonUnique);
        assert_eq!(populator2.path(), dir.path().join("2"));

        populate(&provider, id1, &unique_descriptor, &[(1.5, 1)]);
        populate(&provider, id2, &general_descriptor, &[(1.5, 1), (1.5, 2)]);
    }

    // Reconstruct read-only over the same directory.
    let (provider, _) = provider_at(&dir, true);
    let err = provider
        .populator(id1, &unique_descriptor, IndexSamplingConfig::default())
        .unwrap_err();
    assert!(matches!(err, IndexError::ReadOnly));

    let accessor = provider
        .accessor(id1, &unique_descriptor, IndexSamplingConfig::default())
        .unwrap();
    assert_eq!(accessor.lookup(1.5).unwrap(), vec![1]);
}

#[test]
fn sample_reports_indexed_and_unique_counts() {
    let dir = TempDir::new().unwrap();
    let (provider, _) = provider_at(&dir, false);
    let mut populator = provider
        .populator(
            IndexId::new(9),
            &IndexDescriptor::general(1),
            IndexSamplingConfig {
                sample_size_limit: 2,
            },
        )
        .unwrap();
    populator.create().unwrap();
    for (value, entity) in [(1.0, 1u64), (1.0, 2), (2.0, 3)] {
        populator.add(IndexEntry::new(value, entity).unwrap());
    }
    let sample = populator.close(true).unwrap().unwrap();
    assert_eq!(sample.indexed, 3);
    assert_eq!(sample.unique_values, 2);
    assert_eq!(sample.sample_size, 2);
}

// Delta diff fan-out against released packages

mod common;

use codepush_core::ExErrorKind;
use common::Harness;
use std::collections::BTreeMap;

fn tree(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_backfill_builds_changed_and_new_files() {
    // Given: A then B released to the same app version
    let h = Harness::new();
    let dep = h.deployment().await;
    let a = h
        .release_files(dep, "1.0", "a", &[("x.js", "1"), ("y.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2"), ("y.js", "1"), ("z.js", "1")])
        .await
        .unwrap();

    // When: B is diffed against its single predecessor
    let report = h.manager.backfill_diffs(b.id, 1).await.unwrap();

    // Then: one diff against A with the changed and new files
    assert_eq!(report.created.len(), 1);
    let diff = &report.created[0];
    assert_eq!(diff.package_id, b.id);
    assert_eq!(diff.diff_against_package_hash, a.package_hash);
    assert!(diff.diff_size > 0);

    assert_eq!(
        h.blob_entries(&diff.diff_blob_url),
        tree(&[
            ("hotcodepush.json", r#"{"deletedFiles":[]}"#),
            ("x.js", "2"),
            ("z.js", "1"),
        ])
    );
    assert_eq!(h.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_backfill_records_deletions_only() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1"), ("y.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2"), ("y.js", "1"), ("z.js", "1")])
        .await
        .unwrap();
    let c = h
        .release_files(dep, "1.0", "c", &[("y.js", "1")])
        .await
        .unwrap();

    let report = h.manager.backfill_diffs(c.id, 1).await.unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].diff_against_package_hash, b.package_hash);
    assert_eq!(
        h.blob_entries(&report.created[0].diff_blob_url),
        tree(&[("hotcodepush.json", r#"{"deletedFiles":["x.js","z.js"]}"#)])
    );
}

#[tokio::test]
async fn test_nested_paths_survive_the_delta() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("assets/img/logo.png", "old")])
        .await
        .unwrap();
    let b = h
        .release_files(
            dep,
            "1.0",
            "b",
            &[("assets/img/logo.png", "new"), ("assets/fonts/a.ttf", "f")],
        )
        .await
        .unwrap();

    let report = h.manager.backfill_diffs(b.id, 1).await.unwrap();

    assert_eq!(
        h.blob_entries(&report.created[0].diff_blob_url),
        tree(&[
            ("assets/fonts/a.ttf", "f"),
            ("assets/img/logo.png", "new"),
            ("hotcodepush.json", r#"{"deletedFiles":[]}"#),
        ])
    );
}

#[tokio::test]
async fn test_backfill_is_idempotent() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();

    let first = h.manager.backfill_diffs(b.id, 3).await.unwrap();
    let uploads = h.transport.upload_count();
    let second = h.manager.backfill_diffs(b.id, 3).await.unwrap();

    assert_eq!(first.created.len(), 1);
    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 1);
    assert_eq!(h.transport.upload_count(), uploads);
    assert_eq!(h.manager.list_package_diffs(b.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_backfills_record_one_row() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();

    let left = h.manager.clone();
    let right = h.manager.clone();
    let (l, r) = tokio::join!(left.backfill_diffs(b.id, 1), right.backfill_diffs(b.id, 1));
    l.unwrap();
    r.unwrap();

    let diffs = h.manager.list_package_diffs(b.id).await.unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(h.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_window_larger_than_history() {
    // Given: three packages in one version
    let h = Harness::new();
    let dep = h.deployment().await;
    let a = h
        .release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();
    let c = h
        .release_files(dep, "1.0", "c", &[("x.js", "3")])
        .await
        .unwrap();

    // When: the newest is backfilled with a window of five
    let report = h.manager.backfill_diffs(c.id, 5).await.unwrap();

    // Then: only the two real predecessors are diffed
    let mut against: Vec<_> = report
        .created
        .iter()
        .map(|d| d.diff_against_package_hash.clone())
        .collect();
    against.sort();
    let mut expected = vec![a.package_hash, b.package_hash];
    expected.sort();
    assert_eq!(against, expected);
}

#[tokio::test]
async fn test_window_limits_to_most_recent() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();
    let c = h
        .release_files(dep, "1.0", "c", &[("x.js", "3")])
        .await
        .unwrap();

    let report = h.manager.backfill_diffs(c.id, 1).await.unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].diff_against_package_hash, b.package_hash);
}

#[tokio::test]
async fn test_other_app_versions_are_not_predecessors() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "2.0", "b", &[("x.js", "2")])
        .await
        .unwrap();

    let report = h.manager.backfill_diffs(b.id, 3).await.unwrap();

    assert!(report.created.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(h.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_identical_predecessor_is_skipped() {
    let h = Harness::new();
    let dep = h.deployment().await;
    let a = h
        .release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    h.release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();
    // Rolling back to A's content is not a duplicate of B
    let c = h
        .release_files(dep, "1.0", "c", &[("x.js", "1")])
        .await
        .unwrap();
    assert_eq!(c.package_hash, a.package_hash);

    let report = h.manager.backfill_diffs(c.id, 2).await.unwrap();

    assert_eq!(report.created.len(), 1);
    assert_eq!(report.skipped, vec![a.package_hash.clone()]);
}

#[tokio::test]
async fn test_unknown_package_is_not_found() {
    let h = Harness::new();

    let err = h.manager.backfill_diffs(9999, 3).await.unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(h.transport.upload_count(), 0);
    assert_eq!(h.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_cold_store_downloads_from_blobs() {
    // Given: packages released through one manager
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1"), ("y.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2"), ("y.js", "1")])
        .await
        .unwrap();

    // When: a manager with an empty content store backfills
    let cold = h.cold_manager();
    let report = cold.backfill_diffs(b.id, 1).await.unwrap();

    // Then: content and manifests come from the blob transport
    assert_eq!(
        h.blob_entries(&report.created[0].diff_blob_url),
        tree(&[("hotcodepush.json", r#"{"deletedFiles":[]}"#), ("x.js", "2")])
    );
    assert!(cold.store().exists(&b.package_hash).await.unwrap());
}

#[tokio::test]
async fn test_upload_failure_records_nothing_and_cleans_up() {
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    h.release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();
    let c = h
        .release_files(dep, "1.0", "c", &[("x.js", "3")])
        .await
        .unwrap();
    h.transport.set_fail_uploads(true);

    let err = h.manager.backfill_diffs(c.id, 2).await.unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Network);
    assert!(h.manager.list_package_diffs(c.id).await.unwrap().is_empty());
    assert_eq!(h.leftover_sessions(), 0);

    // And: a later retry fills both diffs
    h.transport.set_fail_uploads(false);
    let report = h.manager.backfill_diffs(c.id, 2).await.unwrap();
    assert_eq!(report.created.len(), 2);
}

#[tokio::test]
async fn test_create_diff_packages_with_no_destinations() {
    let h = Harness::new();
    let dep = h.deployment().await;
    let a = h
        .release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let uploads = h.transport.upload_count();

    let report = h.manager.create_diff_packages(&a, &[]).await.unwrap();

    assert_eq!(report, Default::default());
    assert_eq!(h.transport.upload_count(), uploads);
}

#[tokio::test]
async fn test_rolled_back_content_in_window_is_diffed_once() {
    // Given: C rolls back to A's content, then D is released
    let h = Harness::new();
    let dep = h.deployment().await;
    let a = h
        .release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    h.release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();
    let c = h
        .release_files(dep, "1.0", "c", &[("x.js", "1")])
        .await
        .unwrap();
    assert_eq!(c.package_hash, a.package_hash);
    let d = h
        .release_files(dep, "1.0", "d", &[("x.js", "3")])
        .await
        .unwrap();
    let uploads = h.transport.upload_count();

    // When: the window covers both packages sharing a hash
    let report = h.manager.backfill_diffs(d.id, 3).await.unwrap();

    // Then: one diff per distinct predecessor content, one archive each
    let rows = h.manager.list_package_diffs(d.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(report.created.len(), rows.len());
    assert!(report.skipped.is_empty());
    assert_eq!(h.transport.upload_count(), uploads + 2);
}

#[tokio::test]
async fn test_cold_store_rejects_bundle_with_wrong_content() {
    // Given: the blob behind B's bundle key holds different content
    let h = Harness::new();
    let dep = h.deployment().await;
    h.release_files(dep, "1.0", "a", &[("x.js", "1")])
        .await
        .unwrap();
    let b = h
        .release_files(dep, "1.0", "b", &[("x.js", "2")])
        .await
        .unwrap();
    let forged = h.zip("forged", &[("x.js", "tampered")]);
    h.transport
        .insert(b.blob_url.clone(), std::fs::read(&forged).unwrap());
    let uploads = h.transport.upload_count();

    // When: a manager without local content backfills B
    let cold = h.cold_manager();
    let err = cold.backfill_diffs(b.id, 1).await.unwrap_err();

    // Then: nothing is built from the mismatched content
    assert_eq!(err.kind(), ExErrorKind::Storage);
    assert_eq!(err.entity_id(), Some(b.package_hash.as_str()));
    assert!(h.manager.list_package_diffs(b.id).await.unwrap().is_empty());
    assert_eq!(h.transport.upload_count(), uploads);
    assert_eq!(h.leftover_sessions(), 0);
}

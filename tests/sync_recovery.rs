mod common;

use common::mocks::FlakyRemote;
use common::{memory_config, sample_draft, seed_remote};
use field_sync::application::ports::local_store::LocalStore;
use field_sync::application::services::SyncService;
use field_sync::domain::entities::SyncResult;
use field_sync::domain::value_objects::LocalId;
use field_sync::infrastructure::cache::StaticPageSource;
use field_sync::infrastructure::database::StoreLocation;
use field_sync::infrastructure::offline::{SqliteLocalStore, SyncPass};
use field_sync::infrastructure::remote::InMemoryRemoteStore;
use field_sync::{AppConfig, AppState};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn failed_records_stay_queued_in_original_order() {
    let remote = Arc::new(FlakyRemote::new());
    let orders = [
        ("WO-1", "EQ-1"),
        ("WO-2", "EQ-2"),
        ("WO-3", "EQ-3"),
        ("WO-4", "EQ-4"),
        ("WO-5", "EQ-5"),
    ];
    seed_remote(&remote.inner, "CL-1", &orders, 0).await;
    remote.reject_work_order("WO-2");
    remote.reject_work_order("WO-4");

    let store = Arc::new(SqliteLocalStore::in_memory());
    let mut ids: Vec<LocalId> = Vec::new();
    for (order_id, equipment_id) in orders {
        ids.push(
            store
                .insert_pending(&sample_draft(order_id, equipment_id))
                .await
                .expect("insert"),
        );
    }
    let service = SyncService::new(
        store.clone(),
        remote.clone(),
        AppConfig::default().collections,
    );

    let result = service.sync_with_remote().await.expect("sync");

    assert_eq!(result, SyncResult::new(3, 2));
    let left: Vec<LocalId> = store
        .scan_pending()
        .await
        .expect("scan")
        .into_iter()
        .map(|pending| pending.local_id)
        .collect();
    assert_eq!(left, vec![ids[1], ids[3]]);
    let rejected = remote
        .inner
        .document("workOrders", "WO-2")
        .await
        .expect("work order");
    assert_eq!(rejected["status"], "Pendente");
    assert_eq!(remote.inner.documents("inspections").await.len(), 3);

    remote.accept_work_order("WO-2");
    let retry = service.sync_with_remote().await.expect("retry");
    assert_eq!(retry, SyncResult::new(1, 1));
    assert_eq!(store.count_pending().await.expect("count"), 1);
}

#[tokio::test]
async fn trigger_while_syncing_does_not_start_second_drain() {
    let release = Arc::new(Notify::new());
    let remote = Arc::new(FlakyRemote::gated(release.clone()));
    seed_remote(&remote.inner, "CL-1", &[("WO-1", "EQ-1")], 0).await;
    let state = Arc::new(
        AppState::new(memory_config(), remote.clone(), Arc::new(StaticPageSource))
            .expect("state"),
    );
    state
        .save_locally(&sample_draft("WO-1", "EQ-1"))
        .await
        .expect("save");

    let first = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { state.sync_now().await })
    };
    let mut status = state.subscribe_status();
    status
        .wait_for(|status| status.syncing)
        .await
        .expect("status channel open");

    assert_eq!(state.sync_now().await.expect("second trigger"), SyncPass::Busy);
    assert_eq!(state.sync_now().await.expect("third trigger"), SyncPass::Busy);

    release.notify_one();
    let pass = first.await.expect("join").expect("first pass");
    assert_eq!(pass, SyncPass::Completed(SyncResult::new(1, 0)));
    assert_eq!(remote.commit_calls(), 1);
    assert!(!state.sync_status().syncing);
    assert_eq!(state.sync_now().await.expect("after drain"), SyncPass::Idle);

    state.shutdown().await;
}

#[tokio::test]
async fn queued_inspections_survive_session_restart() {
    let dir = tempfile::tempdir().expect("data dir");
    let mut config = AppConfig::default();
    config.storage.data_dir = Some(dir.path().to_string_lossy().into_owned());
    config.sync.auto_sync = false;

    let remote = Arc::new(FlakyRemote::new());
    seed_remote(&remote.inner, "CL-1", &[("WO-1", "EQ-1")], 0).await;

    let first_session = AppState::new(config.clone(), remote.clone(), Arc::new(StaticPageSource))
        .expect("first session");
    first_session.set_online(false);
    first_session
        .save_locally(&sample_draft("WO-1", "EQ-1"))
        .await
        .expect("save");
    first_session.shutdown().await;

    let second_session = AppState::new(config, remote.clone(), Arc::new(StaticPageSource))
        .expect("second session");
    assert_eq!(second_session.pending_count().await.expect("count"), 1);

    let pass = second_session.sync_now().await.expect("sync");

    assert_eq!(pass, SyncPass::Completed(SyncResult::new(1, 0)));
    assert_eq!(second_session.pending_count().await.expect("count"), 0);
    second_session.shutdown().await;
}

#[tokio::test]
async fn unavailable_storage_surfaces_user_message() {
    let store = SqliteLocalStore::new(StoreLocation::Unavailable("private browsing".into()));

    let err = store
        .insert_pending(&sample_draft("WO-1", "EQ-1"))
        .await
        .expect_err("storage must be unavailable");

    assert!(err.is_storage_failure());
    assert!(err.user_message().contains("offline"));
}

#[tokio::test]
async fn cancelled_work_order_keeps_its_inspection_queued() {
    let remote = Arc::new(InMemoryRemoteStore::new());
    remote
        .insert_document("workOrders", "WO-1", json!({"status": "Cancelada"}))
        .await;
    let state = AppState::new(memory_config(), remote.clone(), Arc::new(StaticPageSource))
        .expect("state");
    state
        .save_locally(&sample_draft("WO-1", "EQ-1"))
        .await
        .expect("save");

    let pass = state.sync_now().await.expect("sync");

    assert_eq!(pass, SyncPass::Completed(SyncResult::new(0, 1)));
    assert_eq!(state.pending_count().await.expect("count"), 1);
    let order = remote.document("workOrders", "WO-1").await.expect("work order");
    assert_eq!(order["status"], "Cancelada");
    assert!(remote.documents("inspections").await.is_empty());

    state.shutdown().await;
}

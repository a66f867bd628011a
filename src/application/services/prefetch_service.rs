use crate::application::ports::connectivity::ConnectivitySignal;
use crate::application::ports::local_store::LocalStore;
use crate::application::ports::page_cache::PageCache;
use crate::application::ports::remote_store::{RemoteDocument, RemoteStore};
use crate::domain::entities::{
    Client, Equipment, EquipmentComponent, PrefetchReport, ReferenceSnapshot, WorkOrder,
};
use crate::shared::config::{CollectionConfig, PrefetchConfig};
use crate::shared::error::AppError;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Stages reference data and application routes on the device ahead of
/// offline work.
pub struct PrefetchService {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    page_cache: Arc<dyn PageCache>,
    connectivity: Arc<dyn ConnectivitySignal>,
    collections: CollectionConfig,
    routes: PrefetchConfig,
}

struct FetchOutcome<T> {
    records: Vec<T>,
    attempted: usize,
    failed: usize,
}

impl PrefetchService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        page_cache: Arc<dyn PageCache>,
        connectivity: Arc<dyn ConnectivitySignal>,
        collections: CollectionConfig,
        routes: PrefetchConfig,
    ) -> Self {
        Self {
            store,
            remote,
            page_cache,
            connectivity,
            collections,
            routes,
        }
    }

    pub async fn cache_data_for_offline(
        &self,
        work_orders: &[WorkOrder],
    ) -> Result<PrefetchReport, AppError> {
        if work_orders.is_empty() {
            return Ok(PrefetchReport::empty());
        }
        if !self.connectivity.is_online() {
            return Err(AppError::Offline(
                "reference data can only be prefetched while online".to_string(),
            ));
        }

        let mut linkable: Vec<WorkOrder> = Vec::with_capacity(work_orders.len());
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut skipped_work_orders = 0;
        for order in work_orders {
            if order.links().is_none() {
                skipped_work_orders += 1;
                tracing::warn!(
                    target: "offline::prefetch",
                    work_order_id = %order.id,
                    "skipping work order without equipment or client"
                );
                continue;
            }
            // A repeated id replaces the earlier entry in place.
            match positions.get(order.id.as_str()) {
                Some(&index) => {
                    tracing::debug!(
                        target: "offline::prefetch",
                        work_order_id = %order.id,
                        "duplicate work order in input; keeping the latest"
                    );
                    linkable[index] = order.clone();
                }
                None => {
                    positions.insert(order.id.as_str(), linkable.len());
                    linkable.push(order.clone());
                }
            }
        }

        let mut equipment_ids = BTreeSet::new();
        let mut client_ids = BTreeSet::new();
        for (equipment_id, client_id) in linkable.iter().filter_map(WorkOrder::links) {
            equipment_ids.insert(equipment_id);
            client_ids.insert(client_id);
        }

        let (equipment, clients) = futures::join!(
            self.fetch_documents::<Equipment>(&self.collections.equipment, &equipment_ids),
            self.fetch_documents::<Client>(&self.collections.clients, &client_ids),
        );

        let attempted = equipment.attempted + clients.attempted;
        let mut failed_fetches = equipment.failed + clients.failed;
        if attempted > 0 && failed_fetches == attempted {
            tracing::error!(
                target: "offline::prefetch",
                attempted,
                "every reference fetch failed"
            );
            return Err(AppError::RemoteFetchError(format!(
                "none of the {attempted} reference documents could be fetched"
            )));
        }

        let (components, component_failures) = self.fetch_components(&equipment.records).await;
        failed_fetches += component_failures;

        let snapshot = ReferenceSnapshot {
            work_orders: linkable,
            equipment: equipment.records,
            clients: clients.records,
            components,
        };
        self.store.replace_reference_data(&snapshot).await?;

        let (total_routes, failed_routes) = self.cache_routes(work_orders).await;

        let report = PrefetchReport {
            work_orders: snapshot.work_orders.len(),
            skipped_work_orders,
            equipment: snapshot.equipment.len(),
            clients: snapshot.clients.len(),
            components: snapshot.components.len(),
            failed_fetches,
            total_routes,
            failed_routes,
        };
        tracing::info!(
            target: "offline::prefetch",
            work_orders = report.work_orders,
            equipment = report.equipment,
            clients = report.clients,
            components = report.components,
            failed_fetches = report.failed_fetches,
            failed_routes = report.failed_routes,
            "reference data staged for offline use"
        );
        Ok(report)
    }

    async fn fetch_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        ids: &BTreeSet<&str>,
    ) -> FetchOutcome<T> {
        let results = join_all(ids.iter().map(|id| async move {
            let fetched = self.remote.get_document(collection, id).await;
            (*id, fetched)
        }))
        .await;

        let mut outcome = FetchOutcome {
            records: Vec::with_capacity(results.len()),
            attempted: results.len(),
            failed: 0,
        };
        for (id, fetched) in results {
            match fetched.and_then(|doc| doc.map(RemoteDocument::into_entity::<T>).transpose()) {
                Ok(Some(record)) => outcome.records.push(record),
                Ok(None) => {
                    tracing::warn!(
                        target: "offline::prefetch",
                        collection,
                        id,
                        "referenced document does not exist"
                    );
                }
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        target: "offline::prefetch",
                        collection,
                        id,
                        error = %err,
                        "failed to fetch reference document"
                    );
                }
            }
        }
        outcome
    }

    async fn fetch_components(&self, equipment: &[Equipment]) -> (Vec<EquipmentComponent>, usize) {
        let results = join_all(equipment.iter().map(|item| async move {
            let listed = self
                .remote
                .list_subcollection(
                    &self.collections.equipment,
                    &item.id,
                    &self.collections.components,
                )
                .await;
            (item.id.as_str(), listed)
        }))
        .await;

        let mut components = Vec::new();
        let mut failures = 0;
        for (equipment_id, listed) in results {
            let converted = listed.and_then(|docs| {
                docs.into_iter()
                    .map(|doc| -> Result<EquipmentComponent, AppError> {
                        let mut component: EquipmentComponent = doc.into_entity()?;
                        component.equipment_id = equipment_id.to_string();
                        Ok(component)
                    })
                    .collect::<Result<Vec<_>, _>>()
            });
            match converted {
                Ok(mut list) => components.append(&mut list),
                Err(err) => {
                    failures += 1;
                    tracing::warn!(
                        target: "offline::prefetch",
                        equipment_id,
                        error = %err,
                        "failed to fetch equipment components"
                    );
                }
            }
        }
        (components, failures)
    }

    /// Returns `(total, failed)` over the listing route and one detail route per work order.
    async fn cache_routes(&self, work_orders: &[WorkOrder]) -> (usize, usize) {
        let routes = self.routes_for(work_orders);
        let results = join_all(routes.iter().map(|route| self.page_cache.add(route))).await;

        let mut failed = 0;
        for (route, result) in routes.iter().zip(results) {
            if let Err(err) = result {
                failed += 1;
                tracing::warn!(
                    target: "offline::prefetch",
                    route = %route,
                    error = %err,
                    "failed to cache route"
                );
            }
        }
        (routes.len(), failed)
    }

    fn routes_for(&self, work_orders: &[WorkOrder]) -> Vec<String> {
        let prefix = self.routes.detail_route_prefix.trim_end_matches('/');
        let mut seen = HashSet::new();
        let mut routes = vec![self.routes.listing_route.clone()];
        seen.insert(self.routes.listing_route.clone());

        for order in work_orders {
            let id = order.id.trim();
            if id.is_empty() {
                continue;
            }
            let route = format!("{prefix}/{id}");
            if seen.insert(route.clone()) {
                routes.push(route);
            }
        }
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::page_cache::PageSource;
    use crate::application::ports::remote_store::WriteBatch;
    use crate::infrastructure::cache::{MemoryPageCache, StaticPageSource};
    use crate::infrastructure::network::ConnectivityMonitor;
    use crate::infrastructure::offline::SqliteLocalStore;
    use crate::shared::AppConfig;
    use async_trait::async_trait;
    use bytes::Bytes;
    use mockall::{mock, predicate::*};
    use serde_json::json;

    mock! {
        pub Remote {}

        #[async_trait]
        impl RemoteStore for Remote {
            async fn get_document(&self, collection: &str, id: &str) -> Result<Option<RemoteDocument>, AppError>;
            async fn list_subcollection(
                &self,
                parent_collection: &str,
                parent_id: &str,
                child_collection: &str,
            ) -> Result<Vec<RemoteDocument>, AppError>;
            fn new_document_id(&self, collection: &str) -> String;
            fn begin_batch(&self) -> WriteBatch;
            async fn commit(&self, batch: WriteBatch) -> Result<(), AppError>;
        }
    }

    struct RejectDetailRoutes;

    #[async_trait]
    impl PageSource for RejectDetailRoutes {
        async fn fetch(&self, url: &str) -> Result<Bytes, AppError> {
            if url == "/inspections" {
                Ok(Bytes::from_static(b"listing"))
            } else {
                Err(AppError::RemoteFetchError(format!("{url} timed out")))
            }
        }
    }

    fn service_with(
        remote: MockRemote,
        store: Arc<SqliteLocalStore>,
        source: Arc<dyn PageSource>,
        online: bool,
    ) -> PrefetchService {
        let config = AppConfig::default();
        PrefetchService::new(
            store,
            Arc::new(remote),
            Arc::new(MemoryPageCache::new(source, 60)),
            Arc::new(ConnectivityMonitor::new(online)),
            config.collections,
            config.prefetch,
        )
    }

    fn remote_serving_everything() -> MockRemote {
        let mut remote = MockRemote::new();
        remote.expect_get_document().returning(|_, id| {
            Ok(Some(RemoteDocument::from_value(
                id,
                json!({"clientId": "CL-1", "label": format!("doc {id}")}),
            )))
        });
        remote
            .expect_list_subcollection()
            .returning(|_, _, _| {
                Ok(vec![RemoteDocument::from_value(
                    "C-1",
                    json!({"kind": "valve"}),
                )])
            });
        remote
    }

    #[tokio::test]
    async fn test_empty_input_is_a_no_op() {
        let remote = MockRemote::new();
        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(remote, store.clone(), Arc::new(StaticPageSource), false);

        let report = service.cache_data_for_offline(&[]).await.unwrap();

        assert_eq!(report, PrefetchReport::empty());
        assert!(!store.is_open().await);
    }

    #[tokio::test]
    async fn test_refuses_while_offline() {
        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(MockRemote::new(), store, Arc::new(StaticPageSource), false);

        let result = service
            .cache_data_for_offline(&[WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1"))])
            .await;

        assert!(matches!(result, Err(AppError::Offline(_))));
    }

    #[tokio::test]
    async fn test_shared_equipment_is_fetched_once() {
        let mut remote = MockRemote::new();
        remote
            .expect_get_document()
            .with(eq("equipment"), eq("EQ-1"))
            .times(1)
            .returning(|_, id| {
                Ok(Some(RemoteDocument::from_value(
                    id,
                    json!({"clientId": "CL-1"}),
                )))
            });
        remote
            .expect_get_document()
            .with(eq("clients"), eq("CL-1"))
            .times(1)
            .returning(|_, id| Ok(Some(RemoteDocument::from_value(id, json!({"name": "Acme"})))));
        remote
            .expect_list_subcollection()
            .with(eq("equipment"), eq("EQ-1"), eq("components"))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(remote, store.clone(), Arc::new(StaticPageSource), true);
        let orders = vec![
            WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1")),
            WorkOrder::new("WO-2", Some("EQ-1"), Some("CL-1")),
        ];

        let report = service.cache_data_for_offline(&orders).await.unwrap();

        assert_eq!(report.work_orders, 2);
        assert_eq!(report.equipment, 1);
        assert_eq!(report.clients, 1);
        assert_eq!(report.total_routes, 3);
        assert_eq!(store.cached_work_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_work_orders_are_skipped() {
        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(
            remote_serving_everything(),
            store.clone(),
            Arc::new(StaticPageSource),
            true,
        );
        let orders = vec![
            WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1")),
            WorkOrder::new("WO-2", None, Some("CL-1")),
        ];

        let report = service.cache_data_for_offline(&orders).await.unwrap();

        assert_eq!(report.work_orders, 1);
        assert_eq!(report.skipped_work_orders, 1);
        assert_eq!(report.components, 1);
        let cached: Vec<String> = store
            .cached_work_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|order| order.id)
            .collect();
        assert_eq!(cached, vec!["WO-1".to_string()]);
        let components = store.cached_components("EQ-1").await.unwrap();
        assert_eq!(components[0].equipment_id, "EQ-1");
    }

    #[tokio::test]
    async fn test_duplicate_work_orders_keep_the_latest_entry() {
        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(
            remote_serving_everything(),
            store.clone(),
            Arc::new(StaticPageSource),
            true,
        );
        let orders = vec![
            WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1")),
            WorkOrder::new("WO-2", Some("EQ-1"), Some("CL-1")),
            WorkOrder::new("WO-1", Some("EQ-2"), Some("CL-1")),
        ];

        let report = service.cache_data_for_offline(&orders).await.unwrap();

        assert_eq!(report.work_orders, 2);
        assert_eq!(report.skipped_work_orders, 0);
        assert_eq!(report.equipment, 2);
        assert_eq!(report.total_routes, 3);
        let cached = store.cached_work_orders().await.unwrap();
        assert_eq!(cached.len(), 2);
        let first = cached.iter().find(|order| order.id == "WO-1").unwrap();
        assert_eq!(first.equipment_id.as_deref(), Some("EQ-2"));
    }

    #[tokio::test]
    async fn test_single_fetch_failure_degrades_to_absent_record() {
        let mut remote = MockRemote::new();
        remote
            .expect_get_document()
            .with(eq("equipment"), always())
            .returning(|_, id| {
                if id == "EQ-2" {
                    Err(AppError::RemoteFetchError("permission denied".into()))
                } else {
                    Ok(Some(RemoteDocument::from_value(id, json!({}))))
                }
            });
        remote
            .expect_get_document()
            .with(eq("clients"), always())
            .returning(|_, id| Ok(Some(RemoteDocument::from_value(id, json!({})))));
        remote
            .expect_list_subcollection()
            .returning(|_, _, _| Err(AppError::RemoteFetchError("offline".into())));

        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(remote, store.clone(), Arc::new(StaticPageSource), true);
        let orders = vec![
            WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1")),
            WorkOrder::new("WO-2", Some("EQ-2"), Some("CL-1")),
        ];

        let report = service.cache_data_for_offline(&orders).await.unwrap();

        assert_eq!(report.equipment, 1);
        assert_eq!(report.components, 0);
        assert_eq!(report.failed_fetches, 2);
        assert!(store.cached_equipment("EQ-1").await.unwrap().is_some());
        assert!(store.cached_equipment("EQ-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_total_fetch_failure_writes_nothing() {
        let mut remote = MockRemote::new();
        remote
            .expect_get_document()
            .returning(|_, _| Err(AppError::RemoteFetchError("network down".into())));
        remote.expect_list_subcollection().times(0);

        let store = Arc::new(SqliteLocalStore::in_memory());
        store
            .replace_reference_data(&ReferenceSnapshot {
                work_orders: vec![WorkOrder::new("WO-0", Some("EQ-0"), Some("CL-0"))],
                ..ReferenceSnapshot::default()
            })
            .await
            .unwrap();
        let service = service_with(remote, store.clone(), Arc::new(StaticPageSource), true);

        let result = service
            .cache_data_for_offline(&[WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1"))])
            .await;

        assert!(matches!(result, Err(AppError::RemoteFetchError(_))));
        let cached = store.cached_work_orders().await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "WO-0");
    }

    #[tokio::test]
    async fn test_failed_routes_make_the_report_partial() {
        let store = Arc::new(SqliteLocalStore::in_memory());
        let service = service_with(
            remote_serving_everything(),
            store.clone(),
            Arc::new(RejectDetailRoutes),
            true,
        );
        let orders = vec![
            WorkOrder::new("WO-1", Some("EQ-1"), Some("CL-1")),
            WorkOrder::new("WO-2", Some("EQ-2"), Some("CL-1")),
        ];

        let report = service.cache_data_for_offline(&orders).await.unwrap();

        assert_eq!(report.total_routes, 3);
        assert_eq!(report.failed_routes, 2);
        assert_eq!(report.cached_routes(), 1);
        assert!(report.is_partial());
        assert_eq!(store.cached_work_orders().await.unwrap().len(), 2);
    }
}

//! Macro-generated test suite for `Adapter` contract validation.
//!
//! The `adapter_contract_tests!` macro generates a test module that drives
//! any `Adapter` implementation through a `DataAccessLayer`: CRUD operations,
//! pagination options, query shorthands, remapping, filters and concurrent
//! access.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod adapter_harness;
//!
//! use adapter_harness::*;
//! use diaspora::storage::InMemoryAdapter;
//!
//! adapter_contract_tests!(InMemoryAdapter::new());
//! ```
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_insert_one_then_find_one`: inserted attributes come back
//! - `test_insert_many_preserves_order`: insertion order is kept
//! - `test_find_one_without_match`: returns None
//! - `test_update_one_touches_first_match`: only one record changes
//! - `test_update_many_touches_every_match`: all matches change
//! - `test_delete_one_reports_removal`: true then false on empty store
//! - `test_delete_many_counts_removed`: count and remaining records
//!
//! ## Options
//! - `test_find_many_limit_and_skip`: rolling skip windows
//! - `test_find_many_page`: `page` desugars to `skip = page * limit`
//! - `test_update_many_with_limit`: limit bounds updates
//! - `test_delete_many_with_skip_and_limit`: skipped records survive
//! - `test_invalid_options_are_rejected`: typed query errors
//!
//! ## Queries
//! - `test_alias_and_canonical_queries_agree`
//! - `test_undefined_field_means_missing`
//! - `test_contains_query`
//!
//! ## Collections
//! - `test_remapped_collection`: store names differ, entity names don't
//! - `test_filters_run_on_output`
//! - `test_concurrent_finds`

/// Generate a full `Adapter` conformance test suite.
///
/// `$factory` must be an expression that evaluates to a ready adapter. It is
/// re-evaluated for each test to ensure isolation.
macro_rules! adapter_contract_tests {
    ($factory:expr) => {
        mod adapter_contract_tests {
            use super::*;
            use diaspora::prelude::*;
            use serde_json::json;
            use std::sync::Arc;

            const USERS: &str = "users";

            async fn seeded() -> DataAccessLayer<impl Adapter> {
                init_tracing();
                let dal = DataAccessLayer::new($factory);
                let inserted = dal
                    .insert_many(USERS, people(), &RawQueryOptions::new())
                    .await
                    .expect("seeding should succeed");
                assert_eq!(inserted.len(), 5);
                dal
            }

            fn query(value: serde_json::Value) -> RawQuery {
                RawQuery::from_json(value).expect("test query must be an object")
            }

            fn all() -> RawQuery {
                RawQuery::new()
            }

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_insert_one_then_find_one() {
                init_tracing();
                let dal = DataAccessLayer::new($factory);
                let inserted = dal
                    .insert_one(USERS, person("Alice", 30), &RawQueryOptions::new())
                    .await
                    .unwrap()
                    .expect("inserted record should be returned");
                assert_eq!(inserted["name"], Value::from("Alice"));

                let found = dal
                    .find_one(USERS, &query(json!({"name": "Alice"})), &RawQueryOptions::new())
                    .await
                    .unwrap()
                    .expect("Alice should be found");
                assert_eq!(found["age"], Value::from(30));
            }

            #[tokio::test]
            async fn test_insert_many_preserves_order() {
                let dal = seeded().await;
                let found = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_names(&found, &["p0", "p1", "p2", "p3", "p4"]);
            }

            #[tokio::test]
            async fn test_find_one_without_match() {
                let dal = seeded().await;
                let found = dal
                    .find_one(USERS, &query(json!({"name": "nobody"})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert!(found.is_none());
            }

            #[tokio::test]
            async fn test_update_one_touches_first_match() {
                let dal = seeded().await;
                let updated = dal
                    .update_one(
                        USERS,
                        &query(json!({"age": {">": 15}})),
                        record(json!({"tag": "x"})),
                        &RawQueryOptions::new(),
                    )
                    .await
                    .unwrap()
                    .expect("a record should be updated");
                assert_eq!(updated["name"], Value::from("p1"));

                let tagged = dal
                    .find_many(USERS, &query(json!({"tag": "x"})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_names(&tagged, &["p1"]);
            }

            #[tokio::test]
            async fn test_update_many_touches_every_match() {
                let dal = seeded().await;
                let updated = dal
                    .update_many(
                        USERS,
                        &query(json!({"age": {">=": 30}})),
                        record(json!({"senior": true})),
                        &RawQueryOptions::new(),
                    )
                    .await
                    .unwrap();
                assert_names(&updated, &["p2", "p3", "p4"]);

                let seniors = dal
                    .find_many(USERS, &query(json!({"senior": true})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_eq!(seniors.len(), 3);
            }

            #[tokio::test]
            async fn test_delete_one_reports_removal() {
                init_tracing();
                let dal = DataAccessLayer::new($factory);
                dal.insert_one(USERS, person("Alice", 30), &RawQueryOptions::new())
                    .await
                    .unwrap();

                let alice = query(json!({"name": "Alice"}));
                assert!(dal.delete_one(USERS, &alice, &RawQueryOptions::new()).await.unwrap());
                assert!(!dal.delete_one(USERS, &alice, &RawQueryOptions::new()).await.unwrap());
            }

            #[tokio::test]
            async fn test_delete_many_counts_removed() {
                let dal = seeded().await;
                let deleted = dal
                    .delete_many(USERS, &query(json!({"age": {"<": 35}})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_eq!(deleted, 3);

                let remaining = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_names(&remaining, &["p3", "p4"]);
            }

            // ==================================================================
            // Options
            // ==================================================================

            #[tokio::test]
            async fn test_find_many_limit_and_skip() {
                let dal = seeded().await;
                let window = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new().with_skip(1).with_limit(2))
                    .await
                    .unwrap();
                assert_names(&window, &["p1", "p2"]);

                let tail = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new().with_skip(4).with_limit(10))
                    .await
                    .unwrap();
                assert_names(&tail, &["p4"]);

                let past_end = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new().with_skip(9))
                    .await
                    .unwrap();
                assert!(past_end.is_empty());
            }

            #[tokio::test]
            async fn test_find_many_page() {
                let dal = seeded().await;
                let page = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new().with_page(1).with_limit("2"))
                    .await
                    .unwrap();
                assert_names(&page, &["p2", "p3"]);
            }

            #[tokio::test]
            async fn test_update_many_with_limit() {
                let dal = seeded().await;
                let updated = dal
                    .update_many(
                        USERS,
                        &all(),
                        record(json!({"flag": 1})),
                        &RawQueryOptions::new().with_skip(1).with_limit(2),
                    )
                    .await
                    .unwrap();
                assert_names(&updated, &["p1", "p2"]);
            }

            #[tokio::test]
            async fn test_delete_many_with_skip_and_limit() {
                let dal = seeded().await;
                let deleted = dal
                    .delete_many(USERS, &all(), &RawQueryOptions::new().with_skip(1).with_limit(2))
                    .await
                    .unwrap();
                assert_eq!(deleted, 2);

                let remaining = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_names(&remaining, &["p0", "p3", "p4"]);
            }

            #[tokio::test]
            async fn test_invalid_options_are_rejected() {
                let dal = seeded().await;
                let err = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new().with_page(1))
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "QUERY_REFERENCE_ERROR");

                let err = dal
                    .find_many(USERS, &all(), &RawQueryOptions::new().with_limit(0))
                    .await
                    .unwrap_err();
                assert_eq!(err.error_code(), "QUERY_RANGE_ERROR");
            }

            // ==================================================================
            // Queries
            // ==================================================================

            #[tokio::test]
            async fn test_alias_and_canonical_queries_agree() {
                let dal = seeded().await;
                let aliased = dal
                    .find_many(USERS, &query(json!({"age": {">=": 20, "!=": 40}})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                let canonical = dal
                    .find_many(
                        USERS,
                        &query(json!({"age": {"$greaterEqual": 20, "$diff": 40}})),
                        &RawQueryOptions::new(),
                    )
                    .await
                    .unwrap();
                assert_names(&aliased, &["p1", "p2", "p4"]);
                assert_eq!(aliased, canonical);
            }

            #[tokio::test]
            async fn test_undefined_field_means_missing() {
                let dal = seeded().await;
                dal.insert_one(USERS, record(json!({"name": "anonymous"})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                let ageless = dal
                    .find_many(USERS, &RawQuery::new().with_undefined("age"), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_names(&ageless, &["anonymous"]);
            }

            #[tokio::test]
            async fn test_contains_query() {
                init_tracing();
                let dal = DataAccessLayer::new($factory);
                dal.insert_many(
                    USERS,
                    vec![
                        record(json!({"name": "a", "tags": ["x", "y"]})),
                        record(json!({"name": "b", "tags": ["y"]})),
                    ],
                    &RawQueryOptions::new(),
                )
                .await
                .unwrap();
                let found = dal
                    .find_many(USERS, &query(json!({"tags": {"$contains": "x"}})), &RawQueryOptions::new())
                    .await
                    .unwrap();
                assert_names(&found, &["a"]);
            }

            // ==================================================================
            // Collections
            // ==================================================================

            #[tokio::test]
            async fn test_remapped_collection() {
                init_tracing();
                let dal = DataAccessLayer::new($factory);
                let remaps = [("name".to_string(), "full_name".to_string())].into_iter().collect();
                dal.adapter()
                    .configure_collection(USERS, remaps, FilterTable::new())
                    .expect("valid remap");

                dal.insert_one(USERS, person("Alice", 30), &RawQueryOptions::new())
                    .await
                    .unwrap();

                let found = dal
                    .find_one(USERS, &query(json!({"name": "Alice"})), &RawQueryOptions::new())
                    .await
                    .unwrap()
                    .expect("remapped query should match");
                assert_eq!(found["name"], Value::from("Alice"));
                assert!(!found.contains_key("full_name"));

                let raw = dal
                    .find_one(
                        USERS,
                        &query(json!({"full_name": {"$equal": "Alice"}})),
                        &RawQueryOptions::new()
                            .with_remap_input(false)
                            .with_remap_output(false),
                    )
                    .await
                    .unwrap()
                    .expect("store-side query should match");
                assert_eq!(raw["full_name"], Value::from("Alice"));
            }

            #[tokio::test]
            async fn test_filters_run_on_output() {
                init_tracing();
                let dal = DataAccessLayer::new($factory);
                let mut filters = FilterTable::new();
                filters.insert("email".to_string(), FilterSpec::Lowercase.build());
                dal.adapter()
                    .configure_collection(USERS, Default::default(), filters)
                    .unwrap();

                dal.insert_one(
                    USERS,
                    record(json!({"name": "a", "email": "A@EXAMPLE.COM"})),
                    &RawQueryOptions::new(),
                )
                .await
                .unwrap();

                let found = dal
                    .find_one(USERS, &all(), &RawQueryOptions::new())
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(found["email"], Value::from("a@example.com"));

                let unfiltered = dal
                    .find_one(USERS, &all(), &RawQueryOptions::new().with_remap_output(false))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(unfiltered["email"], Value::from("A@EXAMPLE.COM"));
            }

            #[tokio::test]
            async fn test_concurrent_finds() {
                let dal = Arc::new(seeded().await);
                let lookups = (0..5).map(|i| {
                    let dal = dal.clone();
                    async move {
                        dal.find_one(
                            USERS,
                            &query(json!({"name": format!("p{}", i)})),
                            &RawQueryOptions::new(),
                        )
                        .await
                    }
                });
                let results = futures::future::join_all(lookups).await;
                for (i, result) in results.into_iter().enumerate() {
                    let found = result.unwrap().expect("every person should be found");
                    assert_eq!(found["age"], Value::from((i as i64 + 1) * 10));
                }
            }
        }
    };
}

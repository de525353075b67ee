//! Integration tests for yion-kit.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use tempfile::TempDir;
use yion_kit::config::StoreConfig;
use yion_kit::core::{
    Document, Logic, Operator, PageRequest, QueryOptions, Sort, SortDirection, Value, document,
};
use yion_kit::error::{Error, StorageError};
use yion_kit::storage::{DocumentStore, Provider, SqliteStore, StoreBuilder};

const ITEMS_SCHEMA: &str = "CREATE TABLE items (
    id TEXT PRIMARY KEY,
    name TEXT,
    status TEXT,
    qty INTEGER,
    active TEXT,
    meta TEXT,
    createdAt TEXT,
    updatedAt TEXT
)";

/// Helper to create a store with an `items` table in a temp folder.
async fn create_test_store() -> (SqliteStore, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = StoreConfig::new("shop")
        .with_folder(temp_dir.path())
        .with_environment("test");
    let store = SqliteStore::open(&config).expect("Failed to open store");
    store.run(ITEMS_SCHEMA, &[]).await.expect("Failed to create table");
    (store, temp_dir)
}

fn by_id(doc: &Document) -> Document {
    document::<_, Value, _>([("id", doc.get("id").cloned().expect("id"))])
}

#[tokio::test]
async fn test_insert_assigns_id_and_timestamps() {
    let (store, temp) = create_test_store().await;
    assert!(temp.path().join("shop_test.db").exists());

    let first = store
        .insert("items", document([("name", "lamp")]))
        .await
        .expect("insert failed");
    let second = store
        .insert("items", document([("name", "desk")]))
        .await
        .expect("insert failed");

    let id = first.get("id").and_then(Value::as_str).expect("string id");
    assert!(!id.is_empty());
    assert_ne!(first.get("id"), second.get("id"));
    assert_eq!(first.get("createdAt"), first.get("updatedAt"));
    assert!(first.get("createdAt").and_then(Value::as_instant).is_some());
}

#[tokio::test]
async fn test_update_refreshes_updated_at_only() {
    let (store, _temp) = create_test_store().await;
    let inserted = store
        .insert("items", document([("name", "lamp"), ("status", "open")]))
        .await
        .expect("insert failed");

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    store
        .update(
            "items",
            &by_id(&inserted),
            document([("status", "closed"), ("createdAt", "1999-01-01T00:00:00.000Z")]),
        )
        .await
        .expect("update failed");

    let stored = store
        .find_one("items", &by_id(&inserted))
        .await
        .expect("find_one failed")
        .expect("document exists");

    assert_eq!(stored.get("status"), Some(&Value::from("closed")));
    assert_eq!(stored.get("createdAt"), inserted.get("createdAt"));

    let before = inserted.get("updatedAt").and_then(Value::as_instant);
    let after = stored.get("updatedAt").and_then(Value::as_instant);
    assert!(after > before);
}

#[tokio::test]
async fn test_update_without_match_succeeds() {
    let (store, _temp) = create_test_store().await;
    store
        .update("items", &document([("id", "nope")]), document([("name", "x")]))
        .await
        .expect("zero-row update is not an error");
}

#[tokio::test]
async fn test_structured_values_round_trip() {
    let (store, _temp) = create_test_store().await;

    let mut meta = BTreeMap::new();
    meta.insert("x".to_string(), Value::Integer(1));
    let inserted = store
        .insert(
            "items",
            document([
                ("name", Value::from("a")),
                ("meta", Value::Map(meta.clone())),
                ("active", Value::Boolean(false)),
                ("qty", Value::Integer(4)),
            ]),
        )
        .await
        .expect("insert failed");

    let found = store
        .find_one("items", &by_id(&inserted))
        .await
        .expect("find_one failed")
        .expect("document exists");

    assert_eq!(found.get("meta"), Some(&Value::Map(meta)));
    assert_eq!(found.get("active"), Some(&Value::Boolean(false)));
    assert_eq!(found.get("qty"), Some(&Value::Integer(4)));
    assert_eq!(found.get("name"), Some(&Value::from("a")));

    let raw_meta = store
        .run(
            "UPDATE items SET name = 'raw' WHERE meta = ?1",
            &[Value::from(r#"{"x":1}"#)],
        )
        .await
        .expect("raw update failed");
    assert_eq!(raw_meta, 1);
}

#[tokio::test]
async fn test_find_pages_in_sort_order() {
    let (store, _temp) = create_test_store().await;
    for i in 0..25 {
        store
            .insert("items", document([("name", format!("item-{i:02}"))]))
            .await
            .expect("insert failed");
    }

    let sort = Sort::by("name", SortDirection::Asc);
    let page = store
        .find(
            "items",
            &Document::new(),
            PageRequest::new(2, 10),
            &sort,
            QueryOptions::default(),
        )
        .await
        .expect("find failed");

    let names: Vec<_> = page
        .iter()
        .filter_map(|d| d.get("name").and_then(Value::as_str))
        .collect();
    let expected: Vec<String> = (10..20).map(|i| format!("item-{i:02}")).collect();
    assert_eq!(names, expected);

    let total = store
        .count("items", &Document::new(), QueryOptions::default())
        .await
        .expect("count failed");
    assert_eq!(total, 25);
}

#[tokio::test]
async fn test_paginated_bounds() {
    let (store, _temp) = create_test_store().await;
    for i in 0..13 {
        store
            .insert("items", document([("qty", i64::from(i))]))
            .await
            .expect("insert failed");
    }

    let last = store
        .paginated(
            "items",
            &Document::new(),
            PageRequest::new(2, PageRequest::DEFAULT_PAGINATED_LIMIT),
            &Sort::default(),
            QueryOptions::default(),
        )
        .await
        .expect("paginated failed");

    assert_eq!(last.data.len(), 3);
    assert_eq!(last.pagination.total, 13);
    assert_eq!(last.pagination.page, 2);
    assert_eq!(last.pagination.limit, 10);
}

#[tokio::test]
async fn test_not_equal_filter() {
    let (store, _temp) = create_test_store().await;
    for status in ["open", "closed", "open", "draft"] {
        store
            .insert("items", document([("status", status)]))
            .await
            .expect("insert failed");
    }

    let options = QueryOptions::new(Operator::Ne, Logic::And);
    let query = document([("status", "open")]);
    let rows = store
        .find("items", &query, PageRequest::default(), &Sort::default(), options)
        .await
        .expect("find failed");

    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|d| d.get("status") != Some(&Value::from("open"))));
    assert_eq!(
        store.count("items", &query, options).await.expect("count failed"),
        2
    );
}

#[tokio::test]
async fn test_or_and_like_filters() {
    let (store, _temp) = create_test_store().await;
    for name in ["apple", "apricot", "banana"] {
        store
            .insert("items", document([("name", name)]))
            .await
            .expect("insert failed");
    }

    let like = QueryOptions::new(Operator::Like, Logic::And);
    let count = store
        .count("items", &document([("name", "ap%")]), like)
        .await
        .expect("count failed");
    assert_eq!(count, 2);

    let any = QueryOptions::new(Operator::Eq, Logic::Or);
    let query = document([("name", "banana"), ("status", "missing")]);
    assert_eq!(
        store.count("items", &query, any).await.expect("count failed"),
        1
    );
}

#[tokio::test]
async fn test_remove() {
    let (store, _temp) = create_test_store().await;
    let inserted = store
        .insert("items", document([("name", "lamp")]))
        .await
        .expect("insert failed");

    store
        .remove("items", &document([("id", "nonexistent")]), QueryOptions::default())
        .await
        .expect("removing nothing succeeds");

    store
        .remove("items", &by_id(&inserted), QueryOptions::default())
        .await
        .expect("remove failed");
    assert!(store
        .find_one("items", &by_id(&inserted))
        .await
        .expect("find_one failed")
        .is_none());

    let err = store
        .remove("items", &Document::new(), QueryOptions::default())
        .await
        .expect_err("empty query must be rejected");
    assert!(matches!(
        err,
        Error::Storage(StorageError::EmptyPredicate { .. })
    ));
}

#[tokio::test]
async fn test_engine_errors_propagate() {
    let (store, _temp) = create_test_store().await;
    let err = store
        .insert("missing_table", document([("name", "x")]))
        .await
        .expect_err("unknown table");
    let Error::Storage(StorageError::Database(message)) = err else {
        unreachable!("expected a database error");
    };
    assert!(message.contains("missing_table"));
}

#[tokio::test]
async fn test_operations_after_close_fail() {
    let (store, _temp) = create_test_store().await;
    store.close().await.expect("close failed");

    let err = store
        .count("items", &Document::new(), QueryOptions::default())
        .await
        .expect_err("closed store");
    assert!(matches!(err, Error::Storage(StorageError::Closed)));

    let err = store.close().await.expect_err("second close");
    assert!(matches!(err, Error::Storage(StorageError::Closed)));
}

/// Embedded file backend tests.
mod file_store_tests {
    use super::*;

    fn builder(temp: &TempDir) -> StoreBuilder {
        StoreBuilder::new("shop")
            .provider(Provider::File)
            .folder(temp.path())
            .environment("test")
            .collections(["users"])
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let temp = TempDir::new().expect("temp dir");

        let store = builder(&temp).build().expect("build failed");
        let ana = store
            .insert("users", document([("name", "ana"), ("role", "admin")]))
            .await
            .expect("insert failed");
        store
            .insert("users", document([("name", "bob"), ("role", "viewer")]))
            .await
            .expect("insert failed");
        store
            .update("users", &by_id(&ana), document([("role", "owner")]))
            .await
            .expect("update failed");
        store.close().await.expect("close failed");

        assert!(temp.path().join("users_test.db").exists());

        let reopened = builder(&temp).build().expect("reopen failed");
        let found = reopened
            .find_one("users", &document([("name", "ana")]))
            .await
            .expect("find_one failed")
            .expect("ana persisted");
        assert_eq!(found.get("role"), Some(&Value::from("owner")));
        assert_eq!(found.get("createdAt"), ana.get("createdAt"));
        assert_eq!(
            reopened
                .count("users", &Document::new(), QueryOptions::default())
                .await
                .expect("count failed"),
            2
        );
    }

    #[tokio::test]
    async fn test_file_store_matches_sqlite_semantics() {
        let temp = TempDir::new().expect("temp dir");
        let store = builder(&temp).build().expect("build failed");
        for (name, age) in [("a", 30i64), ("b", 20), ("c", 40)] {
            store
                .insert("users", document([("name", Value::from(name)), ("age", Value::from(age))]))
                .await
                .expect("insert failed");
        }

        let options = QueryOptions::new(Operator::Gt, Logic::And);
        let page = store
            .paginated(
                "users",
                &document([("age", 25i64)]),
                PageRequest::new(1, 1),
                &Sort::by("age", SortDirection::Desc),
                options,
            )
            .await
            .expect("paginated failed");

        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].get("name"), Some(&Value::from("c")));
    }

    #[tokio::test]
    async fn test_file_store_rejects_undeclared_collection() {
        let temp = TempDir::new().expect("temp dir");
        let store = builder(&temp).build().expect("build failed");
        let err = store
            .insert("orders", document([("total", 1i64)]))
            .await
            .expect_err("undeclared collection");
        assert!(matches!(
            err,
            Error::Storage(StorageError::UnknownCollection { .. })
        ));
    }
}

mod property_tests {
    use proptest::prelude::*;
    use rusqlite::types::ValueRef;
    use std::collections::BTreeMap;
    use yion_kit::core::Value;
    use yion_kit::storage::codec::{denormalize, normalize};

    fn round_trip(value: &Value) -> Value {
        let stored = normalize(value);
        denormalize(ValueRef::from(&stored))
    }

    proptest! {
        #[test]
        fn integers_round_trip(n in any::<i64>()) {
            prop_assert_eq!(round_trip(&Value::Integer(n)), Value::Integer(n));
        }

        #[test]
        fn floats_round_trip(f in -1.0e12f64..1.0e12) {
            prop_assert_eq!(round_trip(&Value::Float(f)), Value::Float(f));
        }

        #[test]
        fn booleans_round_trip(b in any::<bool>()) {
            prop_assert_eq!(round_trip(&Value::Boolean(b)), Value::Boolean(b));
        }

        #[test]
        fn plain_strings_round_trip(s in "[a-zA-Z][a-zA-Z0-9 _-]{0,40}") {
            prop_assume!(serde_json::from_str::<serde_json::Value>(&s).is_err());
            prop_assert_eq!(round_trip(&Value::from(s.as_str())), Value::from(s.as_str()));
        }

        #[test]
        fn instants_round_trip(millis in 0i64..4_102_444_800_000) {
            let instant = chrono::DateTime::from_timestamp_millis(millis)
                .expect("in range");
            prop_assert_eq!(round_trip(&Value::Instant(instant)), Value::Instant(instant));
        }

        #[test]
        fn nested_maps_round_trip(
            entries in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6),
            tags in prop::collection::vec("[a-z]{1,8}", 0..4),
        ) {
            let mut map: BTreeMap<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, Value::Integer(v)))
                .collect();
            map.insert(
                "tags".to_string(),
                Value::List(tags.into_iter().map(Value::String).collect()),
            );
            let value = Value::Map(map);
            prop_assert_eq!(round_trip(&value), value);
        }
    }
}

/// i18n integration tests.
mod i18n_tests {
    use tempfile::TempDir;
    use yion_kit::config::I18nConfig;
    use yion_kit::i18n::{I18n, LocaleRequest, TranslateOptions};

    fn load(temp: &TempDir) -> I18n {
        std::fs::write(
            temp.path().join("app.en.json"),
            r#"{"cart": {"empty": "Your cart is empty", "items": "{{count}} items"}}"#,
        )
        .expect("write en");
        std::fs::write(
            temp.path().join("app.fr.json"),
            r#"{"cart": {"items": "{{count}} articles"}}"#,
        )
        .expect("write fr");
        std::fs::write(
            temp.path().join("app.fr-CA.json"),
            r#"{"cart": {"empty": "Votre panier est vide"}}"#,
        )
        .expect("write fr-CA");

        I18n::new(&I18nConfig {
            folder: temp.path().to_path_buf(),
            fallback: "en".to_string(),
        })
    }

    #[test]
    fn test_request_to_translation() {
        let temp = TempDir::new().expect("temp dir");
        let i18n = load(&temp);

        let locale = i18n.resolve(&LocaleRequest::from_header("fr-CA,fr;q=0.9,en;q=0.5"));
        assert_eq!(locale, "fr-CA");

        let options = TranslateOptions::locale(locale).var("count", 3);
        assert_eq!(i18n.translate("cart.empty", &options), "Votre panier est vide");
        assert_eq!(i18n.translate("cart.items", &options), "3 articles");
        assert_eq!(i18n.translate("cart.total", &options), "cart.total");
    }

    #[test]
    fn test_precedence() {
        let temp = TempDir::new().expect("temp dir");
        let i18n = load(&temp);

        let header_only = LocaleRequest::from_header("fr");
        assert_eq!(i18n.resolve(&header_only), "fr");

        let with_path = LocaleRequest::from_header("fr").with_url("/en/cart");
        assert_eq!(i18n.resolve(&with_path), "en");

        let with_query = LocaleRequest::from_header("fr").with_url("/en/cart?lang=de");
        assert_eq!(i18n.resolve(&with_query), "de");

        assert_eq!(i18n.resolve(&LocaleRequest::from_header("ja")), "en");
    }
}

/// CLI command integration tests.
mod cli_tests {
    use clap::Parser;
    use tempfile::TempDir;
    use yion_kit::cli::commands::execute;
    use yion_kit::cli::parser::Cli;

    /// Helper to parse a command line rooted in `temp`.
    fn cli(temp: &TempDir, args: &[&str]) -> Cli {
        let folder = temp.path().to_string_lossy().to_string();
        let mut argv = vec![
            "yion-kit".to_string(),
            "--folder".to_string(),
            folder,
            "--env".to_string(),
            "test".to_string(),
        ];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        Cli::parse_from(argv)
    }

    #[tokio::test]
    async fn test_cmd_sqlite_workflow() {
        let temp = TempDir::new().expect("temp dir");

        let created = execute(&cli(
            &temp,
            &[
                "run",
                "CREATE TABLE notes (id TEXT, body TEXT, createdAt TEXT, updatedAt TEXT)",
            ],
        ))
        .await
        .expect("run failed");
        assert!(created.contains("run"));

        let inserted = execute(&cli(
            &temp,
            &["--format", "json", "insert", "notes", r#"{"body": "hello"}"#],
        ))
        .await
        .expect("insert failed");
        let json: serde_json::Value = serde_json::from_str(&inserted).expect("json output");
        assert_eq!(json["body"], "hello");
        assert!(json["id"].is_string());

        let count = execute(&cli(&temp, &["count", "notes"]))
            .await
            .expect("count failed");
        assert_eq!(count, "1\n");

        let found = execute(&cli(&temp, &["find", "notes", "--query", r#"{"body": "hello"}"#]))
            .await
            .expect("find failed");
        assert!(found.contains("hello"));
    }

    #[tokio::test]
    async fn test_cmd_run_requires_sqlite() {
        let temp = TempDir::new().expect("temp dir");
        let result = execute(&cli(&temp, &["--provider", "file", "run", "SELECT 1"])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cmd_file_provider() {
        let temp = TempDir::new().expect("temp dir");

        execute(&cli(
            &temp,
            &[
                "--provider",
                "file",
                "--collections",
                "todos",
                "insert",
                "todos",
                r#"{"title": "write tests", "done": false}"#,
            ],
        ))
        .await
        .expect("insert failed");

        let page = execute(&cli(
            &temp,
            &[
                "--provider",
                "file",
                "--collections",
                "todos",
                "--format",
                "json",
                "paginate",
                "todos",
            ],
        ))
        .await
        .expect("paginate failed");
        let json: serde_json::Value = serde_json::from_str(&page).expect("json output");
        assert_eq!(json["pagination"]["total"], 1);
        assert_eq!(json["pagination"]["limit"], 10);
        assert_eq!(json["data"][0]["done"], false);
    }

    #[tokio::test]
    async fn test_cmd_unknown_provider() {
        let temp = TempDir::new().expect("temp dir");
        let err = execute(&cli(&temp, &["--provider", "mongo", "count", "x"]))
            .await
            .expect_err("unknown provider");
        assert!(err.to_string().contains("unknown provider"));
    }

    #[tokio::test]
    async fn test_cmd_translate_and_locale() {
        let temp = TempDir::new().expect("temp dir");
        std::fs::write(
            temp.path().join("site.de.json"),
            r#"{"hello": "Hallo {{name}}"}"#,
        )
        .expect("write translations");
        let translations = temp.path().to_string_lossy().to_string();

        let text = execute(&cli(
            &temp,
            &[
                "translate",
                "hello",
                "--locale",
                "de",
                "--var",
                "name=Welt",
                "--translations",
                &translations,
            ],
        ))
        .await
        .expect("translate failed");
        assert_eq!(text, "Hallo Welt\n");

        let locale = execute(&cli(
            &temp,
            &[
                "locale",
                "--accept-language",
                "de-AT, de;q=0.8",
                "--translations",
                &translations,
                "--fallback",
                "en",
            ],
        ))
        .await
        .expect("locale failed");
        assert_eq!(locale, "de\n");
    }
}

/// Tests against the compiled binary.
mod binary_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn yion_kit() -> Command {
        let mut cmd = Command::cargo_bin("yion-kit").expect("binary built");
        cmd.env_remove("YION_PROVIDER").env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn test_version() {
        yion_kit()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("yion-kit"));
    }

    #[test]
    fn test_json_errors_go_to_stdout() {
        let temp = TempDir::new().expect("temp dir");
        yion_kit()
            .arg("--folder")
            .arg(temp.path())
            .args(["--format", "json", "--provider", "mongo", "count", "items"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("unknown provider: mongo"));
    }

    #[test]
    fn test_text_errors_go_to_stderr() {
        let temp = TempDir::new().expect("temp dir");
        yion_kit()
            .arg("--folder")
            .arg(temp.path())
            .args(["--env", "test", "count", "missing_table"])
            .assert()
            .failure()
            .stderr(predicate::str::starts_with("Error: "))
            .stderr(predicate::str::contains("no such table"));
    }

    #[test]
    fn test_locale_falls_back() {
        let temp = TempDir::new().expect("temp dir");
        yion_kit()
            .args(["locale", "--accept-language", "fr-FR", "--fallback", "en"])
            .arg("--translations")
            .arg(temp.path())
            .assert()
            .success()
            .stdout("en\n");
    }
}

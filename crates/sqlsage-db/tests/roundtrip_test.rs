// Live-backend behavior of the tool set.
//
// These tests need a reachable PostgreSQL server and run only when
// DATABASE_URL is set; without it they skip. Each test works in its own
// throwaway table, created and dropped inside the test, so a shared
// development database stays clean.

use std::sync::Mutex;

use serde_json::json;

use sqlsage_core::ToolRegistry;
use sqlsage_db::sql::Statement;
use sqlsage_db::{database_tool_registry, Database};

// Tests in this file issue DDL against a shared database; serialize them so
// one test's tables never flicker through another's listings.
static DB_LOCK: Mutex<()> = Mutex::new(());

async fn live_database() -> Option<Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(
        Database::from_url(&url)
            .await
            .expect("DATABASE_URL is set but unreachable"),
    )
}

async fn drop_table(db: &Database, table: &str) {
    db.execute(&Statement::plain(format!("DROP TABLE IF EXISTS {}", table)))
        .await
        .expect("cleanup drop failed");
}

async fn create_fixture_table(registry: &ToolRegistry, table: &str) {
    let result = registry
        .invoke(
            "create_table",
            json!({
                "table_name": table,
                "columns": [
                    {"name": "id", "type": "SERIAL PRIMARY KEY"},
                    {"name": "name", "type": "VARCHAR(64)"},
                    {"name": "age", "type": "INTEGER"}
                ]
            }),
        )
        .await;
    assert!(result.success, "create_table failed: {:?}", result.error);
}

#[tokio::test]
async fn test_create_then_read_returns_inserted_data() {
    let Some(db) = live_database().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let _guard = DB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let registry = database_tool_registry(db.clone());
    let table = format!("roundtrip_people_{}", std::process::id());

    drop_table(&db, &table).await;
    create_fixture_table(&registry, &table).await;

    let created = registry
        .invoke(
            "create_record",
            json!({"table_name": table, "data": {"name": "Ada", "age": 36}}),
        )
        .await;
    assert!(created.success, "create_record failed: {:?}", created.error);
    let record = created.payload.unwrap()["record"].clone();
    assert_eq!(record["name"], "Ada");
    assert_eq!(record["age"], 36);
    // server-assigned primary key comes back with the row
    let id = record["id"].as_i64().expect("id assigned by the server");

    let read = registry
        .invoke(
            "read_records",
            json!({"table_name": table, "conditions": {"name": "Ada"}}),
        )
        .await;
    assert!(read.success, "read_records failed: {:?}", read.error);
    let payload = read.payload.unwrap();
    assert_eq!(payload["count"], 1);
    let row = &payload["data"][0];
    assert_eq!(row["name"], "Ada");
    assert_eq!(row["age"], 36);
    assert_eq!(row["id"].as_i64(), Some(id));

    drop_table(&db, &table).await;
}

#[tokio::test]
async fn test_describe_database_listing_is_stable() {
    let Some(db) = live_database().await else {
        eprintln!("skipping: DATABASE_URL not set");
        return;
    };
    let _guard = DB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let registry = database_tool_registry(db.clone());
    let table = format!("roundtrip_listing_{}", std::process::id());

    // A table this test owns must appear in both listings
    drop_table(&db, &table).await;
    create_fixture_table(&registry, &table).await;

    let first = registry.invoke("describe_database", json!({})).await;
    let second = registry.invoke("describe_database", json!({})).await;
    assert!(first.success && second.success);

    let first = first.payload.unwrap();
    let second = second.payload.unwrap();
    // Absent intervening DDL the listing is identical call to call
    assert_eq!(first["tables"], second["tables"]);
    assert_eq!(first["table_count"], second["table_count"]);
    assert!(first["tables"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["table_name"] == table.as_str()));

    drop_table(&db, &table).await;
}

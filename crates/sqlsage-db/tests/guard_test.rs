// Guard behavior without a live database.
//
// The pool is built lazily against an unreachable address: any test that
// passed its guard and reached the backend would fail with a connection
// error, so a clean guard failure proves no round trip was attempted.

use serde_json::json;
use sqlx::postgres::PgPoolOptions;

use sqlsage_core::{ToolErrorKind, ToolRegistry};
use sqlsage_db::{database_tool_registry, Database};

fn offline_registry() -> ToolRegistry {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://nobody@127.0.0.1:1/unreachable")
        .expect("lazy pool construction never connects");
    database_tool_registry(Database::new(pool))
}

#[tokio::test]
async fn test_registry_has_all_eleven_tools() {
    let registry = offline_registry();
    assert_eq!(registry.len(), 11);
    for name in [
        "create_record",
        "read_records",
        "update_record",
        "delete_record",
        "describe_database",
        "describe_table",
        "create_table",
        "alter_table",
        "create_index",
        "drop_index",
        "manage_transaction",
    ] {
        assert!(registry.has(name), "missing tool: {}", name);
    }
}

#[tokio::test]
async fn test_delete_without_conditions_fails_closed() {
    let registry = offline_registry();

    let result = registry
        .invoke("delete_record", json!({"table_name": "users"}))
        .await;
    assert!(!result.success);
    assert!(result.is_failure_kind(ToolErrorKind::UnsafeDelete));

    let result = registry
        .invoke(
            "delete_record",
            json!({"table_name": "users", "conditions": {}}),
        )
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::UnsafeDelete));
}

#[tokio::test]
async fn test_update_without_conditions_is_malformed() {
    let registry = offline_registry();

    let result = registry
        .invoke(
            "update_record",
            json!({"table_name": "users", "data": {"name": "x"}, "conditions": {}}),
        )
        .await;
    assert!(!result.success);
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
    assert!(result.error.unwrap().contains("require conditions"));
}

#[tokio::test]
async fn test_update_without_data_is_malformed() {
    let registry = offline_registry();

    let result = registry
        .invoke("update_record", json!({"table_name": "users"}))
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
}

#[tokio::test]
async fn test_alter_table_rejects_unsupported_operation() {
    let registry = offline_registry();

    let result = registry
        .invoke(
            "alter_table",
            json!({
                "table_name": "users",
                "operation": "rename_table",
                "details": {}
            }),
        )
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::UnsupportedOperation));
    assert!(result.error.unwrap().contains("rename_table"));
}

#[tokio::test]
async fn test_alter_table_missing_details_is_malformed() {
    let registry = offline_registry();

    let result = registry
        .invoke(
            "alter_table",
            json!({
                "table_name": "users",
                "operation": "add_column",
                "details": {"column_name": "email"}
            }),
        )
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
    assert!(result.error.unwrap().contains("column_type"));
}

#[tokio::test]
async fn test_transaction_rejects_unknown_mode() {
    let registry = offline_registry();

    let result = registry
        .invoke(
            "manage_transaction",
            json!({"mode": "savepoint", "operations": ["SELECT 1"]}),
        )
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::InvalidMode));
    assert!(result.error.unwrap().contains("savepoint"));
}

#[tokio::test]
async fn test_transaction_commit_requires_operations() {
    let registry = offline_registry();

    let result = registry
        .invoke("manage_transaction", json!({"mode": "commit"}))
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
}

#[tokio::test]
async fn test_missing_required_arguments_never_reach_backend() {
    let registry = offline_registry();

    // Registry-level validation, driven by each tool's declared schema
    let result = registry.invoke("create_record", json!({})).await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));

    let result = registry.invoke("describe_table", json!({})).await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));

    let result = registry.invoke("drop_index", json!({})).await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
}

#[tokio::test]
async fn test_create_record_rejects_empty_data() {
    let registry = offline_registry();

    let result = registry
        .invoke(
            "create_record",
            json!({"table_name": "users", "data": {}}),
        )
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
}

#[tokio::test]
async fn test_create_table_rejects_empty_columns() {
    let registry = offline_registry();

    let result = registry
        .invoke(
            "create_table",
            json!({"table_name": "users", "columns": []}),
        )
        .await;
    assert!(result.is_failure_kind(ToolErrorKind::MalformedArguments));
}

#[tokio::test]
async fn test_unknown_tool_comes_back_as_envelope() {
    let registry = offline_registry();

    let result = registry.invoke("drop_database", json!({})).await;
    assert!(result.is_failure_kind(ToolErrorKind::UnknownTool));
}

// SQL statement builders
//
// Pure functions from tool arguments to (sql, params). All safety guards
// live here, before anything can reach the pool: empty-conditions checks,
// the alter-table operation whitelist, and transaction mode validation.
// Table and column names come from the model and are interpolated the way
// the conversational contract expects; values always travel as binds.

use serde_json::{Map, Value};
use sqlsage_core::ToolErrorKind;

/// A statement plus its bind parameters, in `$1..$n` order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement with no binds
    pub fn plain(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Builder failure: the kind to report and the error text
pub type BuildError = (ToolErrorKind, String);

type BuildResult = std::result::Result<Statement, BuildError>;

// ============================================================================
// CRUD statements
// ============================================================================

/// `INSERT INTO t (..) VALUES (..) RETURNING *`
pub fn insert(table: &str, data: &Map<String, Value>) -> BuildResult {
    if data.is_empty() {
        return Err((
            ToolErrorKind::MalformedArguments,
            "No data provided for insert".to_string(),
        ));
    }

    let columns: Vec<&str> = data.keys().map(|k| k.as_str()).collect();
    let placeholders: Vec<String> = (1..=data.len()).map(|i| format!("${}", i)).collect();

    Ok(Statement::new(
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ),
        data.values().cloned().collect(),
    ))
}

/// `SELECT .. FROM t [WHERE ..] [ORDER BY ..] [LIMIT ..]`
pub fn select(
    table: &str,
    conditions: Option<&Map<String, Value>>,
    columns: Option<&[String]>,
    limit: Option<i64>,
    order_by: Option<&str>,
) -> Statement {
    let projection = match columns {
        Some(cols) if !cols.is_empty() => cols.join(", "),
        _ => "*".to_string(),
    };

    let mut sql = format!("SELECT {} FROM {}", projection, table);
    let mut params = Vec::new();

    if let Some(conditions) = conditions {
        if !conditions.is_empty() {
            let clauses: Vec<String> = conditions
                .keys()
                .enumerate()
                .map(|(i, key)| format!("{} = ${}", key, i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            params.extend(conditions.values().cloned());
        }
    }

    if let Some(order_by) = order_by {
        sql.push_str(&format!(" ORDER BY {}", order_by));
    }

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Statement::new(sql, params)
}

/// `UPDATE t SET .. WHERE .. RETURNING *`
///
/// Empty conditions are rejected: an unfiltered update would rewrite the
/// whole table, the same hazard the delete guard closes.
pub fn update(
    table: &str,
    data: &Map<String, Value>,
    conditions: &Map<String, Value>,
) -> BuildResult {
    if data.is_empty() {
        return Err((
            ToolErrorKind::MalformedArguments,
            "No data provided for update".to_string(),
        ));
    }
    if conditions.is_empty() {
        return Err((
            ToolErrorKind::MalformedArguments,
            "UPDATE operations require conditions to prevent accidental data loss".to_string(),
        ));
    }

    let set_clauses: Vec<String> = data
        .keys()
        .enumerate()
        .map(|(i, key)| format!("{} = ${}", key, i + 1))
        .collect();
    let offset = data.len();
    let where_clauses: Vec<String> = conditions
        .keys()
        .enumerate()
        .map(|(i, key)| format!("{} = ${}", key, offset + i + 1))
        .collect();

    let mut params: Vec<Value> = data.values().cloned().collect();
    params.extend(conditions.values().cloned());

    Ok(Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} RETURNING *",
            table,
            set_clauses.join(", "),
            where_clauses.join(" AND ")
        ),
        params,
    ))
}

/// `DELETE FROM t WHERE .. RETURNING *`
///
/// Fails closed with `UnsafeDelete` when no conditions are given; this is
/// checked before any backend call can be issued.
pub fn delete(table: &str, conditions: &Map<String, Value>) -> BuildResult {
    if conditions.is_empty() {
        return Err((
            ToolErrorKind::UnsafeDelete,
            "DELETE operations require conditions to prevent accidental data loss".to_string(),
        ));
    }

    let clauses: Vec<String> = conditions
        .keys()
        .enumerate()
        .map(|(i, key)| format!("{} = ${}", key, i + 1))
        .collect();

    Ok(Statement::new(
        format!(
            "DELETE FROM {} WHERE {} RETURNING *",
            table,
            clauses.join(" AND ")
        ),
        conditions.values().cloned().collect(),
    ))
}

// ============================================================================
// Introspection statements
// ============================================================================

/// Table listing for the public schema, ordered for stable output
pub fn list_tables() -> Statement {
    Statement::plain(
        "SELECT table_name, table_type \
         FROM information_schema.tables \
         WHERE table_schema = 'public' \
         ORDER BY table_name",
    )
}

/// Column definitions for one table
pub fn table_columns(table: &str) -> Statement {
    Statement::new(
        "SELECT column_name, data_type, is_nullable, column_default, character_maximum_length \
         FROM information_schema.columns \
         WHERE table_name = $1 AND table_schema = 'public' \
         ORDER BY ordinal_position",
        vec![Value::String(table.to_string())],
    )
}

/// Constraints for one table
pub fn table_constraints(table: &str) -> Statement {
    Statement::new(
        "SELECT tc.constraint_name, tc.constraint_type, kcu.column_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON tc.constraint_name = kcu.constraint_name \
         WHERE tc.table_name = $1 AND tc.table_schema = 'public'",
        vec![Value::String(table.to_string())],
    )
}

/// Row count for one table
pub fn table_row_count(table: &str) -> Statement {
    Statement::plain(format!("SELECT COUNT(*) AS row_count FROM {}", table))
}

// ============================================================================
// DDL statements
// ============================================================================

/// `CREATE TABLE` from ordered column specs plus optional constraint text
pub fn create_table(
    table: &str,
    columns: &[(String, String)],
    constraints: &[String],
) -> BuildResult {
    if columns.is_empty() {
        return Err((
            ToolErrorKind::MalformedArguments,
            "No columns provided for create_table".to_string(),
        ));
    }

    let mut defs: Vec<String> = columns
        .iter()
        .map(|(name, ty)| format!("{} {}", name, ty))
        .collect();
    defs.extend(constraints.iter().cloned());

    Ok(Statement::plain(format!(
        "CREATE TABLE {} ({})",
        table,
        defs.join(", ")
    )))
}

/// Dispatch an `ALTER TABLE` sub-operation.
///
/// Supported kinds: add_column, drop_column, modify_column, add_constraint,
/// drop_constraint. Anything else is `UnsupportedOperation`.
pub fn alter_table(table: &str, operation: &str, details: &Map<String, Value>) -> BuildResult {
    let detail = |key: &str| -> std::result::Result<&str, BuildError> {
        details.get(key).and_then(|v| v.as_str()).ok_or((
            ToolErrorKind::MalformedArguments,
            format!("alter_table '{}' requires detail '{}'", operation, key),
        ))
    };

    let sql = match operation {
        "add_column" => format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table,
            detail("column_name")?,
            detail("column_type")?
        ),
        "drop_column" => format!("ALTER TABLE {} DROP COLUMN {}", table, detail("column_name")?),
        "modify_column" => format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            table,
            detail("column_name")?,
            detail("new_type")?
        ),
        "add_constraint" => format!("ALTER TABLE {} ADD {}", table, detail("constraint")?),
        "drop_constraint" => format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            table,
            detail("constraint_name")?
        ),
        other => {
            return Err((
                ToolErrorKind::UnsupportedOperation,
                format!("ALTER TABLE operation '{}' not supported", other),
            ))
        }
    };

    Ok(Statement::plain(sql))
}

/// `CREATE [UNIQUE] INDEX`
pub fn create_index(
    table: &str,
    index_name: &str,
    columns: &[String],
    unique: bool,
) -> BuildResult {
    if columns.is_empty() {
        return Err((
            ToolErrorKind::MalformedArguments,
            "No columns provided for create_index".to_string(),
        ));
    }

    let unique_keyword = if unique { "UNIQUE " } else { "" };
    Ok(Statement::plain(format!(
        "CREATE {}INDEX {} ON {} ({})",
        unique_keyword,
        index_name,
        table,
        columns.join(", ")
    )))
}

/// `DROP INDEX`
pub fn drop_index(index_name: &str) -> Statement {
    Statement::plain(format!("DROP INDEX {}", index_name))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_insert_statement() {
        let stmt = insert("users", &map(json!({"age": 30, "name": "Ada"}))).unwrap();
        // serde_json maps iterate in key order
        assert_eq!(
            stmt.sql,
            "INSERT INTO users (age, name) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(stmt.params, vec![json!(30), json!("Ada")]);
    }

    #[test]
    fn test_insert_rejects_empty_data() {
        let (kind, _) = insert("users", &Map::new()).unwrap_err();
        assert_eq!(kind, ToolErrorKind::MalformedArguments);
    }

    #[test]
    fn test_select_bare() {
        let stmt = select("users", None, None, None, None);
        assert_eq!(stmt.sql, "SELECT * FROM users");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_full() {
        let conditions = map(json!({"status": "active"}));
        let columns = vec!["id".to_string(), "name".to_string()];
        let stmt = select("users", Some(&conditions), Some(&columns), Some(10), Some("id"));
        assert_eq!(
            stmt.sql,
            "SELECT id, name FROM users WHERE status = $1 ORDER BY id LIMIT 10"
        );
        assert_eq!(stmt.params, vec![json!("active")]);
    }

    #[test]
    fn test_select_multiple_conditions_joined_with_and() {
        let conditions = map(json!({"a": 1, "b": 2}));
        let stmt = select("t", Some(&conditions), None, None, None);
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE a = $1 AND b = $2");
    }

    #[test]
    fn test_update_statement() {
        let stmt = update(
            "orders",
            &map(json!({"status": "shipped"})),
            &map(json!({"id": 7})),
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE orders SET status = $1 WHERE id = $2 RETURNING *"
        );
        assert_eq!(stmt.params, vec![json!("shipped"), json!(7)]);
    }

    #[test]
    fn test_update_rejects_empty_conditions() {
        let (kind, msg) = update("orders", &map(json!({"status": "x"})), &Map::new()).unwrap_err();
        assert_eq!(kind, ToolErrorKind::MalformedArguments);
        assert!(msg.contains("require conditions"));
    }

    #[test]
    fn test_delete_statement() {
        let stmt = delete("orders", &map(json!({"status": "cancelled"}))).unwrap();
        assert_eq!(
            stmt.sql,
            "DELETE FROM orders WHERE status = $1 RETURNING *"
        );
        assert_eq!(stmt.params, vec![json!("cancelled")]);
    }

    #[test]
    fn test_delete_fails_closed_on_empty_conditions() {
        let (kind, _) = delete("orders", &Map::new()).unwrap_err();
        assert_eq!(kind, ToolErrorKind::UnsafeDelete);
    }

    #[test]
    fn test_create_table_statement() {
        let columns = vec![
            ("id".to_string(), "SERIAL PRIMARY KEY".to_string()),
            ("email".to_string(), "VARCHAR(255)".to_string()),
        ];
        let constraints = vec!["UNIQUE(email)".to_string()];
        let stmt = create_table("users", &columns, &constraints).unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE users (id SERIAL PRIMARY KEY, email VARCHAR(255), UNIQUE(email))"
        );
    }

    #[test]
    fn test_alter_table_add_column() {
        let stmt = alter_table(
            "users",
            "add_column",
            &map(json!({"column_name": "email", "column_type": "VARCHAR(255)"})),
        )
        .unwrap();
        assert_eq!(stmt.sql, "ALTER TABLE users ADD COLUMN email VARCHAR(255)");
    }

    #[test]
    fn test_alter_table_modify_column() {
        let stmt = alter_table(
            "users",
            "modify_column",
            &map(json!({"column_name": "age", "new_type": "INTEGER"})),
        )
        .unwrap();
        assert_eq!(stmt.sql, "ALTER TABLE users ALTER COLUMN age TYPE INTEGER");
    }

    #[test]
    fn test_alter_table_unsupported_operation() {
        let (kind, msg) = alter_table("users", "rename_table", &Map::new()).unwrap_err();
        assert_eq!(kind, ToolErrorKind::UnsupportedOperation);
        assert!(msg.contains("rename_table"));
    }

    #[test]
    fn test_alter_table_missing_detail() {
        let (kind, _) = alter_table("users", "add_column", &Map::new()).unwrap_err();
        assert_eq!(kind, ToolErrorKind::MalformedArguments);
    }

    #[test]
    fn test_create_index_statement() {
        let columns = vec!["email".to_string()];
        let stmt = create_index("users", "idx_users_email", &columns, true).unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE UNIQUE INDEX idx_users_email ON users (email)"
        );

        let stmt = create_index("users", "idx_users_email", &columns, false).unwrap();
        assert_eq!(stmt.sql, "CREATE INDEX idx_users_email ON users (email)");
    }

    #[test]
    fn test_drop_index_statement() {
        assert_eq!(drop_index("idx_users_email").sql, "DROP INDEX idx_users_email");
    }

    #[test]
    fn test_introspection_statements_bind_table_name() {
        assert_eq!(table_columns("users").params, vec![json!("users")]);
        assert_eq!(table_constraints("users").params, vec![json!("users")]);
        assert!(list_tables().sql.contains("information_schema.tables"));
        assert_eq!(
            table_row_count("users").sql,
            "SELECT COUNT(*) AS row_count FROM users"
        );
    }
}

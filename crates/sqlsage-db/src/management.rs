// Schema and transaction tools: introspection, DDL, and batched execution.
//
// The introspection tools read information_schema so answers reflect the
// live catalog. The DDL tools accept a constrained vocabulary (the
// alter_table whitelist in `sql`) and report anything outside it as an
// unsupported operation rather than passing raw text to the backend.

use async_trait::async_trait;
use serde_json::{json, Value};

use sqlsage_core::{Tool, ToolErrorKind, ToolResult};

use crate::args::{backend_failure, optional_string_array, require_object, require_str, require_string_array};
use crate::database::Database;
use crate::sql::{self, Statement};

/// List every table in the public schema
pub struct DescribeDatabaseTool {
    db: Database,
}

impl DescribeDatabaseTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for DescribeDatabaseTool {
    fn name(&self) -> &str {
        "describe_database"
    }

    fn description(&self) -> &str {
        "List all tables in the database with their types. Takes no arguments."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _arguments: Value) -> ToolResult {
        match self.db.select_json(&sql::list_tables()).await {
            Ok(tables) => {
                let count = tables.len();
                ToolResult::ok(
                    "Successfully retrieved database schema",
                    json!({ "tables": tables, "table_count": count }),
                )
            }
            Err(err) => backend_failure("describe database", err),
        }
    }
}

/// Columns, constraints and row count for one table
pub struct DescribeTableTool {
    db: Database,
}

impl DescribeTableTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for DescribeTableTool {
    fn name(&self) -> &str {
        "describe_table"
    }

    fn description(&self) -> &str {
        "Describe a table: its columns with types and nullability, its \
         constraints, and its current row count."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to describe"
                }
            },
            "required": ["table_name"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let table = match require_str(&arguments, "table_name") {
            Ok(t) => t,
            Err(fail) => return fail,
        };

        let columns = match self.db.select_json(&sql::table_columns(table)).await {
            Ok(rows) => rows,
            Err(err) => return backend_failure(&format!("describe table {}", table), err),
        };

        if columns.is_empty() {
            return ToolResult::fail(
                ToolErrorKind::BackendFailure,
                format!("Failed to describe table {}", table),
                format!("Table '{}' does not exist", table),
            );
        }

        let constraints = match self.db.select_json(&sql::table_constraints(table)).await {
            Ok(rows) => rows,
            Err(err) => return backend_failure(&format!("describe table {}", table), err),
        };

        let row_count = match self.db.select_json(&sql::table_row_count(table)).await {
            Ok(rows) => rows
                .first()
                .and_then(|r| r.get("row_count"))
                .and_then(|v| v.as_i64())
                .unwrap_or(0),
            Err(err) => return backend_failure(&format!("describe table {}", table), err),
        };

        ToolResult::ok(
            format!("Successfully described table {}", table),
            json!({
                "table_name": table,
                "columns": columns,
                "constraints": constraints,
                "row_count": row_count
            }),
        )
    }
}

/// Create a table from ordered column specs
pub struct CreateTableTool {
    db: Database,
}

impl CreateTableTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CreateTableTool {
    fn name(&self) -> &str {
        "create_table"
    }

    fn description(&self) -> &str {
        "Create a new table. Columns are an ordered list of {name, type} \
         objects; constraints are optional raw constraint clauses."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to create"
                },
                "columns": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "type": {"type": "string"}
                        },
                        "required": ["name", "type"]
                    },
                    "description": "Ordered column definitions, e.g. [{\"name\": \"id\", \"type\": \"SERIAL PRIMARY KEY\"}]"
                },
                "constraints": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Table-level constraint clauses, e.g. [\"UNIQUE(email)\"]"
                }
            },
            "required": ["table_name", "columns"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let table = match require_str(&arguments, "table_name") {
            Ok(t) => t,
            Err(fail) => return fail,
        };
        let columns = match column_specs(&arguments) {
            Ok(c) => c,
            Err(fail) => return fail,
        };
        let constraints = match optional_string_array(&arguments, "constraints") {
            Ok(c) => c.unwrap_or_default(),
            Err(fail) => return fail,
        };

        let stmt = match sql::create_table(table, &columns, &constraints) {
            Ok(stmt) => stmt,
            Err((kind, msg)) => {
                return ToolResult::fail(kind, format!("Failed to create table {}", table), msg)
            }
        };

        match self.db.execute(&stmt).await {
            Ok(_) => ToolResult::ok(
                format!("Successfully created table {}", table),
                json!({ "table_name": table, "column_count": columns.len() }),
            ),
            Err(err) => backend_failure(&format!("create table {}", table), err),
        }
    }
}

/// Alter an existing table through the supported sub-operations
pub struct AlterTableTool {
    db: Database,
}

impl AlterTableTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for AlterTableTool {
    fn name(&self) -> &str {
        "alter_table"
    }

    fn description(&self) -> &str {
        "Alter a table. Supported operations: add_column, drop_column, \
         modify_column, add_constraint, drop_constraint. Details depend on \
         the operation (column_name, column_type, new_type, constraint, \
         constraint_name)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to alter"
                },
                "operation": {
                    "type": "string",
                    "enum": ["add_column", "drop_column", "modify_column", "add_constraint", "drop_constraint"],
                    "description": "Which alteration to perform"
                },
                "details": {
                    "type": "object",
                    "description": "Operation-specific details"
                }
            },
            "required": ["table_name", "operation", "details"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let table = match require_str(&arguments, "table_name") {
            Ok(t) => t,
            Err(fail) => return fail,
        };
        let operation = match require_str(&arguments, "operation") {
            Ok(o) => o,
            Err(fail) => return fail,
        };
        let details = match require_object(&arguments, "details") {
            Ok(d) => d,
            Err(fail) => return fail,
        };

        let stmt = match sql::alter_table(table, operation, &details) {
            Ok(stmt) => stmt,
            Err((kind, msg)) => {
                return ToolResult::fail(kind, format!("Failed to alter table {}", table), msg)
            }
        };

        match self.db.execute(&stmt).await {
            Ok(_) => ToolResult::ok(
                format!("Successfully altered table {} ({})", table, operation),
                json!({ "table_name": table, "operation": operation }),
            ),
            Err(err) => backend_failure(&format!("alter table {}", table), err),
        }
    }
}

/// Create an index, optionally unique
pub struct CreateIndexTool {
    db: Database,
}

impl CreateIndexTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CreateIndexTool {
    fn name(&self) -> &str {
        "create_index"
    }

    fn description(&self) -> &str {
        "Create an index on one or more columns of a table. Set unique to \
         true for a unique index."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to index"
                },
                "index_name": {
                    "type": "string",
                    "description": "Name for the new index"
                },
                "columns": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Columns to index"
                },
                "unique": {
                    "type": "boolean",
                    "description": "Whether to create a unique index (default false)"
                }
            },
            "required": ["table_name", "index_name", "columns"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let table = match require_str(&arguments, "table_name") {
            Ok(t) => t,
            Err(fail) => return fail,
        };
        let index_name = match require_str(&arguments, "index_name") {
            Ok(n) => n,
            Err(fail) => return fail,
        };
        let columns = match require_string_array(&arguments, "columns") {
            Ok(c) => c,
            Err(fail) => return fail,
        };
        let unique = arguments
            .get("unique")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let stmt = match sql::create_index(table, index_name, &columns, unique) {
            Ok(stmt) => stmt,
            Err((kind, msg)) => {
                return ToolResult::fail(kind, format!("Failed to create index {}", index_name), msg)
            }
        };

        match self.db.execute(&stmt).await {
            Ok(_) => ToolResult::ok(
                format!("Successfully created index {} on {}", index_name, table),
                json!({ "index_name": index_name, "table_name": table, "unique": unique }),
            ),
            Err(err) => backend_failure(&format!("create index {}", index_name), err),
        }
    }
}

/// Drop an index by name
pub struct DropIndexTool {
    db: Database,
}

impl DropIndexTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for DropIndexTool {
    fn name(&self) -> &str {
        "drop_index"
    }

    fn description(&self) -> &str {
        "Drop an existing index by name."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "index_name": {
                    "type": "string",
                    "description": "Name of the index to drop"
                }
            },
            "required": ["index_name"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let index_name = match require_str(&arguments, "index_name") {
            Ok(n) => n,
            Err(fail) => return fail,
        };

        match self.db.execute(&sql::drop_index(index_name)).await {
            Ok(_) => ToolResult::ok(
                format!("Successfully dropped index {}", index_name),
                json!({ "index_name": index_name }),
            ),
            Err(err) => backend_failure(&format!("drop index {}", index_name), err),
        }
    }
}

/// Run a batch of statements atomically, or roll the session back
pub struct ManageTransactionTool {
    db: Database,
}

impl ManageTransactionTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ManageTransactionTool {
    fn name(&self) -> &str {
        "manage_transaction"
    }

    fn description(&self) -> &str {
        "Execute multiple SQL statements in one transaction (mode 'commit'), \
         or roll back (mode 'rollback'). In commit mode all statements \
         succeed together or none apply."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mode": {
                    "type": "string",
                    "enum": ["commit", "rollback"],
                    "description": "Transaction mode"
                },
                "operations": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "SQL statements to run (commit mode only)"
                }
            },
            "required": ["mode"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let mode = match require_str(&arguments, "mode") {
            Ok(m) => m,
            Err(fail) => return fail,
        };

        match mode {
            "commit" => {
                let operations = match require_string_array(&arguments, "operations") {
                    Ok(ops) => ops,
                    Err(fail) => return fail,
                };
                let statements: Vec<Statement> = operations
                    .iter()
                    .map(|op| Statement::plain(op.as_str()))
                    .collect();

                match self.db.run_transaction(&statements).await {
                    Ok(count) => ToolResult::ok(
                        format!("Successfully executed {} operations in transaction", count),
                        json!({ "operations_count": count }),
                    ),
                    Err(err) => backend_failure("execute transaction", err),
                }
            }
            "rollback" => match self.db.rollback().await {
                Ok(()) => ToolResult::ok_empty("Transaction rolled back"),
                Err(err) => backend_failure("roll back transaction", err),
            },
            other => ToolResult::fail(
                ToolErrorKind::InvalidMode,
                "Invalid transaction mode",
                format!("Unknown transaction mode: '{}' (expected 'commit' or 'rollback')", other),
            ),
        }
    }
}

/// Parse the ordered `columns` list of {name, type} objects
fn column_specs(arguments: &Value) -> Result<Vec<(String, String)>, ToolResult> {
    let malformed = || {
        ToolResult::fail(
            ToolErrorKind::MalformedArguments,
            "Invalid arguments: 'columns' must be a non-empty array of {name, type} objects",
            "Missing or invalid argument: columns",
        )
    };

    let Some(items) = arguments.get("columns").and_then(|v| v.as_array()) else {
        return Err(malformed());
    };
    if items.is_empty() {
        return Err(malformed());
    }

    let mut specs = Vec::with_capacity(items.len());
    for item in items {
        let name = item.get("name").and_then(|v| v.as_str());
        let ty = item.get("type").and_then(|v| v.as_str());
        match (name, ty) {
            (Some(name), Some(ty)) => specs.push((name.to_string(), ty.to_string())),
            _ => return Err(malformed()),
        }
    }
    Ok(specs)
}

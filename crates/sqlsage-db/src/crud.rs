// Record-level tools: create, read, update, delete.
//
// Each tool builds its statement through `sql`, runs it through the shared
// Database layer, and folds every outcome, including backend errors, into
// the uniform ToolResult envelope. Update and delete refuse to run without
// conditions; that check happens before any backend round trip.

use async_trait::async_trait;
use serde_json::{json, Value};

use sqlsage_core::{Tool, ToolResult};

use crate::args::{
    backend_failure, optional_i64, optional_object, optional_str, optional_string_array,
    require_object, require_str,
};
use crate::database::Database;
use crate::sql;

/// Insert one record and return it
pub struct CreateRecordTool {
    db: Database,
}

impl CreateRecordTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CreateRecordTool {
    fn name(&self) -> &str {
        "create_record"
    }

    fn description(&self) -> &str {
        "Create a new record in a table. Provide the table name and a data \
         object mapping column names to values."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to insert into"
                },
                "data": {
                    "type": "object",
                    "description": "Column name to value mapping for the new record"
                }
            },
            "required": ["table_name", "data"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let table = match require_str(&arguments, "table_name") {
            Ok(t) => t,
            Err(fail) => return fail,
        };
        let data = match require_object(&arguments, "data") {
            Ok(d) => d,
            Err(fail) => return fail,
        };

        let stmt = match sql::insert(table, &data) {
            Ok(stmt) => stmt,
            Err((kind, msg)) => {
                return ToolResult::fail(kind, format!("Failed to create record in {}", table), msg)
            }
        };

        match self.db.returning_json(&stmt).await {
            Ok(rows) => ToolResult::ok(
                format!("Successfully created record in {}", table),
                json!({ "record": rows.into_iter().next().unwrap_or(Value::Null) }),
            ),
            Err(err) => backend_failure(&format!("create record in {}", table), err),
        }
    }
}

/// Query records with optional filters, projection, ordering and limit
pub struct ReadRecordsTool {
    db: Database,
}

impl ReadRecordsTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ReadRecordsTool {
    fn name(&self) -> &str {
        "read_records"
    }

    fn description(&self) -> &str {
        "Read records from a table. Supports equality conditions, column \
         selection, ordering and a row limit."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to read from"
                },
                "conditions": {
                    "type": "object",
                    "description": "Equality filters as column name to value mapping"
                },
                "columns": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Columns to return (all columns when omitted)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of rows to return"
                },
                "order_by": {
                    "type": "string",
                    "description": "Column to order by, e.g. 'id' or 'created_at DESC'"
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
        let conditions = match optional_object(&arguments, "conditions") {
            Ok(c) => c,
            Err(fail) => return fail,
        };
        let columns = match optional_string_array(&arguments, "columns") {
            Ok(c) => c,
            Err(fail) => return fail,
        };

        let stmt = sql::select(
            table,
            Some(&conditions),
            columns.as_deref(),
            optional_i64(&arguments, "limit"),
            optional_str(&arguments, "order_by"),
        );

        match self.db.select_json(&stmt).await {
            Ok(rows) => {
                let count = rows.len();
                ToolResult::ok(
                    format!("Successfully retrieved {} records from {}", count, table),
                    json!({ "data": rows, "count": count }),
                )
            }
            Err(err) => backend_failure(&format!("read records from {}", table), err),
        }
    }
}

/// Update matching records; refuses to run without conditions
pub struct UpdateRecordTool {
    db: Database,
}

impl UpdateRecordTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for UpdateRecordTool {
    fn name(&self) -> &str {
        "update_record"
    }

    fn description(&self) -> &str {
        "Update records in a table. Requires equality conditions selecting \
         the rows to change; unconditional updates are refused."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to update"
                },
                "data": {
                    "type": "object",
                    "description": "Column name to new value mapping"
                },
                "conditions": {
                    "type": "object",
                    "description": "Equality filters selecting the rows to update"
                }
            },
            "required": ["table_name", "data"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let table = match require_str(&arguments, "table_name") {
            Ok(t) => t,
            Err(fail) => return fail,
        };
        let data = match require_object(&arguments, "data") {
            Ok(d) => d,
            Err(fail) => return fail,
        };
        let conditions = match optional_object(&arguments, "conditions") {
            Ok(c) => c,
            Err(fail) => return fail,
        };

        let stmt = match sql::update(table, &data, &conditions) {
            Ok(stmt) => stmt,
            Err((kind, msg)) => {
                return ToolResult::fail(kind, format!("Failed to update records in {}", table), msg)
            }
        };

        match self.db.returning_json(&stmt).await {
            Ok(rows) => {
                let count = rows.len();
                ToolResult::ok(
                    format!("Successfully updated {} records in {}", count, table),
                    json!({ "updated_count": count, "records": rows }),
                )
            }
            Err(err) => backend_failure(&format!("update records in {}", table), err),
        }
    }
}

/// Delete matching records; fails closed when no conditions are given
pub struct DeleteRecordTool {
    db: Database,
}

impl DeleteRecordTool {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for DeleteRecordTool {
    fn name(&self) -> &str {
        "delete_record"
    }

    fn description(&self) -> &str {
        "Delete records from a table. Requires equality conditions selecting \
         the rows to remove; unconditional deletes are refused."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to delete from"
                },
                "conditions": {
                    "type": "object",
                    "description": "Equality filters selecting the rows to delete"
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
        let conditions = match optional_object(&arguments, "conditions") {
            Ok(c) => c,
            Err(fail) => return fail,
        };

        let stmt = match sql::delete(table, &conditions) {
            Ok(stmt) => stmt,
            Err((kind, msg)) => {
                return ToolResult::fail(
                    kind,
                    format!("Failed to delete records from {}", table),
                    msg,
                )
            }
        };

        match self.db.returning_json(&stmt).await {
            Ok(rows) => {
                let count = rows.len();
                ToolResult::ok(
                    format!("Successfully deleted {} records from {}", count, table),
                    json!({ "deleted_count": count }),
                )
            }
            Err(err) => backend_failure(&format!("delete records from {}", table), err),
        }
    }
}

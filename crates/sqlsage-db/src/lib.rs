// PostgreSQL Tool Set
//
// Implements the eleven database tools the agent can request: four
// record-level operations, schema introspection, DDL, and transaction
// management. Everything runs over one shared PgPool; every tool folds
// its outcome, including backend errors, into the ToolResult envelope.
//
// Key design decisions:
// - Statement construction (and every safety guard) lives in `sql` as
//   pure functions, testable without a live server
// - Rows travel as JSON via row_to_json, so arbitrary user tables need
//   no compile-time row types
// - Update and delete refuse to run without filter conditions

pub mod crud;
pub mod database;
pub mod management;
pub mod sql;

mod args;

pub use crud::{CreateRecordTool, DeleteRecordTool, ReadRecordsTool, UpdateRecordTool};
pub use database::Database;
pub use management::{
    AlterTableTool, CreateIndexTool, CreateTableTool, DescribeDatabaseTool, DescribeTableTool,
    DropIndexTool, ManageTransactionTool,
};

use sqlsage_core::ToolRegistry;

/// Build the full database tool registry over one shared pool.
///
/// Registers all eleven tools; the agent decides which to call.
pub fn database_tool_registry(db: Database) -> ToolRegistry {
    ToolRegistry::builder()
        .tool(CreateRecordTool::new(db.clone()))
        .tool(ReadRecordsTool::new(db.clone()))
        .tool(UpdateRecordTool::new(db.clone()))
        .tool(DeleteRecordTool::new(db.clone()))
        .tool(DescribeDatabaseTool::new(db.clone()))
        .tool(DescribeTableTool::new(db.clone()))
        .tool(CreateTableTool::new(db.clone()))
        .tool(AlterTableTool::new(db.clone()))
        .tool(CreateIndexTool::new(db.clone()))
        .tool(DropIndexTool::new(db.clone()))
        .tool(ManageTransactionTool::new(db))
        .build()
}

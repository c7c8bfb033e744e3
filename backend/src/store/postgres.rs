//! `PostgreSQL` task store on a shared `sqlx::PgPool`.
//!
//! The pool is opened once at startup and closed on shutdown. Every
//! operation is one round trip except `update`, which reads the current row
//! and then issues a single `UPDATE ... RETURNING`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use todo_shared::{Todo, UpdateTodoRequest};

use super::{TodoChanges, TodoStore};
use crate::config::DatabaseConfig;
use crate::error::StoreError;

const COLUMNS: &str = "id, title, description, completed, created_at, updated_at, completed_at";

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and pings the server; an unreachable database is an error.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn create(&self, title: String, description: String) -> Result<Todo, StoreError> {
        let row: TodoRow = sqlx::query_as(&format!(
            "INSERT INTO todos (title, description, created_at, updated_at) \
             VALUES ($1, $2, NOW(), NOW()) \
             RETURNING {COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM todos ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let row: Option<TodoRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM todos WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Todo::from))
    }

    async fn update(
        &self,
        id: i64,
        request: UpdateTodoRequest,
    ) -> Result<Option<Todo>, StoreError> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };
        let changes = TodoChanges::resolve(&current, request);

        // $3 is NULL unless `completed` flips; completed_at follows it.
        let row: Option<TodoRow> = sqlx::query_as(&format!(
            "UPDATE todos \
             SET title = $1, \
                 description = $2, \
                 completed = COALESCE($3::BOOLEAN, completed), \
                 completed_at = CASE \
                     WHEN $3::BOOLEAN IS NULL THEN completed_at \
                     WHEN $3::BOOLEAN THEN NOW() \
                     ELSE NULL \
                 END, \
                 updated_at = NOW() \
             WHERE id = $4 \
             RETURNING {COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Todo::from))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

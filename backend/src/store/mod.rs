mod memory;
mod postgres;

pub use memory::MemoryTodoStore;
pub use postgres::PgTodoStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use todo_shared::{Todo, UpdateTodoRequest};

use crate::error::StoreError;

/// Persistence for todos. `None` from `get`/`update` means no row has that id.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, title: String, description: String) -> Result<Todo, StoreError>;

    /// Every todo, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Todo>, StoreError>;

    /// Reconciles `request` against the current row and writes the result.
    /// Callers must not assume isolation between concurrent updates to one id:
    /// `PgTodoStore` reads and writes in two separate statements and can lose a
    /// write, while `MemoryTodoStore` holds its lock across both steps.
    async fn update(&self, id: i64, request: UpdateTodoRequest)
        -> Result<Option<Todo>, StoreError>;

    /// Missing ids are not an error.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// The full set of mutable values a partial update resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: String,
    pub description: String,
    /// `Some` only when `completed` actually flips.
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn resolve(current: &Todo, request: UpdateTodoRequest) -> Self {
        let completed = request
            .completed
            .into_option()
            .filter(|&completed| completed != current.completed);

        TodoChanges {
            title: request.title.unwrap_or(current.title.clone()),
            description: request.description.unwrap_or(current.description.clone()),
            completed,
        }
    }

    pub fn apply(self, todo: &mut Todo, now: DateTime<Utc>) {
        todo.title = self.title;
        todo.description = self.description;
        if let Some(completed) = self.completed {
            todo.completed = completed;
            todo.completed_at = completed.then_some(now);
        }
        todo.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use todo_shared::Patch;

    fn todo(completed: bool) -> Todo {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Todo {
            id: 1,
            title: "Write report".into(),
            description: "Q1 numbers".into(),
            completed,
            created_at: created,
            updated_at: created,
            completed_at: completed.then_some(created),
        }
    }

    fn request(completed: Patch<bool>) -> UpdateTodoRequest {
        UpdateTodoRequest {
            completed,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(false, Patch::Set(true), Some(true))]
    #[case(true, Patch::Set(false), Some(false))]
    #[case(false, Patch::Set(false), None)]
    #[case(true, Patch::Set(true), None)]
    #[case(false, Patch::Unset, None)]
    #[case(true, Patch::Unset, None)]
    fn completion_flag_only_set_on_transition(
        #[case] current: bool,
        #[case] requested: Patch<bool>,
        #[case] expected: Option<bool>,
    ) {
        let changes = TodoChanges::resolve(&todo(current), request(requested));
        assert_eq!(changes.completed, expected);
    }

    #[test]
    fn unset_text_fields_keep_current_values() {
        let changes = TodoChanges::resolve(&todo(false), UpdateTodoRequest::default());
        assert_eq!(changes.title, "Write report");
        assert_eq!(changes.description, "Q1 numbers");
    }

    #[test]
    fn empty_description_is_applied() {
        let update = UpdateTodoRequest {
            description: Patch::Set(String::new()),
            ..Default::default()
        };
        let changes = TodoChanges::resolve(&todo(false), update);
        assert_eq!(changes.description, "");
    }

    #[test]
    fn completing_stamps_completed_at() {
        let mut current = todo(false);
        let now = current.updated_at + Duration::minutes(5);
        TodoChanges::resolve(&current, request(Patch::Set(true))).apply(&mut current, now);
        assert!(current.completed);
        assert_eq!(current.completed_at, Some(now));
        assert_eq!(current.updated_at, now);
    }

    #[test]
    fn reopening_clears_completed_at() {
        let mut current = todo(true);
        let now = current.updated_at + Duration::minutes(5);
        TodoChanges::resolve(&current, request(Patch::Set(false))).apply(&mut current, now);
        assert!(!current.completed);
        assert_eq!(current.completed_at, None);
    }

    #[test]
    fn repeat_completion_keeps_timestamp_even_with_title_change() {
        let mut current = todo(true);
        let before = current.completed_at;
        let now = current.updated_at + Duration::minutes(5);
        let update = UpdateTodoRequest {
            title: Patch::Set("Write final report".into()),
            completed: Patch::Set(true),
            ..Default::default()
        };
        TodoChanges::resolve(&current, update).apply(&mut current, now);
        assert_eq!(current.title, "Write final report");
        assert_eq!(current.completed_at, before);
        assert_eq!(current.updated_at, now);
        assert_eq!(current.created_at, todo(true).created_at);
    }
}

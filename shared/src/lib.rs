use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub completed: Patch<bool>,
}

/// A field of a partial update.
///
/// `Unset` means the client did not send the field (or sent `null`) and the
/// stored value must be kept. `Set` carries the new value, which may well be
/// `false` or an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Unset => None,
        }
    }

    pub fn unwrap_or(self, current: T) -> T {
        self.into_option().unwrap_or(current)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Unset, Patch::Set)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            Patch::Unset => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_todo() -> Todo {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Todo {
            id: 7,
            title: "Buy groceries".into(),
            description: "Milk, eggs".into(),
            completed: false,
            created_at: at,
            updated_at: at,
            completed_at: None,
        }
    }

    #[test]
    fn omitted_fields_stay_unset() {
        let request: UpdateTodoRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request, UpdateTodoRequest::default());
    }

    #[test]
    fn explicit_false_and_empty_are_set() {
        let request: UpdateTodoRequest =
            serde_json::from_value(json!({"title": "", "completed": false})).unwrap();
        assert_eq!(request.title, Patch::Set(String::new()));
        assert_eq!(request.completed, Patch::Set(false));
        assert!(request.description.is_unset());
    }

    #[test]
    fn null_counts_as_unset() {
        let request: UpdateTodoRequest =
            serde_json::from_value(json!({"completed": null})).unwrap();
        assert!(request.completed.is_unset());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = serde_json::from_value::<UpdateTodoRequest>(json!({"completed": "yes"}));
        assert!(result.is_err());
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let request = UpdateTodoRequest {
            completed: Patch::Set(true),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"completed": true}));
    }

    #[test]
    fn create_request_defaults_missing_fields() {
        let request: CreateTodoRequest =
            serde_json::from_value(json!({"description": "no title"})).unwrap();
        assert_eq!(request.title, "");
        assert_eq!(request.description, "no title");
    }

    #[test]
    fn completed_at_is_omitted_when_absent() {
        let value = serde_json::to_value(sample_todo()).unwrap();
        assert!(value.get("completed_at").is_none());
        assert_eq!(value["created_at"], json!("2024-03-01T09:30:00Z"));
    }

    #[test]
    fn completed_at_is_present_when_set() {
        let mut todo = sample_todo();
        todo.completed = true;
        todo.completed_at = Some(todo.updated_at);
        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["completed_at"], json!("2024-03-01T09:30:00Z"));
    }
}

//! Todo item: the element type of the document's `todos` list.

use serde::{Deserialize, Serialize};

use super::ids::TodoId;

/// One entry of the todo list.
///
/// The field names match what every client writes into the CRDT list
/// (`id`, `text`, `completed`), so documents created elsewhere load as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoItem {
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }

    /// Copy of this item with `completed` inverted.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_not_completed() {
        let item = TodoItem::new(TodoId::new("todo_1"), "write tests");
        assert!(!item.completed);
    }

    #[test]
    fn toggled_keeps_identity_and_text() {
        let item = TodoItem::new(TodoId::new("todo_1"), "write tests");
        let toggled = item.toggled();

        assert_eq!(toggled.id, item.id);
        assert_eq!(toggled.text, item.text);
        assert!(toggled.completed);
        assert_eq!(toggled.toggled(), item);
    }

    #[test]
    fn missing_completed_defaults_to_false() {
        let item: TodoItem = serde_json::from_str(r#"{"id":"1","text":"Test Loro"}"#).unwrap();
        assert_eq!(item.id, TodoId::new("1"));
        assert!(!item.completed);
    }
}

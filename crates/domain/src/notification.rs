use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

/// One notification surfaced by the API alongside a response.
///
/// APIs emit these in loosely structured shapes; anything that does not
/// carry an explicit `field`/`message` pair is kept as opaque text or
/// payload and matched by substring search instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    /// A structured warning about a specific request field.
    FieldWarning {
        /// The field the warning refers to.
        field: String,
        /// Human-readable warning text.
        message: String,
    },
    /// Free-form warning text.
    Text(String),
    /// Opaque structured payload.
    Payload(Value),
}

impl Notification {
    /// Classifies one raw notification value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if let Value::Object(object) = &value
            && let (Some(field), Some(message)) = (
                object.get("field").and_then(Value::as_str),
                object.get("message").and_then(Value::as_str),
            )
        {
            return Self::FieldWarning {
                field: field.to_owned(),
                message: message.to_owned(),
            };
        }

        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Payload(other),
        }
    }
}

/// The notifications attached to one response, with a field index for
/// structured warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationLog {
    notifications: Vec<Notification>,
    warned_fields: BTreeSet<String>,
}

impl NotificationLog {
    /// Builds a log from classified notifications.
    #[must_use]
    pub fn new(notifications: Vec<Notification>) -> Self {
        let warned_fields = notifications
            .iter()
            .filter_map(|notification| match notification {
                Notification::FieldWarning { field, .. } => Some(field.to_lowercase()),
                _ => None,
            })
            .collect();

        Self {
            notifications,
            warned_fields,
        }
    }

    /// Builds a log from the raw notification value of a response: an
    /// array is classified element-wise, anything else as one notification.
    #[must_use]
    pub fn from_response_value(value: Option<Value>) -> Self {
        let notifications = match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.into_iter().map(Notification::from_value).collect(),
            Some(other) => vec![Notification::from_value(other)],
        };

        Self::new(notifications)
    }

    /// Returns the classified notifications.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Returns whether the API flagged the given field.
    ///
    /// Structured warnings are answered from the field index; text and
    /// opaque payloads fall back to a case-insensitive substring search,
    /// which is how loosely shaped warning channels name their fields.
    #[must_use]
    pub fn mentions_field(&self, field: &str) -> bool {
        let needle = field.to_lowercase();
        if self.warned_fields.contains(&needle) {
            return true;
        }

        self.notifications
            .iter()
            .any(|notification| match notification {
                Notification::FieldWarning { .. } => false,
                Notification::Text(text) => text.to_lowercase().contains(&needle),
                Notification::Payload(payload) => {
                    payload.to_string().to_lowercase().contains(&needle)
                }
            })
    }

    /// Returns whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

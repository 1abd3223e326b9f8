//! Interactive notification actions.
//!
//! A notification may offer the recipient a list of actions. The service
//! accepts two shapes, and a list must use exactly one of them:
//!
//! - **Feedback actions**: plain labels (`["yes", "no"]`). The selected label
//!   is reported through the feedback endpoint.
//! - **GET actions**: `{name, url}` objects. Selecting one makes the app call
//!   the URL.
//!
//! [`validate_actions`] checks arbitrary JSON against these rules;
//! [`Actions`] is the validated, typed form attached to a
//! [`Notification`](crate::Notification).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Result, SimplepushError};

/// A validated, homogeneous list of actions.
///
/// Serializes to the JSON array the service expects. Link objects are kept
/// verbatim, so keys beyond `name` and `url` pass through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Actions {
    /// Plain labels reported back through feedback.
    Labels(Vec<String>),
    /// Objects carrying at least `name` and `url`.
    Links(Vec<Map<String, Value>>),
}

impl Actions {
    /// Build feedback actions from labels.
    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Labels(labels.into_iter().map(Into::into).collect())
    }

    /// Build GET actions from `(name, url)` pairs.
    pub fn links<I, N, U>(links: I) -> Self
    where
        I: IntoIterator<Item = (N, U)>,
        N: Into<String>,
        U: Into<String>,
    {
        Self::Links(
            links
                .into_iter()
                .map(|(name, url)| {
                    let mut entry = Map::new();
                    entry.insert("name".to_string(), Value::String(name.into()));
                    entry.insert("url".to_string(), Value::String(url.into()));
                    entry
                })
                .collect(),
        )
    }

    /// Validate arbitrary JSON and convert it into typed actions.
    ///
    /// An empty array becomes empty [`Actions::Labels`].
    pub fn from_value(value: Value) -> Result<Self> {
        validate_actions(Some(&value))?;

        let Value::Array(items) = value else {
            return Err(SimplepushError::MalformedActions(
                "actions must be a list".to_string(),
            ));
        };

        if items.first().is_some_and(|first| !first.is_string()) {
            let links = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            return Ok(Self::Links(links));
        }

        let labels = items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(label) => Some(label),
                _ => None,
            })
            .collect();
        Ok(Self::Labels(labels))
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        match self {
            Self::Labels(labels) => labels.len(),
            Self::Links(links) => links.len(),
        }
    }

    /// True when the list holds no actions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for feedback (label) actions, which is when polling makes sense.
    pub fn expects_feedback(&self) -> bool {
        matches!(self, Self::Labels(labels) if !labels.is_empty())
    }

    /// JSON form attached to the send payload.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Labels(labels) => {
                Value::Array(labels.iter().cloned().map(Value::String).collect())
            }
            Self::Links(links) => Value::Array(links.iter().cloned().map(Value::Object).collect()),
        }
    }
}

impl<'de> Deserialize<'de> for Actions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Actions::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Check that `actions` is absent, or a list of only labels or only links.
///
/// The first element decides which shape the whole list must have.
pub fn validate_actions(actions: Option<&Value>) -> Result<()> {
    let items = match actions {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SimplepushError::MalformedActions(
                "actions must be a list".to_string(),
            ))
        }
    };

    let Some(first) = items.first() else {
        return Ok(());
    };

    if first.is_string() {
        if let Some(index) = items.iter().position(|item| !item.is_string()) {
            return Err(SimplepushError::MalformedActions(format!(
                "feedback actions must all be strings (element {} is not)",
                index
            )));
        }
        return Ok(());
    }

    for (index, item) in items.iter().enumerate() {
        let Value::Object(entry) = item else {
            return Err(SimplepushError::MalformedActions(format!(
                "get action {} is not an object",
                index
            )));
        };
        if !entry.contains_key("name") || !entry.contains_key("url") {
            return Err(SimplepushError::MalformedActions(format!(
                "get action {} needs both name and url",
                index
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_valid_shapes() {
        assert!(validate_actions(None).is_ok());
        assert!(validate_actions(Some(&Value::Null)).is_ok());
        assert!(validate_actions(Some(&json!([]))).is_ok());
        assert!(validate_actions(Some(&json!(["a", "b"]))).is_ok());
        assert!(validate_actions(Some(&json!([{"name": "n", "url": "u"}]))).is_ok());
    }

    #[test]
    fn test_rejects_non_list() {
        let err = validate_actions(Some(&json!("not-a-list"))).unwrap_err();
        assert!(matches!(err, SimplepushError::MalformedActions(_)));

        assert!(validate_actions(Some(&json!({"name": "n", "url": "u"}))).is_err());
    }

    #[test]
    fn test_rejects_mixed_list() {
        let err = validate_actions(Some(&json!(["a", {"name": "n", "url": "u"}]))).unwrap_err();
        assert!(matches!(err, SimplepushError::MalformedActions(_)));

        // first element decides: objects first, then a string
        assert!(validate_actions(Some(&json!([{"name": "n", "url": "u"}, "a"]))).is_err());
    }

    #[test]
    fn test_rejects_incomplete_links() {
        assert!(validate_actions(Some(&json!([{"name": "n"}]))).is_err());
        assert!(validate_actions(Some(&json!([{"url": "u"}]))).is_err());
        assert!(validate_actions(Some(&json!([{"name": "n", "url": "u"}, {"name": "m"}]))).is_err());
    }

    #[test]
    fn test_link_extra_keys_allowed() {
        let value = json!([{"name": "n", "url": "u", "method": "GET"}]);
        let actions = Actions::from_value(value.clone()).unwrap();
        assert_eq!(actions.to_value(), value);
    }

    #[test]
    fn test_from_value_typed() {
        let actions = Actions::from_value(json!(["yes", "no"])).unwrap();
        assert_eq!(actions, Actions::labels(["yes", "no"]));
        assert!(actions.expects_feedback());

        let actions = Actions::from_value(json!([{"name": "Open", "url": "https://x"}])).unwrap();
        assert_eq!(actions, Actions::links([("Open", "https://x")]));
        assert!(!actions.expects_feedback());

        let empty = Actions::from_value(json!([])).unwrap();
        assert!(empty.is_empty());
        assert!(!empty.expects_feedback());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let labels = serde_json::to_value(Actions::labels(["a"])).unwrap();
        assert_eq!(labels, json!(["a"]));

        let links = serde_json::to_value(Actions::links([("n", "u")])).unwrap();
        assert_eq!(links, json!([{"name": "n", "url": "u"}]));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Actions = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(ok.len(), 2);

        let bad: std::result::Result<Actions, _> = serde_json::from_str(r#"["a",{"name":"n"}]"#);
        assert!(bad.is_err());
    }
}

use serde::{Deserialize, Serialize};

/// Literal kind of a stored value, resolved once when the dataset is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueLiteral {
    Text,
    Boolean(bool),
}

impl ValueLiteral {
    /// Classify a value name. Only the exact literals `True` and `False` are booleans.
    pub fn from_name(name: &str) -> Self {
        match name {
            "True" => ValueLiteral::Boolean(true),
            "False" => ValueLiteral::Boolean(false),
            _ => ValueLiteral::Text,
        }
    }
}

/// Projected content of one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Text(String),
    /// Multi-valued property, in the dataset's stored order
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::List(values) => write!(f, "{}", values.join("|")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only_exact_case() {
        assert_eq!(ValueLiteral::from_name("True"), ValueLiteral::Boolean(true));
        assert_eq!(ValueLiteral::from_name("False"), ValueLiteral::Boolean(false));
        assert_eq!(ValueLiteral::from_name("true"), ValueLiteral::Text);
        assert_eq!(ValueLiteral::from_name("Yes"), ValueLiteral::Text);
    }

    #[test]
    fn test_property_value_serializes_untagged() {
        let json = serde_json::to_string(&PropertyValue::Boolean(true)).unwrap();
        assert_eq!(json, "true");

        let json = serde_json::to_string(&PropertyValue::List(vec![
            "jpg".to_string(),
            "png".to_string(),
        ]))
        .unwrap();
        assert_eq!(json, r#"["jpg","png"]"#);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(PropertyValue::Boolean(false).as_bool(), Some(false));
        assert_eq!(PropertyValue::Text("Apple".into()).as_text(), Some("Apple"));
        assert!(PropertyValue::Text("Apple".into()).as_list().is_none());
    }
}

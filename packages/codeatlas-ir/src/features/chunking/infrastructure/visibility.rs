//! Symbol Visibility Extractor
//!
//! Determines symbol visibility from explicit attributes first, then
//! language-specific naming conventions:
//! - Python: `_name` internal, `__name` private
//! - Go: uppercase initial is public, lowercase private
//! - TypeScript/Java: modifier keywords in attrs

use std::collections::HashMap;

/// Symbol visibility level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Exported, external API
    Public,
    /// Package/module-internal
    Internal,
    /// Class/file-private
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

pub struct VisibilityExtractor;

impl VisibilityExtractor {
    /// Extract visibility from name, language and optional attrs
    pub fn extract(
        name: &str,
        language: &str,
        attrs: Option<&HashMap<String, serde_json::Value>>,
    ) -> Visibility {
        // Explicit attribute wins
        if let Some(attrs) = attrs {
            if let Some(vis) = attrs.get("visibility").and_then(|v| v.as_str()) {
                return match vis {
                    "private" => Visibility::Private,
                    "internal" | "protected" => Visibility::Internal,
                    _ => Visibility::Public,
                };
            }
            if let Some(modifiers) = attrs.get("modifiers").and_then(|v| v.as_array()) {
                let has = |kw: &str| modifiers.iter().any(|m| m.as_str() == Some(kw));
                if has("private") {
                    return Visibility::Private;
                }
                if has("protected") || has("internal") {
                    return Visibility::Internal;
                }
            }
        }

        match language {
            "python" => {
                if name.starts_with("__") && !name.ends_with("__") {
                    Visibility::Private
                } else if name.starts_with('_') {
                    Visibility::Internal
                } else {
                    Visibility::Public
                }
            }
            "go" => {
                if name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    Visibility::Public
                } else {
                    Visibility::Private
                }
            }
            "rust" => {
                // Without an explicit `pub` attr, assume module-internal
                Visibility::Internal
            }
            _ => Visibility::Public,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_conventions() {
        assert_eq!(
            VisibilityExtractor::extract("handler", "python", None),
            Visibility::Public
        );
        assert_eq!(
            VisibilityExtractor::extract("_helper", "python", None),
            Visibility::Internal
        );
        assert_eq!(
            VisibilityExtractor::extract("__secret", "python", None),
            Visibility::Private
        );
        // Dunders are public protocol methods
        assert_eq!(
            VisibilityExtractor::extract("__init__", "python", None),
            Visibility::Public
        );
    }

    #[test]
    fn test_go_conventions() {
        assert_eq!(
            VisibilityExtractor::extract("Handler", "go", None),
            Visibility::Public
        );
        assert_eq!(
            VisibilityExtractor::extract("handler", "go", None),
            Visibility::Private
        );
    }

    #[test]
    fn test_explicit_attr_wins() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "visibility".to_string(),
            serde_json::Value::String("private".to_string()),
        );
        assert_eq!(
            VisibilityExtractor::extract("Handler", "go", Some(&attrs)),
            Visibility::Private
        );
    }
}

//! FQN (Fully Qualified Name) Builder
//!
//! Centralized FQN generation across all chunk levels. Path separators are
//! normalized to dots and the language extension is stripped.

use std::borrow::Cow;

pub struct FqnBuilder;

impl FqnBuilder {
    /// Generate an FQN from a file path
    ///
    /// `backend/api/routes.py` → `backend.api.routes`
    pub fn from_file_path(file_path: &str, language: &str) -> String {
        let ext = Self::extension(language);
        let mut fqn = if !ext.is_empty() && file_path.ends_with(ext) {
            Cow::Borrowed(&file_path[..file_path.len() - ext.len()])
        } else {
            Cow::Borrowed(file_path)
        };

        if fqn.contains('/') || fqn.contains('\\') {
            fqn = Cow::Owned(fqn.replace(['/', '\\'], "."));
        }

        fqn.into_owned()
    }

    /// Generate an FQN from module path parts
    pub fn from_module_path(parts: &[&str]) -> String {
        parts.join(".")
    }

    /// Generate an FQN for a symbol under a parent scope
    pub fn from_symbol(parent_fqn: &str, name: &str) -> String {
        if parent_fqn.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", parent_fqn, name)
        }
    }

    fn extension(language: &str) -> &'static str {
        match language {
            "python" => ".py",
            "typescript" => ".ts",
            "javascript" => ".js",
            "rust" => ".rs",
            "go" => ".go",
            "java" => ".java",
            "kotlin" => ".kt",
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_path() {
        assert_eq!(
            FqnBuilder::from_file_path("backend/api/routes.py", "python"),
            "backend.api.routes"
        );
        assert_eq!(
            FqnBuilder::from_file_path("src/main.ts", "typescript"),
            "src.main"
        );
        // Windows paths supported
        assert_eq!(
            FqnBuilder::from_file_path("backend\\api\\routes.py", "python"),
            "backend.api.routes"
        );
        // Unknown language keeps the extension
        assert_eq!(
            FqnBuilder::from_file_path("Makefile", "make"),
            "Makefile"
        );
    }

    #[test]
    fn test_from_symbol() {
        assert_eq!(
            FqnBuilder::from_symbol("backend.api.routes", "UserController"),
            "backend.api.routes.UserController"
        );
        assert_eq!(FqnBuilder::from_symbol("", "main"), "main");
    }
}

//! Test Function/Class Detector
//!
//! Detects test symbols from name patterns, file path patterns and
//! decorators/annotations.

use std::path::Path;

pub struct TestDetector {
    test_function_prefixes: Vec<&'static str>,
    test_function_suffixes: Vec<&'static str>,
    test_function_names: Vec<&'static str>,
    test_decorators: Vec<&'static str>,
}

impl Default for TestDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDetector {
    pub fn new() -> Self {
        Self {
            test_function_prefixes: vec!["test_", "test"],
            test_function_suffixes: vec!["_test"],
            test_function_names: vec![
                // JavaScript/TypeScript
                "it",
                "describe",
                "beforeEach",
                "afterEach",
                "beforeAll",
                "afterAll",
                // Python unittest
                "setUp",
                "tearDown",
                "setUpClass",
                "tearDownClass",
            ],
            test_decorators: vec![
                "@pytest.mark",
                "@unittest",
                "@Test",
                "@ParameterizedTest",
                "@RepeatedTest",
            ],
        }
    }

    /// Check if a function/method is a test
    pub fn is_test_function(
        &self,
        name: &str,
        file_path: &str,
        decorators: Option<&[String]>,
    ) -> bool {
        let name_lower = name.to_lowercase();

        if self.test_function_names.contains(&name) {
            return true;
        }
        if self
            .test_function_prefixes
            .iter()
            .any(|p| name_lower.starts_with(p))
        {
            return true;
        }
        if self
            .test_function_suffixes
            .iter()
            .any(|s| name_lower.ends_with(s))
        {
            return true;
        }
        if let Some(decs) = decorators {
            if decs
                .iter()
                .any(|d| self.test_decorators.iter().any(|td| d.contains(td)))
            {
                return true;
            }
        }

        Self::is_test_path(file_path)
    }

    /// Check if a class is a test class
    pub fn is_test_class(&self, name: &str, file_path: &str) -> bool {
        name.starts_with("Test") || name.ends_with("Test") || Self::is_test_path(file_path)
    }

    /// Check if a file path matches test file/directory patterns
    pub fn is_test_path(file_path: &str) -> bool {
        let path_lower = file_path.to_lowercase().replace('\\', "/");

        for dir in ["tests/", "test/", "__tests__/", "__test__/"] {
            if path_lower.starts_with(dir) || path_lower.contains(&format!("/{}", dir)) {
                return true;
            }
        }

        let filename = Path::new(&path_lower)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("");

        filename.starts_with("test_")
            || filename == "conftest.py"
            || filename.ends_with("_test.py")
            || [".test.js", ".test.ts", ".test.jsx", ".test.tsx"]
                .iter()
                .any(|s| filename.ends_with(s))
            || [".spec.js", ".spec.ts", ".spec.jsx", ".spec.tsx", ".spec.py"]
                .iter()
                .any(|s| filename.ends_with(s))
    }
}

//! Structural pre-flight check for automata documents.
//!
//! The validator only checks that a document has the expected top-level
//! shape. Reference resolution, name uniqueness and variable types are
//! left to the [`Loader`](crate::loader::Loader).

use crate::error::CoreError;
use serde_yaml::Value;
use std::path::Path;

/// Top-level keys every automata document must have.
pub const REQUIRED_KEYS: [&str; 3] = ["config", "automata", "version"];

/// Cheap structural validation.
pub struct Validator;

impl Validator {
    /// Returns true if the file is a YAML mapping with all required keys.
    pub fn validate(path: impl AsRef<Path>) -> bool {
        match Self::check(path.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Validation of {} failed: {}", path.as_ref().display(), e);
                false
            }
        }
    }

    /// Like [`Validator::validate`], but reports why a file is rejected.
    pub fn check(path: impl AsRef<Path>) -> Result<(), CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::check_str(&content)
    }

    /// Checks YAML text.
    pub fn check_str(yaml: &str) -> Result<(), CoreError> {
        let doc: Value = serde_yaml::from_str(yaml)?;
        Self::check_document(&doc)
    }

    /// Checks an already parsed document.
    pub fn check_document(doc: &Value) -> Result<(), CoreError> {
        let root = doc
            .as_mapping()
            .ok_or_else(|| CoreError::StructuralValidationFailure {
                reason: "document root is not a mapping".to_string(),
            })?;

        for key in REQUIRED_KEYS {
            if !root.contains_key(key) {
                return Err(CoreError::StructuralValidationFailure {
                    reason: format!("missing top-level key '{}'", key),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_accepts_required_keys_regardless_of_content() {
        assert!(Validator::check_str("version: 1\nconfig: {}\nautomata: {}\n").is_ok());
        assert!(Validator::check_str("version: ~\nconfig: 3\nautomata: [1, 2]\n").is_ok());
    }

    #[test]
    fn test_rejects_each_missing_key() {
        for missing in REQUIRED_KEYS {
            let doc: String = REQUIRED_KEYS
                .iter()
                .filter(|k| **k != missing)
                .map(|k| format!("{}: {{}}\n", k))
                .collect();

            match Validator::check_str(&doc) {
                Err(CoreError::StructuralValidationFailure { reason }) => {
                    assert!(reason.contains(missing), "reason: {}", reason);
                }
                other => panic!("expected failure for missing {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_rejects_non_mapping_root() {
        assert!(matches!(
            Validator::check_str("- version\n- config\n- automata\n"),
            Err(CoreError::StructuralValidationFailure { .. })
        ));
    }

    #[test]
    fn test_rejects_unparseable_yaml() {
        assert!(matches!(
            Validator::check_str("version: [unclosed\n"),
            Err(CoreError::Yaml(_))
        ));
    }

    #[test]
    fn test_does_not_resolve_references() {
        let file = write_temp(
            r#"
version: 1
config: {name: x, type: inline}
automata:
  states: {a: {}}
  transitions:
    t: {from: a, to: missing}
"#,
        );
        assert!(Validator::validate(file.path()));
    }

    #[test]
    fn test_validate_file() {
        let good = write_temp("version: 1\nconfig: {}\nautomata: {}\n");
        assert!(Validator::validate(good.path()));

        let bad = write_temp("version: 1\nconfig: {}\n");
        assert!(!Validator::validate(bad.path()));

        assert!(!Validator::validate("/no/such/automata.yaml"));
    }
}

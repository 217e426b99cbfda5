//! Validation of names for new documents.

use crate::error::NameError;

/// Check a proposed document name against the names already in the store.
///
/// The emptiness check ignores surrounding whitespace; the duplicate check
/// compares the name as given.
///
/// # Errors
///
/// Returns [`NameError::Required`] for a blank name and
/// [`NameError::AlreadyExists`] if `existing` already contains it.
pub fn validate_name<S: AsRef<str>>(name: &str, existing: &[S]) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Required);
    }

    if existing.iter().any(|n| n.as_ref() == name) {
        return Err(NameError::AlreadyExists {
            name: name.to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EXISTING: [&str; 2] = ["about.md", "changes.txt"];

    #[test]
    fn blank_name_is_required() {
        assert_eq!(validate_name("", &EXISTING), Err(NameError::Required));
        assert_eq!(validate_name("   \t", &EXISTING), Err(NameError::Required));
        assert_eq!(NameError::Required.to_string(), "A name is required.");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = validate_name("changes.txt", &EXISTING).unwrap_err();
        assert_eq!(err.to_string(), "changes.txt already exists.");
    }

    #[test]
    fn fresh_name_passes() {
        assert_eq!(validate_name("story.md", &EXISTING), Ok(()));
        assert_eq!(validate_name("story.md", &Vec::<String>::new()), Ok(()));
    }
}

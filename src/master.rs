use std::path::Path;

use crate::error::{RegisterError, StoreError};
use crate::structs::{Credentials, DataDocument};
use crate::vault;

/// Checks the entered triple against the stored one. All three must match
/// exactly; a store with no credentials never matches.
pub fn verify_login(doc: &DataDocument, username: &str, password: &str, pin: &str) -> bool {
    doc.username.as_deref() == Some(username)
        && doc.password.as_deref() == Some(password)
        && doc.pin.as_deref() == Some(pin)
}

pub fn verify_pin(doc: &DataDocument, pin: &str) -> bool {
    doc.pin.as_deref() == Some(pin)
}

pub fn validate_registration(username: &str, password: &str, pin: &str) -> Result<Credentials, RegisterError> {
    if username.is_empty() {
        return Err(RegisterError::MissingField("Username"));
    }
    if password.is_empty() {
        return Err(RegisterError::MissingField("Password"));
    }
    if pin.is_empty() {
        return Err(RegisterError::MissingField("PIN"));
    }
    Ok(Credentials {
        username: username.to_owned(),
        password: password.to_owned(),
        pin: pin.to_owned(),
    })
}

/// Writes a brand new data file for `credentials`. Whatever was stored
/// before, saved rows included, is discarded.
pub fn register(credentials: Credentials, data_path: &Path) -> Result<(), StoreError> {
    let username = credentials.username.clone();
    vault::write_document(data_path, &DataDocument::registered(credentials))?;
    log::info!("Registered user {}", username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::UrlEntry;
    use tempfile::tempdir;

    fn registered_doc(dir: &Path) -> DataDocument {
        let path = dir.join("data.json");
        let creds = validate_registration("alice", "s3cret", "4321").unwrap();
        register(creds, &path).unwrap();
        vault::load_document(&path).unwrap()
    }

    #[test]
    fn exact_triple_logs_in() {
        let dir = tempdir().unwrap();
        let doc = registered_doc(dir.path());
        assert!(verify_login(&doc, "alice", "s3cret", "4321"));
    }

    #[test]
    fn any_single_character_deviation_fails() {
        let dir = tempdir().unwrap();
        let doc = registered_doc(dir.path());

        let attempts = [
            ("alicE", "s3cret", "4321"),
            ("alice ", "s3cret", "4321"),
            ("alice", "s3creT", "4321"),
            ("alice", "s3cre", "4321"),
            ("alice", "s3cret", "4322"),
            ("alice", "s3cret", "04321"),
        ];
        for (user, pass, pin) in attempts {
            assert!(!verify_login(&doc, user, pass, pin), "{user}/{pass}/{pin} should fail");
        }
    }

    #[test]
    fn empty_store_rejects_empty_credentials() {
        assert!(!verify_login(&DataDocument::default(), "", "", ""));
        assert!(!verify_pin(&DataDocument::default(), ""));
    }

    #[test]
    fn registration_requires_every_field() {
        assert_eq!(
            validate_registration("", "pw", "1"),
            Err(RegisterError::MissingField("Username"))
        );
        assert_eq!(
            validate_registration("u", "", "1"),
            Err(RegisterError::MissingField("Password"))
        );
        assert_eq!(
            validate_registration("u", "pw", ""),
            Err(RegisterError::MissingField("PIN"))
        );
    }

    #[test]
    fn registration_wipes_saved_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let rows = vec![UrlEntry::new(), UrlEntry::new(), UrlEntry::new()];
        vault::save_rows(&path, &rows).unwrap();
        assert_eq!(vault::load_document(&path).unwrap().urls.len(), 3);

        register(validate_registration("bob", "pw", "1").unwrap(), &path).unwrap();

        let doc = vault::load_document(&path).unwrap();
        assert!(doc.urls.is_empty());
        assert!(verify_login(&doc, "bob", "pw", "1"));
    }

    #[test]
    fn pin_is_checked_against_stored_value() {
        let dir = tempdir().unwrap();
        let doc = registered_doc(dir.path());
        assert!(verify_pin(&doc, "4321"));
        assert!(!verify_pin(&doc, "1234"));
    }
}

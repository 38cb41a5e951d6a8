// Local Key Files
// One-line JSON records for the generated pair and fetched contact keys

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::net::models::{Key, PrivateKey};

/// File holding the local public key record.
pub const PUBLIC_KEY_FILE: &str = "public.key";
/// File holding the local private key record.
pub const PRIVATE_KEY_FILE: &str = "private.key";

/// Errors that can occur while reading and writing key files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed key file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key files rooted at one directory.
#[derive(Clone, Debug)]
pub struct KeyStore {
    root: PathBuf,
}

impl KeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the working directory, where the CLI keeps its
    /// key files.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub fn save_public(&self, record: &Key) -> Result<(), StoreError> {
        self.write_record(PUBLIC_KEY_FILE, record)
    }

    pub fn load_public(&self) -> Result<Key, StoreError> {
        self.read_record(PUBLIC_KEY_FILE)
    }

    pub fn save_private(&self, record: &PrivateKey) -> Result<(), StoreError> {
        self.write_record(PRIVATE_KEY_FILE, record)
    }

    pub fn load_private(&self) -> Result<PrivateKey, StoreError> {
        self.read_record(PRIVATE_KEY_FILE)
    }

    /// Save a fetched public key as `<email>.key`.
    pub fn save_contact(&self, email: &str, record: &Key) -> Result<(), StoreError> {
        self.write_record(&contact_file(email), record)
    }

    /// Load the public key fetched earlier for an address.
    pub fn load_contact(&self, email: &str) -> Result<Key, StoreError> {
        self.read_record(&contact_file(email))
    }

    /// Record an address as covered by the local private key. Used by
    /// sendKey so that getMsg can later check whether a message is
    /// addressed to a key this machine holds.
    pub fn register_address(&self, email: &str) -> Result<(), StoreError> {
        let mut record = self.load_private()?;
        if !record.email.iter().any(|known| known == email) {
            record.email.push(email.to_string());
            self.save_private(&record)?;
        }
        Ok(())
    }

    fn write_record<T: Serialize>(&self, name: &str, record: &T) -> Result<(), StoreError> {
        let path = self.root.join(name);
        let json = serde_json::to_string(record).map_err(|source| StoreError::Malformed {
            path: display(&path),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: display(&path),
            source,
        })?;
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn read_record<T: DeserializeOwned>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.root.join(name);
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: display(&path),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
            path: display(&path),
            source,
        })
    }
}

fn contact_file(email: &str) -> String {
    format!("{}.key", email)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> (PathBuf, KeyStore) {
        let root = std::env::temp_dir().join(format!("rsa-messenger-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&root).unwrap();
        (root.clone(), KeyStore::new(root))
    }

    #[test]
    fn test_public_record_round_trip() {
        let (root, store) = temp_store("public");

        let record = Key {
            email: String::new(),
            key: "AAAB".to_string(),
        };
        store.save_public(&record).unwrap();

        let back = store.load_public().unwrap();
        assert_eq!(back.email, "");
        assert_eq!(back.key, "AAAB");

        // One line of JSON on disk
        let raw = fs::read_to_string(root.join(PUBLIC_KEY_FILE)).unwrap();
        assert!(!raw.contains('\n'));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_contact_file_is_named_after_the_address() {
        let (root, store) = temp_store("contact");

        let record = Key {
            email: "alice@example.com".to_string(),
            key: "AAAB".to_string(),
        };
        store.save_contact("alice@example.com", &record).unwrap();
        assert!(root.join("alice@example.com.key").exists());

        let back = store.load_contact("alice@example.com").unwrap();
        assert_eq!(back.key, "AAAB");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_register_address_appends_once() {
        let (root, store) = temp_store("register");

        store
            .save_private(&PrivateKey {
                email: Vec::new(),
                key: "BBBB".to_string(),
            })
            .unwrap();

        store.register_address("alice@example.com").unwrap();
        store.register_address("bob@example.com").unwrap();
        store.register_address("alice@example.com").unwrap();

        let record = store.load_private().unwrap();
        assert_eq!(record.email, ["alice@example.com", "bob@example.com"]);
        assert_eq!(record.key, "BBBB");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let (root, store) = temp_store("missing");

        let err = store.load_contact("nobody@example.com").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_garbage_file_is_malformed() {
        let (root, store) = temp_store("garbage");

        fs::write(root.join(PUBLIC_KEY_FILE), "not json").unwrap();
        let err = store.load_public().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));

        let _ = fs::remove_dir_all(&root);
    }
}

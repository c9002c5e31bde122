//! Core of the pwdmgr credential vault.
//!
//! The vault file holds one independently encrypted record per line. Loading
//! decrypts every line into a [`QueryEngine`]; new accounts are appended,
//! while updates and deletes rewrite the file after rotating backups.

pub mod backup;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod index;
pub mod paths;
pub mod query;
pub mod record;
pub mod settings;
pub mod store;

pub use backup::BackupRotator;
pub use crypto::VaultKey;
pub use error::VaultError;
pub use index::OrderBy;
pub use query::QueryEngine;
pub use record::{Account, AccountFields, AccountPatch, Field};
pub use settings::Settings;
pub use store::AccountStore;

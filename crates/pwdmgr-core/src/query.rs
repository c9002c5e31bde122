//! Session view over a loaded vault.
//!
//! A `QueryEngine` is built fresh for each command from the store's current
//! contents and dropped afterwards. Reads are served from the in-memory
//! index. Every mutation is persisted before it returns: inserts through the
//! append fast path, updates and deletes through a full rewrite.

use tracing::{debug, warn};

use crate::error::{Result, VaultError};
use crate::index::{AccountIndex, OrderBy};
use crate::record::{self, Account, AccountFields, AccountPatch, Field, FIELD_DELIM};
use crate::store::AccountStore;

pub struct QueryEngine<'s> {
    store: &'s AccountStore,
    index: AccountIndex,
}

impl<'s> QueryEngine<'s> {
    /// Load and decrypt the whole vault into a new engine.
    pub fn open(store: &'s AccountStore) -> Result<Self> {
        let mut index = AccountIndex::new();
        for account in store.load()? {
            index.insert(account)?;
        }
        debug!(accounts = index.len(), "query engine ready");
        Ok(Self { store, index })
    }

    pub fn store(&self) -> &AccountStore {
        self.store
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, created: &str) -> Option<&Account> {
        self.index.get(created)
    }

    pub fn select_all(&self, order: OrderBy) -> Vec<Account> {
        self.index.select("", order)
    }

    pub fn select_by_name_prefix(&self, prefix: &str) -> Vec<Account> {
        self.index.select(prefix, OrderBy::Name)
    }

    /// Most recent `updated` stamp in the vault.
    pub fn last_updated(&self) -> Option<&str> {
        self.index.iter().map(|a| a.updated.as_str()).max()
    }

    /// Create a new account with a unique creation stamp and append it.
    pub fn create(&mut self, fields: AccountFields) -> Result<Account> {
        let account = Account::from_fields(fields, self.unique_created());
        self.insert(account.clone())?;
        Ok(account)
    }

    pub fn insert(&mut self, account: Account) -> Result<()> {
        validate(&account)?;
        if self.index.contains(&account.created) {
            return Err(VaultError::DuplicateCreated(account.created));
        }
        self.store.append_account(&account)?;
        self.index.insert(account)
    }

    /// Apply `patch` to the account identified by `created`, bump its
    /// `updated` stamp and rewrite the vault.
    pub fn update(&mut self, created: &str, patch: AccountPatch) -> Result<Account> {
        let previous = self
            .index
            .remove(created)
            .ok_or_else(|| VaultError::NotFound(created.to_string()))?;

        let mut account = previous.clone();
        account.apply(patch);
        account.updated = record::timestamp_after(&previous.updated);
        if let Err(e) = validate(&account) {
            self.restore(previous);
            return Err(e);
        }
        self.index.insert(account.clone())?;

        if let Err(e) = self.persist() {
            self.index.remove(created);
            self.restore(previous);
            return Err(e);
        }
        Ok(account)
    }

    pub fn delete(&mut self, created: &str) -> Result<Account> {
        let removed = self
            .index
            .remove(created)
            .ok_or_else(|| VaultError::NotFound(created.to_string()))?;
        if let Err(e) = self.persist() {
            self.restore(removed);
            return Err(e);
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        let accounts: Vec<Account> = self.index.iter().cloned().collect();
        self.store.rewrite_all(&accounts)
    }

    fn restore(&mut self, account: Account) {
        warn!(created = %account.created, "rolling back in-memory change");
        // The slot was freed by the caller, so this cannot collide.
        let _ = self.index.insert(account);
    }

    fn unique_created(&self) -> String {
        let mut stamp = record::timestamp_now();
        while self.index.contains(&stamp) {
            stamp = match record::next_timestamp(&stamp) {
                Some(next) => next,
                None => record::timestamp_now(),
            };
        }
        stamp
    }
}

fn validate(account: &Account) -> Result<()> {
    if account.name.is_empty() {
        return Err(VaultError::InvalidAccount("name must not be empty".into()));
    }
    if account.created.is_empty() {
        return Err(VaultError::InvalidAccount("created stamp must not be empty".into()));
    }
    if let Some(field) = Field::ALL
        .into_iter()
        .find(|&field| account.get(field).contains(FIELD_DELIM))
    {
        return Err(VaultError::InvalidAccount(format!(
            "{field} must not contain {FIELD_DELIM:?}"
        )));
    }
    Ok(())
}

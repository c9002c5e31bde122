//! In-memory account collection with a name-ordered primary index and a
//! secondary index by creation stamp.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use crate::error::{Result, VaultError};
use crate::record::Account;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Name,
    Updated,
}

#[derive(Debug, Default)]
pub struct AccountIndex {
    /// Keyed by (name, created); names need not be unique.
    by_name: BTreeMap<(String, String), Account>,
    /// created -> name
    by_created: HashMap<String, String>,
}

impl AccountIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_created.is_empty()
    }

    pub fn contains(&self, created: &str) -> bool {
        self.by_created.contains_key(created)
    }

    pub fn get(&self, created: &str) -> Option<&Account> {
        let name = self.by_created.get(created)?;
        self.by_name.get(&(name.clone(), created.to_string()))
    }

    pub fn insert(&mut self, account: Account) -> Result<()> {
        if self.by_created.contains_key(&account.created) {
            return Err(VaultError::DuplicateCreated(account.created));
        }
        self.by_created
            .insert(account.created.clone(), account.name.clone());
        self.by_name
            .insert((account.name.clone(), account.created.clone()), account);
        Ok(())
    }

    pub fn remove(&mut self, created: &str) -> Option<Account> {
        let name = self.by_created.remove(created)?;
        self.by_name.remove(&(name, created.to_string()))
    }

    /// Accounts whose name starts with `prefix` (case-sensitive), by name.
    pub fn iter_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Account> + 'a {
        let start = (prefix.to_string(), String::new());
        self.by_name
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(move |((name, _), _)| name.starts_with(prefix))
            .map(|(_, account)| account)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.by_name.values()
    }

    /// Materialize the accounts matching `prefix` in the requested order.
    pub fn select(&self, prefix: &str, order: OrderBy) -> Vec<Account> {
        let mut rows: Vec<Account> = self.iter_prefix(prefix).cloned().collect();
        if order == OrderBy::Updated {
            rows.sort_by(|a, b| a.updated.cmp(&b.updated).then_with(|| a.name.cmp(&b.name)));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, created: &str, updated: &str) -> Account {
        Account {
            name: name.into(),
            created: created.into(),
            updated: updated.into(),
            ..Default::default()
        }
    }

    fn names(rows: &[Account]) -> Vec<&str> {
        rows.iter().map(|a| a.name.as_str()).collect()
    }

    fn sample() -> AccountIndex {
        let mut index = AccountIndex::new();
        for (name, created, updated) in [
            ("gitlab", "1", "5"),
            ("github", "2", "3"),
            ("Github", "3", "9"),
            ("git", "4", "1"),
            ("bank", "5", "7"),
            ("github", "6", "2"),
        ] {
            index.insert(account(name, created, updated)).unwrap();
        }
        index
    }

    #[test]
    fn prefix_selection_is_case_sensitive_and_name_ordered() {
        let index = sample();
        let rows = index.select("git", OrderBy::Name);
        assert_eq!(names(&rows), ["git", "github", "github", "gitlab"]);
        assert!(index.select("GIT", OrderBy::Name).is_empty());
        assert_eq!(names(&index.select("Git", OrderBy::Name)), ["Github"]);
    }

    #[test]
    fn empty_prefix_selects_everything() {
        let index = sample();
        assert_eq!(index.select("", OrderBy::Name).len(), 6);
        assert_eq!(
            names(&index.select("", OrderBy::Name)),
            ["Github", "bank", "git", "github", "github", "gitlab"]
        );
    }

    #[test]
    fn updated_order_sorts_by_stamp() {
        let rows = sample().select("", OrderBy::Updated);
        let stamps: Vec<&str> = rows.iter().map(|a| a.updated.as_str()).collect();
        assert_eq!(stamps, ["1", "2", "3", "5", "7", "9"]);
    }

    #[test]
    fn duplicate_created_is_rejected() {
        let mut index = sample();
        let err = index.insert(account("other", "3", "3")).unwrap_err();
        assert!(matches!(err, VaultError::DuplicateCreated(c) if c == "3"));
        assert_eq!(index.len(), 6);
    }

    #[test]
    fn remove_and_get_use_created_key() {
        let mut index = sample();
        assert_eq!(index.get("6").unwrap().name, "github");
        let removed = index.remove("6").unwrap();
        assert_eq!(removed.updated, "2");
        assert!(index.get("6").is_none());
        assert!(index.remove("6").is_none());
        assert_eq!(names(&index.select("github", OrderBy::Name)), ["github"]);
    }
}

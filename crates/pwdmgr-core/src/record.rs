//! Account model and its plaintext record encoding.
//!
//! A record is the account's fields joined as `FIELD:value` chunks with
//! [`FIELD_DELIM`] between them. Values may contain colons; they must not
//! contain the delimiter itself.

use chrono::{Duration, Local, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VaultError};

pub const FIELD_DELIM: &str = "|||::|||";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Created,
    Updated,
    Username,
    Url,
    Email,
    Password,
    Comment,
}

impl Field {
    /// Serialization order.
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::Created,
        Field::Updated,
        Field::Username,
        Field::Url,
        Field::Email,
        Field::Password,
        Field::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "NAME",
            Field::Created => "CREATED",
            Field::Updated => "UPDATED",
            Field::Username => "USERNAME",
            Field::Url => "URL",
            Field::Email => "EMAIL",
            Field::Password => "PASSWORD",
            Field::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| VaultError::Format(format!("unknown field name {s:?}")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    /// Creation stamp. Unique within a vault and never changed.
    pub created: String,
    pub updated: String,
    pub username: String,
    pub url: String,
    pub email: String,
    pub password: String,
    pub comment: String,
}

/// The user-editable part of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFields {
    pub name: String,
    pub username: String,
    pub url: String,
    pub email: String,
    pub password: String,
    pub comment: String,
}

/// Replacement values for an update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub comment: Option<String>,
}

impl Account {
    pub fn from_fields(fields: AccountFields, created: String) -> Self {
        Self {
            name: fields.name,
            updated: created.clone(),
            created,
            username: fields.username,
            url: fields.url,
            email: fields.email,
            password: fields.password,
            comment: fields.comment,
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Created => &self.created,
            Field::Updated => &self.updated,
            Field::Username => &self.username,
            Field::Url => &self.url,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::Comment => &self.comment,
        }
    }

    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Created => &mut self.created,
            Field::Updated => &mut self.updated,
            Field::Username => &mut self.username,
            Field::Url => &mut self.url,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::Comment => &mut self.comment,
        }
    }

    /// Apply the present values of `patch`; timestamps are left alone.
    pub fn apply(&mut self, patch: AccountPatch) {
        let AccountPatch {
            name,
            username,
            url,
            email,
            password,
            comment,
        } = patch;
        let pairs = [
            (Field::Name, name),
            (Field::Username, username),
            (Field::Url, url),
            (Field::Email, email),
            (Field::Password, password),
            (Field::Comment, comment),
        ];
        for (field, value) in pairs {
            if let Some(value) = value {
                *self.slot(field) = value;
            }
        }
    }
}

pub fn serialize(account: &Account) -> String {
    Field::ALL
        .iter()
        .map(|&field| format!("{}:{}", field.as_str(), account.get(field)))
        .collect::<Vec<_>>()
        .join(FIELD_DELIM)
}

/// Parse a plaintext record. Field order does not matter; missing optional
/// fields are empty. `NAME` and `CREATED` must be present and non-empty.
pub fn parse(record: &str) -> Result<Account> {
    if !record.contains(FIELD_DELIM) {
        return Err(VaultError::Format("field delimiter not found".into()));
    }
    let mut account = Account::default();
    for chunk in record.split(FIELD_DELIM) {
        let (name, value) = chunk
            .split_once(':')
            .ok_or_else(|| VaultError::Format("field chunk has no ':' separator".into()))?;
        let field: Field = name.parse()?;
        *account.slot(field) = value.to_string();
    }
    if account.name.is_empty() {
        return Err(VaultError::Format("record has no NAME".into()));
    }
    if account.created.is_empty() {
        return Err(VaultError::Format("record has no CREATED".into()));
    }
    Ok(account)
}

/// Current local time as a record timestamp.
pub fn timestamp_now() -> String {
    Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
}

/// The stamp one microsecond after `stamp`, if it parses.
pub fn next_timestamp(stamp: &str) -> Option<String> {
    let parsed = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    let next = parsed.checked_add_signed(Duration::microseconds(1))?;
    Some(next.format(TIMESTAMP_FORMAT).to_string())
}

/// A fresh stamp strictly after `previous`.
pub fn timestamp_after(previous: &str) -> String {
    let now = timestamp_now();
    if now.as_str() > previous {
        return now;
    }
    next_timestamp(previous).unwrap_or(now)
}

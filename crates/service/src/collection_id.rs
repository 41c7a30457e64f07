//! Scoped collection identifiers.
//!
//! Text form: `name` for a global collection, `name@member:ID` or
//! `name@user:ID` for one owned by a member or user.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use vista_core::{Error, Result};

/// Owner of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Member(String),
    User(String),
}

/// Identifies a base collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId {
    name: String,
    scope: Scope,
}

impl CollectionId {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Global,
        }
    }

    pub fn member(name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Member(member.into()),
        }
    }

    pub fn user(name: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::User(user.into()),
        }
    }

    /// Parses the text form.
    pub fn parse(text: &str) -> Result<Self> {
        let malformed = || Error::source_not_found(text);
        let (name, scope) = match text.split_once('@') {
            None => (text, Scope::Global),
            Some((name, owner)) => {
                let (kind, id) = owner.split_once(':').ok_or_else(malformed)?;
                if id.is_empty() {
                    return Err(malformed());
                }
                let scope = match kind {
                    "member" => Scope::Member(id.to_string()),
                    "user" => Scope::User(id.to_string()),
                    _ => return Err(malformed()),
                };
                (name, scope)
            }
        };
        if name.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            name: name.to_string(),
            scope,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.scope == Scope::Global
    }
}

impl FromStr for CollectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Scope::Global => f.write_str(&self.name),
            Scope::Member(id) => write!(f, "{}@member:{}", self.name, id),
            Scope::User(id) => write!(f, "{}@user:{}", self.name, id),
        }
    }
}

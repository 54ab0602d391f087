//! User and account value types.
//!
//! Entities are plain value holders. Their only persistence-relevant state is the
//! [`EntityId`], which distinguishes rows the store has not seen yet from rows it has.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a persisted entity.
///
/// `New` replaces the raw `-1` sentinel; [`EntityId::from_raw`] and [`EntityId::as_raw`]
/// convert to and from that convention at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityId {
    /// Never saved; the store has not assigned an id.
    #[default]
    New,
    /// Store-assigned id.
    Persisted(i64),
}

impl EntityId {
    /// Raw value meaning "not yet persisted".
    pub const UNSAVED: i64 = -1;

    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        if raw == Self::UNSAVED {
            EntityId::New
        } else {
            EntityId::Persisted(raw)
        }
    }

    #[must_use]
    pub fn as_raw(self) -> i64 {
        match self {
            EntityId::New => Self::UNSAVED,
            EntityId::Persisted(id) => id,
        }
    }

    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, EntityId::New)
    }

    /// The store-assigned id, if any.
    #[must_use]
    pub fn get(self) -> Option<i64> {
        match self {
            EntityId::New => None,
            EntityId::Persisted(id) => Some(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        EntityId::from_raw(raw)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.as_raw()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::New => f.write_str("new"),
            EntityId::Persisted(id) => write!(f, "{id}"),
        }
    }
}

/// A bank customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: EntityId,
    pin: i32,
    first_name: String,
    last_name: String,
}

impl User {
    /// A user that has not been saved yet.
    #[must_use]
    pub fn new(pin: i32, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self::with_id(EntityId::New, pin, first_name, last_name)
    }

    #[must_use]
    pub fn with_id(
        id: impl Into<EntityId>,
        pin: i32,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pin,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn set_id(&mut self, id: impl Into<EntityId>) {
        self.id = id.into();
    }

    #[must_use]
    pub fn pin(&self) -> i32 {
        self.pin
    }

    pub fn set_pin(&mut self, pin: i32) {
        self.pin = pin;
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
    }
}

/// An account owned by a [`User`].
///
/// The owner is held by value; only its id is written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: EntityId,
    user: User,
    name: String,
    balance: f64,
}

impl Account {
    /// An account that has not been saved yet.
    #[must_use]
    pub fn new(user: User, name: impl Into<String>, balance: f64) -> Self {
        Self::with_id(EntityId::New, user, name, balance)
    }

    #[must_use]
    pub fn with_id(
        id: impl Into<EntityId>,
        user: User,
        name: impl Into<String>,
        balance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            user,
            name: name.into(),
            balance,
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn set_id(&mut self, id: impl Into<EntityId>) {
        self.id = id.into();
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut User {
        &mut self.user
    }

    pub fn set_user(&mut self, user: User) {
        self.user = user;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sentinel_maps_to_new() {
        assert_eq!(EntityId::from_raw(-1), EntityId::New);
        assert_eq!(EntityId::from(42_i64), EntityId::Persisted(42));
        assert_eq!(i64::from(EntityId::New), -1);
        assert_eq!(EntityId::Persisted(0).get(), Some(0));
        assert!(EntityId::default().is_new());
    }

    #[test]
    fn constructors_start_unsaved() {
        let user = User::new(1234, "Ada", "Lovelace");
        assert!(user.id().is_new());

        let mut account = Account::new(user.clone(), "checking", 10.5);
        assert!(account.id().is_new());
        account.set_id(9_i64);
        account.user_mut().set_pin(4321);
        assert_eq!(account.id(), EntityId::Persisted(9));
        assert_eq!(account.user().pin(), 4321);
        assert_eq!(account.id().to_string(), "9");
        assert_eq!(EntityId::New.to_string(), "new");
    }
}

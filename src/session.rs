// SPDX-FileCopyrightText: 2022 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed-in user, as described by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Identity {
    id: Uuid,
    email: String,
}

impl Identity {
    pub(crate) fn new<S: Into<String>>(id: Uuid, email: S) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }

    pub(crate) const fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Session {
    #[default]
    Unauthenticated,
    Authenticated {
        identity: Identity,
    },
}

impl Session {
    pub(crate) const fn is_authenticated(&self) -> bool {
        matches!(*self, Self::Authenticated { .. })
    }

    pub(crate) const fn identity(&self) -> Option<&Identity> {
        match *self {
            Self::Authenticated { ref identity } => Some(identity),
            Self::Unauthenticated => None,
        }
    }
}

impl From<Option<Identity>> for Session {
    fn from(value: Option<Identity>) -> Self {
        value.map_or(Self::Unauthenticated, |identity| Self::Authenticated {
            identity,
        })
    }
}

/// Sequence number assigned by the authentication service to every session
/// value it hands out. Later values always carry a revision at least as high
/// as earlier ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub(crate) struct Revision(u64);

impl Revision {
    #[cfg(test)]
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A session value stamped with the revision at which the service observed
/// it. Both fetch results and change notifications use this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Change {
    revision: Revision,
    identity: Option<Identity>,
}

impl Change {
    pub(crate) const fn new(revision: Revision, identity: Option<Identity>) -> Self {
        Self { revision, identity }
    }

    pub(crate) const fn revision(&self) -> Revision {
        self.revision
    }

    pub(crate) fn into_session(self) -> Session {
        self.identity.into()
    }
}

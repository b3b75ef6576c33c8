// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod hosted;
#[cfg(test)]
pub(crate) mod testing;

use std::{
    collections::HashMap,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    task::{Context, Poll},
};

use async_trait::async_trait;
use clap::ValueEnum;
use futures_util::Stream;
use inflector::Inflector as _;
use log::debug;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use crate::{error, session::Change};

pub(crate) use hosted::{Hosted, Print, Record};

/// OAuth identity providers the hosted service can hand off to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Provider {
    Google,
    Github,
    Gitlab,
    Azure,
    Apple,
}

impl Provider {
    pub(crate) const fn id(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Azure => "azure",
            Self::Apple => "apple",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.to_possible_value().ok_or(std::fmt::Error)?;
        write!(f, "{}", value.get_name().to_title_case())
    }
}

/// The external service that owns the truth about who is signed in.
#[async_trait]
pub(crate) trait Service: Send + Sync {
    async fn fetch_current_session(&self) -> Result<Change, error::Auth>;

    /// Register for session changes. The registration lasts until the
    /// returned subscription (or its registration half) is dropped.
    fn subscribe(&self) -> Subscription;

    /// Start the provider's redirect flow. A successful return only means
    /// the redirect was initiated; the session changes later, through a
    /// notification.
    async fn begin_sign_in(&self, provider: Provider, redirect: &Url) -> Result<(), error::Auth>;

    async fn sign_out(&self) -> Result<(), error::Auth>;
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<Change>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The set of live subscriptions held by a service implementation.
#[derive(Clone, Default)]
pub(crate) struct Subscribers {
    registry: Arc<Mutex<Registry>>,
}

impl Subscribers {
    pub(crate) fn register(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id = registry.next_id.wrapping_add(1);
            _ = registry.senders.insert(id, tx);
            id
        };
        debug!("Registered session subscription {}", id);

        Subscription {
            registration: Registration {
                id,
                registry: Arc::downgrade(&self.registry),
            },
            changes: UnboundedReceiverStream::new(rx),
        }
    }

    pub(crate) fn broadcast(&self, change: &Change) {
        let mut registry = lock(&self.registry);
        registry
            .senders
            .retain(|_, tx| tx.send(change.clone()).is_ok());
        debug!(
            "Broadcast session change {} to {} subscriber(s)",
            change.revision(),
            registry.senders.len()
        );
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock(&self.registry).senders.len()
    }
}

/// Keeps a subscription registered. Dropping it unregisters, which also ends
/// the matching change stream.
pub(crate) struct Registration {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Registration {
    pub(crate) fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if lock(&registry).senders.remove(&self.id).is_some() {
                debug!("Released session subscription {}", self.id);
            }
        }
    }
}

pub(crate) type Changes = UnboundedReceiverStream<Change>;

/// A cancellable stream of session changes.
pub(crate) struct Subscription {
    registration: Registration,
    changes: Changes,
}

impl Subscription {
    /// Separates the registration from the stream so that the stream can be
    /// moved into a task while the owner keeps control over its lifetime.
    pub(crate) fn into_parts(self) -> (Registration, Changes) {
        (self.registration, self.changes)
    }
}

impl Stream for Subscription {
    type Item = Change;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.changes).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt as _;

    use super::*;
    use crate::session::{Identity, Revision};

    #[tokio::test]
    async fn subscribers_receive_broadcasts_until_released() {
        let subscribers = Subscribers::default();
        let mut first = subscribers.register();
        let second = subscribers.register();
        assert_eq!(subscribers.len(), 2);

        let change = Change::new(
            Revision::new(1),
            Some(Identity::new(uuid::Uuid::nil(), "a@example.com")),
        );
        subscribers.broadcast(&change);
        assert_eq!(first.next().await, Some(change.clone()));

        let (registration, mut released) = second.into_parts();
        registration.unsubscribe();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(released.next().await, Some(change));
        assert_eq!(released.next().await, None);

        let (registration, mut changes) = first.into_parts();
        drop(registration);
        assert_eq!(subscribers.len(), 0);
        assert_eq!(changes.next().await, None);
    }

    #[test]
    fn provider_names() {
        assert_eq!(Provider::Github.id(), "github");
        assert_eq!(Provider::Github.to_string(), "Github");
    }
}

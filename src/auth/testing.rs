// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use url::Url;
use uuid::Uuid;

use crate::{
    error,
    session::{Change, Identity, Revision},
};

use super::{Provider, Service, Subscribers, Subscription};

pub(crate) fn identity(email: &str) -> Identity {
    Identity::new(Uuid::nil(), email)
}

#[derive(Default)]
struct Script {
    revision: Revision,
    identity: Option<Identity>,
    fetch_failure: Option<error::Auth>,
    sign_in_failures: VecDeque<error::Auth>,
    sign_out_failures: VecDeque<error::Auth>,
    race_fetch_with: Option<Option<Identity>>,
    sign_in_calls: Vec<Provider>,
    sign_out_calls: usize,
}

/// An authentication service that only changes when a test tells it to.
/// Sign-in and sign-out never emit notifications by themselves; use
/// [`Scripted::emit`] to play the part of the provider.
#[derive(Default)]
pub(crate) struct Scripted {
    script: Mutex<Script>,
    subscribers: Subscribers,
}

impl Scripted {
    pub(crate) fn signed_in(email: &str) -> Self {
        let service = Self::default();
        {
            let mut script = service.script();
            script.revision = Revision::new(1);
            script.identity = Some(identity(email));
        }
        service
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Deliver a change notification to every subscriber.
    pub(crate) fn emit(&self, identity: Option<Identity>) -> Change {
        let change = {
            let mut script = self.script();
            script.revision = script.revision.next();
            script.identity = identity;
            Change::new(script.revision, script.identity.clone())
        };
        self.subscribers.broadcast(&change);
        change
    }

    pub(crate) fn fail_fetch(&self, err: error::Auth) {
        self.script().fetch_failure = Some(err);
    }

    pub(crate) fn fail_next_sign_in(&self, err: error::Auth) {
        self.script().sign_in_failures.push_back(err);
    }

    pub(crate) fn fail_next_sign_out(&self, err: error::Auth) {
        self.script().sign_out_failures.push_back(err);
    }

    /// Make the next fetch read the current value, then let a notification
    /// overtake it before the result is handed back.
    pub(crate) fn race_fetch_with(&self, identity: Option<Identity>) {
        self.script().race_fetch_with = Some(identity);
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn sign_in_calls(&self) -> Vec<Provider> {
        self.script().sign_in_calls.clone()
    }

    pub(crate) fn sign_out_calls(&self) -> usize {
        self.script().sign_out_calls
    }
}

#[async_trait]
impl Service for Scripted {
    async fn fetch_current_session(&self) -> Result<Change, error::Auth> {
        let (result, race) = {
            let mut script = self.script();
            let result = match script.fetch_failure.take() {
                Some(err) => Err(err),
                None => Ok(Change::new(script.revision, script.identity.clone())),
            };
            (result, script.race_fetch_with.take())
        };

        if let Some(identity) = race {
            let _overtaking = self.emit(identity);
            tokio::task::yield_now().await;
        }
        result
    }

    fn subscribe(&self) -> Subscription {
        self.subscribers.register()
    }

    async fn begin_sign_in(&self, provider: Provider, _redirect: &Url) -> Result<(), error::Auth> {
        let mut script = self.script();
        script.sign_in_calls.push(provider);
        script.sign_in_failures.pop_front().map_or(Ok(()), Err)
    }

    async fn sign_out(&self) -> Result<(), error::Auth> {
        let mut script = self.script();
        script.sign_out_calls += 1;
        script.sign_out_failures.pop_front().map_or(Ok(()), Err)
    }
}

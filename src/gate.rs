// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, sync::Arc, time::Duration};

use futures_util::StreamExt as _;
use log::{debug, info, warn};
use tokio::{sync::watch, task::JoinHandle, time};
use url::Url;

use crate::{
    auth::{self, Provider, Registration},
    error::{self, Result},
    files::FileDescriptor,
    notify::{Notice, Notifier},
    session::{Change, Revision, Session},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Fetch,
    Notification,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Fetch => "fetched",
            Self::Notification => "notified",
        })
    }
}

#[derive(Clone, Debug, Default)]
struct Snapshot {
    revision: Option<Revision>,
    session: Session,
    detached: bool,
}

/// The single writer for the session value.
struct State {
    tx: watch::Sender<Snapshot>,
    #[cfg(test)]
    applied: std::sync::Mutex<Vec<(Origin, Revision)>>,
}

impl State {
    fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self {
            tx,
            #[cfg(test)]
            applied: std::sync::Mutex::default(),
        }
    }

    /// Apply a change unless it is older than what we already have or the
    /// gate has been torn down. Equal revisions are taken in arrival order.
    fn apply(&self, change: Change, origin: Origin) -> bool {
        let mut applied = false;
        let _notified = self.tx.send_if_modified(|snapshot| {
            if snapshot.detached {
                debug!(
                    "Ignoring {} session {} after teardown",
                    origin,
                    change.revision()
                );
                return false;
            }
            if let Some(current) = snapshot.revision {
                if change.revision() < current {
                    debug!(
                        "Ignoring stale {} session {} (already at {})",
                        origin,
                        change.revision(),
                        current
                    );
                    return false;
                }
            }

            applied = true;
            snapshot.revision = Some(change.revision());
            let session = change.clone().into_session();
            if snapshot.session == session {
                return false;
            }

            match session.identity() {
                Some(identity) => info!("Signed in as {} ({} {})", identity, origin, change.revision()),
                None => info!("Signed out ({} {})", origin, change.revision()),
            }
            snapshot.session = session;
            true
        });

        #[cfg(test)]
        if applied {
            self.applied.lock().unwrap().push((origin, change.revision()));
        }
        applied
    }

    fn detach(&self) {
        self.tx.send_modify(|snapshot| snapshot.detached = true);
    }
}

/// Holds the change subscription for as long as the gate is mounted.
struct Listener {
    registration: Registration,
    task: JoinHandle<()>,
}

/// Decides whether the user may act, based on who the authentication
/// service says is signed in.
///
/// The session is only ever written from the initial fetch and from change
/// notifications. Sign-in and sign-out calls ask the service to do
/// something; the gate finds out about the result the same way as about any
/// other change.
pub(crate) struct Gate<S: auth::Service, N: Notifier> {
    service: Arc<S>,
    notifier: N,
    state: Arc<State>,
    listener: Option<Listener>,
    initialized: bool,
}

impl<S: auth::Service, N: Notifier> Gate<S, N> {
    pub(crate) fn new(service: Arc<S>, notifier: N) -> Self {
        Self {
            service,
            notifier,
            state: Arc::new(State::new()),
            listener: None,
            initialized: false,
        }
    }

    /// Subscribe to session changes and load the current session.
    ///
    /// The subscription is registered before the fetch is issued so that no
    /// change can slip in between the two; revisions sort out which of the
    /// two results is newer.
    pub(crate) async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(error::Error::AlreadyInitialized);
        }
        self.initialized = true;

        let (registration, mut changes) = self.service.subscribe().into_parts();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                let _applied = state.apply(change, Origin::Notification);
            }
            debug!("Session change stream ended");
        });
        self.listener = Some(Listener { registration, task });

        match self.service.fetch_current_session().await {
            Ok(change) => {
                let _applied = self.state.apply(change, Origin::Fetch);
            }
            Err(e) => {
                warn!("Could not load the current session, so you are signed out for now: {}", e);
                self.notifier.notify(Notice::destructive(
                    "Could not restore your session",
                    e.to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Release the subscription. Anything that arrives afterwards is
    /// dropped. Dropping the gate does the same.
    pub(crate) fn teardown(&mut self) {
        self.state.detach();
        if let Some(Listener { registration, task }) = self.listener.take() {
            registration.unsubscribe();
            task.abort();
            debug!("Released session change listener");
        }
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.state.tx.borrow().session.is_authenticated()
    }

    pub(crate) fn session(&self) -> Session {
        self.state.tx.borrow().session.clone()
    }

    pub(crate) const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Wait for the session to reach a state matching `f`.
    pub(crate) async fn wait_until<F: FnMut(&Session) -> bool + Send>(
        &self,
        mut f: F,
        limit: Duration,
    ) -> Result<Session> {
        let mut rx = self.state.tx.subscribe();
        let snapshot = time::timeout(limit, rx.wait_for(|snapshot| f(&snapshot.session)))
            .await
            .map_err(|_| error::Error::Timeout)?
            .map_err(error::Internal::from)?;
        Ok(snapshot.session.clone())
    }

    fn report(&self, title: &str, err: &error::Auth) {
        warn!("{}: {}", title, err);
        self.notifier.notify(Notice::destructive(title, err.to_string()));
    }

    pub(crate) async fn sign_in(&self, provider: Provider, redirect: &Url) -> Result<(), error::Auth> {
        info!("Starting sign-in with {}", provider);
        self.service
            .begin_sign_in(provider, redirect)
            .await
            .map_err(|e| {
                self.report("Sign-in failed", &e);
                e
            })
    }

    pub(crate) async fn sign_out(&self) -> Result<(), error::Auth> {
        self.service.sign_out().await.map_err(|e| {
            self.report("Sign-out failed", &e);
            e
        })
    }

    /// Check that an action may go ahead. Callers must not touch anything if
    /// this fails.
    pub(crate) fn authorize_action(
        &self,
        candidate_files: Option<&[FileDescriptor]>,
    ) -> Result<(), error::Authorization> {
        let identity = self.state.tx.borrow().session.identity().cloned();
        match identity {
            Some(identity) => {
                debug!(
                    "Authorized {} for {} file(s)",
                    identity,
                    candidate_files.map_or(0, <[_]>::len)
                );
                Ok(())
            }
            None => {
                warn!("Refusing an action because nobody is signed in");
                self.notifier.notify(Notice::destructive(
                    "Sign in required",
                    "Sign in to upload and analyze documents.",
                ));
                Err(error::Authorization::NotAuthenticated)
            }
        }
    }
}

impl<S: auth::Service, N: Notifier> Drop for Gate<S, N> {
    fn drop(&mut self) {
        self.teardown();
    }
}

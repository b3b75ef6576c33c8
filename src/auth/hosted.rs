// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use futures_util::lock::Mutex;
use log::{debug, info, warn};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{
    error::{self, Result},
    session::{Change, Identity, Revision},
    storage::Storage,
};

use super::{Provider, Service, Subscribers, Subscription};

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Where the provider's authorization page gets shown.
pub(crate) trait Browser: Send + Sync {
    fn open(&self, url: &Url) -> Result<(), error::Auth>;
}

/// Prints the authorization address for the user to open themselves.
pub(crate) struct Print;

impl Browser for Print {
    fn open(&self, url: &Url) -> Result<(), error::Auth> {
        println!("Open this address in your browser to continue signing in:");
        println!("{url}");
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredSession {
    identity: Identity,
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl StoredSession {
    fn is_expired(&self, at: u64) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at <= at)
    }
}

/// Everything the hosted service keeps between runs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub(crate) struct Record {
    revision: Revision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<StoredSession>,
}

impl Record {
    fn change(&self) -> Change {
        Change::new(
            self.revision,
            self.session.as_ref().map(|session| session.identity.clone()),
        )
    }

    fn advance(self, session: Option<StoredSession>) -> Self {
        Self {
            revision: self.revision.next(),
            session,
        }
    }
}

#[derive(Deserialize)]
struct Claims {
    sub: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<u64>,
}

fn decode_claims(token: &str) -> Result<Claims, error::Auth> {
    let malformed = || error::Auth::Rejected("malformed access token".to_owned());

    let payload = token.split('.').nth(1).ok_or_else(malformed)?;
    let bytes = base64::decode_config(payload.trim_end_matches('='), base64::URL_SAFE_NO_PAD)
        .map_err(|_| malformed())?;
    serde_json::from_slice(&bytes).map_err(|_| malformed())
}

/// The parameters the provider appended to the redirect target. They
/// normally travel in the fragment, but some providers report errors in the
/// query.
fn callback_params(callback: &Url) -> HashMap<String, String> {
    let from_fragment: HashMap<String, String> = callback
        .fragment()
        .map(|fragment| {
            url::form_urlencoded::parse(fragment.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    if from_fragment.is_empty() {
        callback.query_pairs().into_owned().collect()
    } else {
        from_fragment
    }
}

/// Read the stored record. A record that no longer parses is thrown away, so
/// that signing in or out again can write a fresh one.
async fn load<St: Storage<Record> + ?Sized>(storage: &mut St) -> Result<Record> {
    match storage.get().await {
        Ok(record) => Ok(record.unwrap_or_default()),
        Err(error::Error::Json(e)) => {
            warn!("Discarding unreadable session record: {}", e);
            storage.clear().await?;
            Ok(Record::default())
        }
        Err(e) => Err(e),
    }
}

/// Session store backed by a hosted auth endpoint's OAuth redirect flow.
pub(crate) struct Hosted<St: Storage<Record>, B: Browser> {
    base_url: Url,
    storage: Mutex<St>,
    browser: B,
    subscribers: Subscribers,
}

impl<St: Storage<Record>, B: Browser> Hosted<St, B> {
    pub(crate) fn new(
        base_url: Option<Url>,
        anon_key: Option<&SecretString>,
        storage: St,
        browser: B,
    ) -> Result<Self> {
        let base_url = match (base_url, anon_key) {
            (Some(url), Some(key)) if !key.expose_secret().trim().is_empty() => url,
            _ => {
                return Err(error::Error::Configuration(
                    "missing auth service URL or anonymous key".to_owned(),
                ))
            }
        };
        if base_url.cannot_be_a_base() {
            return Err(error::Error::Configuration(format!(
                "auth service URL {base_url} cannot have a path"
            )));
        }
        if !storage.is_persistent() {
            info!("Sessions will not be kept after this run");
        }

        Ok(Self {
            base_url,
            storage: Mutex::new(storage),
            browser,
            subscribers: Subscribers::default(),
        })
    }

    fn authorize_url(&self, provider: Provider, redirect: &Url) -> Result<Url, error::Auth> {
        let mut url = self.base_url.clone();
        _ = url
            .path_segments_mut()
            .map_err(|()| error::Auth::Misconfigured(format!("{} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["auth", "v1", "authorize"]);
        _ = url
            .query_pairs_mut()
            .append_pair("provider", provider.id())
            .append_pair("redirect_to", redirect.as_str());
        Ok(url)
    }

    /// Write a new session value and tell every subscriber about it.
    async fn replace(&self, session: Option<StoredSession>) -> Result<Change> {
        let mut storage = self.storage.lock().await;
        let record = load(&mut *storage).await?.advance(session);
        storage.update(&record).await?;

        let change = record.change();
        self.subscribers.broadcast(&change);
        Ok(change)
    }

    /// Finish a redirect sign-in from the address the provider sent the
    /// user back to.
    pub(crate) async fn complete_sign_in(&self, callback: &Url) -> Result<Identity, error::Auth> {
        let params = callback_params(callback);

        if let Some(code) = params.get("error") {
            let reason = params.get("error_description").unwrap_or(code);
            warn!("Identity provider reported an error: {}", reason);
            return Err(error::Auth::Rejected(reason.clone()));
        }

        let access_token = params
            .get("access_token")
            .ok_or_else(|| error::Auth::Rejected("callback carries no access token".to_owned()))?;
        let claims = decode_claims(access_token)?;

        let expires_at = claims.exp.or_else(|| {
            params
                .get("expires_in")
                .and_then(|expires_in| expires_in.parse::<u64>().ok())
                .map(|expires_in| now().saturating_add(expires_in))
        });
        let identity = Identity::new(
            claims.sub,
            claims.email.unwrap_or_else(|| claims.sub.to_string()),
        );

        let change = self
            .replace(Some(StoredSession {
                identity: identity.clone(),
                access_token: access_token.clone(),
                refresh_token: params.get("refresh_token").cloned(),
                expires_at,
            }))
            .await?;
        info!("Signed in as {} at {}", identity, change.revision());

        Ok(identity)
    }
}

#[async_trait]
impl<St: Storage<Record>, B: Browser> Service for Hosted<St, B> {
    async fn fetch_current_session(&self) -> Result<Change, error::Auth> {
        let mut storage = self.storage.lock().await;
        let record = load(&mut *storage).await?;

        let expired = record
            .session
            .as_ref()
            .filter(|session| session.is_expired(now()))
            .map(|session| session.identity.clone());
        match expired {
            Some(identity) => {
                info!("Session for {} has expired", identity);
                let cleared = record.advance(None);
                storage.update(&cleared).await?;

                let change = cleared.change();
                self.subscribers.broadcast(&change);
                Ok(change)
            }
            None => Ok(record.change()),
        }
    }

    fn subscribe(&self) -> Subscription {
        self.subscribers.register()
    }

    async fn begin_sign_in(&self, provider: Provider, redirect: &Url) -> Result<(), error::Auth> {
        if !matches!(redirect.scheme(), "http" | "https") {
            return Err(error::Auth::Redirect(format!(
                "unsupported redirect target {redirect}"
            )));
        }

        let url = self.authorize_url(provider, redirect)?;
        debug!("Sending user to {}", url);
        self.browser.open(&url)
    }

    async fn sign_out(&self) -> Result<(), error::Auth> {
        let change = self.replace(None).await?;
        info!("Signed out at {}", change.revision());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs, process,
        sync::{Arc, Mutex as SyncMutex},
    };

    use futures_util::StreamExt as _;
    use serde_json::json;

    use super::*;
    use crate::storage::{File, Memory};

    const USER: &str = "46640aca-1245-44d2-8ca9-d19750597d6c";

    #[derive(Clone, Default)]
    struct Recording {
        opened: Arc<SyncMutex<Vec<Url>>>,
    }

    impl Browser for Recording {
        fn open(&self, url: &Url) -> Result<(), error::Auth> {
            self.opened.lock().unwrap().push(url.clone());
            Ok(())
        }
    }

    fn token(claims: &serde_json::Value) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.c2lnbmF0dXJl",
            base64::encode_config(claims.to_string(), base64::URL_SAFE_NO_PAD)
        )
    }

    fn hosted(storage: Memory<Record>) -> Hosted<Memory<Record>, Recording> {
        hosted_on(storage)
    }

    fn hosted_on<St: Storage<Record>>(storage: St) -> Hosted<St, Recording> {
        Hosted::new(
            Some(Url::parse("https://project.example.com").unwrap()),
            Some(&SecretString::new("anon".to_owned())),
            storage,
            Recording::default(),
        )
        .unwrap()
    }

    #[test]
    fn missing_configuration_is_rejected() {
        let url = Url::parse("https://project.example.com").unwrap();
        let blank = SecretString::new("  ".to_owned());

        for (url, key) in [(Some(url.clone()), Some(&blank)), (Some(url), None), (None, None)] {
            let result = Hosted::new(url, key, Memory::<Record>::new(), Recording::default());
            assert!(matches!(result, Err(error::Error::Configuration(_))));
        }
    }

    #[tokio::test]
    async fn begin_sign_in_opens_authorize_url() {
        let service = hosted(Memory::new());
        let redirect = Url::parse("http://localhost:8080/").unwrap();

        service
            .begin_sign_in(Provider::Google, &redirect)
            .await
            .unwrap();

        let opened = service.browser.opened.lock().unwrap().clone();
        assert_eq!(
            opened,
            vec![Url::parse(
                "https://project.example.com/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2Flocalhost%3A8080%2F"
            )
            .unwrap()]
        );
        // Starting the redirect does not create a session on its own.
        assert_eq!(
            service.fetch_current_session().await.unwrap(),
            Change::new(Revision::default(), None)
        );
    }

    #[tokio::test]
    async fn begin_sign_in_refuses_odd_redirect_targets() {
        let service = hosted(Memory::new());
        let redirect = Url::parse("file:///tmp/callback").unwrap();

        let err = service
            .begin_sign_in(Provider::Github, &redirect)
            .await
            .unwrap_err();
        assert!(matches!(err, error::Auth::Redirect(_)));
        assert!(service.browser.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn complete_sign_in_stores_and_broadcasts() {
        let storage = Memory::new();
        let service = hosted(storage.clone());
        let mut subscription = service.subscribe();

        let callback = Url::parse(&format!(
            "http://localhost:8080/#access_token={}&expires_in=3600&refresh_token=r1&token_type=bearer",
            token(&json!({ "sub": USER, "email": "a@example.com" }))
        ))
        .unwrap();
        let identity = service.complete_sign_in(&callback).await.unwrap();
        assert_eq!(identity.email(), "a@example.com");
        assert_eq!(identity.id().to_string(), USER);

        let expected = Change::new(Revision::new(1), Some(identity));
        assert_eq!(subscription.next().await, Some(expected.clone()));
        assert_eq!(service.fetch_current_session().await.unwrap(), expected);

        // A fresh service over the same storage sees the same session.
        let restored = hosted(storage);
        assert_eq!(restored.fetch_current_session().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn complete_sign_in_reports_provider_errors() {
        let service = hosted(Memory::new());

        let callback = Url::parse(
            "http://localhost:8080/?error=access_denied&error_description=popup_closed",
        )
        .unwrap();
        assert_eq!(
            service.complete_sign_in(&callback).await.unwrap_err(),
            error::Auth::Rejected("popup_closed".to_owned())
        );

        let callback = Url::parse("http://localhost:8080/#access_token=not-a-jwt").unwrap();
        assert_eq!(
            service.complete_sign_in(&callback).await.unwrap_err(),
            error::Auth::Rejected("malformed access token".to_owned())
        );
    }

    #[tokio::test]
    async fn expired_session_is_cleared_once() {
        let service = hosted(Memory::new());
        let callback = Url::parse(&format!(
            "http://localhost:8080/#access_token={}",
            token(&json!({ "sub": USER, "email": "a@example.com", "exp": 1 }))
        ))
        .unwrap();
        let _identity = service.complete_sign_in(&callback).await.unwrap();

        let mut subscription = service.subscribe();
        let expired = Change::new(Revision::new(2), None);
        assert_eq!(service.fetch_current_session().await.unwrap(), expired);
        assert_eq!(subscription.next().await, Some(expired.clone()));

        // Nothing left to expire the second time around.
        assert_eq!(service.fetch_current_session().await.unwrap(), expired);
    }

    #[tokio::test]
    async fn sign_out_always_notifies() {
        let service = hosted(Memory::new());
        let mut subscription = service.subscribe();

        service.sign_out().await.unwrap();
        assert_eq!(
            subscription.next().await,
            Some(Change::new(Revision::new(1), None))
        );
    }

    #[tokio::test]
    async fn unreadable_record_is_replaced() {
        let path = env::temp_dir()
            .join(format!("docgate-hosted-{}", process::id()))
            .join("session.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();
        let service = hosted_on(File::at(&path));

        assert_eq!(
            service.fetch_current_session().await.unwrap(),
            Change::new(Revision::default(), None)
        );
        assert!(!path.exists());

        fs::write(&path, "{not json").unwrap();
        service.sign_out().await.unwrap();
        assert_eq!(
            service.fetch_current_session().await.unwrap(),
            Change::new(Revision::new(1), None)
        );

        fs::write(&path, "{not json").unwrap();
        let callback = Url::parse(&format!(
            "http://localhost:8080/#access_token={}",
            token(&json!({ "sub": USER, "email": "a@example.com" }))
        ))
        .unwrap();
        let identity = service.complete_sign_in(&callback).await.unwrap();
        assert_eq!(
            service.fetch_current_session().await.unwrap(),
            Change::new(Revision::new(1), Some(identity))
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn record_shape() {
        let record = Record::default().advance(Some(StoredSession {
            identity: Identity::new(Uuid::nil(), "a@example.com"),
            access_token: "token".to_owned(),
            refresh_token: None,
            expires_at: Some(10),
        }));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "revision": 1,
                "session": {
                    "identity": {
                        "id": "00000000-0000-0000-0000-000000000000",
                        "email": "a@example.com",
                    },
                    "access_token": "token",
                    "expires_at": 10,
                },
            })
        );
    }
}

use {
    crate::{
        api::MarketApi,
        error::{
            AuthError,
            ClientError,
        },
    },
    futures_util::{
        future::{
            BoxFuture,
            Shared,
        },
        FutureExt,
    },
    lotline_api_types::profile::{
        Credential,
        Profile,
    },
    std::sync::{
        Arc,
        Mutex,
    },
    tokio::sync::RwLock,
    tracing::{
        info,
        warn,
    },
};

/// Load/save/clear hooks for the credential kept across restarts.
///
/// The client reads on boot, writes after a successful refresh and clears on
/// logout; anything beyond that is up to the embedding application.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<Credential>;
    fn save(&self, credential: &Credential);
    fn clear(&self);
}

/// Credential store for embedders that do not persist sessions.
#[derive(Default)]
pub struct InMemoryCredentialStore(Mutex<Option<Credential>>);

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        self.0.lock().expect("lock").clone()
    }

    fn save(&self, credential: &Credential) {
        *self.0.lock().expect("lock") = Some(credential.clone());
    }

    fn clear(&self) {
        *self.0.lock().expect("lock") = None;
    }
}

/// Process-wide authentication state.
///
/// Only the [`RefreshCoordinator`] writes the credential; every other
/// component treats it as read-only.
pub struct Session {
    credential: RwLock<Option<Credential>>,
    profile:    RwLock<Option<Profile>>,
    store:      Arc<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let credential = store.load();
        Self {
            credential: RwLock::new(credential),
            profile: RwLock::new(None),
            store,
        }
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_some()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.profile.read().await.clone()
    }

    pub async fn set_profile(&self, profile: Profile) {
        *self.profile.write().await = Some(profile);
    }

    pub async fn is_identity_verified(&self) -> bool {
        self.profile
            .read()
            .await
            .as_ref()
            .map(|profile| profile.identity_verified)
            .unwrap_or(false)
    }

    async fn install(&self, credential: Credential) {
        self.store.save(&credential);
        *self.credential.write().await = Some(credential);
    }

    /// Clears every piece of local authentication state, store included.
    pub async fn logout(&self) {
        self.store.clear();
        *self.credential.write().await = None;
        *self.profile.write().await = None;
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Credential, AuthError>>>;

/// Collapses concurrent credential refreshes into one network attempt.
///
/// Concurrent refresh calls would race the token rotation endpoint and
/// invalidate each other's issued tokens, so every caller that arrives while
/// an attempt is pending awaits that same attempt. The slot is cleared
/// unconditionally when the attempt settles.
pub struct RefreshCoordinator {
    api:       Arc<dyn MarketApi>,
    session:   Arc<Session>,
    in_flight: Arc<Mutex<Option<SharedRefresh>>>,
}

impl RefreshCoordinator {
    pub fn new(api: Arc<dyn MarketApi>, session: Arc<Session>) -> Self {
        Self {
            api,
            session,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Rotates the access credential, sharing the outcome with every caller
    /// that arrives while the rotation is pending.
    ///
    /// On failure the session has already been logged out locally by the time
    /// the error is observed.
    pub async fn refresh(&self) -> Result<Credential, AuthError> {
        let refresh = {
            let mut slot = self.in_flight.lock().expect("lock");
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let api = self.api.clone();
                    let session = self.session.clone();
                    let in_flight = self.in_flight.clone();
                    let fresh = async move {
                        let result = perform_refresh(api.as_ref(), session.as_ref()).await;
                        // emptied before any waiter observes the outcome, so
                        // the next need starts an independent attempt
                        in_flight.lock().expect("lock").take();
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };
        refresh.await
    }
}

async fn perform_refresh(api: &dyn MarketApi, session: &Session) -> Result<Credential, AuthError> {
    match api.refresh_credential().await {
        Ok(credential) => {
            session.install(credential.clone()).await;
            info!("access credential refreshed");
            Ok(credential)
        }
        Err(err) => {
            // logout precedes propagation: a waiter observing the failure
            // already sees a signed-out session
            session.logout().await;
            warn!(error = %err, "credential refresh failed, session cleared");
            Err(match err {
                ClientError::RequestError(_) | ClientError::AuthenticationRequired => {
                    AuthError::SessionExpired
                }
                other => AuthError::RefreshFailed(other.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_util,
        async_trait::async_trait,
        lotline_api_types::{
            auction::{
                AuctionSnapshot,
                BidLogEntry,
            },
            bid::{
                BidCreate,
                BidResult,
            },
            AuctionId,
        },
        std::sync::atomic::{
            AtomicUsize,
            Ordering,
        },
    };

    /// Refresh transport that stays pending across one scheduler pass, so
    /// concurrent callers genuinely overlap.
    struct SlowRefreshApi {
        calls: AtomicUsize,
        fail:  bool,
    }

    impl SlowRefreshApi {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl MarketApi for SlowRefreshApi {
        async fn get_auction(&self, _: &AuctionId) -> Result<AuctionSnapshot, ClientError> {
            unimplemented!()
        }

        async fn get_bid_log(&self, _: &AuctionId) -> Result<Vec<BidLogEntry>, ClientError> {
            unimplemented!()
        }

        async fn submit_bid(&self, _: BidCreate) -> Result<BidResult, ClientError> {
            unimplemented!()
        }

        async fn get_profile(&self) -> Result<Profile, ClientError> {
            unimplemented!()
        }

        async fn list_bookmarks(&self) -> Result<Vec<AuctionId>, ClientError> {
            unimplemented!()
        }

        async fn add_bookmark(&self, _: &AuctionId) -> Result<(), ClientError> {
            unimplemented!()
        }

        async fn remove_bookmark(&self, _: &AuctionId) -> Result<(), ClientError> {
            unimplemented!()
        }

        async fn refresh_credential(&self) -> Result<Credential, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            if self.fail {
                Err(ClientError::RequestError("refresh token revoked".to_string()))
            } else {
                Ok(test_util::credential())
            }
        }
    }

    fn coordinator(api: Arc<SlowRefreshApi>) -> (RefreshCoordinator, Arc<Session>) {
        let session = Arc::new(Session::new(Arc::new(InMemoryCredentialStore::default())));
        (RefreshCoordinator::new(api, session.clone()), session)
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_attempt() {
        let api = Arc::new(SlowRefreshApi::new(false));
        let (coordinator, session) = coordinator(api.clone());

        let (a, b, c) = tokio::join!(
            coordinator.refresh(),
            coordinator.refresh(),
            coordinator.refresh()
        );

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        let expected = test_util::credential();
        assert_eq!(a.unwrap(), expected);
        assert_eq!(b.unwrap(), expected);
        assert_eq!(c.unwrap(), expected);
        assert_eq!(session.credential().await, Some(expected));
    }

    #[tokio::test]
    async fn settled_refresh_clears_the_slot() {
        let api = Arc::new(SlowRefreshApi::new(false));
        let (coordinator, _session) = coordinator(api.clone());

        coordinator.refresh().await.unwrap();
        coordinator.refresh().await.unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_refresh_logs_out_every_waiter() {
        let api = Arc::new(SlowRefreshApi::new(true));
        let (coordinator, session) = coordinator(api.clone());
        session
            .install(test_util::credential())
            .await;

        let (a, b) = tokio::join!(coordinator.refresh(), coordinator.refresh());

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), AuthError::SessionExpired);
        assert_eq!(b.unwrap_err(), AuthError::SessionExpired);
        // the logout is visible by the time the rejection is observed
        assert!(!session.is_authenticated().await);
        assert!(session.store.load().is_none());
    }
}

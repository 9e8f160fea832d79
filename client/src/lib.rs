//! Client for the Lotline timed-auction marketplace.
//!
//! The pieces compose as follows: [`Marketplace`] wires an http [`Client`]
//! to a process-wide [`auth::Session`], collapses credential refreshes
//! through [`auth::RefreshCoordinator`], and opens per-auction
//! [`room::AuctionRoom`]s that merge the authoritative snapshot with the
//! push stream. Bids go through [`gate::BidGate`], bookmarks through
//! [`bookmark::BookmarkStore`].

pub use lotline_api_types as api_types;
use {
    crate::{
        api::MarketApi,
        auth::{
            CredentialStore,
            InMemoryCredentialStore,
            RefreshCoordinator,
            Session,
        },
        bookmark::BookmarkStore,
        error::{
            AuthError,
            ClientError,
        },
        gate::BidGate,
        room::AuctionRoom,
        stream::WsConnector,
    },
    async_trait::async_trait,
    lotline_api_types::{
        auction::{
            self,
            AuctionSnapshot,
            BidLogEntry,
        },
        bid::{
            self,
            BidCreate,
            BidResult,
        },
        bookmark::{
            self as bookmark_api,
            BookmarkList,
            BookmarkUpdated,
        },
        profile::{
            self,
            Credential,
            Profile,
        },
        AccessLevel,
        AuctionId,
        ErrorBodyResponse,
        Routable,
    },
    reqwest::{
        Response,
        StatusCode,
    },
    serde::{
        de::DeserializeOwned,
        Deserialize,
        Serialize,
    },
    std::{
        future::Future,
        sync::Arc,
    },
    url::Url,
};

pub mod api;
pub mod auth;
pub mod bookmark;
pub mod error;
pub mod gate;
pub mod reconcile;
pub mod room;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_util;

pub struct ClientConfig {
    pub http_url: String,
    pub ws_url:   String,
}

/// Raw http transport against the marketplace api.
///
/// One request per call, no retry policy of its own; the single
/// expired-credential recovery lives one layer up, in [`Marketplace`].
pub struct Client {
    http_url: Url,
    ws_url:   Url,
    client:   reqwest::Client,
    session:  Arc<Session>,
}

enum DecodedResponse<T: DeserializeOwned> {
    Ok(T),
    Err(ErrorBodyResponse),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for DecodedResponse<T> {
    fn deserialize<D>(deserializer: D) -> Result<DecodedResponse<T>, D::Error>
    where
        D: ::serde::Deserializer<'de>,
    {
        let json_value = serde_json::Value::deserialize(deserializer)?;
        let value: Result<T, serde_json::Error> = serde_json::from_value(json_value.clone());
        match value {
            Ok(response) => Ok(DecodedResponse::Ok(response)),
            Err(error) => serde_json::from_value(json_value)
                .map(DecodedResponse::Err)
                .map_err(|_| serde::de::Error::custom(error)),
        }
    }
}

impl Client {
    pub fn try_new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ClientError> {
        let http_url = Url::parse(config.http_url.as_str())
            .map_err(|e| ClientError::InvalidHttpUrl(e.to_string()))?;
        let ws_url = Url::parse(config.ws_url.as_str())
            .map_err(|e| ClientError::InvalidWsUrl(e.to_string()))?;

        if http_url.scheme() != "http" && http_url.scheme() != "https" {
            return Err(ClientError::InvalidHttpUrl("Invalid scheme".to_string()));
        }

        if ws_url.scheme() != "ws" && ws_url.scheme() != "wss" {
            return Err(ClientError::InvalidWsUrl("Invalid scheme".to_string()));
        }

        // the refresh endpoint authorizes with the session cookie
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(ClientError::RequestFailed)?;

        Ok(Self {
            http_url,
            ws_url,
            client,
            session,
        })
    }

    pub(crate) fn ws_url(&self) -> &Url {
        &self.ws_url
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::AuthenticationRequired);
        }
        match response.json().await {
            Ok(DecodedResponse::Ok(response)) => Ok(response),
            Ok(DecodedResponse::Err(response)) => Err(ClientError::RequestError(response.error)),
            Err(e) => Err(ClientError::DecodeResponseFailed(e)),
        }
    }

    async fn send<B: Serialize, R: DeserializeOwned>(
        &self,
        route: impl Routable,
        auction_id: Option<&AuctionId>,
        body: Option<&B>,
    ) -> Result<R, ClientError> {
        let properties = route.properties();
        let credential = self.session.credential().await;
        if properties.access_level == AccessLevel::LoggedIn && credential.is_none() {
            return Err(ClientError::AuthenticationRequired);
        }

        let mut path = properties.full_path;
        if let Some(auction_id) = auction_id {
            path = path.replace(":auction_id", auction_id);
        }
        let url = self
            .http_url
            .join(path.as_str())
            .map_err(|e| ClientError::InvalidHttpUrl(e.to_string()))?;

        let mut request = self.client.request(properties.method, url);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(ClientError::RequestFailed)?;
        Client::decode(response).await
    }
}

#[async_trait]
impl MarketApi for Client {
    async fn get_auction(&self, auction_id: &AuctionId) -> Result<AuctionSnapshot, ClientError> {
        self.send(auction::Route::GetAuction, Some(auction_id), None::<&()>)
            .await
    }

    async fn get_bid_log(&self, auction_id: &AuctionId) -> Result<Vec<BidLogEntry>, ClientError> {
        self.send(auction::Route::GetBidLog, Some(auction_id), None::<&()>)
            .await
    }

    async fn submit_bid(&self, bid: BidCreate) -> Result<BidResult, ClientError> {
        self.send(bid::Route::PostBid, None, Some(&bid)).await
    }

    async fn get_profile(&self) -> Result<Profile, ClientError> {
        self.send(profile::Route::GetMe, None, None::<&()>).await
    }

    async fn list_bookmarks(&self) -> Result<Vec<AuctionId>, ClientError> {
        let list: BookmarkList = self
            .send(bookmark_api::Route::List, None, None::<&()>)
            .await?;
        Ok(list.auction_ids)
    }

    async fn add_bookmark(&self, auction_id: &AuctionId) -> Result<(), ClientError> {
        let _: BookmarkUpdated = self
            .send(bookmark_api::Route::Add, Some(auction_id), None::<&()>)
            .await?;
        Ok(())
    }

    async fn remove_bookmark(&self, auction_id: &AuctionId) -> Result<(), ClientError> {
        let _: BookmarkUpdated = self
            .send(bookmark_api::Route::Remove, Some(auction_id), None::<&()>)
            .await?;
        Ok(())
    }

    async fn refresh_credential(&self) -> Result<Credential, ClientError> {
        self.send(profile::Route::RefreshCredential, None, None::<&()>)
            .await
    }
}

/// [`MarketApi`] layer that recovers exactly once from an expired credential.
///
/// A call answered 401 while a credential is held is retried after one
/// coordinated refresh; when the refresh itself fails, the forced local
/// logout stands and the call fails with an authentication error.
struct AuthorizedApi {
    inner:       Arc<dyn MarketApi>,
    session:     Arc<Session>,
    coordinator: Arc<RefreshCoordinator>,
}

impl AuthorizedApi {
    async fn with_refresh<T, F, Fut>(&self, call: F) -> Result<T, ClientError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        match call().await {
            Err(ClientError::AuthenticationRequired) if self.session.is_authenticated().await => {
                self.coordinator
                    .refresh()
                    .await
                    .map_err(|_| ClientError::AuthenticationRequired)?;
                call().await
            }
            other => other,
        }
    }
}

#[async_trait]
impl MarketApi for AuthorizedApi {
    async fn get_auction(&self, auction_id: &AuctionId) -> Result<AuctionSnapshot, ClientError> {
        self.with_refresh(|| self.inner.get_auction(auction_id))
            .await
    }

    async fn get_bid_log(&self, auction_id: &AuctionId) -> Result<Vec<BidLogEntry>, ClientError> {
        self.with_refresh(|| self.inner.get_bid_log(auction_id))
            .await
    }

    async fn submit_bid(&self, bid: BidCreate) -> Result<BidResult, ClientError> {
        self.with_refresh(|| self.inner.submit_bid(bid.clone()))
            .await
    }

    async fn get_profile(&self) -> Result<Profile, ClientError> {
        self.with_refresh(|| self.inner.get_profile()).await
    }

    async fn list_bookmarks(&self) -> Result<Vec<AuctionId>, ClientError> {
        self.with_refresh(|| self.inner.list_bookmarks()).await
    }

    async fn add_bookmark(&self, auction_id: &AuctionId) -> Result<(), ClientError> {
        self.with_refresh(|| self.inner.add_bookmark(auction_id))
            .await
    }

    async fn remove_bookmark(&self, auction_id: &AuctionId) -> Result<(), ClientError> {
        self.with_refresh(|| self.inner.remove_bookmark(auction_id))
            .await
    }

    async fn refresh_credential(&self) -> Result<Credential, ClientError> {
        // raw rotation; collapsing and retries belong to the coordinator
        self.inner.refresh_credential().await
    }
}

/// One wired-up marketplace client.
#[derive(Clone)]
pub struct Marketplace {
    api:         Arc<AuthorizedApi>,
    session:     Arc<Session>,
    coordinator: Arc<RefreshCoordinator>,
    bookmarks:   Arc<BookmarkStore>,
    connector:   Arc<WsConnector>,
}

impl Marketplace {
    /// Builds a client that keeps the credential in memory only.
    pub fn try_new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_store(config, Arc::new(InMemoryCredentialStore::default()))
    }

    /// Builds a client over an embedder-provided credential store; the stored
    /// credential, if any, is read on boot.
    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        let session = Arc::new(Session::new(store));
        let client = Arc::new(Client::try_new(&config, session.clone())?);
        let connector = Arc::new(WsConnector::new(client.ws_url().clone()));
        let coordinator = Arc::new(RefreshCoordinator::new(client.clone(), session.clone()));
        let api = Arc::new(AuthorizedApi {
            inner: client,
            session: session.clone(),
            coordinator: coordinator.clone(),
        });
        let bookmarks = Arc::new(BookmarkStore::new(api.clone(), session.clone()));
        Ok(Self {
            api,
            session,
            coordinator,
            bookmarks,
            connector,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn bookmarks(&self) -> &BookmarkStore {
        &self.bookmarks
    }

    /// Rotates the access credential; concurrent calls share one attempt.
    pub async fn refresh_credential(&self) -> Result<Credential, AuthError> {
        self.coordinator.refresh().await
    }

    /// Fetches the profile of the signed-in user and caches it on the
    /// session. The identity-verified capability read by the bid gate comes
    /// from here.
    pub async fn load_profile(&self) -> Result<Profile, ClientError> {
        let profile = self.api.get_profile().await?;
        self.session.set_profile(profile.clone()).await;
        Ok(profile)
    }

    /// Opens an auction view: snapshot, bid log and live stream.
    pub async fn open_auction(&self, auction_id: AuctionId) -> Result<AuctionRoom, ClientError> {
        AuctionRoom::open(self.api.clone(), self.connector.clone(), auction_id).await
    }

    /// The bid precondition gate for an open auction view.
    pub fn bid_gate(&self, room: &AuctionRoom) -> BidGate {
        BidGate::new(self.api.clone(), self.session.clone(), room.view_sender())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::api::MockMarketApi,
        serde_json::json,
    };

    fn config() -> ClientConfig {
        ClientConfig {
            http_url: "https://api.lotline.test".to_string(),
            ws_url:   "wss://push.lotline.test".to_string(),
        }
    }

    #[test]
    fn rejects_malformed_urls() {
        let session = Arc::new(Session::new(Arc::new(InMemoryCredentialStore::default())));
        let bad_scheme = ClientConfig {
            http_url: "ftp://api.lotline.test".to_string(),
            ws_url:   "wss://push.lotline.test".to_string(),
        };
        assert!(matches!(
            Client::try_new(&bad_scheme, session.clone()),
            Err(ClientError::InvalidHttpUrl(_))
        ));

        let bad_ws = ClientConfig {
            http_url: "https://api.lotline.test".to_string(),
            ws_url:   "https://push.lotline.test".to_string(),
        };
        assert!(matches!(
            Client::try_new(&bad_ws, session),
            Err(ClientError::InvalidWsUrl(_))
        ));
    }

    #[test]
    fn decoded_response_accepts_payload_or_error_body() {
        let ok: DecodedResponse<BookmarkUpdated> =
            serde_json::from_value(json!({"bookmarked": true})).unwrap();
        assert!(matches!(
            ok,
            DecodedResponse::Ok(BookmarkUpdated { bookmarked: true })
        ));

        let err: DecodedResponse<BookmarkUpdated> =
            serde_json::from_value(json!({"error": "auction not found"})).unwrap();
        match err {
            DecodedResponse::Err(body) => assert_eq!(body.error, "auction not found"),
            DecodedResponse::Ok(_) => panic!("decoded an error body as payload"),
        }

        let malformed: Result<DecodedResponse<BookmarkUpdated>, _> =
            serde_json::from_value(json!({"unrelated": 1}));
        assert!(malformed.is_err());
    }

    #[tokio::test]
    async fn logged_in_routes_fail_before_any_network_io_when_signed_out() {
        let session = Arc::new(Session::new(Arc::new(InMemoryCredentialStore::default())));
        // the test host does not resolve; reaching the network would fail with
        // RequestFailed instead
        let client = Client::try_new(&config(), session).unwrap();

        let err = client.get_profile().await.unwrap_err();

        assert!(matches!(err, ClientError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn expired_credential_is_recovered_exactly_once() {
        use crate::auth::CredentialStore;

        let store = Arc::new(InMemoryCredentialStore::default());
        store.save(&crate::test_util::credential());
        let session = Arc::new(Session::new(store));

        let mut inner = MockMarketApi::new();
        let mut profile_calls = 0u32;
        inner.expect_get_profile().times(2).returning(move || {
            profile_calls += 1;
            if profile_calls == 1 {
                Err(ClientError::AuthenticationRequired)
            } else {
                Ok(crate::test_util::profile(true))
            }
        });
        inner
            .expect_refresh_credential()
            .times(1)
            .returning(|| Ok(crate::test_util::credential()));
        let inner: Arc<dyn MarketApi> = Arc::new(inner);

        let coordinator = Arc::new(RefreshCoordinator::new(inner.clone(), session.clone()));
        let api = AuthorizedApi {
            inner,
            session,
            coordinator,
        };

        let profile = api.get_profile().await.unwrap();
        assert!(profile.identity_verified);
    }

    #[tokio::test]
    async fn failed_recovery_surfaces_an_authentication_error() {
        use crate::auth::CredentialStore;

        let store = Arc::new(InMemoryCredentialStore::default());
        store.save(&crate::test_util::credential());
        let session = Arc::new(Session::new(store));

        let mut inner = MockMarketApi::new();
        inner
            .expect_get_profile()
            .times(1)
            .returning(|| Err(ClientError::AuthenticationRequired));
        inner
            .expect_refresh_credential()
            .times(1)
            .returning(|| Err(ClientError::RequestError("session revoked".to_string())));
        let inner: Arc<dyn MarketApi> = Arc::new(inner);

        let coordinator = Arc::new(RefreshCoordinator::new(inner.clone(), session.clone()));
        let api = AuthorizedApi {
            inner,
            session: session.clone(),
            coordinator,
        };

        let err = api.get_profile().await.unwrap_err();

        assert!(matches!(err, ClientError::AuthenticationRequired));
        // the failed refresh forced a local logout
        assert!(!session.is_authenticated().await);
    }
}

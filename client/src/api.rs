use {
    crate::error::ClientError,
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
        profile::{
            Credential,
            Profile,
        },
        AuctionId,
    },
};

/// Request/response surface of the marketplace api.
///
/// Implemented by [`crate::Client`] over http and mocked in tests so the
/// components built on top can be exercised without a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn get_auction(&self, auction_id: &AuctionId) -> Result<AuctionSnapshot, ClientError>;
    async fn get_bid_log(&self, auction_id: &AuctionId) -> Result<Vec<BidLogEntry>, ClientError>;
    async fn submit_bid(&self, bid: BidCreate) -> Result<BidResult, ClientError>;
    async fn get_profile(&self) -> Result<Profile, ClientError>;
    async fn list_bookmarks(&self) -> Result<Vec<AuctionId>, ClientError>;
    async fn add_bookmark(&self, auction_id: &AuctionId) -> Result<(), ClientError>;
    async fn remove_bookmark(&self, auction_id: &AuctionId) -> Result<(), ClientError>;
    /// Rotates the access credential using the session cookie. Raw transport
    /// operation; concurrent-call collapsing lives in
    /// [`crate::auth::RefreshCoordinator`].
    async fn refresh_credential(&self) -> Result<Credential, ClientError>;
}

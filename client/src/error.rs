use {
    lotline_api_types::Amount,
    thiserror::Error,
};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid http url: {0}")]
    InvalidHttpUrl(String),
    #[error("invalid ws url: {0}")]
    InvalidWsUrl(String),
    #[error("request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),
    /// The server processed the request and rejected it; the message is the
    /// server's own and is shown to the user verbatim.
    #[error("{0}")]
    RequestError(String),
    #[error("failed to decode response: {0}")]
    DecodeResponseFailed(#[source] reqwest::Error),
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("failed to connect stream: {0}")]
    StreamConnectFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failures of the credential refresh path.
///
/// `Clone` so that every caller collapsed into one in-flight refresh receives
/// the same rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The refresh endpoint rejected the session. The local session has
    /// already been cleared when this is observed.
    #[error("session expired, signed out")]
    SessionExpired,
    #[error("credential refresh failed: {0}")]
    RefreshFailed(String),
}

#[derive(Error, Debug)]
pub enum BidError {
    #[error("bid of {amount} must exceed the current price of {current_price}")]
    AmountTooLow {
        amount:        Amount,
        current_price: Amount,
    },
    #[error("bidding is not available for this auction")]
    BiddingUnavailable,
    #[error("another bid submission is already in flight")]
    SubmissionInFlight,
    #[error("no deposit acknowledgement is pending")]
    NoPendingDeposit,
    /// The server rejected the bid; the message is the server's own, e.g. a
    /// competing higher bid landed first.
    #[error("{0}")]
    Rejected(String),
    #[error("bid could not be placed")]
    Transport(#[source] ClientError),
}

#[derive(Error, Debug)]
pub enum BookmarkError {
    #[error("sign in to save auctions")]
    SignedOut,
    #[error(transparent)]
    Client(#[from] ClientError),
}

use {
    crate::{
        AccessLevel,
        Amount,
        Routable,
        RouteProperties,
    },
    http::Method,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::ToSchema,
};

/// Body of a `bid` frame.
///
/// Servers differ in which price fields they populate; at least one of
/// `bid_amount` and `current_price` is present on a well-formed frame.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, Default, PartialEq)]
pub struct BidPayload {
    /// The accepted bid amount, in minor currency units.
    #[schema(example = 130000, value_type = Option<u64>)]
    pub bid_amount:    Option<Amount>,
    /// The auction price after the bid, when the server includes it.
    #[schema(example = 130000, value_type = Option<u64>)]
    pub current_price: Option<Amount>,
    /// Masked display label of the bidder. Absent on degraded frames.
    #[schema(example = "b***r", value_type = Option<String>)]
    pub bidder_label:  Option<String>,
}

impl BidPayload {
    /// The price implied by this frame, preferring the server-computed
    /// current price over the raw bid amount.
    pub fn effective_amount(&self) -> Option<Amount> {
        self.current_price.or(self.bid_amount)
    }
}

/// One frame on the per-auction push stream.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Sent once when the subscription is established; carries the price as
    /// of stream establishment so a move between the initial fetch and the
    /// subscription is not lost.
    Connect { current_price: Amount },
    Bid(BidPayload),
    /// Terminal; the auction is over and the stream will deliver nothing
    /// further.
    Ended,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "auctions/:auction_id/ws")]
    AuctionStream,
}

impl Routable for Route {
    fn properties(&self) -> RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        match self {
            Route::AuctionStream => RouteProperties {
                access_level: AccessLevel::Public,
                method: Method::GET,
                full_path,
            },
        }
    }
}

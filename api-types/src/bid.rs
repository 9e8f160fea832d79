use {
    crate::{
        AccessLevel,
        Amount,
        AuctionId,
        Routable,
        RouteProperties,
    },
    http::Method,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::{
        ToResponse,
        ToSchema,
    },
    uuid::Uuid,
};

pub type BidId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct BidCreate {
    #[schema(example = "lot_9f3b2c", value_type = String)]
    pub auction_id: AuctionId,
    /// The amount to bid, in minor currency units. Must exceed the auction's
    /// current price.
    #[schema(example = 120000, value_type = u64)]
    pub amount:     Amount,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct BidResult {
    /// The status of the request. If the bid was placed, the status is "OK".
    #[schema(example = "OK")]
    pub status: String,
    /// The unique id assigned to the accepted bid.
    #[schema(example = "beedbeed-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:     BidId,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "bids")]
    PostBid,
}

impl Routable for Route {
    fn properties(&self) -> RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        match self {
            Route::PostBid => RouteProperties {
                access_level: AccessLevel::LoggedIn,
                method: Method::POST,
                full_path,
            },
        }
    }
}

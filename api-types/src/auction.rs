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
    time::OffsetDateTime,
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

/// Identifier of a bid log entry.
///
/// Entries synthesized locally from push events use a monotonic local
/// timestamp here; the key is temporary and replaced wholesale by the next
/// authoritative fetch of the log.
pub type BidLogEntryId = i64;

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Scheduled,
    InProgress,
    Ended,
    Withdrawn,
}

impl AuctionStatus {
    /// Whether the auction can never return to a live state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Ended | AuctionStatus::Withdrawn)
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct ProductSummary {
    /// The listing title shown on the auction page.
    #[schema(example = "1962 sunburst offset guitar")]
    pub title:     String,
    #[schema(value_type = Option<String>)]
    pub image_url: Option<String>,
    #[schema(value_type = Option<String>)]
    pub category:  Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MyParticipation {
    /// Whether the current user already has a bid on this auction.
    pub has_bid: bool,
}

/// Authoritative state of one auction as of the last full fetch.
#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct AuctionSnapshot {
    #[schema(example = "lot_9f3b2c", value_type = String)]
    pub id:               AuctionId,
    pub product:          ProductSummary,
    pub status:           AuctionStatus,
    /// The price the auction opened at, in minor currency units.
    #[schema(example = 50000, value_type = u64)]
    pub start_price:      Amount,
    /// The highest accepted price so far, in minor currency units.
    #[schema(example = 100000, value_type = u64)]
    pub current_price:    Amount,
    #[schema(example = 12, value_type = u32)]
    pub bid_count:        u32,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-01T12:00:00Z", value_type = String)]
    pub start_time:       OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-08T12:00:00Z", value_type = String)]
    pub end_time:         OffsetDateTime,
    /// Whether the current user may bid on this auction. Seller-of-record and
    /// ineligible-participant cases are resolved server-side; the client only
    /// reads the flag.
    pub can_bid:          bool,
    #[serde(default)]
    pub my_participation: MyParticipation,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
pub struct BidLogEntry {
    #[schema(example = 1754560000000000i64, value_type = i64)]
    pub id:           BidLogEntryId,
    /// Masked display label of the bidder, e.g. "b***r".
    #[schema(example = "b***r")]
    pub bidder_label: String,
    #[schema(example = 120000, value_type = u64)]
    pub amount:       Amount,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-07T09:30:00Z", value_type = String)]
    pub timestamp:    OffsetDateTime,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "auctions/:auction_id")]
    GetAuction,
    #[strum(serialize = "auctions/:auction_id/bids")]
    GetBidLog,
}

impl Routable for Route {
    fn properties(&self) -> RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        match self {
            Route::GetAuction => RouteProperties {
                access_level: AccessLevel::Public,
                method: Method::GET,
                full_path,
            },
            Route::GetBidLog => RouteProperties {
                access_level: AccessLevel::Public,
                method: Method::GET,
                full_path,
            },
        }
    }
}

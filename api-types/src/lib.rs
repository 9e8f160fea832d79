use {
    ::serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

pub mod auction;
pub mod bid;
pub mod bookmark;
pub mod profile;
pub mod ws;

pub type AuctionId = String;
/// Prices and bid amounts, in minor currency units.
pub type Amount = u64;

#[derive(ToResponse, ToSchema, Serialize, Deserialize)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    pub error: String,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "v1")]
    V1,
}

#[derive(PartialEq)]
pub enum AccessLevel {
    LoggedIn,
    Public,
}

pub struct RouteProperties {
    pub access_level: AccessLevel,
    pub method:       http::Method,
    pub full_path:    String,
}

pub trait Routable: AsRef<str> + Clone {
    fn properties(&self) -> RouteProperties;
}

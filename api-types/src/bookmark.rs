use {
    crate::{
        AccessLevel,
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
};

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct BookmarkList {
    #[schema(value_type = Vec<String>)]
    pub auction_ids: Vec<AuctionId>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct BookmarkUpdated {
    /// Whether the auction is bookmarked after the mutation.
    pub bookmarked: bool,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "bookmarks")]
    List,
    #[strum(serialize = "bookmarks/:auction_id")]
    Add,
    #[strum(serialize = "bookmarks/:auction_id")]
    Remove,
}

impl Routable for Route {
    fn properties(&self) -> RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        match self {
            Route::List => RouteProperties {
                access_level: AccessLevel::LoggedIn,
                method: Method::GET,
                full_path,
            },
            Route::Add => RouteProperties {
                access_level: AccessLevel::LoggedIn,
                method: Method::POST,
                full_path,
            },
            Route::Remove => RouteProperties {
                access_level: AccessLevel::LoggedIn,
                method: Method::DELETE,
                full_path,
            },
        }
    }
}

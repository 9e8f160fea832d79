use {
    crate::{
        AccessLevel,
        Routable,
        RouteProperties,
    },
    email_address::EmailAddress,
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
    uuid::Uuid,
};

pub type ProfileId = Uuid;

#[derive(Serialize, Deserialize, ToSchema, Clone, ToResponse, Debug)]
pub struct Profile {
    /// The id of the profile.
    #[schema(example = "obo3ee3e-58cc-4372-a567-0e02b2c3d479", value_type = String)]
    pub id:                ProfileId,
    /// The display name of the profile.
    #[schema(example = "John Doe")]
    pub name:              String,
    /// The email of the profile.
    #[schema(example = "example@example.com", value_type = String)]
    pub email:             EmailAddress,
    /// Whether the user has completed identity verification. Bidding requires
    /// a verified identity.
    pub identity_verified: bool,
}

/// A short-lived access credential for authorized api calls.
#[derive(Serialize, Deserialize, ToSchema, Clone, ToResponse, Debug, PartialEq)]
pub struct Credential {
    /// The bearer token to authorize api calls with.
    #[schema(example = "lot_4qshW9Cx0pPk4g4Sh7sMPw7cbLBy")]
    pub token:      String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(example = "2026-08-07T10:00:00Z", value_type = String)]
    pub expires_at: OffsetDateTime,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "profiles/me")]
    GetMe,
    #[strum(serialize = "auth/refresh")]
    RefreshCredential,
}

impl Routable for Route {
    fn properties(&self) -> RouteProperties {
        let full_path = format!("{}{}", crate::Route::V1.as_ref(), self.as_ref())
            .trim_end_matches('/')
            .to_string();
        match self {
            Route::GetMe => RouteProperties {
                access_level: AccessLevel::LoggedIn,
                method: Method::GET,
                full_path,
            },
            // The refresh endpoint authorizes with the session cookie, not the
            // bearer token it rotates.
            Route::RefreshCredential => RouteProperties {
                access_level: AccessLevel::Public,
                method: Method::POST,
                full_path,
            },
        }
    }
}

//! Shared fixtures for the in-crate tests.

use {
    lotline_api_types::{
        auction::{
            AuctionSnapshot,
            AuctionStatus,
            MyParticipation,
            ProductSummary,
        },
        profile::{
            Credential,
            Profile,
        },
    },
    time::{
        Duration,
        OffsetDateTime,
    },
};

pub fn snapshot() -> AuctionSnapshot {
    let now = OffsetDateTime::now_utc();
    AuctionSnapshot {
        id: "lot_9f3b2c".to_string(),
        product: ProductSummary {
            title: "1962 sunburst offset guitar".to_string(),
            image_url: None,
            category: Some("instruments".to_string()),
        },
        status: AuctionStatus::InProgress,
        start_price: 50_000,
        current_price: 100_000,
        bid_count: 12,
        start_time: now - Duration::hours(2),
        end_time: now + Duration::hours(22),
        can_bid: true,
        my_participation: MyParticipation { has_bid: false },
    }
}

pub fn credential() -> Credential {
    Credential {
        token: "lot_4qshW9Cx0pPk4g4Sh7sMPw7cbLBy".to_string(),
        expires_at: OffsetDateTime::from_unix_timestamp(1_790_000_000).expect("timestamp"),
    }
}

pub fn profile(identity_verified: bool) -> Profile {
    Profile {
        id: uuid::Uuid::nil(),
        name: "John Doe".to_string(),
        email: "example@example.com".parse().expect("email"),
        identity_verified,
    }
}

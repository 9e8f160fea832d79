//! Pure merge of push events into the auction view.
//!
//! Driven by the stream loop and the initial fetch; performs no I/O itself.
//! Events that arrive after the auction left `InProgress` are discarded, and
//! the price never regresses: a reconnect against a stale edge may replay an
//! older price, so the maximum observed value always wins.

use {
    lotline_api_types::{
        auction::{
            AuctionSnapshot,
            AuctionStatus,
            BidLogEntry,
        },
        ws::BidPayload,
        Amount,
    },
    time::OffsetDateTime,
};

/// Effect of applying a `bid` event to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidApplied {
    /// Snapshot and bid log updated.
    Logged,
    /// Snapshot updated, but the event carried no bidder identity; no log
    /// entry was synthesized and the caller must refetch the authoritative
    /// bid log.
    NeedsLogRefetch,
    /// Nothing changed: the auction is no longer live, or the event carried
    /// no usable amount.
    Discarded,
}

/// Applies the price sync delivered when a subscription is established.
pub fn apply_connect(snapshot: &mut AuctionSnapshot, current_price: Amount) {
    if snapshot.status != AuctionStatus::InProgress {
        return;
    }
    snapshot.current_price = snapshot.current_price.max(current_price);
}

/// Applies one accepted bid: price (max rule), bid count, and — when the
/// bidder is identified — a prepended log entry keyed by the local receipt
/// timestamp.
pub fn apply_bid(
    snapshot: &mut AuctionSnapshot,
    log: &mut Vec<BidLogEntry>,
    payload: &BidPayload,
    received_at: OffsetDateTime,
) -> BidApplied {
    if snapshot.status != AuctionStatus::InProgress {
        return BidApplied::Discarded;
    }
    let Some(amount) = payload.effective_amount() else {
        return BidApplied::Discarded;
    };
    snapshot.current_price = snapshot.current_price.max(amount);
    snapshot.bid_count += 1;
    match &payload.bidder_label {
        Some(label) => {
            log.insert(
                0,
                BidLogEntry {
                    // temporary key, replaced by the next authoritative fetch
                    id: received_at.unix_timestamp_nanos() as i64,
                    bidder_label: label.clone(),
                    amount: payload.bid_amount.unwrap_or(amount),
                    timestamp: received_at,
                },
            );
            BidApplied::Logged
        }
        None => BidApplied::NeedsLogRefetch,
    }
}

/// Flips the auction to `Ended`. Idempotent.
pub fn apply_ended(snapshot: &mut AuctionSnapshot) {
    snapshot.status = AuctionStatus::Ended;
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_util,
    };

    fn bid(amount: Amount, label: Option<&str>) -> BidPayload {
        BidPayload {
            bid_amount: Some(amount),
            current_price: None,
            bidder_label: label.map(str::to_string),
        }
    }

    #[test]
    fn price_is_the_maximum_seen_and_count_the_number_applied() {
        let mut snapshot = test_util::snapshot();
        let mut log = Vec::new();
        let start = snapshot.current_price;

        for (i, amount) in [110_000, 130_000, 120_000, 130_000].iter().enumerate() {
            let applied = apply_bid(
                &mut snapshot,
                &mut log,
                &bid(*amount, Some("b***r")),
                OffsetDateTime::now_utc(),
            );
            assert_eq!(applied, BidApplied::Logged);
            assert_eq!(snapshot.bid_count, 12 + i as u32 + 1);
        }

        assert!(snapshot.current_price >= start);
        assert_eq!(snapshot.current_price, 130_000);
        assert_eq!(log.len(), 4);
        // newest first, never reordered
        assert_eq!(log[0].amount, 130_000);
        assert_eq!(log[3].amount, 110_000);
    }

    #[test]
    fn connect_price_never_regresses() {
        let mut snapshot = test_util::snapshot();
        snapshot.current_price = 100_000;

        apply_connect(&mut snapshot, 90_000);
        assert_eq!(snapshot.current_price, 100_000);

        apply_connect(&mut snapshot, 125_000);
        assert_eq!(snapshot.current_price, 125_000);
    }

    #[test]
    fn ended_is_idempotent() {
        let mut snapshot = test_util::snapshot();

        apply_ended(&mut snapshot);
        let once = snapshot.clone();
        apply_ended(&mut snapshot);

        assert_eq!(snapshot, once);
        assert_eq!(snapshot.status, AuctionStatus::Ended);
    }

    #[test]
    fn events_after_ended_are_discarded() {
        let mut snapshot = test_util::snapshot();
        let mut log = Vec::new();
        apply_ended(&mut snapshot);
        let frozen = snapshot.clone();

        apply_connect(&mut snapshot, 500_000);
        let applied = apply_bid(
            &mut snapshot,
            &mut log,
            &bid(500_000, Some("s***e")),
            OffsetDateTime::now_utc(),
        );

        assert_eq!(applied, BidApplied::Discarded);
        assert_eq!(snapshot, frozen);
        assert!(log.is_empty());
    }

    #[test]
    fn bid_without_label_requests_a_log_refetch() {
        let mut snapshot = test_util::snapshot();
        let mut log = Vec::new();

        let applied = apply_bid(
            &mut snapshot,
            &mut log,
            &bid(130_000, None),
            OffsetDateTime::now_utc(),
        );

        assert_eq!(applied, BidApplied::NeedsLogRefetch);
        // no fake entry is synthesized
        assert!(log.is_empty());
        assert_eq!(snapshot.current_price, 130_000);
        assert_eq!(snapshot.bid_count, 13);
    }

    #[test]
    fn bid_without_any_amount_is_discarded() {
        let mut snapshot = test_util::snapshot();
        let mut log = Vec::new();
        let before = snapshot.clone();

        let applied = apply_bid(
            &mut snapshot,
            &mut log,
            &BidPayload::default(),
            OffsetDateTime::now_utc(),
        );

        assert_eq!(applied, BidApplied::Discarded);
        assert_eq!(snapshot, before);
    }
}

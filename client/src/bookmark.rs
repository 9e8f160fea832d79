use {
    crate::{
        api::MarketApi,
        auth::Session,
        error::BookmarkError,
    },
    lotline_api_types::AuctionId,
    std::{
        collections::HashSet,
        future::Future,
        sync::Arc,
    },
    tokio::sync::watch,
    tracing::warn,
};

/// Process-wide bookmarked-auction membership.
///
/// Toggles are optimistic: the local set flips first, the server call
/// follows, and a failed call rolls the set back to its pre-toggle value.
/// Readers observe either the pre- or the post-toggle set, never an
/// intermediate.
pub struct BookmarkStore {
    api:     Arc<dyn MarketApi>,
    session: Arc<Session>,
    members: watch::Sender<HashSet<AuctionId>>,
}

impl BookmarkStore {
    pub fn new(api: Arc<dyn MarketApi>, session: Arc<Session>) -> Self {
        let (members, _) = watch::channel(HashSet::new());
        Self {
            api,
            session,
            members,
        }
    }

    /// Read-only observation of the membership set.
    pub fn subscribe(&self) -> watch::Receiver<HashSet<AuctionId>> {
        self.members.subscribe()
    }

    pub fn contains(&self, auction_id: &AuctionId) -> bool {
        self.members.borrow().contains(auction_id)
    }

    /// Replaces the membership set with the server's record. Used on boot and
    /// after sign-in; toggles never trigger this.
    pub async fn refresh(&self) -> Result<(), BookmarkError> {
        let auction_ids = self.api.list_bookmarks().await?;
        self.members.send_replace(auction_ids.into_iter().collect());
        Ok(())
    }

    /// Flips membership for `auction_id` and returns the new membership.
    ///
    /// Rejected before any local mutation when signed out: membership has no
    /// meaning without a session.
    pub async fn toggle(&self, auction_id: &AuctionId) -> Result<bool, BookmarkError> {
        if !self.session.is_authenticated().await {
            return Err(BookmarkError::SignedOut);
        }
        let adding = !self.contains(auction_id);
        let outcome = optimistic(
            &self.members,
            |members| {
                if adding {
                    members.insert(auction_id.clone());
                } else {
                    members.remove(auction_id);
                }
            },
            |members| {
                if adding {
                    members.remove(auction_id);
                } else {
                    members.insert(auction_id.clone());
                }
            },
            async {
                if adding {
                    self.api.add_bookmark(auction_id).await
                } else {
                    self.api.remove_bookmark(auction_id).await
                }
            },
        )
        .await;
        match outcome {
            Ok(()) => Ok(adding),
            Err(err) => {
                warn!(%auction_id, error = %err, "bookmark toggle reverted");
                Err(err.into())
            }
        }
    }
}

/// Optimistic mutation: apply locally, attempt the remote effect, and roll
/// back to the pre-image when the effect fails.
async fn optimistic<T, E, Fut>(
    state: &watch::Sender<T>,
    apply: impl FnOnce(&mut T),
    revert: impl FnOnce(&mut T),
    effect: Fut,
) -> Result<(), E>
where
    Fut: Future<Output = Result<(), E>>,
{
    state.send_modify(|value| apply(value));
    match effect.await {
        Ok(()) => Ok(()),
        Err(err) => {
            state.send_modify(|value| revert(value));
            Err(err)
        }
    }
}

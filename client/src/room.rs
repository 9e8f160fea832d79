use {
    crate::{
        api::MarketApi,
        error::ClientError,
        reconcile::{
            self,
            BidApplied,
        },
        stream::{
            EventStream,
            StreamConnector,
        },
    },
    futures_util::StreamExt,
    lotline_api_types::{
        auction::{
            AuctionSnapshot,
            AuctionStatus,
            BidLogEntry,
        },
        ws::StreamEvent,
        AuctionId,
    },
    std::{
        sync::Arc,
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::{
        sync::watch,
        task::JoinHandle,
        time::sleep,
    },
    tracing::{
        debug,
        info,
        warn,
    },
};

/// Delay before a dropped stream is reopened. There is no backoff growth and
/// no retry cap; reconnection continues until the auction leaves its live
/// state or the view is torn down.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Everything the surrounding ui reads about one open auction.
#[derive(Clone, Debug)]
pub struct AuctionView {
    pub snapshot:   AuctionSnapshot,
    /// Newest first; locally synthesized entries carry temporary ids until
    /// the next authoritative fetch.
    pub bid_log:    Vec<BidLogEntry>,
    pub connection: ConnectionState,
}

/// One auction kept live: the authoritative snapshot merged with the push
/// stream, owned exclusively by this instance for its lifetime.
///
/// Dropping the room (or switching to another auction and dropping this one)
/// tears the stream down; no event reaches a stale view.
pub struct AuctionRoom {
    auction_id:  AuctionId,
    view:        Arc<watch::Sender<AuctionView>>,
    stream_task: JoinHandle<()>,
}

impl AuctionRoom {
    /// Fetches the authoritative snapshot and bid log, then opens the push
    /// stream for the auction.
    pub async fn open(
        api: Arc<dyn MarketApi>,
        connector: Arc<dyn StreamConnector>,
        auction_id: AuctionId,
    ) -> Result<Self, ClientError> {
        let snapshot = api.get_auction(&auction_id).await?;
        let bid_log = api.get_bid_log(&auction_id).await?;
        let (view, _) = watch::channel(AuctionView {
            snapshot,
            bid_log,
            connection: ConnectionState::Connecting,
        });
        let view = Arc::new(view);

        let stream_task = tokio::spawn(run_stream(
            view.clone(),
            api,
            connector,
            auction_id.clone(),
        ));

        Ok(Self {
            auction_id,
            view,
            stream_task,
        })
    }

    pub fn auction_id(&self) -> &AuctionId {
        &self.auction_id
    }

    /// Read-only observation of the auction view.
    pub fn subscribe(&self) -> watch::Receiver<AuctionView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> AuctionView {
        self.view.borrow().clone()
    }

    /// Closes the stream. Synchronous: no further event is applied to this
    /// view afterwards.
    pub fn close(&self) {
        self.stream_task.abort();
        self.view.send_modify(|view| {
            view.connection = ConnectionState::Disconnected;
        });
    }

    pub(crate) fn view_sender(&self) -> Arc<watch::Sender<AuctionView>> {
        self.view.clone()
    }
}

impl Drop for AuctionRoom {
    fn drop(&mut self) {
        self.stream_task.abort();
    }
}

async fn run_stream(
    view: Arc<watch::Sender<AuctionView>>,
    api: Arc<dyn MarketApi>,
    connector: Arc<dyn StreamConnector>,
    auction_id: AuctionId,
) {
    loop {
        // re-checked at every (re)connect: the stream is only open while the
        // auction is live
        if view.borrow().snapshot.status != AuctionStatus::InProgress {
            set_connection(&view, ConnectionState::Disconnected);
            return;
        }
        set_connection(&view, ConnectionState::Connecting);
        match connector.connect(&auction_id).await {
            Ok(mut events) => {
                set_connection(&view, ConnectionState::Connected);
                debug!(%auction_id, "stream established");
                if consume(&view, api.as_ref(), &auction_id, &mut events).await {
                    set_connection(&view, ConnectionState::Disconnected);
                    info!(%auction_id, "auction ended, stream closed");
                    return;
                }
                set_connection(&view, ConnectionState::Disconnected);
                warn!(%auction_id, "stream dropped");
            }
            Err(err) => {
                set_connection(&view, ConnectionState::Error);
                warn!(%auction_id, error = %err, "stream connect failed");
            }
        }
        sleep(RECONNECT_DELAY).await;
    }
}

/// Applies stream events until the connection is gone. Returns true when the
/// auction ended (terminal, no reconnect).
async fn consume(
    view: &watch::Sender<AuctionView>,
    api: &dyn MarketApi,
    auction_id: &AuctionId,
    events: &mut EventStream,
) -> bool {
    while let Some(frame) = events.next().await {
        let event = match frame {
            Ok(event) => event,
            Err(err) => {
                warn!(%auction_id, error = %err, "stream transport error");
                return false;
            }
        };
        match event {
            StreamEvent::Connect { current_price } => {
                view.send_modify(|view| {
                    reconcile::apply_connect(&mut view.snapshot, current_price);
                });
            }
            StreamEvent::Bid(payload) => {
                let received_at = OffsetDateTime::now_utc();
                let mut applied = BidApplied::Discarded;
                view.send_modify(|view| {
                    applied = reconcile::apply_bid(
                        &mut view.snapshot,
                        &mut view.bid_log,
                        &payload,
                        received_at,
                    );
                });
                if applied == BidApplied::NeedsLogRefetch {
                    refetch_bid_log(view, api, auction_id).await;
                }
            }
            StreamEvent::Ended => {
                view.send_modify(|view| reconcile::apply_ended(&mut view.snapshot));
                return true;
            }
        }
    }
    false
}

/// Replaces the log wholesale with the server's record; temporary local ids
/// do not survive this.
async fn refetch_bid_log(
    view: &watch::Sender<AuctionView>,
    api: &dyn MarketApi,
    auction_id: &AuctionId,
) {
    match api.get_bid_log(auction_id).await {
        Ok(bid_log) => view.send_modify(|view| view.bid_log = bid_log),
        Err(err) => warn!(%auction_id, error = %err, "bid log refetch failed"),
    }
}

fn set_connection(view: &watch::Sender<AuctionView>, connection: ConnectionState) {
    view.send_modify(|view| view.connection = connection);
}

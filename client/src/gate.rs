use {
    crate::{
        api::MarketApi,
        auth::Session,
        error::{
            BidError,
            ClientError,
        },
        room::AuctionView,
    },
    lotline_api_types::{
        auction::AuctionStatus,
        bid::{
            BidCreate,
            BidResult,
        },
        Amount,
        AuctionId,
    },
    std::sync::{
        Arc,
        Mutex,
    },
    tokio::sync::watch,
    tracing::info,
};

/// Amount held between the gate-passing click and the final submit call.
/// Discarded on submit, cancel, or dismissal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidIntent {
    pub amount:           Amount,
    pub requires_deposit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GateState {
    Idle,
    /// First bid on this auction: the amount is held until the deposit
    /// acknowledgement is confirmed or dismissed.
    AwaitingDeposit(BidIntent),
    /// A submission is outstanding. New submissions are refused until it
    /// settles; the outstanding one is never aborted.
    Submitting,
}

/// Outcome of a bid attempt that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub enum BidAttempt {
    /// Not signed in; the ui should offer navigation to sign-in.
    SignInRequired,
    /// Signed in but not identity-verified; the ui should open the
    /// verification flow.
    VerificationRequired,
    /// First bid on this auction: the deposit acknowledgement must be
    /// confirmed before the bid is submitted.
    DepositRequired(BidIntent),
    /// The bid was submitted and accepted.
    Placed(BidResult),
}

/// Precondition state machine in front of the bid call.
///
/// Every attempt walks the same fixed sequence — authentication, identity
/// verification, capability and amount validation, first-bid deposit — and
/// each check short-circuits the rest. Nothing here mutates the price: the
/// price only moves on the authoritative push path, since the server decides
/// whether a competing higher bid landed first.
pub struct BidGate {
    api:     Arc<dyn MarketApi>,
    session: Arc<Session>,
    view:    Arc<watch::Sender<AuctionView>>,
    state:   Mutex<GateState>,
}

impl BidGate {
    pub(crate) fn new(
        api: Arc<dyn MarketApi>,
        session: Arc<Session>,
        view: Arc<watch::Sender<AuctionView>>,
    ) -> Self {
        Self {
            api,
            session,
            view,
            state: Mutex::new(GateState::Idle),
        }
    }

    /// Runs the precondition sequence for a bid of `amount`.
    ///
    /// Returns `Ok(DepositRequired)` without submitting when this is the
    /// user's first bid on the auction; call [`BidGate::confirm_deposit`] to
    /// proceed or [`BidGate::cancel`] to discard the held amount.
    pub async fn submit(&self, amount: Amount) -> Result<BidAttempt, BidError> {
        if !self.session.is_authenticated().await {
            return Ok(BidAttempt::SignInRequired);
        }
        if !self.session.is_identity_verified().await {
            return Ok(BidAttempt::VerificationRequired);
        }
        let (auction_id, has_bid) = {
            let view = self.view.borrow();
            if view.snapshot.status != AuctionStatus::InProgress || !view.snapshot.can_bid {
                return Err(BidError::BiddingUnavailable);
            }
            if amount <= view.snapshot.current_price {
                return Err(BidError::AmountTooLow {
                    amount,
                    current_price: view.snapshot.current_price,
                });
            }
            (
                view.snapshot.id.clone(),
                view.snapshot.my_participation.has_bid,
            )
        };
        if !has_bid {
            let intent = BidIntent {
                amount,
                requires_deposit: true,
            };
            let mut state = self.state.lock().expect("lock");
            if *state == GateState::Submitting {
                return Err(BidError::SubmissionInFlight);
            }
            *state = GateState::AwaitingDeposit(intent);
            return Ok(BidAttempt::DepositRequired(intent));
        }
        // deposit already held from the first bid
        self.dispatch(auction_id, amount)
            .await
            .map(BidAttempt::Placed)
    }

    /// Proceeds with the held amount after the deposit acknowledgement.
    pub async fn confirm_deposit(&self) -> Result<BidAttempt, BidError> {
        let intent = {
            let mut state = self.state.lock().expect("lock");
            match *state {
                GateState::AwaitingDeposit(intent) => {
                    *state = GateState::Idle;
                    intent
                }
                GateState::Submitting => return Err(BidError::SubmissionInFlight),
                GateState::Idle => return Err(BidError::NoPendingDeposit),
            }
        };
        let auction_id = self.view.borrow().snapshot.id.clone();
        self.dispatch(auction_id, intent.amount)
            .await
            .map(BidAttempt::Placed)
    }

    /// Dismisses the deposit prompt and discards the held amount.
    pub fn cancel(&self) {
        let mut state = self.state.lock().expect("lock");
        if let GateState::AwaitingDeposit(_) = *state {
            *state = GateState::Idle;
        }
    }

    async fn dispatch(&self, auction_id: AuctionId, amount: Amount) -> Result<BidResult, BidError> {
        {
            let mut state = self.state.lock().expect("lock");
            if *state == GateState::Submitting {
                return Err(BidError::SubmissionInFlight);
            }
            *state = GateState::Submitting;
        }
        let result = self.api.submit_bid(BidCreate { auction_id, amount }).await;
        // transient gate state is cleared on every outcome
        *self.state.lock().expect("lock") = GateState::Idle;
        match result {
            Ok(result) => {
                // the next bid skips the deposit step without waiting for a
                // server round trip
                self.view.send_modify(|view| {
                    view.snapshot.my_participation.has_bid = true;
                });
                info!(amount, "bid placed");
                Ok(result)
            }
            Err(ClientError::RequestError(message)) => Err(BidError::Rejected(message)),
            Err(err) => Err(BidError::Transport(err)),
        }
    }
}

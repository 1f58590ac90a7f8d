//! Wallet eligibility gate
//!
//! Connecting a wallet registers the player and checks their balance
//! against the policy minimum. Every change of user or eligibility is
//! published as a `UserEvent` to all subscribers; a new subscriber gets the
//! current state straight away if a user is already known.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::LocalBoxFuture;

use crate::error::EligibilityError;
use crate::persistence::{Player, ScoreStore};

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Browser wallet extension
pub trait WalletProvider {
    /// Ask the user to connect; resolves to the wallet address
    fn connect(&self) -> LocalBoxFuture<'static, Result<String, EligibilityError>>;
    fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), EligibilityError>>;
}

/// Chain balance lookup
pub trait BalanceOracle {
    fn balance_sol(&self, wallet: &str) -> LocalBoxFuture<'static, Result<f64, EligibilityError>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityPolicy {
    pub min_balance_sol: f64,
    /// Treat oracle failures as eligible. Development only.
    pub bypass_on_oracle_error: bool,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_balance_sol: 0.1,
            bypass_on_oracle_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserEvent {
    pub user: Option<Player>,
    pub eligible: bool,
}

#[derive(Default)]
struct GateState {
    user: Option<Player>,
    eligible: bool,
    subscribers: Vec<UnboundedSender<UserEvent>>,
}

impl GateState {
    fn snapshot(&self) -> UserEvent {
        UserEvent {
            user: self.user.clone(),
            eligible: self.eligible,
        }
    }

    fn publish(&mut self) {
        let event = self.snapshot();
        self.subscribers.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

pub struct EligibilityGate {
    wallet: Rc<dyn WalletProvider>,
    oracle: Rc<dyn BalanceOracle>,
    store: Rc<dyn ScoreStore>,
    policy: EligibilityPolicy,
    state: RefCell<GateState>,
}

impl EligibilityGate {
    pub fn new(
        wallet: Rc<dyn WalletProvider>,
        oracle: Rc<dyn BalanceOracle>,
        store: Rc<dyn ScoreStore>,
        policy: EligibilityPolicy,
    ) -> Self {
        Self {
            wallet,
            oracle,
            store,
            policy,
            state: RefCell::new(GateState::default()),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<UserEvent> {
        let (tx, rx) = mpsc::unbounded();
        let mut state = self.state.borrow_mut();
        if state.user.is_some() {
            let _ = tx.unbounded_send(state.snapshot());
        }
        state.subscribers.push(tx);
        rx
    }

    pub fn user(&self) -> Option<Player> {
        self.state.borrow().user.clone()
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.state.borrow().user.as_ref().map(|u| u.wallet_address.clone())
    }

    pub fn is_eligible(&self) -> bool {
        let state = self.state.borrow();
        state.user.is_some() && state.eligible
    }

    /// Connect, register the player and check their balance
    pub async fn connect(&self) -> Result<Player, EligibilityError> {
        let address = self.wallet.connect().await?;
        log::info!("Wallet connected: {address}");

        let player = self.store.ensure_player(&address).await?;
        let eligible = self.check_balance(&address).await;

        let mut state = self.state.borrow_mut();
        state.user = Some(player.clone());
        state.eligible = eligible;
        state.publish();
        Ok(player)
    }

    /// Re-run the balance check for the connected wallet
    pub async fn recheck(&self) -> Result<bool, EligibilityError> {
        let address = self.wallet_address().ok_or(EligibilityError::NoWallet)?;
        let eligible = self.check_balance(&address).await;

        let mut state = self.state.borrow_mut();
        state.eligible = eligible;
        state.publish();
        Ok(eligible)
    }

    pub async fn disconnect(&self) {
        if let Err(e) = self.wallet.disconnect().await {
            log::warn!("Wallet disconnect failed: {e}");
        }
        self.handle_disconnect();
    }

    /// Clear the user; also called when the wallet disconnects on its own
    pub fn handle_disconnect(&self) {
        let mut state = self.state.borrow_mut();
        state.user = None;
        state.eligible = false;
        state.publish();
        log::info!("Wallet disconnected");
    }

    async fn check_balance(&self, address: &str) -> bool {
        match self.oracle.balance_sol(address).await {
            Ok(balance) => {
                let eligible = balance >= self.policy.min_balance_sol;
                log::info!(
                    "Balance {balance:.4} SOL, need {} SOL: eligible={eligible}",
                    self.policy.min_balance_sol
                );
                eligible
            }
            Err(e) if self.policy.bypass_on_oracle_error => {
                log::warn!("Balance lookup failed ({e}), bypassing check");
                true
            }
            Err(e) => {
                log::warn!("Balance lookup failed: {e}");
                false
            }
        }
    }
}

// ============================================================================
// SEND FLOW - staged send-transaction state machine
// ============================================================================
//
//   form → fee-estimate → fee-confirmation → transaction-creation
//        → transaction-review → sign-transaction → processing → complete
//
// Every network step moves to a transient stage first and rolls back to the
// previous user-facing stage on failure, keeping the error for display.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{BroadcastTransaction, FeeEstimate, TransferRequest};
use super::{ClientError, WalletRpc};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Form,
    FeeEstimate,
    FeeConfirmation,
    TransactionCreation,
    TransactionReview,
    SignTransaction,
    Processing,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Form => "form",
            Stage::FeeEstimate => "fee-estimate",
            Stage::FeeConfirmation => "fee-confirmation",
            Stage::TransactionCreation => "transaction-creation",
            Stage::TransactionReview => "transaction-review",
            Stage::SignTransaction => "sign-transaction",
            Stage::Processing => "processing",
            Stage::Complete => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SendFlowError {
    #[error("Recipient address is required")]
    MissingRecipient,

    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Cannot {action} during {stage}")]
    WrongStage { action: &'static str, stage: Stage },

    #[error("Node response is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, max_attempts: DEFAULT_POLL_ATTEMPTS }
    }
}

/// How status tracking ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Confirmed(Value),
    Failed(Value),
    /// Attempts ran out while the node kept answering with a non-final status.
    Timeout,
    /// Attempts ran out and the last poll itself failed.
    Error,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Confirmed(_) => "confirmed",
            PollOutcome::Failed(_) => "failed",
            PollOutcome::Timeout => "timeout",
            PollOutcome::Error => "error",
        }
    }
}

/// Poll `getTransactionStatus` until the transaction is confirmed or failed,
/// or `policy.max_attempts` polls have been made. `on_update` sees every
/// reported status, then the terminal `timeout`/`error` with no payload.
pub async fn poll_transaction_status<R, F>(
    rpc: &R,
    tx_id: &str,
    policy: PollPolicy,
    mut on_update: F,
) -> PollOutcome
where
    R: WalletRpc + ?Sized,
    F: FnMut(&str, Option<&Value>),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        let last_ok = match rpc.get_transaction_status(tx_id).await {
            Ok(tx) => {
                let status = tx.get("status").and_then(Value::as_str).unwrap_or_default().to_string();
                on_update(&status, Some(&tx));
                match status.as_str() {
                    "confirmed" => return PollOutcome::Confirmed(tx),
                    "failed" => return PollOutcome::Failed(tx),
                    _ => true,
                }
            }
            Err(e) => {
                warn!(tx_id, error = %e, "Error polling transaction status");
                false
            }
        };

        attempts += 1;
        if attempts >= max_attempts {
            let outcome = if last_ok { PollOutcome::Timeout } else { PollOutcome::Error };
            on_update(outcome.as_str(), None);
            return outcome;
        }
        tokio::time::sleep(policy.interval).await;
    }
}

pub struct SendFlow<R: WalletRpc> {
    rpc: R,
    from: String,
    balance: Option<f64>,
    policy: PollPolicy,
    stage: Stage,
    to: String,
    amount: f64,
    fee: Option<FeeEstimate>,
    unsigned: Option<Value>,
    signed: Option<Value>,
    tx_id: Option<String>,
    outcome: Option<PollOutcome>,
    last_error: Option<String>,
}

impl<R: WalletRpc> SendFlow<R> {
    pub fn new(rpc: R, from: impl Into<String>) -> Self {
        Self {
            rpc,
            from: from.into(),
            balance: None,
            policy: PollPolicy::default(),
            stage: Stage::Form,
            to: String::new(),
            amount: 0.0,
            fee: None,
            unsigned: None,
            signed: None,
            tx_id: None,
            outcome: None,
            last_error: None,
        }
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn fee(&self) -> Option<&FeeEstimate> {
        self.fee.as_ref()
    }

    pub fn unsigned_transaction(&self) -> Option<&Value> {
        self.unsigned.as_ref()
    }

    pub fn signed_transaction(&self) -> Option<&Value> {
        self.signed.as_ref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    pub fn outcome(&self) -> Option<&PollOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    /// Amount plus the estimated network fee.
    pub fn total_with_fee(&self) -> Option<f64> {
        self.fee.as_ref().map(|f| self.amount + f.fee)
    }

    pub async fn refresh_balance(&mut self) -> Result<f64, SendFlowError> {
        let balance = self.rpc.get_balance(&self.from).await?;
        self.balance = Some(balance);
        Ok(balance)
    }

    fn expect_stage(&self, expected: Stage, action: &'static str) -> Result<(), SendFlowError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(SendFlowError::WrongStage { action, stage: self.stage })
        }
    }

    fn validate_form(&self, to: &str, amount: f64) -> Result<(), SendFlowError> {
        if to.trim().is_empty() {
            return Err(SendFlowError::MissingRecipient);
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SendFlowError::InvalidAmount);
        }
        if matches!(self.balance, Some(balance) if amount > balance) {
            return Err(SendFlowError::InsufficientBalance);
        }
        Ok(())
    }

    fn fail(&mut self, back_to: Stage, err: SendFlowError) -> SendFlowError {
        debug!(stage = %self.stage, back_to = %back_to, error = %err, "Send step failed");
        self.stage = back_to;
        self.last_error = Some(err.to_string());
        err
    }

    /// Step 1: validate the form and estimate the fee.
    pub async fn estimate(&mut self, to: &str, amount: f64) -> Result<&FeeEstimate, SendFlowError> {
        self.expect_stage(Stage::Form, "estimate fee")?;
        self.last_error = None;
        if let Err(err) = self.validate_form(to, amount) {
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        self.to = to.to_string();
        self.amount = amount;
        self.fee = None;
        self.stage = Stage::FeeEstimate;

        let estimated = self.rpc.estimate_fee(&self.from, to, amount).await;
        match estimated {
            Ok(fee) => {
                self.stage = Stage::FeeConfirmation;
                Ok(self.fee.insert(fee))
            }
            Err(e) => Err(self.fail(Stage::Form, e.into())),
        }
    }

    /// Step 2: fee accepted, build the unsigned transaction with its gas values.
    pub async fn confirm_fee(&mut self) -> Result<&Value, SendFlowError> {
        self.expect_stage(Stage::FeeConfirmation, "confirm fee")?;
        let fee = self.fee.clone().unwrap_or_default();
        self.stage = Stage::TransactionCreation;

        let transfer = TransferRequest::new(self.from.clone(), self.to.clone(), self.amount)
            .with_gas(fee.gas_price, fee.gas_limit);
        let created = self.rpc.create_unsigned_transaction(&transfer).await;
        match created {
            Ok(unsigned) => {
                self.last_error = None;
                self.stage = Stage::TransactionReview;
                Ok(self.unsigned.insert(unsigned))
            }
            Err(e) => Err(self.fail(Stage::FeeConfirmation, e.into())),
        }
    }

    /// Step 3: the user has reviewed the unsigned transaction.
    pub fn confirm_review(&mut self) -> Result<(), SendFlowError> {
        self.expect_stage(Stage::TransactionReview, "confirm review")?;
        self.stage = Stage::SignTransaction;
        Ok(())
    }

    /// Step 4: sign with the mnemonic and broadcast. Returns the transaction id.
    pub async fn sign_and_send(&mut self, mnemonic: &str) -> Result<&str, SendFlowError> {
        self.expect_stage(Stage::SignTransaction, "sign transaction")?;
        let sent = self.sign_and_broadcast(mnemonic).await;
        match sent {
            Ok(tx_id) => {
                info!(tx_id = %tx_id, "📤 Transaction sent");
                self.last_error = None;
                self.stage = Stage::Processing;
                Ok(self.tx_id.insert(tx_id).as_str())
            }
            Err(err) => Err(self.fail(Stage::TransactionReview, err)),
        }
    }

    async fn sign_and_broadcast(&mut self, mnemonic: &str) -> Result<String, SendFlowError> {
        let unsigned = self.unsigned.clone().unwrap_or(Value::Null);
        let signed = self.rpc.sign_transaction(mnemonic, &unsigned).await?;
        let broadcast = BroadcastTransaction::from_signed(&signed)?;
        self.signed = Some(signed);

        let receipt = self.rpc.send_transaction(&broadcast).await?;
        transaction_id_of(&receipt).ok_or(SendFlowError::MissingField("transactionId"))
    }

    /// One-shot path: create, sign and broadcast in a single node call.
    pub async fn send_with_key(&mut self, to: &str, amount: f64, mnemonic: &str) -> Result<&str, SendFlowError> {
        if !matches!(self.stage, Stage::Form | Stage::FeeConfirmation) {
            return Err(SendFlowError::WrongStage { action: "send with key", stage: self.stage });
        }
        let back_to = self.stage;
        if let Err(err) = self.validate_form(to, amount) {
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let fee = self.fee.clone().unwrap_or_default();
        let transfer = TransferRequest::new(self.from.clone(), to, amount).with_gas(fee.gas_price, fee.gas_limit);
        self.to = to.to_string();
        self.amount = amount;
        self.stage = Stage::TransactionCreation;

        let sent = self.rpc.send_transaction_with_key(&transfer, mnemonic).await;
        let result = match sent {
            Ok(receipt) => transaction_id_of(&receipt).ok_or(SendFlowError::MissingField("transactionId")),
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(tx_id) => {
                self.last_error = None;
                self.stage = Stage::Processing;
                Ok(self.tx_id.insert(tx_id).as_str())
            }
            Err(err) => Err(self.fail(back_to, err)),
        }
    }

    /// Step 5: poll until a final status or the attempt cap. Always completes.
    pub async fn track(&mut self) -> Result<&PollOutcome, SendFlowError> {
        self.expect_stage(Stage::Processing, "track transaction")?;
        let tx_id = self.tx_id.clone().ok_or(SendFlowError::MissingField("transactionId"))?;

        let outcome = poll_transaction_status(&self.rpc, &tx_id, self.policy, |status, _| {
            debug!(tx_id = %tx_id, status, "Transaction status update");
        })
        .await;

        info!(tx_id = %tx_id, outcome = outcome.as_str(), "Transaction tracking finished");
        self.stage = Stage::Complete;
        Ok(self.outcome.insert(outcome))
    }

    /// Back to the form, dropping every intermediate result.
    pub fn cancel(&mut self) {
        self.stage = Stage::Form;
        self.to.clear();
        self.amount = 0.0;
        self.fee = None;
        self.unsigned = None;
        self.signed = None;
        self.tx_id = None;
        self.outcome = None;
        self.last_error = None;
    }
}

fn transaction_id_of(receipt: &Value) -> Option<String> {
    receipt
        .get("transactionId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

//! Wire shapes the wallet client exchanges with the node through the proxy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ClientError;

pub const DEFAULT_FEE: f64 = 0.0001;
pub const DEFAULT_GAS_PRICE: f64 = 20.0;
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// Normalized `estimateFee` result. Missing or zero values fall back to the
/// network defaults so the confirmation step always has something to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub fee: f64,
    pub gas_price: f64,
    pub gas_limit: u64,
    pub utxos: Vec<Value>,
    pub total_available: f64,
}

impl Default for FeeEstimate {
    fn default() -> Self {
        Self {
            fee: DEFAULT_FEE,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
            utxos: Vec::new(),
            total_available: 0.0,
        }
    }
}

impl FeeEstimate {
    pub fn from_value(raw: &Value) -> Self {
        let defaults = Self::default();
        let positive = |key: &str| raw.get(key).and_then(Value::as_f64).filter(|v| *v != 0.0);

        Self {
            fee: positive("fee").unwrap_or(defaults.fee),
            gas_price: positive("gasPrice").unwrap_or(defaults.gas_price),
            gas_limit: raw
                .get("gasLimit")
                .and_then(Value::as_u64)
                .filter(|v| *v != 0)
                .unwrap_or(defaults.gas_limit),
            utxos: raw
                .get("utxos")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            total_available: positive("totalAvailable").unwrap_or(defaults.total_available),
        }
    }
}

/// Sender, recipient, amount and gas, as used by `createUnsignedTransaction`
/// and `sendTransactionWithKey`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub gas_price: f64,
    pub gas_limit: u64,
}

impl TransferRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn with_gas(mut self, gas_price: f64, gas_limit: u64) -> Self {
        self.gas_price = gas_price;
        self.gas_limit = gas_limit;
        self
    }
}

/// `sendTransaction` payload built from a node-signed transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTransaction {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub gas_price: Value,
    pub gas_limit: Value,
    pub timestamp: Value,
    pub nonce: Value,
    pub signature: String,
    pub public_key: String,
    pub transaction_id: String,
}

impl BroadcastTransaction {
    /// Map `{transaction: {Sender, Receiver, Amount, GasPrice, GasLimit,
    /// Timestamp, Nonce}, signature, senderPubKey, transactionId}`.
    pub fn from_signed(signed: &Value) -> Result<Self, ClientError> {
        let invalid = || ClientError::Validation("Invalid signed transaction format".into());
        let text = |v: Option<&Value>| {
            v.and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let tx = signed.get("transaction").filter(|t| t.is_object()).ok_or_else(invalid)?;
        let signature = text(signed.get("signature")).ok_or_else(invalid)?;
        let public_key = text(signed.get("senderPubKey")).ok_or_else(invalid)?;
        let transaction_id = text(signed.get("transactionId")).ok_or_else(invalid)?;

        let field = |key: &str| tx.get(key).cloned().unwrap_or(Value::Null);
        Ok(Self {
            from: text(tx.get("Sender")).unwrap_or_default(),
            to: text(tx.get("Receiver")).unwrap_or_default(),
            amount: tx.get("Amount").and_then(Value::as_f64).unwrap_or(0.0),
            gas_price: field("GasPrice"),
            gas_limit: field("GasLimit"),
            timestamp: field("Timestamp"),
            nonce: field("Nonce"),
            signature,
            public_key,
            transaction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fee_estimate_fills_defaults() {
        let fee = FeeEstimate::from_value(&json!({ "fee": 0.5, "gasPrice": 0 }));
        assert_eq!(fee.fee, 0.5);
        assert_eq!(fee.gas_price, DEFAULT_GAS_PRICE);
        assert_eq!(fee.gas_limit, DEFAULT_GAS_LIMIT);
        assert!(fee.utxos.is_empty());
        assert_eq!(fee.total_available, 0.0);

        assert_eq!(FeeEstimate::from_value(&Value::Null), FeeEstimate::default());
    }

    #[test]
    fn test_fee_estimate_keeps_utxos() {
        let fee = FeeEstimate::from_value(&json!({
            "fee": 0.002,
            "gasLimit": 30000,
            "utxos": [{ "txid": "a", "amount": 3 }],
            "totalAvailable": 3
        }));
        assert_eq!(fee.gas_limit, 30000);
        assert_eq!(fee.utxos.len(), 1);
        assert_eq!(fee.total_available, 3.0);
    }

    #[test]
    fn test_broadcast_from_signed() {
        let signed = json!({
            "transaction": {
                "Sender": "supA", "Receiver": "supB", "Amount": 2.5,
                "GasPrice": 20, "GasLimit": 21000, "Timestamp": 1700000000, "Nonce": 4
            },
            "signature": "sig",
            "senderPubKey": "pub",
            "transactionId": "tx1"
        });
        let tx = BroadcastTransaction::from_signed(&signed).unwrap();
        assert_eq!(tx.from, "supA");
        assert_eq!(tx.to, "supB");
        assert_eq!(tx.amount, 2.5);
        assert_eq!(tx.nonce, json!(4));

        let wire = serde_json::to_value(&tx).unwrap();
        assert_eq!(wire["publicKey"], "pub");
        assert_eq!(wire["transactionId"], "tx1");
        assert_eq!(wire["gasLimit"], 21000);
    }

    #[test]
    fn test_broadcast_rejects_incomplete_signature() {
        let signed = json!({ "transaction": {}, "signature": "sig", "transactionId": "tx1" });
        let err = BroadcastTransaction::from_signed(&signed).unwrap_err();
        assert_eq!(err.to_string(), "Invalid signed transaction format");
    }
}

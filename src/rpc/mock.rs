// ============================================================================
// MOCK NODE - demo stand-in when the blockchain node is unreachable
// ============================================================================
//
// Covers createWallet, importWallet, getBalance and getTransactionHistory.
// Nothing here is cryptographically meaningful.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use super::envelope::named_params;

pub const MOCK_METHODS: [&str; 4] = [
    "createWallet",
    "importWallet",
    "getBalance",
    "getTransactionHistory",
];

const MNEMONIC_WORDS: usize = 12;
const MAX_HISTORY_ENTRIES: u64 = 20;
const DEFAULT_HISTORY_LIMIT: u64 = 10;
const MOCK_HISTORY_TOTAL: u64 = 100;
const DAY_MS: i64 = 86_400_000;

const WORD_LIST: [&str; 100] = [
    "abandon", "ability", "able", "about", "above", "absent", "absorb", "abstract", "absurd", "abuse",
    "access", "accident", "account", "accuse", "achieve", "acid", "acoustic", "acquire", "across", "act",
    "action", "actor", "actress", "actual", "adapt", "add", "addict", "address", "adjust", "admit",
    "adult", "advance", "advice", "aerobic", "affair", "afford", "afraid", "again", "age", "agent",
    "agree", "ahead", "aim", "air", "airport", "aisle", "alarm", "album", "alcohol", "alert",
    "alien", "all", "alley", "allow", "almost", "alone", "alpha", "already", "also", "alter",
    "always", "amateur", "amazing", "among", "amount", "amused", "analyst", "anchor", "ancient", "anger",
    "angle", "angry", "animal", "ankle", "announce", "annual", "another", "answer", "antenna", "antique",
    "anxiety", "any", "apart", "apology", "appear", "apple", "approve", "april", "arch", "arctic",
    "area", "arena", "argue", "arm", "armed", "armor", "army", "around", "arrange", "arrest",
];

#[derive(Debug, Error, PartialEq)]
pub enum MockError {
    #[error("Mnemonic is required")]
    MissingMnemonic,

    #[error("Address is required")]
    MissingAddress,

    #[error("No mock implementation for {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockNode;

impl MockNode {
    pub fn supports(&self, method: &str) -> bool {
        MOCK_METHODS.contains(&method)
    }

    pub fn call(&self, method: &str, params: &Value) -> Result<Value, MockError> {
        let result = match method {
            "createWallet" => Ok(self.create_wallet()),
            "importWallet" => self.import_wallet(params),
            "getBalance" => self.get_balance(params),
            "getTransactionHistory" => self.get_transaction_history(params),
            other => Err(MockError::Unsupported(other.to_string())),
        }?;
        info!(method = %method, "🎭 Served by mock node");
        Ok(result)
    }

    fn create_wallet(&self) -> Value {
        let mut rng = rand::thread_rng();
        let id = uuid::Uuid::new_v4().to_string();
        let private_key = hex::encode(rng.gen::<[u8; 32]>());
        let public_key = hex::encode(rng.gen::<[u8; 32]>());
        let address = format!("supc{}{}", &id[..16], hex::encode(rng.gen::<[u8; 8]>()));

        let mnemonic = (0..MNEMONIC_WORDS)
            .filter_map(|_| WORD_LIST.choose(&mut rng).copied())
            .collect::<Vec<_>>()
            .join(" ");

        json!({
            "address": address,
            "privateKey": private_key,
            "publicKey": public_key,
            "mnemonic": mnemonic,
            "message": "Wallet created successfully",
        })
    }

    /// Deterministic: the same phrase always yields the same keys.
    fn import_wallet(&self, params: &Value) -> Result<Value, MockError> {
        let mnemonic = string_param(named_params(params), "mnemonic").ok_or(MockError::MissingMnemonic)?;

        let hash = sha256_hex(mnemonic);
        let address = format!("sup{}", &hash[..30]);
        let private_key = format!("0x{}", sha256_hex(&address));
        let public_key = format!("0x{}", sha256_hex(&private_key));

        Ok(json!({
            "address": address,
            "privateKey": private_key,
            "publicKey": public_key,
            "imported": true,
        }))
    }

    fn get_balance(&self, params: &Value) -> Result<Value, MockError> {
        let address = string_param(named_params(params), "address").ok_or(MockError::MissingAddress)?;
        Ok(json!(mock_balance(address)))
    }

    fn get_transaction_history(&self, params: &Value) -> Result<Value, MockError> {
        let named = named_params(params);
        let address = string_param(named, "address").ok_or(MockError::MissingAddress)?;
        let limit = u64_param(named, "limit")
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        let mut rng = rand::thread_rng();
        let now = chrono::Utc::now().timestamp_millis();

        let transactions: Vec<Value> = (0..limit.min(MAX_HISTORY_ENTRIES))
            .map(|i| {
                let counterpart = format!("sup{}", hex::encode(rng.gen::<[u8; 15]>()));
                let incoming = i % 2 == 0;
                let (from, to) = if incoming {
                    (counterpart, address.to_string())
                } else {
                    (address.to_string(), counterpart)
                };
                json!({
                    "transactionId": uuid::Uuid::new_v4().to_string(),
                    "from": from,
                    "to": to,
                    "amount": rng.gen_range(1..=100),
                    "timestamp": now - (i as i64) * DAY_MS,
                    "gasPrice": 20,
                    "gasLimit": 21000,
                    "nonce": i,
                    "status": "confirmed",
                    "confirmations": rng.gen_range(1..=50),
                })
            })
            .collect();

        Ok(json!({ "transactions": transactions, "total": MOCK_HISTORY_TOTAL }))
    }
}

/// Pseudo-balance in [100, 1099]: sum of the address's UTF-16 code units.
pub fn mock_balance(address: &str) -> u64 {
    let sum: u64 = address.encode_utf16().map(u64::from).sum();
    sum % 1000 + 100
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

fn string_param<'a>(params: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    params?.get(key)?.as_str().filter(|s| !s.is_empty())
}

fn u64_param(params: Option<&Map<String, Value>>, key: &str) -> Option<u64> {
    params?.get(key)?.as_u64()
}

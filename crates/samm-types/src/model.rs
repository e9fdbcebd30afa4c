//! Data model shared by the chain, wallet, and backend clients.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::Hex;

/// Call type carried in a message body, encoded on-chain as `uint8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Call,
    /// Defined by the module ABI; nothing in this SDK produces it.
    DelegateCall,
}

impl Operation {
    pub fn as_u8(self) -> u8 {
        match self {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

/// A proposed module transaction that members approve by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub to: Address,
    #[serde(with = "dec_u256")]
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    #[serde(with = "dec_u256")]
    pub nonce: U256,
    pub deadline: u64,
}

/// A hashed message ready for the email approval flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Base64 transport encoding of the message hash.
    pub msg_hash: String,
    pub calldata: MessageBody,
}

/// One allow-list entry of the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub to: Address,
    pub selector: Hex,
    #[serde(with = "dec_u256")]
    pub allowance: U256,
}

impl Restriction {
    /// Same target and selector; allowance is not compared.
    pub fn matches(&self, to: &Address, selector: &str) -> bool {
        self.to == *to && self.selector.eq_ignore_ascii_case(selector)
    }
}

/// Module record kept by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SammData {
    pub id: u64,
    pub root: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nonce: u64,
    pub chain_id: u64,
    pub threshold: u64,
    pub is_active: bool,
    pub safe_address: String,
    pub samm_address: String,
    pub expiration_period: u64,
}

/// Payload for registering a freshly deployed module with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendingSammData {
    pub root: String,
    pub chain_id: u64,
    pub threshold: u64,
    pub samm_address: String,
    pub safe_address: String,
    pub expiration_period: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub email: String,
    pub is_active: bool,
    #[serde(default)]
    pub samm_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbTransactionStatus {
    Pending,
    Confirmed,
    Success,
    Failed,
}

impl DbTransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DbTransactionStatus::Pending => "pending",
            DbTransactionStatus::Confirmed => "confirmed",
            DbTransactionStatus::Success => "success",
            DbTransactionStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for DbTransactionStatus {
    type Err = crate::SammError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(crate::SammError::Other(format!("unknown transaction status: {other}"))),
        }
    }
}

/// Transaction record kept by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbTransaction {
    pub id: u64,
    pub msg_hash: String,
    pub to: String,
    #[serde(with = "dec_u256")]
    pub value: U256,
    pub data: Hex,
    pub operation: String,
    pub nonce: u64,
    pub deadline: u64,
    pub samm_id: u64,
    pub status: DbTransactionStatus,
    pub created_at: String,
}

/// Email approval proof attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbTransactionApproval {
    pub id: u64,
    pub txn_id: u64,
    pub proof: String,
    pub commit: String,
    pub domain: String,
    pub pubkey_hash: String,
    pub is_2048_sig: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Serde helpers for U256 as a decimal string.
///
/// Deserialization also accepts JSON numbers and 0x-prefixed hex strings.
pub mod dec_u256 {
    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => crate::parse_u256(&s).map_err(D::Error::custom),
            serde_json::Value::Number(n) => U256::from_str_radix(&n.to_string(), 10)
                .map_err(|_| D::Error::custom(format!("not an unsigned integer: {n}"))),
            other => Err(D::Error::custom(format!("expected integer, got {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body_json_shape() {
        let body = MessageBody {
            to: "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap(),
            value: U256::from(10u64).pow(U256::from(18u64)),
            data: Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]),
            operation: Operation::Call,
            nonce: U256::from(7u64),
            deadline: 1_700_604_800,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["value"], "1000000000000000000");
        assert_eq!(json["operation"], "CALL");
        assert_eq!(json["nonce"], "7");
        assert_eq!(json["data"], "0xa9059cbb");

        let back: MessageBody = serde_json::from_value(json).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn test_operation_encoding() {
        assert_eq!(Operation::Call.as_u8(), 0);
        assert_eq!(Operation::DelegateCall.as_u8(), 1);
        assert_eq!(serde_json::to_string(&Operation::DelegateCall).unwrap(), "\"DELEGATECALL\"");
    }

    #[test]
    fn test_db_transaction_accepts_numeric_value() {
        let raw = serde_json::json!({
            "id": 3,
            "msg_hash": "q83v",
            "to": "0x1234567890abcdef1234567890abcdef12345678",
            "value": 0,
            "data": "0x",
            "operation": "CALL",
            "nonce": 1,
            "deadline": 1700000000,
            "samm_id": 9,
            "status": "pending",
            "created_at": "2024-01-01T00:00:00"
        });
        let tx: DbTransaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.status, DbTransactionStatus::Pending);
    }

    #[test]
    fn test_db_transaction_accepts_value_above_u64() {
        let raw = r#"{"id":4,"msg_hash":"q83v","to":"0x1234567890abcdef1234567890abcdef12345678",
            "value":100000000000000000000,"data":"0x","operation":"CALL","nonce":2,
            "deadline":1700000000,"samm_id":9,"status":"success","created_at":"2024-01-01T00:00:00"}"#;
        let tx: DbTransaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.value, U256::from(10u64).pow(U256::from(20u64)));

        let txs: Vec<DbTransaction> = serde_json::from_str(&format!("[{raw}]")).unwrap();
        assert_eq!(txs[0].value, tx.value);
    }

    #[test]
    fn test_dec_u256_rejects_negative_and_fractional_numbers() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[serde(with = "dec_u256")]
            #[allow(dead_code)]
            value: U256,
        }
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":-1}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"value":1.5}"#).is_err());
    }

    #[test]
    fn test_restriction_matches_ignores_selector_case() {
        let r = Restriction {
            to: "0x1234567890abcdef1234567890abcdef12345678".parse().unwrap(),
            selector: "0xA9059CBB".into(),
            allowance: U256::ZERO,
        };
        assert!(r.matches(&r.to, "0xa9059cbb"));
        assert!(!r.matches(&Address::ZERO, "0xa9059cbb"));
    }
}

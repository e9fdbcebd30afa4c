use alloy_primitives::{Address, FixedBytes, U256};
use thiserror::Error;

pub mod model;

pub use model::*;

/// 0x-prefixed hex string (e.g. "0x1234...").
pub type Hex = String;

/// Four-byte function selector.
pub type Selector = FixedBytes<4>;

/// Selector used by allow-list entries that permit a plain ether transfer.
pub const ETHER_TRANSFER_SELECTOR: &str = "0x00000000";

/// SAMM SDK error types.
#[derive(Debug, Error)]
pub enum SammError {
    #[error("Invalid {}address", label_prefix(.0))]
    InvalidAddress(Option<String>),

    #[error("invalid function selector: {0}")]
    InvalidSelector(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Failed to get nonce: {0}")]
    NonceFetch(String),

    #[error("New status is the same as current in the module")]
    DuplicateRestriction,

    #[error("No such restriction in a list")]
    RestrictionNotFound,

    #[error("New value is the same as current in the module")]
    NoOpChange,

    #[error("invalid value for {setting}: {value}")]
    InvalidSettingValue { setting: String, value: String },

    #[error("invalid ether amount: {0}")]
    InvalidEtherAmount(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Duplicate email addresses are not allowed")]
    DuplicateEmail,

    #[error("This email is already in the list: {0}")]
    EmailAlreadyPresent(String),

    #[error("Email is not in the current root")]
    EmailNotInRoot(String),

    #[error("Unauthorized: {0}")]
    UnauthorizedToken(String),

    #[error("{0}")]
    BackendRequestFailed(String),

    #[error("Transaction ID is required")]
    MissingTransactionId,

    #[error("No modules found")]
    NoModules,

    #[error("Module is not enabled")]
    ModuleNotEnabled,

    #[error("Signer is not an owner of the safe")]
    NotSafeOwner,

    #[error("Empty logs, tx probably failed or incorrect tx hash is passed")]
    EmptyLogs,

    #[error("No deploy log found")]
    DeployLogNotFound,

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl SammError {
    /// True for errors that mean the stored access token is missing or rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SammError::UnauthorizedToken(_))
    }
}

pub type Result<T> = std::result::Result<T, SammError>;

fn label_prefix(label: &Option<String>) -> String {
    label.as_deref().map(|l| format!("{l} ")).unwrap_or_default()
}

/// Validate an account address, returning the parsed value.
///
/// Accepts an optional `0x` prefix followed by 40 hex digits. Mixed-case input
/// must carry a valid EIP-55 checksum; all-lower and all-upper input is taken
/// as-is.
pub fn validate_address(value: &str, label: Option<&str>) -> Result<Address> {
    parse_address(value).ok_or_else(|| SammError::InvalidAddress(label.map(str::to_string)))
}

/// Check whether `value` is a well-formed account address.
pub fn is_address(value: &str) -> bool {
    parse_address(value).is_some()
}

fn parse_address(value: &str) -> Option<Address> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let address: Address = digits.parse().ok()?;

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None)[2..] != *digits {
        return None;
    }
    Some(address)
}

/// `0x` followed by exactly 8 hex digits.
pub fn is_valid_function_selector(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(digits) => digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parse a function selector string into its four bytes.
pub fn parse_selector(value: &str) -> Result<Selector> {
    if !is_valid_function_selector(value) {
        return Err(SammError::InvalidSelector(value.to_string()));
    }
    let bytes = hex_to_bytes(value)?;
    Ok(Selector::from_slice(&bytes))
}

/// Parse a decimal or 0x-prefixed hex string into a U256.
pub fn parse_u256(value: &str) -> Result<U256> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(value, 10),
    };
    parsed.map_err(|e| SammError::Other(format!("invalid integer {value:?}: {e}")))
}

/// Parse a hex string to a big-endian byte array.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(hex_str).map_err(|e| SammError::InvalidHex(e.to_string()))
}

/// Convert bytes to a 0x-prefixed hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address_accepts_valid_forms() {
        assert!(validate_address("0x1234567890abcdef1234567890abcdef12345678", None).is_ok());
        assert!(validate_address("1234567890abcdef1234567890abcdef12345678", None).is_ok());
        assert!(validate_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED", None).is_ok());
        // EIP-55 reference vector
        assert!(validate_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed", None).is_ok());
    }

    #[test]
    fn test_validate_address_rejects_bad_checksum() {
        let err = validate_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD", None).unwrap_err();
        assert!(matches!(err, SammError::InvalidAddress(None)));
    }

    #[test]
    fn test_validate_address_message() {
        let err = validate_address("invalid-address", None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid address");

        let err = validate_address("invalid-address", Some("SAMM")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid SAMM address");
        assert!(err.to_string().contains("SAMM address"));
    }

    #[test]
    fn test_validate_address_rejects_wrong_length() {
        assert!(!is_address("0x1234"));
        assert!(!is_address("0x1234567890abcdef1234567890abcdef1234567890"));
        assert!(!is_address("0xZZ34567890abcdef1234567890abcdef12345678"));
        assert!(!is_address(""));
    }

    #[test]
    fn test_function_selector() {
        assert!(is_valid_function_selector("0x12345678"));
        assert!(is_valid_function_selector("0xA9059CBB"));
        assert!(!is_valid_function_selector("0x123"));
        assert!(!is_valid_function_selector("not-hex"));
        assert!(!is_valid_function_selector("12345678"));
        assert!(!is_valid_function_selector("0x1234567g"));
        assert!(!is_valid_function_selector("0x123456789"));
    }

    #[test]
    fn test_parse_selector() {
        let selector = parse_selector("0xa9059cbb").unwrap();
        assert_eq!(selector.0, [0xa9, 0x05, 0x9c, 0xbb]);
        assert!(matches!(parse_selector("0x123"), Err(SammError::InvalidSelector(_))));
    }

    #[test]
    fn test_parse_u256() {
        assert_eq!(parse_u256("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_u256("0xff").unwrap(), U256::from(255u64));
        assert!(parse_u256("ten").is_err());
    }
}

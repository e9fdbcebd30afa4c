//! Ad-hoc contract calls and allow-list request forms.

use alloy_dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy_json_abi::{Function, StateMutability};
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use samm_types::{bytes_to_hex, validate_address, Result, SammError, ETHER_TRANSFER_SELECTOR};

const ETHER_DECIMALS: usize = 18;

/// Calldata built from a human-readable signature and string arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCall {
    pub signature: String,
    pub selector: String,
    pub data: Bytes,
    pub payable: bool,
}

/// Parse a function signature such as `transfer(address to, uint256 amount)`.
pub fn parse_function(signature: &str) -> Result<Function> {
    let signature = signature.trim();
    let signature = if signature.starts_with("function ") {
        signature.to_string()
    } else {
        format!("function {signature}")
    };
    Function::parse(&signature).map_err(|e| SammError::Abi(format!("invalid function signature: {e}")))
}

/// Encode a call to `signature` with `args` coerced to its parameter types.
pub fn encode_call(signature: &str, args: &[&str]) -> Result<EncodedCall> {
    let function = parse_function(signature)?;
    if function.inputs.len() != args.len() {
        return Err(SammError::Abi(format!(
            "{} expects {} arguments, got {}",
            function.name,
            function.inputs.len(),
            args.len()
        )));
    }

    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| SammError::Abi(format!("unsupported type {}: {e}", param.ty)))?;
            ty.coerce_str(arg.trim()).map_err(|e| {
                let name = if param.name.is_empty() { &param.ty } else { &param.name };
                SammError::Abi(format!("invalid value for {name}: {e}"))
            })
        })
        .collect::<Result<Vec<DynSolValue>>>()?;

    let data = function
        .abi_encode_input(&values)
        .map_err(|e| SammError::Abi(e.to_string()))?;

    Ok(EncodedCall {
        signature: function.signature(),
        selector: bytes_to_hex(function.selector().as_slice()),
        data: data.into(),
        payable: function.state_mutability == StateMutability::Payable,
    })
}

/// Parse a decimal ether amount (up to 18 fractional digits) into wei.
pub fn parse_ether(value: &str) -> Result<U256> {
    let invalid = || SammError::InvalidEtherAmount(value.to_string());
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) {
        return Err(invalid());
    }
    let fraction = match fraction {
        Some(f) if is_digits(f) && f.len() <= ETHER_DECIMALS => f,
        Some(_) => return Err(invalid()),
        None => "",
    };

    let wei = format!("{whole}{fraction:0<width$}", width = ETHER_DECIMALS);
    U256::from_str_radix(&wei, 10).map_err(|_| invalid())
}

/// Allow-list entry as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictionForm {
    /// Permit calls of one function, optionally with ether attached.
    FunctionCall {
        target: String,
        signature: String,
        ether_value: Option<String>,
    },
    /// Permit plain ether transfers up to `amount`.
    EtherTransfer { target: String, amount: String },
}

/// Arguments for `setTxAllowed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionRequest {
    pub to: Address,
    pub selector: String,
    pub amount: U256,
}

/// Resolve a form into the target, selector, and ether allowance.
pub fn restriction_request(form: &RestrictionForm) -> Result<RestrictionRequest> {
    match form {
        RestrictionForm::FunctionCall { target, signature, ether_value } => {
            let to = validate_address(target, Some("Contract"))?;
            let function = parse_function(signature)?;
            let amount = match ether_value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => parse_ether(v)?,
                _ => U256::ZERO,
            };
            Ok(RestrictionRequest {
                to,
                selector: bytes_to_hex(function.selector().as_slice()),
                amount,
            })
        }
        RestrictionForm::EtherTransfer { target, amount } => {
            let to = validate_address(target, Some("Contract"))?;
            Ok(RestrictionRequest {
                to,
                selector: ETHER_TRANSFER_SELECTOR.to_string(),
                amount: parse_ether(amount.trim())?,
            })
        }
    }
}

//! Typed module settings and their getter/setter encodings.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use samm_types::{parse_u256, validate_address, Result, SammError};

use crate::bindings::ISAMM;

/// A module parameter changed through a multisig-approved setter call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SammSetting {
    /// Relayer email address (`setRelayer(string)`).
    Relayer,
    /// Approvals required (`setThreshold(uint64)`).
    Threshold,
    /// DKIM registry contract (`setDKIMRegistry(address)`).
    DkimRegistry,
    /// Merkle root of member emails (`setMembersRoot(uint256)`).
    MembersRoot,
}

impl SammSetting {
    pub const ALL: [SammSetting; 4] = [
        SammSetting::Relayer,
        SammSetting::Threshold,
        SammSetting::DkimRegistry,
        SammSetting::MembersRoot,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SammSetting::Relayer => "Relayer",
            SammSetting::Threshold => "Threshold",
            SammSetting::DkimRegistry => "DKIMRegistry",
            SammSetting::MembersRoot => "MembersRoot",
        }
    }

    pub fn setter_name(&self) -> &'static str {
        match self {
            SammSetting::Relayer => "setRelayer",
            SammSetting::Threshold => "setThreshold",
            SammSetting::DkimRegistry => "setDKIMRegistry",
            SammSetting::MembersRoot => "setMembersRoot",
        }
    }

    /// Encode the setter call, parsing `value` into the argument type.
    pub fn setter_calldata(&self, value: &str) -> Result<Bytes> {
        let invalid = || SammError::InvalidSettingValue {
            setting: self.label().to_string(),
            value: value.to_string(),
        };

        let data = match self {
            SammSetting::Relayer => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                ISAMM::setRelayerCall { relayer: value.to_string() }.abi_encode()
            }
            SammSetting::Threshold => {
                let threshold: u64 = value.trim().parse().map_err(|_| invalid())?;
                if threshold == 0 {
                    return Err(invalid());
                }
                ISAMM::setThresholdCall { threshold }.abi_encode()
            }
            SammSetting::DkimRegistry => {
                let registry = validate_address(value, Some("DKIM registry")).map_err(|_| invalid())?;
                ISAMM::setDKIMRegistryCall { dkimRegistry: registry }.abi_encode()
            }
            SammSetting::MembersRoot => {
                let root: U256 = parse_u256(value).map_err(|_| invalid())?;
                ISAMM::setMembersRootCall { membersRoot: root }.abi_encode()
            }
        };
        Ok(data.into())
    }
}

impl fmt::Display for SammSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SammSetting {
    type Err = SammError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "relayer" => Ok(SammSetting::Relayer),
            "threshold" => Ok(SammSetting::Threshold),
            "dkimregistry" => Ok(SammSetting::DkimRegistry),
            "membersroot" => Ok(SammSetting::MembersRoot),
            _ => Err(SammError::Other(format!("unknown setting: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setting_names() {
        assert_eq!("threshold".parse::<SammSetting>().unwrap(), SammSetting::Threshold);
        assert_eq!("DKIMRegistry".parse::<SammSetting>().unwrap(), SammSetting::DkimRegistry);
        assert_eq!("members-root".parse::<SammSetting>().unwrap(), SammSetting::MembersRoot);
        assert!("owner".parse::<SammSetting>().is_err());
    }

    #[test]
    fn test_threshold_setter_encoding() {
        let data = SammSetting::Threshold.setter_calldata("6").unwrap();
        assert_eq!(&data[..4], &ISAMM::setThresholdCall::SELECTOR);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[35], 6);
    }

    #[test]
    fn test_setter_rejects_bad_values() {
        assert!(matches!(
            SammSetting::Threshold.setter_calldata("five"),
            Err(SammError::InvalidSettingValue { .. })
        ));
        assert!(SammSetting::Threshold.setter_calldata("0").is_err());
        assert!(SammSetting::DkimRegistry.setter_calldata("0x1234").is_err());
        assert!(SammSetting::Relayer.setter_calldata("  ").is_err());
    }

    #[test]
    fn test_relayer_setter_round_trips_string() {
        let data = SammSetting::Relayer.setter_calldata("relayer@example.com").unwrap();
        let decoded = ISAMM::setRelayerCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.relayer, "relayer@example.com");
    }
}

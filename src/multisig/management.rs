//! Owner management calls
//!
//! A transaction whose destination is the wallet itself carries one of these
//! in its payload. They are submitted, confirmed and executed like any other
//! transaction; there is no privileged path to the registry.

use crate::abi::{AbiError, CallDecoder, CallEncoder, Selector};
use crate::crypto::Address;
use crate::multisig::error::MultisigError;
use crate::multisig::events::WalletEvent;
use crate::multisig::registry::OwnerRegistry;
use serde::{Deserialize, Serialize};

pub const ADD_OWNER: &str = "addOwner(address)";
pub const REMOVE_OWNER: &str = "removeOwner(address)";
pub const REPLACE_OWNER: &str = "replaceOwner(address,address)";
pub const CHANGE_REQUIREMENT: &str = "changeRequirement(uint256)";

/// A registry mutation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ManagementCall {
    AddOwner(Address),
    RemoveOwner(Address),
    ReplaceOwner { old: Address, new: Address },
    ChangeThreshold(u64),
}

impl ManagementCall {
    /// Encode as transaction payload
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ManagementCall::AddOwner(owner) => CallEncoder::new(ADD_OWNER).address(owner).finish(),
            ManagementCall::RemoveOwner(owner) => {
                CallEncoder::new(REMOVE_OWNER).address(owner).finish()
            }
            ManagementCall::ReplaceOwner { old, new } => CallEncoder::new(REPLACE_OWNER)
                .address(old)
                .address(new)
                .finish(),
            ManagementCall::ChangeThreshold(threshold) => CallEncoder::new(CHANGE_REQUIREMENT)
                .uint(u128::from(*threshold))
                .finish(),
        }
    }

    /// Decode a payload addressed to the wallet
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let mut decoder = CallDecoder::new(data)?;
        let selector = decoder.selector();

        let call = if selector == Selector::of(ADD_OWNER) {
            ManagementCall::AddOwner(decoder.address()?)
        } else if selector == Selector::of(REMOVE_OWNER) {
            ManagementCall::RemoveOwner(decoder.address()?)
        } else if selector == Selector::of(REPLACE_OWNER) {
            let old = decoder.address()?;
            let new = decoder.address()?;
            ManagementCall::ReplaceOwner { old, new }
        } else if selector == Selector::of(CHANGE_REQUIREMENT) {
            let threshold = u64::try_from(decoder.uint()?).map_err(|_| AbiError::UintOverflow)?;
            ManagementCall::ChangeThreshold(threshold)
        } else {
            return Err(AbiError::UnknownSelector(selector));
        };

        decoder.finish()?;
        Ok(call)
    }

    /// Apply to the registry, returning the events to emit.
    ///
    /// On error the registry is unchanged.
    pub fn apply(&self, registry: &mut OwnerRegistry) -> Result<Vec<WalletEvent>, MultisigError> {
        let mut events = Vec::new();

        match self {
            ManagementCall::AddOwner(owner) => {
                registry.add_owner(*owner)?;
                events.push(WalletEvent::OwnerAddition { owner: *owner });
            }
            ManagementCall::RemoveOwner(owner) => {
                let clamped = registry.remove_owner(owner)?;
                events.push(WalletEvent::OwnerRemoval { owner: *owner });
                if let Some(threshold) = clamped {
                    events.push(WalletEvent::RequirementChange { threshold });
                }
            }
            ManagementCall::ReplaceOwner { old, new } => {
                registry.replace_owner(old, *new)?;
                events.push(WalletEvent::OwnerRemoval { owner: *old });
                events.push(WalletEvent::OwnerAddition { owner: *new });
            }
            ManagementCall::ChangeThreshold(threshold) => {
                let threshold = usize::try_from(*threshold).map_err(|_| {
                    MultisigError::InvalidConfiguration(format!(
                        "threshold {} out of range",
                        threshold
                    ))
                })?;
                registry.change_threshold(threshold)?;
                events.push(WalletEvent::RequirementChange { threshold });
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (OwnerRegistry, Vec<Address>) {
        let owners: Vec<Address> = ["a", "b", "c"]
            .iter()
            .map(|l| Address::from_label(l))
            .collect();
        (OwnerRegistry::new(owners.clone(), 3).unwrap(), owners)
    }

    #[test]
    fn test_decode_every_variant() {
        let a = Address::from_label("a");
        let b = Address::from_label("b");
        let calls = [
            ManagementCall::AddOwner(a),
            ManagementCall::RemoveOwner(a),
            ManagementCall::ReplaceOwner { old: a, new: b },
            ManagementCall::ChangeThreshold(3),
        ];

        for call in calls {
            assert_eq!(ManagementCall::decode(&call.encode()).unwrap(), call);
        }
    }

    #[test]
    fn test_decode_rejects_foreign_calls() {
        let data = CallEncoder::new("mint(address,uint256)")
            .address(&Address::from_label("a"))
            .uint(1)
            .finish();

        assert!(matches!(
            ManagementCall::decode(&data),
            Err(AbiError::UnknownSelector(_))
        ));
        assert!(matches!(
            ManagementCall::decode(&[]),
            Err(AbiError::TooShort { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_args() {
        let mut data = ManagementCall::ReplaceOwner {
            old: Address::from_label("a"),
            new: Address::from_label("b"),
        }
        .encode();
        data.truncate(data.len() - 1);

        assert!(matches!(
            ManagementCall::decode(&data),
            Err(AbiError::TooShort { .. })
        ));
    }

    #[test]
    fn test_apply_remove_emits_requirement_change() {
        let (mut registry, owners) = registry();

        let events = ManagementCall::RemoveOwner(owners[0])
            .apply(&mut registry)
            .unwrap();

        assert_eq!(
            events,
            vec![
                WalletEvent::OwnerRemoval { owner: owners[0] },
                WalletEvent::RequirementChange { threshold: 2 },
            ]
        );
        assert_eq!(registry.threshold(), 2);
    }

    #[test]
    fn test_apply_replace() {
        let (mut registry, owners) = registry();
        let newcomer = Address::from_label("newcomer");

        let events = ManagementCall::ReplaceOwner {
            old: owners[2],
            new: newcomer,
        }
        .apply(&mut registry)
        .unwrap();

        assert_eq!(events.len(), 2);
        assert!(registry.is_owner(&newcomer));
        assert!(!registry.is_owner(&owners[2]));
    }

    #[test]
    fn test_apply_invalid_threshold_leaves_registry() {
        let (mut registry, _) = registry();
        let before = registry.clone();

        let result = ManagementCall::ChangeThreshold(0).apply(&mut registry);

        assert!(matches!(result, Err(MultisigError::InvalidConfiguration(_))));
        assert_eq!(registry, before);
    }
}

//! Owner registry
//!
//! The committee of owners and the number of them required to approve a
//! transaction. Only the execution engine mutates it, and only while applying
//! an executed management transaction.

use crate::crypto::Address;
use crate::multisig::error::MultisigError;

/// Upper bound on committee size
pub const MAX_OWNER_COUNT: usize = 50;

/// Current owners and approval threshold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerRegistry {
    /// Owners in insertion order, no duplicates
    owners: Vec<Address>,
    /// Confirmations required (M in M-of-N)
    threshold: usize,
}

impl OwnerRegistry {
    /// Create a registry
    ///
    /// # Errors
    /// Returns error if the owner list is empty, too long, contains the null
    /// address or duplicates, or if the threshold is out of range
    pub fn new(owners: Vec<Address>, threshold: usize) -> Result<Self, MultisigError> {
        Self::validate_requirement(owners.len(), threshold)?;

        for (i, owner) in owners.iter().enumerate() {
            if owner.is_zero() {
                return Err(MultisigError::NullAddress);
            }
            if owners[..i].contains(owner) {
                return Err(MultisigError::DuplicateOwner(*owner));
            }
        }

        Ok(Self { owners, threshold })
    }

    fn validate_requirement(owner_count: usize, threshold: usize) -> Result<(), MultisigError> {
        if owner_count == 0 {
            return Err(MultisigError::InvalidConfiguration(
                "at least one owner is required".to_string(),
            ));
        }
        if owner_count > MAX_OWNER_COUNT {
            return Err(MultisigError::InvalidConfiguration(format!(
                "owner count {} exceeds maximum {}",
                owner_count, MAX_OWNER_COUNT
            )));
        }
        if threshold == 0 {
            return Err(MultisigError::InvalidConfiguration(
                "threshold must be at least 1".to_string(),
            ));
        }
        if threshold > owner_count {
            return Err(MultisigError::InvalidConfiguration(format!(
                "threshold {} exceeds owner count {}",
                threshold, owner_count
            )));
        }
        Ok(())
    }

    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    /// Append a new owner
    pub fn add_owner(&mut self, owner: Address) -> Result<(), MultisigError> {
        if owner.is_zero() {
            return Err(MultisigError::NullAddress);
        }
        if self.is_owner(&owner) {
            return Err(MultisigError::DuplicateOwner(owner));
        }
        Self::validate_requirement(self.owners.len() + 1, self.threshold)?;

        self.owners.push(owner);
        Ok(())
    }

    /// Remove an owner, clamping the threshold to the new owner count.
    ///
    /// Returns the new threshold when it had to be lowered.
    pub fn remove_owner(&mut self, owner: &Address) -> Result<Option<usize>, MultisigError> {
        let index = self
            .owners
            .iter()
            .position(|o| o == owner)
            .ok_or(MultisigError::OwnerNotFound(*owner))?;
        if self.owners.len() == 1 {
            return Err(MultisigError::InvalidConfiguration(
                "cannot remove the last owner".to_string(),
            ));
        }

        self.owners.remove(index);
        if self.threshold > self.owners.len() {
            self.threshold = self.owners.len();
            return Ok(Some(self.threshold));
        }
        Ok(None)
    }

    /// Swap `old` for `new`, keeping the slot position
    pub fn replace_owner(&mut self, old: &Address, new: Address) -> Result<(), MultisigError> {
        let index = self
            .owners
            .iter()
            .position(|o| o == old)
            .ok_or(MultisigError::OwnerNotFound(*old))?;
        if new.is_zero() {
            return Err(MultisigError::NullAddress);
        }
        if self.is_owner(&new) {
            return Err(MultisigError::DuplicateOwner(new));
        }

        self.owners[index] = new;
        Ok(())
    }

    /// Set a new threshold
    pub fn change_threshold(&mut self, threshold: usize) -> Result<(), MultisigError> {
        Self::validate_requirement(self.owners.len(), threshold)?;
        self.threshold = threshold;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(n: usize) -> Vec<Address> {
        (0..n)
            .map(|i| Address::from_label(&format!("owner-{}", i)))
            .collect()
    }

    #[test]
    fn test_registry_creation() {
        let registry = OwnerRegistry::new(owners(3), 2).unwrap();

        assert_eq!(registry.threshold(), 2);
        assert_eq!(registry.owner_count(), 3);
        assert_eq!(registry.description(), "2-of-3");
    }

    #[test]
    fn test_registry_validation() {
        // Zero threshold
        assert!(matches!(
            OwnerRegistry::new(owners(3), 0),
            Err(MultisigError::InvalidConfiguration(_))
        ));

        // Threshold > owners
        assert!(matches!(
            OwnerRegistry::new(owners(3), 4),
            Err(MultisigError::InvalidConfiguration(_))
        ));

        // No owners
        assert!(OwnerRegistry::new(vec![], 1).is_err());

        // Too many owners
        assert!(OwnerRegistry::new(owners(MAX_OWNER_COUNT + 1), 1).is_err());

        // Duplicate owners
        let same = Address::from_label("same");
        assert_eq!(
            OwnerRegistry::new(vec![same, same], 1),
            Err(MultisigError::DuplicateOwner(same))
        );

        // Null owner
        assert_eq!(
            OwnerRegistry::new(vec![Address::ZERO], 1),
            Err(MultisigError::NullAddress)
        );

        // A single owner is allowed
        assert!(OwnerRegistry::new(owners(1), 1).is_ok());
    }

    #[test]
    fn test_add_owner() {
        let mut registry = OwnerRegistry::new(owners(2), 2).unwrap();
        let newcomer = Address::from_label("newcomer");

        registry.add_owner(newcomer).unwrap();
        assert!(registry.is_owner(&newcomer));
        assert_eq!(registry.owners().last(), Some(&newcomer));
        assert_eq!(registry.threshold(), 2);

        assert_eq!(
            registry.add_owner(newcomer),
            Err(MultisigError::DuplicateOwner(newcomer))
        );
    }

    #[test]
    fn test_add_owner_respects_max() {
        let mut registry = OwnerRegistry::new(owners(MAX_OWNER_COUNT), 1).unwrap();
        let result = registry.add_owner(Address::from_label("one-too-many"));

        assert!(matches!(result, Err(MultisigError::InvalidConfiguration(_))));
        assert_eq!(registry.owner_count(), MAX_OWNER_COUNT);
    }

    #[test]
    fn test_remove_owner_clamps_threshold() {
        let list = owners(3);
        let mut registry = OwnerRegistry::new(list.clone(), 3).unwrap();

        assert_eq!(registry.remove_owner(&list[0]), Ok(Some(2)));
        assert_eq!(registry.threshold(), 2);
        assert!(!registry.is_owner(&list[0]));

        // Threshold already within bounds
        let mut registry = OwnerRegistry::new(list.clone(), 1).unwrap();
        assert_eq!(registry.remove_owner(&list[1]), Ok(None));
        assert_eq!(registry.threshold(), 1);
    }

    #[test]
    fn test_remove_owner_errors() {
        let list = owners(1);
        let mut registry = OwnerRegistry::new(list.clone(), 1).unwrap();
        let stranger = Address::from_label("stranger");

        assert_eq!(
            registry.remove_owner(&stranger),
            Err(MultisigError::OwnerNotFound(stranger))
        );
        assert!(matches!(
            registry.remove_owner(&list[0]),
            Err(MultisigError::InvalidConfiguration(_))
        ));
        assert_eq!(registry.owner_count(), 1);
    }

    #[test]
    fn test_replace_owner() {
        let list = owners(3);
        let mut registry = OwnerRegistry::new(list.clone(), 2).unwrap();
        let newcomer = Address::from_label("newcomer");

        registry.replace_owner(&list[1], newcomer).unwrap();
        assert_eq!(registry.owners(), &[list[0], newcomer, list[2]]);

        // Old owner gone
        assert_eq!(
            registry.replace_owner(&list[1], Address::from_label("x")),
            Err(MultisigError::OwnerNotFound(list[1]))
        );
        // New owner already present
        assert_eq!(
            registry.replace_owner(&list[0], list[2]),
            Err(MultisigError::DuplicateOwner(list[2]))
        );
    }

    #[test]
    fn test_change_threshold() {
        let mut registry = OwnerRegistry::new(owners(3), 2).unwrap();

        registry.change_threshold(3).unwrap();
        assert_eq!(registry.threshold(), 3);

        assert!(registry.change_threshold(0).is_err());
        assert!(registry.change_threshold(4).is_err());
        assert_eq!(registry.threshold(), 3);
    }
}

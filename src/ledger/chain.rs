//! In-memory ledger
//!
//! Holds native balances and deployed contracts, and runs calls between
//! them with all-or-nothing balance semantics.

use crate::crypto::Address;
use crate::ledger::{CallError, Ledger};
use std::any::Any;
use std::collections::{HashMap, HashSet};

/// Maximum nesting of contract calls
pub const MAX_CALL_DEPTH: usize = 1024;

/// Code deployed at an address
///
/// When a call returns `Err` the chain puts back native balances and the
/// state of every contract as it was before the call, including contracts
/// reached through nested calls that succeeded.
pub trait Contract: Send + ContractClone {
    /// Handle a call carrying `data` and `ctx.value()` native units
    fn handle(&mut self, ctx: &mut CallContext<'_>, data: &[u8]) -> Result<(), CallError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Boxed copy of a contract, used to roll back failed calls
pub trait ContractClone {
    fn clone_box(&self) -> Box<dyn Contract>;
}

impl<T: Contract + Clone + 'static> ContractClone for T {
    fn clone_box(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }
}

/// What a running contract can see and do
pub struct CallContext<'a> {
    chain: &'a mut Chain,
    caller: Address,
    this: Address,
    value: u128,
}

impl<'a> CallContext<'a> {
    /// Immediate caller
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Address of the running contract
    pub fn this(&self) -> Address {
        self.this
    }

    /// Native value attached to this call
    pub fn value(&self) -> u128 {
        self.value
    }

    /// Native balance of the running contract
    pub fn balance(&self) -> u128 {
        self.chain.balance_of(&self.this)
    }

    /// Send native value from the running contract
    pub fn send(&mut self, to: &Address, value: u128) -> Result<(), CallError> {
        let this = self.this;
        self.chain.transfer(&this, to, value)
    }

    /// Call another contract on behalf of the running contract
    pub fn call(&mut self, to: &Address, value: u128, data: &[u8]) -> Result<(), CallError> {
        let this = self.this;
        self.chain.call(&this, to, value, data)
    }

    /// The whole ledger, for code that drives other components from inside a call
    pub fn ledger(&mut self) -> &mut Chain {
        self.chain
    }
}

/// In-memory ledger with native balances and contracts
#[derive(Default)]
pub struct Chain {
    /// Native balances by account
    balances: HashMap<Address, u128>,
    /// Deployed contracts by address
    contracts: HashMap<Address, Box<dyn Contract>>,
    /// Contracts with a call in progress
    executing: HashSet<Address>,
    /// Deployment counter for address generation
    nonce: u64,
}

impl Chain {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit native value out of thin air (genesis allocation)
    pub fn fund(&mut self, account: &Address, amount: u128) -> Result<(), CallError> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(CallError::BalanceOverflow(*account))?;
        Ok(())
    }

    /// Native balance of an account
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Move native value without running code
    pub fn transfer(&mut self, from: &Address, to: &Address, value: u128) -> Result<(), CallError> {
        if value == 0 || from == to {
            return Ok(());
        }

        let have = self.balance_of(from);
        if have < value {
            return Err(CallError::InsufficientBalance { have, need: value });
        }
        let credited = self
            .balance_of(to)
            .checked_add(value)
            .ok_or(CallError::BalanceOverflow(*to))?;

        self.balances.insert(*from, have - value);
        self.balances.insert(*to, credited);
        Ok(())
    }

    /// Deploy a contract; its address is derived from the deployer and a nonce
    pub fn deploy<C: Contract + 'static>(&mut self, deployer: &Address, contract: C) -> Address {
        let address = self.generate_address(deployer);
        self.nonce += 1;

        self.contracts.insert(address, Box::new(contract));
        log::info!("Contract deployed at {}", address);
        address
    }

    /// Whether code is deployed at an address
    pub fn is_contract(&self, address: &Address) -> bool {
        self.contracts.contains_key(address) || self.executing.contains(address)
    }

    /// Borrow a deployed contract as its concrete type
    pub fn contract<C: Contract + 'static>(&self, address: &Address) -> Option<&C> {
        self.contracts
            .get(address)
            .and_then(|c| c.as_any().downcast_ref::<C>())
    }

    /// Mutably borrow a deployed contract as its concrete type
    pub fn contract_mut<C: Contract + 'static>(&mut self, address: &Address) -> Option<&mut C> {
        self.contracts
            .get_mut(address)
            .and_then(|c| c.as_any_mut().downcast_mut::<C>())
    }

    /// Get contract count
    pub fn contract_count(&self) -> usize {
        self.contracts.len() + self.executing.len()
    }

    /// Move value to `to` and run its code, if any
    pub fn call(
        &mut self,
        from: &Address,
        to: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), CallError> {
        if self.executing.len() >= MAX_CALL_DEPTH {
            return Err(CallError::CallDepthExceeded(
                self.executing.len(),
                MAX_CALL_DEPTH,
            ));
        }
        if self.executing.contains(to) {
            return Err(CallError::ReentrancyDetected(*to));
        }

        let balances = self.balances.clone();
        let contracts = self.snapshot_contracts();
        let result = self.call_inner(from, to, value, data);
        if result.is_err() {
            self.balances = balances;
            self.contracts = contracts;
        }
        result
    }

    fn call_inner(
        &mut self,
        from: &Address,
        to: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), CallError> {
        self.transfer(from, to, value)?;

        let Some(mut contract) = self.contracts.remove(to) else {
            // Plain account: only value moves, data is ignored
            return Ok(());
        };
        self.executing.insert(*to);

        let result = {
            let mut ctx = CallContext {
                chain: self,
                caller: *from,
                this: *to,
                value,
            };
            contract.handle(&mut ctx, data)
        };

        self.executing.remove(to);
        self.contracts.insert(*to, contract);

        if let Err(e) = &result {
            log::debug!("Call {} -> {} reverted: {}", from, to, e);
        }
        result
    }

    /// Copies of every contract not currently executing. Executing ones are
    /// restored by their own frame.
    fn snapshot_contracts(&self) -> HashMap<Address, Box<dyn Contract>> {
        self.contracts
            .iter()
            .map(|(address, contract)| (*address, contract.clone_box()))
            .collect()
    }

    /// Generate contract address from deployer and nonce
    fn generate_address(&self, deployer: &Address) -> Address {
        let mut seed = deployer.as_bytes().to_vec();
        seed.extend_from_slice(&self.nonce.to_be_bytes());
        Address::derive(&seed)
    }
}

impl Ledger for Chain {
    fn balance_of(&self, account: &Address) -> u128 {
        Chain::balance_of(self, account)
    }

    fn transfer(&mut self, from: &Address, to: &Address, value: u128) -> Result<(), CallError> {
        Chain::transfer(self, from, to, value)
    }

    fn call(
        &mut self,
        from: &Address,
        to: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), CallError> {
        Chain::call(self, from, to, value, data)
    }
}

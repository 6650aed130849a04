//! Ownable, mintable token contract
//!
//! Transfers start disabled and are switched on once by the owner. The owner
//! can also mint, hand over ownership and pay out native value the contract
//! holds.

use crate::abi::{AbiError, CallDecoder, CallEncoder, Selector};
use crate::crypto::Address;
use crate::ledger::{CallContext, CallError, Contract};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use thiserror::Error;

pub const MINT: &str = "mint(address,uint256)";
pub const TRANSFER: &str = "transfer(address,uint256)";
pub const ALLOW_TRANSFERS: &str = "allowTransfers()";
pub const TRANSFER_OWNERSHIP: &str = "transferOwnership(address)";
pub const SEND_ETHER: &str = "sendEther(address,uint256)";

/// Transfer history kept per token
const HISTORY_LIMIT: usize = 100;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Caller {0} is not the token owner")]
    NotOwner(Address),
    #[error("Transfers are not enabled yet")]
    TransfersDisabled,
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Total supply overflow")]
    SupplyOverflow,
    #[error("Null address not allowed")]
    NullAddress,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Malformed call: {0}")]
    Decode(#[from] AbiError),
    #[error("Payout failed: {0}")]
    Payout(#[from] CallError),
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(name: String, symbol: String, decimals: u8) -> Result<Self, TokenError> {
        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidName);
        }
        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidSymbol);
        }
        if decimals > 18 {
            return Err(TokenError::InvalidDecimals);
        }

        Ok(Self {
            name,
            symbol,
            decimals,
            created_at: Utc::now(),
        })
    }
}

/// Transfer event; mints come from the null address
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// A call the token understands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenCall {
    Mint { to: Address, amount: u128 },
    Transfer { to: Address, amount: u128 },
    AllowTransfers,
    TransferOwnership(Address),
    SendEther { to: Address, amount: u128 },
}

impl TokenCall {
    /// Encode as call data
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TokenCall::Mint { to, amount } => {
                CallEncoder::new(MINT).address(to).uint(*amount).finish()
            }
            TokenCall::Transfer { to, amount } => {
                CallEncoder::new(TRANSFER).address(to).uint(*amount).finish()
            }
            TokenCall::AllowTransfers => CallEncoder::new(ALLOW_TRANSFERS).finish(),
            TokenCall::TransferOwnership(owner) => {
                CallEncoder::new(TRANSFER_OWNERSHIP).address(owner).finish()
            }
            TokenCall::SendEther { to, amount } => {
                CallEncoder::new(SEND_ETHER).address(to).uint(*amount).finish()
            }
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let mut decoder = CallDecoder::new(data)?;
        let selector = decoder.selector();

        let call = if selector == Selector::of(MINT) {
            TokenCall::Mint {
                to: decoder.address()?,
                amount: decoder.uint()?,
            }
        } else if selector == Selector::of(TRANSFER) {
            TokenCall::Transfer {
                to: decoder.address()?,
                amount: decoder.uint()?,
            }
        } else if selector == Selector::of(ALLOW_TRANSFERS) {
            TokenCall::AllowTransfers
        } else if selector == Selector::of(TRANSFER_OWNERSHIP) {
            TokenCall::TransferOwnership(decoder.address()?)
        } else if selector == Selector::of(SEND_ETHER) {
            TokenCall::SendEther {
                to: decoder.address()?,
                amount: decoder.uint()?,
            }
        } else {
            return Err(AbiError::UnknownSelector(selector));
        };

        decoder.finish()?;
        Ok(call)
    }
}

/// An ownable, mintable fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagedToken {
    /// Token metadata
    pub metadata: TokenMetadata,
    /// Account allowed to administer the token
    owner: Address,
    /// Balances: address -> amount
    balances: HashMap<Address, u128>,
    total_supply: u128,
    transfers_enabled: bool,
    /// Transfer history (last 100)
    pub transfer_history: Vec<TransferEvent>,
}

impl ManagedToken {
    /// Create an empty token administered by `owner`
    pub fn new(metadata: TokenMetadata, owner: Address) -> Self {
        Self {
            metadata,
            owner,
            balances: HashMap::new(),
            total_supply: 0,
            transfers_enabled: false,
            transfer_history: Vec::new(),
        }
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    /// Get token name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Get token symbol
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn transfers_enabled(&self) -> bool {
        self.transfers_enabled
    }

    /// Get balance of an address
    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Get holder count
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    // =========================================================================
    // Mutating Functions
    // =========================================================================

    fn only_owner(&self, caller: &Address) -> Result<(), TokenError> {
        if *caller != self.owner {
            return Err(TokenError::NotOwner(*caller));
        }
        Ok(())
    }

    /// Create new tokens (owner only)
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        self.only_owner(caller)?;
        if to.is_zero() {
            return Err(TokenError::NullAddress);
        }
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        self.total_supply = total_supply;
        *self.balances.entry(*to).or_insert(0) += amount;

        log::info!("{} minted {} to {}", self.metadata.symbol, amount, to);
        Ok(self.record(Address::ZERO, *to, amount))
    }

    /// Transfer tokens; fails until the owner enables transfers
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        if !self.transfers_enabled {
            return Err(TokenError::TransfersDisabled);
        }
        if to.is_zero() {
            return Err(TokenError::NullAddress);
        }
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        // Update balances; sum is bounded by total supply
        *self.balances.entry(*from).or_insert(0) -= amount;
        *self.balances.entry(*to).or_insert(0) += amount;

        Ok(self.record(*from, *to, amount))
    }

    /// Enable transfers (owner only). Idempotent.
    pub fn allow_transfers(&mut self, caller: &Address) -> Result<(), TokenError> {
        self.only_owner(caller)?;
        if !self.transfers_enabled {
            log::info!("{} transfers enabled", self.metadata.symbol);
        }
        self.transfers_enabled = true;
        Ok(())
    }

    /// Hand the token to a new owner (owner only)
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: &Address,
    ) -> Result<(), TokenError> {
        self.only_owner(caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::NullAddress);
        }

        log::info!(
            "{} ownership moved from {} to {}",
            self.metadata.symbol,
            self.owner,
            new_owner
        );
        self.owner = *new_owner;
        Ok(())
    }

    fn record(&mut self, from: Address, to: Address, amount: u128) -> TransferEvent {
        let event = TransferEvent {
            from,
            to,
            amount,
            timestamp: Utc::now(),
        };

        // Store event (keep last 100)
        self.transfer_history.push(event.clone());
        if self.transfer_history.len() > HISTORY_LIMIT {
            self.transfer_history.remove(0);
        }
        event
    }

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, data: &[u8]) -> Result<(), TokenError> {
        // Plain payment
        if data.is_empty() {
            return Ok(());
        }

        let caller = ctx.caller();
        match TokenCall::decode(data)? {
            TokenCall::Mint { to, amount } => self.mint(&caller, &to, amount).map(|_| ()),
            TokenCall::Transfer { to, amount } => {
                self.transfer(&caller, &to, amount).map(|_| ())
            }
            TokenCall::AllowTransfers => self.allow_transfers(&caller),
            TokenCall::TransferOwnership(new_owner) => {
                self.transfer_ownership(&caller, &new_owner)
            }
            TokenCall::SendEther { to, amount } => {
                self.only_owner(&caller)?;
                ctx.send(&to, amount)?;
                Ok(())
            }
        }
    }
}

impl Contract for ManagedToken {
    fn handle(&mut self, ctx: &mut CallContext<'_>, data: &[u8]) -> Result<(), CallError> {
        self.dispatch(ctx, data)
            .map_err(|e| CallError::Reverted(e.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

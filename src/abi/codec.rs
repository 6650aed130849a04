//! Selector and word codec

use crate::crypto::{sha256, Address, ADDRESS_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Selector length in bytes
pub const SELECTOR_LEN: usize = 4;

/// Argument word length in bytes
pub const WORD_LEN: usize = 32;

/// Errors when decoding call data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Call data too short: need {needed} bytes, have {available}")]
    TooShort { needed: usize, available: usize },
    #[error("Address word has non-zero padding")]
    DirtyAddressPadding,
    #[error("Integer argument does not fit in 128 bits")]
    UintOverflow,
    #[error("Unexpected trailing bytes: {0}")]
    TrailingBytes(usize),
    #[error("Unknown selector: {0}")]
    UnknownSelector(Selector),
}

/// Function selector
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector([u8; SELECTOR_LEN]);

impl Selector {
    /// Selector for a function signature such as `addOwner(address)`
    pub fn of(signature: &str) -> Self {
        let digest = sha256(signature.as_bytes());
        let mut out = [0u8; SELECTOR_LEN];
        out.copy_from_slice(&digest[..SELECTOR_LEN]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; SELECTOR_LEN] {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({})", self)
    }
}

/// Builder for call data
#[derive(Debug, Clone)]
pub struct CallEncoder {
    buf: Vec<u8>,
}

impl CallEncoder {
    /// Start encoding a call to the given function signature
    pub fn new(signature: &str) -> Self {
        Self::with_selector(Selector::of(signature))
    }

    /// Start encoding with a precomputed selector
    pub fn with_selector(selector: Selector) -> Self {
        let mut buf = Vec::with_capacity(SELECTOR_LEN + 2 * WORD_LEN);
        buf.extend_from_slice(selector.as_bytes());
        Self { buf }
    }

    /// Append an address argument
    pub fn address(mut self, address: &Address) -> Self {
        self.buf.extend_from_slice(&[0u8; WORD_LEN - ADDRESS_LEN]);
        self.buf.extend_from_slice(address.as_bytes());
        self
    }

    /// Append an unsigned integer argument
    pub fn uint(mut self, value: u128) -> Self {
        self.buf.extend_from_slice(&[0u8; WORD_LEN - 16]);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Finish and return the encoded bytes
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential reader over call data
#[derive(Debug)]
pub struct CallDecoder<'a> {
    selector: Selector,
    args: &'a [u8],
    offset: usize,
}

impl<'a> CallDecoder<'a> {
    /// Split off the selector. Fails when the data is shorter than a selector.
    pub fn new(data: &'a [u8]) -> Result<Self, AbiError> {
        if data.len() < SELECTOR_LEN {
            return Err(AbiError::TooShort {
                needed: SELECTOR_LEN,
                available: data.len(),
            });
        }

        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(&data[..SELECTOR_LEN]);

        Ok(Self {
            selector: Selector(selector),
            args: &data[SELECTOR_LEN..],
            offset: 0,
        })
    }

    /// The selector of this call
    pub fn selector(&self) -> Selector {
        self.selector
    }

    fn word(&mut self) -> Result<&'a [u8], AbiError> {
        let end = self.offset + WORD_LEN;
        if end > self.args.len() {
            return Err(AbiError::TooShort {
                needed: SELECTOR_LEN + end,
                available: SELECTOR_LEN + self.args.len(),
            });
        }
        let word = &self.args[self.offset..end];
        self.offset = end;
        Ok(word)
    }

    /// Read the next argument as an address
    pub fn address(&mut self) -> Result<Address, AbiError> {
        let word = self.word()?;
        let (padding, body) = word.split_at(WORD_LEN - ADDRESS_LEN);
        if padding.iter().any(|b| *b != 0) {
            return Err(AbiError::DirtyAddressPadding);
        }

        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(body);
        Ok(Address::new(out))
    }

    /// Read the next argument as an unsigned integer
    pub fn uint(&mut self) -> Result<u128, AbiError> {
        let word = self.word()?;
        let (high, low) = word.split_at(WORD_LEN - 16);
        if high.iter().any(|b| *b != 0) {
            return Err(AbiError::UintOverflow);
        }

        let mut out = [0u8; 16];
        out.copy_from_slice(low);
        Ok(u128::from_be_bytes(out))
    }

    /// Require that every argument byte has been consumed
    pub fn finish(self) -> Result<(), AbiError> {
        let remaining = self.args.len() - self.offset;
        if remaining != 0 {
            return Err(AbiError::TrailingBytes(remaining));
        }
        Ok(())
    }
}

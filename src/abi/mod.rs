//! Call-data encoding
//!
//! Outbound calls carry an opaque payload. The engine itself only needs to
//! understand payloads addressed to the wallet (owner management), but the
//! same layout is used by the bundled token contract:
//!
//! - 4-byte selector: the first bytes of SHA-256 over the function signature
//! - one 32-byte big-endian word per argument (addresses left-padded)
//!
//! # Example
//!
//! ```rust
//! use multisig_custody::abi::{CallDecoder, CallEncoder, Selector};
//! use multisig_custody::crypto::Address;
//!
//! let to = Address::from_label("recipient");
//! let data = CallEncoder::new("transfer(address,uint256)")
//!     .address(&to)
//!     .uint(1_000_000)
//!     .finish();
//!
//! let mut decoder = CallDecoder::new(&data).unwrap();
//! assert_eq!(decoder.selector(), Selector::of("transfer(address,uint256)"));
//! assert_eq!(decoder.address().unwrap(), to);
//! assert_eq!(decoder.uint().unwrap(), 1_000_000);
//! decoder.finish().unwrap();
//! ```

pub mod codec;

pub use codec::{AbiError, CallDecoder, CallEncoder, Selector, SELECTOR_LEN, WORD_LEN};

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[cfg(all(not(feature = "secp256k1"), not(feature = "k256")))]
compile_error!("At least one of the `secp256k1` or `k256` features must be enabled.");

#[macro_use]
mod binary_encoding;

mod key_agg;
mod key_agg_cache;
mod key_sort;

pub mod errors;
pub mod tagged_hashes;

pub use binary_encoding::*;
pub use key_agg::*;
pub use key_agg_cache::*;
pub use key_sort::*;

/// Re-export of the inner types used to represent curve points and scalars.
pub use secp;

#[cfg(feature = "secp256k1")]
pub use secp256k1;

#[cfg(feature = "k256")]
pub use k256;

//! Domain-separated hash engines used by key aggregation.
//!
//! Each engine is a SHA256 state which has already absorbed two copies of the
//! SHA256 digest of a fixed tag string, as in
//! [BIP340](https://github.com/bitcoin/bips/blob/master/bip-0340.mediawiki)
//! tagged hashes. Cloning one of the statics below and writing payload data
//! into it is bit-for-bit the same as hashing `tag_digest || tag_digest || payload`,
//! but the 64-byte prefix block is only compressed once per process.
//!
//! ```
//! use musig_keyagg::tagged_hashes;
//! use sha2::Sha256;
//! use sha2::Digest as _;
//!
//! let pubkey_x = [0x11u8; 32];
//! let list_hash = tagged_hashes::KEYAGG_LIST_TAG_HASHER
//!     .clone()
//!     .chain_update(pubkey_x)
//!     .finalize();
//!
//! let expected = {
//!     let tag_digest = Sha256::digest("KeyAgg list");
//!     Sha256::new()
//!         .chain_update(&tag_digest)
//!         .chain_update(&tag_digest)
//!         .chain_update(pubkey_x)
//!         .finalize()
//! };
//!
//! assert_eq!(list_hash, expected);
//! ```

use sha2::Sha256;
use std::sync::LazyLock;

use sha2::Digest as _;

fn with_tag_hash_prefix(tag_hash: [u8; 32]) -> Sha256 {
    Sha256::new().chain_update(tag_hash).chain_update(tag_hash)
}

/// sha256(b"KeyAgg list")
const KEYAGG_LIST_TAG_DIGEST: [u8; 32] = [
    0x48, 0x1C, 0x97, 0x1C, 0x3C, 0x0B, 0x46, 0xD7, 0xF0, 0xB2, 0x75, 0xAE, 0x59, 0x8D, 0x4E, 0x2C,
    0x7E, 0xD7, 0x31, 0x9C, 0x59, 0x4A, 0x5C, 0x6E, 0xC7, 0x9E, 0xA0, 0xD4, 0x99, 0x02, 0x94, 0xF0,
];

/// sha256(b"KeyAgg coefficient")
const KEYAGG_COEFF_TAG_DIGEST: [u8; 32] = [
    0xBF, 0xC9, 0x04, 0x03, 0x4D, 0x1C, 0x88, 0xE8, 0xC8, 0x0E, 0x22, 0xE5, 0x3D, 0x24, 0x56, 0x6D,
    0x64, 0x82, 0x4E, 0xD6, 0x42, 0x72, 0x81, 0xC0, 0x91, 0x00, 0xF9, 0x4D, 0xCD, 0x52, 0xC9, 0x81,
];

/// sha256(b"TapTweak")
const TAPROOT_TWEAK_TAG_DIGEST: [u8; 32] = [
    0xe8, 0x0f, 0xe1, 0x63, 0x9c, 0x9c, 0xa0, 0x50, 0xe3, 0xaf, 0x1b, 0x39, 0xc1, 0x43, 0xc6, 0x3e,
    0x42, 0x9c, 0xbc, 0xeb, 0x15, 0xd9, 0x40, 0xfb, 0xb5, 0xc5, 0xa1, 0xf4, 0xaf, 0x57, 0xc5, 0xe9,
];

/// Commits to the ordered list of x-only public keys being aggregated.
///
/// ```notrust
/// sha256(b"KeyAgg list") || sha256(b"KeyAgg list")
/// ```
pub static KEYAGG_LIST_TAG_HASHER: LazyLock<Sha256> =
    LazyLock::new(|| with_tag_hash_prefix(KEYAGG_LIST_TAG_DIGEST));

/// Derives the per-key aggregation coefficient.
///
/// ```notrust
/// sha256(b"KeyAgg coefficient") || sha256(b"KeyAgg coefficient")
/// ```
pub static KEYAGG_COEFF_TAG_HASHER: LazyLock<Sha256> =
    LazyLock::new(|| with_tag_hash_prefix(KEYAGG_COEFF_TAG_DIGEST));

/// Derives BIP341 taproot output key tweaks.
///
/// ```notrust
/// sha256(b"TapTweak") || sha256(b"TapTweak")
/// ```
pub static TAPROOT_TWEAK_TAG_HASHER: LazyLock<Sha256> =
    LazyLock::new(|| with_tag_hash_prefix(TAPROOT_TWEAK_TAG_DIGEST));

use secp::{MaybeScalar, Point, G};

use crate::errors::{DecodeError, DecodeFailureReason, TweakError};
use crate::key_agg::compute_key_aggregation_coefficient;
use crate::{tagged_hashes, BinaryEncoding};

use sha2::Digest as _;

/// The size of a serialized [`KeyAggCache`] in bytes.
pub const KEYAGG_CACHE_SIZE: usize = 165;

const KEYAGG_CACHE_MAGIC: [u8; 4] = [0xf4, 0xad, 0xbb, 0xdf];

const STATUS_TWEAKED: u8 = 0b01;
const STATUS_ODD_INTERNAL_KEY: u8 = 0b10;

/// Records whether the aggregated key in a [`KeyAggState`] has been tweaked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TweakState {
    /// The aggregated key is exactly the weighted sum of the input keys.
    #[default]
    Untweaked,

    /// The aggregated key was tweaked once with [`KeyAggCache::tweak_add`].
    Tweaked {
        /// The scalar tweak `t` which was added.
        tweak: MaybeScalar,

        /// True if the aggregated key had an odd Y coordinate before the
        /// tweak was applied. Signers need this to negate their secret
        /// key shares correctly.
        internal_key_parity: bool,
    },
}

/// The result of aggregating an ordered list of x-only public keys.
///
/// This holds everything a signing session needs to reuse the aggregation
/// without hashing the key list again: the aggregated point, the marker of
/// the second distinct key, the key list commitment, and tweak bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAggState {
    /// The aggregated (and possibly tweaked) pubkey point `Q`.
    pub(crate) pubkey: Point,

    /// X coordinate of the first key in the list which differs from the
    /// first key. `None` if every key in the list is the same.
    pub(crate) second_pubkey_x: Option<[u8; 32]>,

    /// Hash committing to the ordered key list.
    pub(crate) pk_hash: [u8; 32],

    pub(crate) tweak: TweakState,
}

impl KeyAggState {
    /// Returns the aggregated public key, converted to a given type.
    ///
    /// If the cache has been tweaked, this is the tweaked key. Its Y
    /// coordinate may be odd; use [`aggregated_pubkey_xonly`][Self::aggregated_pubkey_xonly]
    /// for the BIP340 x-only form.
    pub fn aggregated_pubkey<T: From<Point>>(&self) -> T {
        T::from(self.pubkey)
    }

    /// Returns the 32-byte x-only serialization of the aggregated public key.
    pub fn aggregated_pubkey_xonly(&self) -> [u8; 32] {
        self.pubkey.serialize_xonly()
    }

    /// Returns the aggregated pubkey as it was before any tweak, i.e. the
    /// taproot internal key.
    pub fn aggregated_pubkey_untweaked<T: From<Point>>(&self) -> T {
        match self.tweak {
            TweakState::Untweaked => T::from(self.pubkey),
            TweakState::Tweaked {
                tweak,
                internal_key_parity,
            } => {
                let parity = subtle::Choice::from(u8::from(internal_key_parity));
                match (self.pubkey - tweak * G).not_inf() {
                    Ok(even_internal_key) => T::from(even_internal_key.negate_if(parity)),
                    // Checked on construction and on decoding.
                    Err(_) => unreachable!("tweaked key aggregation cache has infinite internal key"),
                }
            }
        }
    }

    /// Returns the X coordinate of the second distinct key in the list, or
    /// `None` if every key in the list was identical.
    pub fn second_pubkey_x(&self) -> Option<[u8; 32]> {
        self.second_pubkey_x
    }

    /// Returns the hash committing to the ordered list of aggregated keys.
    pub fn pk_hash(&self) -> &[u8; 32] {
        &self.pk_hash
    }

    /// Returns the tweak bookkeeping of this aggregation.
    pub fn tweak_state(&self) -> TweakState {
        self.tweak
    }

    /// Returns true if [`KeyAggCache::tweak_add`] has succeeded on this state.
    pub fn is_tweaked(&self) -> bool {
        matches!(self.tweak, TweakState::Tweaked { .. })
    }

    /// Returns the tweak which was applied, or `None` if untweaked.
    pub fn tweak(&self) -> Option<MaybeScalar> {
        match self.tweak {
            TweakState::Untweaked => None,
            TweakState::Tweaked { tweak, .. } => Some(tweak),
        }
    }

    /// Returns the parity of the aggregated key before tweaking, or `None`
    /// if untweaked. `true` means the Y coordinate was odd.
    pub fn internal_key_parity(&self) -> Option<bool> {
        match self.tweak {
            TweakState::Untweaked => None,
            TweakState::Tweaked {
                internal_key_parity,
                ..
            } => Some(internal_key_parity),
        }
    }

    /// Computes the key aggregation coefficient for the signer whose x-only
    /// public key is `pubkey_x`.
    ///
    /// This is the scalar each signer multiplies into their secret key when
    /// producing a partial signature. Two copies of the same key get the
    /// same coefficient.
    pub fn key_coefficient(&self, pubkey_x: &[u8; 32]) -> MaybeScalar {
        compute_key_aggregation_coefficient(&self.pk_hash, pubkey_x, self.second_pubkey_x.as_ref())
    }
}

/// A persistable cache of a MuSig key aggregation.
///
/// A cache is created by [`KeyAggCache::new`] (or [`pubkey_agg`][crate::pubkey_agg])
/// and may afterwards be tweaked exactly once with [`KeyAggCache::tweak_add`].
/// It has a fixed-size binary encoding of [`KEYAGG_CACHE_SIZE`] bytes which
/// can be handed between processes:
///
/// - `magic` (4 bytes): `f4 ad bb df`, marks the cache as initialized.
/// - `pubkey` (64 bytes): big-endian X and Y coordinates of the aggregated
///   (and possibly tweaked) key.
/// - `second_pubkey_x` (32 bytes): X coordinate of the second distinct key,
///   or zero if there is none.
/// - `pk_hash` (32 bytes): hash of the ordered key list.
/// - `status` (1 byte): bit 0 is set if tweaked, bit 1 is set if the internal
///   key had an odd Y coordinate.
/// - `tweak` (32 bytes): big-endian tweak scalar, zero if untweaked.
///
/// An [`Uninitialized`][KeyAggCache::Uninitialized] cache serializes to all
/// zeros, and decoding any buffer without the magic tag fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum KeyAggCache {
    /// No key aggregation has been performed.
    #[default]
    Uninitialized,

    /// A completed key aggregation.
    Valid(KeyAggState),
}

impl KeyAggCache {
    /// Aggregates an ordered list of x-only public keys into a new cache.
    /// See [`pubkey_agg`][crate::pubkey_agg].
    pub fn new<I, T>(pubkeys: I) -> Result<Self, crate::errors::KeyAggError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        crate::key_agg::aggregate_pubkeys(pubkeys).map(KeyAggCache::Valid)
    }

    /// Returns the aggregation state, or `None` if uninitialized.
    pub fn state(&self) -> Option<&KeyAggState> {
        match self {
            KeyAggCache::Uninitialized => None,
            KeyAggCache::Valid(state) => Some(state),
        }
    }

    /// Returns true if this cache holds a completed key aggregation.
    pub fn is_initialized(&self) -> bool {
        matches!(self, KeyAggCache::Valid(_))
    }

    /// Tweaks the aggregated key by adding `tweak32 * G` to it.
    ///
    /// The tweak is applied to the even-Y (x-only) aggregated key, so the
    /// result is the same as tweaking the x-only key returned by
    /// [`pubkey_agg`][crate::pubkey_agg] with a single-key BIP340 x-only
    /// tweak. The parity of the key before tweaking is recorded in the
    /// cache for later use by signers.
    ///
    /// A cache can only be tweaked once. Any tweak below the curve order
    /// is accepted, including zero. On error the cache is left untouched.
    ///
    /// Returns the full (not x-only) tweaked public key.
    pub fn tweak_add(&mut self, tweak32: &[u8; 32]) -> Result<Point, TweakError> {
        let state = match self {
            KeyAggCache::Uninitialized => return Err(TweakError::UninitializedCache),
            KeyAggCache::Valid(state) => state,
        };

        if state.is_tweaked() {
            return Err(TweakError::AlreadyTweaked);
        }

        let internal_key_parity = state.pubkey.has_odd_y();
        let tweak = MaybeScalar::try_from(tweak32.as_slice())?;

        // Q' = g*Q + t*G, where g = -1 if Q has an odd Y coordinate.
        let tweaked_pubkey = (state.pubkey.to_even_y() + tweak * G).not_inf()?;

        state.pubkey = tweaked_pubkey;
        state.tweak = TweakState::Tweaked {
            tweak,
            internal_key_parity,
        };
        Ok(tweaked_pubkey)
    }

    /// Tweaks the aggregated key to commit to a tree of taproot scripts
    /// with the given merkle root, as described in
    /// [BIP341](https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki).
    ///
    /// ```notrust
    /// t = int(hash_TapTweak(xonly(Q) || merkle_root))
    /// ```
    pub fn taproot_tweak_add(&mut self, merkle_root: &[u8; 32]) -> Result<Point, TweakError> {
        let state = self.state().ok_or(TweakError::UninitializedCache)?;
        let tweak: [u8; 32] = tagged_hashes::TAPROOT_TWEAK_TAG_HASHER
            .clone()
            .chain_update(state.pubkey.serialize_xonly())
            .chain_update(merkle_root)
            .finalize()
            .into();
        self.tweak_add(&tweak)
    }

    /// Tweaks the aggregated key so that it provably commits to no script
    /// path, as recommended by
    /// [BIP86](https://github.com/bitcoin/bips/blob/master/bip-0086.mediawiki).
    ///
    /// ```notrust
    /// t = int(hash_TapTweak(xonly(Q)))
    /// ```
    pub fn unspendable_taproot_tweak_add(&mut self) -> Result<Point, TweakError> {
        let state = self.state().ok_or(TweakError::UninitializedCache)?;
        let tweak: [u8; 32] = tagged_hashes::TAPROOT_TWEAK_TAG_HASHER
            .clone()
            .chain_update(state.pubkey.serialize_xonly())
            .finalize()
            .into();
        self.tweak_add(&tweak)
    }
}

impl From<KeyAggState> for KeyAggCache {
    fn from(state: KeyAggState) -> Self {
        KeyAggCache::Valid(state)
    }
}

/// Raw big-endian `x || y`, i.e. the uncompressed SEC1 encoding without
/// its `0x04` prefix.
fn save_point(point: &Point) -> [u8; 64] {
    let uncompressed = point.serialize_uncompressed();
    let mut raw = [0u8; 64];
    raw.copy_from_slice(&uncompressed[1..]);
    raw
}

fn load_point(raw: &[u8]) -> Result<Point, secp::errors::InvalidPointBytes> {
    let mut uncompressed = [0u8; 65];
    uncompressed[0] = 0x04;
    uncompressed[1..].copy_from_slice(raw);
    Point::from_slice(&uncompressed)
}

fn read_array_32(bytes: &[u8]) -> [u8; 32] {
    let mut array = [0u8; 32];
    array.copy_from_slice(bytes);
    array
}

impl BinaryEncoding for KeyAggCache {
    type Serialized = [u8; KEYAGG_CACHE_SIZE];

    /// Serializes the cache into the fixed layout described on [`KeyAggCache`].
    fn to_bytes(&self) -> Self::Serialized {
        let mut serialized = [0u8; KEYAGG_CACHE_SIZE];
        let state = match self {
            KeyAggCache::Uninitialized => return serialized,
            KeyAggCache::Valid(state) => state,
        };

        serialized[..4].copy_from_slice(&KEYAGG_CACHE_MAGIC);
        serialized[4..68].copy_from_slice(&save_point(&state.pubkey));
        if let Some(second_pubkey_x) = &state.second_pubkey_x {
            serialized[68..100].copy_from_slice(second_pubkey_x);
        }
        serialized[100..132].copy_from_slice(&state.pk_hash);

        if let TweakState::Tweaked {
            tweak,
            internal_key_parity,
        } = state.tweak
        {
            let parity_bit = if internal_key_parity {
                STATUS_ODD_INTERNAL_KEY
            } else {
                0
            };
            serialized[132] = STATUS_TWEAKED | parity_bit;
            serialized[133..].copy_from_slice(&tweak.serialize());
        }

        serialized
    }

    /// Deserializes a cache produced by [`KeyAggCache::to_bytes`]. Fails with
    /// [`DecodeFailureReason::UninitializedCache`] if the magic tag is missing.
    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError<Self>> {
        if bytes.len() != KEYAGG_CACHE_SIZE {
            return Err(DecodeError::bad_length(bytes.len()));
        }
        if bytes[..4] != KEYAGG_CACHE_MAGIC {
            return Err(DecodeError::new(DecodeFailureReason::UninitializedCache));
        }

        let pubkey = load_point(&bytes[4..68])?;

        let second_pubkey_x = Some(read_array_32(&bytes[68..100])).filter(|x| x != &[0; 32]);
        let pk_hash = read_array_32(&bytes[100..132]);

        let status = bytes[132];
        let tweak = if status & STATUS_TWEAKED != 0 {
            let tweak = MaybeScalar::try_from(&bytes[133..])?;
            if (pubkey - tweak * G).not_inf().is_err() {
                return Err(DecodeError::custom(
                    "tweaked key aggregation cache has an internal key at infinity",
                ));
            }
            TweakState::Tweaked {
                tweak,
                internal_key_parity: status & STATUS_ODD_INTERNAL_KEY != 0,
            }
        } else {
            TweakState::Untweaked
        };

        Ok(KeyAggCache::Valid(KeyAggState {
            pubkey,
            second_pubkey_x,
            pk_hash,
            tweak,
        }))
    }
}

impl_encoding_traits!(KeyAggCache, KEYAGG_CACHE_SIZE);
impl_hex_display!(KeyAggCache);

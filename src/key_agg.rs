use secp::{MaybePoint, MaybeScalar, Point};

use crate::errors::{KeyAggError, TweakError};
use crate::key_agg_cache::{KeyAggCache, KeyAggState, TweakState, KEYAGG_CACHE_SIZE};
use crate::{tagged_hashes, BinaryEncoding};

use sha2::Digest as _;

/// Aggregates an ordered list of x-only public keys into a single MuSig
/// aggregated key.
///
/// Each item of `pubkeys` must be the 32-byte BIP340 x-only serialization
/// of a public key. The order of `pubkeys` is significant: the same keys in
/// a different order produce a different aggregated key. Sort the keys with
/// [`sort_pubkeys`][crate::sort_pubkeys] first if the signers cannot agree
/// on an order some other way.
///
/// Returns the x-only aggregated key together with a [`KeyAggCache`] which
/// signers reuse for the rest of the protocol. Copies of the same key are
/// allowed, and every copy counts as a separate signer.
///
/// ```
/// let pubkeys = [
///     "F9308A019258C31049344F85F89D5229B531C845836F99B08601F113BCE036F9",
///     "DFF1D77F2A671C5F36183726DB2341BE58FEAE1DA2DECED843240F7B502BA659",
///     "3590A94E768F8E1815C2F24B4D80A8E3149316C3518CE7B7AD338368D038CA66",
/// ]
/// .map(|hex| base16ct::mixed::decode_vec(hex).unwrap());
///
/// let (agg_pubkey, cache) = musig_keyagg::pubkey_agg(&pubkeys).unwrap();
/// assert_eq!(
///     base16ct::upper::encode_string(&agg_pubkey),
///     "E5830140512195D74C8307E39637CBE5FB730EBEAB80EC514CF88A877CEEEE0B"
/// );
/// assert_eq!(cache.state().unwrap().aggregated_pubkey_xonly(), agg_pubkey);
/// ```
///
/// Fails if `pubkeys` is empty, if any key is not a valid x-only key, or
/// if the aggregated key is the point at infinity.
pub fn pubkey_agg<I, T>(pubkeys: I) -> Result<([u8; 32], KeyAggCache), KeyAggError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let state = aggregate_pubkeys(pubkeys)?;
    Ok((state.aggregated_pubkey_xonly(), KeyAggCache::Valid(state)))
}

/// Tweaks a serialized [`KeyAggCache`] in place. See [`KeyAggCache::tweak_add`].
///
/// Fails with [`TweakError::UninitializedCache`] if `cache` does not decode,
/// e.g. because its magic tag is wrong. The buffer is only written if the
/// tweak succeeds.
pub fn pubkey_tweak_add(
    cache: &mut [u8; KEYAGG_CACHE_SIZE],
    tweak32: &[u8; 32],
) -> Result<Point, TweakError> {
    let mut key_agg_cache =
        KeyAggCache::from_bytes(&cache[..]).map_err(|_| TweakError::UninitializedCache)?;
    let tweaked_pubkey = key_agg_cache.tweak_add(tweak32)?;
    *cache = key_agg_cache.to_bytes();
    Ok(tweaked_pubkey)
}

pub(crate) fn aggregate_pubkeys<I, T>(pubkeys: I) -> Result<KeyAggState, KeyAggError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let ordered_pubkeys = lift_pubkeys(pubkeys)?;
    let first_pubkey_x = match ordered_pubkeys.first() {
        Some(pubkey) => pubkey.serialize_xonly(),
        None => return Err(KeyAggError::EmptyKeyList),
    };

    // If all pubkeys are the same, there is no second key, and every key
    // gets a hashed coefficient.
    let second_pubkey_x: Option<[u8; 32]> = ordered_pubkeys[1..]
        .iter()
        .map(Point::serialize_xonly)
        .find(|pubkey_x| pubkey_x != &first_pubkey_x);

    let pk_hash = hash_pubkeys(&ordered_pubkeys);

    let weighted_pubkeys = ordered_pubkeys.iter().map(|&pubkey| {
        let key_coeff = compute_key_aggregation_coefficient(
            &pk_hash,
            &pubkey.serialize_xonly(),
            second_pubkey_x.as_ref(),
        );
        pubkey * key_coeff
    });

    let aggregated_pubkey = MaybePoint::sum(weighted_pubkeys).not_inf()?;

    Ok(KeyAggState {
        pubkey: aggregated_pubkey,
        second_pubkey_x,
        pk_hash,
        tweak: TweakState::Untweaked,
    })
}

/// Parses x-only pubkeys into even-Y points.
fn lift_pubkeys<I, T>(pubkeys: I) -> Result<Vec<Point>, KeyAggError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    pubkeys
        .into_iter()
        .enumerate()
        .map(|(index, pubkey)| {
            let invalid = KeyAggError::InvalidKeyEncoding { index };
            let pubkey_x = <&[u8; 32]>::try_from(pubkey.as_ref()).map_err(|_| invalid)?;
            Point::lift_x(*pubkey_x).map_err(|_| invalid)
        })
        .collect()
}

pub(crate) fn hash_pubkeys(ordered_pubkeys: &[Point]) -> [u8; 32] {
    let mut h = tagged_hashes::KEYAGG_LIST_TAG_HASHER.clone();
    for pubkey in ordered_pubkeys {
        h.update(pubkey.serialize_xonly());
    }
    h.finalize().into()
}

/// Computes `H_coeff(pk_hash || x)`, or one if `x` belongs to the second
/// distinct key in the list.
pub(crate) fn compute_key_aggregation_coefficient(
    pk_hash: &[u8; 32],
    pubkey_x: &[u8; 32],
    second_pubkey_x: Option<&[u8; 32]>,
) -> MaybeScalar {
    if second_pubkey_x == Some(pubkey_x) {
        return MaybeScalar::one();
    }

    let hash: [u8; 32] = tagged_hashes::KEYAGG_COEFF_TAG_HASHER
        .clone()
        .chain_update(pk_hash)
        .chain_update(pubkey_x)
        .finalize()
        .into();

    MaybeScalar::reduce_from(&hash)
}

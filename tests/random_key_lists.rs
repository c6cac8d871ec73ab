use rand::Rng;
use secp::{MaybePoint, MaybeScalar, Point, Scalar, G};

use musig_keyagg::{pubkey_agg, pubkey_tweak_add, BinaryEncoding, KeyAggCache, KEYAGG_CACHE_SIZE};

/// Random secret keys, each negated so that its public key has even Y, as
/// an x-only key would be lifted.
fn random_signers(rng: &mut rand::rngs::ThreadRng, n: usize) -> Vec<(Scalar, [u8; 32])> {
    (0..n)
        .map(|_| {
            let seckey = Scalar::random(rng);
            let pubkey = seckey.base_point_mul();
            (seckey.negate_if(pubkey.parity()), pubkey.serialize_xonly())
        })
        .collect()
}

fn random_sample_indexes<R: Rng>(
    rng: &mut R,
    iterations: usize,
    max_count: usize,
    index_ceil: usize,
) -> Vec<Vec<usize>> {
    (0..iterations)
        .map(|_| {
            let count = rng.random_range(1..max_count);
            (0..count)
                .map(|_| rng.random_range(0..index_ceil))
                .collect::<Vec<usize>>()
        })
        .collect()
}

/// The aggregated key must equal the aggregated secret key times G, where the
/// aggregated secret is the coefficient-weighted sum of the signers' secrets.
#[test]
fn aggregated_key_matches_weighted_secret_sum() {
    let mut rng = rand::rng();
    let signers = random_signers(&mut rng, 6);

    for indexes in random_sample_indexes(&mut rng, 10, 8, signers.len()) {
        let xonly_keys: Vec<[u8; 32]> = indexes.iter().map(|&i| signers[i].1).collect();
        let (agg_pubkey, cache) = pubkey_agg(&xonly_keys).unwrap();
        let state = cache.state().unwrap();

        let agg_seckey: MaybeScalar = indexes
            .iter()
            .map(|&i| state.key_coefficient(&signers[i].1) * signers[i].0)
            .fold(MaybeScalar::Zero, |acc, term| acc + term);

        let expected: Point = (agg_seckey * G).not_inf().unwrap();
        assert_eq!(state.aggregated_pubkey::<Point>(), expected);
        assert_eq!(agg_pubkey, expected.serialize_xonly());

        // The second key marker is the first key differing from the first.
        let expected_second = xonly_keys[1..].iter().find(|&x| x != &xonly_keys[0]).copied();
        assert_eq!(state.second_pubkey_x(), expected_second);
        if let Some(second) = expected_second {
            assert_eq!(state.key_coefficient(&second), MaybeScalar::one());
        }
    }
}

#[test]
fn cache_survives_process_boundary() {
    let mut rng = rand::rng();
    let signers = random_signers(&mut rng, 5);
    let xonly_keys: Vec<[u8; 32]> = signers.iter().map(|(_, x)| *x).collect();

    let (_, cache) = pubkey_agg(&xonly_keys).unwrap();
    let (_, recomputed) = pubkey_agg(&xonly_keys).unwrap();
    assert_eq!(cache.to_bytes(), recomputed.to_bytes());

    // Hand the cache over as hex, as a coordinator might.
    let hex = cache.to_string();
    let mut received: [u8; KEYAGG_CACHE_SIZE] = KeyAggCache::from_hex(&hex).unwrap().to_bytes();
    assert_eq!(received, cache.to_bytes());

    let tweak: [u8; 32] = rng.random();
    let tweak_scalar = match MaybeScalar::try_from(tweak.as_slice()) {
        Ok(t) => t,
        Err(_) => return, // tweak >= n; probability ~2^-128
    };

    let mut local = cache;
    let tweaked_local = local.tweak_add(&tweak).unwrap();
    let tweaked_remote = pubkey_tweak_add(&mut received, &tweak).unwrap();
    assert_eq!(tweaked_local, tweaked_remote);
    assert_eq!(local.to_bytes(), received);

    let internal: Point = cache.state().unwrap().aggregated_pubkey();
    assert_eq!(
        MaybePoint::Valid(tweaked_local),
        internal.to_even_y() + tweak_scalar * G
    );
    assert_eq!(
        local.state().unwrap().internal_key_parity(),
        Some(internal.has_odd_y())
    );
}

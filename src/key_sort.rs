/// Sorts x-only public keys in place by their 32-byte serialization, so
/// that any presentation order of the same multiset of keys aggregates to
/// the same key with [`pubkey_agg`][crate::pubkey_agg].
///
/// ```
/// let mut pubkeys = [[3u8; 32], [1u8; 32], [2u8; 32]];
/// musig_keyagg::sort_pubkeys(&mut pubkeys);
/// assert_eq!(pubkeys, [[1u8; 32], [2u8; 32], [3u8; 32]]);
/// ```
pub fn sort_pubkeys<T: AsRef<[u8]>>(pubkeys: &mut [T]) {
    pubkeys.sort_unstable_by(|a, b| a.as_ref().cmp(b.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubkey_agg;

    const X1: &str = "F9308A019258C31049344F85F89D5229B531C845836F99B08601F113BCE036F9";
    const X2: &str = "DFF1D77F2A671C5F36183726DB2341BE58FEAE1DA2DECED843240F7B502BA659";
    const X3: &str = "3590A94E768F8E1815C2F24B4D80A8E3149316C3518CE7B7AD338368D038CA66";

    #[test]
    fn sorted_keys_aggregate_independent_of_order() {
        let parse = |hex: &str| base16ct::mixed::decode_vec(hex).unwrap();

        let mut forward = vec![parse(X1), parse(X2), parse(X3), parse(X2)];
        let mut backward = vec![parse(X2), parse(X3), parse(X2), parse(X1)];

        let (unsorted_forward, _) = pubkey_agg(&forward).unwrap();
        let (unsorted_backward, _) = pubkey_agg(&backward).unwrap();
        assert_ne!(unsorted_forward, unsorted_backward);

        sort_pubkeys(&mut forward);
        sort_pubkeys(&mut backward);
        assert_eq!(forward, backward);
        assert_eq!(forward, vec![parse(X3), parse(X2), parse(X2), parse(X1)]);

        let (sorted_forward, _) = pubkey_agg(&forward).unwrap();
        let (sorted_backward, _) = pubkey_agg(&backward).unwrap();
        assert_eq!(sorted_forward, sorted_backward);
    }
}

//! Syndrome tables, codeword enumeration and the generic decoders.

use itertools::Itertools;
use tracing::debug;

use super::{BlockCode, MAX_ENUMERATION_DIMENSION};
use crate::bits;
use crate::error::{Error, Result};

fn check_enumerable(code: &BlockCode) -> Result<()> {
    if code.dimension() > MAX_ENUMERATION_DIMENSION {
        return Err(Error::UnsupportedParameter(format!(
            "codeword enumeration needs dimension <= {} (got {})",
            MAX_ENUMERATION_DIMENSION,
            code.dimension()
        )));
    }
    Ok(())
}

/// Visits every codeword in Gray-code order as `(message index, packed codeword)`.
fn for_each_codeword<F>(code: &BlockCode, mut visit: F)
where
    F: FnMut(u64, &[u64]),
{
    let rows: Vec<Vec<u64>> = code
        .generator_matrix()
        .rows()
        .into_iter()
        .map(|r| bits::to_limbs(&r.to_vec()))
        .collect();
    let mut word = vec![0u64; code.length().div_ceil(64)];
    visit(0, &word);
    for i in 1..(1u64 << code.dimension()) {
        // Gray code i ^ (i >> 1) flips exactly one message bit per step.
        let flipped = i.trailing_zeros() as usize;
        for (w, r) in word.iter_mut().zip(&rows[flipped]) {
            *w ^= r;
        }
        visit(i ^ (i >> 1), &word);
    }
}

fn limb_weight(limbs: &[u64]) -> usize {
    limbs.iter().map(|l| l.count_ones() as usize).sum()
}

pub(super) fn codewords(code: &BlockCode) -> Result<Vec<Vec<u8>>> {
    check_enumerable(code)?;
    let n = code.length();
    let mut words = vec![Vec::new(); 1usize << code.dimension()];
    for_each_codeword(code, |index, word| {
        words[index as usize] = bits::from_limbs(word, n);
    });
    Ok(words)
}

pub(super) fn weight_distribution(code: &BlockCode) -> Result<Vec<usize>> {
    check_enumerable(code)?;
    let mut distribution = vec![0usize; code.length() + 1];
    for_each_codeword(code, |_, word| distribution[limb_weight(word)] += 1);
    Ok(distribution)
}

pub(super) fn compute_minimum_distance(code: &BlockCode) -> usize {
    if code.dimension() <= MAX_ENUMERATION_DIMENSION {
        let mut best = usize::MAX;
        for_each_codeword(code, |index, word| {
            if index != 0 {
                best = best.min(limb_weight(word));
            }
        });
        debug!(distance = best, "computed minimum distance by enumeration");
        return best;
    }
    // d is the size of the smallest set of dependent parity-check columns,
    // and d <= n - k + 1.
    let columns: Vec<Vec<u64>> = code
        .check_matrix()
        .columns()
        .into_iter()
        .map(|c| bits::to_limbs(&c.to_vec()))
        .collect();
    let width = code.redundancy().div_ceil(64);
    for w in 1..=code.redundancy() + 1 {
        let found = (0..code.length()).combinations(w).any(|combo| {
            let mut acc = vec![0u64; width];
            for &j in &combo {
                for (a, c) in acc.iter_mut().zip(&columns[j]) {
                    *a ^= c;
                }
            }
            acc.iter().all(|&a| a == 0)
        });
        if found {
            debug!(distance = w, "computed minimum distance from check columns");
            return w;
        }
    }
    code.redundancy() + 1
}

/// Syndrome integers of each parity-check column.
fn column_syndromes(code: &BlockCode) -> Vec<usize> {
    code.check_matrix()
        .columns()
        .into_iter()
        .map(|c| bits::bits_to_int(&c.to_vec()) as usize)
        .collect()
}

pub(super) fn compute_coset_leaders(code: &BlockCode) -> Vec<Vec<usize>> {
    let n = code.length();
    let total = 1usize << code.redundancy();
    let columns = column_syndromes(code);
    let mut leaders: Vec<Option<Vec<usize>>> = vec![None; total];
    leaders[0] = Some(Vec::new());
    let mut filled = 1;
    // Patterns are visited by weight, then in lexicographic position order,
    // so each coset keeps the first minimum-weight pattern.
    'weights: for w in 1..=n {
        for combo in (0..n).combinations(w) {
            if filled == total {
                break 'weights;
            }
            let s = combo.iter().fold(0, |acc, &j| acc ^ columns[j]);
            if leaders[s].is_none() {
                leaders[s] = Some(combo);
                filled += 1;
            }
        }
    }
    debug!(
        length = n,
        redundancy = code.redundancy(),
        cosets = total,
        "built coset leader table"
    );
    leaders.into_iter().map(Option::unwrap_or_default).collect()
}

pub(super) fn syndrome_index(code: &BlockCode, received: &[u8]) -> Result<usize> {
    Ok(bits::bits_to_int(&code.syndrome(received)?) as usize)
}

pub(super) fn decode_syndrome_table(code: &BlockCode, received: &[u8]) -> Result<(Vec<u8>, bool)> {
    let leaders = code.leader_positions()?;
    let s = syndrome_index(code, received)?;
    let mut codeword = received.to_vec();
    for &p in &leaders[s] {
        codeword[p] ^= 1;
    }
    Ok((codeword, false))
}

pub(super) fn decode_exhaustive(code: &BlockCode, received: &[u8]) -> Result<(Vec<u8>, bool)> {
    check_enumerable(code)?;
    let target = bits::to_limbs(received);
    let mut best: Option<(usize, Vec<u64>)> = None;
    for_each_codeword(code, |_, word| {
        let distance: usize = word
            .iter()
            .zip(&target)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum();
        let better = match &best {
            None => true,
            Some((d, w)) => {
                distance < *d || (distance == *d && bits::cmp_limbs(word, w).is_lt())
            }
        };
        if better {
            best = Some((distance, word.to_vec()));
        }
    });
    let codeword = best.map_or_else(
        || vec![0u8; code.length()],
        |(_, w)| bits::from_limbs(&w, code.length()),
    );
    Ok((codeword, false))
}

#[cfg(test)]
mod tests {
    use super::super::tests::example_code;
    use super::*;
    use crate::block::DecodingMethod;

    #[test]
    fn test_coset_leaders_follow_syndrome_order() {
        let code = example_code();
        let leaders = code.coset_leaders().unwrap();
        assert_eq!(
            leaders,
            vec![
                vec![0, 0, 0, 0, 0, 0],
                vec![0, 0, 0, 1, 0, 0],
                vec![0, 0, 0, 0, 1, 0],
                vec![0, 0, 1, 0, 0, 0],
                vec![0, 0, 0, 0, 0, 1],
                vec![0, 1, 0, 0, 0, 0],
                vec![1, 0, 0, 0, 0, 0],
                vec![1, 0, 0, 1, 0, 0],
            ]
        );
    }

    #[test]
    fn test_exhaustive_tie_break() {
        let code = example_code();
        // 111111 is at distance 2 from 110110 (27), 101101 (45) and 011011 (54);
        // the smallest integer among the nearest wins.
        let decoded = code
            .decode_with(DecodingMethod::ExhaustiveSearch, &[1, 1, 1, 1, 1, 1])
            .unwrap();
        assert_eq!(decoded.codeword, vec![1, 1, 0, 1, 1, 0]);
        assert!(decoded.uncorrectable);
    }

    #[test]
    fn test_exhaustive_matches_table_distance() {
        let code = example_code();
        for r in 0..64u64 {
            let received = bits::int_to_bits(r, 6);
            let a = code.decode_with(DecodingMethod::SyndromeTable, &received).unwrap();
            let b = code.decode_with(DecodingMethod::ExhaustiveSearch, &received).unwrap();
            assert_eq!(a.corrections, b.corrections);
        }
    }

    #[test]
    fn test_distance_from_check_columns() {
        // Dimension 26 forces the column search path.
        let code = BlockCode::hamming(5, false).unwrap();
        assert_eq!(code.dimension(), 26);
        assert_eq!(compute_minimum_distance(&code), 3);
    }
}

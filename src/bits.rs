//! Conversions between bit vectors, integers and packed limbs.
//!
//! Bit vectors are LSB first: bit i has weight 2^i.

/// Packs a bit vector into little-endian 64-bit limbs.
pub(crate) fn to_limbs(bits: &[u8]) -> Vec<u64> {
    let mut limbs = vec![0u64; bits.len().div_ceil(64)];
    for (i, &b) in bits.iter().enumerate() {
        limbs[i / 64] |= u64::from(b & 1) << (i % 64);
    }
    limbs
}

/// Unpacks the first `len` bits of a limb vector.
pub(crate) fn from_limbs(limbs: &[u64], len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| limbs.get(i / 64).map_or(0, |&l| ((l >> (i % 64)) & 1) as u8))
        .collect()
}

/// Integer value of a bit vector of at most 64 bits.
pub(crate) fn bits_to_int(bits: &[u8]) -> u64 {
    debug_assert!(bits.len() <= 64, "{} bits do not fit in a u64", bits.len());
    bits.iter()
        .enumerate()
        .fold(0, |acc, (i, &b)| acc | (u64::from(b & 1) << i))
}

/// The `width` low bits of an integer.
pub(crate) fn int_to_bits(value: u64, width: usize) -> Vec<u8> {
    (0..width)
        .map(|i| if i < 64 { ((value >> i) & 1) as u8 } else { 0 })
        .collect()
}

pub(crate) fn weight(bits: &[u8]) -> usize {
    bits.iter().filter(|&&b| b == 1).count()
}

pub(crate) fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Compares two limb vectors as unsigned integers of equal width.
pub(crate) fn cmp_limbs(a: &[u64], b: &[u64]) -> std::cmp::Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

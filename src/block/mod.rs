//! Linear block codes over GF(2).
//!
//! [`BlockCode`] holds the generator and parity-check matrices of an (n, k)
//! code together with the family it was built as. The algebraic families
//! (Hamming, Golay, BCH, Reed-Muller, ...) are constructors on `BlockCode`
//! and share its syndrome machinery; each family brings its own decoder,
//! selected through [`DecodingMethod`].
//!
//! Available code families:
//!
//! - Hamming and extended Hamming codes, simplex codes
//! - Golay (23, 12) and extended (24, 12) codes
//! - Narrow-sense primitive BCH codes
//! - Cyclic codes from a generator or check polynomial
//! - Reed-Muller codes
//! - Repetition, single parity check and Cordaro-Wagner codes
//! - Lexicodes
//!
//! Expensive attributes (minimum distance, coset leaders, Meggitt tables) are
//! computed on first use and stored with the code.

use std::fmt;
use std::sync::{Arc, OnceLock};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bits;
use crate::error::{check_length, Error, Result};
use crate::galois::FiniteField;
use crate::matrix;
use crate::polynomial::BinaryPolynomial;

mod bch;
mod cordaro_wagner;
mod cyclic;
mod golay;
mod hamming;
mod lexicode;
mod reed_muller;
mod repetition;
mod single_parity_check;
mod slepian;
mod syndrome;
mod systematic;

pub use cyclic::CyclicStructure;
pub use slepian::SlepianArray;
pub use systematic::InformationSet;

/// Largest redundancy for which syndrome tables are built.
pub const MAX_TABLE_REDUNDANCY: usize = 24;

/// Largest dimension for which codewords are enumerated.
pub const MAX_ENUMERATION_DIMENSION: usize = 24;

/// Largest number of entries in the dense generator or parity-check matrix
/// of a family constructor. Allows Hamming, simplex and Reed-Muller codes up
/// to length 2^11.
pub const MAX_MATRIX_ENTRIES: usize = 1 << 22;

/// Rejects (n, k) codes whose k x n or (n - k) x n matrix exceeds
/// [`MAX_MATRIX_ENTRIES`].
pub(crate) fn check_matrix_size(length: usize, dimension: usize) -> Result<()> {
    let rows = dimension.max(length.saturating_sub(dimension));
    match rows.checked_mul(length) {
        Some(entries) if entries <= MAX_MATRIX_ENTRIES => Ok(()),
        _ => Err(Error::UnsupportedParameter(format!(
            "a ({}, {}) code needs matrices of more than {} entries",
            length, dimension, MAX_MATRIX_ENTRIES
        ))),
    }
}

/// The family a block code was constructed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeFamily {
    /// Code defined directly by a generator or parity-check matrix
    Generic,
    /// Systematic code defined by its parity submatrix
    Systematic,
    /// Cyclic code defined by a generator polynomial
    Cyclic,
    /// Hamming code with redundancy `mu`
    Hamming {
        /// Redundancy of the non-extended code
        mu: usize,
        /// Whether an overall parity bit is appended
        extended: bool,
    },
    /// Simplex code of dimension `kappa`
    Simplex {
        /// Dimension
        kappa: usize,
    },
    /// Binary Golay code
    Golay {
        /// Whether the (24, 12) extension is used
        extended: bool,
    },
    /// Narrow-sense primitive BCH code over GF(2^mu)
    Bch {
        /// Field degree
        mu: usize,
        /// Designed (Bose) distance
        delta: usize,
    },
    /// Reed-Muller code RM(rho, mu)
    ReedMuller {
        /// Order
        rho: usize,
        /// Number of variables
        mu: usize,
    },
    /// Repetition code
    Repetition,
    /// Single parity check code
    SingleParityCheck,
    /// Cordaro-Wagner (n, 2) code
    CordaroWagner,
    /// Lexicographic code of a given minimum distance
    Lexicode {
        /// Minimum distance the code was built for
        minimum_distance: usize,
    },
    /// Block view of a terminated convolutional code
    TerminatedConvolutional,
}

/// Decoding algorithms for block codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodingMethod {
    /// Coset-leader lookup indexed by syndrome
    SyndromeTable,
    /// Nearest codeword by enumerating all codewords
    ExhaustiveSearch,
    /// Berlekamp-Massey error locator with Chien search (BCH codes)
    Berlekamp,
    /// Meggitt error trapping (cyclic codes)
    Meggitt,
    /// Majority vote (repetition codes)
    Majority,
    /// Reed majority-logic decoding (Reed-Muller codes)
    ReedMajority,
    /// Maximum-likelihood trellis search (terminated convolutional codes)
    Viterbi,
}

/// Result of decoding one received word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Message estimate (k bits)
    pub message: Vec<u8>,
    /// Codeword estimate (n bits). Only guaranteed to be a codeword when the
    /// uncorrectable flag is clear.
    pub codeword: Vec<u8>,
    /// Set when the decoder failed or the estimate lies outside the
    /// correction radius of the received word
    pub uncorrectable: bool,
    /// Number of positions where the estimate differs from the received word
    pub corrections: usize,
    /// Correction capability the flag was judged against
    pub correctable: usize,
}

impl Decoded {
    /// Returns the message, or [`Error::Uncorrectable`] if the flag is set.
    pub fn into_message(self) -> Result<Vec<u8>> {
        if self.uncorrectable {
            return Err(Error::Uncorrectable {
                detected: self.corrections,
                correctable: self.correctable,
            });
        }
        Ok(self.message)
    }
}

/// Common interface of codes that map k-bit messages to n-bit words.
pub trait LinearCode: fmt::Debug + Send + Sync {
    /// Codeword length n.
    fn length(&self) -> usize;

    /// Message length k.
    fn dimension(&self) -> usize;

    /// Encodes a k-bit message.
    fn encode(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Decodes an n-bit word with the code's default method.
    fn decode(&self, received: &[u8]) -> Result<Decoded>;

    /// Decodes with a specific method.
    fn decode_with(&self, method: DecodingMethod, received: &[u8]) -> Result<Decoded> {
        let _ = received;
        Err(Error::UnsupportedParameter(format!(
            "decoding method {:?} is not supported by this code",
            method
        )))
    }

    /// Code rate k / n.
    fn rate(&self) -> f64 {
        self.dimension() as f64 / self.length() as f64
    }
}

/// An (n, k) binary linear block code.
#[derive(Clone)]
pub struct BlockCode {
    family: CodeFamily,
    generator: Array2<u8>,
    check: Array2<u8>,
    /// n x k right inverse of the generator, reading the information positions
    recovery: Array2<u8>,
    cyclic: Option<CyclicStructure>,
    field: Option<Arc<FiniteField>>,
    known_distance: Option<usize>,
    minimum_distance: OnceLock<usize>,
    coset_leaders: OnceLock<Vec<Vec<usize>>>,
    meggitt_table: OnceLock<std::collections::HashSet<BinaryPolynomial>>,
}

impl BlockCode {
    pub(crate) fn from_parts(
        family: CodeFamily,
        generator: Array2<u8>,
        check: Array2<u8>,
        recovery: Array2<u8>,
    ) -> Self {
        Self {
            family,
            generator,
            check,
            recovery,
            cyclic: None,
            field: None,
            known_distance: None,
            minimum_distance: OnceLock::new(),
            coset_leaders: OnceLock::new(),
            meggitt_table: OnceLock::new(),
        }
    }

    pub(crate) fn with_known_distance(mut self, distance: usize) -> Self {
        self.known_distance = Some(distance);
        self
    }

    pub(crate) fn with_family(mut self, family: CodeFamily) -> Self {
        self.family = family;
        self
    }

    /// Creates a code from a k x n generator matrix with independent rows.
    ///
    /// The parity-check matrix is derived as a basis of the null space.
    pub fn from_generator_matrix(generator: Array2<u8>) -> Result<Self> {
        validate_matrix(&generator, "generator")?;
        let check = matrix::null_space(&generator);
        let recovery = matrix::right_inverse(&generator)?;
        Ok(Self::from_parts(CodeFamily::Generic, generator, check, recovery))
    }

    /// Creates a code from an (n - k) x n parity-check matrix with independent rows.
    pub fn from_check_matrix(check: Array2<u8>) -> Result<Self> {
        validate_matrix(&check, "parity-check")?;
        let generator = matrix::null_space(&check);
        if generator.nrows() == 0 {
            return Err(Error::InvalidParameter(
                "parity-check matrix leaves a code of dimension 0".into(),
            ));
        }
        let recovery = matrix::right_inverse(&generator)?;
        Ok(Self::from_parts(CodeFamily::Generic, generator, check, recovery))
    }

    /// Codeword length n.
    pub fn length(&self) -> usize {
        self.generator.ncols()
    }

    /// Message length k.
    pub fn dimension(&self) -> usize {
        self.generator.nrows()
    }

    /// Redundancy n - k.
    pub fn redundancy(&self) -> usize {
        self.length() - self.dimension()
    }

    /// Code rate k / n.
    pub fn rate(&self) -> f64 {
        self.dimension() as f64 / self.length() as f64
    }

    /// The family the code was constructed as.
    pub fn family(&self) -> CodeFamily {
        self.family
    }

    /// The k x n generator matrix.
    pub fn generator_matrix(&self) -> &Array2<u8> {
        &self.generator
    }

    /// The (n - k) x n parity-check matrix.
    pub fn check_matrix(&self) -> &Array2<u8> {
        &self.check
    }

    /// Polynomial structure, for cyclic codes.
    pub fn cyclic_structure(&self) -> Option<&CyclicStructure> {
        self.cyclic.as_ref()
    }

    /// Extension field used by algebraic decoding, for BCH codes.
    pub fn field(&self) -> Option<&Arc<FiniteField>> {
        self.field.as_ref()
    }

    /// Minimum Hamming distance, computed on first use unless known in closed form.
    ///
    /// The computation enumerates codewords when k <= 24 and otherwise searches
    /// for the smallest dependent set of parity-check columns; both are
    /// exponential in the code size.
    pub fn minimum_distance(&self) -> usize {
        if let Some(d) = self.known_distance {
            return d;
        }
        *self
            .minimum_distance
            .get_or_init(|| syndrome::compute_minimum_distance(self))
    }

    /// Packing radius floor((d - 1) / 2).
    pub fn packing_radius(&self) -> usize {
        self.minimum_distance().saturating_sub(1) / 2
    }

    /// Radius used to judge decoding results: the designed capability for
    /// BCH codes, the packing radius otherwise.
    pub fn correction_capability(&self) -> usize {
        match self.family {
            CodeFamily::Bch { delta, .. } => (delta - 1) / 2,
            _ => self.packing_radius(),
        }
    }

    /// Encodes a k-bit message into an n-bit codeword.
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        check_length(message, self.dimension())?;
        Ok(match &self.cyclic {
            Some(cyclic) => cyclic.encode(message),
            None => matrix::vector_matrix(message, &self.generator),
        })
    }

    /// Recovers the message from an exact codeword.
    pub fn inverse_encode(&self, codeword: &[u8]) -> Result<Vec<u8>> {
        if !self.is_codeword(codeword)? {
            return Err(Error::InvalidParameter(
                "input is not a codeword of this code".into(),
            ));
        }
        Ok(self.extract_message(codeword))
    }

    /// Reads the message positions of any n-bit word.
    pub(crate) fn extract_message(&self, word: &[u8]) -> Vec<u8> {
        match &self.cyclic {
            Some(cyclic) => cyclic.message(word),
            None => matrix::vector_matrix(word, &self.recovery),
        }
    }

    /// Syndrome H r of an n-bit word.
    pub fn syndrome(&self, received: &[u8]) -> Result<Vec<u8>> {
        check_length(received, self.length())?;
        Ok(matrix::matrix_vector(&self.check, received))
    }

    /// Returns true if the word has zero syndrome.
    pub fn is_codeword(&self, word: &[u8]) -> Result<bool> {
        Ok(self.syndrome(word)?.iter().all(|&b| b == 0))
    }

    /// All 2^k codewords, indexed by message integer.
    pub fn codewords(&self) -> Result<Vec<Vec<u8>>> {
        syndrome::codewords(self)
    }

    /// Number of codewords of each weight 0..=n.
    pub fn weight_distribution(&self) -> Result<Vec<usize>> {
        syndrome::weight_distribution(self)
    }

    /// Minimum-weight representative of each coset, indexed by syndrome integer.
    pub fn coset_leaders(&self) -> Result<Vec<Vec<u8>>> {
        let n = self.length();
        Ok(self
            .leader_positions()?
            .iter()
            .map(|positions| {
                let mut word = vec![0u8; n];
                for &p in positions {
                    word[p] = 1;
                }
                word
            })
            .collect())
    }

    /// Number of coset leaders of each weight 0..=n.
    pub fn coset_leader_weight_distribution(&self) -> Result<Vec<usize>> {
        let mut distribution = vec![0usize; self.length() + 1];
        for positions in self.leader_positions()? {
            distribution[positions.len()] += 1;
        }
        Ok(distribution)
    }

    pub(crate) fn leader_positions(&self) -> Result<&Vec<Vec<usize>>> {
        if self.redundancy() > MAX_TABLE_REDUNDANCY {
            return Err(Error::UnsupportedParameter(format!(
                "syndrome tables need redundancy <= {} (got {})",
                MAX_TABLE_REDUNDANCY,
                self.redundancy()
            )));
        }
        Ok(self
            .coset_leaders
            .get_or_init(|| syndrome::compute_coset_leaders(self)))
    }

    /// The decoding method used by [`BlockCode::decode`].
    pub fn default_method(&self) -> DecodingMethod {
        match self.family {
            CodeFamily::Bch { .. } => DecodingMethod::Berlekamp,
            CodeFamily::Cyclic => DecodingMethod::Meggitt,
            CodeFamily::Repetition => DecodingMethod::Majority,
            CodeFamily::ReedMuller { .. } => DecodingMethod::ReedMajority,
            CodeFamily::Simplex { .. } | CodeFamily::CordaroWagner | CodeFamily::Lexicode { .. } => {
                DecodingMethod::ExhaustiveSearch
            }
            _ => DecodingMethod::SyndromeTable,
        }
    }

    /// Decodes an n-bit word with the family's default method.
    pub fn decode(&self, received: &[u8]) -> Result<Decoded> {
        self.decode_with(self.default_method(), received)
    }

    /// Decodes an n-bit word with the given method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Length`] or [`Error::InvalidParameter`] for malformed
    /// input, and [`Error::UnsupportedParameter`] when the method does not
    /// apply to this code or its tables would be too large.
    pub fn decode_with(&self, method: DecodingMethod, received: &[u8]) -> Result<Decoded> {
        check_length(received, self.length())?;
        let (codeword, failure) = match method {
            DecodingMethod::SyndromeTable => syndrome::decode_syndrome_table(self, received)?,
            DecodingMethod::ExhaustiveSearch => syndrome::decode_exhaustive(self, received)?,
            DecodingMethod::Berlekamp => bch::decode_berlekamp(self, received)?,
            DecodingMethod::Meggitt => cyclic::decode_meggitt(self, received)?,
            DecodingMethod::Majority => repetition::decode_majority(self, received)?,
            DecodingMethod::ReedMajority => reed_muller::decode_reed_majority(self, received)?,
            DecodingMethod::Viterbi => {
                return Err(Error::UnsupportedParameter(
                    "Viterbi decoding applies to convolutional codes only".into(),
                ))
            }
        };
        Ok(self.finish_decoding(received, codeword, failure))
    }

    fn finish_decoding(&self, received: &[u8], codeword: Vec<u8>, failure: bool) -> Decoded {
        let correctable = self.correction_capability();
        let corrections = bits::hamming_distance(received, &codeword);
        let is_codeword = matrix::matrix_vector(&self.check, &codeword)
            .iter()
            .all(|&b| b == 0);
        let uncorrectable = failure || !is_codeword || corrections > correctable;
        if uncorrectable {
            trace!(corrections, correctable, "block flagged uncorrectable");
        }
        Decoded {
            message: self.extract_message(&codeword),
            codeword,
            uncorrectable,
            corrections,
            correctable,
        }
    }

    pub(crate) fn unsupported(&self, method: DecodingMethod) -> Error {
        Error::UnsupportedParameter(format!(
            "decoding method {:?} does not apply to {:?} codes",
            method, self.family
        ))
    }
}

fn validate_matrix(m: &Array2<u8>, name: &str) -> Result<()> {
    if m.nrows() == 0 || m.ncols() == 0 {
        return Err(Error::InvalidParameter(format!("{} matrix is empty", name)));
    }
    if m.iter().any(|&b| b > 1) {
        return Err(Error::InvalidParameter(format!(
            "{} matrix entries must be 0 or 1",
            name
        )));
    }
    let rank = matrix::rank(m);
    if rank != m.nrows() {
        return Err(Error::InvalidParameter(format!(
            "{} matrix rows are linearly dependent (rank {} < {})",
            name,
            rank,
            m.nrows()
        )));
    }
    Ok(())
}

impl LinearCode for BlockCode {
    fn length(&self) -> usize {
        BlockCode::length(self)
    }

    fn dimension(&self) -> usize {
        BlockCode::dimension(self)
    }

    fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        BlockCode::encode(self, message)
    }

    fn decode(&self, received: &[u8]) -> Result<Decoded> {
        BlockCode::decode(self, received)
    }

    fn decode_with(&self, method: DecodingMethod, received: &[u8]) -> Result<Decoded> {
        BlockCode::decode_with(self, method, received)
    }
}

impl fmt::Debug for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockCode")
            .field("family", &self.family)
            .field("length", &self.length())
            .field("dimension", &self.dimension())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn example_code() -> BlockCode {
        let g = matrix::from_rows(&[
            vec![1, 0, 0, 0, 1, 1],
            vec![0, 1, 0, 1, 0, 1],
            vec![0, 0, 1, 1, 1, 0],
        ])
        .unwrap();
        BlockCode::from_generator_matrix(g).unwrap()
    }

    #[test]
    fn test_parameters() {
        let code = example_code();
        assert_eq!(code.length(), 6);
        assert_eq!(code.dimension(), 3);
        assert_eq!(code.redundancy(), 3);
        assert_eq!(code.minimum_distance(), 3);
        assert_eq!(code.packing_radius(), 1);
        assert!((code.rate() - 0.5).abs() < 1e-12);
        let product = matrix::multiply(code.generator_matrix(), &code.check_matrix().t().to_owned());
        assert!(matrix::is_zero(&product));
    }

    #[test]
    fn test_round_trip_all_messages() {
        let code = example_code();
        for m in 0..8u64 {
            let message = bits::int_to_bits(m, 3);
            let codeword = code.encode(&message).unwrap();
            assert!(code.is_codeword(&codeword).unwrap());
            assert_eq!(code.inverse_encode(&codeword).unwrap(), message);
            let decoded = code.decode(&codeword).unwrap();
            assert_eq!(decoded.message, message);
            assert!(!decoded.uncorrectable);
        }
    }

    #[test]
    fn test_single_errors_corrected() {
        let code = example_code();
        let codeword = code.encode(&[1, 0, 1]).unwrap();
        for i in 0..6 {
            let mut r = codeword.clone();
            r[i] ^= 1;
            for method in [DecodingMethod::SyndromeTable, DecodingMethod::ExhaustiveSearch] {
                let decoded = code.decode_with(method, &r).unwrap();
                assert_eq!(decoded.codeword, codeword);
                assert_eq!(decoded.corrections, 1);
                assert!(!decoded.uncorrectable);
            }
        }
    }

    #[test]
    fn test_weight_two_is_flagged() {
        let code = example_code();
        // 100100 is the leader of syndrome 7: weight 2 > t
        let decoded = code.decode(&[1, 0, 0, 1, 0, 0]).unwrap();
        assert!(decoded.uncorrectable);
        assert!(matches!(decoded.into_message(), Err(Error::Uncorrectable { detected: 2, correctable: 1 })));
    }

    #[test]
    fn test_invalid_inputs() {
        let code = example_code();
        assert!(matches!(code.encode(&[1, 0]), Err(Error::Length { expected: 3, actual: 2 })));
        assert!(matches!(code.encode(&[1, 0, 2]), Err(Error::InvalidParameter(_))));
        assert!(matches!(code.decode(&[0; 5]), Err(Error::Length { .. })));
        assert!(code.inverse_encode(&[1, 0, 0, 0, 0, 0]).is_err());
        assert!(matches!(
            code.decode_with(DecodingMethod::Berlekamp, &[0; 6]),
            Err(Error::UnsupportedParameter(_))
        ));
        let dependent = matrix::from_rows(&[vec![1, 1, 0], vec![1, 1, 0]]).unwrap();
        assert!(matches!(
            BlockCode::from_generator_matrix(dependent),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_from_check_matrix() {
        let code = example_code();
        let dual_built = BlockCode::from_check_matrix(code.check_matrix().clone()).unwrap();
        assert_eq!(dual_built.dimension(), 3);
        for m in 0..8u64 {
            let c = code.encode(&bits::int_to_bits(m, 3)).unwrap();
            assert!(dual_built.is_codeword(&c).unwrap());
        }
    }

    #[test]
    fn test_weight_distributions() {
        let code = example_code();
        assert_eq!(code.weight_distribution().unwrap(), vec![1, 0, 0, 4, 3, 0, 0]);
        assert_eq!(code.coset_leader_weight_distribution().unwrap(), vec![1, 6, 1, 0, 0, 0, 0]);
        assert_eq!(code.codewords().unwrap()[3], vec![1, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_default_methods() {
        assert_eq!(example_code().default_method(), DecodingMethod::SyndromeTable);
        assert_eq!(BlockCode::repetition(5).unwrap().default_method(), DecodingMethod::Majority);
        assert_eq!(BlockCode::bch(4, 5).unwrap().default_method(), DecodingMethod::Berlekamp);
        assert_eq!(BlockCode::reed_muller(1, 3).unwrap().default_method(), DecodingMethod::ReedMajority);
        assert_eq!(BlockCode::simplex(3).unwrap().default_method(), DecodingMethod::ExhaustiveSearch);
    }
}

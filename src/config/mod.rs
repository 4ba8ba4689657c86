//! Construction parameters for codes.
//!
//! A [`CodeConfig`] is the plain, serializable description of a code: either
//! a named family with its parameters, a generator polynomial, or explicit
//! matrices. Inconsistent combinations fail in [`CodeConfig::build`], they
//! are never silently resolved.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::{BlockCode, DecodingMethod};
use crate::coder::{BlockDecoder, BlockEncoder, Padding};
use crate::convolutional::{ConvolutionalCode, TerminatedConvolutionalCode, TerminationMode};
use crate::error::{Error, Result};
use crate::galois::FiniteField;
use crate::matrix;
use crate::polynomial::BinaryPolynomial;

/// A named code family and the parameters that select one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FamilyConfig {
    /// Hamming code with redundancy `mu`
    Hamming {
        /// Redundancy (at least 2)
        mu: usize,
        /// Append an overall parity bit
        #[serde(default)]
        extended: bool,
    },
    /// Simplex code of dimension `kappa`
    Simplex {
        /// Dimension
        kappa: usize,
    },
    /// Binary Golay code
    Golay {
        /// Use the (24, 12) extension
        #[serde(default)]
        extended: bool,
    },
    /// Narrow-sense primitive BCH code; honours `primitive_polynomial`
    Bch {
        /// Field degree
        mu: usize,
        /// Designed distance
        delta: usize,
    },
    /// Reed-Muller code RM(rho, mu)
    ReedMuller {
        /// Order
        rho: usize,
        /// Number of variables
        mu: usize,
    },
    /// Repetition code of the configured length
    Repetition,
    /// Single parity check code of the configured length
    SingleParityCheck,
    /// Cordaro-Wagner code of the configured length
    CordaroWagner,
    /// Lexicode of the configured length
    Lexicode {
        /// Minimum distance
        minimum_distance: usize,
    },
    /// Terminated convolutional code
    Convolutional {
        /// k x n generator polynomials, bit i the coefficient of D^i
        generators: Vec<Vec<u64>>,
        /// Per-input feedback polynomials for recursive codes
        #[serde(default)]
        feedback: Option<Vec<u64>>,
        /// Number of input blocks h
        num_blocks: usize,
        /// Termination at the block boundaries
        #[serde(default)]
        termination: TerminationMode,
    },
}

fn default_systematic() -> bool {
    true
}

/// Configuration of a block code and its block coders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Code length n
    #[serde(default)]
    length: Option<usize>,
    /// Code dimension k
    #[serde(default)]
    dimension: Option<usize>,
    /// k x n generator matrix rows
    #[serde(default)]
    generator_matrix: Option<Vec<Vec<u8>>>,
    /// (n - k) x n parity-check matrix rows
    #[serde(default)]
    parity_check_matrix: Option<Vec<Vec<u8>>>,
    /// Generator polynomial of a cyclic code, bit i the coefficient of x^i
    #[serde(default)]
    generator_polynomial: Option<u64>,
    /// Degree m of GF(2^m)
    #[serde(default)]
    field_degree: Option<usize>,
    /// Modulus of GF(2^m); the per-degree default when absent
    #[serde(default)]
    primitive_polynomial: Option<u64>,
    /// Named family
    #[serde(default)]
    family: Option<FamilyConfig>,
    /// Systematic encoding for cyclic codes
    #[serde(default = "default_systematic")]
    systematic: bool,
    /// Padding of the last chunk in the block encoder
    #[serde(default)]
    padding: Padding,
    /// Decoder override; the family default when absent
    #[serde(default)]
    decoding_method: Option<DecodingMethod>,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: None,
            dimension: None,
            generator_matrix: None,
            parity_check_matrix: None,
            generator_polynomial: None,
            field_degree: None,
            primitive_polynomial: None,
            family: None,
            systematic: true,
            padding: Padding::Zero,
            decoding_method: None,
        }
    }
}

impl CodeConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the code length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the code dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Sets the generator matrix.
    pub fn with_generator_matrix(mut self, rows: Vec<Vec<u8>>) -> Self {
        self.generator_matrix = Some(rows);
        self
    }

    /// Sets the parity-check matrix.
    pub fn with_parity_check_matrix(mut self, rows: Vec<Vec<u8>>) -> Self {
        self.parity_check_matrix = Some(rows);
        self
    }

    /// Sets the generator polynomial of a cyclic code.
    pub fn with_generator_polynomial(mut self, polynomial: u64) -> Self {
        self.generator_polynomial = Some(polynomial);
        self
    }

    /// Sets the field degree.
    pub fn with_field_degree(mut self, degree: usize) -> Self {
        self.field_degree = Some(degree);
        self
    }

    /// Sets the field modulus.
    pub fn with_primitive_polynomial(mut self, polynomial: u64) -> Self {
        self.primitive_polynomial = Some(polynomial);
        self
    }

    /// Selects a named family.
    pub fn with_family(mut self, family: FamilyConfig) -> Self {
        self.family = Some(family);
        self
    }

    /// Chooses systematic or non-systematic cyclic encoding.
    pub fn with_systematic(mut self, systematic: bool) -> Self {
        self.systematic = systematic;
        self
    }

    /// Sets the encoder padding policy.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// Overrides the decoding method.
    pub fn with_decoding_method(mut self, method: DecodingMethod) -> Self {
        self.decoding_method = Some(method);
        self
    }

    /// Configured length.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    /// Configured dimension.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Configured family.
    pub fn family(&self) -> Option<&FamilyConfig> {
        self.family.as_ref()
    }

    /// Whether cyclic codes are encoded systematically.
    pub fn systematic(&self) -> bool {
        self.systematic
    }

    /// Encoder padding policy.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Decoding method override.
    pub fn decoding_method(&self) -> Option<DecodingMethod> {
        self.decoding_method
    }

    /// Returns true if the family is a terminated convolutional code.
    pub fn is_convolutional(&self) -> bool {
        matches!(self.family, Some(FamilyConfig::Convolutional { .. }))
    }

    /// Checks the options that can be judged without building the code.
    pub fn validate(&self) -> Result<()> {
        if self.family.is_none()
            && self.generator_polynomial.is_none()
            && self.generator_matrix.is_none()
            && self.parity_check_matrix.is_none()
        {
            return Err(Error::InvalidParameter(
                "configuration names no family, generator polynomial or matrix".into(),
            ));
        }
        if self.length == Some(0) {
            return Err(Error::InvalidParameter("length must be positive".into()));
        }
        if let (Some(n), Some(k)) = (self.length, self.dimension) {
            if k > n {
                return Err(Error::InvalidParameter(format!(
                    "dimension {} exceeds length {}",
                    k, n
                )));
            }
        }
        if self.primitive_polynomial.is_some()
            && self.field_degree.is_none()
            && !matches!(self.family, Some(FamilyConfig::Bch { .. }))
        {
            return Err(Error::InvalidParameter(
                "primitive polynomial given without a field degree".into(),
            ));
        }
        if let Some(family) = &self.family {
            let field_options = self.field_degree.is_some() || self.primitive_polynomial.is_some();
            if field_options && !matches!(family, FamilyConfig::Bch { .. }) {
                return Err(Error::InvalidParameter(
                    "field degree and primitive polynomial only apply to BCH codes".into(),
                ));
            }
        }
        if let (Some(m), Some(FamilyConfig::Bch { mu, .. })) = (self.field_degree, &self.family) {
            if m != *mu {
                return Err(Error::InvalidParameter(format!(
                    "field degree {} disagrees with BCH degree {}",
                    m, mu
                )));
            }
        }
        if let Padding::Value(v) = self.padding {
            if v > 1 {
                return Err(Error::InvalidParameter(format!("padding bit {} is not 0 or 1", v)));
            }
        }
        Ok(())
    }

    fn required_length(&self, what: &str) -> Result<usize> {
        self.length
            .ok_or_else(|| Error::InvalidParameter(format!("{} requires a length", what)))
    }

    /// Builds the configured field, GF(2^m) with the given or default modulus.
    pub fn build_field(&self) -> Result<Arc<FiniteField>> {
        let degree = match (self.field_degree, &self.family) {
            (Some(m), _) => m,
            (None, Some(FamilyConfig::Bch { mu, .. })) => *mu,
            _ => return Err(Error::InvalidParameter("configuration has no field degree".into())),
        };
        FiniteField::shared(degree, self.primitive_polynomial.map(BinaryPolynomial::from_u64))
    }

    /// Builds the configured terminated convolutional code.
    pub fn build_terminated(&self) -> Result<TerminatedConvolutionalCode> {
        self.validate()?;
        match &self.family {
            Some(FamilyConfig::Convolutional {
                generators,
                feedback,
                num_blocks,
                termination,
            }) => {
                let code = match feedback {
                    Some(feedback) => ConvolutionalCode::with_feedback(generators.clone(), feedback.clone())?,
                    None => ConvolutionalCode::new(generators.clone())?,
                };
                let terminated = TerminatedConvolutionalCode::new(code, *num_blocks, *termination)?;
                self.check_dimensions(terminated.length(), terminated.dimension())?;
                Ok(terminated)
            }
            _ => Err(Error::InvalidParameter(
                "configuration does not describe a convolutional code".into(),
            )),
        }
    }

    /// Builds the configured block code.
    ///
    /// Precedence is family, then generator polynomial, then generator
    /// matrix, then parity-check matrix. Any other option that is present
    /// must agree with the result.
    pub fn build(&self) -> Result<BlockCode> {
        self.validate()?;
        let code = match &self.family {
            Some(family) => self.build_family(family)?,
            None => match self.generator_polynomial {
                Some(g) => {
                    let n = self.required_length("a generator polynomial")?;
                    BlockCode::cyclic(n, BinaryPolynomial::from_u64(g), self.systematic)?
                }
                None => self.build_from_matrices()?,
            },
        };
        self.check_dimensions(code.length(), code.dimension())?;
        self.check_generator_polynomial(&code)?;
        self.check_matrices(&code)?;
        debug!(
            length = code.length(),
            dimension = code.dimension(),
            family = ?code.family(),
            "built code from configuration"
        );
        Ok(code)
    }

    fn build_family(&self, family: &FamilyConfig) -> Result<BlockCode> {
        match family {
            FamilyConfig::Hamming { mu, extended } => BlockCode::hamming(*mu, *extended),
            FamilyConfig::Simplex { kappa } => BlockCode::simplex(*kappa),
            FamilyConfig::Golay { extended } => BlockCode::golay(*extended),
            FamilyConfig::Bch { delta, .. } => BlockCode::bch_with_field(self.build_field()?, *delta),
            FamilyConfig::ReedMuller { rho, mu } => BlockCode::reed_muller(*rho, *mu),
            FamilyConfig::Repetition => BlockCode::repetition(self.required_length("a repetition code")?),
            FamilyConfig::SingleParityCheck => {
                BlockCode::single_parity_check(self.required_length("a single parity check code")?)
            }
            FamilyConfig::CordaroWagner => {
                BlockCode::cordaro_wagner(self.required_length("a Cordaro-Wagner code")?)
            }
            FamilyConfig::Lexicode { minimum_distance } => {
                BlockCode::lexicode(self.required_length("a lexicode")?, *minimum_distance)
            }
            FamilyConfig::Convolutional { .. } => self.build_terminated()?.to_block_code(),
        }
    }

    fn build_from_matrices(&self) -> Result<BlockCode> {
        match (&self.generator_matrix, &self.parity_check_matrix) {
            (Some(g), _) => BlockCode::from_generator_matrix(matrix::from_rows(g)?),
            (None, Some(h)) => BlockCode::from_check_matrix(matrix::from_rows(h)?),
            (None, None) => Err(Error::InvalidParameter(
                "configuration names no family, generator polynomial or matrix".into(),
            )),
        }
    }

    fn check_dimensions(&self, length: usize, dimension: usize) -> Result<()> {
        if let Some(n) = self.length {
            if n != length {
                return Err(Error::InvalidParameter(format!(
                    "configured length {} but the code has length {}",
                    n, length
                )));
            }
        }
        if let Some(k) = self.dimension {
            if k != dimension {
                return Err(Error::InvalidParameter(format!(
                    "configured dimension {} but the code has dimension {}",
                    k, dimension
                )));
            }
        }
        Ok(())
    }

    /// A generator polynomial given alongside a family must be the family's own.
    fn check_generator_polynomial(&self, code: &BlockCode) -> Result<()> {
        let Some(g) = self.generator_polynomial else {
            return Ok(());
        };
        let g = BinaryPolynomial::from_u64(g);
        match code.cyclic_structure() {
            Some(structure) if structure.generator_polynomial() == &g => Ok(()),
            Some(structure) => Err(Error::InvalidParameter(format!(
                "generator polynomial {} disagrees with the code's {}",
                g,
                structure.generator_polynomial()
            ))),
            None => Err(Error::InvalidParameter(format!(
                "generator polynomial {} given for a {:?} code, which has no cyclic form",
                g,
                code.family()
            ))),
        }
    }

    /// Matrices given alongside a higher-precedence option must describe the same code.
    fn check_matrices(&self, code: &BlockCode) -> Result<()> {
        let n = code.length();
        if let Some(rows) = &self.generator_matrix {
            let g = matrix::from_rows(rows)?;
            if g.ncols() != n || matrix::rank(&g) != code.dimension() {
                return Err(Error::InvalidParameter(format!(
                    "generator matrix is {}x{} of rank {}, inconsistent with the ({}, {}) code",
                    g.nrows(),
                    g.ncols(),
                    matrix::rank(&g),
                    n,
                    code.dimension()
                )));
            }
            if !matrix::is_zero(&matrix::multiply(&g, &code.check_matrix().t().to_owned())) {
                return Err(Error::InvalidParameter(
                    "generator matrix rows are not codewords of the configured code".into(),
                ));
            }
        }
        if let Some(rows) = &self.parity_check_matrix {
            let h = matrix::from_rows(rows)?;
            if h.ncols() != n || matrix::rank(&h) != code.redundancy() {
                return Err(Error::InvalidParameter(format!(
                    "parity-check matrix is {}x{} of rank {}, inconsistent with the ({}, {}) code",
                    h.nrows(),
                    h.ncols(),
                    matrix::rank(&h),
                    n,
                    code.dimension()
                )));
            }
            if !matrix::is_zero(&matrix::multiply(code.generator_matrix(), &h.t().to_owned())) {
                return Err(Error::InvalidParameter(
                    "parity-check matrix does not annihilate the generator matrix".into(),
                ));
            }
        }
        Ok(())
    }

    /// Block encoder for the built code with the configured padding.
    pub fn block_encoder(&self) -> Result<BlockEncoder<BlockCode>> {
        Ok(BlockEncoder::new(Arc::new(self.build()?)).with_padding(self.padding))
    }

    /// Block decoder for the built code with the configured method.
    pub fn block_decoder(&self) -> Result<BlockDecoder<BlockCode>> {
        let decoder = BlockDecoder::new(Arc::new(self.build()?));
        Ok(match self.decoding_method {
            Some(method) => decoder.with_method(method),
            None => decoder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::CodeFamily;

    #[test]
    fn test_default_config() {
        let config = CodeConfig::default();
        assert!(config.systematic());
        assert_eq!(config.padding(), Padding::Zero);
        assert!(config.decoding_method().is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CodeConfig::new()
            .with_family(FamilyConfig::Hamming { mu: 3, extended: false })
            .with_length(7)
            .with_dimension(4)
            .with_padding(Padding::Reject)
            .with_decoding_method(DecodingMethod::ExhaustiveSearch);
        let code = config.build().unwrap();
        assert_eq!(code.family(), CodeFamily::Hamming { mu: 3, extended: false });
        assert_eq!(config.length(), Some(7));

        let decoder = config.block_decoder().unwrap();
        let decoded = decoder.decode(&[1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(decoded.message, vec![0, 0, 0, 0]);
        assert!(config.block_encoder().unwrap().encode(&[1, 0, 1]).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "length": 15,
            "family": { "type": "bch", "mu": 4, "delta": 5 },
            "padding": "reject"
        }"#;
        let config = CodeConfig::from_json(json).unwrap();
        assert_eq!(config.family(), Some(&FamilyConfig::Bch { mu: 4, delta: 5 }));
        assert_eq!(config.padding(), Padding::Reject);
        let code = config.build().unwrap();
        assert_eq!(code.dimension(), 7);
        let again = CodeConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(again, config);
        assert!(matches!(CodeConfig::from_json("{ not json"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_generator_polynomial_and_matrices() {
        let cyclic = CodeConfig::new().with_generator_polynomial(0b1011).with_length(7);
        let code = cyclic.build().unwrap();
        assert_eq!(code.dimension(), 4);
        assert!(CodeConfig::new().with_generator_polynomial(0b1011).build().is_err());
        // 1 + x + x^2 does not divide x^7 + 1
        assert!(CodeConfig::new().with_generator_polynomial(0b111).with_length(7).build().is_err());

        let g = crate::matrix::to_rows(code.generator_matrix());
        let h = crate::matrix::to_rows(code.check_matrix());
        let both = CodeConfig::new()
            .with_generator_matrix(g.clone())
            .with_parity_check_matrix(h.clone());
        assert_eq!(both.build().unwrap().dimension(), 4);
        let from_h = CodeConfig::new().with_parity_check_matrix(h).build().unwrap();
        assert_eq!(from_h.dimension(), 4);

        let mut wrong_h = crate::matrix::to_rows(code.check_matrix());
        wrong_h[0][0] ^= 1;
        let mismatched = CodeConfig::new()
            .with_generator_matrix(g)
            .with_parity_check_matrix(wrong_h);
        assert!(mismatched.build().is_err());
    }

    #[test]
    fn test_inconsistent_options() {
        let wrong_length = CodeConfig::new()
            .with_family(FamilyConfig::Golay { extended: true })
            .with_length(23);
        assert!(matches!(wrong_length.build(), Err(Error::InvalidParameter(_))));
        let too_big = CodeConfig::new().with_length(3).with_dimension(4).with_family(FamilyConfig::Repetition);
        assert!(too_big.validate().is_err());
        assert!(CodeConfig::new().with_family(FamilyConfig::Repetition).build().is_err());
        let field_mismatch = CodeConfig::new()
            .with_family(FamilyConfig::Bch { mu: 4, delta: 3 })
            .with_field_degree(5);
        assert!(field_mismatch.validate().is_err());
    }

    #[test]
    fn test_generator_polynomial_must_match_family() {
        let conflicting = CodeConfig::new()
            .with_family(FamilyConfig::Hamming { mu: 3, extended: false })
            .with_generator_polynomial(0b111);
        assert!(matches!(conflicting.build(), Err(Error::InvalidParameter(_))));
        let golay = CodeConfig::new().with_family(FamilyConfig::Golay { extended: false });
        assert!(golay.clone().with_generator_polynomial(0b1010_1110_0011).build().is_ok());
        assert!(golay.with_generator_polynomial(0b1100_0111_0101).build().is_err());
        let extended = CodeConfig::new()
            .with_family(FamilyConfig::Golay { extended: true })
            .with_generator_polynomial(0b1010_1110_0011);
        assert!(extended.build().is_err());
        let bch = CodeConfig::new()
            .with_family(FamilyConfig::Bch { mu: 4, delta: 3 })
            .with_generator_polynomial(0b10011);
        assert_eq!(bch.build().unwrap().dimension(), 11);
    }

    #[test]
    fn test_field_options_need_bch_family() {
        let hamming = CodeConfig::new().with_family(FamilyConfig::Hamming { mu: 3, extended: false });
        assert!(hamming.clone().with_field_degree(3).validate().is_err());
        assert!(hamming.clone().with_primitive_polynomial(0b1011).build().is_err());
        assert!(hamming.validate().is_ok());
        let bch = CodeConfig::new()
            .with_family(FamilyConfig::Bch { mu: 4, delta: 3 })
            .with_primitive_polynomial(0b11001);
        assert!(bch.validate().is_ok());
    }

    #[test]
    fn test_field_and_convolutional() {
        let field = CodeConfig::new()
            .with_field_degree(4)
            .with_primitive_polynomial(0b11001)
            .build_field()
            .unwrap();
        assert_eq!(field.modulus(), &BinaryPolynomial::from_u64(0b11001));
        assert!(CodeConfig::new().build_field().is_err());

        let json = r#"{
            "family": {
                "type": "convolutional",
                "generators": [[7, 5]],
                "num_blocks": 4,
                "termination": "zero_termination"
            }
        }"#;
        let config = CodeConfig::from_json(json).unwrap();
        assert!(config.is_convolutional());
        let terminated = config.build_terminated().unwrap();
        assert_eq!((terminated.length(), terminated.dimension()), (12, 4));
        let block = config.build().unwrap();
        assert_eq!(block.family(), CodeFamily::TerminatedConvolutional);
        assert_eq!(block.encode(&[1, 0, 1, 1]).unwrap(), terminated.encode(&[1, 0, 1, 1]).unwrap());
        assert!(CodeConfig::new()
            .with_family(FamilyConfig::Golay { extended: false })
            .build_terminated()
            .is_err());
    }
}

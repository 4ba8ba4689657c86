//! Convolutional codes.
//!
//! A (n, k) convolutional code is given by a k x n matrix of generator
//! polynomials g_io(D) and, for recursive codes, one feedback polynomial
//! q_i(D) per input (controller canonical form). Polynomials are integers whose
//! bit j is the coefficient of D^j, so `0o7` is 1 + D + D^2.
//!
//! Input i drives a shift register of ν_i = max(deg g_io, deg q_i) bits holding
//! the feedback-filtered inputs w_i. The machine state concatenates the
//! registers, register i at bit offset ν_0 + ... + ν_(i-1); inside a register
//! bit j - 1 holds w_(t-j). Input and output blocks are packed LSB first.

use tracing::debug;

use crate::error::{Error, Result};
use crate::fsm::FiniteStateMachine;
use crate::polynomial::{BinaryPolynomial, BinaryPolynomialFraction};

mod stream;
mod terminated;

pub use stream::{ConvolutionalStreamDecoder, ConvolutionalStreamEncoder};
pub use terminated::{TerminatedConvolutionalCode, TerminationMode};

/// Largest overall constraint length (the trellis has 2^ν states).
pub const MAX_CONSTRAINT_LENGTH: usize = 20;

/// Largest number of input or output bits per block.
pub const MAX_BLOCK_BITS: usize = 16;

fn parity(x: u64) -> usize {
    (x.count_ones() & 1) as usize
}

fn degree(p: u64) -> usize {
    (64 - p.leading_zeros() as usize).saturating_sub(1)
}

/// Shift-register layout of the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Registers {
    generators: Vec<Vec<u64>>,
    feedback: Option<Vec<u64>>,
    constraint_lengths: Vec<usize>,
    offsets: Vec<usize>,
}

impl Registers {
    fn register(&self, state: usize, input: usize) -> u64 {
        let mask = (1u64 << self.constraint_lengths[input]) - 1;
        (state as u64 >> self.offsets[input]) & mask
    }

    fn feedback_sum(&self, input: usize, register: u64) -> u64 {
        self.feedback
            .as_ref()
            .map_or(0, |q| parity(register & (q[input] >> 1)) as u64)
    }

    /// One encoder step: next state and packed output block.
    fn step(&self, state: usize, input: usize) -> (usize, usize) {
        let mut next = 0;
        let mut output = 0;
        for (i, row) in self.generators.iter().enumerate() {
            let register = self.register(state, i);
            let u = ((input >> i) & 1) as u64;
            let full = (register << 1) | (u ^ self.feedback_sum(i, register));
            for (o, &g) in row.iter().enumerate() {
                output ^= parity(full & g) << o;
            }
            let mask = (1u64 << self.constraint_lengths[i]) - 1;
            next |= ((full & mask) as usize) << self.offsets[i];
        }
        (next, output)
    }
}

/// A binary convolutional code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvolutionalCode {
    registers: Registers,
    fsm: FiniteStateMachine,
}

impl ConvolutionalCode {
    /// Feed-forward code from its k x n generator matrix.
    pub fn new(generators: Vec<Vec<u64>>) -> Result<Self> {
        Self::build(generators, None)
    }

    /// Recursive code with feedback polynomial `feedback[i]` on input i.
    ///
    /// Every feedback polynomial needs a constant term of 1.
    pub fn with_feedback(generators: Vec<Vec<u64>>, feedback: Vec<u64>) -> Result<Self> {
        Self::build(generators, Some(feedback))
    }

    /// Feed-forward code from octal strings, e.g. `&[&["7", "5"]]`.
    pub fn from_octal(generators: &[&[&str]]) -> Result<Self> {
        let parsed = generators
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| {
                        u64::from_str_radix(s.trim_start_matches("0o"), 8).map_err(|e| {
                            Error::InvalidParameter(format!("invalid octal generator '{}': {}", s, e))
                        })
                    })
                    .collect::<Result<Vec<u64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(parsed)
    }

    fn build(generators: Vec<Vec<u64>>, feedback: Option<Vec<u64>>) -> Result<Self> {
        let k = generators.len();
        let n = generators.first().map_or(0, Vec::len);
        if k == 0 || n == 0 {
            return Err(Error::InvalidParameter("generator matrix is empty".into()));
        }
        if k > MAX_BLOCK_BITS || n > MAX_BLOCK_BITS {
            return Err(Error::UnsupportedParameter(format!(
                "convolutional codes are limited to {} input and output bits (got k = {}, n = {})",
                MAX_BLOCK_BITS, k, n
            )));
        }
        if generators.iter().any(|row| row.len() != n) {
            return Err(Error::InvalidParameter("generator matrix rows differ in length".into()));
        }
        if let Some(q) = &feedback {
            if q.len() != k {
                return Err(Error::InvalidParameter(format!(
                    "expected {} feedback polynomials, got {}",
                    k,
                    q.len()
                )));
            }
            if let Some(bad) = q.iter().find(|&&p| p & 1 == 0) {
                return Err(Error::InvalidParameter(format!(
                    "feedback polynomial {:#o} must have a constant term",
                    bad
                )));
            }
        }
        let constraint_lengths: Vec<usize> = generators
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let forward = row.iter().map(|&g| degree(g)).max().unwrap_or(0);
                let backward = feedback.as_ref().map_or(0, |q| degree(q[i]));
                forward.max(backward)
            })
            .collect();
        let overall: usize = constraint_lengths.iter().sum();
        if overall > MAX_CONSTRAINT_LENGTH {
            return Err(Error::UnsupportedParameter(format!(
                "overall constraint length {} exceeds {}",
                overall, MAX_CONSTRAINT_LENGTH
            )));
        }
        let offsets = constraint_lengths
            .iter()
            .scan(0, |acc, &nu| {
                let offset = *acc;
                *acc += nu;
                Some(offset)
            })
            .collect();
        let registers = Registers {
            generators,
            feedback,
            constraint_lengths,
            offsets,
        };
        let (num_states, num_inputs) = (1usize << overall, 1usize << k);
        let mut next_states = vec![vec![0; num_inputs]; num_states];
        let mut outputs = vec![vec![0; num_inputs]; num_states];
        for s in 0..num_states {
            for x in 0..num_inputs {
                let (next, y) = registers.step(s, x);
                next_states[s][x] = next;
                outputs[s][x] = y;
            }
        }
        let fsm = FiniteStateMachine::new(next_states, outputs)?;
        debug!(k, n, overall, "built convolutional code trellis");
        Ok(Self { registers, fsm })
    }

    /// Input block that drives every register towards zero. Applying it μ
    /// times from any state reaches state 0.
    pub fn flush_input(&self, state: usize) -> usize {
        (0..self.num_input_bits())
            .map(|i| {
                let register = self.registers.register(state, i);
                (self.registers.feedback_sum(i, register) as usize) << i
            })
            .sum()
    }

    /// Number of input bits k per block.
    pub fn num_input_bits(&self) -> usize {
        self.registers.generators.len()
    }

    /// Number of output bits n per block.
    pub fn num_output_bits(&self) -> usize {
        self.registers.generators[0].len()
    }

    /// Rate k / n.
    pub fn rate(&self) -> f64 {
        self.num_input_bits() as f64 / self.num_output_bits() as f64
    }

    /// Constraint length ν_i of each input.
    pub fn constraint_lengths(&self) -> &[usize] {
        &self.registers.constraint_lengths
    }

    /// Overall constraint length ν, the number of state bits.
    pub fn overall_constraint_length(&self) -> usize {
        self.registers.constraint_lengths.iter().sum()
    }

    /// Memory order μ = max ν_i.
    pub fn memory_order(&self) -> usize {
        self.registers.constraint_lengths.iter().copied().max().unwrap_or(0)
    }

    /// Feed-forward generator polynomials as integers.
    pub fn generator_polynomials(&self) -> &[Vec<u64>] {
        &self.registers.generators
    }

    /// Feedback polynomials, for recursive codes.
    pub fn feedback_polynomials(&self) -> Option<&[u64]> {
        self.registers.feedback.as_deref()
    }

    /// Returns true if the code has feedback.
    pub fn is_recursive(&self) -> bool {
        self.registers.feedback.is_some()
    }

    /// Transfer function matrix G(D), entry (i, o) = g_io(D) / q_i(D) in lowest terms.
    pub fn generator_matrix(&self) -> Result<Vec<Vec<BinaryPolynomialFraction>>> {
        self.registers
            .generators
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let q = self.registers.feedback.as_ref().map_or(1, |q| q[i]);
                row.iter()
                    .map(|&g| {
                        BinaryPolynomialFraction::new(
                            BinaryPolynomial::from_u64(g),
                            BinaryPolynomial::from_u64(q),
                        )
                    })
                    .collect()
            })
            .collect()
    }

    /// The trellis of the encoder.
    pub fn finite_state_machine(&self) -> &FiniteStateMachine {
        &self.fsm
    }

    /// Packs a k-bit (or n-bit) block, LSB first.
    pub(crate) fn pack(bits: &[u8]) -> usize {
        bits.iter()
            .enumerate()
            .map(|(i, &b)| usize::from(b) << i)
            .sum()
    }

    /// Unpacks a symbol into `width` bits, LSB first.
    pub(crate) fn unpack(symbol: usize, width: usize, out: &mut Vec<u8>) {
        out.extend((0..width).map(|i| ((symbol >> i) & 1) as u8));
    }

    /// Hamming distance between output symbol `y` and a hard block.
    pub(crate) fn hard_metric(y: usize, block: &[u8]) -> f64 {
        block
            .iter()
            .enumerate()
            .filter(|&(i, &b)| ((y >> i) & 1) as u8 != b)
            .count() as f64
    }

    /// Correlation metric: sum of the soft values at the positions where `y` has a 1.
    pub(crate) fn soft_metric(y: usize, block: &[f64]) -> f64 {
        block
            .iter()
            .enumerate()
            .filter(|&(i, _)| (y >> i) & 1 == 1)
            .map(|(_, &z)| z)
            .sum()
    }
}

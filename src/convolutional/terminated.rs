//! Convolutional codes terminated into block codes.

use std::sync::OnceLock;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::ConvolutionalCode;
use crate::bits;
use crate::block::{BlockCode, CodeFamily, Decoded, DecodingMethod, LinearCode};
use crate::error::{check_length, Error, Result};
use crate::matrix;

/// How the encoder state is handled at the block boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationMode {
    /// Start in state 0 and stop after the message; the final state is lost
    DirectTruncation,
    /// Start in state 0 and append μ flushing blocks that return to state 0
    #[default]
    ZeroTermination,
    /// Start in the state that the message itself returns to, so the trellis
    /// path is circular and no tail is sent
    TailBiting,
}

/// A (h·n, h·k) block code obtained from h blocks of a convolutional code.
#[derive(Debug, Clone)]
pub struct TerminatedConvolutionalCode {
    code: ConvolutionalCode,
    num_blocks: usize,
    mode: TerminationMode,
    /// (A^h + I)^-1 over GF(2), tail-biting only
    zs_multiplier: Option<Array2<u8>>,
    minimum_distance: OnceLock<usize>,
}

impl TerminatedConvolutionalCode {
    /// Terminates `code` over `num_blocks` input blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `num_blocks` is zero, or for
    /// tail-biting when A^h + I is singular (A being the zero-input state
    /// transition matrix), as no circular state then exists for every message.
    pub fn new(code: ConvolutionalCode, num_blocks: usize, mode: TerminationMode) -> Result<Self> {
        if num_blocks == 0 {
            return Err(Error::InvalidParameter("number of blocks must be positive".into()));
        }
        let zs_multiplier = match mode {
            TerminationMode::TailBiting => Some(zero_state_multiplier(&code, num_blocks)?),
            _ => None,
        };
        Ok(Self {
            code,
            num_blocks,
            mode,
            zs_multiplier,
            minimum_distance: OnceLock::new(),
        })
    }

    /// The underlying convolutional code.
    pub fn convolutional_code(&self) -> &ConvolutionalCode {
        &self.code
    }

    /// Number of message blocks h.
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Termination mode.
    pub fn mode(&self) -> TerminationMode {
        self.mode
    }

    fn trellis_steps(&self) -> usize {
        match self.mode {
            TerminationMode::ZeroTermination => self.num_blocks + self.code.memory_order(),
            _ => self.num_blocks,
        }
    }

    /// Codeword length: h·n, or (h + μ)·n with zero termination.
    pub fn length(&self) -> usize {
        self.trellis_steps() * self.code.num_output_bits()
    }

    /// Message length h·k.
    pub fn dimension(&self) -> usize {
        self.num_blocks * self.code.num_input_bits()
    }

    fn initial_state(&self, inputs: &[usize]) -> Result<usize> {
        let multiplier = match &self.zs_multiplier {
            Some(m) => m,
            None => return Ok(0),
        };
        let nu = self.code.overall_constraint_length();
        if nu == 0 {
            return Ok(0);
        }
        let (_, zero_state_response) = self.code.finite_state_machine().process(inputs, 0)?;
        let response = bits::int_to_bits(zero_state_response as u64, nu);
        Ok(bits::bits_to_int(&matrix::matrix_vector(multiplier, &response)) as usize)
    }

    /// Encodes an h·k-bit message.
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        check_length(message, self.dimension())?;
        let fsm = self.code.finite_state_machine();
        let n = self.code.num_output_bits();
        let inputs: Vec<usize> = message
            .chunks(self.code.num_input_bits())
            .map(ConvolutionalCode::pack)
            .collect();
        let (outputs, mut state) = fsm.process(&inputs, self.initial_state(&inputs)?)?;
        let mut codeword = Vec::with_capacity(self.length());
        for y in outputs {
            ConvolutionalCode::unpack(y, n, &mut codeword);
        }
        if self.mode == TerminationMode::ZeroTermination {
            for _ in 0..self.code.memory_order() {
                let x = self.code.flush_input(state);
                ConvolutionalCode::unpack(fsm.output(state, x)?, n, &mut codeword);
                state = fsm.next_state(state, x)?;
            }
        }
        Ok(codeword)
    }

    fn viterbi_inputs<Z, F>(&self, observed: &[Z], metric: F) -> Result<Vec<usize>>
    where
        F: Fn(usize, &Z) -> f64,
    {
        let fsm = self.code.finite_state_machine();
        let num_states = fsm.num_states();
        let starting_at = |s: usize| {
            let mut metrics = vec![f64::INFINITY; num_states];
            metrics[s] = 0.0;
            metrics
        };
        let mut inputs = match self.mode {
            TerminationMode::DirectTruncation => {
                let survivors = fsm.viterbi(observed, &metric, Some(&starting_at(0)))?;
                survivors.input_sequence(survivors.best_state())?
            }
            TerminationMode::ZeroTermination => fsm
                .viterbi(observed, &metric, Some(&starting_at(0)))?
                .input_sequence(0)?,
            TerminationMode::TailBiting => {
                let mut best: Option<(f64, Vec<usize>)> = None;
                for s in 0..num_states {
                    let survivors = fsm.viterbi(observed, &metric, Some(&starting_at(s)))?;
                    let m = survivors.final_metrics()[s];
                    if m < best.as_ref().map_or(f64::INFINITY, |(b, _)| *b) {
                        best = Some((m, survivors.input_sequence(s)?));
                    }
                }
                best.map(|(_, inputs)| inputs).ok_or_else(|| {
                    Error::InvalidParameter("no circular path through the trellis".into())
                })?
            }
        };
        inputs.truncate(self.num_blocks);
        Ok(inputs)
    }

    fn finish(&self, hard: &[u8], inputs: &[usize]) -> Result<Decoded> {
        let mut message = Vec::with_capacity(self.dimension());
        for &x in inputs {
            ConvolutionalCode::unpack(x, self.code.num_input_bits(), &mut message);
        }
        let codeword = self.encode(&message)?;
        let corrections = bits::hamming_distance(hard, &codeword);
        let correctable = self.correction_capability();
        Ok(Decoded {
            message,
            codeword,
            uncorrectable: corrections > correctable,
            corrections,
            correctable,
        })
    }

    /// Viterbi decoding of a hard-decision word.
    pub fn decode(&self, received: &[u8]) -> Result<Decoded> {
        check_length(received, self.length())?;
        let blocks: Vec<&[u8]> = received.chunks(self.code.num_output_bits()).collect();
        let inputs = self.viterbi_inputs(&blocks, |y, z: &&[u8]| ConvolutionalCode::hard_metric(y, z))?;
        self.finish(received, &inputs)
    }

    /// Viterbi decoding of soft values (BPSK: bit 0 near +1, bit 1 near -1).
    pub fn decode_soft(&self, received: &[f64]) -> Result<Decoded> {
        if received.len() != self.length() {
            return Err(Error::Length {
                expected: self.length(),
                actual: received.len(),
            });
        }
        if let Some(bad) = received.iter().find(|z| !z.is_finite()) {
            return Err(Error::InvalidParameter(format!("soft value {} is not finite", bad)));
        }
        let blocks: Vec<&[f64]> = received.chunks(self.code.num_output_bits()).collect();
        let inputs = self.viterbi_inputs(&blocks, |y, z: &&[f64]| ConvolutionalCode::soft_metric(y, z))?;
        let hard: Vec<u8> = received.iter().map(|&z| u8::from(z < 0.0)).collect();
        self.finish(&hard, &inputs)
    }

    /// The equivalent block code, whose generator rows are the encodings of
    /// the unit messages.
    pub fn to_block_code(&self) -> Result<BlockCode> {
        let k = self.dimension();
        let rows = (0..k)
            .map(|j| {
                let mut unit = vec![0u8; k];
                unit[j] = 1;
                self.encode(&unit)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(BlockCode::from_generator_matrix(matrix::from_rows(&rows)?)?
            .with_family(CodeFamily::TerminatedConvolutional))
    }

    /// Minimum distance of the equivalent block code, the lightest trellis
    /// path carrying a nonzero message. Computed on first use.
    pub fn minimum_distance(&self) -> usize {
        *self.minimum_distance.get_or_init(|| {
            let starts = match self.mode {
                TerminationMode::TailBiting => 0..self.code.finite_state_machine().num_states(),
                _ => 0..1,
            };
            starts.filter_map(|s| self.lightest_path(s)).min().unwrap_or(0)
        })
    }

    /// Packing radius used for the uncorrectable flag.
    pub fn correction_capability(&self) -> usize {
        self.minimum_distance().saturating_sub(1) / 2
    }

    /// Weight of the lightest path from `start` whose message is nonzero,
    /// returning to `start` for tail-biting and to 0 with zero termination.
    fn lightest_path(&self, start: usize) -> Option<usize> {
        let fsm = self.code.finite_state_machine();
        let num_states = fsm.num_states();
        // weights[departed][state]; departed once a message block is nonzero.
        // A circular path from a nonzero state always carries a nonzero message.
        let mut weights = vec![vec![None::<usize>; num_states]; 2];
        weights[usize::from(start != 0)][start] = Some(0);
        for step in 0..self.trellis_steps() {
            let mut next = vec![vec![None::<usize>; num_states]; 2];
            for departed in 0..2 {
                for (state, weight) in weights[departed].iter().enumerate() {
                    let Some(weight) = *weight else {
                        continue;
                    };
                    let inputs = if step < self.num_blocks {
                        0..fsm.num_input_symbols()
                    } else {
                        let x = self.code.flush_input(state);
                        x..x + 1
                    };
                    for x in inputs {
                        let target = fsm.next_states()[state][x];
                        let d = departed | usize::from(step < self.num_blocks && x != 0);
                        let w = weight + fsm.outputs()[state][x].count_ones() as usize;
                        if next[d][target].map_or(true, |old| w < old) {
                            next[d][target] = Some(w);
                        }
                    }
                }
            }
            weights = next;
        }
        match self.mode {
            TerminationMode::TailBiting => weights[1][start],
            TerminationMode::ZeroTermination => weights[1][0],
            TerminationMode::DirectTruncation => weights[1].iter().flatten().min().copied(),
        }
    }
}

fn zero_state_multiplier(code: &ConvolutionalCode, num_blocks: usize) -> Result<Array2<u8>> {
    let nu = code.overall_constraint_length();
    if nu == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    let next_states = code.finite_state_machine().next_states();
    let mut transition = Array2::zeros((nu, nu));
    for j in 0..nu {
        let column = bits::int_to_bits(next_states[1 << j][0] as u64, nu);
        for (i, &b) in column.iter().enumerate() {
            transition[[i, j]] = b;
        }
    }
    let mut power = matrix::identity(nu);
    let mut base = transition;
    let mut e = num_blocks;
    while e > 0 {
        if e & 1 == 1 {
            power = matrix::multiply(&power, &base);
        }
        base = matrix::multiply(&base, &base);
        e >>= 1;
    }
    let system = power ^ &matrix::identity(nu);
    matrix::inverse(&system).map_err(|_| {
        Error::InvalidParameter(format!(
            "tail-biting over {} blocks is impossible for this code (A^h + I is singular)",
            num_blocks
        ))
    })
}

impl LinearCode for TerminatedConvolutionalCode {
    fn length(&self) -> usize {
        TerminatedConvolutionalCode::length(self)
    }

    fn dimension(&self) -> usize {
        TerminatedConvolutionalCode::dimension(self)
    }

    fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        TerminatedConvolutionalCode::encode(self, message)
    }

    fn decode(&self, received: &[u8]) -> Result<Decoded> {
        TerminatedConvolutionalCode::decode(self, received)
    }

    fn decode_with(&self, method: DecodingMethod, received: &[u8]) -> Result<Decoded> {
        match method {
            DecodingMethod::Viterbi => self.decode(received),
            other => Err(Error::UnsupportedParameter(format!(
                "decoding method {:?} does not apply to terminated convolutional codes",
                other
            ))),
        }
    }
}

//! Resumable convolutional encoding and decoding sessions.

use super::ConvolutionalCode;
use crate::error::{check_bits, Error, Result};
use crate::fsm::MetricMemory;

fn check_multiple(len: usize, block: usize) -> Result<()> {
    if len % block != 0 {
        return Err(Error::Length {
            expected: len.div_ceil(block) * block,
            actual: len,
        });
    }
    Ok(())
}

/// Stateful encoder; the register contents persist across calls.
#[derive(Debug, Clone)]
pub struct ConvolutionalStreamEncoder {
    code: ConvolutionalCode,
    initial_state: usize,
    state: usize,
}

impl ConvolutionalStreamEncoder {
    /// Encoder starting in state 0.
    pub fn new(code: ConvolutionalCode) -> Self {
        Self {
            code,
            initial_state: 0,
            state: 0,
        }
    }

    /// Starts (and resets) in the given state instead of 0.
    pub fn with_initial_state(mut self, state: usize) -> Result<Self> {
        if state >= self.code.finite_state_machine().num_states() {
            return Err(Error::InvalidParameter(format!(
                "initial state {} out of range 0..{}",
                state,
                self.code.finite_state_machine().num_states()
            )));
        }
        self.initial_state = state;
        self.state = state;
        Ok(self)
    }

    /// The code being encoded.
    pub fn code(&self) -> &ConvolutionalCode {
        &self.code
    }

    /// Current encoder state.
    pub fn state(&self) -> usize {
        self.state
    }

    /// Encodes a chunk whose length is a multiple of k.
    pub fn encode(&mut self, bits: &[u8]) -> Result<Vec<u8>> {
        check_bits(bits)?;
        let (k, n) = (self.code.num_input_bits(), self.code.num_output_bits());
        check_multiple(bits.len(), k)?;
        let inputs: Vec<usize> = bits.chunks(k).map(ConvolutionalCode::pack).collect();
        let (outputs, state) = self.code.finite_state_machine().process(&inputs, self.state)?;
        self.state = state;
        let mut encoded = Vec::with_capacity(outputs.len() * n);
        for y in outputs {
            ConvolutionalCode::unpack(y, n, &mut encoded);
        }
        Ok(encoded)
    }

    /// Returns to the initial state.
    pub fn reset(&mut self) {
        self.state = self.initial_state;
    }
}

/// Streaming Viterbi decoder with traceback length τ.
///
/// Each call consumes whole n-bit blocks and emits one k-bit block per input
/// block, delayed by exactly τ blocks: the first τ·k output bits are zeros,
/// after which the decisions of τ blocks earlier follow. [`finalize`]
/// flushes the decisions still inside the window.
///
/// [`finalize`]: ConvolutionalStreamDecoder::finalize
#[derive(Debug, Clone)]
pub struct ConvolutionalStreamDecoder {
    code: ConvolutionalCode,
    initial_state: usize,
    memory: MetricMemory,
}

impl ConvolutionalStreamDecoder {
    /// Decoder starting in state 0 with the given traceback length.
    pub fn new(code: ConvolutionalCode, traceback_length: usize) -> Result<Self> {
        Self::with_initial_state(code, traceback_length, 0)
    }

    /// Decoder assuming the encoder started in `initial_state`.
    pub fn with_initial_state(code: ConvolutionalCode, traceback_length: usize, initial_state: usize) -> Result<Self> {
        let memory = MetricMemory::new(code.finite_state_machine().num_states(), traceback_length, initial_state)?;
        Ok(Self {
            code,
            initial_state,
            memory,
        })
    }

    /// The code being decoded.
    pub fn code(&self) -> &ConvolutionalCode {
        &self.code
    }

    /// Traceback length τ in blocks.
    pub fn traceback_length(&self) -> usize {
        self.memory.traceback_length()
    }

    /// Decodes hard bits; the length must be a multiple of n.
    pub fn decode(&mut self, bits: &[u8]) -> Result<Vec<u8>> {
        check_bits(bits)?;
        let n = self.code.num_output_bits();
        check_multiple(bits.len(), n)?;
        let blocks: Vec<&[u8]> = bits.chunks(n).collect();
        let decided = self.code.finite_state_machine().viterbi_streaming(
            &blocks,
            |y, z: &&[u8]| ConvolutionalCode::hard_metric(y, z),
            &mut self.memory,
        )?;
        Ok(self.unpack(&decided))
    }

    /// Decodes soft values (BPSK: bit 0 near +1, bit 1 near -1).
    pub fn decode_soft(&mut self, values: &[f64]) -> Result<Vec<u8>> {
        let n = self.code.num_output_bits();
        check_multiple(values.len(), n)?;
        if let Some(bad) = values.iter().find(|z| !z.is_finite()) {
            return Err(Error::InvalidParameter(format!("soft value {} is not finite", bad)));
        }
        let blocks: Vec<&[f64]> = values.chunks(n).collect();
        let decided = self.code.finite_state_machine().viterbi_streaming(
            &blocks,
            |y, z: &&[f64]| ConvolutionalCode::soft_metric(y, z),
            &mut self.memory,
        )?;
        Ok(self.unpack(&decided))
    }

    /// Emits the tentative decisions of the last min(blocks, τ) blocks on the
    /// best survivor and resets the session.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let pending = self.memory.pending();
        self.reset()?;
        Ok(self.unpack(&pending))
    }

    /// Discards all path memory and returns to the initial state.
    pub fn reset(&mut self) -> Result<()> {
        self.memory = MetricMemory::new(
            self.code.finite_state_machine().num_states(),
            self.memory.traceback_length(),
            self.initial_state,
        )?;
        Ok(())
    }

    fn unpack(&self, inputs: &[usize]) -> Vec<u8> {
        let k = self.code.num_input_bits();
        let mut out = Vec::with_capacity(inputs.len() * k);
        for &x in inputs {
            ConvolutionalCode::unpack(x, k, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_7_5() -> ConvolutionalCode {
        ConvolutionalCode::new(vec![vec![0o7, 0o5]]).unwrap()
    }

    #[test]
    fn test_encoder_keeps_state_across_calls() {
        let mut whole = ConvolutionalStreamEncoder::new(code_7_5());
        let expected = whole.encode(&[1, 0, 1, 1, 0, 0]).unwrap();
        assert_eq!(expected, vec![1, 1, 1, 0, 0, 0, 0, 1, 0, 1, 1, 1]);
        assert_eq!(whole.state(), 0);

        let mut split = ConvolutionalStreamEncoder::new(code_7_5());
        let mut chunked = split.encode(&[1, 0, 1]).unwrap();
        assert_eq!(split.state(), 0b01);
        chunked.extend(split.encode(&[1, 0, 0]).unwrap());
        assert_eq!(chunked, expected);

        split.encode(&[1]).unwrap();
        split.reset();
        assert_eq!(split.state(), 0);
        assert!(ConvolutionalStreamEncoder::new(code_7_5()).with_initial_state(4).is_err());
    }

    #[test]
    fn test_decoder_delay() {
        let mut decoder = ConvolutionalStreamDecoder::new(code_7_5(), 10).unwrap();
        let first = decoder
            .decode(&[1, 1, 1, 0, 0, 0, 0, 1, 1, 0, 0, 1, 0, 0, 0, 1, 0, 1, 1, 1])
            .unwrap();
        assert_eq!(first, vec![0; 10]);
        let second = decoder.decode(&[0; 20]).unwrap();
        assert_eq!(second, vec![1, 0, 1, 1, 1, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_finalize_flushes_window() {
        let message = vec![1, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1];
        let mut encoder = ConvolutionalStreamEncoder::new(code_7_5());
        let mut received = encoder.encode(&message).unwrap();
        received[5] ^= 1;
        received[16] ^= 1;
        let mut decoder = ConvolutionalStreamDecoder::new(code_7_5(), 4).unwrap();
        let mut decoded = decoder.decode(&received).unwrap();
        assert_eq!(decoded[..4], [0, 0, 0, 0]);
        decoded.extend(decoder.finalize().unwrap());
        assert_eq!(decoded[4..], message[..]);
        // finalize resets the session
        assert!(decoder.finalize().unwrap().is_empty());
    }

    #[test]
    fn test_soft_stream() {
        let message = vec![0, 1, 1, 0, 1, 0, 0, 1];
        let mut encoder = ConvolutionalStreamEncoder::new(code_7_5());
        let encoded = encoder.encode(&message).unwrap();
        let soft: Vec<f64> = encoded.iter().map(|&b| if b == 0 { 0.9 } else { -1.1 }).collect();
        let mut decoder = ConvolutionalStreamDecoder::new(code_7_5(), 3).unwrap();
        let mut decoded = decoder.decode_soft(&soft).unwrap();
        decoded.extend(decoder.finalize().unwrap());
        assert_eq!(decoded[3..], message[..]);
    }

    #[test]
    fn test_invalid_chunks() {
        let mut decoder = ConvolutionalStreamDecoder::new(code_7_5(), 5).unwrap();
        assert!(matches!(decoder.decode(&[1, 0, 1]), Err(Error::Length { expected: 4, actual: 3 })));
        assert!(decoder.decode_soft(&[0.5, f64::INFINITY]).is_err());
        assert!(ConvolutionalStreamDecoder::new(code_7_5(), 0).is_err());
        assert!(ConvolutionalStreamDecoder::with_initial_state(code_7_5(), 5, 7).is_err());
    }
}

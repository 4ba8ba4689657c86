//! Finite-state machines (Mealy machines) and Viterbi decoding on their trellis.
//!
//! States, input symbols and output symbols are the integers `0..S`, `0..X`
//! and `0..Y`. The machine is total: every (state, input) pair has exactly one
//! next state and one output.

use std::collections::VecDeque;

use tracing::trace;

use crate::error::{Error, Result};

/// A deterministic Mealy machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiniteStateMachine {
    next_states: Vec<Vec<usize>>,
    outputs: Vec<Vec<usize>>,
    input_edges: Vec<Vec<Option<usize>>>,
    output_edges: Vec<Vec<Option<usize>>>,
}

impl FiniteStateMachine {
    /// Creates a machine from its S x X next-state and output tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when the tables are empty, ragged,
    /// of different shapes, or name a next state outside `0..S`.
    pub fn new(next_states: Vec<Vec<usize>>, outputs: Vec<Vec<usize>>) -> Result<Self> {
        let num_states = next_states.len();
        if num_states == 0 {
            return Err(Error::InvalidParameter("machine needs at least one state".into()));
        }
        let num_inputs = next_states[0].len();
        if num_inputs == 0 {
            return Err(Error::InvalidParameter("machine needs at least one input symbol".into()));
        }
        if outputs.len() != num_states {
            return Err(Error::InvalidParameter(format!(
                "output table has {} rows, expected {}",
                outputs.len(),
                num_states
            )));
        }
        for (state, (row, out)) in next_states.iter().zip(&outputs).enumerate() {
            if row.len() != num_inputs || out.len() != num_inputs {
                return Err(Error::InvalidParameter(format!(
                    "row {} must have {} entries in both tables",
                    state, num_inputs
                )));
            }
            if let Some(&bad) = row.iter().find(|&&s| s >= num_states) {
                return Err(Error::InvalidParameter(format!(
                    "next state {} of state {} is out of range 0..{}",
                    bad, state, num_states
                )));
            }
        }
        let mut input_edges = vec![vec![None; num_states]; num_states];
        let mut output_edges = vec![vec![None; num_states]; num_states];
        for s0 in 0..num_states {
            // Parallel edges keep the lowest input symbol.
            for x in (0..num_inputs).rev() {
                let s1 = next_states[s0][x];
                input_edges[s0][s1] = Some(x);
                output_edges[s0][s1] = Some(outputs[s0][x]);
            }
        }
        Ok(Self {
            next_states,
            outputs,
            input_edges,
            output_edges,
        })
    }

    /// Number of states S.
    pub fn num_states(&self) -> usize {
        self.next_states.len()
    }

    /// Size X of the input alphabet.
    pub fn num_input_symbols(&self) -> usize {
        self.next_states[0].len()
    }

    /// Size Y of the output alphabet (largest output plus one).
    pub fn num_output_symbols(&self) -> usize {
        self.outputs.iter().flatten().max().map_or(0, |&y| y + 1)
    }

    /// The S x X next-state table.
    pub fn next_states(&self) -> &[Vec<usize>] {
        &self.next_states
    }

    /// The S x X output table.
    pub fn outputs(&self) -> &[Vec<usize>] {
        &self.outputs
    }

    /// Next state from `state` on `input`.
    pub fn next_state(&self, state: usize, input: usize) -> Result<usize> {
        self.check(state, input)?;
        Ok(self.next_states[state][input])
    }

    /// Output emitted from `state` on `input`.
    pub fn output(&self, state: usize, input: usize) -> Result<usize> {
        self.check(state, input)?;
        Ok(self.outputs[state][input])
    }

    /// S x S matrix whose entry (s0, s1) is the input labelling the edge s0 -> s1.
    pub fn input_edges(&self) -> &[Vec<Option<usize>>] {
        &self.input_edges
    }

    /// S x S matrix whose entry (s0, s1) is the output labelling the edge s0 -> s1.
    pub fn output_edges(&self) -> &[Vec<Option<usize>>] {
        &self.output_edges
    }

    /// Runs the machine from `initial_state`, returning the outputs and the final state.
    pub fn process(&self, inputs: &[usize], initial_state: usize) -> Result<(Vec<usize>, usize)> {
        let mut state = initial_state;
        let mut outputs = Vec::with_capacity(inputs.len());
        for &x in inputs {
            self.check(state, x)?;
            outputs.push(self.outputs[state][x]);
            state = self.next_states[state][x];
        }
        if inputs.is_empty() && state >= self.num_states() {
            return Err(self.state_error(state));
        }
        Ok((outputs, state))
    }

    fn check(&self, state: usize, input: usize) -> Result<()> {
        if state >= self.num_states() {
            return Err(self.state_error(state));
        }
        if input >= self.num_input_symbols() {
            return Err(Error::InvalidParameter(format!(
                "input symbol {} out of range 0..{}",
                input,
                self.num_input_symbols()
            )));
        }
        Ok(())
    }

    fn state_error(&self, state: usize) -> Error {
        Error::InvalidParameter(format!(
            "state {} out of range 0..{}",
            state,
            self.num_states()
        ))
    }

    /// One add-compare-select step. Candidates are visited in ascending
    /// (state, input) order and only a strictly smaller metric replaces the
    /// current survivor.
    fn survivors_step<Z, F>(
        &self,
        metrics: &[f64],
        z: &Z,
        metric: &F,
    ) -> (Vec<f64>, Vec<Option<(usize, usize)>>)
    where
        F: Fn(usize, &Z) -> f64,
    {
        let num_states = self.num_states();
        let mut next = vec![f64::INFINITY; num_states];
        let mut choices = vec![None; num_states];
        for (s0, &m0) in metrics.iter().enumerate() {
            if m0 == f64::INFINITY {
                continue;
            }
            for (x, (&s1, &y)) in self.next_states[s0].iter().zip(&self.outputs[s0]).enumerate() {
                let candidate = m0 + metric(y, z);
                if candidate < next[s1] {
                    next[s1] = candidate;
                    choices[s1] = Some((s0, x));
                }
            }
        }
        (next, choices)
    }

    /// Full-block Viterbi search over an observed sequence.
    ///
    /// `metric(y, z)` is the branch cost of output `y` against observation `z`.
    /// Initial metrics default to 0 for every state; use infinity to exclude
    /// a starting state.
    pub fn viterbi<Z, F>(
        &self,
        observed: &[Z],
        metric: F,
        initial_metrics: Option<&[f64]>,
    ) -> Result<ViterbiSurvivors>
    where
        F: Fn(usize, &Z) -> f64,
    {
        let mut metrics = match initial_metrics {
            Some(m) if m.len() != self.num_states() => {
                return Err(Error::Length {
                    expected: self.num_states(),
                    actual: m.len(),
                })
            }
            Some(m) => m.to_vec(),
            None => vec![0.0; self.num_states()],
        };
        let mut choices = Vec::with_capacity(observed.len());
        for z in observed {
            let (next, step) = self.survivors_step(&metrics, z, &metric);
            metrics = next;
            choices.push(step);
        }
        Ok(ViterbiSurvivors {
            choices,
            final_metrics: metrics,
        })
    }

    /// Streaming Viterbi: for each observation, emits the input decided
    /// `memory.traceback_length()` steps earlier on the best survivor.
    pub fn viterbi_streaming<Z, F>(
        &self,
        observed: &[Z],
        metric: F,
        memory: &mut MetricMemory,
    ) -> Result<Vec<usize>>
    where
        F: Fn(usize, &Z) -> f64,
    {
        if memory.metrics.len() != self.num_states() {
            return Err(Error::InvalidParameter(format!(
                "metric memory holds {} states, machine has {}",
                memory.metrics.len(),
                self.num_states()
            )));
        }
        let mut decided = Vec::with_capacity(observed.len());
        for z in observed {
            let (mut next, choices) = self.survivors_step(&memory.metrics, z, &metric);
            let mut paths = Vec::with_capacity(choices.len());
            let mut popped = Vec::with_capacity(choices.len());
            for choice in &choices {
                match *choice {
                    Some((s0, x)) => {
                        let mut path = memory.paths[s0].clone();
                        path.push_back(x);
                        popped.push(path.pop_front().unwrap_or(0));
                        paths.push(path);
                    }
                    None => {
                        paths.push(VecDeque::from(vec![0; memory.traceback]));
                        popped.push(0);
                    }
                }
            }
            let best = lowest_minimum(&next);
            decided.push(popped[best]);
            // Keep metrics bounded on long streams.
            let floor = next[best];
            if floor.is_finite() {
                next.iter_mut().for_each(|m| *m -= floor);
            }
            memory.metrics = next;
            memory.paths = paths;
            memory.steps += 1;
        }
        trace!(steps = memory.steps, "streaming Viterbi advanced");
        Ok(decided)
    }
}

fn lowest_minimum(metrics: &[f64]) -> usize {
    let mut best = 0;
    for (s, &m) in metrics.iter().enumerate() {
        if m < metrics[best] {
            best = s;
        }
    }
    best
}

/// Survivor decisions of a full-block Viterbi run.
#[derive(Debug, Clone)]
pub struct ViterbiSurvivors {
    choices: Vec<Vec<Option<(usize, usize)>>>,
    final_metrics: Vec<f64>,
}

impl ViterbiSurvivors {
    /// Number of trellis steps.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Returns true for an empty observation.
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Accumulated metric of the survivor ending in each state
    /// (infinity when the state is unreachable).
    pub fn final_metrics(&self) -> &[f64] {
        &self.final_metrics
    }

    /// The lowest-indexed state with minimum final metric.
    pub fn best_state(&self) -> usize {
        lowest_minimum(&self.final_metrics)
    }

    /// Input sequence of the survivor ending in `final_state`.
    pub fn input_sequence(&self, final_state: usize) -> Result<Vec<usize>> {
        if final_state >= self.final_metrics.len() || self.final_metrics[final_state] == f64::INFINITY {
            return Err(Error::InvalidParameter(format!(
                "state {} has no surviving path",
                final_state
            )));
        }
        let mut inputs = vec![0; self.choices.len()];
        let mut state = final_state;
        for (t, step) in self.choices.iter().enumerate().rev() {
            let (prev, x) = step[state].ok_or_else(|| {
                Error::InvalidParameter(format!("state {} has no surviving path", final_state))
            })?;
            inputs[t] = x;
            state = prev;
        }
        Ok(inputs)
    }

    /// State the survivor ending in `final_state` started from.
    pub fn initial_state(&self, final_state: usize) -> Result<usize> {
        let _ = self.input_sequence(final_state)?;
        let mut state = final_state;
        for step in self.choices.iter().rev() {
            if let Some((prev, _)) = step[state] {
                state = prev;
            }
        }
        Ok(state)
    }
}

/// Path memory of a streaming Viterbi session: one metric and one window of
/// the last τ inputs per state.
#[derive(Debug, Clone)]
pub struct MetricMemory {
    paths: Vec<VecDeque<usize>>,
    metrics: Vec<f64>,
    traceback: usize,
    steps: usize,
}

impl MetricMemory {
    /// Fresh memory with traceback length τ >= 1, starting in `initial_state`.
    pub fn new(num_states: usize, traceback: usize, initial_state: usize) -> Result<Self> {
        if traceback == 0 {
            return Err(Error::InvalidParameter("traceback length must be positive".into()));
        }
        if initial_state >= num_states {
            return Err(Error::InvalidParameter(format!(
                "initial state {} out of range 0..{}",
                initial_state, num_states
            )));
        }
        let mut metrics = vec![f64::INFINITY; num_states];
        metrics[initial_state] = 0.0;
        Ok(Self {
            paths: vec![VecDeque::from(vec![0; traceback]); num_states],
            metrics,
            traceback,
            steps: 0,
        })
    }

    /// Traceback length τ.
    pub fn traceback_length(&self) -> usize {
        self.traceback
    }

    /// Number of observations consumed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current metric of each state.
    pub fn metrics(&self) -> &[f64] {
        &self.metrics
    }

    /// Inputs still inside the window of the best survivor, oldest first:
    /// the last min(steps, τ) decisions that have not been emitted.
    pub fn pending(&self) -> Vec<usize> {
        let best = lowest_minimum(&self.metrics);
        let count = self.steps.min(self.traceback);
        self.paths[best].iter().skip(self.traceback - count).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_machine() -> FiniteStateMachine {
        FiniteStateMachine::new(
            vec![vec![0, 1], vec![2, 3], vec![0, 1], vec![2, 3]],
            vec![vec![0, 3], vec![1, 2], vec![3, 0], vec![2, 1]],
        )
        .unwrap()
    }

    fn hamming_metric(y: usize, z: &usize) -> f64 {
        f64::from((y ^ *z).count_ones())
    }

    #[test]
    fn test_tables_and_edges() {
        let fsm = example_machine();
        assert_eq!(fsm.num_states(), 4);
        assert_eq!(fsm.num_input_symbols(), 2);
        assert_eq!(fsm.num_output_symbols(), 4);
        assert_eq!(fsm.input_edges()[0], vec![Some(0), Some(1), None, None]);
        assert_eq!(fsm.input_edges()[1], vec![None, None, Some(0), Some(1)]);
        assert_eq!(fsm.output_edges()[2], vec![Some(3), Some(0), None, None]);
        assert_eq!(fsm.next_state(1, 1).unwrap(), 3);
        assert_eq!(fsm.output(3, 0).unwrap(), 2);
        assert!(fsm.next_state(4, 0).is_err());
        assert!(fsm.output(0, 2).is_err());
    }

    #[test]
    fn test_process() {
        let fsm = example_machine();
        let (outputs, final_state) = fsm.process(&[1, 1, 0, 1, 0], 0).unwrap();
        assert_eq!(outputs, vec![3, 2, 2, 0, 1]);
        assert_eq!(final_state, 2);
        assert!(fsm.process(&[0, 2], 0).is_err());
    }

    #[test]
    fn test_invalid_tables() {
        assert!(FiniteStateMachine::new(vec![], vec![]).is_err());
        assert!(FiniteStateMachine::new(vec![vec![0, 2]], vec![vec![0, 0]]).is_err());
        assert!(FiniteStateMachine::new(vec![vec![0, 0], vec![1]], vec![vec![0, 0], vec![0]]).is_err());
        assert!(FiniteStateMachine::new(vec![vec![0]], vec![vec![0], vec![0]]).is_err());
    }

    #[test]
    fn test_parallel_edges_keep_lowest_input() {
        let fsm = FiniteStateMachine::new(vec![vec![0, 0]], vec![vec![1, 0]]).unwrap();
        assert_eq!(fsm.input_edges()[0][0], Some(0));
        assert_eq!(fsm.output_edges()[0][0], Some(1));
    }

    #[test]
    fn test_viterbi_recovers_inputs() {
        let fsm = example_machine();
        let inputs = [1, 1, 0, 1, 0, 0, 1];
        let (mut observed, _) = fsm.process(&inputs, 0).unwrap();
        observed[3] ^= 1;
        let initial = [0.0, f64::INFINITY, f64::INFINITY, f64::INFINITY];
        let survivors = fsm.viterbi(&observed, hamming_metric, Some(&initial)).unwrap();
        assert_eq!(survivors.len(), inputs.len());
        let best = survivors.best_state();
        assert_eq!(survivors.final_metrics()[best], 1.0);
        assert_eq!(survivors.input_sequence(best).unwrap(), inputs.to_vec());
        assert_eq!(survivors.initial_state(best).unwrap(), 0);
        assert!(fsm.viterbi(&observed, hamming_metric, Some(&[0.0])).is_err());
    }

    #[test]
    fn test_viterbi_tie_keeps_first_candidate() {
        // Two states, every edge has cost zero: the survivor into each state
        // must come from state 0 with the lowest input that reaches it.
        let fsm = FiniteStateMachine::new(vec![vec![0, 1], vec![0, 1]], vec![vec![0, 0], vec![0, 0]])
            .unwrap();
        let survivors = fsm.viterbi(&[0usize, 0, 0], hamming_metric, None).unwrap();
        assert_eq!(survivors.best_state(), 0);
        assert_eq!(survivors.input_sequence(0).unwrap(), vec![0, 0, 0]);
        assert_eq!(survivors.input_sequence(1).unwrap(), vec![0, 0, 1]);
        assert_eq!(survivors.initial_state(1).unwrap(), 0);
    }

    #[test]
    fn test_unreachable_state_has_no_path() {
        let fsm = example_machine();
        let initial = [0.0, f64::INFINITY, f64::INFINITY, f64::INFINITY];
        let survivors = fsm.viterbi(&[0usize], hamming_metric, Some(&initial)).unwrap();
        assert!(survivors.input_sequence(2).is_err());
        assert!(survivors.input_sequence(9).is_err());
    }

    #[test]
    fn test_streaming_delay() {
        let fsm = example_machine();
        let inputs = [1, 0, 1, 1, 0, 1, 0, 0];
        let (observed, _) = fsm.process(&inputs, 0).unwrap();
        let mut memory = MetricMemory::new(4, 3, 0).unwrap();
        let decided = fsm.viterbi_streaming(&observed, hamming_metric, &mut memory).unwrap();
        assert_eq!(decided[..3], [0, 0, 0]);
        assert_eq!(decided[3..], inputs[..5]);
        assert_eq!(memory.steps(), 8);
        assert_eq!(memory.pending(), inputs[5..].to_vec());
        assert!(MetricMemory::new(4, 0, 0).is_err());
        assert!(MetricMemory::new(4, 3, 4).is_err());
        let mut wrong = MetricMemory::new(2, 3, 0).unwrap();
        assert!(fsm.viterbi_streaming(&observed, hamming_metric, &mut wrong).is_err());
    }
}

use crate::classifier::error::{ClassifierError, ClassifierResult};
use crate::classifier::rules::RuleSet;
use crate::classifier::types::{Lane, Output};
use crate::packet::Packet;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Maps a packet to one of a fixed set of outputs
pub trait Classifier: Send + Sync {
    /// Destination of every output index this classifier can return
    fn outputs(&self) -> &[Output];

    fn classify(&self, packet: &Packet) -> usize;

    fn name(&self) -> &'static str;
}

const SEPARATOR_OUTPUTS: [Output; 2] = [Output::Observed(Lane::First), Output::Observed(Lane::Second)];

/// Binary accept/reject against the rule set. Accepted packets stay on the
/// first lane, rejected ones are separated onto the second.
pub struct Separator {
    rules: Arc<RuleSet>,
}

impl Separator {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }
}

impl Classifier for Separator {
    fn outputs(&self) -> &[Output] {
        &SEPARATOR_OUTPUTS
    }

    fn classify(&self, packet: &Packet) -> usize {
        if self.rules.permit(packet) {
            0
        } else {
            1
        }
    }

    fn name(&self) -> &'static str {
        "separator"
    }
}

/// N-way split on the rule set's output index. Output 0 is a sink, outputs 1
/// and 2 are the observed lanes, anything past that is drained as well.
pub struct Splitter {
    rules: Arc<RuleSet>,
    outputs: Vec<Output>,
}

impl Splitter {
    pub const MIN_OUTPUTS: usize = 3;

    pub fn new(rules: Arc<RuleSet>, output_count: usize) -> ClassifierResult<Self> {
        if output_count < Self::MIN_OUTPUTS {
            return Err(ClassifierError::TooFewOutputs {
                min: Self::MIN_OUTPUTS,
                requested: output_count,
            });
        }

        let outputs = (0..output_count)
            .map(|idx| match idx {
                1 => Output::Observed(Lane::First),
                2 => Output::Observed(Lane::Second),
                _ => Output::Sink,
            })
            .collect();

        Ok(Self { rules, outputs })
    }
}

impl Classifier for Splitter {
    fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    fn classify(&self, packet: &Packet) -> usize {
        self.rules.output(packet)
    }

    fn name(&self) -> &'static str {
        "splitter"
    }
}

/// Content-independent weighted random split between the two lanes
pub struct Partitioner {
    first: u64,
    second: u64,
    rng: Mutex<StdRng>,
}

impl Partitioner {
    pub fn new(first: u32, second: u32, seed: Option<u64>) -> ClassifierResult<Self> {
        if first == 0 && second == 0 {
            return Err(ClassifierError::InvalidWeights);
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            first: first as u64,
            second: second as u64,
            rng: Mutex::new(rng),
        })
    }

    /// Probability of a packet landing on the first lane
    pub fn first_share(&self) -> f64 {
        self.first as f64 / (self.first + self.second) as f64
    }
}

impl Classifier for Partitioner {
    fn outputs(&self) -> &[Output] {
        &SEPARATOR_OUTPUTS
    }

    fn classify(&self, _packet: &Packet) -> usize {
        let draw = self.rng.lock().gen_range(0..self.first + self.second);
        if draw < self.first {
            0
        } else {
            1
        }
    }

    fn name(&self) -> &'static str {
        "partitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(text: &str) -> Arc<RuleSet> {
        Arc::new(text.parse().unwrap())
    }

    fn tagged(tag: u16) -> Packet {
        let mut pkt = Packet::new_ipv4_udp(16).unwrap();
        pkt.set_tag(tag);
        pkt
    }

    #[test]
    fn test_separator() {
        let sep = Separator::new(rules("ANY ANY udp ANY 111 Accept\nANY ANY ANY ANY ANY Reject"));

        assert_eq!(sep.outputs().len(), 2);
        assert_eq!(sep.outputs()[sep.classify(&tagged(111))], Output::Observed(Lane::First));
        assert_eq!(sep.outputs()[sep.classify(&tagged(222))], Output::Observed(Lane::Second));
        assert_eq!(sep.outputs()[sep.classify(&tagged(333))], Output::Observed(Lane::Second));
    }

    #[test]
    fn test_splitter_layout() {
        let split = Splitter::new(rules("ANY ANY udp ANY 111 1\nANY ANY udp ANY 222 2"), 4).unwrap();

        assert_eq!(
            split.outputs(),
            &[
                Output::Sink,
                Output::Observed(Lane::First),
                Output::Observed(Lane::Second),
                Output::Sink
            ]
        );
        assert_eq!(split.classify(&tagged(111)), 1);
        assert_eq!(split.classify(&tagged(222)), 2);
        assert_eq!(split.classify(&tagged(333)), 0);
    }

    #[test]
    fn test_splitter_too_few_outputs() {
        let result = Splitter::new(rules("ANY ANY ANY ANY ANY 1"), 2);
        assert!(matches!(
            result,
            Err(ClassifierError::TooFewOutputs { min: 3, requested: 2 })
        ));
    }

    #[test]
    fn test_partitioner_ratio() {
        let part = Partitioner::new(100, 1000, Some(7)).unwrap();
        let pkt = tagged(111);

        let total = 110_000;
        let first = (0..total).filter(|_| part.classify(&pkt) == 0).count();
        let share = first as f64 / total as f64;

        // 100/1100 = 9.09%; sigma at this volume is under 0.1%
        assert!((share - part.first_share()).abs() < 0.005, "share {share}");
    }

    #[test]
    fn test_partitioner_degenerate_weights() {
        let all_first = Partitioner::new(5, 0, Some(1)).unwrap();
        let pkt = tagged(111);
        assert!((0..1000).all(|_| all_first.classify(&pkt) == 0));

        assert!(matches!(
            Partitioner::new(0, 0, None),
            Err(ClassifierError::InvalidWeights)
        ));
    }

    #[test]
    fn test_partitioner_seed_is_reproducible() {
        let a = Partitioner::new(100, 1000, Some(42)).unwrap();
        let b = Partitioner::new(100, 1000, Some(42)).unwrap();
        let pkt = tagged(111);

        let seq_a: Vec<usize> = (0..200).map(|_| a.classify(&pkt)).collect();
        let seq_b: Vec<usize> = (0..200).map(|_| b.classify(&pkt)).collect();
        assert_eq!(seq_a, seq_b);
    }
}

//! Replays recorded interactions from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// One port/method stream and which of its interactions were served.
#[derive(Debug, Default)]
struct Queue {
    interactions: Vec<Interaction>,
    served: Vec<bool>,
}

/// Replays interactions from a loaded cassette, per port/method pair.
///
/// Interactions can be served in recorded order ([`next_interaction`]) or
/// by input ([`take_matching`]); the latter lets concurrent callers replay
/// correctly even when their requests complete in a different order than
/// during recording. Each interaction is served at most once.
///
/// [`next_interaction`]: Self::next_interaction
/// [`take_matching`]: Self::take_matching
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Queue>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Queue> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            let queue = queues.entry(key).or_default();
            queue.interactions.push(interaction.clone());
            queue.served.push(false);
        }
        Self { queues }
    }

    /// Return the next unserved interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no (more) interactions for the given
    /// port/method combination, naming what was requested and what the
    /// cassette does contain.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> &Interaction {
        let available = self.available_pairs();
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        let Some(queue) = self.queues.get_mut(&key) else {
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{available}]"
            );
        };

        let Some(index) = queue.served.iter().position(|served| !served) else {
            panic!(
                "Cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
                 have been consumed. Last interaction was seq={last_seq}.",
                count = queue.interactions.len(),
                last_seq = queue.interactions.last().map_or(0, |i| i.seq),
            );
        };
        queue.served[index] = true;
        &queue.interactions[index]
    }

    /// Serves the first unserved interaction whose input satisfies `matches`.
    ///
    /// Returns `None` when nothing matches, leaving the decision of how to
    /// fail to the caller.
    pub fn take_matching(
        &mut self,
        port: &str,
        method: &str,
        matches: impl Fn(&serde_json::Value) -> bool,
    ) -> Option<&Interaction> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        let queue = self.queues.get_mut(&key)?;
        let index = queue
            .interactions
            .iter()
            .zip(&queue.served)
            .position(|(interaction, served)| !served && matches(&interaction.input))?;
        queue.served[index] = true;
        Some(&queue.interactions[index])
    }

    /// Number of interactions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.values().map(|q| q.served.iter().filter(|served| !**served).count()).sum()
    }

    fn available_pairs(&self) -> String {
        let mut pairs: Vec<String> =
            self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
        pairs.sort();
        pairs.join(", ")
    }
}

//! Queue family: one translator, one simulated state machine per variant.
//!
//! | variant | state | module |
//! |---|---|---|
//! | linear | growable list | [`linear`] |
//! | circular | fixed ring buffer, `head`/`tail` = -1 when empty | [`circular`] |
//! | priority | binary min-heap, FIFO among equal priorities | [`priority`] |
//! | double-ended priority | ordered list | [`double_priority`] |
//! | deque, circular deque, restricted deques | double-ended list | [`deque`] |
//! | k-queues | k FIFO lists sharing one capacity | [`kqueues`] |

pub mod circular;
pub mod deque;
pub mod double_priority;
pub mod kqueues;
pub mod linear;
pub mod priority;

use algomap_core::{Concept, QueueKind, Translation};

use crate::error::TranslateError;
use crate::translator::Translator;

/// Default capacity for ring buffers with no capacity hint.
pub const DEFAULT_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct QueueTranslator {
    kind: QueueKind,
}

impl QueueTranslator {
    pub fn new(kind: QueueKind) -> Self {
        Self { kind }
    }
}

impl Translator for QueueTranslator {
    fn name(&self) -> &'static str {
        "queue"
    }

    fn simulate(&self, code: &str, _concept: &Concept) -> Result<Translation, TranslateError> {
        let translation = match self.kind {
            QueueKind::Linear => linear::simulate(code),
            QueueKind::Circular => circular::simulate(code),
            QueueKind::Priority => priority::simulate(code),
            QueueKind::DoublePriority => double_priority::simulate(code),
            QueueKind::Deque
            | QueueKind::CircularDeque
            | QueueKind::InputRestrictedDeque
            | QueueKind::OutputRestrictedDeque => deque::simulate(code, self.kind),
            QueueKind::KQueues => kqueues::simulate(code),
        };
        Ok(translation)
    }
}

/// Receiver and operand of a single-value insertion call:
/// `q.enqueue(x)`, `enqueue(x)` or `enqueue(q, x)`.
pub(crate) fn insert_operands<'a>(
    call: &crate::extract::Call<'a>,
) -> Option<(Option<&'a str>, &'a str)> {
    match (call.receiver, call.args.as_slice()) {
        (Some(r), [x]) => Some((Some(r), *x)),
        (None, [x]) => Some((None, *x)),
        (None, [q, x]) => Some((Some(*q), *x)),
        _ => None,
    }
}

/// Receiver of a zero-operand call: `q.dequeue()`, `dequeue()` or `dequeue(q)`.
pub(crate) fn nullary_receiver<'a>(call: &crate::extract::Call<'a>) -> Option<Option<&'a str>> {
    match (call.receiver, call.args.as_slice()) {
        (Some(r), []) => Some(Some(r)),
        (None, []) => Some(None),
        (None, [q]) => Some(Some(*q)),
        _ => None,
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use cortex::{Channel, Cortex, Enumerated, Pipe, Signal, SignalCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ProbeSign {
    Start,
    Stop,
    Pass,
    Fail,
    Retry,
    Skip,
    Abort,
}

impl Enumerated for ProbeSign {
    const COUNT: usize = 7;

    fn ordinal(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Perspective {
    Emit,
    Receipt,
    Observe,
}

impl Enumerated for Perspective {
    const COUNT: usize = 3;

    fn ordinal(self) -> usize {
        self as usize
    }
}

const ALL_SIGNS: [ProbeSign; 7] = [
    ProbeSign::Start,
    ProbeSign::Stop,
    ProbeSign::Pass,
    ProbeSign::Fail,
    ProbeSign::Retry,
    ProbeSign::Skip,
    ProbeSign::Abort,
];

const ALL_PERSPECTIVES: [Perspective; 3] = [
    Perspective::Emit,
    Perspective::Receipt,
    Perspective::Observe,
];

#[test]
fn test_cache_is_canonical_and_reference_stable() {
    let cache: SignalCache<ProbeSign, Perspective> = SignalCache::new();

    // First pass materializes 21 canonical instances.
    let mut first_pass = Vec::new();
    for sign in ALL_SIGNS {
        for perspective in ALL_PERSPECTIVES {
            first_pass.push(cache.get(sign, perspective));
        }
    }

    let distinct: HashSet<usize> = first_pass
        .iter()
        .map(|signal| Arc::as_ptr(signal) as usize)
        .collect();
    assert_eq!(distinct.len(), 21, "7 signs x 3 dimensions = 21 instances");

    // Second pass returns the identical allocations.
    let mut index = 0;
    for sign in ALL_SIGNS {
        for perspective in ALL_PERSPECTIVES {
            let again = cache.get(sign, perspective);
            assert!(
                Arc::ptr_eq(&first_pass[index], &again),
                "repeated lookup of ({sign:?},{perspective:?}) must be identity-equal"
            );
            index += 1;
        }
    }
}

#[test]
fn test_signal_exposes_its_pair() {
    let cache: SignalCache<ProbeSign, Perspective> = SignalCache::new();
    let signal = cache.get(ProbeSign::Retry, Perspective::Receipt);
    assert_eq!(signal.sign(), ProbeSign::Retry);
    assert_eq!(signal.dimension(), Perspective::Receipt);
}

// Dual-perspective vocabulary: an 8-sign x 2-dimension instrument with a
// generic signal() method, emitting canonical composites through a conduit.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum QueueSign {
    Enqueue,
    Dequeue,
    Peek,
    Drop,
    Overflow,
    Underflow,
    Purge,
    Requeue,
}

impl Enumerated for QueueSign {
    const COUNT: usize = 8;

    fn ordinal(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum End {
    Producer,
    Consumer,
}

impl Enumerated for End {
    const COUNT: usize = 2;

    fn ordinal(self) -> usize {
        self as usize
    }
}

#[derive(Clone)]
struct QueueMonitor {
    pipe: Pipe<Arc<Signal<QueueSign, End>>>,
    signals: Arc<SignalCache<QueueSign, End>>,
}

impl QueueMonitor {
    fn composer(channel: Channel<Arc<Signal<QueueSign, End>>>) -> QueueMonitor {
        QueueMonitor {
            pipe: channel.pipe(),
            signals: Arc::new(SignalCache::new()),
        }
    }

    fn signal(&self, sign: QueueSign, end: End) {
        self.pipe.emit(self.signals.get(sign, end));
    }
}

const ALL_QUEUE_SIGNS: [QueueSign; 8] = [
    QueueSign::Enqueue,
    QueueSign::Dequeue,
    QueueSign::Peek,
    QueueSign::Drop,
    QueueSign::Overflow,
    QueueSign::Underflow,
    QueueSign::Purge,
    QueueSign::Requeue,
];

#[tokio::test]
async fn test_full_cartesian_emission_round_trip() {
    let cortex = Cortex::new();
    let circuit = cortex.circuit();
    let conduit = circuit.conduit(QueueMonitor::composer);
    let reservoir = cortex.reservoir(&conduit);

    let monitor = conduit.percept(&cortex.name("queues.jobs").unwrap()).unwrap();
    for sign in ALL_QUEUE_SIGNS {
        for end in [End::Producer, End::Consumer] {
            monitor.signal(sign, end);
        }
    }
    circuit.quiesce().await;

    let captures = reservoir.drain();
    assert_eq!(captures.len(), 16, "8 signs x 2 dimensions, all emitted");

    let pairs: Vec<(QueueSign, End)> = captures
        .iter()
        .map(|c| (c.emission().sign(), c.emission().dimension()))
        .collect();
    let mut expected = Vec::new();
    for sign in ALL_QUEUE_SIGNS {
        for end in [End::Producer, End::Consumer] {
            expected.push((sign, end));
        }
    }
    assert_eq!(pairs, expected, "call order survives end to end");

    let distinct: HashSet<(QueueSign, End)> = pairs.into_iter().collect();
    assert_eq!(distinct.len(), 16, "all 16 pairs are distinct");
}

#[tokio::test]
async fn test_repeated_emission_reuses_canonical_instances() {
    let cortex = Cortex::new();
    let circuit = cortex.circuit();
    let conduit = circuit.conduit(QueueMonitor::composer);
    let reservoir = cortex.reservoir(&conduit);

    let monitor = conduit.percept(&cortex.name("queues.retry").unwrap()).unwrap();
    monitor.signal(QueueSign::Enqueue, End::Producer);
    monitor.signal(QueueSign::Enqueue, End::Producer);
    circuit.quiesce().await;

    let captures = reservoir.drain();
    assert_eq!(captures.len(), 2);
    assert!(
        Arc::ptr_eq(captures[0].emission(), captures[1].emission()),
        "repeated emission of one pair must be identity-equal"
    );
}

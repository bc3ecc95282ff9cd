use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cortex::{Channel, Cortex, Pipe};

#[derive(Clone)]
struct Tagged {
    id: usize,
    pipe: Pipe<i64>,
}

#[tokio::test]
async fn test_percept_is_memoized_per_name() {
    let built = Arc::new(AtomicUsize::new(0));
    let built_in_composer = built.clone();

    let cortex = Cortex::new();
    let circuit = cortex.circuit();
    let conduit = circuit.conduit(move |channel: Channel<i64>| Tagged {
        id: built_in_composer.fetch_add(1, Ordering::SeqCst),
        pipe: channel.pipe(),
    });

    let name = cortex.name("svc.alpha").unwrap();
    let first = conduit.percept(&name).unwrap();
    let second = conduit.percept(&name).unwrap();

    assert_eq!(first.id, second.id, "same subject, same instrument");
    assert_eq!(built.load(Ordering::SeqCst), 1, "composer ran exactly once");

    // A different subject gets its own instrument.
    let other = conduit.percept(&cortex.name("svc.beta").unwrap()).unwrap();
    assert_ne!(first.id, other.id);
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_converges() {
    let built = Arc::new(AtomicUsize::new(0));
    let built_in_composer = built.clone();

    let cortex = Cortex::new();
    let circuit = cortex.circuit();
    let conduit = circuit.conduit(move |channel: Channel<i64>| Tagged {
        id: built_in_composer.fetch_add(1, Ordering::SeqCst),
        pipe: channel.pipe(),
    });

    let name = cortex.name("svc.contended").unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let conduit = conduit.clone();
            let name = name.clone();
            std::thread::spawn(move || conduit.percept(&name).unwrap().id)
        })
        .collect();

    let ids: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(
        ids.iter().all(|id| *id == ids[0]),
        "all racers must see one instrument, got {ids:?}"
    );
    assert_eq!(
        built.load(Ordering::SeqCst),
        1,
        "composer must run at most once per name"
    );
}

#[tokio::test]
async fn test_instruments_share_one_delivery_stream() {
    let cortex = Cortex::new();
    let circuit = cortex.circuit();
    let conduit = circuit.conduit(|channel: Channel<i64>| channel.pipe());
    let reservoir = cortex.reservoir(&conduit);

    let a = conduit.percept(&cortex.name("stream.a").unwrap()).unwrap();
    let b = conduit.percept(&cortex.name("stream.b").unwrap()).unwrap();

    a.emit(1);
    b.emit(2);
    a.emit(3);
    circuit.quiesce().await;

    let captures = reservoir.drain();
    let seen: Vec<(String, i64)> = captures
        .iter()
        .map(|c| (c.subject().path(), *c.emission()))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("stream.a".to_string(), 1),
            ("stream.b".to_string(), 2),
            ("stream.a".to_string(), 3),
        ]
    );
}

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use cortex::{Channel, Cortex, Pipe};

/// Demo vocabulary: a closed set of service interaction signs. Vocabularies
/// are pure consumers of the substrate — each method is one `emit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
enum Sign {
    Ask,
    Explain,
    Affirm,
    Acknowledge,
}

#[derive(Clone)]
struct Service {
    pipe: Pipe<Sign>,
}

impl Service {
    fn composer(channel: Channel<Sign>) -> Service {
        Service {
            pipe: channel.pipe(),
        }
    }

    fn ask(&self) {
        self.pipe.emit(Sign::Ask);
    }

    fn explain(&self) {
        self.pipe.emit(Sign::Explain);
    }

    fn affirm(&self) {
        self.pipe.emit(Sign::Affirm);
    }

    fn acknowledge(&self) {
        self.pipe.emit(Sign::Acknowledge);
    }
}

struct DemoConfig {
    rounds: usize,
}

impl DemoConfig {
    fn from_env() -> Self {
        let rounds = std::env::var("CORTEX_DEMO_ROUNDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        Self { rounds }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    tracing::info!("Cortex demo booting...");

    let config = DemoConfig::from_env();
    let cortex = Cortex::new();
    let scope = cortex.scope();

    let circuit = cortex.circuit();
    scope.register(Arc::new(circuit.clone()))?;

    let conduit = circuit.conduit(Service::composer);
    let reservoir = cortex.reservoir(&conduit);

    let gateway = conduit.percept(&cortex.name("demo.gateway")?)?;
    let backend = conduit.percept(&cortex.name("demo.backend")?)?;

    for _ in 0..config.rounds {
        gateway.ask();
        backend.explain();
        backend.affirm();
        gateway.acknowledge();
    }

    circuit.quiesce().await;

    // One JSON line per capture, in emission order.
    for capture in reservoir.drain() {
        println!("{}", serde_json::to_string(&capture)?);
    }

    scope.close()?;
    tracing::info!("Cortex demo done.");
    Ok(())
}

pub mod circuit;
pub mod conduit;
pub mod cortex;
pub mod error;
pub mod flow;
pub mod name;
pub mod pipe;
pub mod reservoir;
pub mod scope;
pub mod signal;
pub mod state;

// Re-export the surface vocabularies and tests consume directly
pub use circuit::Circuit;
pub use conduit::Conduit;
pub use cortex::Cortex;
pub use error::{CloseError, ConduitError, NameError, ScopeError};
pub use flow::Flow;
pub use name::Name;
pub use pipe::{Channel, Pipe};
pub use reservoir::{Capture, Reservoir};
pub use scope::{Closeable, Closure, Scope};
pub use signal::{Enumerated, Signal, SignalCache};
pub use state::{Slot, SlotValue, State};

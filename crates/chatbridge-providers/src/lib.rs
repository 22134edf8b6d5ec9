//! chatbridge providers - the backend side of the adapter.
//!
//! Everything that generates text sits behind [`BackendInvoker`]:
//! - [`StubGenerator`]: deterministic, no network. Useful for wiring checks.
//! - [`LiveBackend`]: calls the Puter driver API over HTTP.
//!
//! The adapter picks one at construction time and never looks past the trait.

mod error;
mod live;
mod response_handling;
mod stub;
mod traits;

pub use error::ProviderError;
pub use live::{LiveBackend, LiveBackendConfig, PromptMode, DEFAULT_BASE_URL};
pub use secrecy::SecretString;
pub use stub::StubGenerator;
pub use traits::{BackendInvoker, BackendReply, BackendRequest, ProviderResult};

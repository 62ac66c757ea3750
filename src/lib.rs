//! Client for the storefront data-exchange protocol: imports a catalog into
//! a remote exchange endpoint and fetches pending orders from it, so the
//! exchange can be checked before going live.

pub mod archive;
pub mod config;
pub mod endpoint;
mod errors;
pub mod phases;
pub mod pretty;
pub mod protocol;
pub mod response;
pub mod session;

pub use archive::PackedCatalog;
pub use config::{Credentials, ExchangeConfig, PollGuard};
pub use endpoint::{normalize_endpoint, resolve_catalog};
pub use errors::{ExchangeError, Result};
pub use phases::{sequence, Phase};
pub use pretty::format_xml;
pub use protocol::{Negotiated, ProtocolVersion};
pub use response::{Reply, Step};
pub use session::{ExchangeSession, ExchangeType};

//! Capabilities domain.
//!
//! The processing logic behind tool routes: the [`Capability`] contract, the
//! slug-keyed [`CapabilityTable`] and the built-in tools.

mod capability;
pub mod definitions;
mod error;
mod table;

pub use capability::{Capability, CapabilityOutput, CapabilityRequest, FnCapability};
pub use error::CapabilityError;
pub use table::CapabilityTable;

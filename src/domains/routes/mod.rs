//! Routes domain.
//!
//! Turns every routable plugin into a POST endpoint at
//! `/api/{category}/{slug}` and runs the per-request upload lifecycle.

mod composer;
mod dispatch;
mod error;

pub use composer::{RouteBinding, RouteComposer};
pub use dispatch::{RouteContext, collect_options};
pub use error::RouteError;

//! Domains module containing business logic organized by bounded contexts.
//!
//! - `plugins` - discovery, locale resolution and the immutable registry
//! - `catalog` - read-only catalog API over the registry
//! - `uploads` - upload disciplines, staging and multipart intake
//! - `capabilities` - processing logic behind tool routes
//! - `routes` - composition of one POST route per routable tool

pub mod capabilities;
pub mod catalog;
pub mod plugins;
pub mod routes;
pub mod uploads;

//! Mapforge compiler backend.
//!
//! The pipeline is:
//! 1. Analyzed [`crate::mapping::Map`] → [`lower`] → runtime expression trees and residual statements
//! 2. [`staging`] arranges the trees into the Params/Vars/Final stages of a [`mapforge_runtime::MapPlan`]
//! 3. [`emit`] writes structs and `{T}Mapper` containers as formatted Rust source
//!
//! ## Module Organization
//!
//! - `lower.rs` - Syntax → translatable trees, SM0005/SM0006 diagnostics
//! - `staging.rs` - Stage records, lambdas and degenerate-factory merging
//! - `emit.rs` - Rust emission (`quote!` → `syn` → `prettyplease`)
//! - `errors.rs` - Emission errors

pub mod emit;
mod errors;
pub mod lower;
pub mod staging;

pub use emit::{EmissionContext, EmitOptions, MapUnit, Origin, emit};
pub use errors::EmitError;
pub use staging::plan_map;

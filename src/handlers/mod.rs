//! Route handlers
//!
//! Thin I/O wrappers behind the admission layer: the upstream data proxy
//! routes, the shared card counter, and the asset image proxy. Admission
//! decisions never reach this layer; a handler only runs for a wholly
//! admitted request.

pub mod count;
pub mod image_proxy;
pub mod roster;
pub mod teams;

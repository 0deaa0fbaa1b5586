//! In-process handlers.
//!
//! # Flow
//!
//! ```text
//! Plugin::install ──► HandlerRegistry::register(event, handler)
//!                              │
//! Dispatcher ──► HandlerRegistry::dispatch(session)
//!                              │
//!                  handler.handle(session) in registration order
//!                              │
//!                  Continue → next    Abort / Err → stop, reject event
//! ```

mod action;
mod error;
mod handler;
mod registry;

pub use action::HookAction;
pub use error::HookError;
pub use handler::{FnHandler, Handler};
pub use registry::HandlerRegistry;

#[cfg(test)]
pub use handler::testing;

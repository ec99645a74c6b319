//! Participant sessions for the dodge server.
//!
//! A [`Session`] is one connected participant: identity, kinematics,
//! match status, knockback window and an outbox to its connection. The
//! [`SessionRegistry`] holds them all and answers the counting questions
//! the match state machine keeps asking (how many active, alive, ready).
//!
//! # How it fits in the stack
//!
//! ```text
//! Simulation (above)  ← mutates sessions every step, under the world lock
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol (below)  ← provides PlayerId
//! ```

mod color;
mod error;
mod registry;
mod session;

pub use color::Rgb;
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{
    InputState, Knockback, Outbound, Outbox, Session, DEFAULT_NAME,
    MAX_NAME_CHARS,
};

//! Data models for the club administration backend.
//!
//! Field names serialize as camelCase to match the admin frontend.

mod contact;
mod event;
mod mailing;
mod meeting;
mod motion;
mod overview;
mod website;

pub use contact::*;
pub use event::*;
pub use mailing::*;
pub use meeting::*;
pub use motion::*;
pub use overview::*;
pub use website::*;

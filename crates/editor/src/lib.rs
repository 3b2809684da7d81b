//! Editor session and pointer interaction controller.
//!
//! All pointer handling is a state machine over [`Interaction`]: every
//! transition happens in one of the `pointer_*` methods, so there is a
//! single place to audit what each tool does on down, move, and up.

pub mod controller;
pub mod session;
pub mod text;

pub use controller::{Interaction, PanDelta, PointerButton};
pub use session::{EditorConfig, EditorSession, Tool};
pub use text::{RewriteError, TextRewriter};

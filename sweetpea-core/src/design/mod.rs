//! The data model of an experimental design: [`Factor`]s made of [`Level`]s, where derived levels
//! carry the [`Window`] that determines when they hold.
//!
//! # Example
//! ```
//! # use sweetpea_core::design::Factor;
//! # use sweetpea_core::design::Level;
//! # use sweetpea_core::design::Window;
//! let color = Factor::new("color", ["red", "blue"]);
//! let text = Factor::new("text", ["red", "blue"]);
//!
//! let congruence = Factor::new(
//!     "congruent?",
//!     [
//!         Level::derived(
//!             "con",
//!             Window::within_trial(|names| names[0] == names[1], [color.clone(), text.clone()]),
//!         ),
//!         Level::derived(
//!             "inc",
//!             Window::within_trial(|names| names[0] != names[1], [color.clone(), text.clone()]),
//!         ),
//!     ],
//! );
//!
//! assert!(congruence.is_derived());
//! assert!(!congruence.has_complex_window());
//! ```
mod factor;
mod level;
mod window;

pub use factor::*;
pub use level::*;
pub use window::*;

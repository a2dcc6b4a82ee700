//! Config-file template loading and effective-topology derivation.
//!
//! The [`Template`] is the immutable adjacency list declared by the config
//! file. [`build_effective_topology`] filters it down to the graph that is
//! actually live right now, given switch liveness and mutual neighbor
//! reports — the only input the shortest-path engine ever sees.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod effective;
mod error;
mod template;

pub use effective::{build_effective_topology, EffectiveTopology};
pub use error::ConfigError;
pub use template::{load_template_from_file, load_template_from_str, Template};

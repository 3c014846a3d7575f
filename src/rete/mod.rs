//! RETE algorithm core: pattern IR, working memory, alpha/beta networks,
//! terminals, and the conflict-resolution agenda.

pub mod agenda;
mod alpha;
mod beta;
pub(crate) mod network;
pub mod pattern;
pub mod rule;
pub mod wme;

pub use agenda::*;
pub use beta::Token;
pub use pattern::*;
pub use rule::*;
pub use wme::{FactId, MatchedFact};

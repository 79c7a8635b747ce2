//! Week batch generation
//!
//! [`WeekBatchRunner`] pre-generates a whole week and drives a
//! [`GenerationStatus`] through [`StatusTracker`]. Consumers subscribe or poll,
//! and downstream aggregation ([`build_shopping_list`]) only reads completed weeks.

pub mod runner;
pub mod shopping;
pub mod status;
pub mod tracker;

pub use runner::WeekBatchRunner;
pub use shopping::{build_shopping_list, ShoppingItem, ShoppingList};
pub use status::{GenerationStatus, StatusState, DAYS_PER_WEEK};
pub use tracker::{RunClaim, StatusSubscription, StatusTracker};

//! mealplan: personalized daily meal planning
//!
//! Menus are produced by a two-stage constrained generation pipeline (menu
//! decision, then recipe expansion) and served through a tiered cache: the
//! durable store first, fresh generation second, a local ephemeral copy last.
//! A day's meals are planned in parallel; whole weeks run as tracked batches.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod menu;
pub mod orchestrator;
pub mod preferences;
pub mod provider;
pub mod resolver;
pub mod store;
pub mod types;

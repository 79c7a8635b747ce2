//! Integration tests for the meal planning core

mod test_utils;

mod batch_status;
mod config_integration;
mod end_to_end;
mod generation_pipeline;
mod preference_hashing;
mod store_integration;
mod tiered_resolver;
mod week_batch;

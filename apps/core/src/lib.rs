pub mod action_executor;
pub mod action_registry;
pub mod config;
pub mod discovery;
pub mod expression;
pub mod field_capture;
pub mod index_store;
pub mod launch_config;
pub mod ledger;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod payload;
pub mod resolver;
pub mod selection;
pub mod sources;
pub mod tokenizer;

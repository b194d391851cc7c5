//! Porter core library: channel adapters, LLM provider management,
//! thread routing, and the agent gateway server.

pub mod agent;
pub mod channels;
pub mod config;
pub mod llm;
pub mod memory;
pub mod routing;
pub mod server;
pub mod services;
pub mod store;

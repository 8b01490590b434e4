//! ngk-buddy library: exchange client, session store, chat service and
//! the channels that drive them. `src/main.rs` wires them together.

pub mod chat;
pub mod comms;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod session;

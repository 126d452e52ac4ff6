//! Discord integration for todobot
//!
//! This crate turns chat-platform interactions into to-do store calls:
//! - **Commands** (`commands`) - `/ping`, `/add`, `/list`, `/done`, `/edit`, `/delete`
//! - **Events** (`events`) - Caller identity and the interaction dispatcher
//! - **Panels** (`blocks`) - List panels with the completed/pending toggle button
//! - **Gateway** (`gateway`) - Transport loop, reconnect policy, command registration
//!
//! # Architecture
//!
//! ```text
//! Gateway → EventDispatcher → CommandRouter → TodoRepository
//!                                  ↓
//!                   InteractionResponse (panel) → Gateway
//! ```
//!
//! # Key Types
//!
//! - `GatewayRunner` - Interaction loop with reconnection and command lifecycle
//! - `EventDispatcher` - Routes commands and button clicks to handlers
//! - `ResponseBuilder` - Constructs replies and list panels

pub mod blocks;
pub mod commands;
pub mod events;
pub mod gateway;

//! aiterm - natural language to shell commands.
//!
//! This library turns a request such as "list all files with sizes" into a
//! shell command through a chat completion API, then lets the user decide
//! what to do with it:
//!
//! - **Execute** it through the system shell
//! - **Copy** it to the clipboard, optionally pasting back an edited version
//! - **Resubmit** a new prompt, with or without the conversation so far
//!
//! # Architecture
//!
//! - [`config`] - Configuration management (API key, endpoint, sampling)
//! - [`http_client`] - HTTP transport abstraction
//! - [`decoder`] - Completion API wire format and response decoding
//! - [`error`] - Failure taxonomy shared by every layer
//! - [`conversation`] - Message log carried between requests
//! - [`provider`] - Completion providers behind the `CommandProvider` trait
//! - [`resolution`] - The interactive resolution loop
//! - [`command_menu`] - Menu rendering and terminal prompts
//! - [`executor`] - Shell execution of confirmed commands
//! - [`clipboard`] - OS clipboard access
//!
//! # Example
//!
//! ```ignore
//! use aiterm::provider::{OpenAiProvider, RequestParameters};
//! use aiterm::resolution::{Outcome, ResolutionLoop};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = OpenAiProvider::new(
//!         "https://api.openai.com/v1/chat/completions",
//!         std::env::var("OPENAI_KEY").unwrap_or_default(),
//!         RequestParameters::default(),
//!     )?;
//!
//!     let mut resolution = ResolutionLoop::new(provider, "list files", false);
//!     match resolution.run().await? {
//!         Outcome::Executed(result) => print!("{}", result.stdout),
//!         other => println!("{:?}", other),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Context
//!
//! Every request starts from a fixed system instruction. Resubmitting with
//! `r` keeps previous requests and answers in the log so a follow-up like
//! "now only directories" is understood; `w` starts over.

pub mod clipboard;
pub mod command_menu;
pub mod config;
pub mod conversation;
pub mod decoder;
pub mod error;
pub mod executor;
pub mod http_client;
pub mod provider;
pub mod resolution;

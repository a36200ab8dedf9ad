//! toolrelay: lets a function-calling model use the tools of a stdio
//! tool server.
//!
//! For every user message the [`Orchestrator`] fetches the tool catalog from
//! the server, offers it to the model, runs the one tool the model may ask
//! for, and returns the model's final text.
//!
//! ```rust,no_run
//! use relayconf::RelayConfig;
//! use toolrelay::Orchestrator;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = RelayConfig::load()?;
//! config.validate()?;
//!
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let reply = orchestrator.process_message("Say hello to Ann").await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
pub mod gemini;
pub mod model;
pub mod orchestrator;
pub mod translate;

pub use channel::{SpawnChannel, ToolChannel, DEFAULT_TOOL_TIMEOUT, REQUEST_ID};
pub use error::{ChannelError, ModelApiError, RelayError, ToolExecutionError};
pub use gemini::{
    Candidate, FunctionCall, FunctionDeclaration, FunctionResponse, Part, Role, Turn,
};
pub use model::{GeminiClient, ModelClient, ModelClientOptions, DEFAULT_MODEL_TIMEOUT};
pub use orchestrator::{Exchange, Orchestrator, Stage, NO_RESPONSE};
pub use translate::{extract_result_text, to_function_declarations, TOOL_SUCCESS_FALLBACK};

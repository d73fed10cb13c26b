//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - chat history turns, sent from the web UI to the agent
//! - gemini contents/tools, sent from the agent to the LLM
//! - response envelopes, sent from the agent back to the web UI
//!
//! We always immediately convert the wire formats into these internal structs using
//! the helpers in `providers::utils`, so the internal models are not an exact match
//! to any of them.
pub mod envelope;
pub mod message;
pub mod role;
pub mod tool;

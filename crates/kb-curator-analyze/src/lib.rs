//! Structured KB analysis over an isolated backend session

mod backend;
mod extract;
mod opencode;
mod pipeline;
mod prompt;
mod session;

pub use backend::{AnalysisBackend, AnalyzeError, PromptRequest};
pub use extract::{extract_structured, find_analysis_object, parse_assistant_text};
pub use opencode::OpencodeBackend;
pub use pipeline::{Curator, HookInvocation, Outcome};
pub use prompt::{
    build_analyzer_prompt, build_schema, ANALYZER_SESSION_TITLE, INTERNAL_TITLE_PREFIX,
};
pub use session::{run_structured_analysis, EphemeralSession};

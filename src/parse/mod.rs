//! Parsers for model responses and generated code.

mod code;
mod functions;
mod json;
mod selection;

pub use code::{dedent, parse_code, remove_main_guard};
pub use functions::{
    clean_docstring, function_sources, parse_function_comments, FunctionSource, FunctionSummary,
};
pub use json::{parse_ideas, parse_json_block, parse_subtasks, SubtaskDef};
pub use selection::parse_action_selection;

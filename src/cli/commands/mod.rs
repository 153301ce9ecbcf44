//! One module per tool.  Each exposes `execute(&Args)` for its binary and
//! a `run` function that takes its prompts and editor as parameters.

pub mod edit;
pub mod encrypt;
pub mod view;

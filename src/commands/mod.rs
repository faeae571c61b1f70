//! Command handling for ferrite-lens.
//!
//! Tokenizing of raw command lines, reply formatting, execution against a
//! client, and the catalog of known commands used for help and completion.

pub mod definitions;
pub mod executor;
pub mod format;
pub mod router;
pub mod tokenizer;

pub use definitions::{CommandCategory, CommandDef, COMMANDS};
pub use executor::{CommandExecutor, Execution, LineOutcome};
pub use format::{format_reply, OutputFormat};
pub use router::{Command, CommandRouter};
pub use tokenizer::{split_command, tokenize};

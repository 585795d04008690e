pub mod ast;
pub mod debug;
pub mod error;
pub mod functions;
pub mod interner;
pub mod object;
pub mod pool;
pub mod span;
pub mod symbols;
pub mod termination;
pub mod token;
pub mod value;

/// One-shot warmup of the process-wide state: the string interner (with its
/// pre-registered constant IDs) and the canonical shared values. Idempotent;
/// everything here also initializes lazily on first use.
pub fn warmup() {
    interner::global_interner();
    pool::static_null();
    pool::static_null_invisible();
    pool::static_logical(true);
    pool::static_logical(false);
}

pub use ast::*;
pub use error::*;
pub use functions::*;
pub use interner::*;
pub use object::*;
pub use pool::*;
pub use span::*;
pub use symbols::*;
pub use termination::*;
pub use token::*;
pub use value::*;

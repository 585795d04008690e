pub mod builtins;
pub mod defines;
pub mod interpreter;
pub mod operators;

pub use builtins::builtin_function_map;
pub use defines::define_constants_from_command_line;
pub use interpreter::Interpreter;

/// One-shot warmup: core process-wide state plus the cached built-in
/// function map. Idempotent.
pub fn warmup() {
    eidos_core::warmup();
    builtin_function_map();
}

use eidos_core::{termination, SymbolTable};
use eidos_interp::{builtin_function_map, define_constants_from_command_line, Interpreter};
use eidos_parser::Script;
use std::path::Path;

/// Run a script file in exit mode: any error prints its diagnostic (with a
/// caret excerpt when it carries a source position) and exits nonzero.
pub fn run_file(file: &Path, defines: &[String]) -> ! {
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("ERROR (run_file): could not read {}: {}", file.display(), err);
            std::process::exit(1);
        }
    };

    let intrinsic = SymbolTable::new_intrinsic();
    let variables = match SymbolTable::new_variables(intrinsic) {
        Ok(variables) => variables,
        Err(err) => termination::report_and_exit(&err, None),
    };

    if let Err(err) = define_constants_from_command_line(&variables, defines, None) {
        // Constant definitions carry no position in the script file.
        termination::report_and_exit(&err, None);
    }

    let mut script = Script::new(source);
    if let Err(err) = script.tokenize() {
        termination::report_and_exit(&err, Some(script.source()));
    }
    if let Err(err) = script.parse_interpreter_block() {
        termination::report_and_exit(&err, Some(script.source()));
    }

    let mut interpreter = Interpreter::new(&script, variables, builtin_function_map());
    match interpreter.evaluate_interpreter_block(true) {
        Ok(_) => {
            print!("{}", interpreter.execution_output());
            std::process::exit(0);
        }
        Err(err) => {
            print!("{}", interpreter.execution_output());
            termination::report_and_exit(&err, Some(script.source()));
        }
    }
}

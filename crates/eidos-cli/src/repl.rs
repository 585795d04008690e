use colored::Colorize;
use eidos_core::{ScopeRef, SymbolTable};
use eidos_interp::{builtin_function_map, define_constants_from_command_line, Interpreter};
use eidos_parser::Script;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub fn start_repl(defines: &[String]) -> anyhow::Result<()> {
    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(intrinsic)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    if let Err(err) = define_constants_from_command_line(&variables, defines, None) {
        eprintln!("{} {}", "✗".bright_red(), err);
        std::process::exit(1);
    }

    let mut rl = DefaultEditor::new()?;
    let mut line_number = 1;

    loop {
        let prompt = format!("eidos[{}]> ", line_number);

        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                rl.add_history_entry(&line)?;

                if line.starts_with(':') {
                    if handle_command(&line) {
                        break;
                    }
                    continue;
                }

                execute_line(&line, &variables);
                line_number += 1;
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn execute_line(line: &str, variables: &ScopeRef) {
    let mut script = Script::new(line);
    script.set_final_semicolon_optional(true);

    let parse_result = script.tokenize().and_then(|_| script.parse_interpreter_block());
    if let Err(err) = parse_result {
        println!("{} {}", "✗".bright_red(), err);
        return;
    }

    let mut interpreter = Interpreter::new(&script, variables.clone(), builtin_function_map());
    match interpreter.evaluate_interpreter_block(false) {
        Ok(value) => {
            print!("{}", interpreter.execution_output());
            if !value.is_invisible() {
                println!("{}", value);
            }
        }
        Err(err) => {
            print!("{}", interpreter.execution_output());
            println!("{} {}", "✗".bright_red(), err);
        }
    }
}

/// Returns true when the REPL should exit.
fn handle_command(command: &str) -> bool {
    let parts: Vec<&str> = command[1..].split_whitespace().collect();

    match parts.first().copied() {
        Some("help") => {
            println!("{}", "REPL Commands:".bright_cyan().bold());
            println!("  :help           Show this help");
            println!("  :clear          Clear screen");
            println!("  :exit           Exit REPL");
        }
        Some("clear") => {
            print!("\x1B[2J\x1B[1;1H");
        }
        Some("exit") => return true,
        _ => {
            println!("{} Unknown command: {}", "Error:".bright_red(), command);
        }
    }

    false
}

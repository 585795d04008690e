//! Defined constants supplied on the command line as `name=expr` strings.

use crate::builtins::builtin_function_map;
use crate::interpreter::Interpreter;
use eidos_core::{
    define_constant_for_symbol, global_id_for_string, EidosError, EidosResult, Expression,
    ScopeRef, Statement, SymbolTable, SymbolTableKind, TokenKind,
};
use eidos_parser::Script;
use std::rc::Rc;

const SITE_DEFINES: &str = "define_constants_from_command_line";

const INTRINSIC_CONSTANT_NAMES: &[&str] = &["T", "F", "NULL", "PI", "E", "INF", "NAN"];

/// Whether `name` may be used for a defined constant: intrinsic constants
/// and keywords are reserved, and the host may register further reserved
/// patterns.
pub fn good_symbol_for_define(name: &str, host_reserved: Option<&dyn Fn(&str) -> bool>) -> bool {
    if INTRINSIC_CONSTANT_NAMES.contains(&name) {
        return false;
    }
    if TokenKind::is_keyword(name) {
        return false;
    }
    if let Some(reserved) = host_reserved {
        if reserved(name) {
            return false;
        }
    }
    true
}

fn intrinsic_root(symbols: &ScopeRef) -> EidosResult<ScopeRef> {
    let mut cursor = Rc::clone(symbols);
    loop {
        if cursor.borrow().kind() == SymbolTableKind::IntrinsicConstants {
            return Ok(cursor);
        }
        let parent = cursor.borrow().parent();
        match parent {
            Some(parent) => cursor = parent,
            None => {
                return Err(EidosError::internal(
                    SITE_DEFINES,
                    "the symbol chain has no intrinsic constants table at its root.",
                ));
            }
        }
    }
}

fn malformed(definition: &str) -> EidosError {
    EidosError::runtime(
        SITE_DEFINES,
        format!("malformed command-line constant definition: {}", definition),
    )
}

/// Parse and install each `name=expr` definition as a defined constant in
/// `symbols`' chain. The left-hand side must be a plain, unreserved
/// identifier; the right-hand side is evaluated in an ephemeral variables
/// scope over the chain's intrinsic constants.
pub fn define_constants_from_command_line(
    symbols: &ScopeRef,
    definitions: &[String],
    host_reserved: Option<&dyn Fn(&str) -> bool>,
) -> EidosResult<()> {
    for definition in definitions {
        let mut script = Script::new(definition.clone());
        script.set_final_semicolon_optional(true);

        if script.tokenize().is_err() || script.parse_interpreter_block().is_err() {
            return Err(malformed(definition));
        }

        let ast = match script.ast() {
            Some(ast) if ast.statements.len() == 1 => ast,
            _ => return Err(malformed(definition)),
        };

        let (name, value_expr) = match &ast.statements[0] {
            Statement::Expression {
                expr:
                    Expression::Assign {
                        target,
                        value,
                        ..
                    },
                ..
            } => match target.as_ref() {
                Expression::Identifier { name, .. } => (name.clone(), value.as_ref()),
                _ => return Err(malformed(definition)),
            },
            _ => return Err(malformed(definition)),
        };

        if !good_symbol_for_define(&name, host_reserved) {
            return Err(EidosError::runtime(
                SITE_DEFINES,
                format!("illegal defined constant name \"{}\".", name),
            ));
        }

        let root = intrinsic_root(symbols)?;
        let ephemeral = SymbolTable::new_variables(root)?;
        let mut interpreter = Interpreter::new(&script, ephemeral, builtin_function_map());

        let value = interpreter
            .evaluate_expression_for_host(value_expr)
            .map_err(|_| malformed(definition))?;

        define_constant_for_symbol(symbols, global_id_for_string(&name), value)?;
    }

    Ok(())
}

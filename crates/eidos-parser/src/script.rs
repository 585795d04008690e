use crate::lexer::Lexer;
use crate::parser::Parser;
use eidos_core::{EidosError, EidosResult, InterpreterBlock, Token};

const SITE_SCRIPT: &str = "Script";

/// A script: the source string, its token stream, and the parsed
/// interpreter-block AST. The host constructs one, runs `tokenize` and
/// `parse_interpreter_block`, and hands it to an interpreter.
#[derive(Debug)]
pub struct Script {
    source: String,
    final_semicolon_optional: bool,
    tokens: Vec<Token>,
    ast: Option<InterpreterBlock>,
}

impl Script {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            final_semicolon_optional: false,
            tokens: Vec::new(),
            ast: None,
        }
    }

    /// When set, the trailing `;` of the last statement may be omitted;
    /// used by the REPL and command-line constant evaluation.
    pub fn set_final_semicolon_optional(&mut self, optional: bool) {
        self.final_semicolon_optional = optional;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn ast(&self) -> Option<&InterpreterBlock> {
        self.ast.as_ref()
    }

    pub fn tokenize(&mut self) -> EidosResult<()> {
        self.tokens = Lexer::new(&self.source).tokenize()?;
        Ok(())
    }

    pub fn parse_interpreter_block(&mut self) -> EidosResult<()> {
        if self.tokens.is_empty() {
            return Err(EidosError::internal(
                SITE_SCRIPT,
                "parse_interpreter_block called before tokenize.",
            ));
        }
        let mut parser =
            Parser::new_with_options(self.tokens.clone(), self.final_semicolon_optional);
        self.ast = Some(parser.parse_interpreter_block()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_then_parse() {
        let mut script = Script::new("x = 1 + 2;");
        script.tokenize().unwrap();
        script.parse_interpreter_block().unwrap();
        assert_eq!(script.ast().unwrap().statements.len(), 1);
    }

    #[test]
    fn test_parse_before_tokenize_is_an_internal_error() {
        let mut script = Script::new("x = 1;");
        assert!(script.parse_interpreter_block().is_err());
    }
}

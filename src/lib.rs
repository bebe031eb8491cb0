pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod visit;
pub mod config;
pub mod check;
pub mod pretty;

use config::CheckConfig;
use diagnostics::{CompileError, Diagnostic};
use parser::ast::Tree;

/// Lex, parse and resolve a translation unit, recording the configured marker.
pub fn parse_source(source: &str, config: &CheckConfig) -> Result<Tree, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut parser = parser::Parser::new(&tokens, source, &config.marker);
    let tree = parser.parse_translation_unit()?;
    tracing::debug!(nodes = tree.len(), callables = tree.callables().len(), "parsed translation unit");
    Ok(tree)
}

/// Parse `source` and run the marker check over it.
pub fn check_source(source: &str, config: &CheckConfig) -> Result<Vec<Diagnostic>, CompileError> {
    let tree = parse_source(source, config)?;
    Ok(check::check_tree(&tree, config))
}

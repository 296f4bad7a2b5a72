use crate::ast::Program;
use crate::diagnostics::{CompileError, CompileResult};
use crate::lexer;
use crate::parser;
use crate::source::SourceMap;
use crate::typeck;
use crate::types::TypeInfo;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Function that must exist, take no arguments and produce the result.
    pub entry_point: SmolStr,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            entry_point: SmolStr::new_inline("evaluate"),
        }
    }
}

/// A checked program, ready to be run any number of times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compilation {
    pub program: Program,
    pub type_info: TypeInfo,
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilationOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub fn compile(&self, sources: &SourceMap) -> CompileResult<Compilation> {
        let file = sources
            .iter()
            .next()
            .ok_or_else(|| CompileError::error("no sources provided"))?;
        let tokens = lexer::lex(file)?;
        let program = parser::parse(&tokens)?;
        let type_info = typeck::check(&program, &self.options.entry_point)?;
        Ok(Compilation { program, type_info })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_program() {
        let sources = SourceMap::single("formula.eek", "func evaluate() {\nreturn 1\n}\n");
        let compilation = Compiler::new().compile(&sources).expect("compiles");
        assert_eq!(compilation.program.items.len(), 1);
        assert_eq!(compilation.type_info.entry_return, Some(crate::types::Type::Int));
    }

    #[test]
    fn custom_entry_point_is_required() {
        let sources = SourceMap::single("formula.eek", "func evaluate() {\nreturn 1\n}\n");
        let compiler = Compiler::with_options(CompilationOptions {
            entry_point: "main".into(),
        });
        let err = compiler.compile(&sources).expect_err("main is missing");
        assert_eq!(err.message(), "function main is undeclared");
    }

    #[test]
    fn empty_source_map_is_rejected() {
        let err = Compiler::new().compile(&SourceMap::new()).expect_err("no files");
        assert_eq!(err.message(), "no sources provided");
    }
}

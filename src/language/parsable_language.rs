use anyhow::Result;
use tree_sitter::Tree;

/// Trait for a supported language.
pub trait ParsableLanguage {
    /// Human readable name of the language, used in logs.
    fn name(&self) -> &'static str;

    /// Parse a file as a `tree_sitter::Tree`.
    ///
    /// ## Parameters:
    /// * `source` (`&str`): Content of the file.
    ///
    /// ## Returns:
    /// * (`Result<tree_sitter::Tree>`): Given file parsed by tree-sitter. Fails if the file is not
    ///   valid source code for the language.
    fn parse(&self, source: &str) -> Result<Tree>;
}

use anyhow::{bail, Result};
use tree_sitter::Tree;

use super::parsable_language::ParsableLanguage;

#[derive(Debug)]
pub struct UnknownLanguage {}

impl ParsableLanguage for UnknownLanguage {
    fn name(&self) -> &'static str {
        "unknown"
    }

    fn parse(&self, _source: &str) -> Result<Tree> {
        bail!("Unknown language")
    }
}

use anyhow::Result;
use java::JavaLanguage;
use std::path::Path;
use tree_sitter::Tree;
use unknown::UnknownLanguage;

use parsable_language::ParsableLanguage;

pub mod java;
pub mod parsable_language;
mod unknown;

#[derive(Debug)]
pub enum Languages {
    Java(JavaLanguage),
    Unknown(UnknownLanguage),
}

impl ParsableLanguage for Languages {
    fn name(&self) -> &'static str {
        match &self {
            Languages::Java(language) => language.name(),
            Languages::Unknown(language) => language.name(),
        }
    }

    fn parse(&self, source: &str) -> Result<Tree> {
        match &self {
            Languages::Java(language) => language.parse(source),
            Languages::Unknown(language) => language.parse(source),
        }
    }
}

impl Languages {
    /// true iff files of this language can be analyzed.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Languages::Unknown(_))
    }
}

/// Picks the language of a file from its extension.
///
/// ## Parameters:
/// * `path` (`&std::path::Path`): Path of the file.
///
/// ## Returns:
/// * (`Languages`): Language able to parse the file, `Languages::Unknown` if none.
pub fn get_language_for_file(path: &Path) -> Languages {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("java") => Languages::Java(JavaLanguage {}),
        _ => Languages::Unknown(UnknownLanguage {}),
    }
}

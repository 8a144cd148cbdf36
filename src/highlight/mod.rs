//! Syntax highlighting for code blocks.
//!
//! Uses syntect with Sublime Text syntax definitions and emits classed HTML
//! (`lm-hl-*` classes) so presentation stays in CSS.

use std::sync::OnceLock;

use serde::Serialize;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "lm-hl-" };

/// Highlighted code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlighted {
    pub html: String,
    /// Requested language, or the detected syntax name.
    pub language: String,
    /// True when the language came from detection rather than the caller.
    pub detected: bool,
}

/// Code highlighting collaborator.
pub trait Highlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Highlighted;
}

/// syntect-backed highlighter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Highlighted {
        highlight_code(language, code)
    }
}

/// Highlight `code` as `language`.
///
/// Unknown languages fall back to escaped plain text. Without a language
/// the syntax is detected from the first line when possible.
pub fn highlight_code(language: Option<&str>, code: &str) -> Highlighted {
    let language = language.map(str::trim).filter(|l| !l.is_empty());
    let requested = language.unwrap_or("text").to_string();
    if code.is_empty() {
        return Highlighted {
            html: String::new(),
            language: requested,
            detected: false,
        };
    }

    let syntax_set = syntax_set();
    let (syntax, detected) = match language {
        Some(lang) => (find_syntax(syntax_set, lang), false),
        None => {
            let first_line = code.lines().next().unwrap_or_default();
            (syntax_set.find_syntax_by_first_line(first_line), true)
        }
    };

    let Some(syntax) = syntax else {
        return plain(code, requested);
    };

    match classed_html(syntax, syntax_set, code) {
        Ok(html) => Highlighted {
            html,
            language: if detected {
                syntax.name.to_lowercase()
            } else {
                requested
            },
            detected,
        },
        Err(err) => {
            tracing::debug!(%err, language = %requested, "highlighting failed, using plain text");
            plain(code, requested)
        }
    }
}

/// Whether a language name or extension maps to a known syntax.
pub fn is_language_known(language: &str) -> bool {
    find_syntax(syntax_set(), language).is_some()
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, language: &str) -> Option<&'a SyntaxReference> {
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))
}

fn classed_html(
    syntax: &SyntaxReference,
    syntax_set: &SyntaxSet,
    code: &str,
) -> Result<String, syntect::Error> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

fn plain(code: &str, language: String) -> Highlighted {
    Highlighted {
        html: html_escape::encode_text(code).into_owned(),
        language,
        detected: false,
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

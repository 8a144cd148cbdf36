//! Math typesetting and its render cache.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesetError {
    #[error("unbalanced braces at offset {0}")]
    UnbalancedBraces(usize),
    #[error("empty formula")]
    Empty,
    #[error("typesetter unavailable: {0}")]
    Unavailable(String),
}

/// External math renderer.
pub trait Typesetter {
    /// Render `source` (without delimiters) to HTML. `display_mode` selects
    /// block layout.
    fn render_to_string(&self, source: &str, display_mode: bool) -> Result<String, TypesetError>;
}

/// Fallback typesetter: shows the escaped TeX source in a styled container.
///
/// It only validates brace balance, which is enough to exercise the error path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTypesetter;

impl Typesetter for PlainTypesetter {
    fn render_to_string(&self, source: &str, display_mode: bool) -> Result<String, TypesetError> {
        if source.trim().is_empty() {
            return Err(TypesetError::Empty);
        }
        let mut depth = 0usize;
        for (idx, c) in source.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.checked_sub(1).ok_or(TypesetError::UnbalancedBraces(idx))?,
                _ => {}
            }
        }
        if depth != 0 {
            return Err(TypesetError::UnbalancedBraces(source.len()));
        }
        let body = html_escape::encode_text(source);
        Ok(if display_mode {
            format!(r#"<div class="lm-math-display">{body}</div>"#)
        } else {
            format!(r#"<span class="lm-math">{body}</span>"#)
        })
    }
}

/// Memoised typesetter output keyed by display mode and source.
///
/// Failures are cached too, as their error placeholder, so a broken formula
/// is only typeset once. Entries live until [`MathCache::clear`].
pub struct MathCache {
    typesetter: Box<dyn Typesetter + Send + Sync>,
    entries: HashMap<(bool, String), String>,
}

impl MathCache {
    pub fn new(typesetter: impl Typesetter + Send + Sync + 'static) -> Self {
        Self {
            typesetter: Box::new(typesetter),
            entries: HashMap::new(),
        }
    }

    pub fn render(&mut self, source: &str, display_mode: bool) -> String {
        let key = (display_mode, source.to_string());
        if let Some(html) = self.entries.get(&key) {
            return html.clone();
        }
        let html = match self.typesetter.render_to_string(source, display_mode) {
            Ok(html) => html,
            Err(err) => {
                tracing::debug!(%err, source, "math typesetting failed");
                error_placeholder(&err.to_string())
            }
        };
        self.entries.insert(key, html.clone());
        html
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MathCache {
    fn default() -> Self {
        Self::new(PlainTypesetter)
    }
}

impl std::fmt::Debug for MathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MathCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

pub fn error_placeholder(message: &str) -> String {
    format!(
        r#"<span class="lm-math-error">[Math Error: {}]</span>"#,
        html_escape::encode_text(message)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Typesetter for Counting {
        fn render_to_string(&self, source: &str, display_mode: bool) -> Result<String, TypesetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TypesetError::Unavailable("no engine".into()));
            }
            Ok(format!("{display_mode}:{source}"))
        }
    }

    fn counting(fail: bool) -> (MathCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = MathCache::new(Counting {
            calls: Arc::clone(&calls),
            fail,
        });
        (cache, calls)
    }

    #[test]
    fn test_second_render_hits_cache() {
        let (mut cache, calls) = counting(false);
        let first = cache.render("x^2", false);
        let second = cache.render("x^2", false);
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_display_mode_is_part_of_key() {
        let (mut cache, calls) = counting(false);
        let inline = cache.render("x^2", false);
        let block = cache.render("x^2", true);
        assert_ne!(inline, block);
        assert_eq!(cache.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_is_cached_as_placeholder() {
        let (mut cache, calls) = counting(true);
        let html = cache.render(r"\frac{", false);
        assert_eq!(
            html,
            r#"<span class="lm-math-error">[Math Error: typesetter unavailable: no engine]</span>"#
        );
        assert_eq!(cache.render(r"\frac{", false), html);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_empties_memo() {
        let (mut cache, calls) = counting(false);
        cache.render("a", false);
        cache.clear();
        assert!(cache.is_empty());
        cache.render("a", false);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_plain_typesetter_escapes_and_wraps() {
        let html = PlainTypesetter.render_to_string("a < b", false).unwrap();
        assert_eq!(html, r#"<span class="lm-math">a &lt; b</span>"#);
        let html = PlainTypesetter.render_to_string("x", true).unwrap();
        assert_eq!(html, r#"<div class="lm-math-display">x</div>"#);
    }

    #[test]
    fn test_plain_typesetter_rejects_unbalanced_braces() {
        assert_eq!(
            PlainTypesetter.render_to_string(r"\frac{1}{2", false),
            Err(TypesetError::UnbalancedBraces(10))
        );
        assert_eq!(
            PlainTypesetter.render_to_string("}", false),
            Err(TypesetError::UnbalancedBraces(0))
        );
    }
}

use serde::Serialize;

use crate::render::MathCache;

/// A formula, without its delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathView {
    pub source: String,
    pub block: bool,
}

impl MathView {
    pub fn new(source: impl Into<String>, block: bool) -> Self {
        Self {
            source: source.into(),
            block,
        }
    }

    pub fn to_html(&self, cache: &mut MathCache) -> String {
        let rendered = cache.render(&self.source, self.block);
        if self.block {
            format!(r#"<div class="lm-math-block">{rendered}</div>"#)
        } else {
            format!(r#"<span class="lm-math-inline">{rendered}</span>"#)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_and_block_containers() {
        let mut cache = MathCache::default();
        let inline = MathView::new("x", false).to_html(&mut cache);
        assert!(inline.starts_with(r#"<span class="lm-math-inline">"#));
        let block = MathView::new("x", true).to_html(&mut cache);
        assert!(block.starts_with(r#"<div class="lm-math-block">"#));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_error_placeholder_inside_container() {
        let mut cache = MathCache::default();
        let html = MathView::new("{", false).to_html(&mut cache);
        assert!(html.contains("lm-math-error"));
    }
}

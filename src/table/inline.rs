use std::sync::LazyLock;

use regex::{Captures, Regex};

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid code regex"));
static CODE_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{1}(\d+)\x{1}").expect("valid slot regex"));
static STRONG_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
static STRONG_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("valid bold regex"));
static EM_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid italic regex"));
static EM_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.+?)_").expect("valid italic regex"));
static STRIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").expect("valid strike regex"));
static HIGHLIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"==(.+?)==").expect("valid highlight regex"));

/// Render the inline markdown of a table cell to HTML.
///
/// Text is escaped first. Inline code is set aside before any other
/// pattern runs, so its content is never reinterpreted.
pub fn render_inline_markdown(text: &str) -> String {
    let escaped = html_escape::encode_double_quoted_attribute(text);

    let mut code_spans = Vec::new();
    let result = CODE.replace_all(&escaped, |caps: &Captures<'_>| {
        code_spans.push(format!(r#"<code class="lm-code">{}</code>"#, &caps[1]));
        format!("\u{1}{}\u{1}", code_spans.len() - 1)
    });

    let result = STRONG_STAR.replace_all(&result, r#"<strong class="lm-strong">$1</strong>"#);
    let result = STRONG_UNDERSCORE.replace_all(&result, r#"<strong class="lm-strong">$1</strong>"#);
    let result = EM_STAR.replace_all(&result, r#"<em class="lm-emphasis">$1</em>"#);
    let result = EM_UNDERSCORE.replace_all(&result, r#"<em class="lm-emphasis">$1</em>"#);
    let result = STRIKE.replace_all(&result, r#"<del class="lm-strikethrough">$1</del>"#);
    let result = HIGHLIGHT.replace_all(&result, r#"<mark class="lm-highlight">$1</mark>"#);

    CODE_SLOT
        .replace_all(&result, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| code_spans.get(idx).cloned())
                .unwrap_or_default()
        })
        .into_owned()
}

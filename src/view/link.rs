use serde::Serialize;

const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "vbscript:", "data:text/html"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkData {
    pub text: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_wiki_link: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkOptions {
    pub open_in_new_tab: bool,
    /// Show the target URL on hover.
    pub show_preview: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            open_in_new_tab: true,
            show_preview: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkView {
    pub data: LinkData,
    pub options: LinkOptions,
}

impl LinkView {
    pub const fn new(data: LinkData, options: LinkOptions) -> Self {
        Self { data, options }
    }

    pub fn to_html(&self) -> String {
        let text = html_escape::encode_text(&self.data.text);
        let title = html_escape::encode_double_quoted_attribute(
            self.data.title.as_deref().unwrap_or_default(),
        );

        if self.data.is_wiki_link {
            let target = html_escape::encode_double_quoted_attribute(&self.data.url);
            return format!(
                r#"<a class="lm-link-widget lm-wikilink-widget" href="" data-wikilink="{target}" title="{title}">{text}</a>"#
            );
        }

        let mut attrs = String::new();
        if let Some(url) = sanitize_url(&self.data.url) {
            attrs.push_str(&format!(
                r#" href="{}""#,
                html_escape::encode_double_quoted_attribute(&url)
            ));
        }
        if self.options.open_in_new_tab {
            attrs.push_str(r#" target="_blank" rel="noopener noreferrer""#);
        }
        let preview = if self.options.show_preview {
            format!(
                r#"<span class="lm-link-preview">{}</span>"#,
                html_escape::encode_text(&self.data.url)
            )
        } else {
            String::new()
        };
        format!(r#"<a class="lm-link-widget"{attrs} title="{title}">{text}{preview}</a>"#)
    }
}

/// The URL if it is safe to navigate to, `None` for script-capable schemes.
pub fn sanitize_url(url: &str) -> Option<String> {
    let lower = url.trim().to_lowercase();
    if DANGEROUS_PROTOCOLS.iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    Some(url.trim().to_string())
}

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use crate::image::{DEFAULT_TIMEOUT, ImageLoader, LoadOptions, LoadedImage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageData {
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_local: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageOptions {
    pub max_width: String,
    pub show_alt: bool,
    pub show_loading: bool,
    pub error_placeholder: String,
    pub base_path: Option<String>,
    pub timeout: Duration,
    /// Start loading as soon as the view is emitted.
    pub autoload: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: "100%".to_string(),
            show_alt: true,
            show_loading: true,
            error_placeholder: "Failed to load image".to_string(),
            base_path: None,
            timeout: DEFAULT_TIMEOUT,
            autoload: true,
        }
    }
}

impl ImageOptions {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            timeout: self.timeout,
            base_path: self.base_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Loading,
    Loaded(LoadedImage),
    Failed { error: String },
}

/// A rendered image. The load state is shared by clones of the view and
/// filled in by the loader once the fetch completes.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub data: ImageData,
    pub options: ImageOptions,
    #[serde(skip)]
    state: Arc<Mutex<LoadState>>,
}

impl PartialEq for ImageView {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.options == other.options
    }
}

impl ImageView {
    pub fn new(data: ImageData, options: ImageOptions) -> Self {
        Self {
            data,
            options,
            state: Arc::new(Mutex::new(LoadState::Loading)),
        }
    }

    pub fn state(&self) -> LoadState {
        lock(&self.state).clone()
    }

    /// Start a background load. A cached image is applied immediately
    /// without a worker. Otherwise the result is dropped if every copy of
    /// this view is gone by the time it arrives.
    pub fn start_loading(&self, loader: &ImageLoader) {
        let options = self.options.load_options();
        if let Some(hit) = loader.cached(&self.data.src, &options) {
            *lock(&self.state) = LoadState::Loaded(hit);
            return;
        }
        let slot = Arc::downgrade(&self.state);
        let src = self.data.src.clone();
        loader.load_in_background(&self.data.src, &options, move |result| {
            match slot.upgrade() {
                Some(state) => *lock(&state) = state_for(result),
                None => tracing::trace!(%src, "image view gone, dropping load result"),
            }
        });
    }

    /// Load synchronously and store the result.
    pub fn load_now(&self, loader: &ImageLoader) -> LoadState {
        let state = state_for(loader.load(&self.data.src, &self.options.load_options()));
        *lock(&self.state) = state.clone();
        state
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="lm-image-widget">"#);
        match self.state() {
            LoadState::Loading => {
                if self.options.show_loading {
                    html.push_str(
                        r#"<div class="lm-image-loading"><span class="lm-image-spinner"></span><span>Loading...</span></div>"#,
                    );
                }
            }
            LoadState::Loaded(image) => {
                let _ = write!(
                    html,
                    r#"<img src="{}" alt="{}" title="{}" style="max-width: {}" draggable="false">"#,
                    html_escape::encode_double_quoted_attribute(&image.src),
                    html_escape::encode_double_quoted_attribute(&self.data.alt),
                    html_escape::encode_double_quoted_attribute(
                        self.data.title.as_deref().unwrap_or_default()
                    ),
                    html_escape::encode_double_quoted_attribute(&self.options.max_width),
                );
                if self.options.show_alt && !self.data.alt.is_empty() {
                    let _ = write!(
                        html,
                        r#"<div class="lm-image-alt">{}</div>"#,
                        html_escape::encode_text(&self.data.alt)
                    );
                }
            }
            LoadState::Failed { error } => {
                let _ = write!(
                    html,
                    r#"<div class="lm-image-error" title="{}"><span class="lm-image-error-icon">⚠</span><span>{}</span></div>"#,
                    html_escape::encode_double_quoted_attribute(&error),
                    html_escape::encode_text(&self.options.error_placeholder)
                );
            }
        }
        html.push_str("</div>");
        html
    }
}

fn state_for(result: LoadedImage) -> LoadState {
    if result.loaded {
        LoadState::Loaded(result)
    } else {
        LoadState::Failed {
            error: result.error.unwrap_or_default(),
        }
    }
}

fn lock(state: &Mutex<LoadState>) -> MutexGuard<'_, LoadState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

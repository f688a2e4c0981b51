//! Network observation types.
//!
//! An observation is one completed response or one outgoing request as seen
//! by the host platform. It is never persisted.

use serde::{Deserialize, Serialize};

/// Header carrying the body length.
pub const CONTENT_LENGTH_HEADER: &str = "content-length";

/// Resource category reported by the host for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// Top-level document.
    MainFrame,
    /// Embedded frame document.
    SubFrame,
    /// CSS.
    Stylesheet,
    /// JavaScript.
    Script,
    /// Images.
    Image,
    /// Audio and video.
    Media,
    /// Anything else.
    #[default]
    Other,
}

impl ResourceCategory {
    /// All categories.
    pub fn all() -> &'static [ResourceCategory] {
        &[
            ResourceCategory::MainFrame,
            ResourceCategory::SubFrame,
            ResourceCategory::Stylesheet,
            ResourceCategory::Script,
            ResourceCategory::Image,
            ResourceCategory::Media,
            ResourceCategory::Other,
        ]
    }

    /// Maps a host resource-type tag to a category.
    ///
    /// Unknown tags (`font`, `xmlhttprequest`, `websocket`, ...) map to
    /// [`ResourceCategory::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "main_frame" => ResourceCategory::MainFrame,
            "sub_frame" => ResourceCategory::SubFrame,
            "stylesheet" => ResourceCategory::Stylesheet,
            "script" => ResourceCategory::Script,
            "image" | "imageset" => ResourceCategory::Image,
            "media" => ResourceCategory::Media,
            _ => ResourceCategory::Other,
        }
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceCategory::MainFrame => write!(f, "main_frame"),
            ResourceCategory::SubFrame => write!(f, "sub_frame"),
            ResourceCategory::Stylesheet => write!(f, "stylesheet"),
            ResourceCategory::Script => write!(f, "script"),
            ResourceCategory::Image => write!(f, "image"),
            ResourceCategory::Media => write!(f, "media"),
            ResourceCategory::Other => write!(f, "other"),
        }
    }
}

/// Which side of the exchange was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// A completed response (download).
    #[default]
    Response,
    /// Outgoing request headers (upload).
    Request,
}

/// One observed network exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkObservation {
    /// Request URL.
    pub url: String,
    /// Resource category.
    pub category: ResourceCategory,
    /// Raw content-length value, if the headers carried one.
    pub byte_hint: Option<String>,
    /// Response or request side.
    #[serde(default)]
    pub direction: Direction,
}

impl NetworkObservation {
    /// Creates a response observation without a length hint.
    pub fn response(url: impl Into<String>, category: ResourceCategory) -> Self {
        Self {
            url: url.into(),
            category,
            byte_hint: None,
            direction: Direction::Response,
        }
    }

    /// Creates a request observation without a length hint.
    pub fn request(url: impl Into<String>, category: ResourceCategory) -> Self {
        Self {
            direction: Direction::Request,
            ..Self::response(url, category)
        }
    }

    /// Sets the raw length hint.
    #[must_use]
    pub fn with_byte_hint(mut self, hint: impl Into<String>) -> Self {
        self.byte_hint = Some(hint.into());
        self
    }

    /// Builds an observation from a header list, picking up the
    /// content-length entry with a case-insensitive name match.
    pub fn from_headers<'a, I>(
        url: impl Into<String>,
        category: ResourceCategory,
        direction: Direction,
        headers: I,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let byte_hint = headers
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_LENGTH_HEADER))
            .map(|(_, value)| value.to_string());

        Self {
            url: url.into(),
            category,
            byte_hint,
            direction,
        }
    }
}

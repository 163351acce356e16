//! Maps raw lesson video URLs onto something the player can render.
//!
//! Matching is substring based. A URL that does not match a provider shape is
//! handed to the player untouched.

use serde::Serialize;

const YOUTUBE_WATCH: &str = "youtube.com/watch?v=";
const YOUTUBE_SHORT: &str = "youtu.be/";
const VIMEO: &str = "vimeo.com/";
const VIMEO_PLAYER: &str = "player.vimeo.com/";
const WISTIA_MEDIAS: &str = "wistia.com/medias/";
const WISTIA_IFRAME: &str = "https://fast.wistia.net/embed/iframe/";
const EXTERNAL_HOSTS: [&str; 2] = ["drive.google.com", "docs.google.com"];

/// How a lesson URL should be presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embed {
    /// Nothing to show.
    Empty,
    /// Usable as an iframe source.
    Frame { src: String },
    /// Document-sharing link, only offered as "open externally".
    External { href: String },
}

impl Embed {
    /// Iframe source, empty unless this is a [`Embed::Frame`].
    pub fn src(&self) -> &str {
        match self {
            Self::Frame { src } => src,
            _ => "",
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

pub fn resolve(url: &str) -> Embed {
    let url = url.trim();
    if url.is_empty() {
        return Embed::Empty;
    }

    if url.contains(YOUTUBE_WATCH) {
        return frame(url.replacen("watch?v=", "embed/", 1));
    }

    if url.contains(YOUTUBE_SHORT) {
        return frame(url.replacen(YOUTUBE_SHORT, "youtube.com/embed/", 1));
    }

    if url.contains(VIMEO) && !url.contains(VIMEO_PLAYER) {
        return frame(url.replacen(VIMEO, "player.vimeo.com/video/", 1));
    }

    if let Some(id) = wistia_media_id(url) {
        return frame(format!("{WISTIA_IFRAME}{id}"));
    }

    if is_external(url) {
        return Embed::External {
            href: url.to_string(),
        };
    }

    frame(url.to_string())
}

/// True for Google Drive and Docs links.
pub fn is_external(url: &str) -> bool {
    EXTERNAL_HOSTS.iter().any(|host| url.contains(host))
}

fn wistia_media_id(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once(WISTIA_MEDIAS)?;
    let id = rest.split('?').next().unwrap_or_default();
    (!id.is_empty()).then_some(id)
}

fn frame(src: String) -> Embed {
    Embed::Frame { src }
}

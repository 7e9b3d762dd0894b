//! Decides how a slide's resource is presented.
//!
//! `classify` maps a URL to a media kind from its path extension; `view_for`
//! turns the active slide into the plan the rendering surface follows.

use super::model::Slide;
use log::{trace, warn};
use url::Url;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "svg", "webp"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "mov", "avi"];

pub const UNSUPPORTED_MESSAGE: &str = "Media format not supported.";
pub const NO_SLIDES_MESSAGE: &str = "No slides available.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

/// Classifies a resource URL by the extension of its path.
///
/// Query strings and fragments are ignored. A string that does not parse as
/// an absolute URL is `Unsupported`.
pub fn classify(url: &str) -> MediaKind {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Invalid media URL '{}': {}", url, e);
            return MediaKind::Unsupported;
        }
    };
    let file_name = parsed.path().rsplit('/').next().unwrap_or_default();
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        trace!("No extension in media URL '{}'", url);
        return MediaKind::Unsupported;
    };
    let extension = extension.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Unsupported
    }
}

/// What the rendering surface should show for the active slide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaView<'a> {
    Image { src: &'a str, alt: &'a str },
    /// Videos always play muted, looped and inline.
    Video { src: &'a str, title: &'a str, autoplay: bool, muted: bool, looping: bool },
    Unsupported { message: &'static str },
    Empty { message: &'static str },
}

pub fn view_for(slide: Option<&Slide>) -> MediaView<'_> {
    let Some(slide) = slide else {
        return MediaView::Empty { message: NO_SLIDES_MESSAGE };
    };
    let kind = classify(&slide.url);
    trace!("Slide '{}' ({}) classified as {:?}", slide.title, slide.url, kind);
    match kind {
        MediaKind::Image => MediaView::Image { src: &slide.url, alt: &slide.title },
        MediaKind::Video => MediaView::Video {
            src: &slide.url,
            title: &slide.title,
            autoplay: true,
            muted: true,
            looping: true,
        },
        MediaKind::Unsupported => MediaView::Unsupported { message: UNSUPPORTED_MESSAGE },
    }
}

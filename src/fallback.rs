//! Per-image fallback state machine.
//!
//! When an image fails to load, the host reports the failure to
//! [`FallbackEngine::handle_failure`], which escalates the element's source
//! through an ordered sequence of strategies:
//!
//! 1. **Adjacent file** — the basename of the original path, tried next to
//!    the page itself. Only applies when the original source was a relative
//!    path (contains `/`, not `http...` or `data:...`).
//! 2. **Alternate base** — a configured fallback base URL joined with the
//!    basename. Only applies when the image carries a non-empty
//!    [`ATTR_FALLBACK_BASE`] attribute.
//! 3. **Alternate storage** — a cloud-drive direct-view URL built from the
//!    image's [`ATTR_GDRIVE_ID`] attribute.
//! 4. **Placeholder** — a generated SVG data URI that cannot fail to load.
//!
//! Inapplicable stages advance the attempt counter and loop internally; a
//! skipped stage assigns no source, so no further failure event would ever
//! fire for it. Attempts are capped at [`MAX_ATTEMPTS`]; past the cap the
//! handler is a no-op, which guards against a failure loop even in the
//! (practically impossible) case of the placeholder itself failing.
//!
//! All mutable state lives in a per-engine side table keyed by element id —
//! nothing is shared across elements, and nothing is encoded into element
//! attributes beyond the two read-only configuration attributes above.

use crate::page::{Document, NodeId};
use crate::placeholder;
use std::collections::HashMap;

/// Hard cap on fallback attempts per element.
pub const MAX_ATTEMPTS: u8 = 4;

/// Per-image attribute naming the fallback base URL. Empty or absent means
/// the alternate-base stage is inapplicable, not an error.
pub const ATTR_FALLBACK_BASE: &str = "data-fallback-base-url";

/// Per-image attribute naming the cloud-drive file id. Empty or absent means
/// the alternate-storage stage is inapplicable, not an error.
pub const ATTR_GDRIVE_ID: &str = "data-gdrive-fid";

/// Mutable fallback state for one image element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackState {
    /// 1-based attempt counter; monotonically non-decreasing, capped at
    /// [`MAX_ATTEMPTS`].
    pub attempt: u8,
    /// The element's `src` as it was at the moment of the first failure.
    /// If external code rewrote the source before that, the rewritten value
    /// is what gets captured — basename derivation intentionally works from
    /// this snapshot, never from intermediate fallback sources.
    pub original_src: String,
}

/// What a [`FallbackEngine::handle_failure`] call did to the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackAction {
    /// Assigned the basename, to be resolved adjacent to the page.
    AdjacentFile(String),
    /// Assigned base URL + basename.
    AlternateBase(String),
    /// Assigned the cloud-drive direct-view URL.
    AlternateStorage(String),
    /// Assigned the generated placeholder data URI. Terminal.
    Placeholder(String),
}

impl FallbackAction {
    /// The source string that was assigned to the element.
    pub fn src(&self) -> &str {
        match self {
            Self::AdjacentFile(s)
            | Self::AlternateBase(s)
            | Self::AlternateStorage(s)
            | Self::Placeholder(s) => s,
        }
    }
}

/// Owns the per-image fallback side table. One engine per themed document.
#[derive(Debug, Default)]
pub struct FallbackEngine {
    states: HashMap<NodeId, FallbackState>,
}

impl FallbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback state for an element, if any failure has been handled for it.
    pub fn state(&self, img: NodeId) -> Option<&FallbackState> {
        self.states.get(&img)
    }

    /// Handle a load failure for `img`, assigning the next candidate source.
    ///
    /// Returns the action taken, or `None` when the element is not an image
    /// or the attempt cap was already reached (in which case nothing is
    /// mutated). Failures never surface as errors: every path either assigns
    /// a new source or does nothing.
    pub fn handle_failure(&mut self, doc: &mut Document, img: NodeId) -> Option<FallbackAction> {
        let Some(el) = doc.element(img) else {
            log::warn!("fallback invoked on a non-element node; ignoring");
            return None;
        };
        if el.tag != "img" {
            log::warn!("fallback invoked on <{}>; only images are handled", el.tag);
            return None;
        }
        let current_src = el.attr("src").unwrap_or_default().to_string();
        let base_url = nonempty(el.attr(ATTR_FALLBACK_BASE));
        let gdrive_id = nonempty(el.attr(ATTR_GDRIVE_ID));
        let alt = el.attr("alt").unwrap_or_default().to_string();

        // First failure: capture the pristine source before any mutation.
        let state = self
            .states
            .entry(img)
            .or_insert_with(|| FallbackState { attempt: 0, original_src: current_src });
        if state.attempt >= MAX_ATTEMPTS {
            return None;
        }
        state.attempt += 1;
        log::info!(
            "fallback attempt {} for: {}",
            state.attempt,
            state.original_src
        );

        let filename = basename(&state.original_src).to_string();

        // Skip-state transitions happen here, synchronously: an inapplicable
        // stage has no source to assign, so no failure event would re-enter.
        let action = loop {
            match state.attempt {
                1 => {
                    if is_relative_path(&state.original_src) {
                        break FallbackAction::AdjacentFile(filename.clone());
                    }
                    state.attempt = 2;
                }
                2 => {
                    if let Some(base) = &base_url {
                        break FallbackAction::AlternateBase(join_base(base, &filename));
                    }
                    state.attempt = 3;
                }
                3 => {
                    if let Some(id) = &gdrive_id {
                        break FallbackAction::AlternateStorage(drive_view_url(id));
                    }
                    state.attempt = 4;
                }
                _ => {
                    break FallbackAction::Placeholder(placeholder::data_uri(&filename, &alt));
                }
            }
        };

        log::debug!("assigning fallback source: {}", action.src());
        doc.set_attr(img, "src", action.src());
        Some(action)
    }

    /// Clear an element's fallback state and restore its captured original
    /// source, so a later failure starts the sequence over.
    ///
    /// Resetting while a failure sequence is in flight is an accepted
    /// last-write-wins race; ordering between the two is undefined and
    /// deliberately not guarded.
    pub fn reset(&mut self, doc: &mut Document, img: NodeId) {
        if let Some(state) = self.states.remove(&img) {
            log::info!("resetting fallback state, restoring: {}", state.original_src);
            doc.set_attr(img, "src", &state.original_src);
        }
    }
}

fn nonempty(attr: Option<&str>) -> Option<String> {
    attr.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Substring after the last `/` (the whole string if none), with any query
/// string stripped. This is the filename identity reused at every stage.
pub fn basename(src: &str) -> &str {
    let tail = src.rsplit('/').next().unwrap_or(src);
    tail.split('?').next().unwrap_or(tail)
}

/// A source qualifies for the adjacent-file stage only when it is a relative
/// path: it contains a separator and is neither a network URL nor a data URI.
fn is_relative_path(src: &str) -> bool {
    src.contains('/') && !src.starts_with("http") && !src.starts_with("data:")
}

/// Join base URL and filename with exactly one separator between them.
fn join_base(base: &str, filename: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{filename}")
    } else {
        format!("{base}/{filename}")
    }
}

/// Direct-view retrieval URL for a cloud-drive file id.
fn drive_view_url(id: &str) -> String {
    format!("https://drive.google.com/uc?id={id}&export=view")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Document;

    fn doc_with_img(src: &str, base: &str, gdrive: &str) -> (Document, NodeId) {
        let html = format!(
            r#"<body><img src="{src}" alt="An image" {ATTR_FALLBACK_BASE}="{base}" {ATTR_GDRIVE_ID}="{gdrive}"></body>"#
        );
        let doc = Document::parse(&html);
        let img = doc.images()[0];
        (doc, img)
    }

    #[test]
    fn full_escalation_produces_four_distinct_sources() {
        let (mut doc, img) = doc_with_img("/images/sub/pic.png", "https://cdn.example.com", "FID123");
        let mut engine = FallbackEngine::new();

        let a1 = engine.handle_failure(&mut doc, img).unwrap();
        assert_eq!(a1, FallbackAction::AdjacentFile("pic.png".into()));
        assert_eq!(doc.attr(img, "src"), Some("pic.png"));

        let a2 = engine.handle_failure(&mut doc, img).unwrap();
        assert_eq!(
            a2,
            FallbackAction::AlternateBase("https://cdn.example.com/pic.png".into())
        );

        let a3 = engine.handle_failure(&mut doc, img).unwrap();
        assert_eq!(
            a3,
            FallbackAction::AlternateStorage(
                "https://drive.google.com/uc?id=FID123&export=view".into()
            )
        );

        let a4 = engine.handle_failure(&mut doc, img).unwrap();
        assert!(matches!(a4, FallbackAction::Placeholder(_)));
        assert!(doc.attr(img, "src").unwrap().starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn handler_is_idempotent_past_the_cap() {
        let (mut doc, img) = doc_with_img("/a/pic.png", "https://cdn", "FID");
        let mut engine = FallbackEngine::new();
        for _ in 0..4 {
            engine.handle_failure(&mut doc, img);
        }
        let terminal_src = doc.attr(img, "src").unwrap().to_string();
        assert!(engine.handle_failure(&mut doc, img).is_none());
        assert_eq!(doc.attr(img, "src"), Some(terminal_src.as_str()));
        assert_eq!(engine.state(img).unwrap().attempt, MAX_ATTEMPTS);
    }

    #[test]
    fn bare_filename_skips_adjacent_stage() {
        let (mut doc, img) = doc_with_img("photo.jpg", "https://cdn.example.com/", "");
        let mut engine = FallbackEngine::new();
        let action = engine.handle_failure(&mut doc, img).unwrap();
        assert_eq!(
            action,
            FallbackAction::AlternateBase("https://cdn.example.com/photo.jpg".into())
        );
        assert_eq!(engine.state(img).unwrap().attempt, 2);
    }

    #[test]
    fn network_url_skips_adjacent_stage() {
        let (mut doc, img) = doc_with_img("https://elsewhere.example.com/pic.png", "", "FID");
        let mut engine = FallbackEngine::new();
        let action = engine.handle_failure(&mut doc, img).unwrap();
        assert!(matches!(action, FallbackAction::AlternateStorage(_)));
        assert_eq!(engine.state(img).unwrap().attempt, 3);
    }

    #[test]
    fn nothing_configured_goes_straight_to_placeholder() {
        let (mut doc, img) = doc_with_img("photo.jpg", "", "");
        let mut engine = FallbackEngine::new();
        let action = engine.handle_failure(&mut doc, img).unwrap();
        assert!(matches!(action, FallbackAction::Placeholder(_)));
        assert_eq!(engine.state(img).unwrap().attempt, MAX_ATTEMPTS);
    }

    #[test]
    fn basename_derivation() {
        assert_eq!(basename("/images/sub/pic.png?v=2"), "pic.png");
        assert_eq!(basename("pic.png"), "pic.png");
        assert_eq!(basename("photo.jpg?v=3"), "photo.jpg");
        assert_eq!(basename(""), "");
        assert_eq!(basename("a/b/"), "");
    }

    #[test]
    fn basename_always_derives_from_original_source() {
        let (mut doc, img) = doc_with_img("assets/pic.png", "https://cdn", "");
        let mut engine = FallbackEngine::new();
        engine.handle_failure(&mut doc, img); // src is now "pic.png"
        let action = engine.handle_failure(&mut doc, img).unwrap();
        // Derived from "assets/pic.png", not from the intermediate "pic.png".
        assert_eq!(action, FallbackAction::AlternateBase("https://cdn/pic.png".into()));
        assert_eq!(engine.state(img).unwrap().original_src, "assets/pic.png");
    }

    #[test]
    fn join_avoids_duplicate_separator() {
        assert_eq!(join_base("https://cdn", "a.png"), "https://cdn/a.png");
        assert_eq!(join_base("https://cdn/", "a.png"), "https://cdn/a.png");
    }

    #[test]
    fn empty_source_is_handled_like_any_string() {
        let html = r#"<img alt="">"#;
        let mut doc = Document::parse(html);
        let img = doc.images()[0];
        let mut engine = FallbackEngine::new();
        let action = engine.handle_failure(&mut doc, img).unwrap();
        assert!(matches!(action, FallbackAction::Placeholder(_)));
        assert_eq!(engine.state(img).unwrap().original_src, "");
    }

    #[test]
    fn reset_restores_captured_original() {
        let (mut doc, img) = doc_with_img("/a/pic.png", "https://cdn", "FID");
        let mut engine = FallbackEngine::new();
        engine.handle_failure(&mut doc, img);
        engine.handle_failure(&mut doc, img);
        assert_ne!(doc.attr(img, "src"), Some("/a/pic.png"));

        engine.reset(&mut doc, img);
        assert_eq!(doc.attr(img, "src"), Some("/a/pic.png"));
        assert!(engine.state(img).is_none());

        // The sequence starts over after a reset.
        let action = engine.handle_failure(&mut doc, img).unwrap();
        assert_eq!(action, FallbackAction::AdjacentFile("pic.png".into()));
        assert_eq!(engine.state(img).unwrap().attempt, 1);
    }

    #[test]
    fn reset_without_state_is_a_no_op() {
        let (mut doc, img) = doc_with_img("/a/pic.png", "", "");
        let mut engine = FallbackEngine::new();
        engine.reset(&mut doc, img);
        assert_eq!(doc.attr(img, "src"), Some("/a/pic.png"));
    }

    #[test]
    fn states_are_independent_per_element() {
        let html = r#"<body><img src="a/one.png"><img src="b/two.png"></body>"#;
        let mut doc = Document::parse(html);
        let imgs = doc.images();
        let mut engine = FallbackEngine::new();

        engine.handle_failure(&mut doc, imgs[0]);
        assert_eq!(engine.state(imgs[0]).unwrap().attempt, 1);
        assert!(engine.state(imgs[1]).is_none());
        assert_eq!(doc.attr(imgs[1], "src"), Some("b/two.png"));
    }

    #[test]
    fn non_image_elements_are_ignored() {
        let mut doc = Document::parse("<div>x</div>");
        let div = doc.first_tag("div").unwrap();
        let mut engine = FallbackEngine::new();
        assert!(engine.handle_failure(&mut doc, div).is_none());
        assert!(engine.state(div).is_none());
    }

    #[test]
    fn placeholder_embeds_basename_and_alt() {
        use base64::Engine as _;
        let (mut doc, img) = doc_with_img("https://x.example.com/shot.png?v=1", "", "");
        let mut engine = FallbackEngine::new();
        let action = engine.handle_failure(&mut doc, img).unwrap();
        let FallbackAction::Placeholder(uri) = action else {
            panic!("expected placeholder");
        };
        let svg = String::from_utf8(
            base64::engine::general_purpose::STANDARD
                .decode(uri.strip_prefix("data:image/svg+xml;base64,").unwrap())
                .unwrap(),
        )
        .unwrap();
        assert!(svg.contains("shot.png"));
        assert!(svg.contains("An image"));
    }
}

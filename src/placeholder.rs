//! Synthetic "image not found" placeholder.
//!
//! The terminal stage of the fallback chain assigns a data-URI-encoded SVG
//! instead of yet another URL that could fail. A data URI needs no network
//! fetch, so assigning it always ends the retry sequence.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Canvas size of the generated placeholder, in SVG user units.
pub const WIDTH: u32 = 300;
pub const HEIGHT: u32 = 150;

const BACKGROUND: &str = "#5E2121";
const FOREGROUND: &str = "#FFFFFF";
const MUTED: &str = "#CCCCCC";

/// Replace the five markup-significant characters with named entities.
///
/// Filenames and alt text are arbitrary strings; unescaped they would
/// produce malformed SVG or inject markup into it.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

/// Build the placeholder SVG markup for a missing image.
///
/// A fixed 300×150 canvas: dark background, dashed border, a file glyph,
/// a bold "IMAGE NOT FOUND" label and the filename. The alt-text line is
/// emitted only when `alt` is non-empty.
pub fn markup(filename: &str, alt: &str) -> String {
    let safe_filename = escape_xml(filename);
    let safe_alt = escape_xml(alt);

    let mut svg = format!(
        r#"<svg width="{WIDTH}" height="{HEIGHT}" xmlns="http://www.w3.org/2000/svg">
<rect width="100%" height="100%" fill="{BACKGROUND}"/>
<rect x="10" y="10" width="280" height="130" fill="none" stroke="{FOREGROUND}" stroke-width="2" stroke-dasharray="5,5"/>
<g transform="translate(130, 30)">
<rect x="0" y="0" width="24" height="30" fill="none" stroke="{FOREGROUND}" stroke-width="2"/>
<rect x="0" y="0" width="18" height="6" fill="{FOREGROUND}"/>
<line x1="6" y1="12" x2="18" y2="12" stroke="{FOREGROUND}" stroke-width="1"/>
<line x1="6" y1="18" x2="18" y2="18" stroke="{FOREGROUND}" stroke-width="1"/>
<line x1="6" y1="24" x2="15" y2="24" stroke="{FOREGROUND}" stroke-width="1"/>
</g>
<text x="150" y="80" font-family="Arial, sans-serif" font-size="12" fill="{FOREGROUND}" text-anchor="middle" font-weight="bold">IMAGE NOT FOUND</text>
<text x="150" y="100" font-family="Arial, sans-serif" font-size="10" fill="{FOREGROUND}" text-anchor="middle">{safe_filename}</text>
"#
    );
    if !alt.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="150" y="120" font-family="Arial, sans-serif" font-size="8" fill="{MUTED}" text-anchor="middle">{safe_alt}</text>"#
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Build the placeholder as a self-contained data URI.
pub fn data_uri(filename: &str, alt: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(markup(filename, alt)))
}

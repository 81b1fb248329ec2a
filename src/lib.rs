//! # site-chrome
//!
//! Themable chrome for static HTML pages. A page author writes semantic
//! markup; a theme configuration supplies the palette, the semantic-class →
//! utility-class mapping, and the chrome content (navigation links, hero
//! banner, footer). Applying the theme rewrites the page in place and wires
//! every image into a multi-stage fallback chain that ends in a generated
//! placeholder which cannot fail to load.
//!
//! # Architecture: One Pass, One Handle
//!
//! Theming is a single ordered pass over an explicit document value:
//!
//! ```text
//! parse    page.html     →  Document        (forgiving HTML → typed tree)
//! apply    Document      →  ThemeRuntime    (palette, remap, chrome, wiring)
//! serialize Document     →  themed HTML
//! ```
//!
//! [`apply::apply_theme`] returns a [`apply::ThemeRuntime`] handle; the
//! host's event dispatch calls back into it (`handle_image_error`,
//! `reset_image`, `toggle_menu`) instead of reaching for globals. All
//! per-image fallback state lives in a typed side table inside the handle,
//! keyed by node id — nothing is smuggled through stringly-typed element
//! attributes, and nothing is shared across elements.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `ThemeConfig` loading (TOML/JSON), validation, stock config, palette CSS |
//! | [`page`] | Typed HTML document: forgiving parser, arena tree, class/attr ops, serializer |
//! | [`render`] | Maud fragments for navigation, banner, and footer chrome |
//! | [`fallback`] | Per-image fallback state machine with an explicit escalation loop |
//! | [`placeholder`] | Synthetic "IMAGE NOT FOUND" SVG as a base64 data URI |
//! | [`apply`] | Ordered bootstrap steps; returns the `ThemeRuntime` handle |
//! | [`output`] | CLI report formatting — pure `format_*`, thin `print_*` |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! Chrome markup is generated with [Maud](https://maud.lambda.xyz/), a
//! compile-time HTML macro system. Malformed chrome is a build error, config
//! values interpolate as Rust expressions, and all interpolation is
//! auto-escaped — a navigation link named `<script>` stays text.
//!
//! ## The Fallback Chain Ends in Something That Cannot Fail
//!
//! Image failure handling never surfaces an error. Each failure assigns the
//! next candidate source — adjacent filename, alternate base URL, cloud-drive
//! URL — and the terminal stage assigns a data-URI SVG generated locally, so
//! the chain always converges. A hard cap of four attempts guards the
//! (practically impossible) case of the placeholder itself failing.
//!
//! ## Forgiving Parser, Explicit Document
//!
//! The original environment for this kind of theming is a browser DOM. Here
//! the page is an explicit value: [`page::Document`] parses real-world HTML
//! forgivingly (auto-closing, entity-tolerant, never erroring) and exposes
//! the handful of operations theming needs. It is deliberately not an HTML5
//! conformance parser.
//!
//! ## Configuration Is Passed, Never Ambient
//!
//! The theme is one immutable value threaded through [`apply::apply_theme`].
//! The only per-image configuration the fallback machine reads is the two
//! `data-*` attributes the renderer stamps onto each image, which keeps the
//! engine free of any lookup into the theme.

pub mod apply;
pub mod config;
pub mod fallback;
pub mod output;
pub mod page;
pub mod placeholder;
pub mod render;

#[cfg(test)]
pub(crate) mod test_helpers;

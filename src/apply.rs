//! Theming bootstrap.
//!
//! [`apply_theme`] runs the ordered theming steps against a page and returns
//! a [`ThemeRuntime`]: the explicit handle through which the host reports
//! image load failures, resets images, and toggles the mobile menu. There is
//! no ambient global state — everything the host needs lives on the handle.
//!
//! Step order (fixed):
//!
//! 1. validate the configuration;
//! 2. inject the palette as a `<style>` of `--color-*` custom properties;
//! 3. remap semantic classes to utility classes;
//! 4. inject navigation at the start of the body;
//! 5. inject the banner right after the navigation (when configured);
//! 6. append the footer;
//! 7. wire the mobile menu toggle (only when all three hook elements exist);
//! 8. defensively wire a fallback handler to every image that doesn't have
//!    one — images injected by steps 4-6 were wired on injection and are not
//!    double-wired, and images carrying their own `onerror` attribute are
//!    left alone.
//!
//! Once `apply_theme` has started there is no fatal error path: a config
//! that validates cannot fail to apply, and image failures are absorbed by
//! the fallback engine (the terminal placeholder always loads).

use crate::config::{ConfigError, ThemeConfig, palette_css};
use crate::fallback::{FallbackAction, FallbackEngine};
use crate::page::{Document, InsertAt, NodeId};
use crate::render;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Counters for reporting what theming did to the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplyStats {
    /// Semantic-class mappings that matched at least one element.
    pub mappings_applied: usize,
    /// Elements whose class list was rewritten.
    pub elements_restyled: usize,
    /// Images wired to the fallback engine (injected + pre-existing).
    pub images_wired: usize,
}

/// Mobile menu hook elements, captured at wiring time.
#[derive(Debug, Clone, Copy)]
struct MenuHandles {
    panel: NodeId,
    #[allow(dead_code)]
    open: NodeId,
    #[allow(dead_code)]
    close: NodeId,
}

/// Handle returned by [`apply_theme`]: owns the fallback engine and exposes
/// the operations the host's event dispatch binds to.
#[derive(Debug)]
pub struct ThemeRuntime {
    engine: FallbackEngine,
    nav: Option<NodeId>,
    banner: Option<NodeId>,
    footer: Option<NodeId>,
    menu: Option<MenuHandles>,
    wired: HashSet<NodeId>,
    palette: Option<String>,
    stats: ApplyStats,
}

impl ThemeRuntime {
    /// Report a load failure for an image; the fallback engine assigns the
    /// next candidate source. Safe to call for any node — non-images and
    /// capped elements are a no-op.
    pub fn handle_image_error(
        &mut self,
        doc: &mut Document,
        img: NodeId,
    ) -> Option<FallbackAction> {
        self.engine.handle_failure(doc, img)
    }

    /// Clear an image's fallback state and restore its original source.
    pub fn reset_image(&mut self, doc: &mut Document, img: NodeId) {
        self.engine.reset(doc, img);
    }

    /// Flip the mobile menu's off-canvas class. Returns the new state
    /// (`true` = open), or `None` when the menu was never wired.
    pub fn toggle_menu(&mut self, doc: &mut Document) -> Option<bool> {
        let menu = self.menu?;
        let hidden = doc.toggle_class(menu.panel, render::MENU_HIDDEN_CLASS);
        Some(!hidden)
    }

    /// Whether failures for this image are routed to the fallback engine.
    pub fn is_wired(&self, img: NodeId) -> bool {
        self.wired.contains(&img)
    }

    /// Read-only access to the fallback engine state.
    pub fn engine(&self) -> &FallbackEngine {
        &self.engine
    }

    /// The injected navigation element.
    pub fn nav(&self) -> Option<NodeId> {
        self.nav
    }

    /// The injected banner element, when a banner was configured.
    pub fn banner(&self) -> Option<NodeId> {
        self.banner
    }

    /// The injected footer element.
    pub fn footer(&self) -> Option<NodeId> {
        self.footer
    }

    /// The palette CSS injected in step 2, when colors were configured.
    pub fn palette_css(&self) -> Option<&str> {
        self.palette.as_deref()
    }

    pub fn stats(&self) -> ApplyStats {
        self.stats
    }
}

/// Apply a theme to a page. See the module docs for the step order.
pub fn apply_theme(doc: &mut Document, theme: &ThemeConfig) -> Result<ThemeRuntime, ApplyError> {
    theme.validate()?;

    let mut runtime = ThemeRuntime {
        engine: FallbackEngine::new(),
        nav: None,
        banner: None,
        footer: None,
        menu: None,
        wired: HashSet::new(),
        palette: None,
        stats: ApplyStats::default(),
    };

    inject_palette(doc, theme, &mut runtime);
    apply_class_map(doc, theme, &mut runtime.stats);

    // Navigation is always injected; its mobile menu scaffold is part of
    // the chrome even when no links are configured.
    let nav_id = inject_fragment(doc, InsertAt::BodyStart, render::nav(theme), &mut runtime);
    runtime.nav = nav_id;

    if let Some(banner_config) = &theme.banner {
        let at = match nav_id {
            Some(nav) => InsertAt::After(nav),
            None => InsertAt::BodyStart,
        };
        let banner_id = inject_fragment(doc, at, render::banner(theme, banner_config), &mut runtime);
        runtime.banner = banner_id;
    }

    let footer_id = inject_fragment(doc, InsertAt::BodyEnd, render::footer(theme), &mut runtime);
    runtime.footer = footer_id;

    runtime.menu = wire_menu(doc);
    wire_existing_images(doc, &mut runtime);

    Ok(runtime)
}

fn inject_palette(doc: &mut Document, theme: &ThemeConfig, runtime: &mut ThemeRuntime) {
    if theme.colors.is_empty() {
        return;
    }
    let css = palette_css(&theme.colors);
    let style = doc.push_element("style");
    doc.set_attr(style, "data-site-palette", "");
    let content = doc.push_raw(&format!("\n{css}\n"));
    doc.append_child(style, content);
    doc.insert_node(InsertAt::HeadEnd, style);
    runtime.palette = Some(css);
}

/// Remap semantic classes to utility classes across the whole page.
fn apply_class_map(doc: &mut Document, theme: &ThemeConfig, stats: &mut ApplyStats) {
    if theme.classes.is_empty() {
        log::warn!("no semantic class mappings configured; skipping class remapping");
        return;
    }
    for (semantic, utilities) in &theme.classes {
        let elements = doc.elements_with_class(semantic);
        if elements.is_empty() {
            continue;
        }
        stats.mappings_applied += 1;
        for id in elements {
            doc.remove_class(id, semantic);
            for token in utilities.split_whitespace() {
                doc.add_class(id, token);
            }
            stats.elements_restyled += 1;
        }
    }
}

/// Insert a rendered fragment and wire its images to the fallback engine.
/// Returns the fragment's first top-level element.
fn inject_fragment(
    doc: &mut Document,
    at: InsertAt,
    markup: maud::Markup,
    runtime: &mut ThemeRuntime,
) -> Option<NodeId> {
    let inserted = doc.insert_markup(at, &markup.into_string());
    let root = inserted
        .iter()
        .copied()
        .find(|&id| doc.element(id).is_some());
    for &id in &inserted {
        for img in doc.images_under(id) {
            if runtime.wired.insert(img) {
                runtime.stats.images_wired += 1;
            }
        }
    }
    root
}

/// Locate the mobile menu hook elements. All three must be present for the
/// toggle to be wired at all.
fn wire_menu(doc: &Document) -> Option<MenuHandles> {
    let panel = doc.first_with_class(render::MOBILE_MENU_CLASS)?;
    let open = doc.first_with_class(render::MOBILE_MENU_OPEN_CLASS)?;
    let close = doc.first_with_class(render::MOBILE_MENU_CLOSE_CLASS)?;
    Some(MenuHandles { panel, open, close })
}

/// Wire every image that has no failure handling yet. An image with its own
/// `onerror` attribute keeps it.
fn wire_existing_images(doc: &Document, runtime: &mut ThemeRuntime) {
    for img in doc.images() {
        if doc.attr(img, "onerror").is_some() {
            continue;
        }
        if runtime.wired.insert(img) {
            runtime.stats.images_wired += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{body_tags, sample_page, sample_theme};

    #[test]
    fn remaps_semantic_classes_to_utility_classes() {
        let mut doc = sample_page();
        let runtime = apply_theme(&mut doc, &sample_theme()).unwrap();

        let h1 = doc.first_tag("h1").unwrap();
        assert!(!doc.has_class(h1, "hero-title"));
        assert!(doc.has_class(h1, "text-4xl"));
        assert!(doc.has_class(h1, "font-bold"));
        assert_eq!(runtime.stats().mappings_applied, 2);
        assert_eq!(runtime.stats().elements_restyled, 2);
    }

    #[test]
    fn empty_class_map_skips_only_that_step() {
        let mut doc = sample_page();
        let mut theme = sample_theme();
        theme.classes.clear();
        let runtime = apply_theme(&mut doc, &theme).unwrap();

        let h1 = doc.first_tag("h1").unwrap();
        assert!(doc.has_class(h1, "hero-title"));
        // The rest of the pipeline still ran.
        assert!(runtime.nav().is_some());
        assert!(runtime.footer().is_some());
    }

    #[test]
    fn chrome_lands_at_the_fixed_anchors() {
        let mut doc = sample_page();
        apply_theme(&mut doc, &sample_theme()).unwrap();
        assert_eq!(body_tags(&doc), ["nav", "section", "main", "footer"]);
    }

    #[test]
    fn banner_skipped_when_unconfigured() {
        let mut doc = sample_page();
        let mut theme = sample_theme();
        theme.banner = None;
        let runtime = apply_theme(&mut doc, &theme).unwrap();
        assert!(runtime.banner().is_none());
        assert_eq!(body_tags(&doc), ["nav", "main", "footer"]);
    }

    #[test]
    fn palette_style_is_injected_into_head() {
        let mut doc = sample_page();
        let runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        assert!(runtime.palette_css().unwrap().contains("--color-primary: #5E2121;"));

        let head = doc.head().unwrap();
        let style = doc
            .children(head)
            .iter()
            .copied()
            .find(|&id| doc.element(id).is_some_and(|el| el.tag == "style"))
            .expect("style element in head");
        assert!(doc.attr(style, "data-site-palette").is_some());
        assert!(doc.to_html().contains("--color-accent: #D4AF37;"));
    }

    #[test]
    fn no_palette_style_without_colors() {
        let mut doc = sample_page();
        let mut theme = sample_theme();
        theme.colors.clear();
        let runtime = apply_theme(&mut doc, &theme).unwrap();
        assert!(runtime.palette_css().is_none());
        assert!(!doc.to_html().contains("data-site-palette"));
    }

    #[test]
    fn menu_toggle_flips_the_panel() {
        let mut doc = sample_page();
        let mut runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        let panel = doc.first_with_class(render::MOBILE_MENU_CLASS).unwrap();
        assert!(doc.has_class(panel, render::MENU_HIDDEN_CLASS));

        assert_eq!(runtime.toggle_menu(&mut doc), Some(true));
        assert!(!doc.has_class(panel, render::MENU_HIDDEN_CLASS));
        assert_eq!(runtime.toggle_menu(&mut doc), Some(false));
        assert!(doc.has_class(panel, render::MENU_HIDDEN_CLASS));
    }

    #[test]
    fn menu_wiring_needs_all_three_elements() {
        let doc = Document::parse(r#"<body><div class="mobile-menu"></div></body>"#);
        assert!(wire_menu(&doc).is_none());
    }

    #[test]
    fn pre_existing_images_are_defensively_wired() {
        let mut doc = sample_page();
        let runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        let main = doc.first_tag("main").unwrap();
        let photo = crate::test_helpers::only_image_under(&doc, main);
        assert!(runtime.is_wired(photo));
    }

    #[test]
    fn images_with_their_own_handler_are_left_alone() {
        let mut doc = Document::parse(
            r#"<body><img src="a.png" onerror="custom()"><img src="b.png"></body>"#,
        );
        let runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        let images = doc.images();
        let custom = images
            .iter()
            .copied()
            .find(|&id| doc.attr(id, "onerror").is_some())
            .unwrap();
        assert!(!runtime.is_wired(custom));
        assert_eq!(runtime.stats().images_wired, runtime_wired_count(&runtime, &doc));
    }

    // Injected chrome carries 3 images (banner bg, banner logo, footer logo);
    // plus wired pre-existing ones.
    fn runtime_wired_count(runtime: &ThemeRuntime, doc: &Document) -> usize {
        doc.images()
            .into_iter()
            .filter(|&id| runtime.is_wired(id))
            .count()
    }

    #[test]
    fn injected_images_are_wired_once() {
        let mut doc = sample_page();
        let runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        // banner bg + banner logo + footer logo + pre-existing photo
        assert_eq!(runtime.stats().images_wired, 4);
    }

    #[test]
    fn runtime_routes_failures_to_the_engine() {
        let mut doc = sample_page();
        let mut runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        let banner = runtime.banner().unwrap();
        let banner_img = doc.images_under(banner)[0];

        let action = runtime.handle_image_error(&mut doc, banner_img).unwrap();
        assert_eq!(action, FallbackAction::AdjacentFile("banner.jpg".into()));

        runtime.reset_image(&mut doc, banner_img);
        assert_eq!(doc.attr(banner_img, "src"), Some("images/banner.jpg"));
        assert!(runtime.engine().state(banner_img).is_none());
    }

    #[test]
    fn invalid_config_fails_before_touching_the_page() {
        let mut doc = sample_page();
        let before = doc.to_html();
        let mut theme = sample_theme();
        theme.navigation.push(crate::config::NavLink {
            name: "broken".into(),
            href: "".into(),
        });
        assert!(apply_theme(&mut doc, &theme).is_err());
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn applies_to_body_less_fragment() {
        let mut doc = Document::parse("<main><p class=\"body-text\">x</p></main>");
        let runtime = apply_theme(&mut doc, &sample_theme()).unwrap();
        assert!(runtime.nav().is_some());
        let html = doc.to_html();
        assert!(html.starts_with("<style") || html.starts_with("<nav"));
        assert!(html.trim_end().ends_with("</footer>"));
    }
}

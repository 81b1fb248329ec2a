//! Shared test utilities for the site-chrome test suite.
//!
//! Provides a fully-populated sample theme, a representative host page, and
//! lookup helpers that panic with a clear message on a miss.

use crate::config::{BannerConfig, ContactConfig, FooterConfig, NavLink, ThemeConfig};
use crate::page::{Document, NodeId};
use std::collections::BTreeMap;

/// A theme exercising every configuration field.
pub fn sample_theme() -> ThemeConfig {
    let mut colors = BTreeMap::new();
    colors.insert("primary".to_string(), "#5E2121".to_string());
    colors.insert("accent".to_string(), "#D4AF37".to_string());

    let mut classes = BTreeMap::new();
    classes.insert("hero-title".to_string(), "text-4xl font-bold".to_string());
    classes.insert(
        "body-text".to_string(),
        "text-base leading-relaxed".to_string(),
    );

    ThemeConfig {
        colors,
        classes,
        navigation: vec![
            NavLink { name: "Home".into(), href: "/".into() },
            NavLink { name: "About".into(), href: "/about.html".into() },
        ],
        banner: Some(BannerConfig {
            title: "Welcome".into(),
            image_url: "images/banner.jpg".into(),
        }),
        footer: FooterConfig {
            contact: ContactConfig {
                phone: Some("+1 555 0100".into()),
                email: Some("hello@example.com".into()),
            },
            copyright: Some("© 2026 Example Org".into()),
        },
        logo_url: Some("images/logo.png".into()),
        fallback_base_url: Some("https://cdn.example.com".into()),
        banner_gdrive_id: Some("BANNER1".into()),
        logo_gdrive_id: Some("LOGO1".into()),
    }
}

/// A host page with a head, semantic classes, and a pre-existing image.
pub fn sample_page() -> Document {
    Document::parse(
        r#"<html><head><title>Sample</title></head><body>
<main>
<h1 class="hero-title">Hello</h1>
<p class="body-text">Text</p>
<img src="content/photo.jpg" alt="A photo">
</main>
</body></html>"#,
    )
}

/// Tags of the direct element children of `<body>`, in order.
pub fn body_tags(doc: &Document) -> Vec<String> {
    let body = doc.body().expect("page has no body");
    doc.children(body)
        .iter()
        .filter_map(|&id| doc.element(id).map(|el| el.tag.clone()))
        .collect()
}

/// Find the single image below a node. Panics listing what was found.
pub fn only_image_under(doc: &Document, root: NodeId) -> NodeId {
    let images = doc.images_under(root);
    match images.as_slice() {
        [img] => *img,
        other => panic!("expected exactly one image, found {}", other.len()),
    }
}

//! Chrome markup fragments.
//!
//! Builds the three injected pieces of page chrome — top navigation, hero
//! banner, footer — from the theme configuration. Markup is generated with
//! [maud](https://maud.lambda.xyz/): type-safe, compile-time-checked, and
//! auto-escaping, so link names and titles from the config cannot inject
//! markup.
//!
//! Every `<img>` these fragments emit carries the two fallback-configuration
//! attributes ([`ATTR_FALLBACK_BASE`](crate::fallback::ATTR_FALLBACK_BASE)
//! and [`ATTR_GDRIVE_ID`](crate::fallback::ATTR_GDRIVE_ID)) populated from
//! the theme, empty when unconfigured. The fallback machine reads them off
//! the element and never needs the theme itself.

use crate::config::{BannerConfig, ThemeConfig};
use chrono::Datelike;
use maud::{Markup, html};

/// Hook class of the slide-in mobile menu panel; [`crate::apply`] toggles
/// its `translate-x-full` hidden state.
pub const MOBILE_MENU_CLASS: &str = "mobile-menu";
pub const MOBILE_MENU_OPEN_CLASS: &str = "mobile-menu-open";
pub const MOBILE_MENU_CLOSE_CLASS: &str = "mobile-menu-close";

/// Class that keeps the mobile menu translated off-canvas.
pub const MENU_HIDDEN_CLASS: &str = "translate-x-full";

/// Top navigation: desktop link row plus hamburger-toggled mobile panel.
pub fn nav(theme: &ThemeConfig) -> Markup {
    let last = theme.navigation.len().saturating_sub(1);
    html! {
        nav class="absolute top-0 left-0 right-0 z-50 bg-gradient-to-r from-black/20 to-black/10 backdrop-blur-sm" {
            div class="max-w-7xl mx-auto px-4 sm:px-6 lg:px-8" {
                div class="flex justify-between items-center h-16" {
                    button class=(format!("{MOBILE_MENU_OPEN_CLASS} md:hidden text-white hover:text-accent transition-colors")) {
                        svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24" {
                            path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M4 6h16M4 12h16M4 18h16" {}
                        }
                    }
                    div class="hidden md:flex space-x-8 mx-auto" {
                        @for link in &theme.navigation {
                            a href=(link.href) class="nav-link text-white hover:text-accent font-medium text-lg tracking-wide" {
                                (link.name)
                            }
                        }
                    }
                    div class="md:hidden w-6" {}
                }
            }
            div class=(format!("{MOBILE_MENU_CLASS} fixed top-0 right-0 h-full w-64 bg-primary/95 backdrop-blur-sm md:hidden {MENU_HIDDEN_CLASS} transition-transform duration-300 ease-in-out")) {
                div class="flex justify-end p-4" {
                    button class=(format!("{MOBILE_MENU_CLOSE_CLASS} text-white hover:text-accent")) {
                        svg class="w-6 h-6" fill="none" stroke="currentColor" viewBox="0 0 24 24" {
                            path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M6 18L18 6M6 6l12 12" {}
                        }
                    }
                }
                nav class="px-4 space-y-6" {
                    @for (i, link) in theme.navigation.iter().enumerate() {
                        @let border = if i < last { " border-b border-white/20" } else { "" };
                        a href=(link.href)
                            class=(format!("block text-white hover:text-accent font-medium text-lg py-2{border}")) {
                            (link.name)
                        }
                    }
                }
            }
        }
    }
}

/// Hero banner: full-bleed background image, gradient overlay, positioned
/// logo, and the configured title.
pub fn banner(theme: &ThemeConfig, banner: &BannerConfig) -> Markup {
    html! {
        section class="relative h-[500px] flex items-end justify-center text-center text-white" {
            img src=(banner.image_url)
                alt="Banner background"
                class="absolute top-0 left-0 w-full h-full object-cover z-10"
                data-fallback-base-url=(theme.fallback_base_url.as_deref().unwrap_or(""))
                data-gdrive-fid=(theme.banner_gdrive_id.as_deref().unwrap_or(""));
            div class="absolute top-0 left-0 w-full h-full banner-overlay-gradient z-20" {}
            div class="absolute top-20 left-5 md:top-24 md:left-8 z-30 flex flex-col items-center gap-2.5 p-4" {
                (logo_img(theme, "w-48 md:w-72 h-auto object-contain logo-glow"))
            }
            div class="banner-content relative z-30 max-w-5xl px-5 pb-16" {
                h1 class="text-4xl md:text-6xl font-bold text-shadow-enhanced tracking-wider text-white" {
                    (banner.title)
                }
            }
        }
    }
}

/// Footer: logo, optional contact lines, copyright strip.
pub fn footer(theme: &ThemeConfig) -> Markup {
    let contact = &theme.footer.contact;
    let copyright = theme
        .footer
        .copyright
        .clone()
        .unwrap_or_else(default_copyright);
    html! {
        footer class="bg-primary text-white py-8 w-full" {
            div class="w-full px-5 md:px-8 lg:px-12" {
                div class="flex flex-col md:flex-row justify-between items-start md:items-center gap-8 mb-6" {
                    div class="flex items-center gap-4" {
                        (logo_img(theme, "w-[280px] h-auto object-contain"))
                    }
                    div class="text-left md:text-right" {
                        @if let Some(phone) = &contact.phone {
                            div { (phone) }
                        }
                        @if let Some(email) = &contact.email {
                            div { (email) }
                        }
                    }
                }
                div class="border-t border-white/20 pt-4" {
                    div class="text-base text-center md:text-left" { (copyright) }
                }
            }
        }
    }
}

/// The site logo image with fallback attributes wired from the theme.
fn logo_img(theme: &ThemeConfig, classes: &str) -> Markup {
    html! {
        img src=(theme.logo_url.as_deref().unwrap_or(""))
            alt="Site logo"
            class=(classes)
            data-fallback-base-url=(theme.fallback_base_url.as_deref().unwrap_or(""))
            data-gdrive-fid=(theme.logo_gdrive_id.as_deref().unwrap_or(""));
    }
}

fn default_copyright() -> String {
    format!("© {} Your Organization", chrono::Utc::now().year())
}

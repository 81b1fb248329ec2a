//! CLI output formatting.
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::apply::ThemeRuntime;
use crate::config::ThemeConfig;

/// Summarize what applying a theme did to a page.
pub fn format_apply_report(theme: &ThemeConfig, runtime: &ThemeRuntime) -> Vec<String> {
    let stats = runtime.stats();
    let mut lines = Vec::new();

    lines.push(format!(
        "Classes: {} mapping(s) applied, {} element(s) restyled",
        stats.mappings_applied, stats.elements_restyled
    ));
    lines.push(format!(
        "Navigation: injected ({} link(s))",
        theme.navigation.len()
    ));
    lines.push(match runtime.banner() {
        Some(_) => "Banner: injected".to_string(),
        None => "Banner: not configured".to_string(),
    });
    lines.push("Footer: injected".to_string());
    if runtime.palette_css().is_some() {
        lines.push(format!("Palette: {} color(s)", theme.colors.len()));
    }
    lines.push(format!(
        "Images: {} wired for fallback handling",
        stats.images_wired
    ));
    lines
}

pub fn print_apply_report(theme: &ThemeConfig, runtime: &ThemeRuntime) {
    for line in format_apply_report(theme, runtime) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_theme;
    use crate::test_helpers::{sample_page, sample_theme};

    #[test]
    fn report_covers_every_stage() {
        let mut doc = sample_page();
        let theme = sample_theme();
        let runtime = apply_theme(&mut doc, &theme).unwrap();
        let lines = format_apply_report(&theme, &runtime);

        assert!(lines.iter().any(|l| l.contains("2 mapping(s)")));
        assert!(lines.iter().any(|l| l.contains("2 link(s)")));
        assert!(lines.contains(&"Banner: injected".to_string()));
        assert!(lines.iter().any(|l| l.contains("2 color(s)")));
        assert!(lines.iter().any(|l| l.contains("4 wired")));
    }

    #[test]
    fn report_notes_missing_banner() {
        let mut doc = sample_page();
        let mut theme = sample_theme();
        theme.banner = None;
        let runtime = apply_theme(&mut doc, &theme).unwrap();
        let lines = format_apply_report(&theme, &runtime);
        assert!(lines.contains(&"Banner: not configured".to_string()));
    }
}

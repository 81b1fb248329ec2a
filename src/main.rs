use clap::{Parser, Subcommand};
use site_chrome::{apply, config, output, page, placeholder};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "site-chrome")]
#[command(about = "Apply a theme to a static HTML page")]
#[command(long_about = "\
Apply a theme to a static HTML page

Reads a theme configuration (TOML or JSON) and a page, then remaps semantic
CSS classes to utility classes, injects navigation, hero banner, and footer
chrome, and wires every image for multi-stage fallback handling:

  1. the image's filename, adjacent to the page
  2. fallbackBaseUrl + filename
  3. a cloud-drive direct-view URL (per-image file id)
  4. a generated 'IMAGE NOT FOUND' SVG placeholder

Run 'site-chrome gen-theme' to generate a documented theme.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a theme to a page
    Apply {
        /// Input HTML page
        #[arg(long)]
        page: PathBuf,
        /// Theme file (TOML, or JSON with a .json extension)
        #[arg(long, default_value = "theme.toml")]
        theme: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load and validate a theme file without touching any page
    Check {
        /// Theme file to validate
        #[arg(long, default_value = "theme.toml")]
        theme: PathBuf,
    },
    /// Print a stock theme.toml with all options documented
    GenTheme,
    /// Print the placeholder data URI generated for a filename
    Placeholder {
        /// Filename embedded in the placeholder
        filename: String,
        /// Alt text line (omitted when empty)
        #[arg(long, default_value = "")]
        alt: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Apply { page: page_path, theme, output: out } => {
            let html = std::fs::read_to_string(&page_path)?;

            // A missing theme skips rendering entirely rather than applying
            // a partial default: warn and pass the page through unchanged.
            if !theme.exists() {
                eprintln!(
                    "warning: theme configuration {} not found; page left unmodified",
                    theme.display()
                );
                write_output(out.as_deref(), &html)?;
                return Ok(());
            }

            let theme = config::ThemeConfig::load(&theme)?;
            let mut doc = page::Document::parse(&html);
            let runtime = apply::apply_theme(&mut doc, &theme)?;
            write_output(out.as_deref(), &doc.to_html())?;
            if out.is_some() {
                output::print_apply_report(&theme, &runtime);
            }
        }
        Command::Check { theme } => {
            let config = config::ThemeConfig::load(&theme)?;
            println!("Theme is valid");
            println!(
                "  {} color(s), {} class mapping(s), {} navigation link(s)",
                config.colors.len(),
                config.classes.len(),
                config.navigation.len()
            );
            println!(
                "  banner: {}",
                if config.banner.is_some() { "configured" } else { "none" }
            );
        }
        Command::GenTheme => {
            print!("{}", config::stock_theme_toml());
        }
        Command::Placeholder { filename, alt } => {
            println!("{}", placeholder::data_uri(&filename, &alt));
        }
    }

    Ok(())
}

fn write_output(out: Option<&std::path::Path>, html: &str) -> std::io::Result<()> {
    match out {
        Some(path) => std::fs::write(path, html),
        None => {
            println!("{html}");
            Ok(())
        }
    }
}

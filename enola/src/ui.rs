//! Terminal display logic for the enola CLI.
//!
//! This module handles colored result lines, grouped batch output, the spinner,
//! progress counters, headers, summaries and catalog listings. Uses only the
//! `console` crate.

use console::{pad_str, style, Alignment, Term};
use enola_lib::{Catalog, ProbeResult, SiteDefinition};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const NAME_WIDTH: usize = 28;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with the given message, or return `None` if stderr isn't a TTY.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(username: &str, site_count: usize, pool_width: usize, site_filter: Option<&str>) {
    println!(
        "{} {} {}",
        style("enola").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— Checking '{}' on {} site{}",
            username,
            site_count,
            plural(site_count)
        ))
        .dim(),
    );

    let mut meta_parts: Vec<String> = Vec::new();
    if let Some(query) = site_filter {
        meta_parts.push(format!("Filter: {}", query));
    }
    meta_parts.push(format!("Concurrency: {}", pool_width));

    println!("{}", style(meta_parts.join(" | ")).dim());
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Print one result in pretty mode.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &ProbeResult, counter: Option<(usize, usize)>) {
    let padded_name = pad_str(&result.name, NAME_WIDTH, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    if result.found {
        println!(
            "  {}{}  {}  {}",
            prefix,
            style(&padded_name).white(),
            style(status_label(true)).green().bold(),
            style(&result.resolved_url).cyan(),
        );
    } else {
        println!(
            "  {}{}  {}",
            prefix,
            style(&padded_name).white(),
            style(status_label(false)).dim(),
        );
    }
}

/// Print one result in the default flat format.
pub fn print_result_default(result: &ProbeResult) {
    if result.found {
        println!(
            "{} {}: {}",
            style("[+]").green().bold(),
            style(&result.name).bold(),
            result.resolved_url
        );
    } else {
        println!("{} {}", style("[-]").dim(), style(&result.name).dim());
    }
}

// ── Grouped batch output ─────────────────────────────────────────────────────

/// Print results grouped into Found and Not Found sections.
/// Empty sections are omitted entirely.
pub fn print_grouped_results(results: &[ProbeResult]) {
    let (found, missing): (Vec<&ProbeResult>, Vec<&ProbeResult>) =
        results.iter().partition(|r| r.found);

    if !found.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Found ({}) ", found.len())).green().bold(),
            style("─".repeat(44)).green().dim(),
        );
        for r in &found {
            let padded = pad_str(&r.name, NAME_WIDTH, Alignment::Left, Some(".."));
            println!("    {}  {}", style(&padded).white(), style(&r.resolved_url).cyan());
        }
        println!();
    }

    if !missing.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Not Found ({}) ", missing.len())).dim().bold(),
            style("─".repeat(40)).dim(),
        );
        for r in &missing {
            println!("    {}", style(&r.name).dim());
        }
        println!();
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(total: usize, found: usize, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!("  {}", summary_line(total, found, duration));
}

/// Print a warning for a scan that was cancelled before every site answered.
pub fn print_interrupted(completed: usize, total: usize) {
    eprintln!(
        "{} scan interrupted: {} of {} site{} checked",
        style("warning:").yellow().bold(),
        completed,
        total,
        plural(total)
    );
}

fn summary_line(total: usize, found: usize, duration: Duration) -> String {
    format!(
        "{} site{} in {:.1}s  {}  {}  {}  {}",
        style(total).bold(),
        plural(total),
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} found", found)).green(),
        style("|").dim(),
        style(format!("{} not found", total - found)).dim(),
    )
}

// ── Catalog listing ──────────────────────────────────────────────────────────

/// Print every site of `catalog` in name order with its home page, then a count.
pub fn print_site_list(catalog: &Catalog) {
    for name in catalog.names() {
        if let Some(site) = catalog.get(name) {
            let padded = pad_str(name, NAME_WIDTH, Alignment::Left, Some(".."));
            println!("  {}  {}", style(&padded).white(), style(site_home(site)).dim());
        }
    }
    println!();
    println!(
        "  {} site{}",
        style(catalog.len()).bold(),
        plural(catalog.len())
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Home page of a site, falling back to its profile URL template.
pub fn site_home(site: &SiteDefinition) -> &str {
    site.url_main.as_deref().unwrap_or(&site.url_template)
}

fn status_label(found: bool) -> &'static str {
    if found {
        "FOUND"
    } else {
        "NOT FOUND"
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use enola_lib::{DetectionMessage, DetectionStrategy};

    fn make_site(url_main: Option<&str>) -> SiteDefinition {
        SiteDefinition {
            name: "Example".to_string(),
            url_template: "https://example.com/{}".to_string(),
            strategy: DetectionStrategy::StatusCode,
            message: DetectionMessage::Unusable,
            url_main: url_main.map(str::to_string),
            username_claimed: None,
            username_unclaimed: None,
        }
    }

    #[test]
    fn test_site_home_prefers_main_url() {
        assert_eq!(site_home(&make_site(Some("https://example.com/"))), "https://example.com/");
        assert_eq!(site_home(&make_site(None)), "https://example.com/{}");
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(true), "FOUND");
        assert_eq!(status_label(false), "NOT FOUND");
    }

    #[test]
    fn test_summary_line_counts() {
        console::set_colors_enabled(false);
        let line = summary_line(12, 3, Duration::from_millis(2500));
        assert!(line.starts_with("12 sites in 2.5s"));
        assert!(line.contains("3 found"));
        assert!(line.contains("9 not found"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
        assert_eq!(plural(2), "s");
    }
}

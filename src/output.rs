//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what changed, not with how it was computed. Each
//! document shows up under the status that matters for the next step (new,
//! updated, removed) with its source URI; identical documents are only
//! counted. Failures are listed last, right before the summary line, so they
//! are the last thing on screen.
//!
//! # Output Format
//!
//! ## Build / Status
//!
//! ```text
//! New
//! 001 posts/hello.md
//! Updated
//! 001 about.md
//! Removed
//! 001 posts/old.md
//!
//! Registered types
//!     project
//!
//! Failures
//!     drafts/broken.md: Cannot read source drafts/broken.md: permission denied
//!
//! 1 new, 1 updated, 1 removed, 4 identical
//! ```
//!
//! ## Types
//!
//! ```text
//! Document types
//! 001 page (built-in)
//!     Extractors: pages, published_pages
//! 006 tag
//!     Extractors: tags
//! ```
//!
//! ## Paginate
//!
//! ```text
//! 5 items, 2 per page, 3 pages (directory naming)
//! 001 index.html
//!     Items: 1-2
//!     Next: 2
//! 002 2/index.html
//!     Items: 3-4
//!     Previous: (root)
//!     Next: 3
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::detect::Status;
use crate::doctype::{BUILTIN_TYPES, DocumentTypeRegistry};
use crate::extract::{ExtractorRegistry, collection_key, published_key};
use crate::paginate::{PageLink, PageNaming, PreviousPage};
use crate::pass::PassReport;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Section header followed by indexed entries. Nothing for an empty list.
fn indexed_section(lines: &mut Vec<String>, title: &str, entries: &[&str]) {
    if entries.is_empty() {
        return;
    }
    lines.push(title.to_string());
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), entry));
    }
}

/// Human-readable 1-based item span, e.g. `3-4`, or `none`.
fn item_span(items: &std::ops::Range<usize>) -> String {
    match items.len() {
        0 => "none".to_string(),
        1 => format!("{}", items.start + 1),
        _ => format!("{}-{}", items.start + 1, items.end),
    }
}

// ============================================================================
// Build / status
// ============================================================================

/// Format a pass report: changed documents by status, newly registered
/// types, failures, then the summary line.
pub fn format_pass_report(report: &PassReport) -> Vec<String> {
    let mut lines = Vec::new();

    for status in [Status::New, Status::Updated, Status::Removed] {
        let uris: Vec<&str> = report
            .statuses
            .iter()
            .filter(|(_, s)| *s == status)
            .map(|(u, _)| u.as_str())
            .collect();
        let title = match status {
            Status::New => "New",
            Status::Updated => "Updated",
            _ => "Removed",
        };
        indexed_section(&mut lines, title, &uris);
    }

    if !report.registered_types.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Registered types".to_string());
        for t in &report.registered_types {
            lines.push(format!("{}{}", indent(1), t));
        }
    }

    if !report.failures.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failures".to_string());
        for failure in &report.failures {
            lines.push(format!("{}{}", indent(1), failure));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(report.counts.to_string());
    lines
}

/// Print a pass report to stdout.
pub fn print_pass_report(report: &PassReport) {
    for line in format_pass_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Types
// ============================================================================

/// Format every known document type with the extractor keys bound for it.
pub fn format_types(types: &DocumentTypeRegistry, extractors: &ExtractorRegistry) -> Vec<String> {
    let mut lines = vec!["Document types".to_string()];
    for (i, type_name) in types.all_types().into_iter().enumerate() {
        let marker = if BUILTIN_TYPES.contains(&type_name) {
            " (built-in)"
        } else {
            ""
        };
        lines.push(format!("{} {}{}", format_index(i + 1), type_name, marker));

        let keys: Vec<String> = [collection_key(type_name), published_key(type_name)]
            .into_iter()
            .filter(|k| extractors.contains_key(k))
            .collect();
        if keys.is_empty() {
            lines.push(format!("{}Extractors: none", indent(1)));
        } else {
            lines.push(format!("{}Extractors: {}", indent(1), keys.join(", ")));
        }
    }
    lines
}

/// Print the type listing to stdout.
pub fn print_types(types: &DocumentTypeRegistry, extractors: &ExtractorRegistry) {
    for line in format_types(types, extractors) {
        println!("{}", line);
    }
}

// ============================================================================
// Paginate
// ============================================================================

/// Format a pagination plan, one entry per page.
pub fn format_pagination(
    plan: &[PageLink],
    total_items: usize,
    page_size: usize,
    naming: PageNaming,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} items, {} per page, {} pages ({} naming)",
        total_items,
        page_size,
        plan.len(),
        naming
    )];
    for page in plan {
        lines.push(format!("{} {}", format_index(page.number), page.file_name));
        lines.push(format!("{}Items: {}", indent(1), item_span(&page.items)));
        match page.previous {
            PreviousPage::None => {}
            PreviousPage::Root => lines.push(format!("{}Previous: (root)", indent(1))),
            PreviousPage::Page(n) => lines.push(format!("{}Previous: {}", indent(1), n)),
        }
        if let Some(next) = page.next {
            lines.push(format!("{}Next: {}", indent(1), next));
        }
    }
    lines
}

/// Print a pagination plan to stdout.
pub fn print_pagination(plan: &[PageLink], total_items: usize, page_size: usize, naming: PageNaming) {
    for line in format_pagination(plan, total_items, page_size, naming) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypesConfig;
    use crate::detect::StatusCounts;
    use crate::paginate::PageSequence;
    use crate::pass::{DocumentFailure, RenderError, init_registries};

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_triple_digit() {
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn item_span_forms() {
        assert_eq!(item_span(&(0..0)), "none");
        assert_eq!(item_span(&(4..5)), "5");
        assert_eq!(item_span(&(2..4)), "3-4");
    }

    // =========================================================================
    // Pass report
    // =========================================================================

    fn report(statuses: &[(&str, Status)]) -> PassReport {
        let statuses: Vec<(String, Status)> = statuses
            .iter()
            .map(|(u, s)| (u.to_string(), *s))
            .collect();
        PassReport {
            counts: statuses.iter().map(|(_, s)| *s).collect(),
            statuses,
            ..PassReport::default()
        }
    }

    #[test]
    fn pass_report_groups_by_status() {
        let r = report(&[
            ("about.md", Status::Updated),
            ("posts/a.md", Status::New),
            ("posts/b.md", Status::New),
            ("same.md", Status::Identical),
            ("old.md", Status::Removed),
        ]);
        let lines = format_pass_report(&r);
        assert_eq!(
            lines,
            vec![
                "New",
                "001 posts/a.md",
                "002 posts/b.md",
                "Updated",
                "001 about.md",
                "Removed",
                "001 old.md",
                "",
                "2 new, 1 updated, 1 removed, 1 identical",
            ]
        );
    }

    #[test]
    fn pass_report_all_identical_is_summary_only() {
        let r = report(&[("a.md", Status::Identical)]);
        assert_eq!(
            format_pass_report(&r),
            vec!["0 new, 0 updated, 0 removed, 1 identical"]
        );
    }

    #[test]
    fn pass_report_lists_types_and_failures() {
        let mut r = report(&[("projects/x.md", Status::New)]);
        r.registered_types.push("project".into());
        r.failures.push(DocumentFailure {
            source_uri: "projects/y.md".into(),
            error: RenderError::Failed("template missing".into()).into(),
        });
        let lines = format_pass_report(&r);
        assert!(lines.contains(&"Registered types".to_string()));
        assert!(lines.contains(&"    project".to_string()));
        assert!(lines.contains(&"    projects/y.md: Render failed: template missing".to_string()));
        assert_eq!(lines.last().unwrap(), &StatusCounts { new: 1, ..Default::default() }.to_string());
    }

    // =========================================================================
    // Types
    // =========================================================================

    #[test]
    fn types_listing_shows_extractor_keys() {
        let config = TypesConfig {
            custom: vec!["project".into(), "tag".into()],
            unpublished: vec!["tag".into()],
        };
        let (types, extractors) = init_registries(&config).unwrap();
        let lines = format_types(&types, &extractors.read().unwrap());

        assert_eq!(lines[0], "Document types");
        assert_eq!(lines[1], "001 page (built-in)");
        assert_eq!(lines[2], "    Extractors: pages, published_pages");
        assert!(lines.contains(&"006 project".to_string()));
        assert!(lines.contains(&"    Extractors: projects, published_projects".to_string()));
        assert_eq!(lines.last().unwrap(), "    Extractors: tags");
    }

    #[test]
    fn types_listing_without_bindings() {
        let types = DocumentTypeRegistry::new();
        let lines = format_types(&types, &ExtractorRegistry::new());
        assert_eq!(lines.len(), 1 + 2 * 5);
        assert_eq!(lines[2], "    Extractors: none");
    }

    // =========================================================================
    // Paginate
    // =========================================================================

    #[test]
    fn pagination_plan_lines() {
        let seq = PageSequence::new(5, 2).unwrap();
        let plan = seq.pages("index.html", PageNaming::Directory);
        let lines = format_pagination(&plan, 5, 2, PageNaming::Directory);
        assert_eq!(
            lines,
            vec![
                "5 items, 2 per page, 3 pages (directory naming)",
                "001 index.html",
                "    Items: 1-2",
                "    Next: 2",
                "002 2/index.html",
                "    Items: 3-4",
                "    Previous: (root)",
                "    Next: 3",
                "003 3/index.html",
                "    Items: 5",
                "    Previous: 2",
            ]
        );
    }

    #[test]
    fn pagination_plan_empty() {
        let lines = format_pagination(&[], 0, 10, PageNaming::Suffix);
        assert_eq!(lines, vec!["0 items, 10 per page, 0 pages (suffix naming)"]);
    }
}

//! Result rendering for the terminal and for scripts.

use super::OutputFormat;
use console::{style, Term};
use similar_image_finder::core::cleanup::DeletionReport;
use similar_image_finder::core::pipeline::PipelineResult;
use similar_image_finder::error::Result;
use std::path::Path;

pub fn print_results(term: &Term, result: &PipelineResult, output: OutputFormat, verbose: bool) -> Result<()> {
    match output {
        OutputFormat::Pretty => print_pretty_results(term, result, verbose),
        OutputFormat::Json => print_json_results(term, result)?,
        OutputFormat::Minimal => print_minimal_results(term, result),
    }
    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(result.total_images).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(result.groups.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate images",
        style(result.duplicate_count()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(result.potential_savings_bytes())).yellow()
    ))
    .ok();

    if verbose {
        let stats = &result.cache_stats;
        term.write_line(&format!(
            "  {}",
            style(format!(
                "{} comparisons, cache {} hits / {} misses / {} evictions",
                result.comparisons, stats.hits, stats.misses, stats.evictions
            ))
            .dim()
        ))
        .ok();
    }

    if !result.excluded.is_empty() {
        term.write_line(&format!(
            "  {} images could not be decoded and were skipped",
            style(result.excluded.len()).red()
        ))
        .ok();
        for (id, error) in &result.excluded {
            term.write_line(&format!("    {} {}", style("✗").red(), display_path(id.path())))
                .ok();
            if verbose {
                term.write_line(&format!("      {}", style(error).dim())).ok();
            }
        }
    }

    for error in &result.errors {
        term.write_line(&format!("  {} {}", style("!").yellow(), error)).ok();
    }

    term.write_line("").ok();

    if result.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
        return;
    }

    term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for (i, group) in result.groups.iter().enumerate() {
        term.write_line(&format!(
            "  {} ({} images, {})",
            style(format!("Group {}:", i + 1)).bold(),
            group.members.len() + 1,
            format_bytes(group.duplicate_size_bytes)
        ))
        .ok();

        term.write_line(&format!(
            "    {} {}",
            style("★").green(),
            display_path(group.representative.path())
        ))
        .ok();
        for (member, score) in group.members.iter().zip(&group.scores) {
            term.write_line(&format!(
                "    {} {} {}",
                style("○").dim(),
                display_path(member.path()),
                style(format!("({:.3})", score)).dim()
            ))
            .ok();
        }

        term.write_line("").ok();
    }
}

pub fn print_scan_footer(term: &Term) {
    term.write_line(&format!(
        "{}",
        style("No files were deleted. Groups are greedy: file order can change them.").dim()
    ))
    .ok();
}

fn print_json_results(term: &Term, result: &PipelineResult) -> Result<()> {
    let output = serde_json::json!({
        "total_images": result.total_images,
        "duplicate_groups": result.groups.len(),
        "duplicate_count": result.duplicate_count(),
        "potential_savings_bytes": result.potential_savings_bytes(),
        "duration_ms": result.duration_ms,
        "comparisons": result.comparisons,
        "dimension_mismatches": result.dimension_mismatches,
        "cache": result.cache_stats,
        "groups": result.groups,
        "excluded": result.excluded.iter().map(|(id, error)| {
            serde_json::json!({
                "path": id,
                "reason": error.to_string(),
            })
        }).collect::<Vec<_>>(),
        "errors": result.errors,
    });

    term.write_line(&serde_json::to_string_pretty(&output)?).ok();
    Ok(())
}

/// One line per duplicate; representatives are not listed
fn print_minimal_results(term: &Term, result: &PipelineResult) {
    for group in &result.groups {
        for member in &group.members {
            term.write_line(&member.path().display().to_string()).ok();
        }
    }
}

pub fn print_deletion_report(term: &Term, report: &DeletionReport) {
    let verb = if report.dry_run { "Would delete" } else { "Deleted" };

    for path in &report.deleted {
        term.write_line(&format!("  {} {}", style("-").red(), display_path(path)))
            .ok();
    }
    for failure in &report.failed {
        term.write_line(&format!(
            "  {} {}",
            style("✗").red().bold(),
            failure.reason
        ))
        .ok();
    }

    term.write_line(&format!(
        "{} {} files ({}), {} failed",
        style(verb).bold(),
        style(report.deleted.len()).cyan(),
        format_bytes(report.bytes_freed),
        report.failed.len()
    ))
    .ok();
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_humanised() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn paths_outside_home_are_unchanged() {
        assert_eq!(display_path(Path::new("/definitely/not/home/a.png")), "/definitely/not/home/a.png");
    }

    #[test]
    fn paths_under_home_are_shortened() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(display_path(&home.join("Pictures/a.png")), "~/Pictures/a.png");
        }
    }
}

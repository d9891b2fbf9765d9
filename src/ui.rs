//! Terminal output for the release workflow.
//!
//! Progress is reported through `tracing`; these functions print the final
//! outcome, and errors in a form the CI runner surfaces.

use console::style;

use crate::cli::orchestration::WorkflowResult;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format an error annotation for the GitHub Actions runner.
///
/// Newlines are escaped the way the runner expects so multi-line errors stay
/// in one annotation.
pub fn github_error_annotation(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}

/// Plain-text summary lines for a finished workflow.
pub fn format_outcome(result: &WorkflowResult) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{}: {} -> {}",
            result.action, result.previous_version, result.version
        ),
        format!("Tagged {} as {}", short(&result.tagged_commit.to_string()), result.tag),
    ];
    if let Some(release) = &result.release {
        lines.push(format!("Draft release {}: {}", release.name, release.url));
    }
    lines
}

/// Print the outcome of a finished workflow.
pub fn display_outcome(result: &WorkflowResult) {
    for line in format_outcome(result) {
        display_success(&line);
    }
}

fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

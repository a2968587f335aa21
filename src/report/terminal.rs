use super::Report;
use colored::Colorize;

/// Colored summary printed after a run
pub struct TerminalReporter {
    /// List every finding, not just the counts
    detailed: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { detailed: true }
    }

    pub fn with_details(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    pub fn report(&self, report: &Report) {
        if report.is_clean() {
            println!("{}", "No unused ViewModel classes or methods found!".green().bold());
        } else {
            println!();
            println!(
                "{}",
                format!(
                    "Found {} unused ViewModels and {} unused methods",
                    report.unused_classes.len(),
                    report.method_count()
                )
                .yellow()
                .bold()
            );
            println!();

            if self.detailed {
                self.print_findings(report);
            }
        }

        if !report.diagnostics.is_empty() {
            println!(
                "{}",
                format!(
                    "⚠ {} diagnostics; results may be less precise",
                    report.diagnostics.len()
                )
                .yellow()
            );
        }
    }

    fn print_findings(&self, report: &Report) {
        for class in &report.unused_classes {
            println!(
                "  {} {} {}",
                "unused class".red().bold(),
                class.qualified_name.white(),
                format!("{}:{}", class.path.display(), class.line).dimmed()
            );
        }
        if !report.unused_classes.is_empty() {
            println!();
        }

        for group in &report.method_groups {
            println!("{}", group.qualified_name.cyan().bold());
            for method in &group.methods {
                println!(
                    "  {} {} '{}'",
                    format!("{}:{}", group.path.display(), method.line).dimmed(),
                    "→".dimmed(),
                    method.name
                );
            }
            println!();
        }

        println!("{}", "─".repeat(60).dimmed());
        println!(
            "{}",
            "Tip: Use --retain 'Class.method' to keep methods called reflectively".dimmed()
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

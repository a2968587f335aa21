use super::Report;

/// Markdown reporter, the default output of the CLI
#[derive(Debug, Default)]
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &Report) -> String {
        let mut lines = vec!["# Unused ViewModel Methods Report".to_string()];

        if !report.unused_classes.is_empty() {
            lines.push("\n## Completely Unused ViewModels\n".to_string());
            for class in &report.unused_classes {
                lines.push(format!(
                    "- **{}** (at `{}`)",
                    class.qualified_name,
                    display_path(&class.path)
                ));
            }
        }

        if !report.method_groups.is_empty() {
            lines.push("\n## Unused Methods in Active ViewModels\n".to_string());
            for (i, group) in report.method_groups.iter().enumerate() {
                // The section header already ends with a blank line
                let gap = if i == 0 { "" } else { "\n" };
                lines.push(format!("{}### ViewModel: `{}`", gap, group.qualified_name));
                for method in &group.methods {
                    lines.push(format!("- Method: `{}` (line {})", method.name, method.line));
                }
            }
        }

        if report.is_clean() {
            lines.push(
                "\nCongratulations! No unused ViewModel classes or methods were found.".to_string(),
            );
        }

        if !report.diagnostics.is_empty() {
            lines.push("\n## Analysis Diagnostics\n".to_string());
            for diagnostic in &report.diagnostics {
                lines.push(format!("- {}", diagnostic));
            }
        }

        let mut rendered = lines.join("\n");
        rendered.push('\n');
        rendered
    }
}

/// Forward slashes on every platform, so reports compare equal across machines
fn display_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

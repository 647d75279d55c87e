//! Output formatting for function reports.

use cmdbind_core::{CompiledBinding, TypeCategory};

use crate::scan::{FunctionReport, Outcome};

/// Supported output formats.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// Formats reports in the requested output format.
pub fn format_reports(reports: &[FunctionReport], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(reports).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(reports_to_table(reports)),
    }
}

/// One line per diagnostic: `file: function: [kind] message`.
pub fn diagnostic_lines(report: &FunctionReport) -> Vec<String> {
    report
        .diagnostics()
        .iter()
        .map(|diagnostic| {
            format!(
                "{}: {}: [{}] {}",
                report.file.display(),
                report.function,
                diagnostic.kind(),
                diagnostic
            )
        })
        .collect()
}

fn reports_to_table(reports: &[FunctionReport]) -> String {
    let mut out = String::new();

    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{}  #[{}]\n",
            report.function,
            report.directive.attribute_name()
        ));

        match &report.outcome {
            Outcome::Compiled { binding } => binding_to_table(binding, &mut out),
            Outcome::Failed { diagnostics } => {
                for diagnostic in diagnostics {
                    out.push_str(&format!("  error [{}] {diagnostic}\n", diagnostic.kind()));
                }
            }
        }
    }

    out
}

fn binding_to_table(binding: &CompiledBinding, out: &mut String) {
    out.push_str(&format!("  Command: {}\n", binding.call_name));

    if !binding.parameters.is_empty() {
        out.push_str("\n  Parameters:\n");
        let max_name = binding
            .parameters
            .iter()
            .map(|p| p.name.len())
            .max()
            .unwrap_or(4);

        for spec in &binding.parameters {
            let aliases = binding
                .config
                .labels
                .get(&spec.name)
                .map(|triple| triple.spellings().join(", "))
                .filter(|spellings| !spellings.is_empty())
                .unwrap_or_else(|| "(positional)".to_string());
            let category = match spec.category.value_type() {
                Some(ty) if !matches!(spec.category, TypeCategory::Value(_)) => {
                    format!("{}<{ty}>", spec.category.name())
                }
                Some(ty) => ty.to_string(),
                None => spec.category.name().to_string(),
            };
            out.push_str(&format!(
                "    {:<width$}  {:<20}  {aliases}\n",
                spec.name,
                category,
                width = max_name
            ));
        }
    }

    if !binding.config.shadow_groups.is_empty() {
        out.push_str("\n  Shadow groups:\n");
        for group in &binding.config.shadow_groups {
            out.push_str(&format!("    {group}\n"));
        }
    }

    if !binding.config.meta_flags.is_empty() {
        out.push_str("\n  Meta flags:\n");
        for flag in &binding.config.meta_flags {
            out.push_str(&format!("    {} = {}\n", flag.parameter, flag.default));
        }
    }

    if let Some(ref state) = binding.state {
        let origin = if state.synthesized {
            "synthesized"
        } else {
            "declared"
        };
        out.push_str(&format!("\n  State: {} ({origin})\n", state.element_type));
    }
}

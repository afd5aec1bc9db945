use chrono::{DateTime, Local};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    error::AnalysisError,
    impact::AnalysisResult,
    role::Role,
    source_unit::SourceUnit,
    usage::{UsageKind, UsageRecord},
};

pub const REPORT_EXTENSION: &str = "json";
const MAX_LISTED_METHODS: usize = 3;
const MAX_LISTED_FIELDS: usize = 3;
const MAX_LISTED_ANNOTATIONS: usize = 5;
const MAX_CONTEXT_LENGTH: usize = 100;
const NO_ROUTE: &str = "No explicit endpoints found";

#[derive(Debug, Serialize)]
struct Report<'a> {
    summary: Summary<'a>,
    repositories: Vec<ClassRow<'a>>,
    entities: Vec<ClassRow<'a>>,
    services: Vec<ClassRow<'a>>,
    controllers: Vec<ClassRow<'a>>,
    usages: Vec<UsageRow<'a>>,
    routes: Vec<RouteRow<'a>>,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    analysis_date: String,
    project_path: &'a Path,
    column_analyzed: &'a str,
    analysis_time_ms: u64,
    repositories: usize,
    entities: usize,
    services: usize,
    controllers: usize,
    total_usages: usize,
    total_classes: usize,
}

#[derive(Debug, Serialize)]
struct ClassRow<'a> {
    class_name: &'a str,
    package: &'a str,
    file_path: String,
    class_type: Role,
    impact_reason: &'a str,
    usage_count: usize,
    methods: String,
    fields: String,
    annotations: String,
}

#[derive(Debug, Serialize)]
struct UsageRow<'a> {
    class_name: &'a str,
    member: &'a str,
    usage_type: UsageKind,
    context: String,
    line: usize,
    file_path: &'a Path,
}

#[derive(Debug, Serialize)]
struct RouteRow<'a> {
    controller: &'a str,
    package: &'a str,
    endpoint: &'a str,
    impact_reason: &'a str,
}

/// Joins the first `max_items` items, telling how many were left out.
fn join_limited(items: &[String], max_items: usize) -> String {
    let listed = items[..items.len().min(max_items)].join(", ");
    if items.len() > max_items {
        format!("{listed}... (+{} more)", items.len() - max_items)
    } else {
        listed
    }
}

fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() > max_length {
        let kept: String = text.chars().take(max_length).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

fn class_rows(units: &[SourceUnit]) -> Vec<ClassRow<'_>> {
    units
        .iter()
        .map(|unit| ClassRow {
            class_name: &unit.name,
            package: &unit.package_path,
            file_path: unit.short_file_path(),
            class_type: unit.role,
            impact_reason: unit.impact_reason.as_deref().unwrap_or_default(),
            usage_count: unit.usage_count,
            methods: join_limited(&unit.methods, MAX_LISTED_METHODS),
            fields: join_limited(&unit.fields, MAX_LISTED_FIELDS),
            annotations: join_limited(&unit.annotations, MAX_LISTED_ANNOTATIONS),
        })
        .collect()
}

fn usage_rows(usages: &[UsageRecord]) -> Vec<UsageRow<'_>> {
    usages
        .iter()
        .map(|usage| UsageRow {
            class_name: &usage.unit_name,
            member: &usage.member_name,
            usage_type: usage.kind,
            context: truncate(&usage.context_text, MAX_CONTEXT_LENGTH),
            line: usage.line_number,
            file_path: &usage.file_path,
        })
        .collect()
}

fn route_rows<'a>(controllers: &'a [SourceUnit]) -> Vec<RouteRow<'a>> {
    let mut rows = Vec::new();
    for controller in controllers {
        let impact_reason = controller.impact_reason.as_deref().unwrap_or_default();
        let row = |endpoint: &'a str| RouteRow {
            controller: &controller.name,
            package: &controller.package_path,
            endpoint,
            impact_reason,
        };
        if controller.routes.is_empty() {
            rows.push(row(NO_ROUTE));
        } else {
            rows.extend(controller.routes.iter().map(|route| row(route.as_str())));
        }
    }
    rows
}

fn build_report(result: &AnalysisResult) -> Report<'_> {
    Report {
        summary: Summary {
            analysis_date: result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            project_path: &result.project_path,
            column_analyzed: &result.column_name,
            analysis_time_ms: result.elapsed_millis,
            repositories: result.repositories.len(),
            entities: result.entities.len(),
            services: result.services.len(),
            controllers: result.controllers.len(),
            total_usages: result.total_usages(),
            total_classes: result.total_impacted_classes(),
        },
        repositories: class_rows(&result.repositories),
        entities: class_rows(&result.entities),
        services: class_rows(&result.services),
        controllers: class_rows(&result.controllers),
        usages: usage_rows(&result.usages),
        routes: route_rows(&result.controllers),
    }
}

/// Checks where a report may be written.
///
/// ## Parameters:
/// * `output` (`&str`): Path of the report to write.
///
/// ## Returns:
/// * (`Result<std::path::PathBuf, AnalysisError>`): The path, or `InvalidInput` if it is blank,
///   does not end with the report extension or lives in a missing directory.
pub fn validate_output_path(output: &str) -> Result<PathBuf, AnalysisError> {
    if output.trim().is_empty() {
        return Err(AnalysisError::invalid_input("Output file path cannot be empty"));
    }
    let path = PathBuf::from(output);
    let has_extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(REPORT_EXTENSION));
    if !has_extension {
        return Err(AnalysisError::invalid_input(format!(
            "Output file must have .{REPORT_EXTENSION} extension"
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(AnalysisError::invalid_input(format!(
                "Output directory does not exist: {}",
                parent.display()
            )));
        }
    }
    Ok(path)
}

/// Report file name for a column, eg. `impact-analysis-user_email-20240131-154500.json`.
pub fn default_report_file_name(column_name: &str, now: DateTime<Local>) -> String {
    let safe_column: String = column_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "impact-analysis-{safe_column}-{}.{REPORT_EXTENSION}",
        now.format("%Y%m%d-%H%M%S")
    )
}

/// Writes the report of an analysis.
///
/// ## Parameters:
/// * `result` (`&impact::AnalysisResult`): Finished analysis, left untouched,
/// * `path` (`&std::path::Path`): Where to write the report.
///
/// ## Returns:
/// * (`Result<(), AnalysisError>`): `ReportGeneration` if the file can not be written.
pub fn write_report(result: &AnalysisResult, path: &Path) -> Result<(), AnalysisError> {
    info!("Generating report: {:?}", path);
    let to_error = |source: io::Error| AnalysisError::ReportGeneration {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &build_report(result))
        .map_err(|error| to_error(io::Error::from(error)))?;
    writer.flush().map_err(to_error)?;
    info!("Report generated successfully: {:?}", path);
    Ok(())
}

/// Prints a human readable summary of the analysis on the standard output.
///
/// ## Parameters:
/// * `result` (`&impact::AnalysisResult`): Finished analysis,
/// * `report` (`Option<&std::path::Path>`): Report written for this analysis, if any.
pub fn print_summary(result: &AnalysisResult, report: Option<&Path>) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("🎯 CODE IMPACT ANALYSIS COMPLETE");
    println!("{rule}");
    println!("📊 Analysis Summary:");
    println!("   Column analyzed: {}", result.column_name);
    println!("   Analysis time: {} ms", result.elapsed_millis);
    println!("   Project path: {}", result.project_path.display());
    println!();

    println!("🏛️ Impact Results:");
    println!("   Repositories: {}", result.repositories.len());
    println!("   Entities: {}", result.entities.len());
    println!("   Services: {}", result.services.len());
    println!("   Controllers: {}", result.controllers.len());
    println!("   Total usages: {}", result.total_usages());
    println!();

    if !result.repositories.is_empty() {
        println!("📂 Impacted Repositories:");
        for repository in &result.repositories {
            println!("   • {} ({} usages)", repository.name, repository.usage_count);
        }
        println!();
    }
    for (title, units) in [
        ("⚙️ Impacted Services:", &result.services),
        ("🌐 Impacted Controllers (APIs):", &result.controllers),
    ] {
        if units.is_empty() {
            continue;
        }
        println!("{title}");
        for unit in units {
            println!(
                "   • {} - {}",
                unit.name,
                unit.impact_reason.as_deref().unwrap_or_default()
            );
        }
        println!();
    }

    if let Some(report) = report {
        println!("📄 Report Generated: {}", report.display());
    }
    println!("{rule}");
}

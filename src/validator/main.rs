//! Standalone validator for program catalogue files.
//!
//! Loads a catalogue the same way the bot does, prints per-program
//! statistics and reports problems the bot would only hit at runtime.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use program_catalog_bot::catalogue::{Catalogue, Program};
use program_catalog_bot::commands::CallbackData;
use program_catalog_bot::config::RecommendationTable;
use program_catalog_bot::query::list_semesters;

/// Program catalogue validator.
#[derive(Parser, Debug)]
#[command(name = "validate_catalogue")]
#[command(about = "Validates program catalogue files for the Telegram bot")]
#[command(version)]
struct Args {
    /// Path to the catalogue JSON file to validate.
    #[arg(short, long, default_value = "program_data.json")]
    file: PathBuf,

    /// Keyword table to check against the catalogue (built-in table if omitted).
    #[arg(short, long)]
    keywords: Option<PathBuf>,

    /// Show detailed information for each program.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    println!("Validating: {}\n", args.file.display());

    let catalogue = match Catalogue::load(&args.file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to load catalogue: {e}");
            return ExitCode::FAILURE;
        }
    };

    let table = match &args.keywords {
        Some(path) => match RecommendationTable::load_from_file(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("✗ Failed to load keyword table: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => RecommendationTable::default(),
    };

    let metadata = catalogue.metadata();
    if let Some(version) = &metadata.version {
        println!("Catalogue version: {version}");
    }
    match (&metadata.generated_on, metadata.generated_at()) {
        (Some(_), Some(at)) => println!("Generated on: {at}"),
        (Some(raw), None) => println!("Generated on: {raw} (unrecognised date format)"),
        (None, _) => {}
    }

    let mut warnings = 0;

    for program in catalogue.programs() {
        let problems = callback_problems(program);

        if args.verbose {
            let data = &program.courses_data;
            println!(
                "[{}] {} courses, {} semesters, {} credits, {} hours",
                program.name,
                data.len(),
                data.semesters.len(),
                data.total_credits,
                data.total_hours
            );
            if problems.is_empty() {
                println!("  ✓ OK");
            }
        }

        for problem in problems {
            warnings += 1;
            println!("  ⚠ [{}] {problem}", program.name);
        }
    }

    let known: HashSet<&str> = catalogue
        .programs()
        .iter()
        .flat_map(|p| p.courses_data.courses.iter().map(|c| c.name.as_str()))
        .collect();
    for course in table.referenced_courses() {
        if !known.contains(course) {
            warnings += 1;
            println!("  ⚠ Keyword table recommends unknown course: \"{course}\"");
        }
    }

    if let Some(declared) = catalogue.metadata().total_programs
        && declared != catalogue.len()
    {
        warnings += 1;
        println!(
            "  ⚠ Metadata declares {declared} programs, catalogue has {}",
            catalogue.len()
        );
    }

    println!();
    println!(
        "✓ Loaded {} programs ({} keyword rules)",
        catalogue.len(),
        table.len()
    );
    if warnings > 0 {
        println!("  ({warnings} warning(s))");
    }

    ExitCode::SUCCESS
}

/// Buttons for this program whose payload Telegram would reject.
fn callback_problems(program: &Program) -> Vec<String> {
    let name = &program.name;
    let mut payloads = vec![
        CallbackData::ShowProgram(name.clone()),
        CallbackData::ShowSemesters(name.clone()),
        CallbackData::StartRecommendation(name.clone()),
    ];
    payloads.extend(
        list_semesters(program)
            .into_iter()
            .map(|s| CallbackData::ShowSemester(name.clone(), s.to_string())),
    );

    payloads
        .iter()
        .filter_map(|payload| {
            payload
                .encode()
                .err()
                .map(|e| format!("'{}' button: {e}", payload.tag()))
        })
        .collect()
}

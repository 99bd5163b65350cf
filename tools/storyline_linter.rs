/// Storyline Linter: validates a directory of storyline files.
///
/// Usage: storyline_linter <storyline_dir> [--strict]
use std::path::Path;
use std::process;
use storyline_engine::core::lint::lint_directory;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: storyline_linter <storyline_dir> [--strict]");
        process::exit(0);
    }

    let dir = Path::new(&args[1]);
    let mut strict = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--strict" => strict = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    if !dir.is_dir() {
        eprintln!("ERROR: Directory '{}' does not exist", dir.display());
        process::exit(1);
    }

    let report = match lint_directory(dir) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Failed to read '{}': {}", dir.display(), e);
            process::exit(1);
        }
    };

    println!("Checked {} storyline files", report.checked);
    println!("\n=== Storyline Lint Report ===\n");

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    if !report.is_clean() || (strict && !report.warnings.is_empty()) {
        process::exit(1);
    }
}

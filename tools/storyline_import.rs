/// Storyline Import: validates generated text and saves it to storage.
///
/// Usage: storyline_import --input <file|-> [--storage <dir>] [--config <pipeline.ron>]
use std::env;
use std::io::Read;
use std::process;
use storyline_engine::core::pipeline::StorylinePipeline;

const USAGE: &str =
    "Usage: storyline_import --input <file|-> [--storage <dir>] [--config <pipeline.ron>]";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut storage = None;
    let mut config = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "--storage" | "--config" if i + 1 >= args.len() => {
                eprintln!("Error: {} needs a value", args[i]);
                process::exit(1);
            }
            "--input" => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--storage" => {
                i += 1;
                storage = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                config = Some(args[i].clone());
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let text = if input == "-" {
        let mut text = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut text) {
            eprintln!("Error reading stdin: {}", e);
            process::exit(1);
        }
        text
    } else {
        std::fs::read_to_string(&input).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {}", input, e);
            process::exit(1);
        })
    };

    let mut builder = StorylinePipeline::builder();
    if let Some(config) = config {
        builder = builder.config_file(config);
    }
    if let Some(storage) = storage {
        builder = builder.storage_dir(storage);
    }
    let pipeline = builder.build().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    match pipeline.import_generated(&text) {
        Ok((storyline, path)) => {
            println!(
                "Imported \"{}\" ({}, {} steps) to {}",
                storyline.title(),
                storyline.action_type(),
                storyline.steps().len(),
                path.display()
            );
        }
        Err(e) => {
            eprintln!("Rejected: {}", e);
            process::exit(1);
        }
    }
}

// src/main.rs
mod catalog;
mod config;
mod extractors;
mod pdf;
mod storage;
mod utils;

use catalog::{group_images, QuestionCatalog};
use clap::{Args, Parser, Subcommand};
use config::{ExtractorConfig, PageAttribution};
use extractors::{DocumentDriver, QuestionRecord};
use pdf::PdfReader;
use std::path::PathBuf;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the exam question extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse the exam PDF into a JSON question dump plus image files
    Extract(ExtractArgs),
    /// Browse, search and summarize an existing question dump
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Exam PDF to parse
    #[arg(short, long, default_value = "Questions_Professional_Data_engineer.pdf")]
    pdf: PathBuf,

    /// Output JSON file
    #[arg(short, long, default_value = "clean_exam_questions.json")]
    output: PathBuf,

    /// Directory that receives extracted images
    #[arg(short, long, default_value = "extracted_images")]
    image_dir: PathBuf,

    /// Images at or below this size in both dimensions are skipped
    /// (falls back to IMAGE_SIZE_THRESHOLD, then 20)
    #[arg(long)]
    min_image_size: Option<u32>,

    /// Attach images from the page where each question starts instead of the
    /// page where the next question starts
    #[arg(long)]
    attribute_images_by_block_start: bool,

    /// Debug mode - save annotated page text for every page
    #[arg(short, long)]
    debug: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Question dump to read
    #[arg(short, long, default_value = "clean_exam_questions.json")]
    input: PathBuf,

    /// Directory holding the extracted images
    #[arg(long, default_value = "extracted_images")]
    image_dir: PathBuf,

    /// Only list questions whose text contains this term
    #[arg(short, long)]
    search: Option<String>,

    /// Show one question in full
    #[arg(short = 'n', long)]
    question: Option<u32>,
}

fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Parsed arguments: {:?}", cli);

    match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Inspect(args) => run_inspect(args),
    }
}

fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let decorative_threshold = config::resolve_threshold(
        args.min_image_size,
        std::env::var(config::THRESHOLD_ENV).ok(),
    )?;

    let config = ExtractorConfig {
        pdf_path: args.pdf,
        output_path: args.output,
        image_dir: args.image_dir,
        decorative_threshold,
        attribution: if args.attribute_images_by_block_start {
            PageAttribution::BlockStart
        } else {
            PageAttribution::ClosingMarker
        },
        debug: args.debug,
    };
    tracing::info!("Starting extraction with config: {:?}", config);

    // Fail on a missing or corrupt PDF before anything is written.
    let reader = PdfReader::open(&config.pdf_path)?;
    let storage = StorageManager::new(&config.output_path, &config.image_dir)?;

    if config.debug {
        match utils::text_debug::create_debug_dump(&reader, &storage.debug_dir()) {
            Ok(pages) => tracing::info!("Wrote {} debug pages", pages.len()),
            Err(e) => tracing::warn!("Failed to create debug dump: {}", e),
        }
    }

    let report = DocumentDriver::new(&config, &storage).run(&reader)?;
    let output = storage.save_questions(&report.questions)?;

    match storage.save_run_metadata(&config.pdf_path, &report) {
        Ok(path) => tracing::info!("Saved run metadata to: {}", path.display()),
        Err(e) => tracing::error!("Failed to save run metadata: {}", e),
    }

    tracing::info!("Extracted {} questions to {}", report.questions.len(), output.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), AppError> {
    let catalog = QuestionCatalog::load(&args.input, args.image_dir);

    if let Some(number) = args.question {
        return match catalog.find(number) {
            Some(question) => {
                print_question(&catalog, question);
                Ok(())
            }
            None => Err(AppError::Config(format!("Question {} is not in {}", number, args.input.display()))),
        };
    }

    let listed = match &args.search {
        Some(term) => catalog.search(term),
        None => catalog.questions().iter().collect(),
    };
    println!("Showing {} of {} questions", listed.len(), catalog.questions().len());
    for question in listed {
        println!("{:>5}  {}", display_number(question), question.question_text.trim());
    }

    let summary = catalog.summary();
    println!();
    println!("Questions:            {}", summary.total);
    println!("With correct answer:  {}", summary.with_correct_answer);
    println!("With images:          {}", summary.with_images);
    println!("With vote data:       {}", summary.with_votes);
    for (answer, count) in &summary.correct_answers {
        println!("  answer {:<6} {}", answer, count);
    }
    for (level, count) in &summary.consensus {
        println!("  {:<28} {}", level.label(), count);
    }
    Ok(())
}

fn display_number(question: &QuestionRecord) -> String {
    question
        .question_number
        .map(|n| format!("#{}", n))
        .unwrap_or_else(|| "#?".to_string())
}

fn print_question(catalog: &QuestionCatalog, question: &QuestionRecord) {
    println!("Question {}", display_number(question));
    println!("{}", question.question_text.trim());

    if question.answers.is_empty() {
        println!("  (no answer options)");
    }

    let groups = group_images(&question.images);
    for image in &groups.question {
        print_image(catalog, image);
    }

    for (letter, text) in question.answers.iter() {
        println!("  {}. {}", letter, text);
        if let Some((_, images)) = groups.options.iter().find(|(l, _)| *l == letter) {
            for image in images {
                print_image(catalog, image);
            }
        }
    }

    for (letter, images) in groups.unmatched(&question.answers) {
        println!("  {}. (no such option)", letter);
        for image in images {
            print_image(catalog, image);
        }
    }

    println!("Correct answer: {}", question.correct_answer.as_deref().unwrap_or("unknown"));
    if let Some(votes) = &question.community_vote_distribution {
        println!("Community vote distribution: {}", votes);
    }
}

fn print_image(catalog: &QuestionCatalog, image: &str) {
    match catalog.resolve_image(image) {
        Some(path) => println!("  [image] {}", path.display()),
        None => println!("  [image missing] {}", image),
    }
}

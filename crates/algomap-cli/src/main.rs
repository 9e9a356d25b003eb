//! AlgoMap command-line interface.
//!
//! Provides the `algomap` binary. `translate` turns a Python source file
//! into IR steps and prints the `{steps, meta}` JSON on stdout; the other
//! subcommands expose classification, the admission check, rating
//! feedback and concept normalization.
//!
//! Logs go to stderr and are filtered through `RUST_LOG` (default `warn`).

mod config;
mod error;
mod llm_provider;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use algomap_core::{Animator, Concept, Family, Translation};
use algomap_storage::AdaptiveMemory;
use algomap_translate::{
    admit, resolve_alias, Classification, Classifier, ClassifierChain, Dispatcher,
    HeuristicClassifier, ModelClassifier, ModelReconstructor, Scope,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Settings;
use error::CliError;
use llm_provider::OpenAiProvider;

/// Turns student DSA code into step-by-step IR.
#[derive(Parser)]
#[command(name = "algomap", about = "Translate data-structure code into animation IR")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a source file into IR JSON.
    Translate {
        /// Concept label; detected from the code when absent.
        #[arg(long)]
        concept: Option<String>,

        #[arg(long)]
        sub_concept: Option<String>,

        /// Python source file, or `-` for stdin.
        file: PathBuf,
    },
    /// Print the detected concept of a source file.
    Classify { file: PathBuf },
    /// Print whether a source file is accepted for translation.
    Check { file: PathBuf },
    /// Store a rated translation in adaptive memory.
    Feedback {
        #[arg(long)]
        concept: String,

        /// Rating from 0 to 5.
        #[arg(long)]
        rating: u8,

        /// IR JSON file holding `{steps, meta}`.
        #[arg(long)]
        ir: PathBuf,

        /// The source file the IR belongs to.
        file: PathBuf,
    },
    /// Print the canonical label and animator for a concept.
    Normalize {
        concept: String,
        sub_concept: Option<String>,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();
    let settings = cli.settings;

    let exit_code = match cli.command {
        Commands::Translate {
            concept,
            sub_concept,
            file,
        } => run_translate(&settings, concept.as_deref(), sub_concept.as_deref(), &file),
        Commands::Classify { file } => run_classify(&settings, &file),
        Commands::Check { file } => run_check(&file),
        Commands::Feedback {
            concept,
            rating,
            ir,
            file,
        } => run_feedback(&settings, &concept, rating, &ir, &file),
        Commands::Normalize {
            concept,
            sub_concept,
        } => run_normalize(&concept, sub_concept.as_deref()),
    };
    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Prints `err` and returns its exit code.
fn fail(err: CliError) -> i32 {
    eprintln!("Error: {err}");
    err.exit_code()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reads a source file; `-` reads stdin.
fn read_source(path: &Path) -> Result<String, CliError> {
    let read_err = |source| CliError::Read {
        path: path.display().to_string(),
        source,
    };
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin().read_to_string(&mut code).map_err(read_err)?;
        Ok(code)
    } else {
        std::fs::read_to_string(path).map_err(read_err)
    }
}

/// Strict-then-open model classification when a model is configured,
/// keyword heuristics otherwise or when the model fails.
fn classify(provider: Option<&OpenAiProvider>, code: &str) -> Classification {
    if let Some(model) = provider {
        let chain = ClassifierChain::new(
            ModelClassifier::new(model, Scope::Strict),
            ModelClassifier::new(model, Scope::Open),
        );
        match chain.classify(code) {
            Ok(answer) => return answer,
            Err(err) => warn!(%err, "model classification failed; using heuristics"),
        }
    }
    match HeuristicClassifier.classify(code) {
        Ok(answer) => answer,
        Err(err) => Classification::unknown(err.to_string()),
    }
}

/// Execute the translate subcommand.
///
/// Returns exit code: 0 = success, 1 = runtime failure, 2 = bad input.
fn run_translate(
    settings: &Settings,
    concept: Option<&str>,
    sub_concept: Option<&str>,
    file: &Path,
) -> i32 {
    match translate(settings, concept, sub_concept, file) {
        Ok(translation) => match print_json(&translation) {
            Ok(()) => 0,
            Err(err) => fail(err),
        },
        Err(err) => fail(err),
    }
}

fn translate(
    settings: &Settings,
    concept: Option<&str>,
    sub_concept: Option<&str>,
    file: &Path,
) -> Result<Translation, CliError> {
    let code = read_source(file)?;
    let admission = admit(&code);
    if !admission.admitted {
        warn!(
            category = ?admission.category,
            reason = %admission.reason,
            "code not admitted; translating anyway"
        );
    }

    let store = settings.open_store()?;
    let provider = settings.provider()?;
    let concept = match concept {
        Some(label) => Concept::normalize(label, sub_concept.unwrap_or("")),
        None => classify(provider.as_ref(), &code).canonical(),
    };

    let reconstructor = provider.as_ref().map(ModelReconstructor::new);
    let mut dispatcher = Dispatcher::new(settings.dispatch_config())
        .with_memory(store.memory())
        .with_action_cache(store.actions());
    if let Some(reconstructor) = &reconstructor {
        dispatcher = dispatcher.with_reconstructor(reconstructor);
    }
    Ok(dispatcher.dispatch(&concept, &code))
}

#[derive(Serialize)]
struct ClassifyReport {
    #[serde(flatten)]
    classification: Classification,
    canonical: Concept,
    parent_animator: Animator,
}

fn run_classify(settings: &Settings, file: &Path) -> i32 {
    let result = read_source(file).and_then(|code| {
        let provider = settings.provider()?;
        let classification = classify(provider.as_ref(), &code);
        let canonical = classification.canonical();
        print_json(&ClassifyReport {
            parent_animator: canonical.animator(),
            canonical,
            classification,
        })
    });
    match result {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

/// Prints the admission verdict. Rejected code exits with 2.
fn run_check(file: &Path) -> i32 {
    let result = read_source(file).and_then(|code| {
        let admission = admit(&code);
        print_json(&admission)?;
        Ok(admission.admitted)
    });
    match result {
        Ok(true) => 0,
        Ok(false) => 2,
        Err(err) => fail(err),
    }
}

#[derive(Serialize)]
struct FeedbackReport {
    concept: String,
    pattern_hash: String,
    rating: u8,
    steps: usize,
}

fn run_feedback(settings: &Settings, concept: &str, rating: u8, ir: &Path, file: &Path) -> i32 {
    match feedback(settings, concept, rating, ir, file).and_then(|report| print_json(&report)) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

fn feedback(
    settings: &Settings,
    concept: &str,
    rating: u8,
    ir: &Path,
    file: &Path,
) -> Result<FeedbackReport, CliError> {
    let code = read_source(file)?;
    let translation = Translation::from_json(&read_source(ir)?)?;
    let concept = resolve_alias(concept);
    let store = settings.open_store()?;
    let record = AdaptiveMemory::new(store.memory())
        .with_min_rating(settings.min_rating)
        .record_feedback(&concept, &code, &translation, rating)?;
    info!(concept = %record.concept, rating, "feedback stored");
    Ok(FeedbackReport {
        concept: record.concept,
        pattern_hash: record.pattern_hash,
        rating: record.rating,
        steps: record.steps.len(),
    })
}

#[derive(Serialize)]
struct NormalizeReport {
    concept: Concept,
    family: Family,
    parent_animator: Animator,
}

fn run_normalize(concept: &str, sub_concept: Option<&str>) -> i32 {
    let canonical = match sub_concept {
        Some(sub) => Concept::normalize(concept, sub),
        None => resolve_alias(concept),
    };
    let report = NormalizeReport {
        family: canonical.family(),
        parent_animator: canonical.animator(),
        concept: canonical,
    };
    match print_json(&report) {
        Ok(()) => 0,
        Err(err) => fail(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Backend;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn global_settings_parse_after_subcommand() {
        let cli = parse(&[
            "algomap",
            "normalize",
            "bst",
            "--memory-backend",
            "memory",
            "--llm-keys",
            "k1,k2",
        ]);
        assert_eq!(cli.settings.memory_backend, Backend::Memory);
        assert_eq!(cli.settings.llm_keys, ["k1", "k2"]);
        assert!(matches!(cli.command, Commands::Normalize { .. }));
    }

    #[test]
    fn missing_file_is_bad_input() {
        let err = read_source(Path::new("/definitely/not/here.py")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn translate_runs_locally_without_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.py");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "s.push(1)\ns.push(2)\ns.pop()").unwrap();

        let cli = parse(&[
            "algomap",
            "--memory-backend",
            "memory",
            "--llm-keys",
            "",
            "translate",
            path.to_str().unwrap(),
        ]);
        let t = translate(&cli.settings, None, None, &path).unwrap();
        assert_eq!(t.meta.parent_animator, Some(Animator::StackAnimator));
        assert_eq!(t.steps.len(), 3);
    }

    #[test]
    fn feedback_rejects_out_of_range_rating() {
        let dir = tempfile::tempdir().unwrap();
        let code = dir.path().join("q.py");
        let ir = dir.path().join("ir.json");
        std::fs::write(&code, "q.enqueue(1)\n").unwrap();
        std::fs::write(&ir, r#"{"steps": [{"action": "enqueue", "description": "Enqueue 1"}], "meta": {"kind": "queue-linear"}}"#).unwrap();
        let memory_dir = dir.path().join("mem");
        let cli = parse(&[
            "algomap",
            "--memory-dir",
            memory_dir.to_str().unwrap(),
            "normalize",
            "queue",
        ]);
        assert_eq!(run_feedback(&cli.settings, "queue", 9, &ir, &code), 2);
        assert_eq!(run_feedback(&cli.settings, "queue", 4, &ir, &code), 0);
        assert!(memory_dir.join("queue-linear.jsonl").exists());
    }
}

//! Command line front end: score texts, inspect features and train models.

use std::{io::Read, path::PathBuf, time::Instant};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    Classification, Detector, FeatureVector, FitParams, Prediction,
    training::{self, TrainingConfig},
};

#[derive(Parser)]
#[command(name = "ki-erkenner", version)]
#[command(about = "Erkenne, ob ein Text eher von einer KI oder einem Menschen stammt", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose mode (debug logging, timings and feature contributions)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify text with a trained model
    Predict(PredictArgs),
    /// Print the extracted feature vector
    Features(FeaturesArgs),
    /// Train a model from a labelled corpus
    Train(TrainArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// Text to analyze (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read text from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process texts (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    /// Batch process from JSON array
    #[arg(long, value_name = "PATH", conflicts_with_all = ["text", "file", "batch"])]
    batch_json: Option<PathBuf>,
}

#[derive(Args)]
pub struct PredictArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Trained model file
    #[arg(short, long, value_name = "PATH", env = "KI_ERKENNER_MODEL")]
    model: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Custom class labels (comma-separated: label0,label1)
    #[arg(long, value_delimiter = ',', num_args = 2, default_values = ["Mensch", "KI"])]
    labels: Vec<String>,
}

#[derive(Args)]
pub struct FeaturesArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct TrainArgs {
    /// Corpus as JSON array or JSON lines of {"text", "label"} records
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,

    /// Where to write the trained model
    #[arg(long, value_name = "PATH", default_value = "model.json")]
    out: PathBuf,

    /// Share of each class held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Seed for the train/test split
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Inverse L2 regularization strength
    #[arg(short, long, default_value_t = 1.0)]
    c: f64,

    /// Maximum solver iterations
    #[arg(long, default_value_t = 200)]
    max_iter: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Output just the class label
    Class,
    /// Output AI probability as a float 0-1
    Probability,
    /// Output as JSON
    Json,
    /// Human-readable output with confidence (default)
    Human,
}

enum InputSource {
    Single(String),
    Batch(Vec<String>),
}

/// Structured prediction result
struct PredictionResult {
    class: Classification,
    class_label: String,
    prediction: Prediction,
    label_names: Vec<String>,
}

impl PredictionResult {
    fn new(prediction: Prediction, label_names: &[String]) -> Self {
        let class = prediction.classification(crate::CLASSIFICATION_THRESHOLD);
        let class_label = usize::try_from(i64::from(class))
            .ok()
            .and_then(|idx| label_names.get(idx))
            .cloned()
            .unwrap_or_else(|| class.to_string());
        Self {
            class,
            class_label,
            prediction,
            label_names: label_names.to_vec(),
        }
    }

    fn to_json(&self) -> Value {
        let probabilities = self
            .label_names
            .iter()
            .cloned()
            .zip(self.prediction.probabilities().map(Value::from))
            .collect::<Map<_, _>>();
        json!({
            "class": self.class,
            "class_label": self.class_label,
            "probabilities": probabilities,
        })
    }
}

/// Install the fmt subscriber; `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Predict(args) => run_predict(args, cli.verbose),
        Command::Features(args) => run_features(args),
        Command::Train(args) => run_train(args),
    }
}

/// Determine input source from CLI args
fn determine_input_source(input: &InputArgs) -> Result<InputSource> {
    // Priority: text arg > file > batch > batch_json > stdin
    if let Some(text) = &input.text {
        return Ok(InputSource::Single(text.clone()));
    }

    if let Some(path) = &input.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(InputSource::Single(text));
    }

    if let Some(path) = &input.batch {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        let texts = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect();
        return Ok(InputSource::Batch(texts));
    }

    if let Some(path) = &input.batch_json {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON batch file: {}", path.display()))?;
        let texts: Vec<String> =
            serde_json::from_str(&contents).with_context(|| "Failed to parse JSON array")?;
        return Ok(InputSource::Batch(texts));
    }

    // Read from stdin
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(InputSource::Single(buffer))
}

fn require_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Bitte gib einen Text ein!");
    }
    Ok(())
}

fn run_predict(args: &PredictArgs, verbose: bool) -> Result<()> {
    let detector = Detector::from_model_file(&args.model)?;

    match determine_input_source(&args.input)? {
        InputSource::Single(text) => {
            require_text(&text)?;
            let start = verbose.then(Instant::now);
            let features = detector.features(&text);
            let prediction = detector.classifier().predict_proba_features(&features);
            if let Some(start_time) = start {
                eprintln!("Inference time: {:?}", start_time.elapsed());
                for (name, contribution) in detector.classifier().explain(&features) {
                    eprintln!("{name:>24}: {contribution:+.4}");
                }
            }
            let result = PredictionResult::new(prediction, &args.labels);
            println!("{}", render_result(&result, args.format)?);
        }
        InputSource::Batch(texts) => {
            debug!(num_texts = texts.len(), "Batch prediction");
            let results = detector
                .predict_batch(&texts)
                .into_iter()
                .map(|prediction| PredictionResult::new(prediction, &args.labels))
                .collect::<Vec<_>>();
            if args.format == OutputFormat::Json {
                let json_array = results.iter().map(PredictionResult::to_json).collect();
                println!("{}", serde_json::to_string(&Value::Array(json_array))?);
            } else {
                for result in &results {
                    println!("{}", render_result(result, args.format)?);
                }
            }
        }
    }
    Ok(())
}

/// Render a single result based on format
fn render_result(result: &PredictionResult, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Class => result.class_label.clone(),
        OutputFormat::Probability => format!("{:.4}", result.prediction.ai_probability()),
        OutputFormat::Json => serde_json::to_string(&result.to_json())?,
        OutputFormat::Human => render_human(result.prediction),
    };
    Ok(rendered)
}

fn render_human(prediction: Prediction) -> String {
    let human = prediction.human_probability() * 100.0;
    let ai = prediction.ai_probability() * 100.0;
    match prediction.classification(crate::CLASSIFICATION_THRESHOLD) {
        Classification::AI => format!(
            "Ergebnis: Wahrscheinlich KI\nVertrauensscore: {ai:.2}% für KI vs. {human:.2}% für Mensch"
        ),
        Classification::Human => format!(
            "Ergebnis: Wahrscheinlich Mensch\nVertrauensscore: {human:.2}% für Mensch vs. {ai:.2}% für KI"
        ),
    }
}

fn render_features(features: &FeatureVector, as_json: bool) -> Result<String> {
    if as_json {
        return Ok(serde_json::to_string(features)?);
    }
    Ok(features
        .iter_named()
        .map(|(name, value)| format!("{name:>24}: {value:.6}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn run_features(args: &FeaturesArgs) -> Result<()> {
    match determine_input_source(&args.input)? {
        InputSource::Single(text) => {
            println!("{}", render_features(&crate::extract_features(&text), args.json)?);
        }
        InputSource::Batch(texts) => {
            for features in crate::extract_features_batch(&texts) {
                println!("{}", render_features(&features, args.json)?);
            }
        }
    }
    Ok(())
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let corpus = training::load_corpus(&args.data)
        .with_context(|| format!("Failed to load corpus from {}", args.data.display()))?;
    let config = TrainingConfig::default()
        .with_test_size(args.test_size)
        .with_seed(args.seed)
        .with_fit_params(
            FitParams::default()
                .with_c(args.c)
                .with_max_iter(args.max_iter),
        );

    let report = training::train(&corpus, &config).context("Training failed")?;
    println!("Test-Genauigkeit: {:.2}", report.accuracy);

    report
        .classifier
        .model()
        .save(&args.out)
        .with_context(|| format!("Failed to save model to {}", args.out.display()))?;
    println!("Modell wurde in {} gespeichert.", args.out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{Classifier, LogisticModel};

    fn labels() -> Vec<String> {
        vec!["Mensch".to_string(), "KI".to_string()]
    }

    fn prediction(ai_prob: f64) -> Prediction {
        Prediction::from_ai_probability(ai_prob)
    }

    #[test]
    fn parses_predict_command() {
        let cli = Cli::try_parse_from([
            "ki-erkenner",
            "predict",
            "--model",
            "model.json",
            "-o",
            "json",
            "Ein Text",
        ])
        .unwrap();
        let Command::Predict(args) = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.input.text.as_deref(), Some("Ein Text"));
        assert_eq!(args.labels, labels());
    }

    #[test]
    fn parses_train_defaults() {
        let cli = Cli::try_parse_from(["ki-erkenner", "train", "--data", "data.jsonl"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train command");
        };
        assert_eq!(args.out, PathBuf::from("model.json"));
        assert!((args.test_size - 0.2).abs() < f64::EPSILON);
        assert_eq!(args.seed, 42);
        assert_eq!(args.max_iter, 200);
    }

    #[test]
    fn text_and_file_conflict() {
        assert!(
            Cli::try_parse_from(["ki-erkenner", "features", "Text", "--file", "x.txt"]).is_err()
        );
    }

    #[test]
    fn human_output_matches_front_end_wording() {
        assert_eq!(
            render_human(prediction(0.8)),
            "Ergebnis: Wahrscheinlich KI\nVertrauensscore: 80.00% für KI vs. 20.00% für Mensch"
        );
        assert_eq!(
            render_human(prediction(0.25)),
            "Ergebnis: Wahrscheinlich Mensch\nVertrauensscore: 75.00% für Mensch vs. 25.00% für KI"
        );
    }

    #[test]
    fn json_output_uses_label_names() {
        let result = PredictionResult::new(prediction(0.75), &labels());
        let value = result.to_json();
        assert_eq!(value["class"], "AI");
        assert_eq!(value["class_label"], "KI");
        assert_eq!(value["probabilities"]["KI"], 0.75);
        assert_eq!(value["probabilities"]["Mensch"], 0.25);
    }

    #[test]
    fn class_and_probability_formats() {
        let result = PredictionResult::new(prediction(0.125), &labels());
        assert_eq!(render_result(&result, OutputFormat::Class).unwrap(), "Mensch");
        assert_eq!(
            render_result(&result, OutputFormat::Probability).unwrap(),
            "0.1250"
        );
    }

    #[test]
    fn empty_text_is_rejected() {
        let err = require_text("   \n").unwrap_err();
        assert_eq!(err.to_string(), "Bitte gib einen Text ein!");
        assert!(require_text("Hallo").is_ok());
    }

    #[test]
    fn batch_file_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Erster Text\n\nZweiter Text").unwrap();
        let input = InputArgs {
            text: None,
            file: None,
            batch: Some(file.path().to_path_buf()),
            batch_json: None,
        };
        let InputSource::Batch(texts) = determine_input_source(&input).unwrap() else {
            panic!("expected batch input");
        };
        assert_eq!(texts, vec!["Erster Text", "Zweiter Text"]);
    }

    #[test]
    fn features_render_in_order() {
        let rendered = render_features(&FeatureVector::default(), false).unwrap();
        let names = rendered
            .lines()
            .map(|line| line.split(':').next().unwrap().trim())
            .collect::<Vec<_>>();
        assert_eq!(names, crate::FEATURE_NAMES);
    }

    #[test]
    fn train_then_predict_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.jsonl");
        let out = dir.path().join("model.json");
        let records = [
            ("Also ich find das halt irgendwie gut, naja.", "Mensch"),
            ("Äh, ich weiß nicht, ob du das quasi so meinst :)", "Mensch"),
            ("Naja, eigentlich haben wir das halt so gemacht.", "Mensch"),
            ("Ach, ok, dann machen wir das halt morgen xD", "Mensch"),
            ("Die Analyse zeigt eine deutliche Verbesserung der Ergebnisse.", "KI"),
            ("Das Verfahren wird in mehreren Schritten durchgeführt.", "KI"),
            ("Die Ergebnisse wurden sorgfältig dokumentiert und überprüft.", "KI"),
            ("Eine umfassende Bewertung der Methode ist erforderlich.", "KI"),
        ];
        let lines = records
            .iter()
            .map(|(text, label)| json!({ "text": text, "label": label }).to_string())
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&data, lines).unwrap();

        let cli = Cli::try_parse_from([
            "ki-erkenner",
            "train",
            "--data",
            data.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--test-size",
            "0.25",
        ])
        .unwrap();
        run(&cli).unwrap();

        let classifier = Classifier::load(&out).unwrap();
        let model: &LogisticModel = classifier.model();
        assert_eq!(model.weights.len(), crate::FEATURE_COUNT);
    }
}

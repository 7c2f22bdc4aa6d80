//! tapu-verify: check a title-deed photo against a claimed Ada number.
//!
//! Exit status: 0 verified, 1 rejected / mismatch / unresolved, 2 error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use tapu_verify::config::{self, VerifierConfig};
use tapu_verify::pipeline::verification::{
    AuthenticityOracle, BundledTesseract, FixedConfidenceOracle, SessionOutcome,
};
use tapu_verify::{DocumentImage, DocumentVerifier, VerificationError, VerificationSession};

#[derive(Parser, Debug)]
#[command(name = config::APP_NAME)]
#[command(about = "Verify a land-title document against a claimed Ada number")]
#[command(version)]
struct Cli {
    /// Photo or scan of the title deed (PNG, JPEG or TIFF)
    image: PathBuf,

    /// Ada number the applicant entered
    #[arg(long)]
    ada: String,

    /// Directory holding `<lang>.traineddata`
    #[arg(long, default_value = "/usr/share/tesseract-ocr/5/tessdata")]
    tessdata: PathBuf,

    /// Tesseract language(s), e.g. `tur` or `tur+eng`
    #[arg(long, default_value = "tur")]
    lang: String,

    /// JSON file overriding thresholds and normalizer settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed authenticity confidence used when no classifier is given
    #[arg(long, default_value_t = 0.96)]
    authenticity: f32,

    /// ONNX document classifier (overrides --authenticity)
    #[cfg(feature = "onnx-classifier")]
    #[arg(long)]
    classifier: Option<PathBuf>,

    /// Print the outcome as JSON instead of a text report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tapu_verify::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Verification failed");
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<bool, VerificationError> {
    let config = match &cli.config {
        Some(path) => VerifierConfig::from_json_file(path)?,
        None => VerifierConfig::default(),
    };

    let bytes = std::fs::read(&cli.image).map_err(|e| {
        VerificationError::ImageDecode(format!("cannot read {}: {e}", cli.image.display()))
    })?;
    let image = DocumentImage::decode(&bytes)?;

    let ocr = BundledTesseract::new(&cli.tessdata)?.with_languages(&cli.lang);
    let verifier = DocumentVerifier::with_config(oracle(&cli)?, Box::new(ocr), config);
    let session = VerificationSession::new(verifier);

    let outcome = match session.submit(image, cli.ada.clone()).await? {
        SessionOutcome::Completed(outcome) => outcome,
        SessionOutcome::Superseded { generation } => {
            return Err(VerificationError::TaskJoin(format!(
                "attempt {generation} was superseded"
            )))
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| VerificationError::Config(e.to_string()))?;
        println!("{json}");
    } else {
        println!("{outcome}");
    }

    Ok(outcome.is_verified())
}

fn oracle(cli: &Cli) -> Result<Box<dyn AuthenticityOracle>, VerificationError> {
    match classifier(cli)? {
        Some(classifier) => Ok(classifier),
        None => Ok(Box::new(FixedConfidenceOracle::new(cli.authenticity))),
    }
}

#[cfg(feature = "onnx-classifier")]
fn classifier(cli: &Cli) -> Result<Option<Box<dyn AuthenticityOracle>>, VerificationError> {
    use tapu_verify::pipeline::verification::OnnxAuthenticityClassifier;

    match &cli.classifier {
        Some(path) => Ok(Some(Box::new(OnnxAuthenticityClassifier::load(path)?))),
        None => Ok(None),
    }
}

#[cfg(not(feature = "onnx-classifier"))]
fn classifier(_cli: &Cli) -> Result<Option<Box<dyn AuthenticityOracle>>, VerificationError> {
    Ok(None)
}

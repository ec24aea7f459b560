use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use facescan_core::aggregation::result_aggregator::ReportRow;
use facescan_core::detection::domain::face_embedder::FaceEmbedder;
use facescan_core::detection::domain::person_detector::PersonDetector;
use facescan_core::detection::infrastructure::onnx_face_embedder::OnnxFaceEmbedder;
use facescan_core::detection::infrastructure::onnx_yolo_person_detector::{
    OnnxYoloPersonDetector, YoloConfig,
};
use facescan_core::gallery::domain::reference_entry::ReferenceEntry;
use facescan_core::gallery::infrastructure::reference_dir::load_reference_dir;
use facescan_core::gallery::infrastructure::reference_manifest::{
    ManifestError, ReferenceManifest,
};
use facescan_core::pipeline::enroll_reference_use_case::EnrollReferenceUseCase;
use facescan_core::pipeline::errors::ScanError;
use facescan_core::pipeline::identify_people_use_case::IdentifyPeopleUseCase;
use facescan_core::report::csv_report::{to_csv_string, write_csv};
use facescan_core::report::json_report::to_json;
use facescan_core::scanning::scan_observer::LoggingScanObserver;
use facescan_core::scanning::scan_settings::ScanSettings;
use facescan_core::shared::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_FRAME_INTERVAL_SECS, DEFAULT_MIN_CONFIDENCE,
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
};
use facescan_core::shared::frame::Frame;
use facescan_core::shared::model_resolver;
use facescan_core::video::infrastructure::ffmpeg_image_reader::FfmpegImageReader;
use facescan_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Find known people in videos.
#[derive(Parser)]
#[command(name = "facescan", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a video and report the first sighting of each known person.
    Scan(ScanArgs),
    /// Add a reference photo for a person to a manifest.
    Enroll(EnrollArgs),
    /// List the people in a manifest.
    List {
        #[arg(long)]
        manifest: PathBuf,
    },
    /// Remove a person and all their references from a manifest.
    Remove {
        name: String,
        #[arg(long)]
        manifest: PathBuf,
    },
    /// Load the models and report whether they are usable.
    Check(CheckArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// Face detection model (.onnx). Downloaded when omitted.
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Face embedding model (.onnx). Downloaded when omitted.
    #[arg(long)]
    embedding_model: Option<PathBuf>,
}

#[derive(Args)]
struct ScanArgs {
    /// Input video file.
    video: PathBuf,

    /// Reference manifest (JSON).
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Extra reference as NAME=IMAGE. Repeatable.
    #[arg(long = "reference", value_parser = ReferenceEntry::parse_pair)]
    references: Vec<ReferenceEntry>,

    /// Directory with one sub-directory of photos per person.
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Minimum match confidence (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f64,

    /// Seconds between sampled frames.
    #[arg(long, default_value_t = DEFAULT_FRAME_INTERVAL_SECS)]
    frame_interval: f64,

    /// Face detector score threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_DETECTION_CONFIDENCE)]
    detection_confidence: f64,

    /// Output CSV (default: <data-dir>/results/<video name>.csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Print the report as JSON instead of CSV.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    models: ModelArgs,
}

#[derive(Args)]
struct EnrollArgs {
    name: String,

    image: PathBuf,

    #[arg(long)]
    manifest: PathBuf,

    /// Free-form JSON stored with the person.
    #[arg(long, value_parser = parse_json)]
    metadata: Option<serde_json::Value>,

    #[command(flatten)]
    models: ModelArgs,
}

#[derive(Args)]
struct CheckArgs {
    /// Optional COCO person-detection model (.onnx) to warm up as well.
    #[arg(long)]
    person_model: Option<PathBuf>,

    #[command(flatten)]
    models: ModelArgs,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(exit_code(&*e));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Scan(args) => run_scan(args),
        Command::Enroll(args) => run_enroll(args),
        Command::List { manifest } => run_list(&manifest),
        Command::Remove { name, manifest } => run_remove(&name, &manifest),
        Command::Check(args) => run_check(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ScanSettings {
        min_confidence: args.min_confidence,
        frame_interval_secs: args.frame_interval,
    };
    settings.validate()?;
    if !(0.0..=1.0).contains(&args.detection_confidence) {
        return Err(ScanError::InvalidInput(format!(
            "detection confidence must be within [0, 1], got {}",
            args.detection_confidence
        ))
        .into());
    }
    if !args.video.is_file() {
        return Err(ScanError::InvalidInput(format!(
            "video file not found: {}",
            args.video.display()
        ))
        .into());
    }

    let references = collect_references(&args)?;
    if references.is_empty() {
        log::warn!("No references given; writing an empty report");
        return emit_report(&args, &[]);
    }

    let mut embedder =
        build_embedder(&args.models).with_detection_confidence(args.detection_confidence);
    let mut use_case = IdentifyPeopleUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(LoggingScanObserver::default()),
        settings,
    );
    let rows = use_case.execute(&args.video, &references, &mut embedder)?;
    emit_report(&args, &rows)
}

/// Writes the CSV report and prints it to stdout.
fn emit_report(args: &ScanArgs, rows: &[ReportRow]) -> Result<(), Box<dyn std::error::Error>> {
    let csv_path = args
        .csv
        .clone()
        .unwrap_or_else(|| default_csv_path(&args.data_dir, &args.video));
    write_csv(&csv_path, rows).map_err(ScanError::from)?;
    log::info!("Report written to {}", csv_path.display());

    if args.json {
        println!("{}", to_json(rows).map_err(ScanError::from)?);
    } else {
        print!("{}", to_csv_string(rows));
    }
    Ok(())
}

fn collect_references(args: &ScanArgs) -> Result<Vec<ReferenceEntry>, Box<dyn std::error::Error>> {
    let mut references = Vec::new();
    if let Some(path) = &args.manifest {
        if !path.is_file() {
            return Err(ScanError::InvalidInput(format!(
                "manifest not found: {}",
                path.display()
            ))
            .into());
        }
        let manifest = ReferenceManifest::load(path)?;
        references.extend(manifest.to_entries(path.parent().unwrap_or(Path::new("."))));
    }
    if let Some(dir) = &args.reference_dir {
        let entries = load_reference_dir(dir).map_err(|e| {
            ScanError::InvalidInput(format!("cannot read reference dir {}: {e}", dir.display()))
        })?;
        references.extend(entries);
    }
    references.extend(args.references.iter().cloned());
    Ok(references)
}

fn run_enroll(args: EnrollArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut embedder = build_embedder(&args.models);
    let record = EnrollReferenceUseCase::new(&args.manifest).execute(
        &mut embedder,
        &args.name,
        &args.image,
        args.metadata,
    )?;
    println!(
        "Enrolled {} ({}-d embedding) into {}",
        args.name,
        record.embedding.map(|e| e.len()).unwrap_or_default(),
        args.manifest.display()
    );
    Ok(())
}

fn run_list(manifest_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = ReferenceManifest::load(manifest_path)?;
    if manifest.people.is_empty() {
        println!("No people in {}", manifest_path.display());
        return Ok(());
    }
    for person in &manifest.people {
        let metadata = person
            .metadata
            .as_ref()
            .map(|m| format!("  {m}"))
            .unwrap_or_default();
        println!("{}\t{} reference(s){metadata}", person.name, person.references.len());
    }
    Ok(())
}

fn run_remove(name: &str, manifest_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut manifest = ReferenceManifest::load(manifest_path)?;
    let removed = manifest.remove_person(name)?;
    manifest.save(manifest_path)?;
    println!(
        "Removed {} and {} reference(s)",
        removed.name,
        removed.references.len()
    );
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut embedder = build_embedder(&args.models);
    let blank = Frame::new(vec![0u8; 640 * 640 * 3], 640, 640, 3, 0);

    if embedder.is_available() {
        embedder.detect(&blank)?;
        println!("Face models: ready");
    } else {
        println!("Face models: unavailable");
    }

    if let Some(path) = &args.person_model {
        let mut detector = OnnxYoloPersonDetector::load(path, YoloConfig::default());
        if detector.is_available() {
            detector.detect_person_boxes(&blank)?;
            println!("Person model: ready");
        } else {
            println!("Person model: unavailable");
        }
    }

    if embedder.is_available() {
        Ok(())
    } else {
        Err(ScanError::ModelUnavailable.into())
    }
}

/// Resolves and loads both face models. Resolution failures yield an
/// unavailable embedder so commands report "model unavailable" uniformly.
fn build_embedder(models: &ModelArgs) -> OnnxFaceEmbedder {
    let bundled = bundled_models_dir();
    let resolve = |name: &str, url: &str, path: Option<&Path>| {
        log::info!("Resolving model: {name}");
        let result = model_resolver::resolve(
            name,
            url,
            path,
            bundled.as_deref(),
            Some(Box::new(download_progress)),
        );
        eprintln!();
        result
    };

    let face = resolve(FACE_MODEL_NAME, FACE_MODEL_URL, models.face_model.as_deref());
    let embedding = resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        models.embedding_model.as_deref(),
    );

    match (face, embedding) {
        (Ok(face), Ok(embedding)) => {
            OnnxFaceEmbedder::load(&face, &embedding, Box::new(FfmpegImageReader::new()))
        }
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Could not resolve face models: {e}");
            OnnxFaceEmbedder::unavailable(Box::new(FfmpegImageReader::new()))
        }
    }
}

/// `models/` next to the executable, for packaged installs.
fn bundled_models_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")))
}

fn default_csv_path(data_dir: &Path, video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    data_dir.join("results").join(format!("{stem}.csv"))
}

fn parse_json(text: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))
}

fn exit_code(error: &(dyn std::error::Error + 'static)) -> i32 {
    if let Some(scan) = error.downcast_ref::<ScanError>() {
        return scan.exit_code();
    }
    match error.downcast_ref::<ManifestError>() {
        Some(ManifestError::Read { .. } | ManifestError::Write { .. }) => 1,
        Some(_) => 2,
        None => 1,
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults() {
        let cli = Cli::try_parse_from(["facescan", "scan", "clip.mp4", "--manifest", "people.json"])
            .unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.min_confidence, 0.6);
        assert_eq!(args.frame_interval, 1.0);
        assert_eq!(args.detection_confidence, 0.5);
        assert_eq!(args.data_dir, PathBuf::from("data"));
        assert!(!args.json);
        assert!(args.references.is_empty());
    }

    #[test]
    fn test_scan_repeated_references() {
        let cli = Cli::try_parse_from([
            "facescan",
            "scan",
            "clip.mp4",
            "--reference",
            "ada=ada.jpg",
            "--reference",
            "bob=bob.png",
        ])
        .unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let names: Vec<&str> = args.references.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ada", "bob"]);
    }

    #[test]
    fn test_malformed_reference_rejected() {
        assert!(Cli::try_parse_from(["facescan", "scan", "clip.mp4", "--reference", "ada"]).is_err());
    }

    #[test]
    fn test_enroll_metadata_must_be_json() {
        assert!(Cli::try_parse_from([
            "facescan", "enroll", "ada", "ada.jpg", "--manifest", "p.json", "--metadata", "{oops",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "facescan", "enroll", "ada", "ada.jpg", "--manifest", "p.json", "--metadata",
            r#"{"team":"x"}"#,
        ])
        .is_ok());
    }

    #[test]
    fn test_default_csv_path_uses_video_stem() {
        assert_eq!(
            default_csv_path(Path::new("data"), Path::new("/videos/party.mov")),
            PathBuf::from("data/results/party.csv")
        );
    }

    #[test]
    fn test_exit_codes() {
        let unavailable: Box<dyn std::error::Error> = ScanError::ModelUnavailable.into();
        assert_eq!(exit_code(&*unavailable), 3);

        let invalid: Box<dyn std::error::Error> = ScanError::InvalidInput("x".into()).into();
        assert_eq!(exit_code(&*invalid), 2);

        let no_face: Box<dyn std::error::Error> = ManifestError::NoFace("a.jpg".into()).into();
        assert_eq!(exit_code(&*no_face), 2);

        let other: Box<dyn std::error::Error> = "boom".into();
        assert_eq!(exit_code(&*other), 1);
    }

    #[test]
    fn test_reference_dir_and_manifest_combined() {
        let tmp = tempfile::TempDir::new().unwrap();
        let manifest_path = tmp.path().join("people.json");
        std::fs::write(
            &manifest_path,
            r#"{"people": [{"name": "ada", "references": [{"image": "ada.jpg"}]}]}"#,
        )
        .unwrap();
        let refs = tmp.path().join("refs");
        std::fs::create_dir_all(refs.join("bob")).unwrap();
        std::fs::write(refs.join("bob").join("1.png"), b"").unwrap();

        let argv: Vec<std::ffi::OsString> = vec![
            "facescan".into(),
            "scan".into(),
            "clip.mp4".into(),
            "--manifest".into(),
            manifest_path.clone().into(),
            "--reference-dir".into(),
            refs.clone().into(),
            "--reference".into(),
            "cy=cy.jpg".into(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };

        let entries = collect_references(&args).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ada", "bob", "cy"]);
        assert_eq!(entries[0].image_path, Some(tmp.path().join("ada.jpg")));
    }

    #[test]
    fn test_scan_without_references_writes_header_only_csv() {
        let tmp = tempfile::TempDir::new().unwrap();
        let video = tmp.path().join("clip.mp4");
        std::fs::write(&video, b"").unwrap();
        let csv = tmp.path().join("out").join("clip.csv");

        let argv: Vec<std::ffi::OsString> = vec![
            "facescan".into(),
            "scan".into(),
            video.into(),
            "--csv".into(),
            csv.clone().into(),
        ];
        let Command::Scan(args) = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected scan");
        };

        run_scan(args).unwrap();
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap().trim_end(),
            "name,confidence,first_seen_sec"
        );
    }
}

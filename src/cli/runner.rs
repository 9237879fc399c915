use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fuzzyview::api::{process_vector_file_to_dir, report_path};
use fuzzyview::{BatchReport, CancelToken, ViewshedConfig, WhiteboxViewshed};

use super::args::CliArgs;
use super::errors::AppError;

/// Preset (or defaults) with command-line overrides applied
pub fn build_config(args: &CliArgs) -> Result<ViewshedConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => ViewshedConfig::from_json_file(path)?,
        None => ViewshedConfig::default(),
    };
    if let Some(b1) = args.b1 {
        config.b1 = b1;
    }
    if let Some(h) = args.observer_height {
        config.observer_height = h;
    }
    if args.max_distance.is_some() {
        config.max_distance = args.max_distance;
    }
    if let Some(arc) = args.visual_arc {
        config.visual_arc = arc;
    }
    if let Some(m) = args.distance_multiplier {
        config.distance_multiplier = m;
    }
    if let Some(field) = &args.id_field {
        config.id_field = field.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.output_prefix = prefix.clone();
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
    if args.timeout.is_some() {
        config.engine_timeout_secs = args.timeout;
    }
    config.strict |= args.strict;
    config.validate()?;
    Ok(config)
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    for path in [&args.dem, &args.features] {
        if !path.exists() {
            return Err(AppError::MissingInput {
                path: path.display().to_string(),
            });
        }
    }

    let config = build_config(&args)?;
    let engine = WhiteboxViewshed::new(&args.whitebox);

    info!("DEM: {:?}", args.dem);
    info!("Features: {:?}", args.features);
    info!("Output directory: {:?}", args.output_dir);
    info!("Visibility engine: {:?}", engine.executable());
    info!(
        "b1 = {}, observer height = {}, max distance = {:?}",
        config.b1, config.observer_height, config.max_distance
    );

    let report = process_vector_file_to_dir(
        &args.dem,
        &args.features,
        &args.output_dir,
        &config,
        &engine,
        &CancelToken::new(),
    )?;

    info!("Processed: {}", report.processed);
    info!("Failed: {}", report.failed);
    for failure in &report.failures {
        warn!("{}: {}", failure.id, failure.reason);
    }

    check_report(&report, &args.output_dir)
}

/// A run where every feature failed exits with an error
fn check_report(report: &BatchReport, output_dir: &Path) -> Result<(), AppError> {
    if report.processed == 0 && report.failed > 0 {
        return Err(AppError::FeaturesFailed {
            failed: report.failed,
            total: report.processed + report.failed,
            report: report_path(output_dir).display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec![
            "fuzzyview",
            "--dem",
            "dem.tif",
            "--features",
            "f.shp",
            "-o",
            "out",
        ];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = build_config(&parse(&[])).unwrap();
        assert_eq!(config, ViewshedConfig::default());
    }

    #[test]
    fn test_flags_override_preset() {
        let dir = tempfile::tempdir().unwrap();
        let preset = dir.path().join("p.json");
        std::fs::write(&preset, r#"{ "b1": 300.0, "observer_height": 10.0 }"#).unwrap();
        let preset_arg = preset.to_string_lossy().into_owned();

        let config = build_config(&parse(&[
            "--config",
            &preset_arg,
            "--b1",
            "500",
            "--max-distance",
            "5000",
            "--strict",
        ]))
        .unwrap();
        assert_eq!(config.b1, 500.0);
        assert_eq!(config.observer_height, 10.0);
        assert_eq!(config.max_distance, Some(5000.0));
        assert!(config.strict);
    }

    #[test]
    fn test_invalid_flag_value_is_rejected() {
        let args = parse(&["--b1", "-3"]);
        assert_eq!(args.b1, Some(-3.0));
        let err = build_config(&args).unwrap_err();
        assert!(matches!(
            err,
            AppError::Library(fuzzyview::Error::Configuration { arg: "b1", .. })
        ));

        let err = build_config(&parse(&["--max-distance=-10"])).unwrap_err();
        assert!(matches!(
            err,
            AppError::Library(fuzzyview::Error::Configuration { arg: "max_distance", .. })
        ));
    }

    fn report(processed: usize, failed: usize) -> BatchReport {
        let now = chrono::Utc::now();
        BatchReport {
            processed,
            failed,
            failures: Vec::new(),
            outputs: Vec::new(),
            started: now,
            finished: now,
        }
    }

    #[test]
    fn test_all_failed_run_is_an_error() {
        let out = Path::new("out");
        assert!(check_report(&report(2, 1), out).is_ok());
        assert!(check_report(&report(0, 0), out).is_ok());

        let err = check_report(&report(0, 3), out).unwrap_err();
        assert!(matches!(err, AppError::FeaturesFailed { failed: 3, total: 3, .. }));
        assert!(err.to_string().starts_with("3 of 3 features failed; see "));
    }
}

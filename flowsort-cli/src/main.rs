//! Sort frame directories into moving and still ledgers

use anyhow::{anyhow, Context, Result};
use clap::*;
use flowsort::prelude::v1::*;
use frame_loader::ImageFrameSource;
use horn_schunck_estimator::HornSchunckEstimator;
use log::*;
use std::path::Path;

fn command() -> Command<'static> {
    Command::new("flowsort")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .default_value("cfg.yaml"),
        )
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .short('t')
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::new("classify-by")
                .long("classify-by")
                .takes_value(true)
                .possible_values(["folder", "frame"])
                .required(false),
        )
        .arg(
            Arg::new("alpha")
                .long("alpha")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::new("iterations")
                .long("iterations")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::new("max-dimension")
                .long("max-dimension")
                .takes_value(true)
                .required(false),
        )
        .arg(Arg::new("parallel").long("parallel").short('p'))
        .arg(Arg::new("verbose").long("verbose").short('v'))
}

/// Load the configuration file and apply command line overrides on top.
fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = Path::new(matches.value_of("config").unwrap_or("cfg.yaml"));

    let input = matches.value_of("input");
    let threshold = matches
        .value_of("threshold")
        .map(str::parse::<f32>)
        .transpose()
        .context("invalid --threshold")?;

    let mut config = if path.exists() {
        Config::load(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        match (input, threshold) {
            (Some(input), Some(threshold)) => Config::new(input, threshold),
            _ => {
                return Err(anyhow!(
                    "{} does not exist, --input and --threshold are required",
                    path.display()
                ))
            }
        }
    };

    if let Some(input) = input {
        config.input_path = input.into();
    }

    if let Some(threshold) = threshold {
        config.motion_threshold = threshold;
    }

    if let Some(mode) = matches.value_of("classify-by") {
        config.classify_by = mode.parse()?;
    }

    if matches.is_present("parallel") {
        config.parallel = true;
    }

    config.validate()?;

    Ok(config)
}

/// Build the motion estimator, tuned by command line arguments.
fn estimator(matches: &ArgMatches) -> Result<HornSchunckEstimator> {
    let mut estimator = HornSchunckEstimator::default();

    if let Some(alpha) = matches.value_of("alpha") {
        let alpha: f32 = alpha.parse().context("invalid --alpha")?;
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(anyhow!("--alpha must be a positive number, got {}", alpha));
        }
        estimator = estimator.with_alpha(alpha);
    }

    if let Some(iterations) = matches.value_of("iterations") {
        estimator = estimator.with_iterations(iterations.parse().context("invalid --iterations")?);
    }

    if let Some(max_dimension) = matches.value_of("max-dimension") {
        estimator = estimator
            .with_max_dimension(max_dimension.parse().context("invalid --max-dimension")?);
    }

    Ok(estimator)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;

    info!(
        "Classifying {} by {:?} with threshold {}",
        config.input_path.display(),
        config.classify_by,
        config.motion_threshold
    );

    let estimator = estimator(matches)?;
    debug!("Using {:?}", estimator);

    let runner = BatchRunner::new(config, ImageFrameSource, estimator)?;

    for outcome in runner.run()? {
        let report = &outcome.report;
        info!(
            "{}: {} directories ({} skipped), {} moving, {} still -> {}",
            outcome.folder.display(),
            outcome.processed,
            outcome.skipped,
            report.moving.count,
            report.still.count,
            outcome.save_dir.display()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let matches = command().get_matches();

    let level = if matches.is_present("verbose") {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(&matches).map_err(|e| {
        error!("{:#}", e);
        e
    })
}

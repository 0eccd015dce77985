use anyhow::Result;
use burn_ndarray::NdArray;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use volfuse_core::interpolation::Interpolation;
use volfuse_pipeline::{
    FusionError, LoggingObserver, Pipeline, PipelineParams, Verbosity, DEFAULT_OUTPUT,
};

type Backend = NdArray<f32>;

#[derive(Parser, Debug)]
#[command(name = "volfuse")]
#[command(about = "Warp images into a destination space and merge them into one volume")]
struct Cli {
    /// Source images, comma separated
    #[arg(short = 'i', long = "inputs", value_delimiter = ',', required = true)]
    inputs: Vec<PathBuf>,

    /// Destination image defining the output grid
    #[arg(short = 'd', long = "destination")]
    destination: PathBuf,

    /// Displacement fields, comma separated, one per source in the same order
    #[arg(short = 'w', long = "warps", value_delimiter = ',', required = true)]
    warps: Vec<PathBuf>,

    /// Interpolation: nn, linear or spline
    #[arg(short = 'x', long = "interpolation", default_value = "nn")]
    interpolation: String,

    /// Output image (.nii or .nii.gz)
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Remove temporary files: 1 yes, 0 keep them
    #[arg(short = 'r', long = "remove-temp", default_value = "1")]
    remove_temp: String,

    /// Verbosity: 0 quiet, 1 normal, 2 expanded
    #[arg(short = 'v', long = "verbosity", default_value = "1")]
    verbosity: String,

    /// Directory to create the temporary workspace in
    #[arg(long = "tmp-dir")]
    tmp_dir: Option<PathBuf>,

    /// Warp the sources in parallel
    #[arg(long)]
    parallel: bool,
}

impl Cli {
    fn params(&self) -> Result<PipelineParams, FusionError> {
        let interpolation: Interpolation = self.interpolation.parse()?;
        let verbosity: Verbosity = self.verbosity.parse()?;
        let remove_temp = match self.remove_temp.trim() {
            "1" => true,
            "0" => false,
            other => {
                return Err(FusionError::invalid_parameter(format!(
                    "remove-temp must be 0 or 1, got `{}`",
                    other
                )))
            }
        };

        let mut params = PipelineParams::new()
            .with_interpolation(interpolation)
            .with_output(&self.output)
            .with_remove_temp(remove_temp)
            .with_verbosity(verbosity)
            .with_parallel_warps(self.parallel);
        if let Some(dir) = &self.tmp_dir {
            params = params.with_workspace_parent(dir);
        }
        Ok(params)
    }
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let params = cli.params()?;
    init_tracing(params.verbosity);
    tracing::debug!("parameters: {:?}", params);

    let verbosity = params.verbosity;
    let pipeline = Pipeline::nifti::<Backend>(params, Default::default())
        .with_observer(Arc::new(LoggingObserver));
    let report = pipeline.run_paths(cli.inputs, cli.destination, cli.warps)?;

    if verbosity >= Verbosity::Normal {
        println!("Merged image: {}", report.output.display());
        if let Some(workspace) = &report.retained_workspace {
            println!("Temporary files: {}", workspace.display());
        }
        println!("View with: fslview {} &", report.output.display());
    }

    Ok(())
}

use std::path::PathBuf;

use cuemin_core::observation::{ObservationError, ObservationLog};
use cuemin_inference::cuemin::{CueMin, CueMinConfig, CueMinError, InferenceOutcome};

use dd::WriteYAML;
use structopt::StructOpt;

fn print_inferred_queue(outcome: &InferenceOutcome) {
    let best = &outcome.best;
    println!("waiting area:            {}", best.waiting_area);
    println!("servers:                 {}", best.nr_of_servers);
    println!("service time:            {}", best.service_time);
    println!("batch size distribution: {}", best.batch_size_distribution);
    println!("mdl score:               {:.3} bits", best.mdl_score);
}

fn main() {
    let args = Opt::from_args();

    let exit_code = match _main(args) {
        Ok(()) => 0,
        Err(AppError::ObservationError(e)) => {
            eprintln!("Bad observation log: {:#?}", e);
            1
        }
        Err(AppError::OSError(e)) => {
            eprintln!("Bad input: {:#?}", e);
            2
        }
        Err(AppError::SerializationFailure(e)) => {
            eprintln!("Cannot serialize: {:#?}", e);
            3
        }
        Err(AppError::InferenceError(e)) => {
            eprintln!("Inference failed: {:#?}", e);
            4
        }
    };
    std::process::exit(exit_code);
}

fn _main(args: Opt) -> AppResult {
    let arrivals = ObservationLog::from_yaml_file(&args.arrivals)?;
    let departures = ObservationLog::from_yaml_file(&args.departures)?;

    let config = CueMinConfig {
        strategy: args.strategy.clone(),
        seed: args.seed,
        patience: args.patience,
        record: args.record.is_some(),
        consider_siro: !args.no_siro,
        ..Default::default()
    };

    let outcome = CueMin::new(config).infer_queue(&arrivals, &departures, &[])?;

    if args.output.is_none() || args.print {
        print_inferred_queue(&outcome);
    }

    if let Some(ref path) = args.output {
        dd::Output::from(&outcome).write_yaml(path)?;
    }
    if let Some(ref path) = args.record {
        dd::Report::from(&outcome).write_yaml(path)?;
    }

    Ok(())
}

/* Args */
#[derive(Debug, StructOpt)]
pub struct Opt {
    /// Arrival log (YAML file).
    #[structopt(short = "a", long, parse(from_os_str))]
    pub arrivals: PathBuf,

    /// Departure log (YAML file).
    #[structopt(short = "d", long, parse(from_os_str))]
    pub departures: PathBuf,

    /// Search over the server count: linear, linear-LO-HI, N-section,
    /// adaptive, sa, sa-BUDGET or weighted_sampling.
    #[structopt(short = "s", long, default_value = "linear")]
    pub strategy: String,

    /// Seed for every random choice the inference makes.
    #[structopt(long, default_value = "0")]
    pub seed: u64,

    /// Stalled evaluations tolerated before a search gives up.
    #[structopt(long, default_value = "2")]
    pub patience: usize,

    /// Where to write the inferred model (YAML file).
    /// If not specified, will only print human readable output.
    /// The file must not exist.
    #[structopt(short = "o", long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Write one row per scored candidate to this YAML file.
    /// The file must not exist.
    #[structopt(long, parse(from_os_str))]
    pub record: Option<PathBuf>,

    /// Leave random-order service out of the discipline candidates.
    #[structopt(long = "no-siro")]
    pub no_siro: bool,

    /// Print the inferred model even when --output is set.
    #[structopt(short = "p", long)]
    pub print: bool,
}

/* I/O formats and conversions */
mod dd {
    use std::fs::OpenOptions;
    use std::path::Path;

    use cuemin_inference::cuemin::{InferenceOutcome, InferredQueue};
    use cuemin_inference::score::Record;
    use serde::Serialize;

    use crate::AppError;

    pub trait WriteYAML {
        fn write_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), AppError>;
    }

    fn write_to_new_file<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), AppError> {
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
            .map_err(AppError::OSError)?;
        serde_yaml::to_writer(file, value).map_err(AppError::SerializationFailure)
    }

    #[derive(Serialize, Debug)]
    pub struct Output {
        pub inferred_queue: InferredQueue,
    }

    impl From<&InferenceOutcome> for Output {
        fn from(outcome: &InferenceOutcome) -> Self {
            Output { inferred_queue: outcome.best.clone() }
        }
    }

    impl WriteYAML for Output {
        fn write_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), AppError> {
            write_to_new_file(path, self)
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Report {
        pub candidates: Vec<Record>,
    }

    impl From<&InferenceOutcome> for Report {
        fn from(outcome: &InferenceOutcome) -> Self {
            Report { candidates: outcome.records.clone() }
        }
    }

    impl WriteYAML for Report {
        fn write_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), AppError> {
            write_to_new_file(path, self)
        }
    }
}

/* Error handling */

type AppResult = Result<(), AppError>;

pub enum AppError {
    ObservationError(ObservationError),
    OSError(std::io::Error),
    SerializationFailure(serde_yaml::Error),
    InferenceError(CueMinError),
}

impl From<ObservationError> for AppError {
    fn from(e: ObservationError) -> AppError {
        AppError::ObservationError(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> AppError {
        AppError::OSError(e)
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> AppError {
        AppError::SerializationFailure(e)
    }
}

impl From<CueMinError> for AppError {
    fn from(e: CueMinError) -> AppError {
        AppError::InferenceError(e)
    }
}

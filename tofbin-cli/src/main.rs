//! tofbin CLI
//!
//! Loads per-spectrum event lists from JSON, runs a reduction pipeline over
//! them and writes the resulting histograms as JSON.
#![allow(clippy::cast_precision_loss, clippy::too_many_lines)]

use clap::{ArgAction, Parser, Subcommand};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use tofbin_algorithms::{
    run_pipeline, Instrument, NullProgress, ReductionConfig, SimpleInstrument, StepReport,
};
use tofbin_core::{
    BinEdges, EventList, EventWorkspace, MatrixWorkspace, PulseTime, RebinParams, TofEvent,
    WeightedEvent, WeightedEventNoTime,
};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] tofbin_core::Error),

    #[error("Algorithm error: {0}")]
    Algorithm(#[from] tofbin_algorithms::Error),

    #[error("invalid input: {0}")]
    Input(String),
}

/// Event histogramming and reduction for time-of-flight neutron data.
#[derive(Parser)]
#[command(name = "tofbin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reduction pipeline over an event file
    Process {
        /// Input event file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Instrument geometry (JSON), needed by solid_angle steps
        #[arg(long)]
        instrument: Option<PathBuf>,

        /// Output file; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Initial binning as "x0,dx,x1,..."; one bin over the TOF range by default
        #[arg(short, long)]
        bins: Option<RebinParams>,
    },

    /// Show information about an event file
    Info {
        /// Input event file (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the bin edges generated from rebin parameters
    Axis {
        /// Rebin parameters "x0,dx,x1,..."
        #[arg(short, long, allow_hyphen_values = true)]
        params: RebinParams,
    },
}

/// Event file layout: one entry per spectrum.
#[derive(Debug, Deserialize)]
struct EventFile {
    spectra: Vec<SpectrumEvents>,
}

#[derive(Debug, Deserialize)]
struct SpectrumEvents {
    tof: Vec<f64>,
    #[serde(default)]
    pulse_time: Option<Vec<i64>>,
    #[serde(default)]
    weight: Option<Vec<f32>>,
    #[serde(default)]
    error_squared: Option<Vec<f32>>,
}

impl SpectrumEvents {
    fn into_event_list(self, index: usize) -> Result<EventList> {
        let n = self.tof.len();
        let check = |what: &str, len: usize| {
            if len == n {
                Ok(())
            } else {
                Err(CliError::Input(format!(
                    "spectrum {index}: {what} has {len} entries, tof has {n}"
                )))
            }
        };
        if let Some(pulse_time) = &self.pulse_time {
            check("pulse_time", pulse_time.len())?;
        }
        if let Some(error_squared) = &self.error_squared {
            check("error_squared", error_squared.len())?;
        }

        let Some(weight) = self.weight else {
            if self.error_squared.is_some() {
                return Err(CliError::Input(format!(
                    "spectrum {index}: error_squared given without weight"
                )));
            }
            let pulse_time = self.pulse_time.unwrap_or_else(|| vec![0; n]);
            let events = self
                .tof
                .into_iter()
                .zip(pulse_time)
                .map(|(tof, pulse)| TofEvent::new(tof, PulseTime::new(pulse)))
                .collect();
            return Ok(EventList::from_tof_events(events));
        };
        check("weight", weight.len())?;
        // Without explicit errors each weighted event counts as a scaled
        // Poisson count.
        let error_squared = self
            .error_squared
            .unwrap_or_else(|| weight.iter().map(|w| w * w).collect());

        Ok(match self.pulse_time {
            Some(pulse_time) => EventList::from_weighted_events(
                (0..n)
                    .map(|i| {
                        WeightedEvent::new(
                            self.tof[i],
                            PulseTime::new(pulse_time[i]),
                            weight[i],
                            error_squared[i],
                        )
                    })
                    .collect(),
            ),
            None => EventList::from_weighted_no_time_events(
                (0..n)
                    .map(|i| WeightedEventNoTime::new(self.tof[i], weight[i], error_squared[i]))
                    .collect(),
            ),
        })
    }
}

/// Histogram output, written through the read-only workspace accessors.
#[derive(Debug, Serialize)]
struct WorkspaceDump<'a> {
    kind: &'static str,
    x_unit: &'a str,
    y_unit: &'a str,
    distribution: bool,
    steps: &'a [StepReport],
    spectra: Vec<SpectrumDump>,
}

#[derive(Debug, Serialize)]
struct SpectrumDump {
    x: Vec<f64>,
    y: Vec<f64>,
    e: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    masked: Vec<(usize, f64)>,
}

fn load_event_lists(path: &Path) -> Result<Vec<EventList>> {
    let file: EventFile = serde_json::from_reader(std::io::BufReader::new(File::open(path)?))?;
    file.spectra
        .into_iter()
        .enumerate()
        .map(|(index, spectrum)| spectrum.into_event_list(index))
        .collect()
}

/// Smallest and largest TOF over all lists.
fn tof_range(lists: &[EventList]) -> Option<(f64, f64)> {
    let min = lists.iter().filter_map(EventList::tof_min).reduce(f64::min)?;
    let max = lists.iter().filter_map(EventList::tof_max).reduce(f64::max)?;
    Some((min, max))
}

/// One bin spanning every event, so no event falls off the upper edge.
fn default_binning(lists: &[EventList]) -> BinEdges {
    match tof_range(lists) {
        Some((min, max)) => BinEdges::new(vec![min.floor(), max.floor() + 1.0]),
        None => BinEdges::new(vec![0.0, 1.0]),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Process {
            input,
            config,
            instrument,
            output,
            bins,
        } => {
            let start = Instant::now();
            let config = ReductionConfig::from_file(&config)?;
            let instrument = instrument
                .map(SimpleInstrument::from_file)
                .transpose()?;

            let lists = load_event_lists(&input)?;
            let x = match bins {
                Some(params) => params.create_bin_edges()?,
                None => default_binning(&lists),
            };
            let mut events = EventWorkspace::from_event_lists(lists, x)?;
            events.sort_all();
            info!(
                "loaded {} events in {} spectra from {}",
                events.number_events(),
                events.num_histograms(),
                input.display()
            );

            let result = run_pipeline(
                events.into(),
                &config,
                instrument.as_ref().map(|i| i as &dyn Instrument),
                &NullProgress,
            )?;
            for report in &result.reports {
                debug!(
                    "{}: {} with {} spectra x {} bins",
                    report.step, report.workspace, report.num_histograms, report.blocksize
                );
            }

            let matrix = result.workspace.as_matrix();
            let document = WorkspaceDump {
                kind: result.workspace.kind(),
                x_unit: matrix.x_unit(),
                y_unit: matrix.y_unit(),
                distribution: matrix.is_distribution(),
                steps: &result.reports,
                spectra: spectra_of(matrix)?,
            };
            match &output {
                Some(path) => {
                    let mut writer = BufWriter::new(File::create(path)?);
                    serde_json::to_writer_pretty(&mut writer, &document)?;
                    writer.flush()?;
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut writer = stdout.lock();
                    serde_json::to_writer_pretty(&mut writer, &document)?;
                    writeln!(writer)?;
                }
            }

            eprintln!(
                "Ran {} steps on {} spectra in {:.2}s",
                result.reports.len(),
                matrix.num_histograms(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Info { input } => {
            let lists = load_event_lists(&input)?;
            let total: usize = lists.iter().map(EventList::number_events).sum();
            let weight: f64 = lists.iter().map(EventList::total_weight).sum();

            println!("File: {}", input.display());
            println!("Spectra: {}", lists.len());
            println!("Events: {total}");
            println!("Total weight: {weight}");
            if let Some(list) = lists.first() {
                println!("Event type: {}", list.event_type());
            }
            if let Some((min, max)) = tof_range(&lists) {
                println!("TOF range: {min} - {max}");
            }
        }

        Commands::Axis { params } => {
            let edges = params.create_axis()?;
            println!("{}", serde_json::to_string(&edges)?);
            eprintln!("{} bins", edges.len().saturating_sub(1));
        }
    }

    Ok(())
}

fn spectra_of(matrix: &dyn MatrixWorkspace) -> Result<Vec<SpectrumDump>> {
    (0..matrix.num_histograms())
        .map(|i| -> Result<SpectrumDump> {
            let histogram = matrix.histogram(i)?;
            Ok(SpectrumDump {
                x: histogram.x().to_vec(),
                y: histogram.y().to_vec(),
                e: histogram.e().to_vec(),
                masked: matrix
                    .masked_bins(i)
                    .map(|masks| masks.iter().collect())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_spectrum_without_pulse_time() {
        let spectrum: SpectrumEvents =
            serde_json::from_str(r#"{"tof": [1.0, 2.0], "weight": [2.0, 0.5]}"#).unwrap();
        let list = spectrum.into_event_list(0).unwrap();
        assert_eq!(list.event_type().to_string(), "WEIGHTED_NOTIME");
        assert!((list.total_weight() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let spectrum: SpectrumEvents =
            serde_json::from_str(r#"{"tof": [1.0, 2.0], "pulse_time": [1]}"#).unwrap();
        assert!(matches!(
            spectrum.into_event_list(3),
            Err(CliError::Input(_))
        ));
    }

    #[test]
    fn test_axis_rejects_unbounded_params() {
        for params in ["0,1e-12,1", "1e17,1,100000000000001000"] {
            assert!(Cli::try_parse_from(["tofbin", "axis", "-p", params]).is_err());
        }
        assert!(Cli::try_parse_from(["tofbin", "axis", "-p", "0,1,10"]).is_ok());
    }

    #[test]
    fn test_default_binning_covers_every_event() {
        let lists = vec![
            EventList::from_tof_events(vec![TofEvent::new(10.5, PulseTime::new(0))]),
            EventList::from_tof_events(vec![TofEvent::new(99.0, PulseTime::new(0))]),
        ];
        let x = default_binning(&lists);
        assert_eq!(x.values(), &[10.0, 100.0]);
    }
}

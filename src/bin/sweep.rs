use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use clap::error::ErrorKind;

use ecppll_sweep::{Analyzer, PllField, PllSettings, SaSettings, Sweep, Toolchain, SCPI_PORT};
use ecppll_sweep::output;

/// Sweep one ECP5 PLL parameter and capture the output spectrum at every step
#[derive(Parser)]
#[command(name = "pll-sweep", version)]
struct Cli {
    /// Host name or address of the spectrum analyzer
    #[arg(long)]
    analyzer: String,

    /// SCPI socket port of the spectrum analyzer
    #[arg(long, default_value_t = SCPI_PORT)]
    port: u16,

    /// PLL parameter to sweep
    #[arg(long, default_value = "icp_current")]
    field: PllField,

    /// First value of the swept parameter
    #[arg(long, allow_negative_numbers = true)]
    from: i32,

    /// Last value of the swept parameter (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    to: i32,

    #[arg(long, default_value_t = 1)]
    step: usize,

    /// Delay between loading the bitstream and measuring, in milliseconds
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Analyzer span around the nominal PLL output frequency, in Hz
    #[arg(long, default_value_t = 1e6)]
    span: f64,

    /// Analyzer input attenuation, in dB
    #[arg(long, default_value_t = 20.0)]
    attenuation: f64,

    /// Resolution bandwidth, in Hz
    #[arg(long, default_value_t = 1e3)]
    rbw: f64,

    /// Video bandwidth, in Hz
    #[arg(long, default_value_t = 3e3)]
    vbw: f64,

    /// Directory for gateware build products
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,

    /// CSV file receiving every captured trace
    #[arg(long, default_value = "sweep.csv")]
    output: PathBuf,

    /// CSV file receiving the peak of every captured trace
    #[arg(long)]
    peaks: Option<PathBuf>,
}

fn main() -> ecppll_sweep::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let base = PllSettings::default();
    let mut sweep = match Sweep::stepped(base, cli.field, cli.from, cli.to, cli.step) {
        Ok(sweep) => sweep,
        Err(error) => Cli::command().error(ErrorKind::ArgumentConflict, error).exit(),
    };
    sweep.settle = Duration::from_millis(cli.settle_ms);
    if matches!(cli.field, PllField::ClkiDiv | PllField::ClkfbDiv) {
        log::warn!("sweeping {} moves the output away from {} MHz; widen --span to keep it in view",
                   cli.field, base.freq_out() / 1e6);
    }

    let sa_settings = SaSettings {
        attenuation: cli.attenuation,
        rbw: cli.rbw,
        vbw: cli.vbw,
        ..SaSettings::around(base.freq_out(), cli.span)
    };
    let mut analyzer = Analyzer::connect((cli.analyzer.as_str(), cli.port), sa_settings)?;
    log::info!("connected to {}", analyzer.identify()?);
    analyzer.configure()?;

    let mut toolchain = Toolchain::new(cli.build_dir);
    let outcome = sweep.run(&mut toolchain, &mut analyzer);

    let mut writer = BufWriter::new(File::create(&cli.output)?);
    output::write_sweep_csv(outcome.field, &outcome.points, &mut writer)?;
    println!("saved {} traces to {}", outcome.points.len(), cli.output.display());
    if let Some(peaks) = cli.peaks {
        let mut writer = BufWriter::new(File::create(&peaks)?);
        output::write_peaks_csv(outcome.field, &outcome.points, &mut writer)?;
        println!("saved peaks to {}", peaks.display());
    }

    outcome.into_result().map(|_| ())
}

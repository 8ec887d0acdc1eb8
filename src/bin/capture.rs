use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;

use ecppll_sweep::{Analyzer, PllSettings, SaSettings, SCPI_PORT};
use ecppll_sweep::output;

/// Capture a single spectrum trace around the default PLL output frequency
#[derive(Parser)]
#[command(name = "sa-capture", version)]
struct Cli {
    /// Host name or address of the spectrum analyzer
    analyzer: String,

    #[arg(long, default_value_t = SCPI_PORT)]
    port: u16,

    /// Center frequency in Hz; defaults to the output frequency of the default PLL settings
    #[arg(long)]
    center: Option<f64>,

    #[arg(long, default_value_t = 1e6)]
    span: f64,

    #[arg(long, default_value = "trace.csv")]
    output: PathBuf,
}

fn main() -> ecppll_sweep::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let center = cli.center.unwrap_or_else(|| PllSettings::default().freq_out());
    let settings = SaSettings::around(center, cli.span);
    let mut analyzer = Analyzer::connect((cli.analyzer.as_str(), cli.port), settings)?;
    println!("instrument: {}", analyzer.identify()?);
    analyzer.configure()?;
    let trace = analyzer.measure()?;

    if let Some((frequency, power)) = trace.peak() {
        println!("peak: {:.3} dBm at {:.6} MHz", power, frequency / 1e6);
    }
    let mut writer = BufWriter::new(File::create(&cli.output)?);
    output::write_trace_csv(&trace, &mut writer)?;
    println!("saved {} points to {}", trace.len(), cli.output.display());
    Ok(())
}

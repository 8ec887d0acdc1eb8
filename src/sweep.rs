//! Runs the characterization loop: reprogram the PLL, let it settle, capture a trace.

use std::thread::sleep;
use std::time::Duration;

use crate::{Error, Result};
use crate::analyzer::Analyzer;
use crate::config::Trace;
use crate::flash::Flasher;
use crate::params::{PllField, PllSettings};
use crate::sys::Socket;

/// Time the PLL output is given to stabilize after the FPGA is reconfigured.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Something that can capture one spectrum trace.
pub trait Instrument {
    fn measure(&mut self) -> Result<Trace>;
}

impl<S: Socket> Instrument for Analyzer<S> {
    fn measure(&mut self) -> Result<Trace> {
        Analyzer::measure(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    /// Value of the swept field.
    pub label: i32,
    pub settings: PllSettings,
    pub trace: Trace,
}

/// Points captured by a sweep, in the order they were captured.
///
/// If the sweep stopped early, `error` holds the reason and `points` everything captured before.
#[derive(Debug)]
pub struct SweepOutcome {
    pub field: PllField,
    pub points: Vec<SweepPoint>,
    pub error: Option<Error>,
}

impl SweepOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn labels(&self) -> Vec<i32> {
        self.points.iter().map(|point| point.label).collect()
    }

    pub fn into_result(self) -> Result<Vec<SweepPoint>> {
        match self.error {
            None => Ok(self.points),
            Some(error) => Err(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sweep {
    pub base: PllSettings,
    pub field: PllField,
    pub values: Vec<i32>,
    pub settle: Duration,
}

impl Sweep {
    pub fn new<I: IntoIterator<Item = i32>>(base: PllSettings, field: PllField, values: I) -> Sweep {
        Sweep { base, field, values: values.into_iter().collect(), settle: SETTLE_DELAY }
    }

    /// Sweep from `from` to `to` inclusive, in increments of `step`.
    pub fn stepped(base: PllSettings, field: PllField, from: i32, to: i32, step: usize) -> Result<Sweep> {
        if from > to {
            return Err(Error::Configuration(format!("{} sweep starts at {} past its end {}", field, from, to)))
        }
        if step == 0 {
            return Err(Error::Configuration(format!("{} sweep step must be positive", field)))
        }
        Ok(Sweep::new(base, field, (from..=to).step_by(step)))
    }

    /// Settings for every step of the sweep, paired with the swept value.
    pub fn candidates(&self) -> impl Iterator<Item = (i32, PllSettings)> + '_ {
        self.values.iter().map(|&value| (value, self.base.with(self.field, value)))
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run<F, I>(&self, flasher: &mut F, instrument: &mut I) -> SweepOutcome
            where F: Flasher + ?Sized, I: Instrument + ?Sized {
        let mut outcome = SweepOutcome { field: self.field, points: Vec::new(), error: None };
        for (index, (label, settings)) in self.candidates().enumerate() {
            log::info!("step {}/{}: {} = {}", index + 1, self.values.len(), self.field, label);
            match self.step(flasher, instrument, &settings) {
                Ok(trace) => {
                    if let Some((freq, power)) = trace.peak() {
                        log::info!("peak {:.3} dBm at {:.6} MHz", power, freq / 1e6);
                    }
                    outcome.points.push(SweepPoint { label, settings, trace })
                }
                Err(error) => {
                    log::error!("sweep stopped at {} = {}: {}", self.field, label, error);
                    outcome.error = Some(error);
                    break
                }
            }
        }
        outcome
    }

    fn step<F, I>(&self, flasher: &mut F, instrument: &mut I, settings: &PllSettings) -> Result<Trace>
            where F: Flasher + ?Sized, I: Instrument + ?Sized {
        settings.validate()?;
        flasher.flash(settings)?;
        sleep(self.settle);
        instrument.measure()
    }
}

//! Spectrum analyzer configuration in terms of physical qualities, and the traces it produces.

/// Resolution and video bandwidths the analyzer supports, in Hz.
pub const BANDWIDTHS: [f64; 11] = [
    10.0, 30.0, 100.0, 300.0, 1e3, 3e3, 10e3, 30e3, 100e3, 300e3, 1e6,
];

/// Number of frequency bins in one sweep.
pub const TRACE_POINTS: usize = 751;

const MAX_FREQUENCY: f64 = 3.2e9;
const MAX_ATTENUATION: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaSettings {
    /// Center frequency in Hz.
    pub freq_center: f64,
    /// Span in Hz.
    pub freq_span: f64,
    /// Input attenuation in dB.
    pub attenuation: f64,
    /// Resolution bandwidth in Hz.
    pub rbw: f64,
    /// Video bandwidth in Hz.
    pub vbw: f64,
}

impl SaSettings {
    /// Settings for looking at a carrier at `freq` with default attenuation and bandwidths.
    pub fn around(freq: f64, span: f64) -> SaSettings {
        SaSettings {
            freq_center: freq,
            freq_span: span,
            attenuation: 20.0,
            rbw: 1e3,
            vbw: 3e3,
        }
    }

    pub fn valid(&self) -> bool {
        let in_band = |freq: f64| (0.0..=MAX_FREQUENCY).contains(&freq);
        in_band(self.freq_center) &&
            in_band(self.freq_span) &&
            (0.0..=MAX_ATTENUATION).contains(&self.attenuation) &&
            BANDWIDTHS.contains(&self.rbw) &&
            BANDWIDTHS.contains(&self.vbw)
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.valid() {
            Ok(())
        } else {
            Err(crate::Error::Configuration(format!("analyzer settings {:?} out of range", self)))
        }
    }

    pub fn freq_start(&self) -> f64 {
        self.freq_center - self.freq_span / 2.0
    }

    pub fn freq_stop(&self) -> f64 {
        self.freq_center + self.freq_span / 2.0
    }

    /// Center frequency of each bin of a sweep.
    pub fn frequencies(&self) -> Vec<f64> {
        frequency_axis(self.freq_center, self.freq_span)
    }
}

fn frequency_axis(center: f64, span: f64) -> Vec<f64> {
    let start = center - span / 2.0;
    let step = span / (TRACE_POINTS - 1) as f64;
    (0..TRACE_POINTS).map(|index| start + step * index as f64).collect()
}

/// Power of each frequency bin of one sweep, in dBm.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub freq_center: f64,
    pub freq_span: f64,
    pub samples: Vec<f64>,
}

impl Trace {
    pub fn new(settings: &SaSettings, samples: Vec<f64>) -> Trace {
        Trace { freq_center: settings.freq_center, freq_span: settings.freq_span, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        frequency_axis(self.freq_center, self.freq_span)
    }

    /// Pairs of `(frequency, power)`. Samples past the last bin are ignored.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies().into_iter().zip(self.samples.iter().copied())
    }

    /// The bin with the highest power.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.points().fold(None, |peak, (freq, power)| match peak {
            Some((_, peak_power)) if peak_power >= power => peak,
            _ => Some((freq, power)),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(SaSettings::around(200e6, 1e6).valid());
    }

    #[test]
    fn test_frequency_range() {
        let settings = SaSettings::around(200e6, 1e6);
        assert!(!SaSettings { freq_center: -1.0, ..settings }.valid());
        assert!(!SaSettings { freq_center: 3.3e9, ..settings }.valid());
        assert!(SaSettings { freq_center: 3.2e9, ..settings }.valid());
        assert!(SaSettings { freq_span: 0.0, ..settings }.valid());
        assert!(!SaSettings { freq_span: 3.2e9 + 1.0, ..settings }.valid());
    }

    #[test]
    fn test_attenuation_range() {
        let settings = SaSettings::around(200e6, 1e6);
        assert!(SaSettings { attenuation: 0.0, ..settings }.valid());
        assert!(SaSettings { attenuation: 50.0, ..settings }.valid());
        assert!(!SaSettings { attenuation: 51.0, ..settings }.valid());
        assert!(!SaSettings { attenuation: -1.0, ..settings }.valid());
    }

    #[test]
    fn test_bandwidths_exact() {
        let settings = SaSettings::around(200e6, 1e6);
        for bandwidth in BANDWIDTHS {
            assert!(SaSettings { rbw: bandwidth, vbw: bandwidth, ..settings }.valid());
        }
        for bandwidth in [0.0, 1001.0, 999.0, 20.0, 3e6, 1e6 + 1.0] {
            assert!(!SaSettings { rbw: bandwidth, ..settings }.valid(), "rbw {}", bandwidth);
            assert!(!SaSettings { vbw: bandwidth, ..settings }.valid(), "vbw {}", bandwidth);
        }
    }

    #[test]
    fn test_frequency_axis() {
        let settings = SaSettings::around(200e6, 750e3);
        let axis = settings.frequencies();
        assert_eq!(axis.len(), TRACE_POINTS);
        assert_eq!(axis[0], 199.625e6);
        assert_eq!(axis[375], 200e6);
        assert_eq!(axis[750], 200.375e6);
    }

    #[test]
    fn test_trace_peak() {
        let settings = SaSettings::around(200e6, 750e3);
        let mut samples = vec![-90.0; TRACE_POINTS];
        samples[375] = -10.0;
        let trace = Trace::new(&settings, samples);
        assert_eq!(trace.peak(), Some((200e6, -10.0)));
        assert_eq!(Trace::new(&settings, vec![]).peak(), None);
    }
}

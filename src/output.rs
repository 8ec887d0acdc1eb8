//! Sweep results output formatting (CSV).

use std::io::Write;

use crate::Result;
use crate::config::Trace;
use crate::params::PllField;
use crate::sweep::SweepPoint;

/// Write a single trace as CSV.
///
/// Format:
/// ```csv
/// frequency,power
/// 199625000,-88.5
/// ```
pub fn write_trace_csv<W: Write>(trace: &Trace, writer: &mut W) -> Result<()> {
    writeln!(writer, "frequency,power")?;
    for (frequency, power) in trace.points() {
        writeln!(writer, "{},{}", frequency, power)?;
    }
    Ok(())
}

/// Write the traces of a sweep as CSV, one row per frequency bin of each trace.
///
/// Format:
/// ```csv
/// icp_current,frequency,power
/// 0,199625000,-88.5
/// 0,199626000,-88.25
/// ...
/// 1,199625000,-87.75
/// ```
pub fn write_sweep_csv<W: Write>(field: PllField, points: &[SweepPoint], writer: &mut W) -> Result<()> {
    writeln!(writer, "{},frequency,power", field)?;
    for point in points {
        for (frequency, power) in point.trace.points() {
            writeln!(writer, "{},{},{}", point.label, frequency, power)?;
        }
    }
    Ok(())
}

/// Write one line per sweep point with the frequency and power of its strongest bin.
///
/// Format:
/// ```csv
/// icp_current,freq_out,peak_frequency,peak_power
/// 0,200000000,200000000,-10.5
/// ```
pub fn write_peaks_csv<W: Write>(field: PllField, points: &[SweepPoint], writer: &mut W) -> Result<()> {
    writeln!(writer, "{},freq_out,peak_frequency,peak_power", field)?;
    for point in points {
        write!(writer, "{},{}", point.label, point.settings.freq_out())?;
        match point.trace.peak() {
            Some((frequency, power)) => writeln!(writer, ",{},{}", frequency, power)?,
            None => writeln!(writer, ",,")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SaSettings;
    use crate::params::PllSettings;

    fn point(label: i32, samples: Vec<f64>) -> SweepPoint {
        let settings = PllSettings::default().with(PllField::IcpCurrent, label);
        SweepPoint {
            label,
            settings,
            trace: Trace::new(&SaSettings::around(settings.freq_out(), 750e3), samples),
        }
    }

    #[test]
    fn test_trace_csv() {
        let mut csv = Vec::new();
        write_trace_csv(&point(0, vec![-1.5, -2.0]).trace, &mut csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "frequency,power\n199625000,-1.5\n199626000,-2\n");
    }

    #[test]
    fn test_sweep_csv() {
        let points = [point(3, vec![-50.0, -40.5]), point(4, vec![-30.25])];
        let mut csv = Vec::new();
        write_sweep_csv(PllField::IcpCurrent, &points, &mut csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "\
icp_current,frequency,power
3,199625000,-50
3,199626000,-40.5
4,199625000,-30.25
");
    }

    #[test]
    fn test_peaks_csv() {
        let points = [point(3, vec![-50.0, -40.5]), point(4, vec![])];
        let mut csv = Vec::new();
        write_peaks_csv(PllField::IcpCurrent, &points, &mut csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "\
icp_current,freq_out,peak_frequency,peak_power
3,200000000,199626000,-40.5
4,200000000,,
");
    }
}

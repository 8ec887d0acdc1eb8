//! Low-level parameters of the ECP5 `EHXPLLL` primitive.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Frequency of the reference clock feeding `CLKI`, in Hz.
pub const CLKI_FREQUENCY: f64 = 20e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PllField {
    ClkiDiv,
    ClkopDiv,
    ClkfbDiv,
    ClkopCphase,
    ClkopFphase,
    Kvco,
    LpfCapacitor,
    LpfResistor,
    IcpCurrent,
    MfgGmcGain,
    MfgGmcrefSel,
    MfgEnFilteropamp,
    IntfbWake,
}

impl PllField {
    pub const ALL: [PllField; 13] = [
        Self::ClkiDiv,
        Self::ClkopDiv,
        Self::ClkfbDiv,
        Self::ClkopCphase,
        Self::ClkopFphase,
        Self::Kvco,
        Self::LpfCapacitor,
        Self::LpfResistor,
        Self::IcpCurrent,
        Self::MfgGmcGain,
        Self::MfgGmcrefSel,
        Self::MfgEnFilteropamp,
        Self::IntfbWake,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ClkiDiv          => "clki_div",
            Self::ClkopDiv         => "clkop_div",
            Self::ClkfbDiv         => "clkfb_div",
            Self::ClkopCphase      => "clkop_cphase",
            Self::ClkopFphase      => "clkop_fphase",
            Self::Kvco             => "kvco",
            Self::LpfCapacitor     => "lpf_capacitor",
            Self::LpfResistor      => "lpf_resistor",
            Self::IcpCurrent       => "icp_current",
            Self::MfgGmcGain       => "mfg_gmc_gain",
            Self::MfgGmcrefSel     => "mfg_gmcref_sel",
            Self::MfgEnFilteropamp => "mfg_en_filteropamp",
            Self::IntfbWake        => "intfb_wake",
        }
    }

    /// Closed range of values the primitive accepts for this field.
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            Self::ClkiDiv          => 1..=128,
            Self::ClkopDiv         => 1..=128,
            Self::ClkfbDiv         => 1..=80,
            Self::ClkopCphase      => 0..=127,
            Self::ClkopFphase      => 0..=7,
            Self::Kvco             => 0..=7,
            Self::LpfCapacitor     => 0..=3,
            Self::LpfResistor      => 0..=127,
            Self::IcpCurrent       => 0..=31,
            Self::MfgGmcGain       => 0..=7,
            Self::MfgGmcrefSel     => 0..=3,
            Self::MfgEnFilteropamp => 0..=1,
            Self::IntfbWake        => 0..=1,
        }
    }
}

impl fmt::Display for PllField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PllField {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter()
            .copied()
            .find(|field| field.name() == name)
            .ok_or_else(|| format!("unknown PLL parameter `{}`", name))
    }
}

/// A complete `EHXPLLL` configuration.
///
/// Values are plain integers so that out-of-range candidates can be represented and rejected
/// by `valid()` instead of at construction. Derive variations of a base configuration with
/// `with()`; the base is never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PllSettings {
    pub clki_div: i32,
    pub clkop_div: i32,
    pub clkfb_div: i32,
    pub clkop_cphase: i32,
    pub clkop_fphase: i32,
    pub kvco: i32,
    pub lpf_capacitor: i32,
    pub lpf_resistor: i32,
    pub icp_current: i32,
    pub mfg_gmc_gain: i32,
    pub mfg_gmcref_sel: i32,
    pub mfg_en_filteropamp: i32,
    pub intfb_wake: i32,
}

impl Default for PllSettings {
    fn default() -> Self {
        PllSettings {
            clki_div: 1,
            clkop_div: 3,
            clkfb_div: 10,
            clkop_cphase: 7,
            clkop_fphase: 0,
            kvco: 0,
            lpf_capacitor: 0,
            lpf_resistor: 8,
            icp_current: 12,
            mfg_gmc_gain: 0,
            mfg_gmcref_sel: 2,
            mfg_en_filteropamp: 1,
            intfb_wake: 0,
        }
    }
}

impl PllSettings {
    pub fn get(&self, field: PllField) -> i32 {
        match field {
            PllField::ClkiDiv          => self.clki_div,
            PllField::ClkopDiv         => self.clkop_div,
            PllField::ClkfbDiv         => self.clkfb_div,
            PllField::ClkopCphase      => self.clkop_cphase,
            PllField::ClkopFphase      => self.clkop_fphase,
            PllField::Kvco             => self.kvco,
            PllField::LpfCapacitor     => self.lpf_capacitor,
            PllField::LpfResistor      => self.lpf_resistor,
            PllField::IcpCurrent       => self.icp_current,
            PllField::MfgGmcGain       => self.mfg_gmc_gain,
            PllField::MfgGmcrefSel     => self.mfg_gmcref_sel,
            PllField::MfgEnFilteropamp => self.mfg_en_filteropamp,
            PllField::IntfbWake        => self.intfb_wake,
        }
    }

    /// Returns a copy of `self` with `field` replaced by `value`.
    pub fn with(&self, field: PllField, value: i32) -> PllSettings {
        let mut settings = *self;
        *match field {
            PllField::ClkiDiv          => &mut settings.clki_div,
            PllField::ClkopDiv         => &mut settings.clkop_div,
            PllField::ClkfbDiv         => &mut settings.clkfb_div,
            PllField::ClkopCphase      => &mut settings.clkop_cphase,
            PllField::ClkopFphase      => &mut settings.clkop_fphase,
            PllField::Kvco             => &mut settings.kvco,
            PllField::LpfCapacitor     => &mut settings.lpf_capacitor,
            PllField::LpfResistor      => &mut settings.lpf_resistor,
            PllField::IcpCurrent       => &mut settings.icp_current,
            PllField::MfgGmcGain       => &mut settings.mfg_gmc_gain,
            PllField::MfgGmcrefSel     => &mut settings.mfg_gmcref_sel,
            PllField::MfgEnFilteropamp => &mut settings.mfg_en_filteropamp,
            PllField::IntfbWake        => &mut settings.intfb_wake,
        } = value;
        settings
    }

    /// The first field whose value is outside of its range, if any.
    pub fn invalid_field(&self) -> Option<PllField> {
        PllField::ALL.iter()
            .copied()
            .find(|&field| !field.range().contains(&self.get(field)))
    }

    pub fn valid(&self) -> bool {
        self.invalid_field().is_none()
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        match self.invalid_field() {
            None => Ok(()),
            Some(field) => Err(crate::Error::Configuration(format!(
                "PLL parameter {} = {} is outside of {:?}",
                field, self.get(field), field.range()))),
        }
    }

    /// Output frequency at `CLKOP` in Hz, with `CLKOP` used as the feedback path.
    pub fn freq_out(&self) -> f64 {
        (CLKI_FREQUENCY / self.clki_div as f64) * self.clkfb_div as f64
    }

    pub fn freq_vco(&self) -> f64 {
        self.freq_out() * self.clkop_div as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        let settings = PllSettings::default();
        assert!(settings.valid());
        assert_eq!(settings.freq_out(), 200e6);
        assert_eq!(settings.freq_vco(), 600e6);
    }

    #[test]
    fn test_field_boundaries() {
        let base = PllSettings::default();
        for field in PllField::ALL {
            let range = field.range();
            for value in range.clone() {
                assert!(base.with(field, value).valid(), "{} = {}", field, value);
            }
            let below = base.with(field, range.start() - 1);
            let above = base.with(field, range.end() + 1);
            assert!(!below.valid(), "{} = {}", field, range.start() - 1);
            assert!(!above.valid(), "{} = {}", field, range.end() + 1);
            assert_eq!(below.invalid_field(), Some(field));
        }
    }

    #[test]
    fn test_with_leaves_base_alone() {
        let base = PllSettings::default();
        let derived = base.with(PllField::IcpCurrent, 3);
        assert_eq!(base.icp_current, 12);
        assert_eq!(derived.icp_current, 3);
        assert_eq!(derived.get(PllField::IcpCurrent), 3);
        for field in PllField::ALL.into_iter().filter(|&f| f != PllField::IcpCurrent) {
            assert_eq!(derived.get(field), base.get(field));
        }
        // icp_current does not feed any derived frequency
        assert_eq!(derived.freq_out(), base.freq_out());
        assert_eq!(derived.freq_vco(), base.freq_vco());
    }

    #[test]
    fn test_derived_frequencies_pure() {
        let settings = PllSettings::default()
            .with(PllField::ClkiDiv, 2)
            .with(PllField::ClkfbDiv, 25)
            .with(PllField::ClkopDiv, 4);
        assert_eq!(settings.freq_out(), settings.freq_out());
        assert_eq!(settings.freq_out(), 250e6);
        assert_eq!(settings.freq_vco(), 1000e6);

        let other = settings.with(PllField::ClkopDiv, 2);
        assert_eq!(other.freq_out(), settings.freq_out());
        assert_eq!(other.freq_vco(), 500e6);
    }

    #[test]
    fn test_validate_reports_field() {
        let settings = PllSettings::default().with(PllField::Kvco, 8);
        match settings.validate() {
            Err(crate::Error::Configuration(reason)) => assert!(reason.contains("kvco")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_field_names() {
        for field in PllField::ALL {
            assert_eq!(field.name().parse::<PllField>(), Ok(field));
        }
        assert!("icp".parse::<PllField>().is_err());
    }
}

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::{Error, Result};
use crate::gateware;
use crate::params::PllSettings;

/// Something that can reconfigure the hardware so that its PLL runs with the given settings.
///
/// `flash` blocks until the new configuration is running, or fails as a whole.
pub trait Flasher {
    fn flash(&mut self, settings: &PllSettings) -> Result<()>;
}

const DESIGN_NAME: &str = "ecppll";

/// Builds the design with yosys and nextpnr, packs it with ecppack, and loads it into the FPGA
/// with ecpdap.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub build_dir: PathBuf,
    pub yosys: String,
    pub nextpnr: String,
    pub ecppack: String,
    pub programmer: String,
}

impl Toolchain {
    pub fn new<P: Into<PathBuf>>(build_dir: P) -> Toolchain {
        Toolchain {
            build_dir: build_dir.into(),
            yosys: "yosys".to_owned(),
            nextpnr: "nextpnr-ecp5".to_owned(),
            ecppack: "ecppack".to_owned(),
            programmer: "ecpdap".to_owned(),
        }
    }

    fn artifact(&self, extension: &str) -> PathBuf {
        self.build_dir.join(DESIGN_NAME).with_extension(extension)
    }

    /// Path of the bitstream loaded by the last successful `flash`.
    pub fn bitstream(&self) -> PathBuf {
        self.artifact("bit")
    }

    fn write_sources(&self, settings: &PllSettings) -> Result<()> {
        fs::create_dir_all(&self.build_dir)?;
        fs::write(self.artifact("v"), gateware::top_verilog(settings))?;
        fs::write(self.artifact("lpf"), gateware::constraints())?;
        Ok(())
    }

    fn synthesize(&self) -> Result<()> {
        let script = format!("synth_ecp5 -top {} -json {}",
            gateware::TOP_MODULE, self.artifact("json").display());
        run("synthesis", Command::new(&self.yosys)
            .arg("-q")
            .arg("-p").arg(script)
            .arg(self.artifact("v")))
    }

    fn place_and_route(&self) -> Result<()> {
        run("place and route", Command::new(&self.nextpnr)
            .arg("--quiet")
            .arg(gateware::NEXTPNR_DEVICE)
            .arg("--package").arg(gateware::NEXTPNR_PACKAGE)
            .arg("--speed").arg(gateware::NEXTPNR_SPEED)
            .arg("--json").arg(self.artifact("json"))
            .arg("--lpf").arg(self.artifact("lpf"))
            .arg("--textcfg").arg(self.artifact("config")))
    }

    fn pack(&self) -> Result<()> {
        run("bitstream packing", Command::new(&self.ecppack)
            .arg("--compress")
            .arg(self.artifact("config"))
            .arg(self.bitstream()))
    }

    fn program(&self) -> Result<()> {
        run("programming", Command::new(&self.programmer)
            .arg("program")
            .arg(self.bitstream()))
    }
}

impl Flasher for Toolchain {
    fn flash(&mut self, settings: &PllSettings) -> Result<()> {
        settings.validate()?;
        log::info!("building {} for {:?}", self.build_dir.display(), settings);
        self.write_sources(settings)?;
        self.synthesize()?;
        self.place_and_route()?;
        self.pack()?;
        self.program()?;
        log::info!("loaded {}", self.bitstream().display());
        Ok(())
    }
}

fn run(step: &'static str, command: &mut Command) -> Result<()> {
    log::debug!("{}: {:?}", step, command);
    let output = command.output()
        .map_err(|error| Error::ExternalStep { step, detail: format!("cannot start: {}", error) })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().filter(|line| !line.trim().is_empty()).last();
        return Err(Error::ExternalStep {
            step,
            detail: match last_line {
                Some(line) => format!("{} ({})", output.status, line.trim()),
                None => output.status.to_string(),
            }
        })
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::PllField;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("ecppll-sweep-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn toolchain(build_dir: PathBuf, tool: &str) -> Toolchain {
        Toolchain {
            yosys: tool.to_owned(),
            nextpnr: tool.to_owned(),
            ecppack: tool.to_owned(),
            programmer: tool.to_owned(),
            ..Toolchain::new(build_dir)
        }
    }

    #[test]
    fn test_invalid_settings_rejected_before_build() {
        let dir = scratch_dir("invalid");
        let mut toolchain = toolchain(dir.clone(), "true");
        let settings = PllSettings::default().with(PllField::IcpCurrent, 32);
        assert!(matches!(toolchain.flash(&settings), Err(Error::Configuration(_))));
        assert!(!dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_flash_writes_sources() {
        let dir = scratch_dir("success");
        let mut toolchain = toolchain(dir.clone(), "true");
        toolchain.flash(&PllSettings::default().with(PllField::IcpCurrent, 4)).unwrap();
        let verilog = fs::read_to_string(dir.join("ecppll.v")).unwrap();
        assert!(verilog.contains("ICP_CURRENT=\"4\""));
        assert!(dir.join("ecppll.lpf").exists());
        assert_eq!(toolchain.bitstream(), dir.join("ecppll.bit"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_step() {
        let dir = scratch_dir("failure");
        let mut toolchain = toolchain(dir.clone(), "true");
        toolchain.nextpnr = "false".to_owned();
        match toolchain.flash(&PllSettings::default()) {
            Err(Error::ExternalStep { step, .. }) => assert_eq!(step, "place and route"),
            other => panic!("unexpected {:?}", other),
        }
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_tool() {
        let dir = scratch_dir("missing");
        let mut toolchain = toolchain(dir.clone(), "ecppll-sweep-no-such-tool");
        match toolchain.flash(&PllSettings::default()) {
            Err(Error::ExternalStep { step, detail }) => {
                assert_eq!(step, "synthesis");
                assert!(detail.starts_with("cannot start"));
            }
            other => panic!("unexpected {:?}", other),
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}

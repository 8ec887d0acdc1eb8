//! Generates the design loaded onto the ECP5: the reference clock goes through one `EHXPLLL`
//! and the PLL output is routed straight to a pin for the spectrum analyzer.

use crate::params::{PllSettings, CLKI_FREQUENCY};

pub(crate) const TOP_MODULE: &str = "top";

// LFE5UM-85F in BG381, speed grade 7
pub(crate) const NEXTPNR_DEVICE: &str = "--um-85k";
pub(crate) const NEXTPNR_PACKAGE: &str = "CABGA381";
pub(crate) const NEXTPNR_SPEED: &str = "7";

const CLKI_PIN: &str = "P3";
const AUX_PIN: &str = "A12";

fn enabled(value: i32) -> &'static str {
    if value != 0 { "ENABLED" } else { "DISABLED" }
}

pub(crate) fn top_verilog(settings: &PllSettings) -> String {
    format!("\
module {top}(input clk20, output aux);
    wire clkop;

    (* FREQUENCY_PIN_CLKI=\"{clki_mhz}\", FREQUENCY_PIN_CLKOP=\"{clkop_mhz}\",
       KVCO=\"{kvco}\", LPF_CAPACITOR=\"{lpf_capacitor}\", LPF_RESISTOR=\"{lpf_resistor}\",
       ICP_CURRENT=\"{icp_current}\", MFG_GMC_GAIN=\"{mfg_gmc_gain}\",
       MFG_GMCREF_SEL=\"{mfg_gmcref_sel}\", MFG_ENABLE_FILTEROPAMP=\"{mfg_en_filteropamp}\" *)
    EHXPLLL #(
        .CLKI_DIV({clki_div}),
        .CLKFB_DIV({clkfb_div}),
        .CLKOP_DIV({clkop_div}),
        .CLKOP_ENABLE(\"ENABLED\"),
        .CLKOP_CPHASE({clkop_cphase}),
        .CLKOP_FPHASE({clkop_fphase}),
        .FEEDBK_PATH(\"CLKOP\"),
        .INTFB_WAKE(\"{intfb_wake}\")
    ) pll (
        .CLKI(clk20),
        .CLKFB(clkop),
        .CLKOP(clkop),
        .RST(1'b0),
        .STDBY(1'b0),
        .PHASESEL0(1'b0),
        .PHASESEL1(1'b0),
        .PHASEDIR(1'b0),
        .PHASESTEP(1'b0),
        .PHASELOADREG(1'b0),
        .PLLWAKESYNC(1'b0),
        .ENCLKOP(1'b0)
    );

    assign aux = clkop;
endmodule
",
        top = TOP_MODULE,
        clki_mhz = (CLKI_FREQUENCY / 1e6).floor(),
        clkop_mhz = (settings.freq_out() / 1e6).floor(),
        kvco = settings.kvco,
        lpf_capacitor = settings.lpf_capacitor,
        lpf_resistor = settings.lpf_resistor,
        icp_current = settings.icp_current,
        mfg_gmc_gain = settings.mfg_gmc_gain,
        mfg_gmcref_sel = settings.mfg_gmcref_sel,
        mfg_en_filteropamp = settings.mfg_en_filteropamp,
        clki_div = settings.clki_div,
        clkfb_div = settings.clkfb_div,
        clkop_div = settings.clkop_div,
        clkop_cphase = settings.clkop_cphase,
        clkop_fphase = settings.clkop_fphase,
        intfb_wake = enabled(settings.intfb_wake),
    )
}

pub(crate) fn constraints() -> String {
    format!("\
LOCATE COMP \"clk20\" SITE \"{clki_pin}\";
IOBUF PORT \"clk20\" IO_TYPE=LVCMOS33;
FREQUENCY PORT \"clk20\" {clki_mhz} MHZ;
LOCATE COMP \"aux\" SITE \"{aux_pin}\";
IOBUF PORT \"aux\" IO_TYPE=LVCMOS33 DRIVE=4;
",
        clki_pin = CLKI_PIN,
        clki_mhz = CLKI_FREQUENCY / 1e6,
        aux_pin = AUX_PIN,
    )
}

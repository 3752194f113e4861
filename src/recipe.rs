use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a recipe value on the command line does not name a
/// known choice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {choices})")]
pub struct UnknownChoice {
    kind: &'static str,
    value: String,
    choices: String,
}

impl UnknownChoice {
    fn new(kind: &'static str, value: &str, names: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            choices: names.join(", "),
        }
    }
}

/// Implements the shared plumbing for the enumerated recipe options:
/// wire names, parsing, display and selection-index lookup where index 0
/// is the "not set" entry of the option list.
macro_rules! choice_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name passed to the converter.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Map a selection index from an option list whose first entry
            /// means "leave unset". Unknown indexes are treated as unset.
            pub fn from_index(index: usize) -> Option<Self> {
                index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
            }

            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| UnknownChoice::new($kind, s, &Self::names()))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilmSimulation {
    Provia,
    Velvia,
    Astia,
    ClassicChrome,
    RealaAce,
    ProNegHi,
    ProNegStd,
    ClassicNeg,
    NostalgicNeg,
    Eterna,
    EternaBleachBypass,
    Acros,
    AcrosYe,
    AcrosR,
    AcrosG,
    Monochrome,
    MonochromeYe,
    MonochromeR,
    MonochromeG,
    Sepia,
}

choice_enum!(FilmSimulation, "film simulation", {
    Provia => "provia",
    Velvia => "velvia",
    Astia => "astia",
    ClassicChrome => "classic-chrome",
    RealaAce => "reala-ace",
    ProNegHi => "pro-neg-hi",
    ProNegStd => "pro-neg-std",
    ClassicNeg => "classic-neg",
    NostalgicNeg => "nostalgic-neg",
    Eterna => "eterna",
    EternaBleachBypass => "eterna-bleach-bypass",
    Acros => "acros",
    AcrosYe => "acros-ye",
    AcrosR => "acros-r",
    AcrosG => "acros-g",
    Monochrome => "monochrome",
    MonochromeYe => "monochrome-ye",
    MonochromeR => "monochrome-r",
    MonochromeG => "monochrome-g",
    Sepia => "sepia",
});

/// Effect strength for grain and color chrome. "Off" is expressed as the
/// option being unset, so the converter's own default applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Strong,
}

choice_enum!(Strength, "strength", {
    Weak => "weak",
    Strong => "strong",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicRange {
    #[serde(rename = "100")]
    Dr100,
    #[serde(rename = "200")]
    Dr200,
    #[serde(rename = "400")]
    Dr400,
}

choice_enum!(DynamicRange, "dynamic range", {
    Dr100 => "100",
    Dr200 => "200",
    Dr400 => "400",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteBalance {
    Auto,
    Daylight,
    Shade,
}

choice_enum!(WhiteBalance, "white balance", {
    Auto => "auto",
    Daylight => "daylight",
    Shade => "shade",
});

/// Snapshot of the conversion recipe. Every field maps to at most one
/// converter flag; unset enums and numeric values that come out as zero
/// produce no flag at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeOptions {
    pub film_simulation: Option<FilmSimulation>,
    /// EV, passed with one decimal digit.
    pub exposure: f64,
    pub highlights: f64,
    pub shadows: f64,
    pub sharpness: f64,
    pub color: f64,
    pub noise_reduction: f64,
    pub grain: Option<Strength>,
    pub color_chrome: Option<Strength>,
    pub dynamic_range: Option<DynamicRange>,
    pub white_balance: Option<WhiteBalance>,
}

impl RecipeOptions {
    /// Converter flags in their fixed order.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(sim) = self.film_simulation {
            push_flag(&mut args, "--film-sim", sim.as_str());
        }
        if let Some(ev) = format_exposure(self.exposure) {
            push_flag(&mut args, "--exposure", &ev);
        }

        let integers = [
            ("--highlights", self.highlights),
            ("--shadows", self.shadows),
            ("--sharpness", self.sharpness),
            ("--color", self.color),
            ("--nr", self.noise_reduction),
        ];
        for (flag, value) in integers {
            if let Some(value) = format_integer(value) {
                push_flag(&mut args, flag, &value);
            }
        }

        if let Some(grain) = self.grain {
            push_flag(&mut args, "--grain", grain.as_str());
        }
        if let Some(chrome) = self.color_chrome {
            push_flag(&mut args, "--color-chrome", chrome.as_str());
        }
        if let Some(dr) = self.dynamic_range {
            push_flag(&mut args, "--dynamic-range", dr.as_str());
        }
        if let Some(wb) = self.white_balance {
            push_flag(&mut args, "--white-balance", wb.as_str());
        }

        args
    }

    /// The flags joined with single spaces, as they appear on a command line.
    pub fn argument_string(&self) -> String {
        self.arguments().join(" ")
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

/// Exposure keeps one decimal digit. Values that round to zero are omitted.
fn format_exposure(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let tenths = (value * 10.0).round();
    if tenths == 0.0 {
        return None;
    }
    Some(format!("{:.1}", tenths / 10.0))
}

/// Integer sliders are floored, so -2.7 becomes -3.
fn format_integer(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor() as i64;
    if floored == 0 {
        return None;
    }
    Some(floored.to_string())
}

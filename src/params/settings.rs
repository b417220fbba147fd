//! Settings snapshot types
//!
//! Plain `Copy` values the pipeline reads once per block. Ranges and
//! defaults match the control surface: attack/release 1-500 ms, threshold
//! -60..+12 dB, crossovers 20-20000 Hz, ratio from a fixed choice list.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MbcError, Result};

/// Number of bands produced by the splitter
pub const NUM_BANDS: usize = 3;

/// Attack/release range in milliseconds
pub const TIME_RANGE_MS: (f32, f32) = (1.0, 500.0);

/// Threshold range in dB
pub const THRESHOLD_RANGE_DB: (f32, f32) = (-60.0, 12.0);

/// Crossover frequency range in Hz
pub const CROSSOVER_RANGE_HZ: (f32, f32) = (20.0, 20000.0);

/// Ratios offered by the control surface
pub const RATIO_CHOICES: [f32; 14] = [
    1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 12.0, 16.0, 24.0, 32.0, 64.0, 128.0,
];

/// Index into `RATIO_CHOICES` used when nothing else is configured
pub const DEFAULT_RATIO_CHOICE: usize = 3;

/// Ratio for a choice index; out-of-range indices select the last entry
pub fn ratio_from_choice(index: usize) -> f32 {
    RATIO_CHOICES[index.min(RATIO_CHOICES.len() - 1)]
}

/// One-decimal label for a ratio choice ("1.0", "1.5", ... "128.0")
pub fn ratio_choice_label(index: usize) -> String {
    format!("{:.1}", ratio_from_choice(index))
}

// ============================================================================
// Band
// ============================================================================

/// Frequency band of the three-way split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    /// All bands, lowest first
    pub const ALL: [Band; NUM_BANDS] = [Band::Low, Band::Mid, Band::High];

    /// Position in per-band arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Band::Low => 0,
            Band::Mid => 1,
            Band::High => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Low => "low",
            Band::Mid => "mid",
            Band::High => "high",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Crossover
// ============================================================================

/// Crossover frequencies between the three bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverSpec {
    /// Low/mid boundary in Hz
    pub low_mid_hz: f32,
    /// Mid/high boundary in Hz
    pub mid_high_hz: f32,
}

impl Default for CrossoverSpec {
    fn default() -> Self {
        Self {
            low_mid_hz: 500.0,
            mid_high_hz: 3000.0,
        }
    }
}

impl CrossoverSpec {
    /// Check ranges and the strict ordering `low_mid_hz < mid_high_hz`
    pub fn validate(&self) -> Result<()> {
        let (min, max) = CROSSOVER_RANGE_HZ;
        if !(min..=max).contains(&self.low_mid_hz) {
            return Err(MbcError::invalid_parameter(
                "low_mid_hz",
                self.low_mid_hz,
                "20-20000 Hz",
            ));
        }
        if !(min..=max).contains(&self.mid_high_hz) {
            return Err(MbcError::invalid_parameter(
                "mid_high_hz",
                self.mid_high_hz,
                "20-20000 Hz",
            ));
        }
        if self.low_mid_hz >= self.mid_high_hz {
            return Err(MbcError::invalid_parameter(
                "low_mid_hz",
                self.low_mid_hz,
                "below mid_high_hz",
            ));
        }
        Ok(())
    }

    /// Check that both cutoffs sit below Nyquist for a sample rate
    pub fn validate_for_sample_rate(&self, sample_rate: f64) -> Result<()> {
        self.validate()?;
        let nyquist = (sample_rate / 2.0) as f32;
        if self.mid_high_hz >= nyquist {
            return Err(MbcError::invalid_parameter(
                "mid_high_hz",
                self.mid_high_hz,
                &format!("below Nyquist ({} Hz)", nyquist),
            ));
        }
        Ok(())
    }

    /// Clamp both cutoffs into range; ordering is left to the caller
    pub fn clamped(&self) -> Self {
        let (min, max) = CROSSOVER_RANGE_HZ;
        Self {
            low_mid_hz: clamp_or(self.low_mid_hz, min, max, min),
            mid_high_hz: clamp_or(self.mid_high_hz, min, max, max),
        }
    }
}

// ============================================================================
// Compressor settings
// ============================================================================

/// Dynamics settings of one band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorSettings {
    /// Envelope rise time constant (ms)
    pub attack_ms: f32,
    /// Envelope fall time constant (ms)
    pub release_ms: f32,
    /// Level above which gain reduction begins (dB)
    pub threshold_db: f32,
    /// Input-to-output ratio of the excess above threshold (>= 1)
    pub ratio: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            attack_ms: 50.0,
            release_ms: 250.0,
            threshold_db: 0.0,
            ratio: ratio_from_choice(DEFAULT_RATIO_CHOICE),
        }
    }
}

impl CompressorSettings {
    /// Settings that leave the signal untouched (ratio 1)
    pub fn unity() -> Self {
        Self {
            ratio: 1.0,
            ..Default::default()
        }
    }

    /// Validate parameters against the control ranges
    pub fn validate(&self) -> Result<()> {
        let (t_min, t_max) = TIME_RANGE_MS;
        if !(t_min..=t_max).contains(&self.attack_ms) {
            return Err(MbcError::invalid_parameter(
                "attack_ms",
                self.attack_ms,
                "1 to 500 ms",
            ));
        }
        if !(t_min..=t_max).contains(&self.release_ms) {
            return Err(MbcError::invalid_parameter(
                "release_ms",
                self.release_ms,
                "1 to 500 ms",
            ));
        }
        let (th_min, th_max) = THRESHOLD_RANGE_DB;
        if !(th_min..=th_max).contains(&self.threshold_db) {
            return Err(MbcError::invalid_parameter(
                "threshold_db",
                self.threshold_db,
                "-60 to +12 dB",
            ));
        }
        if !(self.ratio >= 1.0 && self.ratio <= RATIO_CHOICES[RATIO_CHOICES.len() - 1]) {
            return Err(MbcError::invalid_parameter("ratio", self.ratio, "1 to 128"));
        }
        Ok(())
    }

    /// Nearest valid settings
    ///
    /// A ratio below 1 becomes 1 (no gain reduction) rather than an error.
    pub fn clamped(&self) -> Self {
        let (t_min, t_max) = TIME_RANGE_MS;
        let (th_min, th_max) = THRESHOLD_RANGE_DB;
        let r_max = RATIO_CHOICES[RATIO_CHOICES.len() - 1];
        Self {
            attack_ms: clamp_or(self.attack_ms, t_min, t_max, t_min),
            release_ms: clamp_or(self.release_ms, t_min, t_max, t_min),
            threshold_db: clamp_or(self.threshold_db, th_min, th_max, 0.0),
            ratio: clamp_or(self.ratio, 1.0, r_max, 1.0),
        }
    }
}

// ============================================================================
// Band routing
// ============================================================================

/// Routing flags of one band
///
/// The flags are independent; precedence is resolved at mix time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandState {
    pub mute: bool,
    pub solo: bool,
    pub bypass: bool,
}

/// Everything one band needs per block
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandSettings {
    pub compressor: CompressorSettings,
    #[serde(flatten)]
    pub state: BandState,
}

// ============================================================================
// Full snapshot
// ============================================================================

/// Complete control state for one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultibandSettings {
    pub crossover: CrossoverSpec,
    pub low: BandSettings,
    pub mid: BandSettings,
    pub high: BandSettings,
    /// Skip every compressor and sum the raw bands
    pub global_bypass: bool,
}

impl MultibandSettings {
    pub fn band(&self, band: Band) -> &BandSettings {
        match band {
            Band::Low => &self.low,
            Band::Mid => &self.mid,
            Band::High => &self.high,
        }
    }

    pub fn band_mut(&mut self, band: Band) -> &mut BandSettings {
        match band {
            Band::Low => &mut self.low,
            Band::Mid => &mut self.mid,
            Band::High => &mut self.high,
        }
    }

    /// Routing flags of all bands, indexed by `Band::index()`
    pub fn band_states(&self) -> [BandState; NUM_BANDS] {
        [self.low.state, self.mid.state, self.high.state]
    }

    /// Same compressor settings on every band
    pub fn with_compressor(mut self, compressor: CompressorSettings) -> Self {
        for band in Band::ALL {
            self.band_mut(band).compressor = compressor;
        }
        self
    }

    /// Validate crossover and every band's compressor settings
    pub fn validate(&self) -> Result<()> {
        self.crossover.validate()?;
        for band in Band::ALL {
            self.band(band).compressor.validate()?;
        }
        Ok(())
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MbcError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Clamp into `[min, max]`, mapping NaN to `fallback`
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

//! Lock-free parameter store
//!
//! The control thread writes individual values; the audio thread pulls one
//! `MultibandSettings` snapshot per block. Every scalar lives in its own
//! atomic so neither side ever blocks. A snapshot may mix values from before
//! and after a concurrent update of several fields; each individual field is
//! always a value that was actually stored.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use super::settings::{
    ratio_from_choice, Band, BandSettings, BandState, CompressorSettings, CrossoverSpec,
    MultibandSettings, NUM_BANDS,
};

/// An `f32` stored as its bit pattern
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct BandSlot {
    attack_ms: AtomicF32,
    release_ms: AtomicF32,
    threshold_db: AtomicF32,
    ratio: AtomicF32,
    mute: AtomicBool,
    solo: AtomicBool,
    bypass: AtomicBool,
}

impl BandSlot {
    fn new(settings: &BandSettings) -> Self {
        let c = &settings.compressor;
        let s = &settings.state;
        Self {
            attack_ms: AtomicF32::new(c.attack_ms),
            release_ms: AtomicF32::new(c.release_ms),
            threshold_db: AtomicF32::new(c.threshold_db),
            ratio: AtomicF32::new(c.ratio),
            mute: AtomicBool::new(s.mute),
            solo: AtomicBool::new(s.solo),
            bypass: AtomicBool::new(s.bypass),
        }
    }

    fn store(&self, settings: &BandSettings) {
        let c = &settings.compressor;
        let s = &settings.state;
        self.attack_ms.set(c.attack_ms);
        self.release_ms.set(c.release_ms);
        self.threshold_db.set(c.threshold_db);
        self.ratio.set(c.ratio);
        self.mute.store(s.mute, Ordering::Relaxed);
        self.solo.store(s.solo, Ordering::Relaxed);
        self.bypass.store(s.bypass, Ordering::Relaxed);
    }

    fn load(&self) -> BandSettings {
        BandSettings {
            compressor: CompressorSettings {
                attack_ms: self.attack_ms.get(),
                release_ms: self.release_ms.get(),
                threshold_db: self.threshold_db.get(),
                ratio: self.ratio.get(),
            },
            state: BandState {
                mute: self.mute.load(Ordering::Relaxed),
                solo: self.solo.load(Ordering::Relaxed),
                bypass: self.bypass.load(Ordering::Relaxed),
            },
        }
    }
}

#[derive(Debug)]
struct Inner {
    low_mid_hz: AtomicF32,
    mid_high_hz: AtomicF32,
    global_bypass: AtomicBool,
    bands: [BandSlot; NUM_BANDS],
}

/// Shared handle to the live control values
///
/// Cloning is cheap and every clone refers to the same store.
#[derive(Debug, Clone)]
pub struct SharedParams {
    inner: Arc<Inner>,
}

impl SharedParams {
    pub fn new(settings: &MultibandSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                low_mid_hz: AtomicF32::new(settings.crossover.low_mid_hz),
                mid_high_hz: AtomicF32::new(settings.crossover.mid_high_hz),
                global_bypass: AtomicBool::new(settings.global_bypass),
                bands: Band::ALL.map(|band| BandSlot::new(settings.band(band))),
            }),
        }
    }

    /// Read every value once; called by the audio thread at block start
    pub fn snapshot(&self) -> MultibandSettings {
        let inner = &self.inner;
        let [low, mid, high] = &inner.bands;
        MultibandSettings {
            crossover: CrossoverSpec {
                low_mid_hz: inner.low_mid_hz.get(),
                mid_high_hz: inner.mid_high_hz.get(),
            },
            low: low.load(),
            mid: mid.load(),
            high: high.load(),
            global_bypass: inner.global_bypass.load(Ordering::Relaxed),
        }
    }

    /// Overwrite every value from a settings struct
    pub fn store(&self, settings: &MultibandSettings) {
        self.set_crossover(settings.crossover);
        for band in Band::ALL {
            self.slot(band).store(settings.band(band));
        }
        self.set_global_bypass(settings.global_bypass);
    }

    pub fn set_crossover(&self, crossover: CrossoverSpec) {
        self.inner.low_mid_hz.set(crossover.low_mid_hz);
        self.inner.mid_high_hz.set(crossover.mid_high_hz);
    }

    pub fn set_global_bypass(&self, bypass: bool) {
        self.inner.global_bypass.store(bypass, Ordering::Relaxed);
    }

    pub fn set_attack_ms(&self, band: Band, attack_ms: f32) {
        self.slot(band).attack_ms.set(attack_ms);
    }

    pub fn set_release_ms(&self, band: Band, release_ms: f32) {
        self.slot(band).release_ms.set(release_ms);
    }

    pub fn set_threshold_db(&self, band: Band, threshold_db: f32) {
        self.slot(band).threshold_db.set(threshold_db);
    }

    pub fn set_ratio(&self, band: Band, ratio: f32) {
        self.slot(band).ratio.set(ratio);
    }

    /// Set the ratio from an index into `RATIO_CHOICES`
    pub fn set_ratio_choice(&self, band: Band, index: usize) {
        self.set_ratio(band, ratio_from_choice(index));
    }

    pub fn set_mute(&self, band: Band, mute: bool) {
        self.slot(band).mute.store(mute, Ordering::Relaxed);
    }

    pub fn set_solo(&self, band: Band, solo: bool) {
        self.slot(band).solo.store(solo, Ordering::Relaxed);
    }

    pub fn set_bypass(&self, band: Band, bypass: bool) {
        self.slot(band).bypass.store(bypass, Ordering::Relaxed);
    }

    #[inline]
    fn slot(&self, band: Band) -> &BandSlot {
        &self.inner.bands[band.index()]
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(&MultibandSettings::default())
    }
}

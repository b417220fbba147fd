//! Integration Tests
//!
//! End-to-end tests for the multiband processing pipeline.

use approx::assert_abs_diff_eq;
use mbcomp::dsp::{BandCompressor, Compressor, Effect, LinkwitzRiley, ProcessSpec, ThreeBandSplitter};
use mbcomp::engine::{
    calculate_rms, db_to_linear, generate_sine, linear_to_db, AudioBuffer, MultibandProcessor,
};
use mbcomp::params::{
    Band, BandSettings, BandState, CompressorSettings, CrossoverSpec, MultibandSettings,
    SharedParams,
};
use test_case::test_case;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK: usize = 512;
const CHANNELS: usize = 2;

/// Deterministic broadband test signal in [-0.8, 0.8]
fn noise(num_channels: usize, num_samples: usize, seed: u32) -> AudioBuffer {
    let mut state = seed;
    let channels = (0..num_channels)
        .map(|_| {
            (0..num_samples)
                .map(|_| {
                    state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                    ((state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0) * 0.8
                })
                .collect::<Vec<f32>>()
        })
        .collect();
    AudioBuffer::from_channels(channels).unwrap()
}

fn unity_settings() -> MultibandSettings {
    MultibandSettings::default().with_compressor(CompressorSettings::unity())
}

fn heavy_settings() -> MultibandSettings {
    MultibandSettings::default().with_compressor(CompressorSettings {
        attack_ms: 1.0,
        release_ms: 20.0,
        threshold_db: -40.0,
        ratio: 16.0,
    })
}

fn spec(block: usize, channels: usize) -> ProcessSpec {
    ProcessSpec::new(SAMPLE_RATE, block, channels)
}

/// Run `input` through a fresh processor block by block
fn render(input: &AudioBuffer, settings: &MultibandSettings, block: usize) -> AudioBuffer {
    let mut processor = MultibandProcessor::with_params(SharedParams::new(settings));
    processor.prepare(&spec(block, input.num_channels())).unwrap();
    render_with(&mut processor, input, block)
}

fn render_with(
    processor: &mut MultibandProcessor,
    input: &AudioBuffer,
    block: usize,
) -> AudioBuffer {
    let mut output = AudioBuffer::new(input.num_channels(), input.num_samples());
    let mut chunk = AudioBuffer::new(input.num_channels(), block);
    for start in (0..input.num_samples()).step_by(block) {
        chunk.copy_from_range(input, start, block).unwrap();
        processor.process(&mut chunk).unwrap();
        chunk.copy_into_range(&mut output, start).unwrap();
    }
    output
}

/// The all-pass response the recombined bands should match
fn allpass_reference(input: &AudioBuffer, crossover: &CrossoverSpec) -> AudioBuffer {
    let spec = spec(input.num_samples(), input.num_channels());
    let mut low = LinkwitzRiley::allpass(crossover.low_mid_hz);
    let mut high = LinkwitzRiley::allpass(crossover.mid_high_hz);
    low.prepare(&spec).unwrap();
    high.prepare(&spec).unwrap();

    let mut reference = input.clone();
    low.process(&mut reference);
    high.process(&mut reference);
    reference
}

/// Unprocessed bands of `input`, split in one pass
fn split_reference(input: &AudioBuffer, crossover: &CrossoverSpec) -> [AudioBuffer; 3] {
    let mut splitter = ThreeBandSplitter::new(crossover);
    splitter
        .prepare(&spec(input.num_samples(), input.num_channels()))
        .unwrap();
    let mut bands =
        std::array::from_fn(|_| AudioBuffer::new(input.num_channels(), input.num_samples()));
    splitter.split(input, &mut bands).unwrap();
    bands
}

fn sum_bands(bands: &[AudioBuffer; 3], include: &[Band]) -> AudioBuffer {
    let mut sum = AudioBuffer::new(bands[0].num_channels(), bands[0].num_samples());
    for band in include {
        sum.add_from(&bands[band.index()]).unwrap();
    }
    sum
}

fn assert_buffers_close(actual: &AudioBuffer, expected: &AudioBuffer, epsilon: f32) {
    assert_eq!(actual.num_channels(), expected.num_channels());
    assert_eq!(actual.num_samples(), expected.num_samples());
    for ch in 0..actual.num_channels() {
        for (i, (a, e)) in actual.channel(ch).iter().zip(expected.channel(ch)).enumerate() {
            assert!(
                (a - e).abs() <= epsilon,
                "channel {} sample {}: {} vs {}",
                ch,
                i,
                a,
                e
            );
        }
    }
}

// === Reconstruction ===

#[test]
fn test_unity_output_is_allpass_of_input() {
    let input = noise(CHANNELS, 8192, 7);
    let settings = unity_settings();

    let output = render(&input, &settings, BLOCK);
    let reference = allpass_reference(&input, &settings.crossover);
    assert_buffers_close(&output, &reference, 1e-4);
}

#[test_case(250.0, 1000.0 ; "narrow low band")]
#[test_case(800.0, 8000.0 ; "wide mid band")]
#[test_case(100.0, 15000.0 ; "extreme cutoffs")]
fn test_reconstruction_across_crossovers(low_mid_hz: f32, mid_high_hz: f32) {
    let input = noise(1, 4096, 11);
    let mut settings = unity_settings();
    settings.crossover = CrossoverSpec {
        low_mid_hz,
        mid_high_hz,
    };

    let output = render(&input, &settings, BLOCK);
    let reference = allpass_reference(&input, &settings.crossover);
    assert_buffers_close(&output, &reference, 1e-4);
}

#[test]
fn test_scenario_1khz_sine_keeps_rms() {
    let input = generate_sine(1000.0, 1.0, CHANNELS, 48000, SAMPLE_RATE);
    let output = render(&input, &unity_settings(), BLOCK);

    // Skip 100 ms of settling
    for ch in 0..CHANNELS {
        let input_rms = calculate_rms(&input.channel(ch)[4800..]);
        let output_rms = calculate_rms(&output.channel(ch)[4800..]);
        let error = (output_rms - input_rms).abs() / input_rms;
        assert!(
            error < 0.01,
            "channel {}: RMS {} vs {} ({:.3}%)",
            ch,
            output_rms,
            input_rms,
            error * 100.0
        );
    }
}

#[test]
fn test_block_size_does_not_change_output() {
    let input = noise(CHANNELS, 6000, 3);
    let settings = heavy_settings();

    let large = render(&input, &settings, 512);
    let small = render(&input, &settings, 77);
    assert_buffers_close(&small, &large, 1e-6);
}

// === Mute / Solo ===

#[test]
fn test_muted_band_contributes_nothing() {
    let input = noise(CHANNELS, 4096, 5);
    let mut settings = unity_settings();
    settings.mid.state.mute = true;

    let output = render(&input, &settings, BLOCK);
    let bands = split_reference(&input, &settings.crossover);
    let expected = sum_bands(&bands, &[Band::Low, Band::High]);
    assert_buffers_close(&output, &expected, 1e-6);
}

#[test]
fn test_mute_dominates_solo() {
    let input = noise(CHANNELS, 2048, 9);
    let mut settings = unity_settings();
    settings.low.state = BandState {
        mute: true,
        solo: true,
        bypass: false,
    };

    // The only soloed band is muted, so nothing reaches the output
    let output = render(&input, &settings, BLOCK);
    for ch in 0..CHANNELS {
        assert!(output.channel(ch).iter().all(|&s| s == 0.0));
    }
}

#[test_case(Band::Low ; "low solo")]
#[test_case(Band::Mid ; "mid solo")]
#[test_case(Band::High ; "high solo")]
fn test_single_solo_is_exclusive(band: Band) {
    let input = noise(CHANNELS, 4096, 13);
    let mut settings = unity_settings();
    settings.band_mut(band).state.solo = true;

    let output = render(&input, &settings, BLOCK);
    let bands = split_reference(&input, &settings.crossover);
    let expected = sum_bands(&bands, &[band]);
    assert_buffers_close(&output, &expected, 1e-6);
}

#[test]
fn test_two_solos_sum_both_bands() {
    let input = noise(CHANNELS, 4096, 17);
    let mut settings = unity_settings();
    settings.low.state.solo = true;
    settings.high.state.solo = true;

    let output = render(&input, &settings, BLOCK);
    let bands = split_reference(&input, &settings.crossover);
    let expected = sum_bands(&bands, &[Band::Low, Band::High]);
    assert_buffers_close(&output, &expected, 1e-6);
}

// === Global bypass ===

#[test]
fn test_global_bypass_skips_dynamics_and_flags() {
    let input = noise(CHANNELS, 8192, 21);
    let mut settings = heavy_settings();
    settings.low.state.mute = true;
    settings.mid.state.solo = true;
    settings.high.state.bypass = true;
    settings.global_bypass = true;

    let output = render(&input, &settings, BLOCK);
    let reference = allpass_reference(&input, &settings.crossover);
    assert_buffers_close(&output, &reference, 1e-4);
}

#[test]
fn test_heavy_compression_differs_from_bypass() {
    let input = noise(CHANNELS, 8192, 21);
    let mut settings = heavy_settings();

    let compressed = render(&input, &settings, BLOCK);
    settings.global_bypass = true;
    let bypassed = render(&input, &settings, BLOCK);

    let compressed_rms = calculate_rms(&compressed.channel(0)[4096..]);
    let bypassed_rms = calculate_rms(&bypassed.channel(0)[4096..]);
    assert!(
        compressed_rms < bypassed_rms * 0.5,
        "compressed {} vs bypassed {}",
        compressed_rms,
        bypassed_rms
    );
}

#[test]
fn test_leaving_global_bypass_compresses_immediately() {
    let slow_attack = MultibandSettings::default().with_compressor(CompressorSettings {
        attack_ms: 50.0,
        release_ms: 250.0,
        threshold_db: -40.0,
        ratio: 16.0,
    });
    let input = generate_sine(100.0, 0.9, 1, 11 * BLOCK, SAMPLE_RATE);
    let mut chunk = AudioBuffer::new(1, BLOCK);

    let mut warm = MultibandProcessor::with_params(SharedParams::new(&slow_attack));
    warm.prepare(&spec(BLOCK, 1)).unwrap();
    warm.params().set_global_bypass(true);
    for start in (0..10 * BLOCK).step_by(BLOCK) {
        chunk.copy_from_range(&input, start, BLOCK).unwrap();
        warm.process(&mut chunk).unwrap();
    }
    warm.params().set_global_bypass(false);
    chunk.copy_from_range(&input, 10 * BLOCK, BLOCK).unwrap();
    warm.process(&mut chunk).unwrap();
    let warm_rms = calculate_rms(&chunk.channel(0)[..256]);

    let mut cold = MultibandProcessor::with_params(SharedParams::new(&slow_attack));
    cold.prepare(&spec(BLOCK, 1)).unwrap();
    chunk.copy_from_range(&input, 10 * BLOCK, BLOCK).unwrap();
    cold.process(&mut chunk).unwrap();
    let cold_rms = calculate_rms(&chunk.channel(0)[..256]);

    assert!(
        warm_rms < cold_rms * 0.5,
        "warm {} vs cold {}",
        warm_rms,
        cold_rms
    );
}

// === Non-finite input ===

#[test]
fn test_nan_block_does_not_poison_later_blocks() {
    let mut processor = MultibandProcessor::with_params(SharedParams::new(&heavy_settings()));
    processor.prepare(&spec(BLOCK, CHANNELS)).unwrap();

    let mut poisoned = AudioBuffer::from_channels(vec![vec![f32::NAN; BLOCK]; CHANNELS]).unwrap();
    processor.process(&mut poisoned).unwrap();

    let input = noise(CHANNELS, 100 * BLOCK, 41);
    let output = render_with(&mut processor, &input, BLOCK);
    assert!(output.is_finite());
    assert!(calculate_rms(&output.channel(0)[BLOCK..]) > 0.0);
}

// === Settings refresh ===

#[test]
fn test_repeated_identical_refresh_is_idempotent() {
    let input = noise(CHANNELS, 4096, 23);
    let target = heavy_settings();

    let mut once = MultibandProcessor::new();
    once.prepare(&spec(BLOCK, CHANNELS)).unwrap();
    once.params().store(&target);
    let a = render_with(&mut once, &input, BLOCK);

    let mut twice = MultibandProcessor::new();
    twice.prepare(&spec(BLOCK, CHANNELS)).unwrap();
    twice.params().store(&target);
    twice.params().store(&target);
    let b = render_with(&mut twice, &input, BLOCK);

    assert_eq!(a, b);
}

#[test]
fn test_process_with_matches_shared_params() {
    let input = noise(CHANNELS, 2048, 29);
    let settings = heavy_settings();

    let via_params = render(&input, &settings, BLOCK);

    let mut processor = MultibandProcessor::new();
    processor.prepare(&spec(BLOCK, CHANNELS)).unwrap();
    let mut via_snapshot = AudioBuffer::new(CHANNELS, input.num_samples());
    let mut chunk = AudioBuffer::new(CHANNELS, BLOCK);
    for start in (0..input.num_samples()).step_by(BLOCK) {
        chunk.copy_from_range(&input, start, BLOCK).unwrap();
        processor.process_with(&mut chunk, &settings).unwrap();
        chunk.copy_into_range(&mut via_snapshot, start).unwrap();
    }

    assert_eq!(via_params, via_snapshot);
}

#[test]
fn test_reset_restores_initial_behaviour() {
    let input = noise(CHANNELS, 2048, 31);
    let settings = heavy_settings();

    let mut processor = MultibandProcessor::with_params(SharedParams::new(&settings));
    processor.prepare(&spec(BLOCK, CHANNELS)).unwrap();
    let first = render_with(&mut processor, &input, BLOCK);
    processor.reset();
    let second = render_with(&mut processor, &input, BLOCK);

    assert_eq!(first, second);
}

// === Threshold / ratio ===

fn constant_block(level: f32) -> AudioBuffer {
    AudioBuffer::from_channels(vec![vec![level; BLOCK]]).unwrap()
}

#[test]
fn test_signal_at_threshold_has_no_gain_reduction() {
    let mut band = BandCompressor::new(&BandSettings {
        compressor: CompressorSettings {
            attack_ms: 2.0,
            release_ms: 100.0,
            threshold_db: -18.0,
            ratio: 4.0,
        },
        state: BandState::default(),
    });
    band.prepare(&spec(BLOCK, 1)).unwrap();

    let level = db_to_linear(-18.0);
    for _ in 0..50 {
        let mut block = constant_block(level);
        band.process(&mut block);
        assert!(block.channel(0).iter().all(|&s| s == level));
    }
    assert_eq!(band.gain_reduction_db(), 0.0);
}

#[test_case(-24.0 ; "low threshold")]
#[test_case(-6.0 ; "high threshold")]
fn test_six_db_over_at_ratio_two_gives_three_db(threshold_db: f32) {
    let mut comp = Compressor::with_settings(CompressorSettings {
        attack_ms: 2.0,
        release_ms: 100.0,
        threshold_db,
        ratio: 2.0,
    });
    comp.prepare(&spec(BLOCK, 1)).unwrap();

    let level = db_to_linear(threshold_db + 6.0);
    let mut block = AudioBuffer::new(1, BLOCK);
    for _ in 0..50 {
        block.channel_mut(0).fill(level);
        comp.process(&mut block);
    }

    let out_db = linear_to_db(block.channel(0)[BLOCK - 1]);
    assert_abs_diff_eq!(out_db, threshold_db + 3.0, epsilon = 0.01);
    assert_abs_diff_eq!(comp.gain_reduction_db(), -3.0, epsilon = 0.01);
}

// === Concurrency ===

#[test]
fn test_control_thread_updates_while_processing() {
    let input = noise(CHANNELS, 48000, 37);
    let mut processor = MultibandProcessor::new();
    processor.prepare(&spec(BLOCK, CHANNELS)).unwrap();
    let control = processor.params().clone();

    let writer = std::thread::spawn(move || {
        for i in 0..1000 {
            let band = Band::ALL[i % 3];
            control.set_threshold_db(band, -((i % 60) as f32));
            control.set_ratio_choice(band, i % 14);
            control.set_solo(band, i % 7 == 0);
            control.set_bypass(band, i % 5 == 0);
            control.set_mute(band, i % 11 == 0);
        }
    });

    let output = render_with(&mut processor, &input, BLOCK);
    writer.join().unwrap();
    assert!(output.is_finite());
}

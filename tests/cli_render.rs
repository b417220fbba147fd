//! Offline render tests
//!
//! Drive the CLI command handlers against real WAV files on disk.

use std::fs;

use mbcomp::cli::commands::{check_config, render};
use mbcomp::engine::{calculate_rms, export_audio, generate_sine, import_audio, WavFormat};
use mbcomp::params::MultibandSettings;
use mbcomp::MbcError;
use tempfile::tempdir;

#[test]
fn test_render_unity_config_preserves_level() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("out.wav");
    let config = dir.path().join("unity.json");

    let tone = generate_sine(1000.0, 0.5, 2, 44100, 44100.0);
    export_audio(&tone, 44100, &input, WavFormat::default()).unwrap();

    let mut settings = MultibandSettings::default();
    for band in [&mut settings.low, &mut settings.mid, &mut settings.high] {
        band.compressor.ratio = 1.0;
    }
    fs::write(&config, settings.to_json_pretty().unwrap()).unwrap();

    let summary = render(&input, &output, Some(&config), 512).unwrap();
    assert_eq!(summary.num_samples, 44100);
    assert_eq!(summary.num_channels, 2);
    assert_eq!(summary.blocks, 87);

    let rendered = import_audio(&output).unwrap();
    assert_eq!(rendered.sample_rate, 44100);
    assert_eq!(rendered.format, WavFormat::default());
    assert_eq!(rendered.buffer.num_samples(), 44100);

    let in_rms = calculate_rms(&tone.channel(0)[4410..]);
    let out_rms = calculate_rms(&rendered.buffer.channel(0)[4410..]);
    assert!(
        (in_rms - out_rms).abs() / in_rms < 0.01,
        "RMS changed: {} -> {}",
        in_rms,
        out_rms
    );
}

#[test]
fn test_render_keeps_integer_format() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("pcm16.wav");
    let output = dir.path().join("pcm16_out.wav");

    let tone = generate_sine(220.0, 0.9, 1, 9600, 48000.0);
    export_audio(&tone, 48000, &input, WavFormat::pcm16()).unwrap();

    let summary = render(&input, &output, None, 256).unwrap();
    assert_eq!(summary.sample_rate, 48000);

    let rendered = import_audio(&output).unwrap();
    assert_eq!(rendered.format, WavFormat::pcm16());
    assert_eq!(rendered.buffer.num_channels(), 1);
}

#[test]
fn test_render_with_heavy_compression_lowers_peak() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("loud.wav");
    let output = dir.path().join("quiet.wav");
    let config = dir.path().join("heavy.json");

    let tone = generate_sine(150.0, 0.9, 2, 48000, 48000.0);
    export_audio(&tone, 48000, &input, WavFormat::default()).unwrap();
    fs::write(
        &config,
        r#"{ "low": { "compressor": { "threshold_db": -30.0, "ratio": 16.0, "attack_ms": 1.0 } } }"#,
    )
    .unwrap();

    let summary = render(&input, &output, Some(&config), 512).unwrap();
    assert!(
        summary.output_peak_db < summary.input_peak_db - 6.0,
        "peak {} -> {}",
        summary.input_peak_db,
        summary.output_peak_db
    );
}

#[test]
fn test_render_missing_input() {
    let dir = tempdir().unwrap();
    let result = render(
        &dir.path().join("missing.wav"),
        &dir.path().join("out.wav"),
        None,
        512,
    );
    assert!(matches!(result, Err(MbcError::FileNotFound { .. })));
}

#[test]
fn test_render_rejects_malformed_config() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let config = dir.path().join("broken.json");
    export_audio(
        &generate_sine(440.0, 0.5, 1, 1000, 48000.0),
        48000,
        &input,
        WavFormat::default(),
    )
    .unwrap();
    fs::write(&config, "{ ratio: ").unwrap();

    let result = render(&input, &dir.path().join("out.wav"), Some(&config), 512);
    assert!(matches!(result, Err(MbcError::Serialization(_))));
}

#[test]
fn test_check_config_round_trips_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("defaults.json");
    fs::write(&path, MultibandSettings::default().to_json_pretty().unwrap()).unwrap();

    let settings = check_config(&path).unwrap();
    assert_eq!(settings, MultibandSettings::default());
}

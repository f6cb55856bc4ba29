//! Audio setup: cpal output stream driving a NoteController

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use tracing::{error, info};

use polyslot::{
    graph::OfflineGraph, synth::message::SynthMessage, NoteController, RetriggerMode,
    SynthConfig, MAX_BLOCK_SIZE,
};

use crate::ui::{state::StatusUpdate, UiApp};

const CONTROL_CAPACITY: usize = 256;
const SCOPE_CAPACITY: usize = 8192;
const STATUS_CAPACITY: usize = 64;

/// Open the default output device and run the TUI until the user quits.
pub fn run() -> EyreResult<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    info!(sample_rate, channels, "output device ready");

    // Keyboard play: a new key replaces the sounding note
    let synth_config = SynthConfig::default().with_retrigger(RetriggerMode::Restart);
    let engine = OfflineGraph::new(sample_rate).wrap_err("failed to create the audio graph")?;
    let mut synth = NoteController::with_engine(engine, synth_config)
        .wrap_err("failed to attach the synth to the audio graph")?;
    let initial_slots = synth.slots().to_vec();

    // UI -> audio: control messages; audio -> UI: scope samples and status
    let (control_tx, mut control_rx) = RingBuffer::<SynthMessage>::new(CONTROL_CAPACITY);
    let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_CAPACITY);
    let (mut status_tx, status_rx) = RingBuffer::<StatusUpdate>::new(STATUS_CAPACITY);

    let mut block = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            synth.process_messages(&mut control_rx);

            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let chunk = &mut block[..frames_to_render];
                synth.render(chunk);

                // Copy to output (mono to all channels)
                let out_off = frames_written * channels;
                for (i, &sample) in chunk.iter().enumerate() {
                    for ch in 0..channels {
                        data[out_off + i * channels + ch] = sample;
                    }
                    // scope is best effort
                    let _ = scope_tx.push(sample);
                }

                frames_written += frames_to_render;
            }

            let _ = status_tx.push(StatusUpdate::capture(&synth));
        },
        |err| error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;

    let mut terminal = ratatui::init();
    let result = UiApp::new(control_tx, scope_rx, status_rx, sample_rate, initial_slots)
        .run(&mut terminal);
    ratatui::restore();

    drop(stream);
    result
}

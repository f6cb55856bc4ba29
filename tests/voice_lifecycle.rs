use std::collections::VecDeque;

use polyslot::{
    dsp::{distortion::build_curve, oscillator::Waveform},
    graph::{AudioEngine, OfflineGraph, ParamKind},
    io::{midi_note_to_freq, midi_to_synth, MidiAdapter, MidiEvent},
    preset::{Deletion, PresetBank},
    synth::message::SynthMessage,
    NoteController, SlotPatch, SynthConfig, SynthError,
};

fn synth() -> NoteController<OfflineGraph> {
    let engine = OfflineGraph::new(48_000.0).unwrap();
    NoteController::with_engine(engine, SynthConfig::default()).unwrap()
}

fn rms(buffer: &[f32]) -> f32 {
    (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
}

#[test]
fn curve_is_odd_for_every_amount() {
    for amount in [0.0, 0.5, 1.0, 10.0, 400.0] {
        let curve = build_curve(amount);
        let points = curve.as_slice();
        assert_eq!(points.len(), 4096);
        for i in 1..4096 {
            assert!((points[4096 - i] + points[i]).abs() < 1e-6, "amount {amount} i {i}");
        }
    }
}

#[test]
fn middle_c_on_the_default_bank() {
    let mut synth = synth();
    assert_eq!(synth.note_on(261.63).unwrap(), 4);

    let waveforms: Vec<Waveform> = synth.voices().map(|(_, v)| v.waveform()).collect();
    assert_eq!(
        waveforms,
        vec![
            Waveform::Sine,
            Waveform::Sawtooth,
            Waveform::Square,
            Waveform::Triangle
        ]
    );
    for (_, hz) in synth.voice_frequencies() {
        assert_eq!(hz, 261.63);
    }

    synth.note_off().unwrap();
    assert_eq!(synth.voice_count(), 0);
    assert_eq!(synth.current_pitch(), None);
}

#[test]
fn note_produces_sound_and_note_off_silences_it() {
    let mut synth = synth();
    let mut block = vec![0.0; 2_400];

    synth.render(&mut block);
    assert_eq!(rms(&block), 0.0);

    synth.note_on(220.0).unwrap();
    synth.render(&mut block);
    assert!(rms(&block) > 1e-4);

    synth.note_off().unwrap();
    // filter state rings out within a block
    synth.render(&mut block);
    synth.render(&mut block);
    assert!(rms(&block) < 1e-5);
}

#[test]
fn disabling_a_slot_mid_note_keeps_the_registry() {
    let mut synth = synth();
    synth.note_on(440.0).unwrap();
    let before = synth.voice_count();

    synth.set_enabled(1, false).unwrap();

    assert_eq!(synth.voice_count(), before);
    let muted: Vec<bool> = synth.voices().map(|(_, v)| v.is_connected()).collect();
    assert_eq!(muted, vec![true, false, true, true]);
}

#[test]
fn changing_waveform_mutes_until_the_next_note() {
    let mut synth = synth();
    synth.note_on(440.0).unwrap();

    synth.set_waveform(0, Waveform::Square).unwrap();
    let first = synth.voices().next().map(|(_, v)| v.clone()).unwrap();
    assert!(!first.is_connected());

    synth.note_off().unwrap();
    synth.note_on(440.0).unwrap();
    let first = synth.voices().next().map(|(_, v)| v.clone()).unwrap();
    assert_eq!(first.waveform(), Waveform::Square);
    assert!(first.is_connected());
}

#[test]
fn bend_glides_over_three_stages() {
    let mut synth = synth();
    synth.set_bend(0, 0.1).unwrap();
    synth.note_on(440.0).unwrap();
    synth.glide_to(220.0).unwrap();

    let voice = synth.voices().next().map(|(_, v)| v.clone()).unwrap();
    let engine = synth.engine().unwrap();
    let frequency = engine.param(voice.oscillator(), ParamKind::Frequency).unwrap();

    assert_eq!(frequency.value_at(0.0), 440.0);
    assert!((frequency.value_at(0.1) - 220.0).abs() < 1e-3);
    assert!((frequency.value_at(0.2) - 440.0).abs() < 1e-3);
    assert!((frequency.value_at(0.3) - 220.0).abs() < 1e-3);
    assert_eq!(frequency.value_at(1.0), 220.0);
}

#[test]
fn octave_applies_at_note_on() {
    let mut synth = synth();
    synth.set_octave(0, 1).unwrap();
    synth.set_octave(1, -1).unwrap();
    synth.note_on(200.0).unwrap();

    let voices: Vec<_> = synth.voices().map(|(_, v)| v.clone()).collect();
    let engine = synth.engine().unwrap();
    let built: Vec<f32> = voices
        .iter()
        .map(|v| {
            let param = engine.param(v.oscillator(), ParamKind::Frequency).unwrap();
            param.events()[0].value()
        })
        .collect();
    assert_eq!(built, vec![400.0, 100.0, 200.0, 200.0]);

    let live: Vec<f32> = synth.voice_frequencies().into_iter().map(|(_, hz)| hz).collect();
    assert_eq!(live, built);
}

#[test]
fn deleting_the_active_preset_resets_the_bank() {
    let mut synth = synth();
    let mut presets = PresetBank::builtin();

    let dubstep = presets.select("Dubstep Wobble").unwrap().data.clone();
    synth.apply_preset(dubstep).unwrap();
    assert_eq!(synth.slots()[1].waveform, Waveform::Square);
    assert_eq!(synth.note_on(110.0).unwrap(), 2);

    assert_eq!(presets.delete("Dubstep Wobble"), Deletion::RemovedSelected);
    synth.apply_preset(Vec::new()).unwrap();

    let keys: Vec<i32> = synth.slots().iter().map(|s| s.sort_index).collect();
    assert_eq!(keys, vec![1, 2, 3, 4]);
    assert_eq!(synth.slots()[1].waveform, Waveform::Sawtooth);
}

#[test]
fn midi_drives_the_controller() {
    let mut synth = synth();
    let events = [
        MidiEvent::NoteOn {
            channel: 0,
            key: 69,
            velocity: 100,
        },
        MidiEvent::NoteOn {
            channel: 3,
            key: 40,
            velocity: 100,
        },
    ];
    let mut queue: VecDeque<SynthMessage> =
        events.iter().filter_map(|&e| midi_to_synth(e, 0)).collect();

    synth.process_messages(&mut queue);
    assert_eq!(synth.current_pitch(), Some(440.0));
    assert_eq!(synth.voice_count(), 4);

    let off = MidiEvent::NoteOff {
        channel: 0,
        key: 69,
        velocity: 0,
    };
    let mut queue: VecDeque<SynthMessage> = midi_to_synth(off, 0).into_iter().collect();
    synth.process_messages(&mut queue);
    assert_eq!(synth.voice_count(), 0);
}

#[test]
fn midi_adapter_bends_and_releases_the_held_note() {
    let mut synth = synth();
    let mut adapter = MidiAdapter::new(0);
    let events = [
        MidiEvent::NoteOn {
            channel: 0,
            key: 57,
            velocity: 90,
        },
        MidiEvent::NoteOn {
            channel: 0,
            key: 69,
            velocity: 90,
        },
        // stale release of the first key
        MidiEvent::NoteOff {
            channel: 0,
            key: 57,
            velocity: 0,
        },
        MidiEvent::PitchBend {
            channel: 0,
            value: 8192,
        },
    ];
    let mut queue: VecDeque<SynthMessage> =
        events.iter().filter_map(|&e| adapter.convert(e)).collect();
    assert_eq!(queue.len(), 3);

    synth.process_messages(&mut queue);
    let bent = midi_note_to_freq(69) * 2.0_f32.powf(2.0 / 12.0);
    assert_eq!(synth.current_pitch(), Some(bent));
    assert_eq!(synth.voice_count(), 8);
    for (_, hz) in synth.voice_frequencies() {
        assert!((hz - bent).abs() < 1e-3);
    }

    let release = adapter.convert(MidiEvent::NoteOff {
        channel: 0,
        key: 69,
        velocity: 0,
    });
    synth.process_messages(&mut release.into_iter().collect::<VecDeque<_>>());
    assert_eq!(synth.voice_count(), 0);
    assert_eq!(adapter.held_key(), None);
}

#[test]
fn detached_controller_is_inert() {
    let mut synth = synth();
    synth.note_on(440.0).unwrap();

    let engine = synth.detach().unwrap();
    assert!(engine.sample_rate() > 0.0);
    assert_eq!(synth.voice_count(), 0);
    assert_eq!(
        synth.update_slot(0, &SlotPatch::volume(0.2)),
        Err(SynthError::EngineUnavailable)
    );
    assert_eq!(synth.slots()[0].volume, 0.1);

    synth.attach(OfflineGraph::new(44_100.0).unwrap()).unwrap();
    assert_eq!(synth.note_on(440.0).unwrap(), 4);
}

#[test]
fn engine_construction_failure_is_reported() {
    assert!(OfflineGraph::new(0.0).is_err());
    assert!(OfflineGraph::new(f32::NAN).is_err());
}

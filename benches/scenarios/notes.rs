//! Benchmarks for voice lifecycle operations.
//!
//! These run on the audio thread in the terminal front-end, so they share the
//! block deadline with rendering.

use std::hint::black_box;

use criterion::{BatchSize, Criterion};
use polyslot::{graph::OfflineGraph, NoteController, RetriggerMode, SynthConfig};

fn synth(config: SynthConfig) -> NoteController<OfflineGraph> {
    let engine = OfflineGraph::new(48_000.0).expect("valid sample rate");
    NoteController::with_engine(engine, config).expect("valid config")
}

pub fn bench_notes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/notes");

    // Full note: four voices built, started, resynced, then torn down
    let restart = SynthConfig::default().with_retrigger(RetriggerMode::Restart);
    let mut controller = synth(restart);
    group.bench_function("note_on_off", |b| {
        b.iter(|| {
            controller.note_on(black_box(261.63)).expect("note on");
            controller.note_off().expect("note off");
        })
    });

    // Knob turn while a note sounds
    group.bench_function("resync_on_edit", |b| {
        b.iter_batched(
            || {
                let mut controller = synth(SynthConfig::default());
                controller.note_on(440.0).expect("note on");
                controller
            },
            |mut controller| {
                controller
                    .set_filter_cutoff(0, black_box(600.0))
                    .expect("edit");
                controller
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

//! wavedraw: draw one period of a waveform with the mouse while the audio
//! device plays it back continuously.
//!
//! Left-drag sketches the table, arrow up/down move the pitch by a
//! semitone. Audio is composed before the app starts; the window systems
//! only ever touch the editor half of the table and the engine slot.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use cpal::traits::StreamTrait;

use wavedraw_backend::{EngineSlot, OscillatorEngine, OutputRequest, open_output, select_output};
use wavedraw_core::{WaveformEditor, WavetableOscillator, shared_table};

const WINDOW_WIDTH: f32 = 640.0;
const WINDOW_HEIGHT: f32 = 480.0;
/// Samples per period: 50 ms of audio at 44.1 kHz, matching the drawing
/// resolution of a few samples per pixel.
const TABLE_LEN: usize = 2205;
const INITIAL_FREQUENCY: f32 = 110.0;
const OUTPUT_GAIN: f32 = 0.8;
const SEMITONE: f32 = 1.059_463_1;

#[derive(Resource)]
struct Editor(WaveformEditor);

#[derive(Resource)]
struct Engine(Arc<EngineSlot<OscillatorEngine>>);

/// Keeps the cpal stream alive for the process lifetime. `cpal::Stream` is
/// not `Send`, hence a non-send resource.
struct AudioStream {
    _stream: cpal::Stream,
}

fn main() {
    let (editor, slot, stream) = match build_audio() {
        Ok(parts) => parts,
        Err(err) => {
            eprintln!("audio setup failed: {err}");
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "wavedraw".into(),
                resolution: (WINDOW_WIDTH, WINDOW_HEIGHT).into(),
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(Editor(editor))
        .insert_resource(Engine(slot))
        .insert_non_send_resource(AudioStream { _stream: stream })
        .add_systems(Startup, setup_camera)
        .add_systems(Update, (draw_input, adjust_frequency, render_waveform))
        .run();
}

type AudioParts = (WaveformEditor, Arc<EngineSlot<OscillatorEngine>>, cpal::Stream);

/// Composition root for the audio side: table split, oscillator, engine,
/// slot, stream. The editor half stays on the UI thread; the reader half
/// moves into the oscillator and from there into the device callback.
fn build_audio() -> Result<AudioParts, Box<dyn std::error::Error>> {
    let selected = select_output(&OutputRequest::default())?;
    let sample_rate = selected.config.sample_rate.0 as f32;
    let channels = selected.config.channels as usize;

    let (writer, reader) = shared_table(TABLE_LEN)?;
    let osc = WavetableOscillator::new(reader, sample_rate, INITIAL_FREQUENCY)?;
    let engine = OscillatorEngine::new(osc, OUTPUT_GAIN).with_block_capacity(1024);
    let slot = EngineSlot::new(engine, sample_rate, channels);
    let stream = open_output(&selected, Arc::clone(&slot))?;
    stream.play()?;

    Ok((WaveformEditor::new(writer), slot, stream))
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Maps left-button drags into table edits: cursor x to table index
/// (rounded, clamped), cursor y to amplitude in -1..1 (top of the window is
/// +1, and values are deliberately left unclamped).
fn draw_input(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut editor: ResMut<Editor>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    if buttons.pressed(MouseButton::Left) {
        if let Some(cursor) = window.cursor_position() {
            let max_index = editor.0.table_len() as f32 - 1.0;
            let index = (cursor.x / window.width() * max_index)
                .round()
                .clamp(0.0, max_index) as usize;
            let value = -cursor.y / window.height() * 2.0 + 1.0;
            editor.0.on_drag(index, value);
        }
    } else if buttons.just_released(MouseButton::Left) {
        editor.0.on_release();
    }
}

/// ArrowUp/ArrowDown step the oscillator frequency by one semitone. The
/// slot serializes this against the audio callback, so the wait here is at
/// most one callback long.
fn adjust_frequency(keys: Res<ButtonInput<KeyCode>>, engine: Res<Engine>) {
    let factor = if keys.just_pressed(KeyCode::ArrowUp) {
        SEMITONE
    } else if keys.just_pressed(KeyCode::ArrowDown) {
        1.0 / SEMITONE
    } else {
        return;
    };

    let slot = &engine.0;
    slot.with_engine_mut(|osc| {
        let target = osc.frequency() * factor;
        match osc.set_frequency(target) {
            Ok(()) => info!(
                "frequency: {:.1} Hz at {:.1}s played",
                osc.frequency(),
                slot.playback_time()
            ),
            Err(err) => warn!("keeping old frequency: {err}"),
        }
    });
}

/// Draws the edit buffer as a polyline spanning the window, one segment per
/// adjacent sample pair.
fn render_waveform(
    mut gizmos: Gizmos,
    editor: Res<Editor>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let (width, height) = (window.width(), window.height());
    let samples = editor.0.samples();
    let last = samples.len() - 1;

    let point = |i: usize| {
        let x = i as f32 / last as f32 * width - width / 2.0;
        let y = samples[i] * height / 2.0;
        Vec2::new(x, y)
    };

    let mut prev = point(0);
    for i in 1..=last {
        let next = point(i);
        gizmos.line_2d(prev, next, Color::WHITE);
        prev = next;
    }
}

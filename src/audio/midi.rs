use super::{AudioEvent, AudioSink, StrumDirection};
use crate::error::{Result, TrainerError};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};
use midir::{MidiOutput, MidiOutputConnection};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// General MIDI percussion channel (10, zero-based).
const DRUM_CHANNEL: u8 = 9;
const STRUM_CHANNEL: u8 = 0;
const HI_WOOD_BLOCK: u8 = 76;
const LOW_WOOD_BLOCK: u8 = 77;
const SIDE_STICK: u8 = 37;
const NOTE_LENGTH: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    AllNotesOff { channel: u8 },
}

impl MidiMessage {
    pub fn to_bytes(self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), note, velocity],
            MidiMessage::NoteOff { channel, note } => [0x80 | (channel & 0x0F), note, 0],
            MidiMessage::AllNotesOff { channel } => [0xB0 | (channel & 0x0F), 123, 0],
        }
    }
}

/// Note played for an event: (channel, note, velocity).
fn note_for(event: &AudioEvent) -> (u8, u8, u8) {
    match event {
        AudioEvent::Click { strong: true, .. } => (DRUM_CHANNEL, HI_WOOD_BLOCK, 110),
        AudioEvent::Click { strong: false, .. } => (DRUM_CHANNEL, LOW_WOOD_BLOCK, 80),
        AudioEvent::Strum { direction } => match direction {
            StrumDirection::Down => (STRUM_CHANNEL, 52, 100),
            StrumDirection::Up => (STRUM_CHANNEL, 59, 80),
            StrumDirection::Muted => (STRUM_CHANNEL, 40, 60),
        },
        AudioEvent::CountVoice { number } => {
            let velocity = if *number == 1 { 120 } else { 90 };
            (DRUM_CHANNEL, SIDE_STICK, velocity)
        }
    }
}

fn delay_of(event: &AudioEvent) -> Duration {
    match event {
        AudioEvent::Click { delay, .. } => *delay,
        _ => Duration::ZERO,
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Timed {
    due: Instant,
    seq: u64,
    bytes: [u8; 3],
}

/// Sends audio events to a MIDI output port. Delayed events and note-offs are
/// held by a dedicated sender thread until they fall due.
pub struct MidiDispatcher {
    tx: Sender<Timed>,
    seq: AtomicU64,
}

impl MidiDispatcher {
    /// Connects to the first port whose name contains `device_name`, or to the
    /// first available port.
    pub fn connect(device_name: Option<&str>) -> Result<Self> {
        let connection = connect_output(device_name)?;
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("midi-output".into())
            .spawn(move || run_sender(connection, rx))
            .map_err(|e| TrainerError::Midi(e.to_string()))?;
        Ok(Self {
            tx,
            seq: AtomicU64::new(0),
        })
    }

    fn queue(&self, due: Instant, message: MidiMessage) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let timed = Timed {
            due,
            seq,
            bytes: message.to_bytes(),
        };
        if self.tx.send(timed).is_err() {
            error!("MIDI sender thread has stopped");
        }
    }
}

impl AudioSink for MidiDispatcher {
    fn dispatch(&self, event: AudioEvent) {
        let (channel, note, velocity) = note_for(&event);
        let start = Instant::now() + delay_of(&event);
        self.queue(
            start,
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            },
        );
        self.queue(start + NOTE_LENGTH, MidiMessage::NoteOff { channel, note });
    }
}

impl Drop for MidiDispatcher {
    fn drop(&mut self) {
        for channel in [STRUM_CHANNEL, DRUM_CHANNEL] {
            self.queue(Instant::now(), MidiMessage::AllNotesOff { channel });
        }
    }
}

fn connect_output(device_name: Option<&str>) -> Result<MidiOutputConnection> {
    let midi_out =
        MidiOutput::new("strumtrainer-output").map_err(|e| TrainerError::Midi(e.to_string()))?;
    let ports = midi_out.ports();
    let available: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();
    info!("Available MIDI output ports: {:?}", available);

    let port = match device_name {
        Some(name) => ports.iter().find(|p| {
            midi_out
                .port_name(p)
                .unwrap_or_default()
                .contains(name)
        }),
        None => ports.first(),
    }
    .ok_or_else(|| {
        TrainerError::Midi(match device_name {
            Some(name) => format!("output device '{}' not found", name),
            None => "no MIDI output ports available".to_string(),
        })
    })?;

    let port_name = midi_out.port_name(port).unwrap_or_default();
    info!("Connecting to MIDI output port: {}", port_name);
    midi_out
        .connect(port, "strumtrainer-output-conn")
        .map_err(|e| TrainerError::Midi(e.to_string()))
}

fn run_sender(mut connection: MidiOutputConnection, rx: Receiver<Timed>) {
    info!("MIDI output thread started");
    let mut pending: BinaryHeap<Reverse<Timed>> = BinaryHeap::new();

    loop {
        let now = Instant::now();
        while pending.peek().is_some_and(|Reverse(t)| t.due <= now) {
            if let Some(Reverse(timed)) = pending.pop() {
                debug!("Sending MIDI {:02X?}", timed.bytes);
                if let Err(e) = connection.send(&timed.bytes) {
                    error!("Failed to send MIDI message: {}", e);
                }
            }
        }

        let received = match pending.peek() {
            Some(Reverse(next)) => rx.recv_deadline(next.due),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(timed) => pending.push(Reverse(timed)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Flush what is left (the final all-notes-off) and exit.
                while let Some(Reverse(timed)) = pending.pop() {
                    let _ = connection.send(&timed.bytes);
                }
                break;
            }
        }
    }

    info!("MIDI output thread stopping");
}

/// Names of every MIDI output port.
pub fn list_midi_outputs() -> Result<Vec<String>> {
    let midi_out =
        MidiOutput::new("strumtrainer-port-lister").map_err(|e| TrainerError::Midi(e.to_string()))?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bytes() {
        assert_eq!(
            MidiMessage::NoteOn {
                channel: 9,
                note: 76,
                velocity: 110
            }
            .to_bytes(),
            [0x99, 76, 110]
        );
        assert_eq!(
            MidiMessage::NoteOff { channel: 0, note: 52 }.to_bytes(),
            [0x80, 52, 0]
        );
        assert_eq!(
            MidiMessage::AllNotesOff { channel: 9 }.to_bytes(),
            [0xB9, 123, 0]
        );
    }

    #[test]
    fn test_clicks_use_wood_blocks_by_strength() {
        let strong = AudioEvent::Click {
            strong: true,
            delay: Duration::ZERO,
        };
        let weak = AudioEvent::Click {
            strong: false,
            delay: Duration::from_millis(125),
        };
        assert_eq!(note_for(&strong).1, HI_WOOD_BLOCK);
        assert_eq!(note_for(&weak).1, LOW_WOOD_BLOCK);
        assert_eq!(delay_of(&weak), Duration::from_millis(125));
        assert_eq!(delay_of(&AudioEvent::CountVoice { number: 2 }), Duration::ZERO);
    }

    #[test]
    fn test_timed_messages_order_by_due_time() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(Timed {
            due: now + Duration::from_millis(10),
            seq: 0,
            bytes: [0x90, 1, 1],
        }));
        heap.push(Reverse(Timed {
            due: now,
            seq: 1,
            bytes: [0x90, 2, 1],
        }));
        assert_eq!(heap.pop().unwrap().0.bytes[1], 2);
    }
}

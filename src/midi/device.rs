// MIDI device access - output port enumeration and connection

use midir::MidiOutput;
use thiserror::Error;

use crate::midi::output::MidirSink;

const CLIENT_NAME: &str = "aleator";

/// Errors raised while enumerating or opening MIDI output ports
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI backend initialization failed: {0}")]
    Init(#[from] midir::InitError),

    #[error("failed to read port name: {0}")]
    PortInfo(#[from] midir::PortInfoError),

    #[error("no MIDI output port matches '{0}'")]
    NoMatch(String),

    #[error("connection to '{port}' failed: {message}")]
    Connect { port: String, message: String },
}

/// Names of every available MIDI output port
pub fn list_ports() -> Result<Vec<String>, MidiError> {
    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    let mut names = Vec::new();
    for port in midi_out.ports() {
        names.push(midi_out.port_name(&port)?);
    }
    Ok(names)
}

/// Connect to the first output port whose name contains `wanted`
///
/// Matching is case-insensitive; an empty string matches the first port.
pub fn connect(wanted: &str) -> Result<MidirSink, MidiError> {
    let midi_out = MidiOutput::new(CLIENT_NAME)?;
    let wanted_lower = wanted.to_lowercase();

    let mut target = None;
    for port in midi_out.ports() {
        let name = midi_out.port_name(&port)?;
        if name.to_lowercase().contains(&wanted_lower) {
            target = Some((port, name));
            break;
        }
    }

    let (port, name) = target.ok_or_else(|| MidiError::NoMatch(wanted.to_string()))?;
    log::info!("connecting MIDI output: {name}");
    let connection = midi_out
        .connect(&port, "aleator-out")
        .map_err(|e| MidiError::Connect {
            port: name.clone(),
            message: e.to_string(),
        })?;
    Ok(MidirSink::new(connection, name))
}

//! Where payloads come from.

use std::{
    env, fs,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use log::*;
use serde::Serialize;

use crate::{
    encoding::{Encoding, Payload},
    error::Result,
};

/// Prompt printed before each line of the raw interactive client.
pub const MESSAGE_PROMPT: &str = "Enter message to send to server: ";
/// First prompt of the key/value client.
pub const KEY_PROMPT: &str = "Enter key: ";
/// Second prompt of the key/value client.
pub const VALUE_PROMPT: &str = "Enter value: ";

/// Source of the payloads of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// One line typed by the operator per cycle, sent as a string.
    Prompt,
    /// Two lines per cycle, sent as a `{key, value}` mapping.
    KeyValuePrompt,
    /// A fixed string.
    Literal(String),
    /// A file, parsed according to the active encoding before connecting.
    File(PathBuf),
}

/// The two-field mapping built by [`Source::KeyValuePrompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    /// First prompted line.
    pub key: String,
    /// Second prompted line.
    pub value: String,
}

impl Source {
    /// Whether this source asks the operator for every payload.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Source::Prompt | Source::KeyValuePrompt)
    }

    /// Produce the payload of a one-shot source.
    ///
    /// Returns `None` for interactive sources, see [`Source::prompt`].
    pub fn load(&self, encoding: Encoding) -> Result<Option<Payload>> {
        match self {
            Source::Literal(text) => Ok(Some(Payload::Text(text.clone()))),
            Source::File(path) => load_file(path, encoding).map(Some),
            Source::Prompt | Source::KeyValuePrompt => Ok(None),
        }
    }

    /// Ask the operator for the next payload.
    ///
    /// Returns `None` once `input` is exhausted, or for one-shot sources.
    pub fn prompt<R, W>(&self, input: &mut R, output: &mut W) -> Result<Option<Payload>>
    where
        R: BufRead,
        W: Write,
    {
        match self {
            Source::Prompt => Ok(read_prompt(input, output, MESSAGE_PROMPT)?.map(Payload::Text)),
            Source::KeyValuePrompt => {
                let Some(key) = read_prompt(input, output, KEY_PROMPT)? else {
                    return Ok(None);
                };
                let Some(value) = read_prompt(input, output, VALUE_PROMPT)? else {
                    return Ok(None);
                };
                Ok(Some(Payload::document(&KeyValue { key, value })?))
            }
            Source::Literal(_) | Source::File(_) => Ok(None),
        }
    }
}

/// Resolve `path` against the current working directory.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Read and parse a payload file.
///
/// Raw files are sent verbatim; JSON and YAML files must hold one well-formed document.
pub fn load_file(path: &Path, encoding: Encoding) -> Result<Payload> {
    let path = absolute_path(path)?;
    debug!("Loading {} payload from {}", encoding.label(), path.display());
    let contents = fs::read_to_string(&path)?;
    let payload = match encoding {
        Encoding::Raw => Payload::Text(contents),
        Encoding::Json => serde_json::from_str::<serde_yaml::Value>(&contents)?.into(),
        Encoding::Yaml => serde_yaml::from_str::<serde_yaml::Value>(&contents)?.into(),
    };
    Ok(payload)
}

/// Print `prompt`, then read one line without its line terminator.
fn read_prompt<R, W>(input: &mut R, output: &mut W, prompt: &str) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    output.write_all(prompt.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        debug!("Input exhausted");
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

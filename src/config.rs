//! Run configuration and the command line that builds it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::{
    client::parse_url,
    encoding::Encoding,
    error::Result,
    source::Source,
};

/// Echo server the client talks to unless told otherwise.
pub const DEFAULT_URI: &str = "ws://localhost:8080";
/// Payload file of `send-json`.
pub const DEFAULT_JSON_FILE: &str = "example.json";
/// Payload file of `send-yaml`.
pub const DEFAULT_YAML_FILE: &str = "example.yaml";
/// Message of `hello`.
pub const HELLO_MESSAGE: &str = "Hello, Server!";

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Peer to connect to.
    pub url: Url,
    /// How payloads are serialized and replies parsed.
    pub encoding: Encoding,
    /// Where payloads come from.
    pub source: Source,
    /// Whether a one-shot run waits for and prints one reply. Interactive runs always do.
    pub expect_reply: bool,
}

impl ClientConfig {
    /// Create a configuration, checking `uri` up front.
    ///
    /// Interactive sources and literals wait for a reply, files do not.
    pub fn new(uri: &str, encoding: Encoding, source: Source) -> Result<Self> {
        let expect_reply = !matches!(source, Source::File(_));
        Ok(ClientConfig { url: parse_url(uri)?, encoding, source, expect_reply })
    }

    /// Set [`Self::expect_reply`].
    pub fn expect_reply(mut self, expect_reply: bool) -> Self {
        self.expect_reply = expect_reply;
        self
    }

    /// Interactive raw text client.
    pub fn chat(uri: &str) -> Result<Self> {
        Self::new(uri, Encoding::Raw, Source::Prompt)
    }

    /// Interactive key/value client speaking YAML.
    pub fn chat_yaml(uri: &str) -> Result<Self> {
        Self::new(uri, Encoding::Yaml, Source::KeyValuePrompt)
    }

    /// Send one literal string and print the reply.
    pub fn hello(uri: &str, message: impl Into<String>) -> Result<Self> {
        Self::new(uri, Encoding::Raw, Source::Literal(message.into()))
    }

    /// Send a JSON file.
    pub fn send_json(uri: &str, path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(uri, Encoding::Json, Source::File(path.into()))
    }

    /// Send a YAML file.
    pub fn send_yaml(uri: &str, path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(uri, Encoding::Yaml, Source::File(path.into()))
    }
}

/// Manual test client for websocket echo servers.
#[derive(Parser, Debug)]
#[command(name = "ws-echo", version, about)]
pub struct Cli {
    /// Client variant to run
    #[command(subcommand)]
    pub command: Command,

    /// Websocket URI of the echo server
    #[arg(long, global = true, env = "WS_ECHO_URI", default_value = DEFAULT_URI)]
    pub uri: String,
}

/// The client variants.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Prompt for messages, send each one and print the echo
    Chat,
    /// Prompt for a key and a value, send them as a YAML mapping and print the decoded echo
    ChatYaml,
    /// Send one message and print the reply
    Hello {
        /// Message to send
        #[arg(default_value = HELLO_MESSAGE)]
        message: String,
    },
    /// Send a JSON file
    SendJson(FileArgs),
    /// Send a YAML file
    SendYaml(FileArgs),
}

/// Arguments shared by the file senders.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FileArgs {
    /// Payload file, relative to the current directory
    pub file: Option<PathBuf>,

    /// Wait for one reply and print it
    #[arg(long)]
    pub expect_reply: bool,
}

impl Cli {
    /// Build the run configuration.
    pub fn into_config(self) -> Result<ClientConfig> {
        let uri = self.uri.as_str();
        match self.command {
            Command::Chat => ClientConfig::chat(uri),
            Command::ChatYaml => ClientConfig::chat_yaml(uri),
            Command::Hello { message } => ClientConfig::hello(uri, message),
            Command::SendJson(args) => Ok(ClientConfig::send_json(
                uri,
                args.file.unwrap_or_else(|| DEFAULT_JSON_FILE.into()),
            )?
            .expect_reply(args.expect_reply)),
            Command::SendYaml(args) => Ok(ClientConfig::send_yaml(
                uri,
                args.file.unwrap_or_else(|| DEFAULT_YAML_FILE.into()),
            )?
            .expect_reply(args.expect_reply)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UrlError};

    fn parse(args: &[&str]) -> Result<ClientConfig> {
        let args = std::iter::once("ws-echo").chain(args.iter().copied());
        Cli::try_parse_from(args).unwrap().into_config()
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_defaults() {
        let config = parse(&["--uri", DEFAULT_URI, "chat"]).unwrap();
        assert_eq!(config.url.as_str(), "ws://localhost:8080/");
        assert_eq!(config.encoding, Encoding::Raw);
        assert_eq!(config.source, Source::Prompt);
        assert!(config.expect_reply);
    }

    #[test]
    fn chat_yaml_uses_key_value_prompts() {
        let config = parse(&["--uri", DEFAULT_URI, "chat-yaml"]).unwrap();
        assert_eq!(config.encoding, Encoding::Yaml);
        assert_eq!(config.source, Source::KeyValuePrompt);
    }

    #[test]
    fn hello_sends_the_literal() {
        let config = parse(&["hello", "--uri", "ws://127.0.0.1:9001"]).unwrap();
        assert_eq!(config.source, Source::Literal(HELLO_MESSAGE.into()));
        assert_eq!(config.url.port(), Some(9001));
        assert!(config.expect_reply);

        let config = parse(&["--uri", DEFAULT_URI, "hello", "ping"]).unwrap();
        assert_eq!(config.source, Source::Literal("ping".into()));
    }

    #[test]
    fn file_senders_default_to_example_files() {
        let config = parse(&["--uri", DEFAULT_URI, "send-json"]).unwrap();
        assert_eq!(config.encoding, Encoding::Json);
        assert_eq!(config.source, Source::File(DEFAULT_JSON_FILE.into()));
        assert!(!config.expect_reply);

        let config =
            parse(&["--uri", DEFAULT_URI, "send-yaml", "other.yaml", "--expect-reply"]).unwrap();
        assert_eq!(config.encoding, Encoding::Yaml);
        assert_eq!(config.source, Source::File("other.yaml".into()));
        assert!(config.expect_reply);
    }

    #[test]
    fn bad_uri_is_rejected_before_connecting() {
        assert!(matches!(
            parse(&["--uri", "http://localhost:8080", "chat"]),
            Err(Error::Url(UrlError::UnsupportedUrlScheme(_)))
        ));
    }
}

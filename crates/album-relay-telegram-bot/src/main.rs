use album_relay_transport_telegram::config::BotSettings;
use album_relay_transport_telegram::runner::run_relay;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    token_prefixed: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(
                r"(https?://[^/]+/(?:file/)?bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)",
            )?,
            token_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            token_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let output = self
            .token_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3");
        let output = self
            .token_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]");
        self.token_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length; the redacted text may differ in size.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // Patterns must exist before the first log line
    let patterns = match RedactionPatterns::new() {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Failed to compile regex patterns: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(patterns);

    info!("Starting Album Relay...");

    let Some(settings) = init_settings() else {
        return ExitCode::FAILURE;
    };

    match run_relay(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Relay exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "album_relay_core=info,album_relay_transport_telegram=info,album_relay=info,teloxide=warn,hyper=warn,reqwest=warn",
            )
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Option<Arc<BotSettings>> {
    match BotSettings::load() {
        Ok(settings) => {
            info!("Configuration loaded successfully.");
            Some(Arc::new(settings))
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> RedactionPatterns {
        RedactionPatterns::new().unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_redacts_token_in_api_url() {
        let line = "error sending request for url (https://api.telegram.org/bot123456789:AAF-abcdefghijklmnopqrstuvwxyz0123456/GetFile)";
        let redacted = patterns().redact(line);
        assert!(!redacted.contains("AAF-abcdefghijklmnopqrstuvwxyz0123456"));
        assert!(redacted.contains("[TELEGRAM_TOKEN]"));
    }

    #[test]
    fn test_redacts_token_in_file_url() {
        let line = "https://api.telegram.org/file/bot123456789:AAF-abcdefghijklmnopqrstuvwxyz0123456/photos/file_1.jpg";
        let redacted = patterns().redact(line);
        assert!(!redacted.contains("AAF-abcdefghijklmnopqrstuvwxyz0123456"));
    }

    #[test]
    fn test_leaves_plain_text_alone() {
        let line = "Album sent group_id=13579 count=3";
        assert_eq!(patterns().redact(line), line);
    }

    #[test]
    fn test_writer_reports_original_length() -> io::Result<()> {
        let mut writer = RedactingWriter::new(Vec::new(), Arc::new(patterns()));
        let input = b"token bot123456789:secretsecret done";
        assert_eq!(writer.write(input)?, input.len());
        let written = String::from_utf8_lossy(&writer.inner).into_owned();
        assert_eq!(written, "token bot123456789:[TELEGRAM_TOKEN] done");
        Ok(())
    }
}

//! Report email construction and delivery.
//!
//! [`EmailMessage`] validates its headers and renders itself as a
//! `multipart/mixed` MIME document. Delivery goes through a
//! [`MailDispatcher`]: either an outbox directory of `.eml` files or a
//! sendmail-compatible program.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use base64::prelude::*;
use chrono::{DateTime, Utc};
use sales_core::error::{ReportError, Result};
use tracing::{debug, info};

// ── EmailMessage ──────────────────────────────────────────────────────────────

/// A plain-text email with an optional file attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
}

impl EmailMessage {
    /// Build a message, rejecting addresses and subjects that are malformed
    /// or could smuggle extra headers.
    pub fn generate(
        sender: &str,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<Self> {
        validate_address(sender)?;
        validate_address(recipient)?;
        if subject.contains(['\r', '\n']) {
            return Err(ReportError::Config(
                "email subject must be a single line".to_string(),
            ));
        }

        Ok(Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment: attachment.map(Path::to_path_buf),
        })
    }

    /// Render the full RFC 5322 message, reading the attachment from disk.
    pub fn to_mime(&self) -> Result<String> {
        let now = Utc::now();
        let boundary = format!(
            "sales-report-{}",
            now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp())
        );
        self.to_mime_with(now, &boundary)
    }

    /// Render with a fixed date and boundary.
    pub fn to_mime_with(&self, date: DateTime<Utc>, boundary: &str) -> Result<String> {
        let mut lines: Vec<String> = vec![
            format!("From: {}", self.sender),
            format!("To: {}", self.recipient),
            format!("Subject: {}", encode_header(&self.subject)),
            format!("Date: {}", date.to_rfc2822()),
            "MIME-Version: 1.0".to_string(),
            format!("Content-Type: multipart/mixed; boundary=\"{boundary}\""),
            String::new(),
            format!("--{boundary}"),
            "Content-Type: text/plain; charset=utf-8".to_string(),
            "Content-Transfer-Encoding: 8bit".to_string(),
            String::new(),
        ];
        lines.extend(self.body.lines().map(String::from));

        if let Some(path) = &self.attachment {
            let contents = std::fs::read(path).map_err(|source| ReportError::FileRead {
                path: path.clone(),
                source,
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().replace('"', ""))
                .unwrap_or_else(|| "report".to_string());

            lines.push(format!("--{boundary}"));
            lines.push(format!("Content-Type: {}", content_type_for(path)));
            lines.push("Content-Transfer-Encoding: base64".to_string());
            lines.push(format!(
                "Content-Disposition: attachment; filename=\"{filename}\""
            ));
            lines.push(String::new());
            lines.extend(base64_lines(&contents));
        }

        lines.push(format!("--{boundary}--"));

        let mut message = lines.join("\r\n");
        message.push_str("\r\n");
        Ok(message)
    }
}

// ── MailDispatcher ────────────────────────────────────────────────────────────

/// Delivers a finished [`EmailMessage`].
pub trait MailDispatcher {
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Writes each message as an `.eml` file into a directory.
#[derive(Debug, Clone)]
pub struct OutboxDispatcher {
    dir: PathBuf,
}

impl OutboxDispatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `message` and return the path of the new `.eml` file.
    pub fn deliver(&self, message: &EmailMessage) -> Result<PathBuf> {
        let mime = message.to_mime()?;
        std::fs::create_dir_all(&self.dir).map_err(|source| ReportError::FileWrite {
            path: self.dir.clone(),
            source,
        })?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ").to_string();
        self.write_new(&stamp, mime.as_bytes())
    }

    /// Create `<stamp>.eml`, or `<stamp>-<n>.eml` for the first free `n`.
    /// The file is opened with `create_new`, so concurrent writers never
    /// share a name.
    fn write_new(&self, stamp: &str, contents: &[u8]) -> Result<PathBuf> {
        let mut n = 0u32;
        loop {
            let path = if n == 0 {
                self.dir.join(format!("{stamp}.eml"))
            } else {
                self.dir.join(format!("{stamp}-{n}.eml"))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents)
                        .map_err(|source| ReportError::FileWrite {
                            path: path.clone(),
                            source,
                        })?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(source) => return Err(ReportError::FileWrite { path, source }),
            }
        }
    }
}

impl MailDispatcher for OutboxDispatcher {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let path = self.deliver(message)?;
        info!(
            "Queued email to {} in {}",
            message.recipient,
            path.display()
        );
        Ok(())
    }
}

/// Pipes each message into a sendmail-compatible program.
#[derive(Debug, Clone)]
pub struct SendmailDispatcher {
    program: PathBuf,
    args: Vec<String>,
}

impl SendmailDispatcher {
    /// Run `program -t -oi`, taking recipients from the message headers.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["-t".to_string(), "-oi".to_string()],
        }
    }

    /// Replace the default `-t -oi` arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl MailDispatcher for SendmailDispatcher {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let mime = message.to_mime()?;
        debug!("Spawning {} for delivery", self.program.display());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReportError::MailDelivery(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(mime.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ReportError::MailDelivery(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("Sent email to {}", message.recipient);
        Ok(())
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn validate_address(address: &str) -> Result<()> {
    let invalid = || ReportError::InvalidAddress(address.to_string());

    if address
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | ',' | ';' | '"'))
    {
        return Err(invalid());
    }
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(invalid()),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("pdf") => "application/pdf",
        Some("txt") | Some("text") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Base64 body split into 76-character lines (RFC 2045).
fn base64_lines(contents: &[u8]) -> Vec<String> {
    let encoded = BASE64_STANDARD.encode(contents);
    encoded
        .as_bytes()
        .chunks(76)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// RFC 2047 Q-encoding for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    let mut encoded = String::from("=?UTF-8?Q?");
    for byte in value.bytes() {
        match byte {
            b' ' => encoded.push('_'),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'!' | b'*' | b'+' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("={byte:02X}")),
        }
    }
    encoded.push_str("?=");
    encoded
}

// ── Tests ─────────────────────────────────────────────────────────────────────

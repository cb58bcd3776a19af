//! Probe outcome classification
//!
//! Classification is a total function over the transport result: the
//! dispatcher pattern-matches on the variant, nothing crosses the
//! concurrency boundary as an error.

use serde::Serialize;

/// Classified result of one probe attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// An HTTP response was received (any status code)
    Success { status_code: u16 },

    /// The request did not complete within the probe timeout
    Timeout,

    /// The target was unreachable or refused the connection
    ConnectionError,

    /// TLS handshake or certificate verification failed
    TlsError,

    /// Any other transport failure
    Unknown { detail: String },
}

impl OutcomeKind {
    /// Classify a transport error, in priority order:
    /// timeout, TLS, connection, unknown.
    ///
    /// TLS is checked before connection errors because reqwest reports
    /// certificate failures as connect errors; the TLS cause sits further
    /// down the source chain.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return OutcomeKind::Timeout;
        }
        if is_tls_error(err) {
            return OutcomeKind::TlsError;
        }
        if err.is_connect() {
            return OutcomeKind::ConnectionError;
        }
        OutcomeKind::Unknown {
            detail: err.to_string(),
        }
    }

    /// A probe is successful iff it received a 2xx response.
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeKind::Success { status_code } if (200..300).contains(status_code))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            OutcomeKind::Success { status_code } => Some(*status_code),
            _ => None,
        }
    }

    /// Error classification text, present iff no status code is
    pub fn error_message(&self) -> Option<String> {
        match self {
            OutcomeKind::Success { .. } => None,
            OutcomeKind::Timeout => Some("Request timeout".to_string()),
            OutcomeKind::ConnectionError => Some("Connection error".to_string()),
            OutcomeKind::TlsError => Some("SSL certificate error".to_string()),
            OutcomeKind::Unknown { detail } => Some(format!("Unknown error: {detail}")),
        }
    }
}

fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        let msg = e.to_string().to_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
            return true;
        }
        source = e.source();
    }
    false
}

/// One completed probe, ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub target_id: i64,
    pub url: String,
    pub kind: OutcomeKind,

    /// Elapsed wall time in milliseconds, measured regardless of outcome
    pub response_time_ms: f64,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        self.kind.is_success()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.kind.status_code()
    }

    pub fn error_message(&self) -> Option<String> {
        self.kind.error_message()
    }
}

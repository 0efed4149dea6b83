use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error raised by an injected page fetcher.
///
/// The paging core propagates it unchanged and never caches a failed
/// fetch, so the caller may simply retry the access that triggered it.
/// The source is reference-counted so the error stays cheap to clone
/// across retries and wrapper layers.
#[derive(Debug, Clone)]
pub struct FetchError {
    message: String,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_source() {
        let plain = FetchError::new("connection reset");
        assert_eq!(plain.to_string(), "connection reset");
        assert!(plain.source().is_none());

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let wrapped = FetchError::with_source("page 3 unavailable", io);
        assert_eq!(wrapped.to_string(), "page 3 unavailable");
        assert!(wrapped.source().is_some());
    }
}

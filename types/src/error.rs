use std::backtrace::BacktraceStatus;
use std::fmt;

use dioxus::prelude::ServerFnError;
use serde_json::json;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error carrying its cause chain and the HTTP status it should surface as.
///
/// Anything implementing `std::error::Error` converts with `?`. Ad-hoc
/// errors are built with [`err!`](crate::err).
pub struct Error {
    inner: anyhow::Error,
    status: u16,
}

impl Error {
    pub fn new(inner: anyhow::Error) -> Self {
        Self { inner, status: 500 }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Wrap with extra context, keeping the status.
    pub fn context<C>(self, context: C) -> Self
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        Self {
            inner: self.inner.context(context),
            status: self.status,
        }
    }

    pub fn unauthorized(message: impl fmt::Display) -> Self {
        Self::new(anyhow::anyhow!("{message}")).with_status(401)
    }

    pub fn forbidden(message: impl fmt::Display) -> Self {
        Self::new(anyhow::anyhow!("{message}")).with_status(403)
    }

    pub fn bad_request(message: impl fmt::Display) -> Self {
        Self::new(anyhow::anyhow!("{message}")).with_status(400)
    }

    pub fn not_found(message: impl fmt::Display) -> Self {
        Self::new(anyhow::anyhow!("{message}")).with_status(404)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Messages from the outermost error down to the root cause.
    pub fn chain(&self) -> Vec<String> {
        self.inner.chain().map(|e| e.to_string()).collect()
    }

    fn backtrace(&self) -> Option<String> {
        let backtrace = self.inner.backtrace();
        (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string())
    }
}

impl<E> From<E> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl From<Error> for ServerFnError {
    fn from(error: Error) -> Self {
        let mut details = json!({ "chain": error.chain() });
        if let Some(backtrace) = error.backtrace() {
            details["backtrace"] = backtrace.into();
        }

        ServerFnError::ServerError {
            message: error.inner.to_string(),
            code: error.status,
            details: Some(details),
        }
    }
}

#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::new($crate::internal_anyhow_dont_use!($($arg)*))
    };
}

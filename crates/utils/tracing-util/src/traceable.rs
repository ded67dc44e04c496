use std::convert::Infallible;
use std::fmt;

/// Who may see the details of an error recorded on a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorVisibility {
    /// Details stay in internal attributes; user-visible spans only say "Internal error".
    Internal,
    User,
}

pub trait TraceableError: fmt::Display + fmt::Debug {
    fn visibility(&self) -> ErrorVisibility;

    fn description(&self) -> String {
        self.to_string()
    }

    fn details(&self) -> String {
        format!("{self:?}")
    }
}

impl TraceableError for Infallible {
    fn visibility(&self) -> ErrorVisibility {
        match *self {}
    }
}

/// A span result that may carry an error to record on the span.
///
/// Use [`Successful`] for operations that cannot fail.
pub trait Traceable {
    type ErrorType<'a>: TraceableError
    where
        Self: 'a;

    fn get_error(&self) -> Option<Self::ErrorType<'_>>;
}

/// Wraps a value that is always recorded as a success.
#[derive(Debug)]
pub struct Successful<T>(T);

impl<T> Successful<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Traceable for Successful<T> {
    type ErrorType<'a>
        = Infallible
    where
        Self: 'a;

    fn get_error(&self) -> Option<Infallible> {
        None
    }
}

/// Borrowed error of a `Result`, used as the [`Traceable::ErrorType`] of `Result`.
#[derive(Debug)]
pub struct BorrowedError<'e, E>(&'e E);

impl<E: fmt::Display> fmt::Display for BorrowedError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<E: TraceableError> TraceableError for BorrowedError<'_, E> {
    fn visibility(&self) -> ErrorVisibility {
        self.0.visibility()
    }

    fn details(&self) -> String {
        self.0.details()
    }
}

impl<T, E: TraceableError> Traceable for Result<T, E> {
    type ErrorType<'a>
        = BorrowedError<'a, E>
    where
        T: 'a,
        E: 'a;

    fn get_error(&self) -> Option<BorrowedError<'_, E>> {
        self.as_ref().err().map(BorrowedError)
    }
}

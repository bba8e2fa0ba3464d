use core::fmt;

/// MTS4x driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// bus write or read failed
    Transport(E),
    /// the bus delivered fewer bytes than requested
    IncompleteRead { expected: usize, received: usize },
    /// argument outside its documented range, e.g. user register index > 9
    InvalidParameter,
    /// a busy bit did not clear before the deadline
    Timeout,
    /// checksum mismatch
    Integrity,
}

/// error classification without the bus error payload, kept by the driver as `last_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    IncompleteRead,
    InvalidParameter,
    Timeout,
    Integrity,
}

impl<E> Error<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::IncompleteRead { .. } => ErrorKind::IncompleteRead,
            Error::InvalidParameter => ErrorKind::InvalidParameter,
            Error::Timeout => ErrorKind::Timeout,
            Error::Integrity => ErrorKind::Integrity,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "bus transfer failed: {:?}", e),
            Error::IncompleteRead { expected, received } => {
                write!(f, "short read: expected {} bytes, received {}", expected, received)
            }
            Error::InvalidParameter => f.write_str("parameter out of range"),
            Error::Timeout => f.write_str("timed out waiting for the device"),
            Error::Integrity => f.write_str("checksum mismatch"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::IncompleteRead => "incomplete read",
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Integrity => "integrity",
        };
        f.write_str(name)
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

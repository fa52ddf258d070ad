use anyhow::Error;
use std::io;

use super::error::DamconError;

/// Returns `true` if any error in the chain is a broken pipe, e.g. when
/// output is piped into `head`.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    err.chain().any(|cause| {
        let io_err = match cause.downcast_ref::<DamconError>() {
            Some(DamconError::Io(inner)) => Some(inner),
            _ => cause.downcast_ref::<io::Error>(),
        };
        io_err.map_or(false, |e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_pipe() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "closed")
    }

    #[test]
    fn detects_broken_pipe() {
        assert!(is_broken_pipe(&Error::new(broken_pipe())));
        let wrapped = Error::new(DamconError::from(broken_pipe())).context("writing FASTA");
        assert!(is_broken_pipe(&wrapped));
    }

    #[test]
    fn ignores_other_errors() {
        let err = Error::new(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(!is_broken_pipe(&err));
        assert!(!is_broken_pipe(&Error::msg("plain message")));
        assert!(!is_broken_pipe(&Error::new(DamconError::Config("x".into()))));
    }
}

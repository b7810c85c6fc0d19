//! Transport error type

use core::fmt;

/// Errors returned by transport and discovery operations
///
/// The bus is always left stopped before one of these is returned, so
/// every failure is recoverable with `release` and a fresh `init`/`wake`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Bus index outside the registry, non-I2C interface, or no adapter bound
    BusNotAvailable,
    /// Device did not acknowledge a write (send, idle, sleep)
    TxTimeout,
    /// Device did not acknowledge its read address
    CommFail,
    /// Declared frame length below the minimum response size
    InvalidSize,
    /// Declared frame length exceeds the receive capacity
    BufferTooSmall,
    /// No presence acknowledgement after the wake pulse
    Timeout,
    /// Wake frame did not match the wake token
    WakeFailed,
    /// Device reported a failed power-on self test while waking
    SelfTestFailed,
    /// Response checksum mismatch
    BadCrc,
}

impl TransportError {
    /// Whether a fresh receive attempt may clear this error
    ///
    /// Only an unacknowledged read address is transient: the device is
    /// still executing and not ready to answer yet.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::CommFail)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TransportError::BusNotAvailable => "bus not available",
            TransportError::TxTimeout => "write not acknowledged",
            TransportError::CommFail => "read address not acknowledged",
            TransportError::InvalidSize => "response shorter than minimum frame",
            TransportError::BufferTooSmall => "response larger than receive buffer",
            TransportError::Timeout => "no presence ack after wake",
            TransportError::WakeFailed => "unexpected wake token",
            TransportError::SelfTestFailed => "device self test failed",
            TransportError::BadCrc => "response checksum mismatch",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_comm_fail_retries() {
        assert!(TransportError::CommFail.is_retryable());
        assert!(!TransportError::InvalidSize.is_retryable());
        assert!(!TransportError::BufferTooSmall.is_retryable());
        assert!(!TransportError::TxTimeout.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            std::format!("{}", TransportError::BufferTooSmall),
            "response larger than receive buffer"
        );
    }
}

use com::ComError;
use std::error::Error;

#[test]
fn test_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
    let err: ComError = io_err.into();
    assert!(matches!(err, ComError::Io(_)));
    assert!(err.to_string().contains("io error"));
}

#[test]
fn test_display_connection_closed() {
    assert_eq!(ComError::ConnectionClosed.to_string(), "connection closed");
}

#[test]
fn test_display_message_too_large() {
    let err = ComError::MessageTooLarge(20_000_000);
    assert_eq!(err.to_string(), "message too large: 20000000 bytes");
}

#[test]
fn test_only_oversize_is_recoverable() {
    assert!(ComError::MessageTooLarge(1).is_recoverable());
    assert!(!ComError::ConnectionClosed.is_recoverable());
    assert!(!ComError::PayloadRejected { len: 9, max: 4 }.is_recoverable());
}

#[test]
fn test_display_payload_rejected() {
    let err = ComError::PayloadRejected { len: 9000, max: 4096 };
    assert_eq!(
        err.to_string(),
        "payload of 9000 bytes exceeds the transport limit of 4096"
    );
}

#[test]
fn test_error_trait() {
    let err: Box<dyn Error> = Box::new(ComError::ConnectionClosed);
    assert!(err.source().is_none());
}

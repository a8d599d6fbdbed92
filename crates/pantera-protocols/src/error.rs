//! UI tree access errors.

use thiserror::Error;

/// Errors raised by the host while reading or acting on a UI node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The handle outlived the UI state it was obtained from.
    #[error("Node handle is stale (tree changed since it was obtained)")]
    Stale,

    /// The node has been recycled by the host.
    #[error("Node was recycled: {0}")]
    Recycled(String),

    /// Child index outside the node's child range.
    #[error("Child index {index} out of range (child count {count})")]
    ChildOutOfRange { index: usize, count: usize },

    /// Any other host-side failure.
    #[error("Host error: {0}")]
    Host(String),
}

impl NodeError {
    /// Whether the error means the node disappeared from under us.
    pub fn is_invalidation(&self) -> bool {
        matches!(self, NodeError::Stale | NodeError::Recycled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_error_display() {
        let err = NodeError::Stale;
        assert!(err.to_string().contains("stale"));
        assert!(err.is_invalidation());
    }

    #[test]
    fn test_recycled_error_display() {
        let err = NodeError::Recycled("node 7".to_string());
        assert!(err.to_string().contains("node 7"));
        assert!(err.is_invalidation());
    }

    #[test]
    fn test_child_out_of_range_display() {
        let err = NodeError::ChildOutOfRange { index: 4, count: 2 };
        let msg = err.to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
        assert!(!err.is_invalidation());
    }

    #[test]
    fn test_host_error_display() {
        let err = NodeError::Host("binder died".to_string());
        assert!(err.to_string().contains("binder died"));
        assert!(!err.is_invalidation());
    }
}

use std::fmt;

/// Persisted state of a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Waiting for delivery
    Ready,
    /// Delivered, waiting for `ack` or `nack`
    Unacked,
    /// Nacked without retry while dead letters are enabled (terminal)
    Returned,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Ready, Status::Unacked, Status::Returned];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Ready => "ready",
            Status::Unacked => "unacked",
            Status::Returned => "returned",
        }
    }

    /// Name of the bucket holding this status for queue `queue`
    pub fn bucket_name(&self, queue: &str) -> String {
        format!("{}_{}", queue, self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

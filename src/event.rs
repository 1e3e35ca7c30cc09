use std::fmt;

/// A single kernel-level observation delivered by the event source.
///
/// Timestamps are monotonic nanoseconds from an arbitrary epoch and are only
/// comparable within a single run. The wire representation is internally
/// tagged JSON, e.g. `{"type":"switch_in","pid":42,"ts":100}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelEvent {
    /// The process was scheduled off of a CPU.
    SwitchOut { pid: u32, ts: u64 },
    /// The process was scheduled onto a CPU.
    SwitchIn { pid: u32, ts: u64 },
    /// A new process was forked.
    ProcessCreated { parent_pid: u32, child_pid: u32 },
    /// The process exited.
    ProcessExited { pid: u32 },
    /// A packet was received on behalf of the process.
    PacketReceived { pid: u32, len: u32 },
    /// A packet was transmitted on behalf of the process.
    PacketTransmitted { pid: u32, len: u32 },
    /// A socket owned by the process changed state.
    SocketStateChanged { pid: u32 },
}

impl KernelEvent {
    /// Returns the process identifier whose record this event affects.
    ///
    /// For creation events this is the child, not the parent.
    pub fn pid(&self) -> u32 {
        match *self {
            Self::SwitchOut { pid, .. }
            | Self::SwitchIn { pid, .. }
            | Self::ProcessExited { pid }
            | Self::PacketReceived { pid, .. }
            | Self::PacketTransmitted { pid, .. }
            | Self::SocketStateChanged { pid } => pid,
            Self::ProcessCreated { child_pid, .. } => child_pid,
        }
    }

    /// Returns the wire-level tag of this event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SwitchOut { .. } => "switch_out",
            Self::SwitchIn { .. } => "switch_in",
            Self::ProcessCreated { .. } => "process_created",
            Self::ProcessExited { .. } => "process_exited",
            Self::PacketReceived { .. } => "packet_received",
            Self::PacketTransmitted { .. } => "packet_transmitted",
            Self::SocketStateChanged { .. } => "socket_state_changed",
        }
    }
}

impl fmt::Display for KernelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

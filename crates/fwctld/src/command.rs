//! Operator command grammar.
//!
//! A line of whitespace-separated tokens is parsed once into a tagged
//! [`Command`] variant, then dispatched by exhaustive matching. Anything
//! that does not match the grammar parses to [`Command::Unknown`]; the
//! loop never terminates on bad input.

use p4fw_types::DeviceId;

/// A parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `accept` — install accept edges for every topology pair.
    AcceptAll,
    /// `drop` — revoke all accepts and default-drop every switch.
    DropAll,
    /// `drop <src> <dst>` — revoke one accept edge.
    DropEdge {
        /// Source switch id.
        src: DeviceId,
        /// Destination switch id.
        dst: DeviceId,
    },
    /// Anything else; ignored with a diagnostic.
    Unknown,
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Command {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["accept"] => Command::AcceptAll,
            ["drop"] => Command::DropAll,
            ["drop", src, dst] => match (src.parse(), dst.parse()) {
                (Ok(src), Ok(dst)) => Command::DropEdge { src, dst },
                _ => Command::Unknown,
            },
            _ => Command::Unknown,
        }
    }
}

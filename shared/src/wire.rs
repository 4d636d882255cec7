use thiserror::Error;

use crate::datagram::Datagram;

/// A u16 message type code that no `MsgType` maps to
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown message type {0}")]
pub struct UnknownMsgType(pub u16);

/// Message type codes leading every session datagram.
///
/// The numbers are pinned for wire compatibility and live in a different
/// space from field ids; a datagram is `[msg_type: u16]` followed by the
/// body for that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MsgType {
    /// `[doId u32][fieldId u16][packed args]`, either direction
    ObjectUpdateField = 24,
    /// `[doId u32]`, server to client
    ObjectDisable = 25,
    /// `[doId u32]`, server to client
    ObjectDelete = 27,
    /// `[primary u32][extraCount u16][extra u32 ...]`, client to server
    SetZone = 29,
    /// `[zone u32][classId u16][doId u32][required args]`, server to client
    CreateObjectRequired = 34,
    /// Same body plus trailing `[fieldId u16][args]` pairs for ram fields
    CreateObjectRequiredOther = 35,
    /// Empty body, either direction
    Disconnect = 37,
    /// `[primary u32]`, server to client
    SetZoneDone = 48,
    /// Empty body, client to server
    Heartbeat = 52,
    /// `[base u32][size u32]`, server to client
    SetDoidRange = 61,
}

impl MsgType {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for MsgType {
    type Error = UnknownMsgType;

    fn try_from(code: u16) -> Result<Self, UnknownMsgType> {
        match code {
            24 => Ok(Self::ObjectUpdateField),
            25 => Ok(Self::ObjectDisable),
            27 => Ok(Self::ObjectDelete),
            29 => Ok(Self::SetZone),
            34 => Ok(Self::CreateObjectRequired),
            35 => Ok(Self::CreateObjectRequiredOther),
            37 => Ok(Self::Disconnect),
            48 => Ok(Self::SetZoneDone),
            52 => Ok(Self::Heartbeat),
            61 => Ok(Self::SetDoidRange),
            other => Err(UnknownMsgType(other)),
        }
    }
}

/// Starts a session datagram with its message type code.
pub fn begin_message(msg: MsgType) -> Datagram {
    let mut dg = Datagram::new();
    dg.add_uint16(msg.as_u16());
    dg
}

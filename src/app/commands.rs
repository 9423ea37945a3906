//! Inbound command codes.
//!
//! One byte selects the command; the payload layout depends on it. Codes
//! 0, 2–4 and 10–14 are reserved by deployed clients and ignored here.

use core::fmt;

/// Outcome byte of an identity command reply that carries no firmware result.
pub const NO_OUTCOME: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Answer with the identity/status payload.
    Discover = 1,
    /// `[config_type][...]`: type 0 = all identity fields, else a sub-command.
    SetConfiguration = 5,
    SetDeviceName = 6,
    SetNetwork = 7,
    /// Blank the network credentials so the device self-hosts.
    ForceSelfHosting = 8,
    SetDeviceLocation = 9,
    GetCapability = 15,
    SetCapability = 16,
    GetAllCapabilities = 17,
    SetAllCapabilities = 18,
    FirmwareUpdate = 19,
}

impl Command {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Commands that edit identity/network fields and persist them.
    pub const fn is_identity(self) -> bool {
        matches!(
            self,
            Self::SetDeviceName
                | Self::SetNetwork
                | Self::ForceSelfHosting
                | Self::SetDeviceLocation
                | Self::FirmwareUpdate
        )
    }
}

impl TryFrom<u8> for Command {
    type Error = UnknownCommand;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Self::Discover,
            5 => Self::SetConfiguration,
            6 => Self::SetDeviceName,
            7 => Self::SetNetwork,
            8 => Self::ForceSelfHosting,
            9 => Self::SetDeviceLocation,
            15 => Self::GetCapability,
            16 => Self::SetCapability,
            17 => Self::GetAllCapabilities,
            18 => Self::SetAllCapabilities,
            19 => Self::FirmwareUpdate,
            other => return Err(UnknownCommand(other)),
        })
    }
}

/// A command byte with no handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand(pub u8);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command code {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkInterface {
    Cellular,
    Wifi,
    Mesh,
    Ethernet,
}

impl NetworkInterface {
    pub const COUNT: usize = 4;

    pub const fn index(self) -> usize {
        match self {
            Self::Cellular => 0,
            Self::Wifi => 1,
            Self::Mesh => 2,
            Self::Ethernet => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cellular => "cellular",
            Self::Wifi => "wifi",
            Self::Mesh => "mesh",
            Self::Ethernet => "ethernet",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    Unknown,
    Off,
    TurningOn,
    On,
    TurningOff,
}

/// Connection status reported to diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkDiagState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl NetworkDiagState {
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Disconnecting => 3,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connecting),
            2 => Some(Self::Connected),
            3 => Some(Self::Disconnecting),
            _ => None,
        }
    }
}

/// System events emitted once per actual interface transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkNotification {
    PoweredOn,
    PoweredOff,
    Connecting,
    Connected,
    Disconnected,
    ListeningStarted,
    ListeningStopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    User,
    Listening,
    Reset,
    PowerOff,
    NcpUpdate,
}

impl DisconnectReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Listening => "listening",
            Self::Reset => "reset",
            Self::PowerOff => "power_off",
            Self::NcpUpdate => "ncp_update",
        }
    }
}

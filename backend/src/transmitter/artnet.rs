//! Art-Net output (ArtDmx, protocol revision 14).
//!
//! Each frame carries one universe of up to 512 slots. Receivers expect a
//! continuous stream, so the last frame is re-sent at a fixed cadence even
//! when nothing changes.

use super::{Transmitter, Universe};
use crate::config::TransmitterConfig;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Packet identifier at the start of every Art-Net packet.
pub const ARTNET_ID: &[u8; 8] = b"Art-Net\0";
/// OpCode of an ArtDmx packet.
pub const OP_DMX: u16 = 0x5000;
/// Protocol revision carried in every packet.
pub const PROTOCOL_VERSION: u16 = 14;
/// Default Art-Net UDP port.
pub const ARTNET_PORT: u16 = 6454;
/// Highest valid 15-bit port-address.
pub const MAX_PORT_ADDRESS: u16 = 0x7FFF;
/// Slots in a full DMX universe.
pub const MAX_SLOTS: usize = 512;

const HEADER_LEN: usize = 18;

/// ArtDmx packet parsing and building errors.
#[derive(Debug, Error)]
pub enum ArtNetError {
    #[error("Packet too short: {0} bytes")]
    PacketTooShort(usize),
    #[error("Not an Art-Net packet")]
    InvalidId,
    #[error("Unsupported OpCode: {0:#06x}")]
    UnsupportedOpCode(u16),
    #[error("Invalid data length: {0}")]
    InvalidLength(usize),
    #[error("Port-address out of range: {0}")]
    InvalidPortAddress(u16),
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed or to-be-sent ArtDmx packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtDmxPacket {
    /// 1..=255, or 0 to disable resequencing at the receiver.
    pub sequence: u8,
    /// Physical input port the data came from.
    pub physical: u8,
    /// 15-bit port-address (Net, Sub-Net and Universe).
    pub port_address: u16,
    pub data: Vec<u8>,
}

impl ArtDmxPacket {
    /// Build a packet. The data is truncated to 512 slots and padded to an
    /// even length of at least 2.
    pub fn new(sequence: u8, port_address: u16, slots: &[u8]) -> Result<Self, ArtNetError> {
        if port_address > MAX_PORT_ADDRESS {
            return Err(ArtNetError::InvalidPortAddress(port_address));
        }

        let mut data = slots[..slots.len().min(MAX_SLOTS)].to_vec();
        if data.len() < 2 {
            data.resize(2, 0);
        } else if data.len() % 2 == 1 {
            data.push(0);
        }

        Ok(Self {
            sequence,
            physical: 0,
            port_address,
            data,
        })
    }

    /// Encode to wire bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(HEADER_LEN + self.data.len());

        packet.extend_from_slice(ARTNET_ID);
        // OpCode is little-endian, everything else big-endian
        packet.extend_from_slice(&OP_DMX.to_le_bytes());
        packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
        packet.push(self.sequence);
        packet.push(self.physical);
        // SubUni then Net
        packet.push((self.port_address & 0xFF) as u8);
        packet.push(((self.port_address >> 8) & 0x7F) as u8);
        packet.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
        packet.extend_from_slice(&self.data);

        packet
    }

    /// Parse an ArtDmx packet from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ArtNetError> {
        if data.len() < HEADER_LEN {
            return Err(ArtNetError::PacketTooShort(data.len()));
        }
        if &data[..8] != ARTNET_ID {
            return Err(ArtNetError::InvalidId);
        }

        let opcode = u16::from_le_bytes([data[8], data[9]]);
        if opcode != OP_DMX {
            return Err(ArtNetError::UnsupportedOpCode(opcode));
        }

        let sequence = data[12];
        let physical = data[13];
        let port_address = u16::from(data[14]) | (u16::from(data[15] & 0x7F) << 8);
        let length = usize::from(u16::from_be_bytes([data[16], data[17]]));

        if !(2..=MAX_SLOTS).contains(&length) || length % 2 == 1 {
            return Err(ArtNetError::InvalidLength(length));
        }
        if data.len() < HEADER_LEN + length {
            return Err(ArtNetError::PacketTooShort(data.len()));
        }

        Ok(Self {
            sequence,
            physical,
            port_address,
            data: data[HEADER_LEN..HEADER_LEN + length].to_vec(),
        })
    }
}

/// Sends the universe as ArtDmx over UDP.
pub struct ArtNetTransmitter {
    socket: UdpSocket,
    target: SocketAddr,
    port_address: u16,
    refresh_interval: Duration,
    /// Next sequence number, 1..=255.
    sequence: u8,
    last_frame: Option<Vec<u8>>,
    since_send: Duration,
    /// Whether the previous send failed, to log only state changes.
    failing: bool,
}

impl ArtNetTransmitter {
    /// Open the output socket.
    pub fn new(config: &TransmitterConfig) -> Result<Self, ArtNetError> {
        if config.universe > MAX_PORT_ADDRESS {
            return Err(ArtNetError::InvalidPortAddress(config.universe));
        }

        let socket = Self::create_socket()?;
        info!(
            target = %config.target,
            universe = config.universe,
            "Art-Net output enabled"
        );

        Ok(Self {
            socket,
            target: config.target,
            port_address: config.universe,
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            sequence: 1,
            last_frame: None,
            since_send: Duration::ZERO,
            failing: false,
        })
    }

    fn create_socket() -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

        // Art-Net targets are often the subnet broadcast address
        socket.set_broadcast(true)?;

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
        socket.bind(&bind_addr.into())?;

        // Never stall the engine task on a full send buffer
        socket.set_nonblocking(true)?;

        Ok(socket.into())
    }

    fn next_sequence(&mut self) -> u8 {
        let sequence = self.sequence;
        self.sequence = if sequence == u8::MAX { 1 } else { sequence + 1 };
        sequence
    }

    fn send_last(&mut self) {
        let Some(frame) = self.last_frame.as_deref() else {
            return;
        };
        let sequence = self.sequence;
        let packet = match ArtDmxPacket::new(sequence, self.port_address, frame) {
            Ok(packet) => packet.build(),
            Err(e) => {
                warn!("Failed to build ArtDmx packet: {}", e);
                return;
            }
        };
        self.next_sequence();
        self.since_send = Duration::ZERO;

        match self.socket.send_to(&packet, self.target) {
            Ok(_) => {
                if self.failing {
                    info!(target = %self.target, "Art-Net output recovered");
                    self.failing = false;
                }
            }
            Err(e) => {
                if !self.failing {
                    warn!(target = %self.target, "Art-Net send failed: {}", e);
                    self.failing = true;
                } else {
                    debug!("Art-Net send failed again: {}", e);
                }
            }
        }
    }
}

impl Transmitter for ArtNetTransmitter {
    fn update(&mut self, universe: &Universe) {
        if self.last_frame.as_deref() == Some(universe.as_slice()) {
            return;
        }
        self.last_frame = Some(universe.as_slice().to_vec());
        self.send_last();
    }

    fn tick(&mut self, elapsed: Duration) {
        self.since_send += elapsed;
        if self.since_send >= self.refresh_interval {
            self.send_last();
        }
    }
}

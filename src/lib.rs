pub mod config;
pub mod packet;
pub mod server;
pub mod session;

pub use config::Config;
pub use packet::DecodeError;
pub use packet::Packet;
pub use server::Server;
pub use session::Abort;
pub use session::Outcome;
pub use session::Session;

pub const DATAGRAM_SIZE: usize = 516; // RFC 1350: 4 byte header + 512 data bytes
pub const BLOCK_SIZE: usize = DATAGRAM_SIZE - 4;

pub type BlockNumber = u16;

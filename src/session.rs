use crate::config::Config;
use crate::packet::Packet;
use crate::BlockNumber;
use crate::BLOCK_SIZE;
use crate::DATAGRAM_SIZE;
use bytes::Bytes;
use std::net::Ipv4Addr;
use std::net::Ipv6Addr;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

pub type ID = uuid::Uuid;

/// Why a session ended before the whole payload was acknowledged.
#[derive(Debug)]
pub enum Abort {
    /// The client reported an error; it will not continue.
    RemoteError { code: u16, message: String },
    /// No matching acknowledgment arrived within the retry budget.
    RetriesExhausted { block: BlockNumber },
    /// A send or receive failed with a non-timeout error.
    Transport(std::io::Error),
}

#[derive(Debug)]
pub enum Outcome {
    /// Transfer complete; all blocks acknowledged.
    Done { blocks: u64 },
    Aborted(Abort),
}

/// One client's stop-and-wait transfer, from first data block to
/// completion or abort.
///
/// The session owns a socket bound to an ephemeral port and connected to
/// the requesting client, so concurrent transfers cannot see each other's
/// traffic. It holds its own read cursor over the shared payload.
#[derive(Debug)]
pub struct Session {
    id: ID,
    peer: SocketAddr,
    socket: UdpSocket,
    payload: Bytes,
    retries: u8,
    ack_timeout: Duration,
}

impl Session {
    pub async fn new(peer: SocketAddr, config: &Config) -> Result<Self, std::io::Error> {
        let bind_address: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind_address).await?;
        socket.connect(peer).await?;

        Ok(Self {
            id: ID::new_v4(),
            peer,
            socket,
            payload: config.payload.clone(),
            retries: config.retries,
            ack_timeout: config.ack_timeout,
        })
    }

    /// Drives the transfer to a terminal state. Every block is sent and
    /// retransmitted until a matching acknowledgment arrives or the retry
    /// budget runs out; a block shorter than [`BLOCK_SIZE`] ends the
    /// transfer once acknowledged.
    pub async fn run(self) -> Outcome {
        let mut buf = [0u8; DATAGRAM_SIZE];
        let mut block: BlockNumber = 1;
        let mut blocks_sent: u64 = 0;
        let mut offset = 0;

        loop {
            let end = (offset + BLOCK_SIZE).min(self.payload.len());
            let chunk = self.payload.slice(offset..end);
            let last = chunk.len() < BLOCK_SIZE;
            let datagram = Packet::Data {
                block,
                payload: chunk,
            }
            .encode();

            match self.send_until_acknowledged(block, &datagram, &mut buf).await {
                Attempt::Acknowledged => {}
                Attempt::Failed(abort) => {
                    tracing::warn!("[{}] session {} aborted: {:?}", self.peer, self.id, abort);
                    return Outcome::Aborted(abort);
                }
            }
            blocks_sent += 1;

            if last {
                tracing::info!("[{}] session {} sent {} blocks", self.peer, self.id, blocks_sent);
                return Outcome::Done { blocks: blocks_sent };
            }
            offset = end;
            block = block.wrapping_add(1);
        }
    }

    /// Sends one encoded data block and waits for its acknowledgment,
    /// retransmitting on timeout, on an acknowledgment for another block
    /// and on undecodable datagrams. Each retransmission resets the
    /// deadline.
    async fn send_until_acknowledged(
        &self,
        block: BlockNumber,
        datagram: &[u8],
        buf: &mut [u8],
    ) -> Attempt {
        let mut retries_left = self.retries;
        while retries_left > 0 {
            retries_left -= 1;

            if let Err(err) = self.socket.send(datagram).await {
                return Attempt::Failed(Abort::Transport(err));
            }

            let received = match tokio::time::timeout(self.ack_timeout, self.socket.recv(buf)).await
            {
                // No acknowledgment in time; resend the same block.
                Err(_elapsed) => continue,
                Ok(Err(err)) => return Attempt::Failed(Abort::Transport(err)),
                Ok(Ok(n)) => n,
            };

            match Packet::decode(&buf[..received]) {
                Ok(Packet::Ack { block: acked }) if acked == block => {
                    return Attempt::Acknowledged;
                }
                Ok(Packet::Ack { block: acked }) => {
                    // Stale, future and corrupted block numbers are not
                    // distinguished; all consume one retry.
                    tracing::debug!(
                        "[{}] session {} acknowledgment for block {} while block {} is outstanding",
                        self.peer,
                        self.id,
                        acked,
                        block
                    );
                }
                Ok(Packet::Error { code, message }) => {
                    tracing::warn!(
                        "[{}] session {} received error {}: {}",
                        self.peer,
                        self.id,
                        code,
                        message
                    );
                    return Attempt::Failed(Abort::RemoteError { code, message });
                }
                Ok(other) => {
                    tracing::debug!(
                        "[{}] session {} unexpected packet: {:?}",
                        self.peer,
                        self.id,
                        other
                    );
                }
                Err(err) => {
                    tracing::debug!("[{}] session {} bad packet: {}", self.peer, self.id, err);
                }
            }
        }
        Attempt::Failed(Abort::RetriesExhausted { block })
    }
}

enum Attempt {
    Acknowledged,
    Failed(Abort),
}

use crate::config::Config;
use crate::config::DEFAULT_ACK_TIMEOUT;
use crate::config::DEFAULT_MAX_SESSIONS;
use crate::config::DEFAULT_RETRIES;
use crate::packet::Packet;
use crate::session::Session;
use crate::DATAGRAM_SIZE;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
    #[error("payload is required")]
    EmptyPayload,
}

/// Accepts read requests and spawns one [`Session`] per client.
pub struct Server {
    config: Config,
    admission: Arc<Semaphore>,
}

impl Server {
    /// Validates the configuration; unset retry, timeout and session-cap
    /// values fall back to their defaults.
    pub fn new(mut config: Config) -> Result<Self, Error> {
        if config.payload.is_empty() {
            return Err(Error::EmptyPayload);
        }
        if config.retries == 0 {
            config.retries = DEFAULT_RETRIES;
        }
        if config.ack_timeout == Duration::from_secs(0) {
            config.ack_timeout = DEFAULT_ACK_TIMEOUT;
        }
        if config.max_sessions == 0 {
            config.max_sessions = DEFAULT_MAX_SESSIONS;
        }

        Ok(Self {
            admission: Arc::new(Semaphore::new(config.max_sessions)),
            config,
        })
    }

    pub async fn listen(&self, address: SocketAddr) -> Result<(), Error> {
        let socket = UdpSocket::bind(address).await?;
        tracing::info!("listening on {}", socket.local_addr()?);
        self.serve(socket).await
    }

    /// Runs the accept loop on an already bound socket. Returns only on an
    /// unrecoverable socket error; a malformed datagram never aborts the
    /// loop, and request handling never blocks it.
    pub async fn serve(&self, socket: UdpSocket) -> Result<(), Error> {
        let mut buf = [0u8; DATAGRAM_SIZE];
        loop {
            let (n, from) = socket.recv_from(&mut buf).await?;
            match Packet::decode(&buf[..n]) {
                Ok(Packet::ReadRequest { filename, mode }) => {
                    tracing::info!("[{}] requested file: {} ({})", from, filename, mode);
                    self.dispatch(from);
                }
                Ok(packet) => {
                    tracing::warn!("[{}] unexpected packet: {:?}", from, packet);
                }
                Err(err) => {
                    tracing::warn!("[{}] bad request: {}", from, err);
                }
            }
        }
    }

    fn dispatch(&self, peer: SocketAddr) {
        let permit = match self.admission.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!("[{}] session limit reached, dropping request", peer);
                return;
            }
        };

        let config = self.config.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match Session::new(peer, &config).await {
                Ok(session) => {
                    session.run().await;
                }
                Err(err) => {
                    tracing::warn!("[{}] dial: {}", peer, err);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(
            Server::new(Config::new(Vec::new())),
            Err(Error::EmptyPayload)
        ));
    }

    #[test]
    fn unset_values_fall_back_to_defaults() {
        let config = Config {
            payload: vec![1].into(),
            retries: 0,
            ack_timeout: Duration::from_secs(0),
            max_sessions: 0,
        };
        let server = Server::new(config).unwrap();
        assert_eq!(server.config.retries, DEFAULT_RETRIES);
        assert_eq!(server.config.ack_timeout, DEFAULT_ACK_TIMEOUT);
        assert_eq!(server.config.max_sessions, DEFAULT_MAX_SESSIONS);
    }
}

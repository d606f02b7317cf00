use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::net::SocketAddrV4;
use std::time::Duration;
use tftpd::Config;
use tftpd::Packet;
use tftpd::Server;
use tokio::net::UdpSocket;

/// Short enough to keep retransmission tests fast.
pub const ACK_TIMEOUT: Duration = Duration::from_millis(50);

/// Binds the server to an ephemeral loopback port and runs its accept
/// loop in the background. Returns the address clients should send read
/// requests to.
pub async fn spawn_server(config: Config) -> SocketAddr {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("error when binding server UDP socket");
    let address = socket.local_addr().unwrap();
    let server = Server::new(config).expect("error when building server");
    tokio::spawn(async move { server.serve(socket).await.unwrap() });
    address
}

pub async fn client() -> UdpSocket {
    UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("error when binding client UDP socket")
}

pub async fn send_read_request(socket: &UdpSocket, server: SocketAddr) {
    let request = Packet::ReadRequest {
        filename: "payload.svg".to_owned(),
        mode: "octet".to_owned(),
    };
    socket
        .send_to(&request.encode(), server)
        .await
        .expect("error when sending read request");
}

/// Receives and decodes one datagram. Data blocks arrive from the
/// session's own socket, not the server's, so the sender address is
/// returned alongside the packet.
pub async fn recv_packet(socket: &UdpSocket) -> (Packet, SocketAddr) {
    let mut buf = [0u8; 1024];
    let (n, from) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for a datagram")
        .expect("error when receiving");
    let packet = Packet::decode(&buf[..n]).expect("received undecodable datagram");
    (packet, from)
}

pub async fn send_ack(socket: &UdpSocket, to: SocketAddr, block: u16) {
    socket
        .send_to(&Packet::Ack { block }.encode(), to)
        .await
        .expect("error when sending ack");
}

pub async fn assert_silence(socket: &UdpSocket, duration: Duration) {
    let mut buf = [0u8; 1024];
    let result = tokio::time::timeout(duration, socket.recv_from(&mut buf)).await;
    assert!(result.is_err(), "expected no datagram, but one arrived");
}

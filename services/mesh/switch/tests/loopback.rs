//! End-to-end test driving a Switch over real loopback UDP sockets against a
//! hand-rolled fake Controller, exercising `mesh_switch::serve` exactly as
//! the `switch` binary would. Uses paused virtual time so the periodic
//! KEEP_ALIVE/TOPOLOGY_UPDATE round can be advanced deterministically
//! instead of waiting on `UPDATE_DELAY` in real time.

use mesh_wire::consts::{BUFFER_SIZE, UPDATE_DELAY};
use mesh_wire::{Message, NeighborAddr, RouteEntry};
use tokio::net::UdpSocket;

async fn recv_message(socket: &UdpSocket) -> (Message, std::net::SocketAddr) {
    let mut buf = [0u8; BUFFER_SIZE];
    let (len, from) = tokio::time::timeout(std::time::Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for a datagram")
        .unwrap();
    (Message::decode(&buf[..len]).unwrap(), from)
}

#[tokio::test(start_paused = true)]
async fn registers_installs_routes_and_answers_keepalive() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("switch1.log");

    let fake_controller = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
    let controller_addr = fake_controller.local_addr().unwrap();

    let neighbor_socket = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
    let neighbor_addr = neighbor_socket.local_addr().unwrap();

    let switch_socket = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
    tokio::spawn(async move {
        let _ = mesh_switch::serve(switch_socket, 1, controller_addr, None, &log_path).await;
    });

    let (register_request, switch_addr) = recv_message(&fake_controller).await;
    let switch_port = match register_request {
        Message::RegisterRequest { switch_id, port } => {
            assert_eq!(switch_id, 1);
            port
        }
        other => panic!("expected REGISTER_REQUEST, got {other:?}"),
    };
    assert_eq!(switch_addr.port() as i32, switch_port);

    fake_controller
        .send_to(
            &Message::RegisterResponse {
                neighbors: vec![NeighborAddr {
                    neighbor_id: 0,
                    alive: true,
                    port: neighbor_addr.port() as i32,
                    host: "127.0.0.1".to_string(),
                }],
            }
            .encode()
            .unwrap(),
            switch_addr,
        )
        .await
        .unwrap();

    fake_controller
        .send_to(
            &Message::RoutingUpdate {
                routes: vec![RouteEntry {
                    src: 1,
                    dst: 0,
                    next_hop: 0,
                    distance: 1,
                }],
            }
            .encode()
            .unwrap(),
            switch_addr,
        )
        .await
        .unwrap();

    // Let the switch's registration handshake complete before advancing the
    // timer, otherwise the periodic task might not be spawned yet.
    tokio::task::yield_now().await;

    // Drive the first periodic round deterministically instead of waiting
    // `UPDATE_DELAY` in real time.
    tokio::time::advance(UPDATE_DELAY).await;

    match recv_message(&neighbor_socket).await {
        (Message::KeepAlive { sender_switch_id }, from) => {
            assert_eq!(sender_switch_id, 1);
            assert_eq!(from, switch_addr);
        }
        (other, _) => panic!("expected KEEP_ALIVE, got {other:?}"),
    }

    match recv_message(&fake_controller).await {
        (Message::TopologyUpdate { sender_switch_id, neighbors }, _) => {
            assert_eq!(sender_switch_id, 1);
            assert_eq!(neighbors.len(), 1);
            assert_eq!(neighbors[0].neighbor_id, 0);
            assert!(neighbors[0].alive);
        }
        (other, _) => panic!("expected TOPOLOGY_UPDATE, got {other:?}"),
    }

    neighbor_socket
        .send_to(&Message::KeepAlive { sender_switch_id: 0 }.encode().unwrap(), switch_addr)
        .await
        .unwrap();
    tokio::task::yield_now().await;

    // A second periodic round confirms the switch kept running after
    // processing the inbound KEEP_ALIVE.
    tokio::time::advance(UPDATE_DELAY).await;
    match recv_message(&neighbor_socket).await {
        (Message::KeepAlive { sender_switch_id }, _) => assert_eq!(sender_switch_id, 1),
        (other, _) => panic!("expected a further KEEP_ALIVE, got {other:?}"),
    }
}

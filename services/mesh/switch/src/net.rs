//! UDP glue: registers with the Controller, then runs the receive loop
//! concurrently with the periodic KEEP_ALIVE/TOPOLOGY_UPDATE timer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use mesh_eventlog::EventLog;
use mesh_wire::consts::{BUFFER_SIZE, UPDATE_DELAY};
use mesh_wire::Message;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::state::{Outcome, SwitchState};

/// Register with the Controller, install the initial routing table, then
/// run forever: a receive loop for KEEP_ALIVE/ROUTING_UPDATE and a spawned
/// task running `periodic_tasks` every `UPDATE_DELAY`.
pub async fn run(
    switch_id: i32,
    controller_addr: SocketAddr,
    suppressed_neighbor: Option<i32>,
    log_path: &std::path::Path,
) -> Result<()> {
    let socket = UdpSocket::bind(("127.0.0.1", 0))
        .await
        .context("failed to bind switch UDP socket")?;
    serve(socket, switch_id, controller_addr, suppressed_neighbor, log_path).await
}

/// Register and serve over an already-bound socket. Split out from [`run`]
/// so tests can bind an ephemeral port and inspect it before handing the
/// live socket here.
pub async fn serve(
    socket: UdpSocket,
    switch_id: i32,
    controller_addr: SocketAddr,
    suppressed_neighbor: Option<i32>,
    log_path: &std::path::Path,
) -> Result<()> {
    let local_port = socket.local_addr()?.port();
    let log = Arc::new(EventLog::open(log_path).context("failed to open switch event log")?);

    socket
        .send_to(
            &Message::RegisterRequest {
                switch_id,
                port: local_port as i32,
            }
            .encode()?,
            controller_addr,
        )
        .await
        .context("failed to send REGISTER_REQUEST")?;
    log.append(&["Register Request Sent"]);

    let mut buf = [0u8; BUFFER_SIZE];
    let len = socket.recv(&mut buf).await.context("no REGISTER_RESPONSE received")?;
    let neighbors = match Message::decode(&buf[..len])? {
        Message::RegisterResponse { neighbors } => neighbors,
        other => bail!("expected REGISTER_RESPONSE, got {other:?}"),
    };
    log.append(&["Register Response Received"]);

    let state = Arc::new(Mutex::new(SwitchState::new(
        switch_id,
        controller_addr,
        suppressed_neighbor,
        neighbors,
        Instant::now(),
    )));

    let len = socket.recv(&mut buf).await.context("no initial ROUTING_UPDATE received")?;
    if let Message::RoutingUpdate { routes } = Message::decode(&buf[..len])? {
        let outcome = state.lock().await.on_routing_update(routes);
        apply_outcome(&socket, &log, outcome).await;
    }

    let socket = Arc::new(socket);

    {
        let state = state.clone();
        let socket = socket.clone();
        let log = log.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(UPDATE_DELAY);
            loop {
                interval.tick().await;
                let outcome = {
                    let mut guard = state.lock().await;
                    guard.periodic_tasks(Instant::now())
                };
                apply_outcome(&socket, &log, outcome).await;
            }
        });
    }

    loop {
        let (len, sender_addr) = socket
            .recv_from(&mut buf)
            .await
            .context("switch UDP recv_from failed")?;

        let outcome = match Message::decode(&buf[..len]) {
            Ok(Message::KeepAlive { sender_switch_id }) => {
                if suppressed_neighbor == Some(sender_switch_id) {
                    // Still decoded, matched, then discarded per the
                    // synthetic one-way failure contract.
                    None
                } else {
                    let mut guard = state.lock().await;
                    Some(guard.on_keep_alive(sender_addr, sender_switch_id, Instant::now()))
                }
            }
            Ok(Message::RoutingUpdate { routes }) => {
                let mut guard = state.lock().await;
                Some(guard.on_routing_update(routes))
            }
            Ok(other) => {
                tracing::warn!(?other, %sender_addr, "switch received an unexpected message type, dropping");
                None
            }
            Err(err) => {
                tracing::warn!(%err, %sender_addr, "failed to decode datagram, dropping");
                None
            }
        };

        if let Some(outcome) = outcome {
            apply_outcome(&socket, &log, outcome).await;
        }
    }
}

async fn apply_outcome(socket: &UdpSocket, log: &EventLog, outcome: Outcome) {
    for record in &outcome.log_records {
        log.append(record);
    }
    for send in &outcome.sends {
        let encoded = match send.message.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%err, addr = %send.addr, "failed to encode outbound message");
                continue;
            }
        };
        if let Err(err) = socket.send_to(&encoded, send.addr).await {
            tracing::warn!(%err, addr = %send.addr, "failed to send datagram");
        }
    }
}

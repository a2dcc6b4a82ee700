//! UDP glue: binds the Controller's socket and runs the receive loop
//! concurrently with the periodic liveness-scan timer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use mesh_eventlog::EventLog;
use mesh_topology::Template;
use mesh_wire::consts::{BUFFER_SIZE, UPDATE_DELAY};
use mesh_wire::Message;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::state::{ControllerState, Outcome};

/// Bind the Controller socket and run forever: a receive loop processing
/// inbound datagrams and a spawned task running the liveness scan every
/// `UPDATE_DELAY`. Both share one lock over [`ControllerState`].
pub async fn run(port: u16, template: Template, log_path: &std::path::Path) -> Result<()> {
    let socket = UdpSocket::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind controller UDP socket on port {port}"))?;
    serve(socket, template, log_path).await
}

/// Drive the Controller's receive loop and liveness-scan timer over an
/// already-bound socket. Split out from [`run`] so tests can bind an
/// ephemeral port, read it back, and then hand the live socket here.
pub async fn serve(socket: UdpSocket, template: Template, log_path: &std::path::Path) -> Result<()> {
    let socket = Arc::new(socket);
    let log = Arc::new(EventLog::open(log_path).context("failed to open controller event log")?);
    let state = Arc::new(Mutex::new(ControllerState::new(template)));

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
                    guard.periodic_liveness_scan(Instant::now())
                };
                apply_outcome(&socket, &log, outcome).await;
            }
        });
    }

    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let (len, sender_addr) = socket
            .recv_from(&mut buf)
            .await
            .context("controller UDP recv_from failed")?;

        let outcome = match Message::decode(&buf[..len]) {
            Ok(Message::RegisterRequest { switch_id, port }) => {
                let mut guard = state.lock().await;
                Some(guard.on_register_request(sender_addr, switch_id, port, Instant::now()))
            }
            Ok(Message::TopologyUpdate {
                sender_switch_id,
                neighbors,
            }) => {
                let mut guard = state.lock().await;
                Some(guard.on_topology_update(sender_addr, sender_switch_id, neighbors, Instant::now()))
            }
            Ok(other) => {
                tracing::warn!(?other, %sender_addr, "controller received an unexpected message type, dropping");
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
        if let Err(err) = send_datagram(socket, send.addr, &send.message).await {
            tracing::warn!(%err, addr = %send.addr, "failed to send datagram");
        }
    }
}

async fn send_datagram(socket: &UdpSocket, addr: SocketAddr, message: &Message) -> Result<()> {
    let encoded = message.encode()?;
    socket.send_to(&encoded, addr).await?;
    Ok(())
}

//! In-process transport and packet builders for session tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;

use drivelink_proto::ids::{c2v, v2c};
use drivelink_proto::packet;
use drivelink_transport::{Result, Transport, TransportError};

struct MockShared {
    written: Mutex<Vec<Bytes>>,
    notify: Mutex<Option<mpsc::Sender<Bytes>>>,
    fail_connect: Mutex<Option<TransportError>>,
    fail_disconnect: Mutex<Option<TransportError>>,
    still_connected_on_disconnect: AtomicBool,
    auto_pong: AtomicBool,
}

/// The transport half handed to the vehicle.
pub struct MockLink {
    shared: Arc<MockShared>,
}

/// The test's half: inject notifications, inspect writes, arm failures.
#[derive(Clone)]
pub struct MockHandle {
    shared: Arc<MockShared>,
}

pub fn mock_link() -> (MockLink, MockHandle) {
    let shared = Arc::new(MockShared {
        written: Mutex::new(Vec::new()),
        notify: Mutex::new(None),
        fail_connect: Mutex::new(None),
        fail_disconnect: Mutex::new(None),
        still_connected_on_disconnect: AtomicBool::new(false),
        auto_pong: AtomicBool::new(false),
    });
    (
        MockLink {
            shared: Arc::clone(&shared),
        },
        MockHandle { shared },
    )
}

#[async_trait]
impl Transport for MockLink {
    async fn connect(&mut self) -> Result<()> {
        if let Some(err) = self.shared.fail_connect.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<bool> {
        if let Some(err) = self.shared.fail_disconnect.lock().unwrap().take() {
            return Err(err);
        }
        if self
            .shared
            .still_connected_on_disconnect
            .load(Ordering::SeqCst)
        {
            return Ok(true);
        }
        // Dropping the sender ends the session's dispatch loop.
        *self.shared.notify.lock().unwrap() = None;
        Ok(false)
    }

    async fn write_command(&mut self, packet_bytes: &[u8]) -> Result<()> {
        self.shared
            .written
            .lock()
            .unwrap()
            .push(Bytes::copy_from_slice(packet_bytes));

        if self.shared.auto_pong.load(Ordering::SeqCst) {
            if let Ok((msg_type, _)) = packet::unframe(packet_bytes) {
                if msg_type == c2v::PING {
                    let tx = self.shared.notify.lock().unwrap().clone();
                    if let Some(tx) = tx {
                        let _ = tx.try_send(pong_packet());
                    }
                }
            }
        }
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Bytes>> {
        let (tx, rx) = mpsc::channel(32);
        *self.shared.notify.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

impl MockHandle {
    /// Inject one notification packet, as the device would push it.
    pub async fn notify(&self, packet_bytes: Bytes) {
        let tx = self
            .shared
            .notify
            .lock()
            .unwrap()
            .clone()
            .expect("transport was never subscribed");
        tx.send(packet_bytes).await.expect("dispatch channel closed");
    }

    pub fn written(&self) -> Vec<Bytes> {
        self.shared.written.lock().unwrap().clone()
    }

    /// Message types of every packet written so far, in order.
    pub fn written_types(&self) -> Vec<u8> {
        self.written()
            .iter()
            .filter_map(|p| packet::unframe(p).ok().map(|(msg_type, _)| msg_type))
            .collect()
    }

    pub fn ping_count(&self) -> usize {
        self.written_types()
            .iter()
            .filter(|msg_type| **msg_type == c2v::PING)
            .count()
    }

    pub fn fail_next_connect(&self, err: TransportError) {
        *self.shared.fail_connect.lock().unwrap() = Some(err);
    }

    pub fn fail_next_disconnect(&self, err: TransportError) {
        *self.shared.fail_disconnect.lock().unwrap() = Some(err);
    }

    pub fn set_still_connected_on_disconnect(&self, value: bool) {
        self.shared
            .still_connected_on_disconnect
            .store(value, Ordering::SeqCst);
    }

    /// Answer every subsequent ping with an immediate pong.
    pub fn set_auto_pong(&self, value: bool) {
        self.shared.auto_pong.store(value, Ordering::SeqCst);
    }
}

// ---- notification builders ---------------------------------------------

pub fn pong_packet() -> Bytes {
    packet::frame(v2c::PONG, &[]).unwrap()
}

pub fn delocalized_packet() -> Bytes {
    packet::frame(v2c::DELOCALIZED, &[]).unwrap()
}

pub fn version_packet(version: u16) -> Bytes {
    packet::frame(v2c::VERSION_RESPONSE, &version.to_le_bytes()).unwrap()
}

pub fn voltage_packet(voltage: u16) -> Bytes {
    packet::frame(v2c::VOLTAGE_RESPONSE, &voltage.to_le_bytes()).unwrap()
}

pub fn charger_info_packet(reserved: bool, on_charger: bool, charging: bool, full: bool) -> Bytes {
    let payload = [
        reserved as u8,
        on_charger as u8,
        charging as u8,
        full as u8,
    ];
    packet::frame(v2c::CHARGER_INFO, &payload).unwrap()
}

pub fn track_update_packet(
    location: u8,
    piece_id: u8,
    offset: f32,
    speed: u16,
    clockwise: u8,
) -> Bytes {
    let mut payload = BytesMut::with_capacity(9);
    payload.put_u8(location);
    payload.put_u8(piece_id);
    payload.put_f32_le(offset);
    payload.put_u16_le(speed);
    payload.put_u8(clockwise);
    packet::frame(v2c::TRACK_PIECE_UPDATE, &payload).unwrap()
}

/// A transition update; the telemetry fields are all zero.
pub fn track_change_packet() -> Bytes {
    packet::frame(v2c::TRACK_PIECE_CHANGE, &[0u8; 16]).unwrap()
}

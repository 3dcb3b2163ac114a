//! The vehicle session.
//!
//! A [`Vehicle`] owns one transport link. Its state is derived purely
//! from inbound notifications, processed one at a time in arrival order
//! by a dispatch task; commands go out through the transport in call
//! order. A keep-alive supervisor runs beside the dispatch task while
//! the session is connected.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use drivelink_proto::notification::{self, Notification};
use drivelink_proto::{command, ids, packet};
use drivelink_transport::{Transport, TransportError};

use crate::battery::BatteryState;
use crate::error::{Result, VehicleError};
use crate::keepalive::{self, KeepAliveConfig};
use crate::lane::{Lane, LaneLayout};
use crate::pending::ResponseSlots;
use crate::track::{TrackPiece, TrackPieceType};
use crate::watch::{Registry, WatcherFn, WatcherId};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Bit flags for the fixed lights.
const ENGINE_BIT: u8 = 0b0001;
/// Brakelights take two bits: solid and flickering.
const BRAKELIGHTS_BIT: u8 = 0b0010;
const HEADLIGHTS_BIT: u8 = 0b0100;
const BRAKELIGHTS_FLICKER_BIT: u8 = 0b1000;

/// Which fixed lights to switch. `None` keeps a light's previous state.
///
/// Enabling a light also resets its pattern. A set `brakelights_flicker`
/// overrides whatever `brakelights` says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightSwitches {
    /// The big RGB light on top. Known not to react on some firmware.
    pub engine: Option<bool>,
    pub headlights: Option<bool>,
    pub brakelights: Option<bool>,
    pub brakelights_flicker: Option<bool>,
}

impl LightSwitches {
    /// The wire bitmask: low nibble marks which lights to touch, high
    /// nibble their new state.
    pub fn mask(&self) -> u8 {
        let mut low = 0u8;
        let mut high = 0u8;
        for (bit, op) in [
            (ENGINE_BIT, self.engine),
            (BRAKELIGHTS_BIT, self.brakelights),
            (HEADLIGHTS_BIT, self.headlights),
            (BRAKELIGHTS_FLICKER_BIT, self.brakelights_flicker),
        ] {
            if let Some(on) = op {
                low |= bit;
                if on {
                    high |= bit;
                }
            }
        }
        (high << 4) | low
    }
}

/// How to turn around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TurnType {
    None = 0,
    Left = 1,
    Right = 2,
    UTurn = 3,
    UTurnJump = 4,
}

/// When to execute a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TurnTrigger {
    Now = 0,
    Intersection = 1,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VehicleConfig {
    /// Keep-alive supervision policy.
    #[serde(default)]
    pub keepalive: KeepAliveConfig,

    /// Flag byte sent with the SDK-enable command on connect. The
    /// firmware semantics are undocumented; 0x01 is what vehicles
    /// accept in the wild.
    #[serde(default = "default_sdk_flags")]
    pub sdk_flags: u8,
}

fn default_sdk_flags() -> u8 {
    0x01
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            keepalive: KeepAliveConfig::default(),
            sdk_flags: default_sdk_flags(),
        }
    }
}

struct VehicleState {
    connected: bool,
    road_offset: Option<f32>,
    speed: u16,
    /// Last piece seen in a localization update. Stale between updates;
    /// never exposed directly.
    last_piece: Option<TrackPiece>,
    map: Option<Vec<TrackPiece>>,
    map_position: Option<usize>,
    battery: BatteryState,
}

struct Watchers {
    on_track_piece_change: Option<WatcherFn>,
    track: Registry,
    pong: Registry,
    delocalized: Registry,
    battery: Registry,
}

struct Shared {
    id: u32,
    state: Mutex<VehicleState>,
    watchers: Mutex<Watchers>,
    version: ResponseSlots<u16>,
    voltage: ResponseSlots<u16>,
    transition_tx: broadcast::Sender<()>,
    pong_tx: broadcast::Sender<()>,
}

#[derive(Default)]
struct Tasks {
    keepalive_cancel: Option<CancellationToken>,
    keepalive: Option<JoinHandle<()>>,
    dispatch: Option<JoinHandle<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One radio-controlled vehicle.
///
/// Cheap to clone; clones share the same session. Create it with the
/// battery state observed during discovery, then [`connect`](Self::connect).
pub struct Vehicle<T> {
    shared: Arc<Shared>,
    transport: Arc<tokio::sync::Mutex<T>>,
    config: VehicleConfig,
    tasks: Arc<Mutex<Tasks>>,
}

impl<T> Clone for Vehicle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<T: Transport + 'static> Vehicle<T> {
    /// A new, not yet connected session.
    pub fn new(id: u32, transport: T, battery: BatteryState) -> Self {
        Self::with_config(id, transport, battery, VehicleConfig::default())
    }

    /// A new session with explicit configuration.
    pub fn with_config(id: u32, transport: T, battery: BatteryState, config: VehicleConfig) -> Self {
        let (transition_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (pong_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                id,
                state: Mutex::new(VehicleState {
                    connected: false,
                    road_offset: None,
                    speed: 0,
                    last_piece: None,
                    map: None,
                    map_position: None,
                    battery,
                }),
                watchers: Mutex::new(Watchers {
                    on_track_piece_change: None,
                    track: Registry::new(),
                    pong: Registry::new(),
                    delocalized: Registry::new(),
                    battery: Registry::new(),
                }),
                version: ResponseSlots::new(),
                voltage: ResponseSlots::new(),
                transition_tx,
                pong_tx,
            }),
            transport: Arc::new(tokio::sync::Mutex::new(transport)),
            config,
            tasks: Arc::new(Mutex::new(Tasks::default())),
        }
    }

    // ---- lifecycle -----------------------------------------------------

    /// Connect to the vehicle.
    ///
    /// Opens the transport link, enables SDK mode, subscribes to
    /// notifications and starts the keep-alive supervisor. Fails fatally
    /// (no retry) on any sub-step; the session is left disconnected.
    pub async fn connect(&self) -> Result<()> {
        let notifications = {
            let mut transport = self.transport.lock().await;
            transport.connect().await.map_err(translate_connect_error)?;

            let enable = command::set_sdk(true, self.config.sdk_flags)?;
            if let Err(err) = transport.write_command(&enable).await {
                abandon(&mut *transport).await;
                return Err(VehicleError::ConnectFailed(err));
            }

            match transport.subscribe().await {
                Ok(rx) => rx,
                Err(err) => {
                    abandon(&mut *transport).await;
                    return Err(VehicleError::ConnectFailed(err));
                }
            }
        };

        lock(&self.shared.state).connected = true;
        tracing::debug!(id = self.shared.id, "vehicle connected");

        let dispatch = tokio::spawn(dispatch_loop(Arc::clone(&self.shared), notifications));
        let cancel = CancellationToken::new();
        let keepalive = tokio::spawn(keepalive::run(
            self.clone(),
            self.config.keepalive.clone(),
            cancel.clone(),
        ));

        let mut tasks = lock(&self.tasks);
        tasks.dispatch = Some(dispatch);
        tasks.keepalive_cancel = Some(cancel);
        tasks.keepalive = Some(keepalive);
        Ok(())
    }

    /// Disconnect from the vehicle.
    ///
    /// On success the keep-alive supervisor is cancelled and the
    /// returned remaining-connected state is `false`. On failure the
    /// session stays connected and the caller should retry. Waits that
    /// are suspended on a transition or a version/voltage response are
    /// not cancelled; callers guard those with their own timeouts.
    pub async fn disconnect(&self) -> Result<bool> {
        let still_connected = {
            let mut transport = self.transport.lock().await;
            match transport.disconnect().await {
                Ok(still) => still,
                Err(TransportError::Timeout) => {
                    return Err(VehicleError::DisconnectTimedOut(TransportError::Timeout))
                }
                Err(err) => {
                    return Err(VehicleError::DisconnectFailed { source: Some(err) })
                }
            }
        };
        if still_connected {
            return Err(VehicleError::DisconnectFailed { source: None });
        }

        lock(&self.shared.state).connected = false;
        let cancel = {
            let mut tasks = lock(&self.tasks);
            tasks.keepalive.take();
            tasks.keepalive_cancel.take()
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        tracing::debug!(id = self.shared.id, "vehicle disconnected");
        Ok(false)
    }

    // ---- commands ------------------------------------------------------

    /// Set the speed in mm/s with the default acceleration.
    pub async fn set_speed(&self, speed: i16) -> Result<()> {
        self.set_speed_with_accel(speed, command::DEFAULT_ACCELERATION)
            .await
    }

    /// Set the speed in mm/s and acceleration in mm/s².
    pub async fn set_speed_with_accel(&self, speed: i16, accel: i16) -> Result<()> {
        self.send(command::set_speed(speed, accel)?).await?;
        // Overestimates until the next localization update; the error is
        // marginal.
        lock(&self.shared.state).speed = speed.max(0) as u16;
        Ok(())
    }

    /// Brake to a stop.
    pub async fn stop(&self) -> Result<()> {
        self.set_speed_with_accel(0, 600).await
    }

    /// Move to a lateral offset from the road centre, in mm.
    ///
    /// Vehicles do not reliably change lanes under 300 mm/s.
    pub async fn change_position(
        &self,
        road_center_offset: f32,
        horizontal_speed: u16,
        horizontal_accel: u16,
    ) -> Result<()> {
        // Hop intent and tag stay zero; their firmware semantics are
        // undocumented.
        self.send(command::change_lane(
            horizontal_speed,
            horizontal_accel,
            road_center_offset,
            0,
            0,
        )?)
        .await
    }

    /// Move into a lane.
    pub async fn change_lane(
        &self,
        lane: Lane,
        horizontal_speed: u16,
        horizontal_accel: u16,
    ) -> Result<()> {
        self.change_position(lane.offset(), horizontal_speed, horizontal_accel)
            .await
    }

    /// Abort an in-flight lane change.
    pub async fn cancel_lane_change(&self) -> Result<()> {
        self.send(command::cancel_lane_change()?).await
    }

    /// Re-declare where the road centre is relative to the vehicle.
    pub async fn set_track_center(&self, offset: f32) -> Result<()> {
        self.send(command::set_track_center(offset)?).await
    }

    /// Turn around.
    ///
    /// With a map held, a turn desyncs the tracked position; a warning
    /// is logged.
    pub async fn turn(&self, turn_type: TurnType, trigger: TurnTrigger) -> Result<()> {
        if lock(&self.shared.state).map.is_some() {
            tracing::warn!(
                id = self.shared.id,
                "turning around with a map desyncs the tracked position"
            );
        }
        self.send(command::turn_180(turn_type as u8, trigger as u8)?)
            .await
    }

    /// Switch the fixed lights. Lights left `None` keep their state.
    pub async fn set_lights(&self, switches: LightSwitches) -> Result<()> {
        self.set_lights_raw(switches.mask()).await
    }

    /// Switch the fixed lights with a raw wire bitmask.
    pub async fn set_lights_raw(&self, mask: u8) -> Result<()> {
        self.send(command::set_lights(mask)?).await
    }

    /// Run up to three per-channel light effects.
    pub async fn set_light_pattern(
        &self,
        patterns: &[drivelink_proto::LightPattern],
    ) -> Result<()> {
        self.send(command::light_pattern(patterns)?).await
    }

    /// Send a liveness probe. Pong arrival is observable through
    /// [`add_pong_watcher`](Self::add_pong_watcher).
    pub async fn ping(&self) -> Result<()> {
        self.send(command::ping()?).await
    }

    /// Query the firmware version.
    ///
    /// Suspends until a version response arrives; there is no internal
    /// timeout. Concurrent calls are resolved in order, one response
    /// each.
    pub async fn get_version(&self) -> Result<u16> {
        let response = self.shared.version.register();
        self.send(command::version_request()?).await?;
        response.await.map_err(|_| VehicleError::NotConnected)
    }

    /// Query the battery voltage. Same waiting contract as
    /// [`get_version`](Self::get_version).
    pub async fn get_voltage(&self) -> Result<u16> {
        let response = self.shared.voltage.register();
        self.send(command::voltage_request()?).await?;
        response.await.map_err(|_| VehicleError::NotConnected)
    }

    /// Brake once the next piece boundary is crossed.
    pub async fn stop_on_next_transition(&self) -> Result<()> {
        self.send(command::stop_on_next_transition()?).await
    }

    /// Ask the vehicle to drop the link from its side. This does not
    /// tear down the session; use [`disconnect`](Self::disconnect) for
    /// that.
    pub async fn request_disconnect(&self) -> Result<()> {
        self.send(command::disconnect()?).await
    }

    async fn send(&self, packet: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(VehicleError::NotConnected);
        }
        let mut transport = self.transport.lock().await;
        transport.write_command(&packet).await?;
        Ok(())
    }

    // ---- waiting -------------------------------------------------------

    /// Suspend until the vehicle crosses onto a new track piece, then
    /// return [`current_track_piece`](Self::current_track_piece) (still
    /// `None` without a map). No internal timeout.
    pub async fn wait_for_track_change(&self) -> Result<Option<TrackPiece>> {
        let mut transitions = self.shared.transition_tx.subscribe();
        match transitions.recv().await {
            // Lagging still means transitions happened.
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                Ok(self.current_track_piece())
            }
            Err(broadcast::error::RecvError::Closed) => Err(VehicleError::NotConnected),
        }
    }

    /// Drive at `speed` until just past the finish line, then stop.
    ///
    /// Afterwards the map position is 0.
    pub async fn align(&self, speed: i16) -> Result<()> {
        self.align_to(speed, TrackPieceType::Finish).await
    }

    /// Drive until the most recently seen piece has the given type,
    /// then declare position 0 and stop.
    pub async fn align_to(&self, speed: i16, target_previous_piece: TrackPieceType) -> Result<()> {
        self.set_speed(speed).await?;
        loop {
            let seen = lock(&self.shared.state)
                .last_piece
                .map(|piece| piece.piece_type());
            if seen == Some(target_previous_piece) {
                break;
            }
            self.wait_for_track_change().await?;
        }
        lock(&self.shared.state).map_position = Some(0);
        self.stop().await
    }

    // ---- watchers ------------------------------------------------------

    /// Assign the hook invoked on every track-piece change, before the
    /// watcher fan-out. Replaces any previous hook.
    pub fn set_on_track_piece_change(&self, hook: impl Fn() + Send + Sync + 'static) {
        lock(&self.shared.watchers).on_track_piece_change = Some(Arc::new(hook));
    }

    /// Remove the track-piece-change hook.
    pub fn clear_on_track_piece_change(&self) {
        lock(&self.shared.watchers).on_track_piece_change = None;
    }

    /// Watch track-piece changes.
    pub fn add_track_piece_watcher(&self, f: impl Fn() + Send + Sync + 'static) -> WatcherId {
        lock(&self.shared.watchers).track.add(Arc::new(f))
    }

    pub fn remove_track_piece_watcher(&self, id: WatcherId) -> Result<()> {
        remove(&mut lock(&self.shared.watchers).track, id)
    }

    /// Watch pong arrivals.
    pub fn add_pong_watcher(&self, f: impl Fn() + Send + Sync + 'static) -> WatcherId {
        lock(&self.shared.watchers).pong.add(Arc::new(f))
    }

    pub fn remove_pong_watcher(&self, id: WatcherId) -> Result<()> {
        remove(&mut lock(&self.shared.watchers).pong, id)
    }

    /// Watch delocalization signals.
    ///
    /// The hardware signal is best-effort in both directions: the
    /// watcher may fire while the vehicle is still localized and may
    /// stay silent while it is not. Informational use only.
    pub fn add_delocalized_watcher(&self, f: impl Fn() + Send + Sync + 'static) -> WatcherId {
        lock(&self.shared.watchers).delocalized.add(Arc::new(f))
    }

    pub fn remove_delocalized_watcher(&self, id: WatcherId) -> Result<()> {
        remove(&mut lock(&self.shared.watchers).delocalized, id)
    }

    /// Watch battery-state replacements. The state is not guaranteed to
    /// differ from the previous one.
    pub fn add_battery_watcher(&self, f: impl Fn() + Send + Sync + 'static) -> WatcherId {
        lock(&self.shared.watchers).battery.add(Arc::new(f))
    }

    pub fn remove_battery_watcher(&self, id: WatcherId) -> Result<()> {
        remove(&mut lock(&self.shared.watchers).battery, id)
    }

    // ---- accessors -----------------------------------------------------

    pub fn id(&self) -> u32 {
        self.shared.id
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared.state).connected
    }

    /// Last commanded or observed speed, mm/s.
    pub fn speed(&self) -> u16 {
        lock(&self.shared.state).speed
    }

    /// Last known offset from the road centre, mm. `None` until the
    /// first localization update.
    pub fn road_offset(&self) -> Option<f32> {
        lock(&self.shared.state).road_offset
    }

    /// The map this session tracks against, if one was supplied.
    pub fn map(&self) -> Option<Vec<TrackPiece>> {
        lock(&self.shared.state).map.clone()
    }

    /// Supply the ordered track map this session tracks against.
    pub fn set_map(&self, map: Vec<TrackPiece>) {
        lock(&self.shared.state).map = Some(map);
    }

    /// Index into the map, `None` until aligned.
    pub fn map_position(&self) -> Option<usize> {
        lock(&self.shared.state).map_position
    }

    /// The piece the vehicle is on, derivable only when both map and
    /// map position are known.
    pub fn current_track_piece(&self) -> Option<TrackPiece> {
        let state = lock(&self.shared.state);
        let map = state.map.as_ref()?;
        let position = state.map_position?;
        map.get(position).copied()
    }

    pub fn battery_state(&self) -> BatteryState {
        lock(&self.shared.state).battery
    }

    /// The lane closest to the current road offset, computed on demand.
    /// `None` until the first localization update.
    pub fn lane(&self, layout: &LaneLayout) -> Option<Lane> {
        let offset = self.road_offset()?;
        layout.closest_lane(offset)
    }

    pub(crate) fn pong_events(&self) -> broadcast::Receiver<()> {
        self.shared.pong_tx.subscribe()
    }
}

fn remove(registry: &mut Registry, id: WatcherId) -> Result<()> {
    if registry.remove(id) {
        Ok(())
    } else {
        Err(VehicleError::NotRegistered)
    }
}

async fn abandon<T: Transport>(transport: &mut T) {
    // A sub-step after the transport connect failed; do not leave a
    // half-open link behind.
    if let Err(err) = transport.disconnect().await {
        tracing::debug!(%err, "teardown after failed connect did not complete");
    }
}

fn translate_connect_error(err: TransportError) -> VehicleError {
    match &err {
        TransportError::Timeout => VehicleError::ConnectTimeout(err),
        TransportError::Bus(_) => VehicleError::ConnectTransportError(err),
        _ => VehicleError::ConnectFailed(err),
    }
}

async fn dispatch_loop(shared: Arc<Shared>, mut notifications: mpsc::Receiver<Bytes>) {
    while let Some(buffer) = notifications.recv().await {
        if !lock(&shared.state).connected {
            break;
        }
        dispatch(&shared, &buffer);
    }
    tracing::debug!(id = shared.id, "notification stream ended");
}

/// Process one inbound packet. Never fails: a malformed or unrecognized
/// message is logged and dropped so the next one dispatches cleanly.
fn dispatch(shared: &Shared, buffer: &[u8]) {
    let (msg_type, payload) = match packet::unframe(buffer) {
        Ok(parts) => parts,
        Err(err) => {
            tracing::warn!(id = shared.id, %err, "dropping malformed notification");
            return;
        }
    };

    let notification = match notification::decode(msg_type, &payload) {
        Ok(Some(notification)) => notification,
        Ok(None) => {
            tracing::debug!(
                id = shared.id,
                msg_type,
                name = ids::message_name(msg_type),
                "ignoring unrecognized notification"
            );
            return;
        }
        Err(err) => {
            tracing::warn!(
                id = shared.id,
                name = ids::message_name(msg_type),
                %err,
                "dropping undecodable notification"
            );
            return;
        }
    };

    match notification {
        Notification::TrackPieceUpdate(update) => on_track_piece_update(shared, update),
        Notification::TrackPieceChange(_) => on_track_piece_change(shared),
        Notification::Pong => {
            let _ = shared.pong_tx.send(());
            for watcher in lock(&shared.watchers).pong.snapshot() {
                watcher();
            }
        }
        Notification::Delocalized => {
            for watcher in lock(&shared.watchers).delocalized.snapshot() {
                watcher();
            }
        }
        Notification::ChargerInfo(info) => {
            lock(&shared.state).battery = BatteryState::from(info);
            for watcher in lock(&shared.watchers).battery.snapshot() {
                watcher();
            }
        }
        Notification::VersionResponse(version) => shared.version.resolve(version),
        Notification::VoltageResponse(voltage) => shared.voltage.resolve(voltage),
    }
}

fn on_track_piece_update(shared: &Shared, update: notification::TrackPieceUpdate) {
    let mut state = lock(&shared.state);
    state.road_offset = Some(update.offset);
    state.speed = update.speed;

    match TrackPiece::from_raw(update.location, update.piece_id, update.clockwise != 0) {
        Ok(piece) => state.last_piece = Some(piece),
        Err(err) => {
            drop(state);
            // Recoverable: localization keeps running on the next update.
            // A scan in progress will miss this piece though.
            tracing::warn!(id = shared.id, %err, "received an undecodable track piece");
        }
    }
}

fn on_track_piece_change(shared: &Shared) {
    let (hook, watchers) = {
        let mut state = lock(&shared.state);
        let crossed_finish = state
            .last_piece
            .map(|piece| piece.piece_type() == TrackPieceType::Finish)
            .unwrap_or(false);

        if crossed_finish {
            state.map_position = Some(0);
        } else if let Some(position) = state.map_position {
            let next = position + 1;
            state.map_position = Some(match &state.map {
                Some(map) if !map.is_empty() => next % map.len(),
                _ => next,
            });
        }
        drop(state);

        let watchers = lock(&shared.watchers);
        (
            watchers.on_track_piece_change.clone(),
            watchers.track.snapshot(),
        )
    };

    let _ = shared.transition_tx.send(());
    if let Some(hook) = hook {
        hook();
    }
    for watcher in watchers {
        watcher();
    }
}

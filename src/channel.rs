//! Push channel for notifications.
//!
//! One WebSocket at `…/notifications/ws?token=<bearer>`. The server pushes
//! each newly created notification as a JSON text frame.
//!
//! - Identity appears: seed the feed over REST, then connect.
//! - Text frame: parse as a notification and prepend it to the feed.
//! - Unclean closure: schedule exactly one reconnect after a fixed delay.
//! - Identity disappears: close at once, abandon any attempt in flight and
//!   cancel any pending reconnect.
//!
//! There is no backoff growth and no retry cap; after every unclean drop the
//! channel tries again, one attempt per delay, for as long as someone is
//! signed in.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::models::Notification;
use crate::session::Session;
use crate::settings::push_url_for;
use crate::stores::notifications::{NotificationCenter, NotificationFeed};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Reconnect timer ────────────────────────────────────────────

/// The single reconnect timer. Scheduling always replaces whatever was
/// pending, so there is never more than one attempt queued.
#[derive(Debug, Clone)]
pub struct ReconnectSchedule {
    delay: Duration,
    pending: Option<Instant>,
    scheduled: u64,
}

impl ReconnectSchedule {
    pub fn new(delay: Duration) -> Self {
        ReconnectSchedule {
            delay,
            pending: None,
            scheduled: 0,
        }
    }

    /// Returns true if a reconnect was scheduled.
    pub fn on_close(&mut self, was_clean: bool, signed_in: bool, now: Instant) -> bool {
        self.pending = None;
        if was_clean || !signed_in {
            return false;
        }
        self.pending = Some(now + self.delay);
        self.scheduled += 1;
        true
    }

    /// A connection opened; nothing left to retry.
    pub fn on_open(&mut self) {
        self.pending = None;
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Consume the pending attempt if its time has come.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(at) if now >= at => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }
}

// ── Status ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Connecting,
    Open,
    Closed { clean: bool },
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStatus {
    pub link: LinkState,
    pub reconnect_at: Option<Instant>,
    /// Successful connections so far.
    pub connects: u64,
    pub reconnects_scheduled: u64,
}

impl Default for ChannelStatus {
    fn default() -> Self {
        ChannelStatus {
            link: LinkState::Idle,
            reconnect_at: None,
            connects: 0,
            reconnects_scheduled: 0,
        }
    }
}

// ── Handle ─────────────────────────────────────────────────────

#[derive(Debug)]
enum ChannelCommand {
    Reconnect,
    Shutdown,
}

pub struct ChannelHandle {
    commands: mpsc::Sender<ChannelCommand>,
    status: watch::Receiver<ChannelStatus>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    /// Connect now. A pending scheduled reconnect is cancelled once this
    /// connection opens.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        self.commands
            .send(ChannelCommand::Reconnect)
            .await
            .map_err(|_| ClientError::Channel("channel task has stopped".into()))
    }

    pub async fn shutdown(self) {
        let _ = self.commands.send(ChannelCommand::Shutdown).await;
        let _ = self.task.await;
    }
}

// ── Channel task ───────────────────────────────────────────────

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

enum Frame {
    Text(String),
    Closed { clean: bool },
    Ignored,
}

/// Result of one seed-and-connect attempt.
enum Dialed {
    Opened(Socket),
    Failed,
    NoIdentity,
}

/// An attempt in flight. Owned, so the loop can drop it the moment the
/// identity goes away or the handle shuts down.
type Dial = Pin<Box<dyn Future<Output = Dialed> + Send>>;

pub struct PushChannel {
    url: Url,
    session: Session,
    center: NotificationCenter,
    schedule: ReconnectSchedule,
    status: watch::Sender<ChannelStatus>,
    connect_timeout: Duration,
}

impl PushChannel {
    pub fn new(url: Url, session: Session, center: NotificationCenter, delay: Duration) -> Self {
        let (status, _) = watch::channel(ChannelStatus::default());
        PushChannel {
            url,
            session,
            center,
            schedule: ReconnectSchedule::new(delay),
            status,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Channel for the API's backend, endpoint derived from its base URL.
    pub fn for_api(
        api: &ApiClient,
        feed: NotificationFeed,
        delay: Duration,
    ) -> Result<Self, ClientError> {
        let url = push_url_for(api.base())?;
        let center = NotificationCenter::new(api.clone(), feed);
        Ok(Self::new(url, api.session().clone(), center, delay))
    }

    /// Upper bound on one WebSocket handshake. A timed-out handshake
    /// counts as an unclean closure.
    pub fn connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }

    pub fn spawn(self) -> ChannelHandle {
        let (commands, rx) = mpsc::channel(8);
        let status = self.status.subscribe();
        let task = tokio::spawn(self.run(rx));
        ChannelHandle {
            commands,
            status,
            task,
        }
    }

    fn publish(&self, link: LinkState) {
        let reconnect_at = self.schedule.deadline();
        let scheduled = self.schedule.scheduled();
        self.status.send_modify(|s| {
            s.link = link;
            s.reconnect_at = reconnect_at;
            s.reconnects_scheduled = scheduled;
            if link == LinkState::Open {
                s.connects += 1;
            }
        });
    }

    async fn run(mut self, mut commands: mpsc::Receiver<ChannelCommand>) {
        let mut identity = self.session.subscribe();
        let mut socket: Option<Socket> = None;
        let mut dial: Option<Dial> = None;

        if identity.borrow_and_update().is_signed_in() {
            dial = Some(self.dial(true));
        }

        loop {
            let deadline = self.schedule.deadline();
            tokio::select! {
                changed = identity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let signed_in = identity.borrow_and_update().is_signed_in();
                    dial = None;
                    close(&mut socket).await;
                    self.schedule.cancel();
                    if signed_in {
                        info!("identity changed, reconnecting push channel");
                        dial = Some(self.dial(true));
                    } else {
                        info!("identity gone, push channel closed");
                        self.center.feed().clear();
                        self.publish(LinkState::Idle);
                    }
                }

                dialed = next_dial(&mut dial) => {
                    dial = None;
                    match dialed {
                        Dialed::Opened(ws) => {
                            self.schedule.on_open();
                            info!(url = %self.url, "push channel connected");
                            self.publish(LinkState::Open);
                            socket = Some(ws);
                        }
                        Dialed::Failed => self.closed(false),
                        Dialed::NoIdentity => {
                            debug!("not connecting push channel: no identity");
                            self.publish(LinkState::Idle);
                        }
                    }
                }

                frame = next_frame(&mut socket) => match frame {
                    Frame::Text(text) => self.deliver(&text),
                    Frame::Ignored => {}
                    Frame::Closed { clean } => {
                        close(&mut socket).await;
                        self.closed(clean);
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.schedule.take_due(Instant::now()) {
                        info!("attempting to reconnect push channel");
                        dial = Some(self.dial(false));
                    }
                }

                command = commands.recv() => match command {
                    Some(ChannelCommand::Reconnect) => {
                        dial = None;
                        close(&mut socket).await;
                        if self.session.state().is_signed_in() {
                            dial = Some(self.dial(false));
                        }
                    }
                    Some(ChannelCommand::Shutdown) | None => {
                        dial = None;
                        close(&mut socket).await;
                        break;
                    }
                },
            }
        }

        drop(dial);
        self.schedule.cancel();
        self.publish(LinkState::Stopped);
        debug!("push channel task stopped");
    }

    /// Start an attempt: optionally reseed the feed over REST, then open the
    /// socket with the current token.
    fn dial(&self, seed: bool) -> Dial {
        self.publish(LinkState::Connecting);
        let url = self.url.clone();
        let session = self.session.clone();
        let center = self.center.clone();
        let limit = self.connect_timeout;

        Box::pin(async move {
            if seed {
                match center.refresh().await {
                    Ok(count) => debug!(count, "notification feed seeded"),
                    Err(e) => warn!(error = %e, "error fetching notifications"),
                }
            }

            let Ok(token) = session.token().await else {
                return Dialed::NoIdentity;
            };
            let mut url = url;
            url.query_pairs_mut().append_pair("token", &token);

            match timeout(limit, connect_async(url.as_str())).await {
                Ok(Ok((socket, _))) => Dialed::Opened(socket),
                Ok(Err(e)) => {
                    warn!(error = %e, "push channel connect failed");
                    Dialed::Failed
                }
                Err(_) => {
                    warn!(?limit, "push channel connect timed out");
                    Dialed::Failed
                }
            }
        })
    }

    fn closed(&mut self, clean: bool) {
        let signed_in = self.session.state().is_signed_in();
        if self.schedule.on_close(clean, signed_in, Instant::now()) {
            info!(delay = ?self.schedule.delay, "push channel dropped, reconnect scheduled");
        } else {
            info!(clean, "push channel closed");
        }
        self.publish(LinkState::Closed { clean });
    }

    fn deliver(&self, text: &str) {
        match serde_json::from_str::<Notification>(text) {
            Ok(notification) => {
                debug!(notification_id = %notification.id, kind = ?notification.kind, "notification received");
                self.center.feed().push(notification);
            }
            Err(e) => warn!(error = %e, "error parsing notification data"),
        }
    }
}

async fn next_dial(dial: &mut Option<Dial>) -> Dialed {
    match dial.as_mut() {
        Some(attempt) => attempt.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(socket: &mut Option<Socket>) -> Frame {
    let Some(ws) = socket.as_mut() else {
        return std::future::pending().await;
    };
    match ws.next().await {
        Some(Ok(Message::Text(text))) => Frame::Text(text.as_str().to_owned()),
        Some(Ok(Message::Close(frame))) => {
            debug!(?frame, "push channel close frame");
            Frame::Closed { clean: true }
        }
        Some(Ok(_)) => Frame::Ignored,
        Some(Err(e)) => {
            debug!(error = %e, "push channel read error");
            Frame::Closed { clean: false }
        }
        None => Frame::Closed { clean: false },
    }
}

async fn close(socket: &mut Option<Socket>) {
    if let Some(mut ws) = socket.take() {
        let _ = timeout(CLOSE_TIMEOUT, ws.close(None)).await;
    }
}

// ── Tests ──────────────────────────────────────────────────────

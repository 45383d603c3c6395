use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};
use yutnori_core::{
    decode, encode, BotScheduler, Broadcaster, ClientMsg, ConnectionId, RoomId, RoomRegistry,
    ServerMsg, BOT_DELAY_MS,
};

#[derive(Parser)]
#[command(name = "yutnori-server", version, about = "Websocket server for yutnori rooms")]
struct Args {
    #[arg(long, env = "YUTNORI_BIND", default_value = "127.0.0.1:8787")]
    bind: SocketAddr,
}

/// Everything the engine reacts to funnels through one channel, so each
/// command runs to completion before the next one starts.
enum EngineCommand {
    Connected { conn: ConnectionId },
    Client { conn: ConnectionId, msg: ClientMsg },
    Disconnected { conn: ConnectionId },
    BotTick { room_id: RoomId },
}

type ConnectionTable = Arc<Mutex<HashMap<ConnectionId, UnboundedSender<Message>>>>;

struct WsBroadcaster {
    connections: ConnectionTable,
}

impl Broadcaster for WsBroadcaster {
    fn send(&self, target: ConnectionId, msg: &ServerMsg) {
        let Some(bytes) = encode(msg) else {
            return;
        };
        if let Some(tx) = self.connections.lock().unwrap().get(&target) {
            let _ = tx.send(Message::Binary(bytes.into()));
        }
    }

    fn send_all(&self, msg: &ServerMsg) {
        let Some(bytes) = encode(msg) else {
            return;
        };
        for tx in self.connections.lock().unwrap().values() {
            let _ = tx.send(Message::Binary(bytes.clone().into()));
        }
    }
}

/// One pending sleep task per room; re-arming aborts the previous one, so
/// at most one deferred bot action can ever be outstanding for a room.
struct TimerScheduler {
    commands: UnboundedSender<EngineCommand>,
    pending: Mutex<HashMap<RoomId, JoinHandle<()>>>,
}

impl BotScheduler for TimerScheduler {
    fn schedule(&self, room_id: &RoomId) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.remove(room_id) {
            handle.abort();
        }
        let commands = self.commands.clone();
        let fired = room_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(BOT_DELAY_MS)).await;
            let _ = commands.send(EngineCommand::BotTick { room_id: fired });
        });
        pending.insert(room_id.clone(), handle);
    }

    fn cancel(&self, room_id: &RoomId) {
        if let Some(handle) = self.pending.lock().unwrap().remove(room_id) {
            handle.abort();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let connections: ConnectionTable = Arc::new(Mutex::new(HashMap::new()));
    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel::<EngineCommand>();

    let broadcaster = WsBroadcaster {
        connections: connections.clone(),
    };
    let scheduler = TimerScheduler {
        commands: commands_tx.clone(),
        pending: Mutex::new(HashMap::new()),
    };

    tokio::spawn(async move {
        let mut registry = RoomRegistry::new(Box::new(broadcaster), Box::new(scheduler));
        while let Some(command) = commands_rx.recv().await {
            match command {
                EngineCommand::Connected { conn } => registry.client_connected(conn),
                EngineCommand::Client { conn, msg } => registry.handle(conn, msg),
                EngineCommand::Disconnected { conn } => registry.disconnect(conn),
                EngineCommand::BotTick { room_id } => registry.run_bot_turn(&room_id),
            }
        }
    });

    let listener = TcpListener::bind(args.bind).await?;
    info!("listening on ws://{}", args.bind);
    let next_conn = AtomicU64::new(1);

    loop {
        let (stream, peer) = listener.accept().await?;
        let conn = next_conn.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(handle_connection(
            stream,
            peer,
            conn,
            connections.clone(),
            commands_tx.clone(),
        ));
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    conn: ConnectionId,
    connections: ConnectionTable,
    commands: UnboundedSender<EngineCommand>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            warn!(%peer, "websocket handshake failed: {err}");
            return;
        }
    };
    info!(%peer, conn, "client connected");

    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    connections.lock().unwrap().insert(conn, tx);
    let _ = commands.send(EngineCommand::Connected { conn });

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = read.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(_) => break,
        };
        match frame {
            Message::Binary(bytes) => match decode::<ClientMsg>(&bytes) {
                Some(msg) => {
                    let _ = commands.send(EngineCommand::Client { conn, msg });
                }
                None => warn!(conn, "dropped undecodable frame"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    connections.lock().unwrap().remove(&conn);
    let _ = commands.send(EngineCommand::Disconnected { conn });
    writer.abort();
    info!(conn, "client disconnected");
}

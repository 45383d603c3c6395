use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use yutnori_core::codec::{decode, encode};
use yutnori_core::protocol::{ClientMsg, ServerMsg};
use yutnori_core::room_id::RoomId;

#[derive(Parser)]
#[command(name = "yutnori-cli", version, about = "Admin tools for yutnori rooms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Rooms {
        #[command(subcommand)]
        command: RoomCommand,
    },
}

#[derive(Subcommand)]
enum RoomCommand {
    Create {
        #[arg(long, env = "YUTNORI_WS_URL", default_value = "ws://localhost:8787")]
        server: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "host")]
        nickname: String,
        #[arg(long, default_value_t = 4)]
        max_players: u8,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value_t = 4)]
        piece_count: u8,
        #[arg(long)]
        no_back_step: bool,
    },
    List {
        #[arg(long, env = "YUTNORI_WS_URL", default_value = "ws://localhost:8787")]
        server: String,
    },
    Watch {
        #[arg(long, env = "YUTNORI_WS_URL", default_value = "ws://localhost:8787")]
        server: String,
        #[arg(long)]
        room_id: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "Spectator")]
        nickname: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rooms { command } => match command {
            RoomCommand::Create {
                server,
                name,
                nickname,
                max_players,
                password,
                piece_count,
                no_back_step,
            } => {
                let msg = ClientMsg::Create {
                    name,
                    nickname,
                    max_players,
                    password,
                    allow_back_step: !no_back_step,
                    piece_count,
                };
                let mut stream = connect(&server).await?;
                send(&mut stream, &msg).await?;
                while let Some(reply) = next_msg(&mut stream).await? {
                    match reply {
                        ServerMsg::Joined { room, player_id } => {
                            println!("room_id: {}", room.id);
                            if let Some(player_id) = player_id {
                                println!("player_id: {player_id}");
                            }
                            break;
                        }
                        ServerMsg::Error { code, message } => {
                            eprintln!("error [{code}]: {message}");
                            break;
                        }
                        _ => {}
                    }
                }
            }
            RoomCommand::List { server } => {
                let mut stream = connect(&server).await?;
                send(&mut stream, &ClientMsg::ListRooms).await?;
                while let Some(reply) = next_msg(&mut stream).await? {
                    if let ServerMsg::Rooms { rooms } = reply {
                        if rooms.is_empty() {
                            println!("no rooms");
                        }
                        for room in rooms {
                            println!(
                                "{} {} {}/{} {:?}{}{}",
                                room.id,
                                room.name,
                                room.player_count,
                                room.max_players,
                                room.status,
                                if room.has_password { " [locked]" } else { "" },
                                if room.allow_back_step { "" } else { " [no back-step]" },
                            );
                        }
                        break;
                    }
                }
            }
            RoomCommand::Watch {
                server,
                room_id,
                password,
                nickname,
            } => {
                let room_id = RoomId::parse(&room_id)?;
                let mut stream = connect(&server).await?;
                let join = ClientMsg::Join {
                    room_id: room_id.to_string(),
                    nickname,
                    password,
                    player_id: None,
                    as_spectator: true,
                };
                send(&mut stream, &join).await?;
                let mut last_seen: Option<String> = None;
                while let Some(reply) = next_msg(&mut stream).await? {
                    match reply {
                        ServerMsg::Joined { room, .. } => {
                            println!("watching {} ({})", room.name, room.id);
                        }
                        ServerMsg::State { room } => {
                            let log = &room.game.activity_log;
                            let start = last_seen
                                .as_ref()
                                .and_then(|id| log.iter().position(|entry| &entry.id == id))
                                .map(|index| index + 1)
                                .unwrap_or(0);
                            for entry in log.iter().skip(start) {
                                println!("{}", entry.message);
                            }
                            if let Some(entry) = log.last() {
                                last_seen = Some(entry.id.clone());
                            }
                        }
                        ServerMsg::Error { code, message } => {
                            eprintln!("error [{code}]: {message}");
                            break;
                        }
                        _ => {}
                    }
                }
            }
        },
    }

    Ok(())
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(server: &str) -> Result<WsStream, Box<dyn std::error::Error>> {
    let url = Url::parse(server)?;
    let (stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
    Ok(stream)
}

async fn send(stream: &mut WsStream, msg: &ClientMsg) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(payload) = encode(msg) {
        stream.send(Message::Binary(payload.into())).await?;
    }
    Ok(())
}

async fn next_msg(stream: &mut WsStream) -> Result<Option<ServerMsg>, Box<dyn std::error::Error>> {
    while let Some(message) = stream.next().await {
        match message? {
            Message::Binary(bytes) => {
                if let Some(msg) = decode::<ServerMsg>(&bytes) {
                    return Ok(Some(msg));
                }
            }
            Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}

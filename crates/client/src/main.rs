mod config;
mod console;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use config::ClientConfig;
use console::Command;
use wakejudge::{CarrierBoard, Connection, ContestApi, ContestHub, JudgingSession};

#[derive(Parser)]
#[command(name = "judge")]
#[command(about = "Wakeboard contest dock and judging console")]
struct Args {
    #[arg(short, long, env = "WAKEJUDGE_ENDPOINT", help = "Contest WebSocket endpoint")]
    endpoint: Option<String>,

    #[arg(long, env = "WAKEJUDGE_BASE_URL", help = "Base URL of the contest HTTP API")]
    base_url: Option<String>,

    #[arg(long, env = "WAKEJUDGE_DEVICE_ID", help = "Device id announced on connect")]
    device_id: Option<String>,

    #[arg(short, long, env = "WAKEJUDGE_JUDGE")]
    judge: Option<String>,

    #[arg(short, long, env = "WAKEJUDGE_PARK")]
    park: Option<String>,

    #[arg(long, env = "WAKEJUDGE_CARRIERS", help = "Carrier count when none are fetched")]
    carriers: Option<u32>,

    #[arg(long, env = "WAKEJUDGE_BACKOFF_MS", help = "Base reconnect delay in ms")]
    backoff_ms: Option<u64>,

    #[arg(long, env = "WAKEJUDGE_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    #[arg(long, help = "Skip fetching riders and carriers over HTTP")]
    offline: bool,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(device_id) = self.device_id {
            config.device_id = device_id;
        }
        if let Some(carriers) = self.carriers {
            config.carrier_count = carriers;
        }
        if let Some(backoff_ms) = self.backoff_ms {
            config.backoff_unit_ms = backoff_ms;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        config.judge = self.judge;
        config.park = self.park;
        config.offline = self.offline;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    log::info!("Device {}", config.device_id);

    let board = bootstrap(&config).await;
    let (connection, mut inbound) = Connection::spawn(config.connection());
    let hub = ContestHub::new(
        connection,
        board,
        JudgingSession::new(config.judge.clone(), config.park.clone()),
    );
    hub.connect(&config.endpoint)?;

    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            envelope = inbound.recv() => match envelope {
                Some(envelope) => hub.dispatch(&envelope),
                None => {
                    log::warn!("Connection driver stopped");
                    break;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match console::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Background) => hub.background(),
                    Ok(Command::Foreground) => hub.foreground(),
                    Ok(Command::Status) => {
                        let connection = hub.connection();
                        println!("connection: {:?} {:?}", connection.state(), connection.stats());
                        println!("{}", console::render_session(&hub));
                    }
                    Ok(command) => match console::execute(&hub, command) {
                        Ok(reply) => println!("{}", reply),
                        Err(e) => println!("error: {}", e),
                    },
                    Err(e) => println!("error: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    hub.shutdown();
    log::info!("Shutting down");
    Ok(())
}

async fn bootstrap(config: &ClientConfig) -> CarrierBoard {
    if config.offline {
        return CarrierBoard::with_slots(config.carrier_count);
    }
    match fetch_board(config).await {
        Ok(board) => board,
        Err(e) => {
            log::warn!("Could not load contest data, starting with empty carriers: {:#}", e);
            CarrierBoard::with_slots(config.carrier_count)
        }
    }
}

async fn fetch_board(config: &ClientConfig) -> Result<CarrierBoard> {
    let api = ContestApi::new(&config.base_url)?;
    let (riders, carriers) = tokio::try_join!(api.fetch_riders(), api.fetch_contest_carriers())?;

    let mut board = if carriers.is_empty() {
        CarrierBoard::with_slots(config.carrier_count)
    } else {
        CarrierBoard::from_carriers(carriers)
    };
    board.set_riders(riders);
    Ok(board)
}

use clap::Parser;
use log::info;
use server::config::GameConfig;
use server::network::{Server, ServerMessage};
use shared::{
    Grid, BOARD_HEIGHT, BOARD_WIDTH, CELL_SIZE, CLIENT_TIMEOUT_SECS,
    INITIAL_FRUIT_COUNT, TICK_MS,
};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3333")]
    port: u16,

    /// Milliseconds between simulation ticks
    #[arg(short, long, default_value_t = TICK_MS)]
    tick_ms: u64,

    /// Board width in units
    #[arg(long, default_value_t = BOARD_WIDTH)]
    width: i32,

    /// Board height in units
    #[arg(long, default_value_t = BOARD_HEIGHT)]
    height: i32,

    /// Size of one grid cell in units
    #[arg(long, default_value_t = CELL_SIZE)]
    cell_size: i32,

    /// Number of fruits kept on the board
    #[arg(short, long, default_value_t = INITIAL_FRUIT_COUNT)]
    fruits: usize,

    /// Maximum number of concurrent sessions
    #[arg(short, long, default_value = "32")]
    max_clients: usize,

    /// Seconds of silence before a session is dropped
    #[arg(long, default_value_t = CLIENT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Seed for fruit placement, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            tick_duration: Duration::from_millis(self.tick_ms),
            grid: Grid::new(self.width, self.height, self.cell_size),
            fruit_count: self.fruits,
            max_clients: self.max_clients,
            client_timeout: Duration::from_secs(self.timeout_secs),
            seed: self.seed,
            ..GameConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let config = args.game_config();

    info!("Starting server on {}", address);
    info!(
        "Board {}x{} (cell {}), tick {:?}, {} fruits",
        config.grid.width,
        config.grid.height,
        config.grid.cell_size,
        config.tick_duration,
        config.fruit_count
    );

    let mut server = Server::new(&address, config).await?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = shutdown.send(ServerMessage::Shutdown);
        }
    });

    server.run().await?;

    Ok(())
}

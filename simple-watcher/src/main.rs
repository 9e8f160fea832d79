use {
    anyhow::{
        anyhow,
        Result,
    },
    clap::Parser,
    lotline_client::{
        ClientConfig,
        Marketplace,
    },
    std::io::IsTerminal,
    tracing_subscriber::filter::LevelFilter,
};

#[derive(Parser, Clone, Debug)]
pub struct RunOptions {
    /// The http url of the lotline api server.
    #[arg(long = "server-url")]
    #[arg(env = "SERVER_URL")]
    pub server_url: String,

    /// The websocket url of the lotline push gateway.
    #[arg(long = "ws-url")]
    #[arg(env = "WS_URL")]
    pub ws_url: String,

    /// The auction to watch.
    #[arg(long = "auction-id", required = true)]
    #[arg(env = "AUCTION_ID")]
    pub auction_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize a Tracing Subscriber
    let fmt_builder = tracing_subscriber::fmt()
        .with_file(false)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal());

    // Use the compact formatter if we're in a terminal, otherwise use the JSON formatter.
    if std::io::stderr().is_terminal() {
        tracing::subscriber::set_global_default(fmt_builder.compact().finish())?;
    } else {
        tracing::subscriber::set_global_default(fmt_builder.json().finish())?;
    }

    let args: RunOptions = RunOptions::parse();
    let market = Marketplace::try_new(ClientConfig {
        http_url: args.server_url.clone(),
        ws_url:   args.ws_url.clone(),
    })
    .map_err(|e| {
        eprintln!("Failed to create client: {:?}", e);
        anyhow!("Failed to create client")
    })?;

    let room = market.open_auction(args.auction_id.clone()).await?;
    let mut view = room.subscribe();
    loop {
        {
            let view = view.borrow_and_update();
            tracing::info!(
                status = ?view.snapshot.status,
                price = view.snapshot.current_price,
                bids = view.snapshot.bid_count,
                connection = ?view.connection,
                "auction update"
            );
            if view.snapshot.status.is_terminal() {
                break;
            }
        }
        if view.changed().await.is_err() {
            break;
        }
    }
    Ok(())
}

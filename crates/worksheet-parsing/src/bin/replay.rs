//! Replays a recorded parse stream and prints the resulting state.
//!
//! Usage: `worksheet-replay <transcript.sse> [attachment-id] [initial|reparse]`
//!
//! Configuration is read from the file named by `WORKSHEET_PARSING_CONFIG`
//! when set.

use std::process::ExitCode;
use std::sync::Arc;

use futures_util::stream;
use log::{error, info};

use worksheet_parsing::parsing::StreamType;
use worksheet_parsing::{
    load_config, logging, ParsingConfig, ParsingDriver, ParsingError, ParsingStore, Result, StreamRequest,
};

const CONFIG_ENV: &str = "WORKSHEET_PARSING_CONFIG";
/// Replayed bodies are fed in small chunks, like a network read would.
const CHUNK_SIZE: usize = 256;

struct Args {
    transcript: String,
    attachment_id: String,
    stream_type: StreamType,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let transcript = args
        .next()
        .ok_or_else(|| {
            ParsingError::Usage(
                "usage: worksheet-replay <transcript.sse> [attachment-id] [initial|reparse]".to_string(),
            )
        })?;
    let attachment_id = args.next().unwrap_or_else(|| "replay".to_string());
    let stream_type = match args.next().as_deref() {
        None | Some("initial") => StreamType::Initial,
        Some("reparse") => StreamType::Reparse,
        Some(other) => return Err(ParsingError::Usage(format!("unknown stream type '{}'", other))),
    };

    Ok(Args {
        transcript,
        attachment_id,
        stream_type,
    })
}

fn load() -> Result<ParsingConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => Ok(load_config(path)?),
        Err(_) => Ok(ParsingConfig::default()),
    }
}

async fn run() -> Result<()> {
    let args = parse_args()?;
    let config = load()?;
    logging::init(&config.logging)?;

    info!(
        "Replaying {} as {} stream for {}",
        args.transcript, args.stream_type, args.attachment_id
    );

    let body = tokio::fs::read(&args.transcript).await?;
    let chunks: Vec<std::io::Result<Vec<u8>>> =
        body.chunks(CHUNK_SIZE).map(|c| Ok(c.to_vec())).collect();

    let store = Arc::new(ParsingStore::new(config.broadcast_capacity));
    let driver = ParsingDriver::new(Arc::clone(&store), &config);

    let request = StreamRequest {
        attachment_id: args.attachment_id,
        stream_type: args.stream_type,
        total_problems: None,
    };
    driver.start(request, stream::iter(chunks))?.wait().await;

    let state = store.snapshot();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Replay failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

use {
    base::log,
    com::{WsClient, WsMessage},
    std::{net::SocketAddr, time::Duration},
};

const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const LINGER: Duration = Duration::from_secs(4);
const JPEG_QUALITY: u8 = 90;

fn usage() -> ! {
    eprintln!("usage: liveness-client <addr> <image>...");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    base::init_stdout_logger();

    let mut args = std::env::args().skip(1);
    let addr: SocketAddr = match args.next() {
        Some(addr) => addr.parse()?,
        None => usage(),
    };
    let paths: Vec<String> = args.collect();
    if paths.is_empty() {
        usage();
    }

    // re-encode every file as JPEG, the way a camera client sends them
    let mut frames = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = std::fs::read(path)?;
        let decoded = image::decode_image(&bytes).await?;
        log::info!("{}: {}x{}", path, decoded.width(), decoded.height());
        frames.push(image::encode_jpeg(decoded, JPEG_QUALITY).await?);
    }

    let mut client = WsClient::connect(addr).await?;
    log::info!("Connected to {}", addr);

    client.send_text(r#"{"command":"START_ANALYSIS"}"#).await?;

    for frame in frames {
        client.send_binary(frame).await?;
        if !drain(&mut client, FRAME_INTERVAL).await {
            return Ok(());
        }
    }

    // stay around for the decision and the auto-reset notice
    drain(&mut client, LINGER).await;
    client.close().await.ok();
    Ok(())
}

/// Print everything that arrives within `window`. Returns false once the server hangs up.
async fn drain(client: &mut WsClient, window: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        match tokio::time::timeout_at(deadline, client.recv()).await {
            Err(_) => return true,
            Ok(Ok(WsMessage::Text(text))) => println!("{}", text),
            Ok(Ok(WsMessage::Binary(data))) => println!("<{} binary bytes>", data.len()),
            Ok(Err(e)) => {
                log::info!("Connection ended: {}", e);
                return false;
            }
        }
    }
}

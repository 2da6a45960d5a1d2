//! # Example: stdin ⇄ broadcast relay
//!
//! Broadcasts every stdin line and prints everything heard on the port,
//! including its own lines. Run two copies on one host (the socket uses
//! `SO_REUSEADDR`) to see them talk:
//!
//! ```text
//! UDPCAST_ADDR=127.0.0.1 RUST_LOG=info cargo run --example relay
//! ```

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use udpcast::{ClientHandle, DriverConfig, LogWriter, Subscribe, UdpBroadcast};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DriverConfig::from_env()?;
    let driver = Arc::new(
        UdpBroadcast::builder(cfg)
            .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
            .build(),
    );
    driver.setup().await?;

    let me = ClientHandle::next();
    driver.subscribe(me)?;

    let reader = Arc::clone(&driver);
    let printer = tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(50));
        loop {
            tick.tick().await;
            loop {
                match reader.take(me) {
                    Ok(Some(msg)) => {
                        let at = msg.arrival();
                        let waited = SystemTime::now()
                            .duration_since(at.to_system_time())
                            .unwrap_or_default();
                        println!(
                            "[{}.{:06} +{}ms] {}",
                            at.secs(),
                            at.subsec_micros(),
                            waited.as_millis(),
                            String::from_utf8_lossy(msg.payload())
                        );
                    }
                    Ok(None) => break,
                    Err(_) => return,
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let signal = udpcast::wait_for_shutdown_signal();
    tokio::pin!(signal);
    loop {
        tokio::select! {
            res = &mut signal => {
                res?;
                break;
            }
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Err(err) = driver.submit(me, line.as_bytes()).await {
                        eprintln!("send failed: {err}");
                    }
                }
                None => break,
            }
        }
    }

    driver.unsubscribe(me)?;
    driver.shutdown().await?;
    printer.abort();
    Ok(())
}

//! End-to-end over real UDP sockets on the loopback interface.

use std::sync::Arc;
use std::time::Duration;

use udpcast::{ClientHandle, DriverConfig, DriverError, EventKind, UdpBroadcast};

fn loopback_config() -> DriverConfig {
    DriverConfig {
        addr: "127.0.0.1".into(),
        port: 0,
        grace_ms: 2_000,
        ..DriverConfig::default()
    }
}

async fn wait_received(events: &mut tokio::sync::broadcast::Receiver<udpcast::Event>, n: usize) {
    let mut seen = 0;
    while seen < n {
        let ev = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("packet within timeout")
            .expect("bus open");
        if ev.kind == EventKind::PacketReceived {
            seen += 1;
        }
    }
}

#[tokio::test]
async fn broadcast_reaches_every_subscriber() -> anyhow::Result<()> {
    let driver = Arc::new(UdpBroadcast::new(loopback_config()));
    driver.setup().await?;
    let mut events = driver.events();

    let alice = ClientHandle::next();
    let bob = ClientHandle::next();
    driver.subscribe(alice)?;
    driver.subscribe(bob)?;

    driver.submit(alice, b"first").await?;
    wait_received(&mut events, 1).await;
    driver.submit(bob, b"second").await?;
    wait_received(&mut events, 1).await;

    let mut buf = vec![0u8; 64];
    for client in [alice, bob] {
        assert_eq!(driver.pending(client)?, 2);

        let a = driver.retrieve(client, &mut buf)?;
        assert_eq!(&buf[..a.len], b"first");
        let b = driver.retrieve(client, &mut buf)?;
        assert_eq!(&buf[..b.len], b"second");
        assert!(a.timestamp < b.timestamp);

        assert!(driver.retrieve(client, &mut buf)?.is_empty());
    }

    driver.shutdown().await?;
    assert!(matches!(driver.pending(alice), Err(DriverError::NotRunning)));
    Ok(())
}

#[tokio::test]
async fn late_subscriber_misses_earlier_traffic() -> anyhow::Result<()> {
    let driver = UdpBroadcast::new(loopback_config());
    driver.setup().await?;
    let mut events = driver.events();

    let early = ClientHandle::next();
    driver.subscribe(early)?;
    driver.submit(early, b"before").await?;
    wait_received(&mut events, 1).await;

    let late = ClientHandle::next();
    driver.subscribe(late)?;
    assert_eq!(driver.pending(early)?, 1);
    assert_eq!(driver.pending(late)?, 0);

    driver.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn shutdown_does_not_wait_for_traffic() -> anyhow::Result<()> {
    let driver = UdpBroadcast::new(loopback_config());
    driver.setup().await?;
    driver.subscribe(ClientHandle::next())?;

    tokio::time::timeout(Duration::from_secs(1), driver.shutdown())
        .await
        .expect("shutdown returns while the socket is idle")?;
    assert!(!driver.is_running());
    Ok(())
}

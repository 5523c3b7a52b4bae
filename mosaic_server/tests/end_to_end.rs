use std::time::Duration;

use image::{Rgba, RgbaImage};
use mosaic_server::{ServerConfig, start_server, tile_markup};
use photomosaic::{
    ColorSample, HttpTileFetcher, MosaicConfig, MosaicError, MosaicPipeline, OffloadMode, TileFetcher,
};

async fn spawn_server() -> String {
    let cfg = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    };
    let (addr, _handle) = start_server(cfg).await.expect("server start");
    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn renders_mosaic_through_the_tile_server() {
    let base = spawn_server().await;
    let fetcher = HttpTileFetcher::new(base, Duration::from_secs(5));
    let config = MosaicConfig {
        offload: OffloadMode::Pool(2),
        ..MosaicConfig::default()
    };
    let pipeline = MosaicPipeline::new(config, fetcher).unwrap();

    let image = RgbaImage::from_fn(32, 40, |x, y| match (x < 16, y < 16) {
        (true, true) => Rgba([255, 0, 0, 255]),
        (false, true) => Rgba([0, 255, 0, 255]),
        _ => Rgba([0, 0, 255, 255]),
    });
    let mut rows: Vec<String> = Vec::new();
    let report = pipeline.render(&image, &mut rows).await.unwrap();

    assert_eq!((report.rows, report.cols), (3, 2));
    let tile = |hex: &str| tile_markup(&hex.parse::<ColorSample>().unwrap(), 16, 16);
    assert_eq!(rows[0], format!("{}{}", tile("ff0000"), tile("00ff00")));
    assert_eq!(rows[1], format!("{}{}", tile("0000ff"), tile("0000ff")));
    assert_eq!(rows[2], rows[1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_rejects_malformed_colors() {
    let base = spawn_server().await;

    let url = format!("{base}/color/XYZ");
    let status = tokio::task::spawn_blocking(move || match ureq::get(&url).call() {
        Ok(response) => response.status(),
        Err(ureq::Error::Status(code, _)) => code,
        Err(e) => panic!("transport error: {e}"),
    })
    .await
    .unwrap();
    assert_eq!(status, 400);

    let fetcher = HttpTileFetcher::new(format!("{base}/missing"), Duration::from_secs(5));
    let err = fetcher.fetch(&ColorSample::from_rgb(1, 2, 3)).await.unwrap_err();
    assert!(matches!(err, MosaicError::FetchFailure { ref reason, .. } if reason.contains("404")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_check_and_content_type() {
    let base = spawn_server().await;
    let (health, content_type) = tokio::task::spawn_blocking(move || {
        let health = ureq::get(&format!("{base}/healthz")).call().unwrap().into_string().unwrap();
        let tile = ureq::get(&format!("{base}/color/00ff00")).call().unwrap();
        (health, tile.content_type().to_string())
    })
    .await
    .unwrap();
    assert_eq!(health, "ok");
    assert_eq!(content_type, "image/svg+xml");
}

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use video_proxy::ProxySettings;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = ProxySettings::from_env();
    let ax = video_proxy::build(&settings).await?;

    let addr = settings.addr();
    tracing::info!(%addr, bucket = %settings.bucket, "video proxy listening");

    ax.listen(addr).await?;

    Ok(())
}

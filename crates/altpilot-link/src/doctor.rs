use anyhow::Result;

pub fn check_endpoint(endpoint: &str) -> Result<()> {
    let rest = endpoint
        .strip_prefix("ws://")
        .ok_or_else(|| anyhow::anyhow!("link.endpoint must start with ws:// (got {:?})", endpoint))?;
    let authority = rest.split('/').next().unwrap_or_default();
    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("link.endpoint missing port: {}", endpoint))?;
    anyhow::ensure!(!host.is_empty(), "link.endpoint missing host: {}", endpoint);
    let port: u16 = port.parse().map_err(|_| anyhow::anyhow!("link.endpoint port invalid: {}", port))?;
    anyhow::ensure!(port > 0, "link.endpoint port must be non-zero");
    Ok(())
}

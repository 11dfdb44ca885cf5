//! `amparo serve` — Start the HTTP gateway.

use std::path::Path;

use anyhow::Context;

pub async fn run(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path).context("Failed to load configuration")?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    println!("⚖️  Amparo - Defensa Pública de Mendoza");
    println!("   Escuchando en: {}:{}", config.server.host, config.server.port);
    println!("   Fueros: {}", config.domains.len());
    println!("   Base de conocimiento: {}", config.knowledge.file);

    amparo_gateway::start(config)
        .await
        .map_err(anyhow::Error::from_boxed)?;

    Ok(())
}

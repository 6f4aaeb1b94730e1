use acmegate::notify::Notifier;
use acmegate::relay::Bridge;
use acmegate::user_store::UserStore as _;
use acmegate::{Config, SharedConfig};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("acmegate".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let users = config.user_store().await?;
    if let Some(admin) = &config.bootstrap_admin {
        users
            .write()
            .await
            .put_user(&admin.username, &admin.password, true)
            .await?;
        tracing::debug!("ensured bootstrap admin \"{}\"", admin.username);
    }
    let relation = config.relation_store().await?;
    let notifier = Arc::new(Notifier::new(
        config.notify_program.clone(),
        config.notify_timeout,
    ));
    let bridge = Arc::new(Bridge::new(relation, config.namespace, config.primary));

    tracing::info!("API listening on {}", &config.api_bind_addr);
    let api_server = acmegate::new_api(config.clone(), users, notifier);
    let api_handle = tokio::spawn(api_server);

    tracing::info!("relay listening on {}", &config.relay_bind_addr);
    let relay_server = acmegate::new_relay(config.clone(), bridge);
    let relay_handle = tokio::spawn(relay_server);

    // TODO(XXX): proper graceful shutdown.
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
        Ok(relay_res) = relay_handle => {
            if let Err(err) = relay_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acmegate=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            let config = Config::try_from_file(&config_file)?;
            Ok(Arc::new(config))
        }
    }
}

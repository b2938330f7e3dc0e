mod geocode;
mod notifier;
mod poller;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = slotwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = slotwatch_core::load_watch_settings(&config.watch_path)?;
    let directory = slotwatch_core::load_offices(&config.offices_path)?;

    tracing::info!(
        check_every_minutes = settings.check_every_minutes,
        max_distance_miles = settings.max_distance_miles,
        home = %settings.home,
        mode = if settings.drive_test { "drive test" } else { "office visit" },
        "watching for appointment slots"
    );

    let geocoder = reqwest::Client::new();
    let home = geocode::resolve_home(
        &geocoder,
        &settings.home,
        config.geocoding_api_key.as_deref(),
    )
    .await;

    let offices =
        slotwatch_core::filter_nearby(&directory.offices, home, settings.max_distance_miles);
    for nearby in &offices {
        tracing::info!(
            office = %nearby.office.name,
            distance_miles = nearby.distance_miles,
            "office within range"
        );
    }

    let client = slotwatch_scraper::AppointmentClient::new(
        &config.base_url,
        &config.user_agent,
        config.connect_timeout_secs,
    )?;
    let notifier = notifier::Notifier::new();

    let poller = tokio::spawn(poller::run(client, settings, offices, notifier.clone()));

    let app = notifier::build_app(notifier);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "notification server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

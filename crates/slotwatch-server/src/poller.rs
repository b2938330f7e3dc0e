//! The infinite poll scheduler.
//!
//! Offices are visited strictly sequentially, never in parallel, with a fixed
//! delay between offices and a cooldown between cycles. Every failure is
//! contained and logged: a bad office turn never aborts the cycle, a bad
//! cycle never stops the loop. The process only ends on an external signal.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use slotwatch_core::{NearbyOffice, WatchSettings};
use slotwatch_scraper::{AppointmentClient, MatchSignal, Matcher, ScraperError};

use crate::notifier::Notifier;

#[derive(Debug, Error)]
enum CycleError {
    #[error("no offices within range; nothing to poll")]
    NoOffices,
}

/// Drives polling forever. The office list is computed once at startup and
/// never refreshed.
pub async fn run(
    client: AppointmentClient,
    settings: WatchSettings,
    offices: Vec<NearbyOffice>,
    notifier: Notifier,
) {
    let mut matcher = Matcher::new(
        settings.schedule.clone(),
        settings.find_appointment_within_days,
    );

    loop {
        if let Err(e) = run_cycle(&client, &settings, &offices, &mut matcher, &notifier).await {
            tracing::error!(error = %e, "poll cycle failed");
        }
        tracing::debug!(
            minutes = settings.check_every_minutes,
            "cooling down until the next cycle"
        );
        sleep(Duration::from_secs(settings.check_every_minutes * 60)).await;
    }
}

/// One full pass over the office list. Per-office failures are logged and the
/// cycle proceeds; the inter-office delay applies whatever the outcome.
async fn run_cycle(
    client: &AppointmentClient,
    settings: &WatchSettings,
    offices: &[NearbyOffice],
    matcher: &mut Matcher,
    notifier: &Notifier,
) -> Result<(), CycleError> {
    if offices.is_empty() {
        return Err(CycleError::NoOffices);
    }

    for nearby in offices {
        if let Err(e) = poll_office(client, settings, nearby, matcher, notifier).await {
            tracing::warn!(
                office = %nearby.office.name,
                error = %e,
                "office poll failed; moving on"
            );
        }
        sleep(Duration::from_secs(settings.seconds_between_requests)).await;
    }

    Ok(())
}

async fn poll_office(
    client: &AppointmentClient,
    settings: &WatchSettings,
    nearby: &NearbyOffice,
    matcher: &mut Matcher,
    notifier: &Notifier,
) -> Result<(), ScraperError> {
    tracing::debug!(
        office = %nearby.office.name,
        distance_miles = nearby.distance_miles,
        "polling office"
    );

    let html = client
        .fetch_appointment_page(&nearby.office, settings)
        .await?;

    for signal in matcher.evaluate(&html, &nearby.office.name) {
        match signal {
            MatchSignal::Found(found) => {
                tracing::info!(
                    office = %found.office_name,
                    date = %found.formatted,
                    "found new match!"
                );
                notifier.notify_match(&found);
            }
            MatchSignal::Duplicate { office_name, .. } => {
                tracing::info!(office = %office_name, "found duplicate match!");
                notifier.notify_duplicate();
            }
        }
    }

    Ok(())
}

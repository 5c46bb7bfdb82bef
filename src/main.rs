use anyhow::Context as _;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fairbatch::api::{self, ApiState};
use fairbatch::bridge::{BlockchainBridge, DevBridge};
use fairbatch::clock::{Clock, SystemClock};
use fairbatch::config::CoordinatorConfig;
use fairbatch::dispatcher::EventDispatcher;
use fairbatch::domain::BatchStatus;
use fairbatch::repository::{BatchRepository, MemoryBatchRepository};
use fairbatch::service_metrics::ServiceMetrics;
use fairbatch::usecases::{
    AdvanceBatchPhase, AdvanceBatchPhaseRequest, CoordinatorContext, PhaseTarget,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match CoordinatorConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };
    let validation = config.validate();
    validation.log_summary();
    if !validation.valid {
        error!("configuration validation failed, refusing to start");
        std::process::exit(1);
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics = Arc::new(ServiceMetrics::new());
    let repository = Arc::new(MemoryBatchRepository::new());
    let bridge = Arc::new(DevBridge::new());
    bridge
        .start_event_listening()
        .await
        .context("starting bridge event listener")?;

    let dispatcher = Arc::new(EventDispatcher::new());
    dispatcher.subscribe(|event| {
        info!(
            aggregate_id = %event.aggregate_id,
            event = event.event_name,
            "domain event"
        );
    });

    info!(
        rpc = %config.sepolia_rpc_url,
        "running with the in-memory repository and dev bridge; wire external adapters for production"
    );

    let ctx = CoordinatorContext::new(
        repository.clone(),
        bridge,
        clock.clone(),
        dispatcher,
        metrics.clone(),
    );

    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port)
        .parse()
        .context("invalid API_HOST/API_PORT")?;
    let router = api::router(Arc::new(ApiState {
        metrics,
        repository: repository.clone(),
        clock: clock.clone(),
    }));
    tokio::spawn(async move {
        info!("API listening on http://{}", addr);
        if let Err(err) = axum::Server::bind(&addr)
            .serve(router.into_make_service())
            .await
        {
            error!("API server crashed: {err}");
            std::process::exit(1);
        }
    });

    // Deadline ticker: recorded phases are advanced once the wall clock
    // passes their deadlines. The aggregate itself already refuses stale
    // operations, so this only keeps the recorded status in step.
    let advance = AdvanceBatchPhase::new(ctx);
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                advance_lagging_phase(repository.as_ref(), &advance, clock.now()).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn advance_lagging_phase(
    repository: &dyn BatchRepository,
    advance: &AdvanceBatchPhase,
    now: DateTime<Utc>,
) {
    let batch = match repository.get_current_active_batch(now).await {
        Ok(Some(batch)) => batch,
        Ok(None) => return,
        Err(err) => {
            warn!("deadline ticker could not load the active batch: {err}");
            return;
        }
    };

    let target = if batch.status() == BatchStatus::CommitmentPhase
        && now >= batch.commitment_phase_end()
    {
        PhaseTarget::Reveal
    } else if batch.status() == BatchStatus::RevealPhase && now >= batch.reveal_phase_end() {
        PhaseTarget::Execution
    } else {
        return;
    };

    if let Err(err) = advance
        .execute(AdvanceBatchPhaseRequest {
            batch_id: Some(batch.id().to_string()),
            target,
        })
        .await
    {
        warn!(batch_id = %batch.id(), "deadline ticker could not advance batch: {err}");
    }
}

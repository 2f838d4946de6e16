// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use clusterdns::{
    config::{ConfigKey, ConfigReader, StaticConfig},
    constants::{
        DEFAULT_CONFIG_MAP_NAME, DEFAULT_CONFIG_NAMESPACE, ERROR_REQUEUE_DURATION_SECS,
        KIND_CLUSTER, KIND_ZONE, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH,
        METRICS_SERVER_PORT, RESYNC_REQUEUE_DURATION_SECS, TOKIO_WORKER_THREADS,
    },
    crd::{Cluster, RRset, Zone},
    errors::Error,
    metrics,
    reconcilers::{ClusterReconciler, ReconcileOutcome, ZoneReconciler},
    store::KubeStore,
};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, Resource, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

type ClusterContext = ClusterReconciler<KubeStore, StaticConfig>;
type ZoneContext = ZoneReconciler<KubeStore, StaticConfig>;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] Error);

/// Derives PowerDNS zones, record sets and external-dns workloads from
/// dockyards clusters.
#[derive(Debug, Parser)]
#[command(name = "clusterdns", version, about)]
struct Args {
    /// Name of the platform configuration `ConfigMap`
    #[arg(long, default_value = DEFAULT_CONFIG_MAP_NAME)]
    config_map: String,

    /// Namespace of the platform configuration `ConfigMap`
    #[arg(
        long,
        visible_alias = "dockyards-namespace",
        default_value = DEFAULT_CONFIG_NAMESPACE
    )]
    config_namespace: String,

    /// Port the Prometheus metrics endpoint listens on
    #[arg(long, default_value_t = METRICS_SERVER_PORT)]
    metrics_port: u16,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("clusterdns-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    // Format: timestamp file:line LEVEL message
    // RUST_LOG selects the level (default info), RUST_LOG_FORMAT=json switches to JSON lines
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting clusterdns controller");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    let config = StaticConfig::load(client.clone(), &args.config_map, &args.config_namespace).await?;
    // Zones cannot be named without it, so there is no point in starting
    config.require(ConfigKey::ManagementDomain)?;
    let config = Arc::new(config);

    let store = Arc::new(KubeStore::new(client.clone()));
    let cluster_reconciler = Arc::new(ClusterReconciler::new(store.clone(), config.clone()));
    let zone_reconciler = Arc::new(ZoneReconciler::new(store, config));

    info!("Starting all controllers");

    // Controllers and the metrics server should never exit; a signal drops
    // them together with any in-flight pass
    tokio::select! {
        result = run_cluster_controller(client.clone(), cluster_reconciler) => {
            error!("CRITICAL: Cluster controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Cluster controller exited unexpectedly without error")
        }
        result = run_zone_controller(client.clone(), zone_reconciler) => {
            error!("CRITICAL: Zone controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Zone controller exited unexpectedly without error")
        }
        result = run_metrics_server(args.metrics_port) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = shutdown_signal() => {
            result?;
            info!("Graceful shutdown complete");
            Ok(())
        }
    }
}

/// Run the `Cluster` controller
///
/// Owned zones retrigger their cluster, so a zone drifting from its derived
/// state is converged again.
async fn run_cluster_controller(client: Client, ctx: Arc<ClusterContext>) -> Result<()> {
    info!("Starting Cluster controller");

    let api = Api::<Cluster>::all(client.clone());
    let zones = Api::<Zone>::all(client);

    Controller::new(api, Config::default())
        .owns(zones, Config::default())
        .run(
            reconcile_cluster_wrapper,
            error_policy::<Cluster, ClusterContext>,
            ctx,
        )
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `Zone` controller
async fn run_zone_controller(client: Client, ctx: Arc<ZoneContext>) -> Result<()> {
    info!("Starting Zone controller");

    let api = Api::<Zone>::all(client.clone());
    let rrsets = Api::<RRset>::all(client);

    Controller::new(api, Config::default())
        .owns(rrsets, Config::default())
        .run(reconcile_zone_wrapper, error_policy::<Zone, ZoneContext>, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `Cluster`
async fn reconcile_cluster_wrapper(
    cluster: Arc<Cluster>,
    ctx: Arc<ClusterContext>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let namespace = object_namespace(cluster.as_ref())?;
    let name = cluster.name_any();

    debug!(cluster = %name, namespace = %namespace, "Reconcile wrapper called for Cluster");

    match ctx.reconcile(&namespace, &name).await {
        Ok(outcome) => {
            metrics::record_reconciliation_success(KIND_CLUSTER, start.elapsed());
            debug!(cluster = %name, outcome = %outcome, "Reconciled Cluster");
            Ok(requeue_action(KIND_CLUSTER, &outcome))
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_CLUSTER, start.elapsed());
            error!(cluster = %name, reason = e.reason(), "Failed to reconcile Cluster: {}", e);
            Err(e.into())
        }
    }
}

/// Reconcile wrapper for `Zone`
async fn reconcile_zone_wrapper(
    zone: Arc<Zone>,
    ctx: Arc<ZoneContext>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let namespace = object_namespace(zone.as_ref())?;
    let name = zone.name_any();

    debug!(zone = %name, namespace = %namespace, "Reconcile wrapper called for Zone");

    match ctx.reconcile(&namespace, &name).await {
        Ok(outcome) => {
            metrics::record_reconciliation_success(KIND_ZONE, start.elapsed());
            debug!(zone = %name, outcome = %outcome, "Reconciled Zone");
            Ok(requeue_action(KIND_ZONE, &outcome))
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_ZONE, start.elapsed());
            error!(zone = %name, reason = e.reason(), "Failed to reconcile Zone: {}", e);
            Err(e.into())
        }
    }
}

fn object_namespace<K>(object: &K) -> Result<String, ReconcileError>
where
    K: Resource<DynamicType = ()>,
{
    object.namespace().ok_or_else(|| {
        ReconcileError(Error::MissingMetadata {
            kind: K::kind(&()).to_string(),
            field: "namespace",
        })
    })
}

/// Maps a finished pass to the controller action.
///
/// Converged objects are resynced periodically so that the daily SOA serial
/// and provider address drift are picked up without a watch event. Waiting
/// objects are retriggered by the change they wait for.
fn requeue_action(resource_type: &str, outcome: &ReconcileOutcome) -> Action {
    if outcome.is_converged() {
        metrics::record_reconciliation_requeue(resource_type, "resync");
        Action::requeue(Duration::from_secs(RESYNC_REQUEUE_DURATION_SECS))
    } else {
        Action::await_change()
    }
}

/// Error policy shared by both controllers
fn error_policy<K, C>(resource: Arc<K>, err: &ReconcileError, _ctx: Arc<C>) -> Action
where
    K: Resource<DynamicType = ()>,
{
    let resource_type = K::kind(&());
    metrics::record_error(&resource_type, err.0.reason());
    metrics::record_reconciliation_requeue(&resource_type, "error");
    debug!(
        resource = %resource.name_any(),
        retryable = err.0.is_retryable(),
        "Requeueing after error in {} seconds",
        ERROR_REQUEUE_DURATION_SECS
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Serve Prometheus metrics until the listener fails
async fn run_metrics_server(port: u16) -> Result<()> {
    let address = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Metrics server listening on {}{}", address, METRICS_SERVER_PATH);

    axum::serve(listener, metrics_router()).await?;
    Ok(())
}

fn metrics_router() -> Router {
    Router::new().route(METRICS_SERVER_PATH, get(metrics_handler))
}

async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

use std::{net::SocketAddr, sync::Arc, time::Duration};

use pessimist_chain_observer::{cosmos::CosmosSource, SnapshotObserver};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warp::{
    http::StatusCode,
    reply::{self, Reply, Response},
    Filter, Rejection,
};

use crate::{
    attestor::{Attestor, ChainAttestor},
    cli::{AttestorConfig, ServerConfig},
    coordinator::Coordinator,
    metrics,
    signer::Signer,
    AttestorError,
};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Query of `GET /claims/{chain_id}`.
#[derive(Debug, Default, Deserialize)]
pub struct ClaimsQuery {
    #[serde(default)]
    pub from: u64,
}

fn json_or_not_found<T: Serialize>(
    result: Result<Option<T>, AttestorError>,
    missing: impl FnOnce() -> String,
) -> Response {
    match result {
        Ok(Some(value)) => reply::json(&value).into_response(),
        Ok(None) => error_reply(StatusCode::NOT_FOUND, missing()),
        Err(e) => error_reply(StatusCode::NOT_FOUND, e.to_string()),
    }
}

fn error_reply(status: StatusCode, error: String) -> Response {
    reply::with_status(reply::json(&ErrorBody { error }), status).into_response()
}

pub fn chains_reply<A: ChainAttestor>(coordinator: &Coordinator<A>) -> Response {
    reply::json(&coordinator.chain_ids()).into_response()
}

pub fn latest_claim_reply<A: ChainAttestor>(
    coordinator: &Coordinator<A>,
    chain_id: &str,
) -> Response {
    json_or_not_found(coordinator.latest_signed_claim(chain_id), || {
        format!("no claim signed yet for `{chain_id}`")
    })
}

pub fn claim_at_height_reply<A: ChainAttestor>(
    coordinator: &Coordinator<A>,
    chain_id: &str,
    height: u64,
) -> Response {
    json_or_not_found(coordinator.claim_at_height(chain_id, height), || {
        format!("no claim retained for `{chain_id}` at height {height}")
    })
}

pub fn claims_from_height_reply<A: ChainAttestor>(
    coordinator: &Coordinator<A>,
    chain_id: &str,
    from: u64,
) -> Response {
    match coordinator.claims_from_height(chain_id, from) {
        Ok(claims) => reply::json(&claims).into_response(),
        Err(e) => error_reply(StatusCode::NOT_FOUND, e.to_string()),
    }
}

pub fn status_reply<A: ChainAttestor>(coordinator: &Coordinator<A>) -> Response {
    reply::json(&coordinator.statuses()).into_response()
}

pub fn metrics_reply() -> Response {
    match metrics::gather_text() {
        Ok(text) => text.into_response(),
        Err(e) => error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// `GET` routes of the attestor API.
pub fn routes<A: ChainAttestor>(
    coordinator: Arc<Coordinator<A>>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_coordinator = warp::any().map(move || coordinator.clone());

    let chains = warp::path!("chains")
        .and(with_coordinator.clone())
        .map(|c: Arc<Coordinator<A>>| chains_reply(&c));
    let latest = warp::path!("claims" / String / "latest")
        .and(with_coordinator.clone())
        .map(|chain_id: String, c: Arc<Coordinator<A>>| latest_claim_reply(&c, &chain_id));
    let at_height = warp::path!("claims" / String / u64)
        .and(with_coordinator.clone())
        .map(|chain_id: String, height: u64, c: Arc<Coordinator<A>>| {
            claim_at_height_reply(&c, &chain_id, height)
        });
    let range = warp::path!("claims" / String)
        .and(warp::query::<ClaimsQuery>())
        .and(with_coordinator.clone())
        .map(|chain_id: String, query: ClaimsQuery, c: Arc<Coordinator<A>>| {
            claims_from_height_reply(&c, &chain_id, query.from)
        });
    let status = warp::path!("status")
        .and(with_coordinator)
        .map(|c: Arc<Coordinator<A>>| status_reply(&c));
    let metrics = warp::path!("metrics").map(metrics_reply);

    warp::get().and(
        chains
            .or(latest)
            .unify()
            .or(at_height)
            .unify()
            .or(range)
            .unify()
            .or(status)
            .unify()
            .or(metrics)
            .unify(),
    )
}

fn socket_addr(server_config: &ServerConfig, port: u16) -> Result<SocketAddr, AttestorError> {
    format!("{}:{}", server_config.address, port)
        .parse()
        .map_err(|e: std::net::AddrParseError| AttestorError::ServerConfig(e.to_string()))
}

/// Start every configured chain and serve the API until interrupted.
pub async fn run(config: AttestorConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_max_level(config.server.log_level())
        .init();

    let signer = Arc::new(Signer::from_config(&config.signer)?);
    info!(attestor_id = %signer.attestor_id(), address = %signer.address(), "loaded signer");

    let mut coordinator = Coordinator::default();
    for chain in &config.chains {
        let source = CosmosSource::from_config(&chain.source)?;
        let observer = SnapshotObserver::new(source, Duration::from_millis(chain.timeout_ms));
        coordinator.add_chain(
            Attestor::new(observer, signer.clone(), chain.history_size),
            Duration::from_millis(chain.poll_interval_ms),
        );
    }
    let coordinator = Arc::new(coordinator);
    let running = coordinator.start();

    if let Some(metrics_port) = config.server.metrics_port {
        let addr = socket_addr(&config.server, metrics_port)?;
        tokio::spawn(async move {
            info!("Metrics available at http://{addr}/metrics");
            warp::serve(warp::path!("metrics").map(metrics_reply))
                .run(addr)
                .await;
        });
    }

    let addr = socket_addr(&config.server, config.server.port)?;
    info!(%addr, chains = ?coordinator.chain_ids(), "Starting attestor...");
    tokio::select! {
        () = warp::serve(routes(coordinator.clone())).run(addr) => {
            warn!("attestor server exited");
        }
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down");
        }
    }

    running.shutdown().await;
    Ok(())
}

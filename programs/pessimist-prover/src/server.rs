use std::{net::SocketAddr, sync::Arc, time::Duration};

use pessimist_chain_observer::{cosmos::CosmosSource, SnapshotObserver};
use serde::Serialize;
use tracing::{info, warn};
use warp::{
    http::{header::CONTENT_TYPE, StatusCode},
    reply::{self, Reply, Response},
    Filter, Rejection,
};

use crate::{
    cli::ProverConfig,
    coordinator::Coordinator,
    prover::{ChainProver, CommitmentProver},
    ProverError,
};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_reply(status: StatusCode, error: String) -> Response {
    reply::with_status(reply::json(&ErrorBody { error }), status).into_response()
}

pub fn latest_bundle_reply<P: ChainProver>(coordinator: &Coordinator<P>, chain_id: &str) -> Response {
    match coordinator.latest_bundle(chain_id) {
        Ok(bytes) if bytes.is_empty() => error_reply(
            StatusCode::NOT_FOUND,
            format!("no proofs collected yet for `{chain_id}`"),
        ),
        Ok(bytes) => reply::with_header(bytes, CONTENT_TYPE, "application/json").into_response(),
        Err(e) => error_reply(StatusCode::NOT_FOUND, e.to_string()),
    }
}

pub fn proof_reply<P: ChainProver>(
    coordinator: &Coordinator<P>,
    chain_id: &str,
    path_hex: &str,
) -> Response {
    match coordinator.proof_for(chain_id, path_hex) {
        Ok(Some(proof)) => reply::json(&proof).into_response(),
        Ok(None) => error_reply(
            StatusCode::NOT_FOUND,
            format!("no commitment under `{path_hex}` in the latest bundle"),
        ),
        Err(e @ ProverError::InvalidPath(_)) => error_reply(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_reply(StatusCode::NOT_FOUND, e.to_string()),
    }
}

/// `GET` routes of the prover API.
pub fn routes<P: ChainProver>(
    coordinator: Arc<Coordinator<P>>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_coordinator = warp::any().map(move || coordinator.clone());

    let latest = warp::path!("proofs" / String / "latest")
        .and(with_coordinator.clone())
        .map(|chain_id: String, c: Arc<Coordinator<P>>| latest_bundle_reply(&c, &chain_id));
    let proof = warp::path!("proofs" / String / String)
        .and(with_coordinator)
        .map(|chain_id: String, path_hex: String, c: Arc<Coordinator<P>>| {
            proof_reply(&c, &chain_id, &path_hex)
        });

    warp::get().and(latest.or(proof).unify())
}

/// Start proof collection for every configured chain and serve the API
/// until interrupted.
pub async fn run(config: ProverConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_max_level(config.server.log_level())
        .init();

    let mut coordinator = Coordinator::default();
    for chain in &config.chains {
        let source = CosmosSource::from_config(&chain.source)?;
        let observer = SnapshotObserver::new(source, Duration::from_millis(chain.timeout_ms));
        coordinator.add_chain(
            CommitmentProver::new(observer),
            Duration::from_millis(chain.poll_interval_ms),
        );
    }
    let coordinator = Arc::new(coordinator);
    let running = coordinator.start();

    let addr: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ProverError::ServerConfig(e.to_string()))?;
    info!(%addr, "Starting prover...");
    tokio::select! {
        () = warp::serve(routes(coordinator.clone())).run(addr) => {
            warn!("prover server exited");
        }
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down");
        }
    }

    running.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod replies {
    use alloy_primitives::B256;
    use pessimist_chain_observer::test_utils::MockSource;

    use super::*;
    use crate::prover::test_utils::{packet, prover};

    async fn coordinator() -> Coordinator<CommitmentProver<MockSource>> {
        let (source, prover) = prover("chain-a");
        source.set_latest(4);
        source.set_commitments(4, vec![packet(1)]);
        prover.collect_proofs().await.unwrap();

        let mut coordinator = Coordinator::default();
        coordinator.add_chain(prover, Duration::from_secs(1));
        coordinator
    }

    #[tokio::test]
    async fn proof_lookup_statuses() {
        let coordinator = coordinator().await;

        assert_eq!(
            proof_reply(&coordinator, "chain-a", &B256::repeat_byte(1).to_string()).status(),
            StatusCode::OK
        );
        assert_eq!(
            proof_reply(&coordinator, "chain-a", &B256::repeat_byte(9).to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            proof_reply(&coordinator, "chain-a", "not-hex").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn bundle_lookup_statuses() {
        let coordinator = coordinator().await;

        assert_eq!(
            latest_bundle_reply(&coordinator, "chain-a").status(),
            StatusCode::OK
        );
        assert_eq!(
            latest_bundle_reply(&coordinator, "chain-z").status(),
            StatusCode::NOT_FOUND
        );
    }
}

//! `edgeip run`: load the config, build the middleware chain, and serve
//! until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::sources;
use crate::config::validation;
use crate::error::EdgeIpError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), EdgeIpError> {
    logging::init(args.log.level, args.log.format());

    let source = sources::resolve(args.config.as_deref()).await?;
    let (mut config, version) = source.load().await?;
    if let Some(timeout) = args.timeout {
        config.defaults.timeout = timeout;
    }

    let origin = source.path().display().to_string();
    if args.check {
        println!("{origin}: {}", validation::summarize(&config));
        return Ok(());
    }

    let chain = validation::summarize(&config);
    let state = Arc::new(AppState::new(
        config,
        version,
        origin.as_str(),
        args.namespace.as_str(),
    )?);
    let router = server::build_router(Arc::clone(&state), args.max_body)?;

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    tracing::info!(
        listen = %args.listen,
        namespace = %args.namespace,
        config = %origin,
        digest = %state.version.short(),
        %chain,
        "edgeip ready"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    let (forwarded, failed) = state.stats.snapshot();
    tracing::info!(forwarded, failed, "edgeip stopped");
    Ok(())
}

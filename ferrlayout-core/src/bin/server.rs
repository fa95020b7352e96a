use std::{error::Error, sync::Arc};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ferrlayout_core::{
    config::ServerArgs,
    inference::ModelLoader,
    pipeline::{Annotator, LayoutPipeline},
    server,
};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = ServerArgs::parse();
    init_tracing(args.log_json);

    let specs = args.model_specs();
    for spec in &specs {
        info!("Model candidate {}", spec);
    }

    let annotator = Annotator::discover(args.font.as_deref())?;
    let pipeline = Arc::new(LayoutPipeline::new(
        ModelLoader::from_specs(specs),
        annotator,
        args.pipeline_config()?,
    ));

    if args.no_preload {
        info!("Model preloading disabled, loading on first request");
    } else {
        let preload = pipeline.clone();
        tokio::task::spawn_blocking(move || match preload.loader().get_model() {
            Ok(model) => info!("Preloaded layout model `{}`", model.name()),
            Err(err) => warn!("Could not preload layout model: {}", err),
        })
        .await?;
    }

    let addr = args.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Layout Parser API listening on http://{}", addr);

    axum::serve(listener, server::router(pipeline, args.max_upload_bytes()))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;

    Ok(())
}

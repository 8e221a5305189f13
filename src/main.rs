use std::{error::Error as StdError, future::IntoFuture, process, sync::Arc};

use folio::{
    application::{
        chrome::ChromeService,
        error::AppError,
        feed::FeedService,
        render::render_service,
        store::ContentStore,
    },
    config,
    domain::posts,
    infra::{
        content,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error_chain(error);

    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = error.source();
    while let Some(inner) = current {
        messages.push(inner.to_string());
        current = inner.source();
    }
    messages
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Check(_) => run_check(&settings),
        config::Command::Routes(_) => run_routes(&settings),
    }
}

fn load_store(settings: &config::Settings) -> Result<ContentStore, AppError> {
    let posts = content::load_posts(&settings.content.directory).map_err(InfraError::from)?;
    let renderer = render_service();
    let store = ContentStore::build(posts, renderer.as_ref())?;
    Ok(store)
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = Arc::new(load_store(&settings)?);
    if store.is_empty() {
        warn!(
            target = "folio::content",
            directory = %settings.content.directory.display(),
            "No posts found; serving empty listings"
        );
    }

    let feed = FeedService::new(
        store,
        settings.content.page_size,
        settings.site.public_url.clone(),
        settings.site.title.clone(),
    );
    let state = HttpState {
        feed: Arc::new(feed),
        chrome: Arc::new(ChromeService::new(&settings.site)),
    };

    serve_http(&settings, state).await
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let shutdown = Arc::clone(&shutdown);
        async move { shutdown.notified().await }
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => {
            return joined
                .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
                .map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(target = "folio::http", error = %err, "Failed to listen for shutdown signal");
            }
            info!(target = "folio::http", "Shutting down");
            shutdown.notify_one();
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(joined) => joined
            .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
            .map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!(
                target = "folio::http",
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

fn run_check(settings: &config::Settings) -> Result<(), AppError> {
    let store = load_store(settings)?;
    let stats = store.stats();

    println!(
        "{} posts ({} published, {} drafts)",
        stats.total, stats.published, stats.drafts
    );

    let counts = posts::get_all_tags(store.published_posts());
    for label in posts::sort_tags_by_count(&counts) {
        let count = counts.get(label).copied().unwrap_or_default();
        println!("{count:>4}  {label}");
    }

    Ok(())
}

fn run_routes(settings: &config::Settings) -> Result<(), AppError> {
    let store = load_store(settings)?;
    for segments in store.static_params() {
        println!("/blog/{}", segments.join("/"));
    }
    Ok(())
}

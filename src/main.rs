//! OG Image Server - Open Graph card images from signed tokens.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use og_image_server::{
    config::{Cli, Command, ServeConfig, SignConfig, SignOutputFormat},
    create_s3_client,
    image::{CacheKey, ImageService},
    render::{ChromeBrowser, PageRenderer},
    server::{create_router, RouterConfig},
    store::{ImageStore, MemoryImageStore, S3ImageStore},
    token::{Claims, TokenAuth},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Sign(config) => run_sign(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let page_url = match config.page_url() {
        Ok(url) => url,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("OG Image Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Card page: {}", page_url);
    info!("  Browser: {}", config.browser_ws_url);
    info!(
        "  Render: {}s timeout, {} attempt(s)",
        config.render_timeout, config.render_attempts
    );
    info!("  Cache-Control max-age: {}s", config.cache_max_age);
    if config.token_leeway > 0 {
        info!("  Token leeway: {}s", config.token_leeway);
    }

    let browser = ChromeBrowser::new(config.browser_ws_url.clone());
    let renderer = PageRenderer::new(browser, page_url)
        .with_timeout(Duration::from_secs(config.render_timeout))
        .with_attempts(config.render_attempts);

    match config.s3_bucket.clone() {
        Some(bucket) => {
            info!("  S3 bucket: {}", bucket);
            if let Some(ref prefix) = config.s3_prefix {
                info!("  S3 prefix: {}", prefix);
            }
            if let Some(ref endpoint) = config.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.s3_region);

            let client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            let mut store = S3ImageStore::new(client, bucket);
            if let Some(ref prefix) = config.s3_prefix {
                store = store.with_prefix(prefix.clone());
            }

            serve(&config, ImageService::new(store, renderer)).await
        }
        None => {
            warn!("  Image cache: IN MEMORY - rendered images are lost on restart");
            warn!("        Configure a bucket for production: --s3-bucket=<bucket>");

            serve(&config, ImageService::new(MemoryImageStore::new(), renderer)).await
        }
    }
}

/// Bind the listener and serve the router until shutdown.
async fn serve<S: ImageStore + 'static>(
    config: &ServeConfig,
    image_service: ImageService<S, ChromeBrowser>,
) -> ExitCode {
    let router = create_router(image_service, build_router_config(config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("");
    info!("  Mint a card URL:");
    info!(
        "    og-image-server sign --title 'Hello' --base-url http://{} --format url",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "og_image_server=debug,tower_http=debug"
    } else {
        "og_image_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(config.token_secret.clone())
        .with_token_leeway(Duration::from_secs(config.token_leeway))
        .with_cache_max_age(config.cache_max_age);

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Sign Command
// =============================================================================

fn run_sign(config: SignConfig) -> ExitCode {
    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let mut claims = Claims::new(config.title.clone());
    if let Some(ref description) = config.description {
        claims = claims.with_description(description.clone());
    }

    let auth = TokenAuth::new(&config.secret);
    let token = auth.sign(&claims, config.ttl.map(Duration::from_secs));
    let url = config
        .base_url
        .as_deref()
        .map(|base_url| build_image_url(base_url, &token));

    match config.format {
        SignOutputFormat::Token => {
            println!("{}", token);
        }
        SignOutputFormat::Url => match url {
            Some(url) => println!("{}", url),
            None => {
                eprintln!("Error: --format url requires --base-url");
                return ExitCode::FAILURE;
            }
        },
        SignOutputFormat::Json => {
            let expiry = auth
                .verify(&token)
                .ok()
                .and_then(|payload| payload.get("exp").cloned());

            let json = serde_json::json!({
                "token": token,
                "key": CacheKey::from_claims(&claims).as_str(),
                "exp": expiry,
                "url": url,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

/// Build the image URL for a token.
fn build_image_url(base_url: &str, token: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), token)
}

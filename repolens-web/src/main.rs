//! Repolens Web Server
//!
//! JSON API exposing GitHub repository analytics.

use clap::Parser;
use repolens_core::{init_logging, AppConfig, LogFormat, LoggingConfig};
use repolens_web::{AppState, RepolensServer, WebConfig};

/// Repolens - GitHub repository analytics service
#[derive(Parser)]
#[command(name = "repolens-web")]
#[command(about = "A JSON API for GitHub repository analytics")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load .env before reading any configuration.
    dotenvy::dotenv().ok();

    init_logging(&LoggingConfig {
        level: args.log_level.clone(),
        format: LogFormat::Compact,
    });

    let app_config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let mut web_config = WebConfig::from_env();
    web_config.host = args.host;
    web_config.port = args.port;

    println!("🚀 Starting Repolens Web Server");
    println!("📍 Server: http://{}", web_config.address());
    println!(
        "🗄️  Cache: {}",
        if app_config.cache.use_redis {
            "redis (with in-memory fallback)"
        } else {
            "in-memory"
        }
    );

    let state = match AppState::new(&app_config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    let server = RepolensServer::new(web_config, state);
    if let Err(e) = server.start().await {
        eprintln!("❌ Server failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["repolens-web"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 5000);

        let args = Args::parse_from(["repolens-web", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 8080);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo_proxy_check::{
    logging,
    proxy::{
        pipeline, CheckerConfig, Diagnostics, Harvester, HarvesterConfig, ProxyChecker,
        ProxySource, TracingDiagnostics, DEFAULT_GEO_ENDPOINT,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Checks proxies for content tampering and groups the results by egress country
#[derive(Parser)]
#[command(name = "geo-proxy-check")]
#[command(about = "Checks proxies for content tampering and groups the results by egress country")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every proxy of a list against a URL and its expected content
    Check {
        /// URL fetched through each proxy
        url: String,
        /// Exact content the URL must return
        content: String,
        /// File with one proxy URI per line
        proxy_file: PathBuf,
        /// Number of concurrent workers
        #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
        concurrency: u32,
        /// Timeout in seconds for a whole check
        #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,
        /// Log every blocked or failed proxy on stderr
        #[arg(short, long)]
        verbose: bool,
        /// Geolocation service queried through each proxy
        #[arg(long, default_value = DEFAULT_GEO_ENDPOINT)]
        geo_endpoint: String,
    },
    /// Extract proxy: links from HTML pages or files into a proxy list
    Harvest {
        /// URLs or local files to harvest (can specify multiple)
        #[arg(required = true)]
        sources: Vec<String>,
        /// Output file for harvested proxies
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Timeout in seconds for HTTP requests
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            url,
            content,
            proxy_file,
            concurrency,
            timeout,
            verbose,
            geo_endpoint,
        } => {
            logging::init(verbose);
            let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);

            let source = ProxySource::open(&proxy_file, Arc::clone(&diagnostics))
                .await
                .with_context(|| format!("failed to open proxy list {:?}", proxy_file))?;

            tracing::info!(
                "checking {} with {} workers, timeout: {}s",
                url,
                concurrency,
                timeout
            );

            let config = CheckerConfig::new(url, content)
                .with_concurrency(concurrency as usize)
                .with_timeout(Duration::from_secs(timeout))
                .with_geo_endpoint(geo_endpoint)
                .with_verbose(verbose);
            let checker = ProxyChecker::new(config, Arc::clone(&diagnostics));

            let report = pipeline::run(source.into_stream(), checker, diagnostics).await;
            print!("{}", report);
        }
        Commands::Harvest {
            sources,
            output,
            timeout,
        } => {
            logging::init(false);
            let harvester = Harvester::with_config(
                HarvesterConfig::new().with_timeout(Duration::from_secs(timeout)),
            )?;

            let mut all_proxies = Vec::new();
            for source in &sources {
                match harvester.harvest_source(source).await {
                    Ok(proxies) => {
                        tracing::info!("found {} proxies in {}", proxies.len(), source);
                        all_proxies.extend(proxies);
                    }
                    Err(e) => tracing::error!("error harvesting {}: {:#}", source, e),
                }
            }

            // Deduplicate proxies
            all_proxies.sort_by_key(|proxy| proxy.to_string());
            all_proxies.dedup();

            let lines: String = all_proxies
                .iter()
                .map(|proxy| format!("{}\n", proxy))
                .collect();

            if let Some(output_path) = output {
                std::fs::write(&output_path, lines)
                    .with_context(|| format!("failed to write {:?}", output_path))?;
                tracing::info!("saved {} proxies to {:?}", all_proxies.len(), output_path);
            } else {
                print!("{}", lines);
            }
        }
    }

    Ok(())
}

// Solis Exporter - Prometheus metrics exporter for Solis solar inverters
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use clap::Parser;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use solis_exporter::client::SolisClient;
use solis_exporter::config;
use solis_exporter::http::{http_route, RequestContext};
use solis_exporter::poll::Poller;
use solis_exporter::snapshot::SnapshotStore;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{event, span, Instrument, Level};

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);

/// Expose readings from a Solis solar inverter as Prometheus metrics
///
/// Periodically fetch power and energy yield from the management interface
/// of the WiFi logger attached to a Solis solar inverter, keeping the most
/// recent valid reading cached. The cached reading is served as Prometheus
/// metrics at `/metrics` and as a raw JSON document on every other path,
/// with its age indicated by the `Last-Modified` header. Until the first
/// successful fetch, requests are answered with an HTTP 500.
#[derive(Debug, Parser)]
#[clap(name = "solis_exporter", version = clap::crate_version!())]
struct SolisExporterApplication {
    /// Host or host:port of the inverter management interface on the local network
    #[arg(long, env = "SOLIS_ADDRESS")]
    address: String,

    /// Username for the inverter management interface, if it requires one
    #[arg(long, env = "SOLIS_USERNAME")]
    username: Option<String>,

    /// Password for the inverter management interface, if it requires one
    #[arg(long, env = "SOLIS_PASSWORD")]
    password: Option<String>,

    /// Fetch a reading from the inverter at this interval, in seconds. Values
    /// below 30 seconds, or that cannot be parsed, fall back to 30 seconds
    #[arg(long, env = "INTERVAL")]
    interval: Option<String>,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[arg(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to bind to. By default, solis_exporter will bind to a public
    /// address since the purpose is to expose readings to an external system
    /// (Prometheus or another agent for ingestion)
    #[arg(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let opts = SolisExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let interval_secs = config::effective_interval(opts.interval.as_deref());
    let client = SolisClient::new(&opts.address, opts.username.clone(), opts.password.clone()).unwrap_or_else(|e| {
        event!(
            Level::ERROR,
            message = "failed to initialize inverter client",
            address = %opts.address,
            error = %e,
        );

        process::exit(1)
    });

    let store = SnapshotStore::new();
    let poller = Poller::new(client, store.clone());

    // Fetch from the inverter immediately so the cache is populated as soon
    // as possible, then keep fetching on a fixed period in the background.
    task::spawn(async move {
        poller.run(Duration::from_secs(interval_secs)).await;
    });

    let context = Arc::new(RequestContext::new(store));
    let service = make_service_fn(move |_| {
        let context = context.clone();

        async move {
            Ok::<_, hyper::Error>(service_fn(move |req| {
                http_route(req, context.clone()).instrument(span!(Level::DEBUG, "solis_request"))
            }))
        }
    });

    let server = Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        event!(
            Level::ERROR,
            message = "server failed to start",
            address = %opts.bind,
            error = %e,
        );

        process::exit(1);
    });

    event!(
        Level::INFO,
        message = "server started",
        address = %opts.bind,
        inverter = %opts.address,
        interval_secs = interval_secs,
    );

    server
        .serve(service)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    event!(Level::INFO, message = "server shutdown");

    Ok(())
}

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

//! Export power and energy readings from a Solis solar inverter as Prometheus metrics.
//!
//! ## Features
//!
//! Solis Exporter periodically fetches the status page served by the WiFi logger
//! attached to a [Solis](https://www.ginlong.com/) solar inverter and caches the
//! most recent valid reading. The cached reading is exposed over HTTP in two
//! formats: Prometheus metrics at `/metrics` and the raw reading as a JSON
//! document on every other path.
//!
//! The following metrics are exported:
//!
//! * `solis_inverter_power_watts` - Instantaneous power output of the inverter.
//! * `solis_inverter_yield_today_kwh` - Energy generated since local midnight, in kWh.
//! * `solis_inverter_yield_total_kwh` - Lifetime energy generated, in kWh.
//!
//! Readings are fetched in the background (*not* in response to Prometheus
//! scrapes). A failed or invalid fetch keeps the previous reading; its age is
//! surfaced to clients via the `Last-Modified` header, never by discarding data.
//! Until the first successful fetch, all requests are answered with an HTTP 500.
//!
//! ## Build
//!
//! `solis_exporter` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! The exporter needs the address of the inverter's management interface on your
//! local network and, if the interface requires them, a username and password.
//! These can be given as flags or environment variables.
//!
//! ```text
//! SOLIS_ADDRESS=192.168.1.50 SOLIS_USERNAME=admin SOLIS_PASSWORD=admin ./solis_exporter
//! ```
//!
//! The inverter is polled every `30s` by default. The interval can be changed
//! with the `INTERVAL` environment variable (in seconds) but may not be lowered
//! below `30s`: invalid or too-small values fall back to the default.
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `8000` at `/metrics`. Once
//! `solis_exporter` is running, configure scrapes of it by your Prometheus
//! server. Add the host running `solis_exporter` as a target under the
//! Prometheus `scrape_configs` section as described by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     1m
//!   evaluation_interval: 1m
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//!   - job_name: solis_exporter
//!     static_configs:
//!       - targets: ['example:8000']
//! ```
//!

pub mod client;
pub mod config;
pub mod http;
pub mod poll;
pub mod snapshot;

mod test;

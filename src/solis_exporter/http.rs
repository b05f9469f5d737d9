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

use crate::snapshot::{Snapshot, SnapshotStore};
use chrono::{DateTime, Utc};
use hyper::header::{CONTENT_TYPE, LAST_MODIFIED};
use hyper::{Body, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{event, Level};

const TEXT_FORMAT: &str = "text/plain; charset=utf-8";
const JSON_FORMAT: &str = "application/json";

// RFC 7231 IMF-fixdate, e.g. "Sun, 06 Nov 1994 08:49:37 GMT"
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Global state shared between all HTTP requests via Arc.
pub struct RequestContext {
    store: SnapshotStore,
}

impl RequestContext {
    pub fn new(store: SnapshotStore) -> Self {
        RequestContext { store }
    }
}

/// Answer a request with the current snapshot in the format selected by path.
///
/// `/metrics` is served in the Prometheus text exposition format; every other
/// path gets the full reading as a JSON document. Both carry a
/// `Last-Modified` header with the snapshot capture time. Until the first
/// valid reading has been stored, every request is answered with an HTTP 500.
/// The method is not inspected: all methods behave like `GET`.
pub async fn http_route(req: Request<Body>, context: Arc<RequestContext>) -> Result<Response<Body>, hyper::Error> {
    let snapshot = match context.store.get() {
        Some(snapshot) => snapshot,
        None => {
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header(CONTENT_TYPE, TEXT_FORMAT)
                .body(Body::from("No data"))
                .unwrap());
        }
    };

    let res = match req.uri().path() {
        "/metrics" => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, TEXT_FORMAT)
            .header(LAST_MODIFIED, last_modified(snapshot.captured_at))
            .body(Body::from(render_metrics(&snapshot)))
            .unwrap(),

        path => match serde_json::to_vec(&snapshot.reading) {
            Ok(buffer) => Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, JSON_FORMAT)
                .header(LAST_MODIFIED, last_modified(snapshot.captured_at))
                .body(Body::from(buffer))
                .unwrap(),
            Err(e) => {
                event!(
                    Level::ERROR,
                    message = "error encoding reading as JSON",
                    path = path,
                    error = %e,
                );

                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::empty())
                    .unwrap()
            }
        },
    };

    Ok(res)
}

/// Render the snapshot in the Prometheus text exposition format.
fn render_metrics(snapshot: &Snapshot) -> String {
    let reading = &snapshot.reading;
    format!(
        "solis_inverter_power_watts {}\nsolis_inverter_yield_today_kwh {}\nsolis_inverter_yield_total_kwh {}",
        reading.power, reading.energy.today, reading.energy.total,
    )
}

fn last_modified(captured_at: DateTime<Utc>) -> String {
    captured_at.format(IMF_FIXDATE).to_string()
}

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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Formatter};
use std::time::Duration;
use tracing::{event, Level};

const STATUS_PAGE: &str = "status.html";

// The logger answers from the local network in well under a second. Anything
// slower than this is treated as a failed fetch and retried on the next tick.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A single point-in-time reading fetched from the inverter.
///
/// The nested shape mirrors the JSON document served by the exporter: an
/// `inverter` block identifying the device, a `logger` block identifying the
/// WiFi stick it was read through, instantaneous power in watts, and daily
/// plus lifetime energy yield in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterReading {
    pub inverter: Inverter,
    pub logger: Logger,
    pub power: f64,
    pub energy: Energy,
}

impl InverterReading {
    /// True if the inverter identified itself in this reading.
    ///
    /// The logger serves its status page even when it has lost contact with
    /// the inverter, leaving the serial number blank. Such readings carry no
    /// usable data and must never be cached.
    pub fn is_valid(&self) -> bool {
        !self.inverter.serial.is_empty()
    }
}

/// Identity of the physical inverter a reading was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inverter {
    pub model: String,
    pub serial: String,
    pub firmware_main: String,
    pub firmware_slave: String,
}

/// Identity of the WiFi logger the reading was fetched through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logger {
    pub serial: String,
    pub version: String,
    pub mode: String,
}

/// Daily and lifetime energy yield, in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    pub today: f64,
    pub total: f64,
}

/// Potential kinds of errors that can be encountered fetching a reading
#[derive(PartialEq, Eq, Debug, Hash, Clone, Copy)]
pub enum FetchErrorKind {
    Request,
    Status,
    Payload,
}

impl FetchErrorKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchErrorKind::Request => "request",
            FetchErrorKind::Status => "status",
            FetchErrorKind::Payload => "payload",
        }
    }
}

/// Error reaching the inverter management interface or making sense of its response
#[derive(Debug)]
pub enum FetchError {
    Status(u16),
    KindMsg(FetchErrorKind, &'static str),
    KindMsgCause(FetchErrorKind, &'static str, Box<dyn Error + Send + Sync>),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Status(_) => FetchErrorKind::Status,
            FetchError::KindMsg(kind, _) => *kind,
            FetchError::KindMsgCause(kind, _, _) => *kind,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "unexpected HTTP status {} from inverter", code),
            FetchError::KindMsg(_, msg) => msg.fmt(f),
            FetchError::KindMsgCause(_, msg, ref e) => write!(f, "{}: {}", msg, e),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::KindMsgCause(_, _, ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Abstraction around the inverter management interface to allow for easier testing.
#[async_trait]
pub trait FetchReading {
    async fn fetch(&self) -> Result<InverterReading, FetchError>;
}

/// Client for the HTTP management interface of the WiFi logger attached to a
/// Solis inverter.
///
/// The logger serves a `status.html` page that embeds the current reading as
/// inline `var webdata_* = "...";` assignments. The page is fetched with HTTP
/// basic auth when a username is configured. Address and credentials are fixed
/// when the client is created.
#[derive(Debug)]
pub struct SolisClient {
    url: String,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

impl SolisClient {
    pub fn new(address: &str, username: Option<String>, password: Option<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| {
                FetchError::KindMsgCause(FetchErrorKind::Request, "unable to create HTTP client", Box::new(e))
            })?;

        Ok(SolisClient {
            url: format!("http://{}/{}", address, STATUS_PAGE),
            username,
            password,
            http,
        })
    }
}

#[async_trait]
impl FetchReading for SolisClient {
    async fn fetch(&self) -> Result<InverterReading, FetchError> {
        event!(
            Level::DEBUG,
            message = "fetching status page from inverter",
            url = %self.url,
        );

        let mut req = self.http.get(&self.url);
        if let Some(username) = &self.username {
            req = req.basic_auth(username, self.password.as_deref());
        }

        let res = req.send().await.map_err(|e| {
            FetchError::KindMsgCause(FetchErrorKind::Request, "request to inverter failed", Box::new(e))
        })?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status().as_u16()));
        }

        let page = res.text().await.map_err(|e| {
            FetchError::KindMsgCause(FetchErrorKind::Payload, "unable to read status page body", Box::new(e))
        })?;

        parse_status_page(&page)
    }
}

/// Extract the quoted value of an inline `var name = "value";` assignment.
fn page_var<'a>(page: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("var {} =", name);
    let idx = page.find(&needle)?;
    let rest = &page[idx + needle.len()..];
    let start = rest.find('"')? + 1;
    let len = rest[start..].find('"')?;
    Some(&rest[start..start + len])
}

fn numeric_var(page: &str, name: &str, msg: &'static str) -> Result<f64, FetchError> {
    page_var(page, name)
        .ok_or(FetchError::KindMsg(FetchErrorKind::Payload, msg))?
        .trim()
        .parse()
        .map_err(|_| FetchError::KindMsg(FetchErrorKind::Payload, msg))
}

/// Parse a reading out of the logger status page.
///
/// Power and yield values must be present and numeric. Identity fields are
/// taken as-is: a blank inverter serial is returned rather than rejected so
/// that callers can log the offending payload before discarding it.
pub fn parse_status_page(page: &str) -> Result<InverterReading, FetchError> {
    let text_var = |name: &str| page_var(page, name).unwrap_or("").to_owned();

    Ok(InverterReading {
        inverter: Inverter {
            model: text_var("webdata_pv_type"),
            serial: text_var("webdata_sn"),
            firmware_main: text_var("webdata_msvn"),
            firmware_slave: text_var("webdata_ssvn"),
        },
        logger: Logger {
            serial: text_var("cover_mid"),
            version: text_var("cover_ver"),
            mode: text_var("cover_wmode"),
        },
        power: numeric_var(page, "webdata_now_p", "missing or malformed power value")?,
        energy: Energy {
            today: numeric_var(page, "webdata_today_e", "missing or malformed daily yield value")?,
            total: numeric_var(page, "webdata_total_e", "missing or malformed total yield value")?,
        },
    })
}

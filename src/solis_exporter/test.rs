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

#![cfg(test)]

use crate::client::{Energy, FetchError, FetchErrorKind, FetchReading, Inverter, InverterReading, Logger};
use async_trait::async_trait;

/// Build a plausible reading with the given identity and power output.
pub(crate) fn reading(serial: &str, power: f64) -> InverterReading {
    InverterReading {
        inverter: Inverter {
            model: "0123".to_owned(),
            serial: serial.to_owned(),
            firmware_main: "001C".to_owned(),
            firmware_slave: "D1".to_owned(),
        },
        logger: Logger {
            serial: "987654321".to_owned(),
            version: "MW_08_512_0501_1.82".to_owned(),
            mode: "STA".to_owned(),
        },
        power,
        energy: Energy {
            today: 12.3,
            total: 4567.8,
        },
    }
}

/// FetchReading implementation that always returns the same reading.
pub(crate) struct FixedFetcher {
    pub(crate) reading: InverterReading,
}

#[async_trait]
impl FetchReading for FixedFetcher {
    async fn fetch(&self) -> Result<InverterReading, FetchError> {
        Ok(self.reading.clone())
    }
}

/// FetchReading implementation that always fails with a request error.
pub(crate) struct FailingFetcher;

#[async_trait]
impl FetchReading for FailingFetcher {
    async fn fetch(&self) -> Result<InverterReading, FetchError> {
        Err(FetchError::KindMsg(FetchErrorKind::Request, "connection refused"))
    }
}

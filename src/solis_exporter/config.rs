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

use tracing::{event, Level};

pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const MIN_INTERVAL_SECS: u64 = 30;

/// Resolve the configured poll interval, in seconds.
///
/// Values that are absent, not a whole number, or below the minimum fall
/// back to the default with a warning naming the rejected value. The
/// minimum keeps the exporter from hammering the logger, which serves its
/// status page from a fairly weak embedded chip.
pub fn effective_interval(raw: Option<&str>) -> u64 {
    match raw.map(|v| v.trim().parse::<u64>()) {
        Some(Ok(secs)) if secs >= MIN_INTERVAL_SECS => secs,
        _ => {
            event!(
                Level::WARN,
                message = "interval missing, invalid, or below minimum, using default",
                interval = ?raw,
                min_secs = MIN_INTERVAL_SECS,
                default_secs = DEFAULT_INTERVAL_SECS,
            );

            DEFAULT_INTERVAL_SECS
        }
    }
}

#[cfg(test)]
mod test {
    use super::{effective_interval, DEFAULT_INTERVAL_SECS};

    #[test]
    fn test_effective_interval_above_minimum() {
        assert_eq!(60, effective_interval(Some("60")));
    }

    #[test]
    fn test_effective_interval_at_minimum() {
        assert_eq!(30, effective_interval(Some("30")));
    }

    #[test]
    fn test_effective_interval_below_minimum() {
        assert_eq!(DEFAULT_INTERVAL_SECS, effective_interval(Some("29")));
    }

    #[test]
    fn test_effective_interval_non_numeric() {
        assert_eq!(DEFAULT_INTERVAL_SECS, effective_interval(Some("soon")));
    }

    #[test]
    fn test_effective_interval_negative() {
        assert_eq!(DEFAULT_INTERVAL_SECS, effective_interval(Some("-60")));
    }

    #[test]
    fn test_effective_interval_absent() {
        assert_eq!(DEFAULT_INTERVAL_SECS, effective_interval(None));
    }
}

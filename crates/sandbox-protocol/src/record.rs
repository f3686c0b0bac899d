//! Per-user sandbox connection record and its expiry rule.
//!
//! A record is all-or-nothing: it is only materialized when every connection
//! field and the expiry timestamp are present. Expiry is always one hour after
//! the record was written, whatever lease the provisioning backend reports.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifetime of a stored record, counted from the moment it was written.
pub const SANDBOX_TTL_SECS: i64 = 3600;

/// Profile meta key holding the ISO 8601 expiry.
pub const EXPIRES_META_KEY: &str = "sandbox_expires";

/// Connection fields reported by the container service on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxField {
    IdeUrl,
    Username,
    Password,
    SmpUrl,
    ExtIdeIp,
    ExtIdePort,
    IscIp,
    IscPort,
    WebIdePort,
}

impl SandboxField {
    pub const ALL: [SandboxField; 9] = [
        SandboxField::IdeUrl,
        SandboxField::Username,
        SandboxField::Password,
        SandboxField::SmpUrl,
        SandboxField::ExtIdeIp,
        SandboxField::ExtIdePort,
        SandboxField::IscIp,
        SandboxField::IscPort,
        SandboxField::WebIdePort,
    ];

    /// Key used in poll payloads and form submissions.
    pub fn key(self) -> &'static str {
        match self {
            SandboxField::IdeUrl => "ide_url",
            SandboxField::Username => "username",
            SandboxField::Password => "password",
            SandboxField::SmpUrl => "smp_url",
            SandboxField::ExtIdeIp => "ext_ide_ip",
            SandboxField::ExtIdePort => "ext_ide_port",
            SandboxField::IscIp => "isc_ip",
            SandboxField::IscPort => "isc_port",
            SandboxField::WebIdePort => "web_ide_port",
        }
    }

    /// Key used in the user profile store.
    pub fn meta_key(self) -> &'static str {
        match self {
            SandboxField::IdeUrl => "sandbox_ide_url",
            SandboxField::Username => "sandbox_username",
            SandboxField::Password => "sandbox_password",
            SandboxField::SmpUrl => "sandbox_smp_url",
            SandboxField::ExtIdeIp => "sandbox_ext_ide_ip",
            SandboxField::ExtIdePort => "sandbox_ext_ide_port",
            SandboxField::IscIp => "sandbox_isc_ip",
            SandboxField::IscPort => "sandbox_isc_port",
            SandboxField::WebIdePort => "sandbox_web_ide_port",
        }
    }

    /// All ten profile keys owned by a sandbox record, expiry last.
    pub fn all_meta_keys() -> impl Iterator<Item = &'static str> {
        Self::ALL
            .into_iter()
            .map(SandboxField::meta_key)
            .chain(std::iter::once(EXPIRES_META_KEY))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SandboxConnection {
    pub ide_url: String,
    pub username: String,
    pub password: String,
    pub smp_url: String,
    pub ext_ide_ip: String,
    pub ext_ide_port: String,
    pub isc_ip: String,
    pub isc_port: String,
    pub web_ide_port: String,
}

impl SandboxConnection {
    pub fn get(&self, field: SandboxField) -> &str {
        match field {
            SandboxField::IdeUrl => &self.ide_url,
            SandboxField::Username => &self.username,
            SandboxField::Password => &self.password,
            SandboxField::SmpUrl => &self.smp_url,
            SandboxField::ExtIdeIp => &self.ext_ide_ip,
            SandboxField::ExtIdePort => &self.ext_ide_port,
            SandboxField::IscIp => &self.isc_ip,
            SandboxField::IscPort => &self.isc_port,
            SandboxField::WebIdePort => &self.web_ide_port,
        }
    }

    fn slot(&mut self, field: SandboxField) -> &mut String {
        match field {
            SandboxField::IdeUrl => &mut self.ide_url,
            SandboxField::Username => &mut self.username,
            SandboxField::Password => &mut self.password,
            SandboxField::SmpUrl => &mut self.smp_url,
            SandboxField::ExtIdeIp => &mut self.ext_ide_ip,
            SandboxField::ExtIdePort => &mut self.ext_ide_port,
            SandboxField::IscIp => &mut self.isc_ip,
            SandboxField::IscPort => &mut self.isc_port,
            SandboxField::WebIdePort => &mut self.web_ide_port,
        }
    }

    /// Builds a connection by asking `lookup` for each field.
    ///
    /// Returns the first field `lookup` could not provide.
    pub fn from_lookup(
        mut lookup: impl FnMut(SandboxField) -> Option<String>,
    ) -> Result<Self, SandboxField> {
        let mut conn = SandboxConnection::default();
        for field in SandboxField::ALL {
            *conn.slot(field) = lookup(field).ok_or(field)?;
        }
        Ok(conn)
    }

    /// Applies `f` to every field value in place.
    pub fn map_values(mut self, mut f: impl FnMut(&str) -> String) -> Self {
        for field in SandboxField::ALL {
            let slot = self.slot(field);
            *slot = f(slot);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SandboxRecord {
    pub connection: SandboxConnection,
    pub expires: DateTime<Utc>,
}

impl SandboxRecord {
    /// Record written at `now`; expires `SANDBOX_TTL_SECS` later.
    pub fn new_at(connection: SandboxConnection, now: DateTime<Utc>) -> Self {
        Self {
            connection,
            expires: now + Duration::seconds(SANDBOX_TTL_SECS),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    /// Flattens the record into profile meta entries (ten of them).
    pub fn meta_entries(&self) -> Vec<(&'static str, String)> {
        SandboxField::ALL
            .into_iter()
            .map(|field| (field.meta_key(), self.connection.get(field).to_string()))
            .chain(std::iter::once((
                EXPIRES_META_KEY,
                format_expiry(self.expires),
            )))
            .collect()
    }

    /// Rebuilds a record from profile meta; `None` unless every key is present
    /// and the expiry parses.
    pub fn from_meta(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let connection =
            SandboxConnection::from_lookup(|field| lookup(field.meta_key())).ok()?;
        let expires = parse_expiry(&lookup(EXPIRES_META_KEY)?)?;
        Some(Self {
            connection,
            expires,
        })
    }
}

/// RFC 3339 in UTC. Sub-second digits are kept when present so a stored
/// record never expires earlier than the instant it was stamped with.
pub fn format_expiry(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;

    fn connection() -> SandboxConnection {
        SandboxConnection::from_lookup(|field| Some(format!("{}-value", field.key()))).unwrap()
    }

    #[test]
    fn record_expires_exactly_one_hour_after_write() {
        let written = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let record = SandboxRecord::new_at(connection(), written);

        assert!(!record.is_expired_at(written));
        assert!(!record.is_expired_at(written + Duration::seconds(SANDBOX_TTL_SECS - 1)));
        assert!(record.is_expired_at(written + Duration::seconds(SANDBOX_TTL_SECS)));
        assert!(record.is_expired_at(written + Duration::days(2)));
    }

    #[test]
    fn meta_round_trip_keeps_all_ten_keys() {
        let written = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let record = SandboxRecord::new_at(connection(), written);
        let meta: HashMap<&str, String> = record.meta_entries().into_iter().collect();

        assert_eq!(meta.len(), 10);
        assert_eq!(meta["sandbox_expires"], "2026-03-01T13:00:00Z");
        let back = SandboxRecord::from_meta(|key| meta.get(key).cloned()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn fractional_write_time_survives_meta_round_trip() {
        let written = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
            + Duration::milliseconds(700);
        let record = SandboxRecord::new_at(connection(), written);
        let meta: HashMap<&str, String> = record.meta_entries().into_iter().collect();

        assert_eq!(meta["sandbox_expires"], "2026-06-01T09:00:00.700Z");
        let back = SandboxRecord::from_meta(|key| meta.get(key).cloned()).unwrap();
        assert_eq!(back.expires, written + Duration::seconds(SANDBOX_TTL_SECS));
        assert!(!back.is_expired_at(written + Duration::milliseconds(3_599_500)));
        assert!(back.is_expired_at(written + Duration::seconds(SANDBOX_TTL_SECS)));
    }

    #[test]
    fn partial_meta_is_treated_as_absent() {
        let written = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut meta: HashMap<&str, String> = SandboxRecord::new_at(connection(), written)
            .meta_entries()
            .into_iter()
            .collect();
        meta.remove("sandbox_isc_port");
        assert!(SandboxRecord::from_meta(|key| meta.get(key).cloned()).is_none());
    }

    #[test]
    fn unparseable_expiry_is_treated_as_absent() {
        let written = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut meta: HashMap<&str, String> = SandboxRecord::new_at(connection(), written)
            .meta_entries()
            .into_iter()
            .collect();
        meta.insert("sandbox_expires", "soon".into());
        assert!(SandboxRecord::from_meta(|key| meta.get(key).cloned()).is_none());
    }

    #[test]
    fn from_lookup_reports_first_missing_field() {
        let err = SandboxConnection::from_lookup(|field| match field {
            SandboxField::SmpUrl => None,
            other => Some(other.key().to_string()),
        })
        .unwrap_err();
        assert_eq!(err, SandboxField::SmpUrl);
    }

    #[test]
    fn parse_expiry_accepts_offsets() {
        let at = parse_expiry("2026-03-01T13:00:00+00:00").unwrap();
        assert_eq!(format_expiry(at), "2026-03-01T13:00:00Z");
        assert!(parse_expiry("not a date").is_none());
    }
}

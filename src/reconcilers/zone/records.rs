// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authoritative record sets of a provisioned zone.
//!
//! Every zone gets two record sets:
//!
//! - `soa.<zone>` - the SOA record naming `ns1.<zone>.` as primary and
//!   `hostmaster.<zone>.` as responsible mailbox
//! - `ns1.<zone>` - an `A` record pointing `ns1` at the PowerDNS DNS address
//!
//! The SOA serial follows the `YYYYMMDDnn` convention with a fixed `nn` of
//! `01`, so it changes once a day and not on every convergence.

use crate::constants::{
    HOSTMASTER_LABEL, KIND_ZONE, PRIMARY_NAMESERVER_LABEL, RECORD_TYPE_A, RECORD_TYPE_SOA,
    SOA_EXPIRE_SECS, SOA_NEGATIVE_TTL_SECS, SOA_REFRESH_SECS, SOA_RETRY_SECS,
    SOA_SERIAL_SEQUENCE, SOA_TTL_SECS, ZONE_DATA_TTL_SECS,
};
use crate::crd::{RRsetSpec, ZoneRef};
use chrono::NaiveDate;

/// Object name of the SOA record set of `zone_name`.
#[must_use]
pub fn soa_rrset_name(zone_name: &str) -> String {
    format!("soa.{zone_name}")
}

/// Object name of the primary nameserver record set of `zone_name`.
#[must_use]
pub fn ns1_rrset_name(zone_name: &str) -> String {
    format!("{PRIMARY_NAMESERVER_LABEL}.{zone_name}")
}

/// SOA serial for `date`: `YYYYMMDD` followed by the sequence `01`.
#[must_use]
pub fn soa_serial(date: NaiveDate) -> String {
    format!("{}{SOA_SERIAL_SEQUENCE}", date.format("%Y%m%d"))
}

/// SOA record content in presentation format.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use clusterdns::reconcilers::zone::records::soa_record;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
/// assert_eq!(
///     soa_record("abc123.test.com", date),
///     "ns1.abc123.test.com. hostmaster.abc123.test.com. 2025030701 10800 3600 604800 3600"
/// );
/// ```
#[must_use]
pub fn soa_record(zone_name: &str, date: NaiveDate) -> String {
    [
        format!("{PRIMARY_NAMESERVER_LABEL}.{zone_name}."),
        format!("{HOSTMASTER_LABEL}.{zone_name}."),
        soa_serial(date),
        SOA_REFRESH_SECS.to_string(),
        SOA_RETRY_SECS.to_string(),
        SOA_EXPIRE_SECS.to_string(),
        SOA_NEGATIVE_TTL_SECS.to_string(),
    ]
    .join(" ")
}

fn zone_ref(zone_name: &str) -> ZoneRef {
    ZoneRef {
        name: zone_name.to_string(),
        kind: KIND_ZONE.to_string(),
    }
}

/// Spec of the SOA record set of `zone_name` on `date`.
#[must_use]
pub fn soa_rrset_spec(zone_name: &str, date: NaiveDate) -> RRsetSpec {
    RRsetSpec {
        r#type: RECORD_TYPE_SOA.to_string(),
        ttl: SOA_TTL_SECS,
        name: format!("{zone_name}."),
        records: vec![soa_record(zone_name, date)],
        comment: None,
        zone_ref: zone_ref(zone_name),
    }
}

/// Spec of the `A` record set pointing `ns1` at `dns_address`.
#[must_use]
pub fn ns1_rrset_spec(zone_name: &str, dns_address: &str) -> RRsetSpec {
    RRsetSpec {
        r#type: RECORD_TYPE_A.to_string(),
        ttl: ZONE_DATA_TTL_SECS,
        name: PRIMARY_NAMESERVER_LABEL.to_string(),
        records: vec![dns_address.to_string()],
        comment: None,
        zone_ref: zone_ref(zone_name),
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;

//! # SDN Record Ingestion
//!
//! Converts raw sanctions records, as delivered by the list-retrieval
//! collaborator, into validated [`SanctionsEntry`] values ready for
//! [`WatchlistIndex::build`](crate::WatchlistIndex::build).
//!
//! ## Rules
//!
//! - A record missing its uid, name, or program, or carrying an unparseable
//!   designation date, is skipped and reported. One bad record never fails
//!   the whole list.
//! - Addresses are labeled either with a chain name (`ethereum`, `trx`) or an
//!   OFAC id type (`Digital Currency Address - XBT`). Unsupported labels and
//!   invalid addresses are skipped and reported; the rest of the record
//!   survives.
//! - A normalized address belongs to exactly one entry. A later record that
//!   claims an address already owned by an earlier one loses that address.
//! - A record left with no screenable address is skipped.
//! - With a program filter configured, records outside it are counted as
//!   filtered, not skipped.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use csm_core::{normalize, ChainFamily, NormalizedAddress};

use crate::entry::{AddressRecord, EntityType, SanctionsEntry};

/// Date layouts seen in SDN exports.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d %b %Y", "%m/%d/%Y"];

/// A sanctions record before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSanctionsRecord {
    /// Source identifier.
    #[serde(default)]
    pub uid: String,
    /// Primary name.
    #[serde(default)]
    pub name: String,
    /// SDN type: `Individual`, `Entity`, ...
    #[serde(default)]
    pub sdn_type: String,
    /// Program tags.
    #[serde(default)]
    pub programs: Vec<String>,
    /// Free-text remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Known aliases.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Designation date in one of the accepted layouts.
    #[serde(default)]
    pub designation_date: Option<String>,
    /// Digital currency ids.
    #[serde(default)]
    pub addresses: Vec<RawAddress>,
}

/// A digital currency id attached to a raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAddress {
    /// Chain label or OFAC id type.
    #[serde(alias = "chain")]
    pub id_type: String,
    /// The address, unnormalized.
    pub address: String,
}

/// Ingestion options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Keep only records with a program containing one of these terms
    /// (case-insensitive). Empty keeps everything.
    pub program_filter: Vec<String>,
}

/// A record dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Source uid, possibly empty.
    pub uid: String,
    /// Why it was dropped.
    pub reason: String,
}

/// An address dropped from an otherwise accepted or skipped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAddress {
    /// Owning record uid.
    pub uid: String,
    /// The raw address.
    pub address: String,
    /// Why it was dropped.
    pub reason: String,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Accepted entries, in source order.
    pub entries: Vec<SanctionsEntry>,
    /// Malformed records.
    pub skipped_records: Vec<SkippedRecord>,
    /// Malformed, unsupported, or already-claimed addresses.
    pub skipped_addresses: Vec<SkippedAddress>,
    /// Records excluded by the program filter.
    pub filtered_records: usize,
}

impl IngestReport {
    /// Number of accepted addresses across all entries.
    pub fn address_count(&self) -> usize {
        self.entries.iter().map(|e| e.addresses.len()).sum()
    }
}

/// Validate raw records into entries.
pub fn ingest(records: Vec<RawSanctionsRecord>, config: &IngestConfig) -> IngestReport {
    let filter: Vec<String> = config
        .program_filter
        .iter()
        .map(|p| p.trim().to_ascii_uppercase())
        .filter(|p| !p.is_empty())
        .collect();
    let mut owners: HashMap<NormalizedAddress, String> = HashMap::new();
    let mut report = IngestReport::default();

    for record in records {
        if !filter.is_empty() && !matches_filter(&record.programs, &filter) {
            report.filtered_records += 1;
            continue;
        }
        match convert(&record, &owners, &mut report.skipped_addresses) {
            Ok(entry) => {
                for addr in &entry.addresses {
                    owners.insert(addr.normalized.clone(), entry.entry_id.clone());
                }
                report.entries.push(entry);
            }
            Err(reason) => {
                tracing::warn!(uid = %record.uid, reason = %reason, "skipping sanctions record");
                report.skipped_records.push(SkippedRecord {
                    uid: record.uid.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        entries = report.entries.len(),
        addresses = report.address_count(),
        skipped_records = report.skipped_records.len(),
        skipped_addresses = report.skipped_addresses.len(),
        filtered_records = report.filtered_records,
        "sanctions records ingested"
    );
    report
}

fn matches_filter(programs: &[String], filter: &[String]) -> bool {
    programs.iter().any(|p| {
        let p = p.to_ascii_uppercase();
        filter.iter().any(|term| p.contains(term.as_str()))
    })
}

fn convert(
    record: &RawSanctionsRecord,
    owners: &HashMap<NormalizedAddress, String>,
    skipped: &mut Vec<SkippedAddress>,
) -> Result<SanctionsEntry, String> {
    let uid = record.uid.trim();
    let name = record.name.trim();
    if uid.is_empty() {
        return Err("missing uid".to_string());
    }
    if name.is_empty() {
        return Err("missing entity name".to_string());
    }
    let programs: Vec<&str> = record
        .programs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if programs.is_empty() {
        return Err("no sanctions program".to_string());
    }
    let designation_date = match record.designation_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date(raw).ok_or_else(|| format!("invalid designation date {raw:?}"))?),
    };

    let remarks = record.remarks.as_deref().unwrap_or("");
    let entity_type = classify(&record.sdn_type, name, remarks);
    let irgc_linked = programs.iter().any(|p| p.to_ascii_uppercase().contains("IRGC"))
        || remarks.to_ascii_uppercase().contains("IRGC");

    let mut addresses: Vec<AddressRecord> = Vec::new();
    for raw in &record.addresses {
        let mut skip = |reason: String| {
            skipped.push(SkippedAddress {
                uid: uid.to_string(),
                address: raw.address.clone(),
                reason,
            })
        };
        let chain = match raw.id_type.parse::<ChainFamily>() {
            Ok(chain) => chain,
            Err(e) => {
                skip(e.to_string());
                continue;
            }
        };
        let normalized = match normalize(chain, &raw.address) {
            Ok(n) => n,
            Err(e) => {
                skip(e.to_string());
                continue;
            }
        };
        if addresses.iter().any(|a| a.normalized == normalized) {
            continue;
        }
        if let Some(owner) = owners.get(&normalized) {
            skip(format!("address already claimed by {owner}"));
            continue;
        }
        addresses.push(AddressRecord {
            raw: raw.address.clone(),
            normalized,
            entry_id: uid.to_string(),
        });
    }
    if addresses.is_empty() {
        return Err("no screenable addresses".to_string());
    }

    Ok(SanctionsEntry {
        entry_id: uid.to_string(),
        program: programs.join(", "),
        entity_name: name.to_string(),
        designation_date,
        entity_type,
        aliases: record.aliases.clone(),
        irgc_linked,
        addresses,
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn classify(sdn_type: &str, name: &str, remarks: &str) -> EntityType {
    if sdn_type.trim().eq_ignore_ascii_case("individual") {
        return EntityType::Individual;
    }
    let mentions_exchange = |s: &str| s.to_ascii_lowercase().contains("exchange");
    if mentions_exchange(name) || mentions_exchange(remarks) {
        EntityType::Exchange
    } else {
        EntityType::Organization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH_A: &str = "0x7F367CC41522CE07553E823BF3BE79A889DEBE1B";
    const ETH_B: &str = "0x098b716b8aaf21512996dc57eb0615e2383e2f96";
    const TRON_USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    fn record(uid: &str, name: &str, programs: &[&str], addresses: &[(&str, &str)]) -> RawSanctionsRecord {
        RawSanctionsRecord {
            uid: uid.to_string(),
            name: name.to_string(),
            sdn_type: "Entity".to_string(),
            programs: programs.iter().map(|p| p.to_string()).collect(),
            addresses: addresses
                .iter()
                .map(|(id_type, address)| RawAddress {
                    id_type: id_type.to_string(),
                    address: address.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ofac_id_types_and_flags() {
        let mut rec = record(
            "1001",
            "Zedcex Exchange Ltd",
            &["IRAN", "IRGC"],
            &[
                ("Digital Currency Address - ETH", ETH_A),
                ("Digital Currency Address - USDT", TRON_USDT),
            ],
        );
        rec.designation_date = Some("15 Jan 2026".to_string());
        let report = ingest(vec![rec], &IngestConfig::default());

        assert_eq!(report.entries.len(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.program, "IRAN, IRGC");
        assert_eq!(entry.entity_type, EntityType::Exchange);
        assert!(entry.irgc_linked);
        assert_eq!(entry.designation_date, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(entry.addresses[0].chain(), ChainFamily::Ethereum);
        assert_eq!(entry.addresses[0].normalized.as_str(), ETH_A.to_ascii_lowercase());
        assert_eq!(entry.addresses[1].chain(), ChainFamily::Tron);
    }

    #[test]
    fn test_irgc_flag_from_remarks_and_individual_type() {
        let mut rec = record("1002", "Jane Doe", &["IRAN"], &[("eth", ETH_B)]);
        rec.sdn_type = "Individual".to_string();
        rec.remarks = Some("Acts for or on behalf of the IRGC.".to_string());
        let report = ingest(vec![rec], &IngestConfig::default());
        assert_eq!(report.entries[0].entity_type, EntityType::Individual);
        assert!(report.entries[0].irgc_linked);
    }

    #[test]
    fn test_malformed_records_are_skipped_and_counted() {
        let mut bad_date = record("3", "C", &["IRAN"], &[("eth", ETH_B)]);
        bad_date.designation_date = Some("sometime".to_string());
        let records = vec![
            record("", "No Uid", &["IRAN"], &[("eth", ETH_A)]),
            record("2", "No Program", &[], &[("eth", ETH_A)]),
            bad_date,
            record("4", "No Addresses", &["IRAN"], &[("eth", "0x12")]),
            record("5", "Good", &["IRAN"], &[("eth", ETH_A)]),
        ];
        let report = ingest(records, &IngestConfig::default());

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].entry_id, "5");
        let reasons: Vec<&str> = report.skipped_records.iter().map(|s| s.reason.as_str()).collect();
        assert_eq!(reasons[0], "missing uid");
        assert_eq!(reasons[1], "no sanctions program");
        assert!(reasons[2].starts_with("invalid designation date"));
        assert_eq!(reasons[3], "no screenable addresses");
        assert_eq!(report.skipped_addresses.len(), 1);
        assert!(report.skipped_addresses[0].reason.contains("wrong length"));
    }

    #[test]
    fn test_unsupported_chain_address_is_skipped_but_record_kept() {
        let rec = record(
            "6",
            "Mixed",
            &["CYBER2"],
            &[("Digital Currency Address - XMR", "4Abc"), ("eth", ETH_A)],
        );
        let report = ingest(vec![rec], &IngestConfig::default());
        assert_eq!(report.entries[0].addresses.len(), 1);
        assert!(report.skipped_addresses[0].reason.contains("unsupported chain family"));
    }

    #[test]
    fn test_duplicate_address_first_owner_wins() {
        let first = record("10", "First", &["IRAN"], &[("eth", ETH_A)]);
        let lowered = ETH_A.to_ascii_lowercase();
        let second = record("11", "Second", &["IRAN"], &[("eth", lowered.as_str()), ("eth", ETH_B)]);
        let report = ingest(vec![first, second], &IngestConfig::default());

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[1].addresses.len(), 1);
        assert_eq!(report.entries[1].addresses[0].normalized.as_str(), ETH_B);
        assert_eq!(report.skipped_addresses[0].reason, "address already claimed by 10");
    }

    #[test]
    fn test_program_filter() {
        let config = IngestConfig {
            program_filter: vec!["iran".to_string(), "IRGC".to_string()],
        };
        let records = vec![
            record("20", "In", &["IRAN-EO13846"], &[("eth", ETH_A)]),
            record("21", "Out", &["CYBER2"], &[("eth", ETH_B)]),
        ];
        let report = ingest(records, &config);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.filtered_records, 1);
        assert!(report.skipped_records.is_empty());
    }

    #[test]
    fn test_raw_record_from_json_accepts_chain_alias() {
        let rec: RawSanctionsRecord = serde_json::from_str(&format!(
            r#"{{"uid":"30","name":"J","programs":["IRGC"],"addresses":[{{"chain":"ethereum","address":"{ETH_B}"}}]}}"#
        ))
        .unwrap();
        assert_eq!(rec.addresses[0].id_type, "ethereum");
        assert_eq!(ingest(vec![rec], &IngestConfig::default()).entries.len(), 1);
    }
}

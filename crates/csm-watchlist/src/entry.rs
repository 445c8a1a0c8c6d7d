//! # Sanctions Entries
//!
//! A [`SanctionsEntry`] is one designated party and the crypto addresses it
//! owns. Entries are immutable once ingested; a list refresh produces a new
//! set of entries and a new index, never an edit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use csm_core::{normalize, ChainFamily, InvalidAddressError, NormalizedAddress};

/// Kind of designated party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A natural person.
    Individual,
    /// A company, group, or other legal entity.
    Organization,
    /// A virtual-asset exchange.
    Exchange,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Individual => "individual",
            Self::Organization => "organization",
            Self::Exchange => "exchange",
        })
    }
}

/// A designated address owned by exactly one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Address as it appeared in the source list.
    pub raw: String,
    /// Canonical form; the index key. Carries the chain family.
    pub normalized: NormalizedAddress,
    /// Owning entry.
    pub entry_id: String,
}

impl AddressRecord {
    /// Chain family of the address.
    pub fn chain(&self) -> ChainFamily {
        self.normalized.chain()
    }
}

/// A designated party from a sanctions list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionsEntry {
    /// Source list identifier (the SDN uid).
    pub entry_id: String,
    /// Sanctions program(s), comma separated when there are several.
    pub program: String,
    /// Primary name.
    pub entity_name: String,
    /// When the party was designated, if the list says.
    pub designation_date: Option<NaiveDate>,
    /// Party kind.
    pub entity_type: EntityType,
    /// Known aliases.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Listed under an IRGC program, or the remarks tie it to the IRGC.
    #[serde(default)]
    pub irgc_linked: bool,
    /// Designated crypto addresses.
    pub addresses: Vec<AddressRecord>,
}

impl SanctionsEntry {
    /// Start an entry with no addresses.
    pub fn new(
        entry_id: impl Into<String>,
        program: impl Into<String>,
        entity_name: impl Into<String>,
        entity_type: EntityType,
    ) -> Self {
        let program = program.into();
        Self {
            entry_id: entry_id.into(),
            irgc_linked: program.to_ascii_uppercase().contains("IRGC"),
            program,
            entity_name: entity_name.into(),
            designation_date: None,
            entity_type,
            aliases: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// Set the designation date.
    pub fn designated_on(mut self, date: NaiveDate) -> Self {
        self.designation_date = Some(date);
        self
    }

    /// Normalize and attach an address.
    pub fn with_address(mut self, chain: ChainFamily, raw: &str) -> Result<Self, InvalidAddressError> {
        let normalized = normalize(chain, raw)?;
        self.addresses.push(AddressRecord {
            raw: raw.to_string(),
            normalized,
            entry_id: self.entry_id.clone(),
        });
        Ok(self)
    }

    /// Individual program names.
    pub fn programs(&self) -> impl Iterator<Item = &str> {
        self.program
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

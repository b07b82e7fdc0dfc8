mod demo;
mod index;
mod load;

use serde::Deserialize;

pub use demo::generate_demo_lineage;
pub use index::LineageIndex;
pub use load::{load_snapshot, parse_snapshot};

/// Identifier of the synthetic root and the sentinel parent code for true roots.
pub const ROOT_CODE: &str = "ROOT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeState {
    #[default]
    Alive,
    Extinct,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomicRank {
    #[default]
    Species,
    Subspecies,
    Genus,
    Hybrid,
}

impl TaxonomicRank {
    pub fn label(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::Subspecies => "subspecies",
            Self::Genus => "genus",
            Self::Hybrid => "hybrid",
        }
    }
}

/// One species record of a lineage snapshot.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LineageNode {
    pub lineage_code: String,
    #[serde(default)]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub latin_name: String,
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub state: LifeState,
    #[serde(default)]
    pub birth_turn: u32,
    #[serde(default)]
    pub extinction_turn: Option<u32>,
    #[serde(default)]
    pub trophic_level: f32,
    #[serde(default)]
    pub taxonomic_rank: TaxonomicRank,
    #[serde(default)]
    pub hybrid_parent_codes: Vec<String>,
    #[serde(default)]
    pub descendant_count: u32,
}

impl LineageNode {
    pub fn new(lineage_code: impl Into<String>, parent_code: Option<&str>) -> Self {
        Self {
            lineage_code: lineage_code.into(),
            parent_code: parent_code.map(str::to_owned),
            latin_name: String::new(),
            common_name: String::new(),
            state: LifeState::Alive,
            birth_turn: 0,
            extinction_turn: None,
            trophic_level: 0.0,
            taxonomic_rank: TaxonomicRank::Species,
            hybrid_parent_codes: Vec::new(),
            descendant_count: 0,
        }
    }

    /// Parent code with the root sentinels (`null`, empty, `ROOT`) stripped.
    pub fn parent(&self) -> Option<&str> {
        self.parent_code
            .as_deref()
            .filter(|code| !code.is_empty() && *code != ROOT_CODE)
    }

    pub fn is_root_record(&self) -> bool {
        self.parent().is_none()
    }

    pub fn is_extinct(&self) -> bool {
        self.state == LifeState::Extinct
    }

    pub fn secondary_parent(&self) -> Option<&str> {
        if self.taxonomic_rank != TaxonomicRank::Hybrid {
            return None;
        }
        self.hybrid_parent_codes
            .get(1)
            .map(String::as_str)
            .filter(|code| !code.is_empty())
    }

    /// Best human-readable name, falling back to the lineage code.
    pub fn display_name(&self) -> &str {
        if !self.common_name.is_empty() {
            &self.common_name
        } else if !self.latin_name.is_empty() {
            &self.latin_name
        } else {
            &self.lineage_code
        }
    }
}

pub mod picker;

use std::collections::BTreeMap;
use std::fmt;

use rust_embed::Embed;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Embed)]
#[folder = "assets/prompts/"]
struct PromptAssets;

pub const DEFAULT_PACK: &str = "bourdain";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("prompt pack `{pack}` is not valid UTF-8")]
    Encoding { pack: String },
    #[error("prompt pack `{pack}` failed to parse: {source}")]
    Parse {
        pack: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("no prompt packs available")]
    Empty,
}

/// Length tiers a pack can be grouped by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LengthTier {
    #[default]
    Short,
    Medium,
    Long,
    Very,
}

impl LengthTier {
    pub const ALL: [LengthTier; 4] = [
        LengthTier::Short,
        LengthTier::Medium,
        LengthTier::Long,
        LengthTier::Very,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => Some(LengthTier::Short),
            "medium" => Some(LengthTier::Medium),
            "long" => Some(LengthTier::Long),
            "very" => Some(LengthTier::Very),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LengthTier::Short => "short",
            LengthTier::Medium => "medium",
            LengthTier::Long => "long",
            LengthTier::Very => "very",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LengthTier::Short => "Short",
            LengthTier::Medium => "Medium",
            LengthTier::Long => "Long",
            LengthTier::Very => "Very long",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for LengthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Packs may list prompts as bare strings or as `{ text, source }` tables.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum PromptEntry {
    Plain(String),
    Sourced {
        text: String,
        #[serde(default)]
        source: String,
    },
}

#[derive(Clone, Debug, Deserialize)]
struct PackFile {
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    texts: BTreeMap<String, Vec<PromptEntry>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    /// Attribution; falls back to the pack subtitle.
    pub source: String,
}

#[derive(Clone, Debug)]
pub struct PromptPack {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    tiers: BTreeMap<LengthTier, Vec<Prompt>>,
}

impl PromptPack {
    fn from_file(id: &str, file: PackFile) -> Self {
        let mut tiers = BTreeMap::new();
        for (tier_name, entries) in file.texts {
            let Some(tier) = LengthTier::parse(&tier_name) else {
                warn!(pack = id, tier = %tier_name, "ignoring unknown length tier");
                continue;
            };
            let prompts: Vec<Prompt> = entries
                .into_iter()
                .map(|entry| match entry {
                    PromptEntry::Plain(text) => Prompt {
                        text,
                        source: file.subtitle.clone(),
                    },
                    PromptEntry::Sourced { text, source } => Prompt {
                        text,
                        source: if source.is_empty() {
                            file.subtitle.clone()
                        } else {
                            source
                        },
                    },
                })
                .filter(|p| !p.text.is_empty())
                .collect();
            tiers.insert(tier, prompts);
        }
        Self {
            id: id.to_string(),
            title: file.title,
            subtitle: file.subtitle,
            tiers,
        }
    }

    /// Prompts for `tier`; a tier the pack lacks falls back to `short`.
    pub fn prompts(&self, tier: LengthTier) -> &[Prompt] {
        self.tiers
            .get(&tier)
            .or_else(|| self.tiers.get(&LengthTier::Short))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Read-only prompt catalog keyed by pack id.
#[derive(Clone, Debug)]
pub struct Corpus {
    packs: Vec<PromptPack>,
}

impl Corpus {
    /// Load the bundled packs. Broken packs are skipped with a warning.
    pub fn load() -> Self {
        let mut sources = Vec::new();
        for name in PromptAssets::iter() {
            let Some(id) = name.strip_suffix(".toml") else {
                continue;
            };
            let Some(file) = PromptAssets::get(&name) else {
                continue;
            };
            match std::str::from_utf8(file.data.as_ref()) {
                Ok(content) => sources.push((id.to_string(), content.to_string())),
                Err(_) => warn!("{}", CorpusError::Encoding { pack: id.to_string() }),
            }
        }

        let mut packs = Vec::new();
        for (id, content) in &sources {
            match parse_pack(id, content) {
                Ok(pack) => packs.push(pack),
                Err(e) => warn!("{e}"),
            }
        }
        Self::from_packs(packs)
    }

    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, CorpusError> {
        let packs = sources
            .into_iter()
            .map(|(id, content)| parse_pack(id, content))
            .collect::<Result<Vec<_>, _>>()?;
        if packs.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self::from_packs(packs))
    }

    fn from_packs(mut packs: Vec<PromptPack>) -> Self {
        packs.sort_by(|a, b| a.id.cmp(&b.id));
        Self { packs }
    }

    pub fn packs(&self) -> &[PromptPack] {
        &self.packs
    }

    pub fn contains(&self, id: &str) -> bool {
        self.packs.iter().any(|p| p.id == id)
    }

    /// Pack by id, falling back to the default pack and then to the first.
    pub fn pack(&self, id: &str) -> Option<&PromptPack> {
        self.packs
            .iter()
            .find(|p| p.id == id)
            .or_else(|| self.packs.iter().find(|p| p.id == DEFAULT_PACK))
            .or_else(|| self.packs.first())
    }

    pub fn prompts(&self, pack: &str, tier: LengthTier) -> &[Prompt] {
        self.pack(pack).map_or(&[], |p| p.prompts(tier))
    }

    /// Id of the pack after `id`, wrapping around.
    pub fn next_pack_id(&self, id: &str) -> Option<&str> {
        if self.packs.is_empty() {
            return None;
        }
        let idx = self.packs.iter().position(|p| p.id == id);
        let next = idx.map_or(0, |i| (i + 1) % self.packs.len());
        Some(self.packs[next].id.as_str())
    }
}

fn parse_pack(id: &str, content: &str) -> Result<PromptPack, CorpusError> {
    let file: PackFile = toml::from_str(content).map_err(|source| CorpusError::Parse {
        pack: id.to_string(),
        source,
    })?;
    Ok(PromptPack::from_file(id, file))
}

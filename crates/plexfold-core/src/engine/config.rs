use crate::core::io::artifacts::ArtifactKind;
use crate::core::models::job::Composition;
use crate::core::models::seed::SeedPlan;
use std::ops::Range;
use thiserror::Error;

/// Largest selection a job may request.
pub const MAX_SELECTED: usize = 5;

/// Default hit caps handed to the external search tools.
pub const UNIREF_MAX_HITS: usize = 10_000;
pub const MGNIFY_MAX_HITS: usize = 501;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Which genetic-database bundle the external search tools are pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabasePreset {
    /// Small-BFD substitute for the deep search; faster, shallower.
    Reduced,
    /// Full BFD/Uniclust search.
    Full,
}

impl DatabasePreset {
    /// Artifact kinds a job under this preset requests per component.
    pub fn requested_artifacts(&self) -> &'static [ArtifactKind] {
        match self {
            DatabasePreset::Reduced => &[
                ArtifactKind::Uniref90,
                ArtifactKind::Mgnify,
                ArtifactKind::SmallBfd,
                ArtifactKind::Pdb70Templates,
            ],
            DatabasePreset::Full => &[
                ArtifactKind::Uniref90,
                ArtifactKind::Mgnify,
                ArtifactKind::BfdUniclust,
                ArtifactKind::Pdb70Templates,
            ],
        }
    }

    /// Hit cap passed to the search tool for one artifact kind.
    pub fn search_hit_cap(&self, kind: ArtifactKind, templates: &TemplatePolicy) -> usize {
        match kind {
            ArtifactKind::Uniref90 => UNIREF_MAX_HITS,
            ArtifactKind::Mgnify => MGNIFY_MAX_HITS,
            ArtifactKind::SmallBfd | ArtifactKind::BfdUniclust => UNIREF_MAX_HITS,
            ArtifactKind::Pdb70Templates => templates.search_hit_cap,
        }
    }
}

impl std::fmt::Display for DatabasePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DatabasePreset::Reduced => "reduced",
            DatabasePreset::Full => "full",
        };
        write!(f, "{label}")
    }
}

/// Template handling derived from the job composition: complex jobs cap the
/// per-component template search like monomers do, but retain more templates
/// for the final feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplatePolicy {
    pub search_hit_cap: usize,
    pub retained_templates: usize,
}

impl TemplatePolicy {
    pub fn for_composition(composition: Composition) -> Self {
        match composition {
            Composition::Monomer => Self {
                search_hit_cap: 20,
                retained_templates: 4,
            },
            Composition::Homomer | Composition::Heteromer => Self {
                search_hit_cap: 20,
                retained_templates: 20,
            },
        }
    }
}

/// A one-based, inclusive residue index range restricting candidate scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidueRange {
    start: usize,
    end: usize,
}

impl ResidueRange {
    pub fn new(start: usize, end: usize) -> Result<Self, ConfigError> {
        if start == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "focus_region",
                reason: "residue indices are one-based".to_string(),
            });
        }
        if start > end {
            return Err(ConfigError::InvalidParameter {
                name: "focus_region",
                reason: format!("start {start} exceeds end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Zero-based half-open window clamped to a chain of `len` residues.
    pub fn window(&self, len: usize) -> Range<usize> {
        let start = (self.start - 1).min(len);
        let end = self.end.min(len);
        start..end.max(start)
    }
}

/// Named bundle fixing the sampling depth options to a preset combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThoroughnessPreset {
    /// Single pass, single seed, reduced databases.
    Fast,
    /// Moderate recycling over a couple of seeds.
    Balanced,
    /// Deep recycling, wide seed set, full databases.
    Thorough,
}

impl ThoroughnessPreset {
    pub fn recycle_budget(&self) -> usize {
        match self {
            ThoroughnessPreset::Fast => 1,
            ThoroughnessPreset::Balanced => 3,
            ThoroughnessPreset::Thorough => 20,
        }
    }

    pub fn recycle_tolerance(&self) -> f64 {
        match self {
            ThoroughnessPreset::Fast => 0.0,
            ThoroughnessPreset::Balanced => 0.5,
            ThoroughnessPreset::Thorough => 0.1,
        }
    }

    pub fn seed_count(&self) -> usize {
        match self {
            ThoroughnessPreset::Fast => 1,
            ThoroughnessPreset::Balanced => 2,
            ThoroughnessPreset::Thorough => 5,
        }
    }

    pub fn database_preset(&self) -> DatabasePreset {
        match self {
            ThoroughnessPreset::Fast | ThoroughnessPreset::Balanced => DatabasePreset::Reduced,
            ThoroughnessPreset::Thorough => DatabasePreset::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldConfig {
    pub database_preset: DatabasePreset,
    pub recycle_budget: usize,
    pub recycle_tolerance: f64,
    pub seeds: SeedPlan,
    pub focus_region: Option<ResidueRange>,
    pub max_candidates: usize,
}

impl FoldConfig {
    /// Configuration fixed entirely by a thoroughness preset.
    pub fn from_preset(preset: ThoroughnessPreset) -> Self {
        Self {
            database_preset: preset.database_preset(),
            recycle_budget: preset.recycle_budget(),
            recycle_tolerance: preset.recycle_tolerance(),
            seeds: SeedPlan::Generate(preset.seed_count()),
            focus_region: None,
            max_candidates: MAX_SELECTED,
        }
    }
}

#[derive(Default)]
pub struct FoldConfigBuilder {
    database_preset: Option<DatabasePreset>,
    recycle_budget: Option<usize>,
    recycle_tolerance: Option<f64>,
    seeds: Option<SeedPlan>,
    focus_region: Option<ResidueRange>,
    max_candidates: Option<usize>,
}

impl FoldConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_preset(mut self, preset: DatabasePreset) -> Self {
        self.database_preset = Some(preset);
        self
    }
    pub fn recycle_budget(mut self, budget: usize) -> Self {
        self.recycle_budget = Some(budget);
        self
    }
    pub fn recycle_tolerance(mut self, tolerance: f64) -> Self {
        self.recycle_tolerance = Some(tolerance);
        self
    }
    pub fn seeds(mut self, plan: SeedPlan) -> Self {
        self.seeds = Some(plan);
        self
    }
    pub fn focus_region(mut self, region: ResidueRange) -> Self {
        self.focus_region = Some(region);
        self
    }
    pub fn max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = Some(n);
        self
    }

    pub fn build(self) -> Result<FoldConfig, ConfigError> {
        let recycle_budget = self
            .recycle_budget
            .ok_or(ConfigError::MissingParameter("recycle_budget"))?;
        if recycle_budget == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "recycle_budget",
                reason: "must be at least 1".to_string(),
            });
        }

        let recycle_tolerance = self
            .recycle_tolerance
            .ok_or(ConfigError::MissingParameter("recycle_tolerance"))?;
        if !recycle_tolerance.is_finite() || recycle_tolerance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "recycle_tolerance",
                reason: format!("must be a finite value >= 0, got {recycle_tolerance}"),
            });
        }

        let max_candidates = self.max_candidates.unwrap_or(MAX_SELECTED);
        if max_candidates == 0 || max_candidates > MAX_SELECTED {
            return Err(ConfigError::InvalidParameter {
                name: "max_candidates",
                reason: format!("must be between 1 and {MAX_SELECTED}"),
            });
        }

        Ok(FoldConfig {
            database_preset: self
                .database_preset
                .ok_or(ConfigError::MissingParameter("database_preset"))?,
            recycle_budget,
            recycle_tolerance,
            seeds: self.seeds.ok_or(ConfigError::MissingParameter("seeds"))?,
            focus_region: self.focus_region,
            max_candidates,
        })
    }
}

use crate::cli::{DatabaseArg, FoldArgs, PresetArg};
use crate::error::{CliError, Result};
use crate::utils::parser::parse_focus_region;
use plexfold::core::models::seed::SeedPlan;
use plexfold::engine::config::{
    DatabasePreset, FoldConfig, FoldConfigBuilder, ResidueRange, ThoroughnessPreset,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Model identifiers used when the configuration file names none.
const DEFAULT_MODELS: [&str; 5] = ["model_1", "model_2", "model_3", "model_4", "model_5"];
const DEFAULT_PTM_MODELS: [&str; 5] = [
    "model_1_ptm",
    "model_2_ptm",
    "model_3_ptm",
    "model_4_ptm",
    "model_5_ptm",
];

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
enum PartialDatabasePreset {
    #[default]
    Reduced,
    Full,
}

impl From<PartialDatabasePreset> for DatabasePreset {
    fn from(p: PartialDatabasePreset) -> Self {
        match p {
            PartialDatabasePreset::Reduced => DatabasePreset::Reduced,
            PartialDatabasePreset::Full => DatabasePreset::Full,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSearchConfig {
    #[serde(rename = "database-preset")]
    database_preset: Option<PartialDatabasePreset>,
    #[serde(rename = "msa-library")]
    msa_library: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRecyclingConfig {
    budget: Option<usize>,
    tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSamplingConfig {
    seeds: Option<Vec<u64>>,
    #[serde(rename = "num-seeds")]
    num_seeds: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialResidueRange {
    start: usize,
    end: usize,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSelectionConfig {
    #[serde(rename = "focus-region")]
    focus_region: Option<PartialResidueRange>,
    #[serde(rename = "max-candidates")]
    max_candidates: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialToolsConfig {
    #[serde(rename = "model-command")]
    model_command: Option<PathBuf>,
    #[serde(rename = "search-command")]
    search_command: Option<PathBuf>,
    models: Option<Vec<String>>,
    #[serde(rename = "ptm-models")]
    ptm_models: Option<Vec<String>>,
}

/// The configuration file as written: every field optional, merged with CLI
/// overrides before anything is validated.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    #[serde(default)]
    search: PartialSearchConfig,
    #[serde(default)]
    recycling: PartialRecyclingConfig,
    #[serde(default)]
    sampling: PartialSamplingConfig,
    #[serde(default)]
    selection: PartialSelectionConfig,
    #[serde(default)]
    tools: PartialToolsConfig,
}

/// Fully resolved settings ready to drive a folding run.
#[derive(Debug)]
pub struct Settings {
    pub config: FoldConfig,
    pub msa_library: Option<PathBuf>,
    pub tools: ToolsSettings,
}

#[derive(Debug, Clone)]
pub struct ToolsSettings {
    pub model_command: PathBuf,
    pub search_command: Option<PathBuf>,
    pub models: Vec<String>,
    pub ptm_models: Vec<String>,
}

impl PartialSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final settings. Precedence: CLI argument, then
    /// configuration file, then the thoroughness preset's bundled value.
    pub fn merge_with_cli(self, args: &FoldArgs) -> Result<Settings> {
        let preset = match args.preset {
            Some(PresetArg::Fast) => ThoroughnessPreset::Fast,
            Some(PresetArg::Thorough) => ThoroughnessPreset::Thorough,
            Some(PresetArg::Balanced) | None => ThoroughnessPreset::Balanced,
        };
        debug!(?preset, "Resolving configuration against preset defaults.");

        let database_preset = match args.database {
            Some(DatabaseArg::Reduced) => DatabasePreset::Reduced,
            Some(DatabaseArg::Full) => DatabasePreset::Full,
            None => self
                .search
                .database_preset
                .map(DatabasePreset::from)
                .unwrap_or_else(|| preset.database_preset()),
        };

        let recycle_budget = args
            .recycle_budget
            .or(self.recycling.budget)
            .unwrap_or_else(|| preset.recycle_budget());
        let recycle_tolerance = args
            .recycle_tolerance
            .or(self.recycling.tolerance)
            .unwrap_or_else(|| preset.recycle_tolerance());

        let seeds = if let Some(seeds) = &args.seeds {
            SeedPlan::Explicit(seeds.clone())
        } else if let Some(count) = args.num_seeds {
            SeedPlan::Generate(count)
        } else if let Some(seeds) = self.sampling.seeds {
            SeedPlan::Explicit(seeds)
        } else if let Some(count) = self.sampling.num_seeds {
            SeedPlan::Generate(count)
        } else {
            SeedPlan::Generate(preset.seed_count())
        };

        let focus_region: Option<ResidueRange> = match (&args.focus_region, self.selection.focus_region)
        {
            (Some(spec), _) => Some(parse_focus_region(spec)?),
            (None, Some(partial)) => Some(
                ResidueRange::new(partial.start, partial.end)
                    .map_err(|e| CliError::Config(e.to_string()))?,
            ),
            (None, None) => None,
        };

        let mut builder = FoldConfigBuilder::new()
            .database_preset(database_preset)
            .recycle_budget(recycle_budget)
            .recycle_tolerance(recycle_tolerance)
            .seeds(seeds);
        if let Some(region) = focus_region {
            builder = builder.focus_region(region);
        }
        if let Some(n) = args.max_candidates.or(self.selection.max_candidates) {
            builder = builder.max_candidates(n);
        }
        let config = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        let model_command = args
            .model_command
            .clone()
            .or(self.tools.model_command)
            .ok_or_else(|| {
                CliError::Config(
                    "no folding-model executable configured (set tools.model-command or pass --model-command)"
                        .to_string(),
                )
            })?;

        Ok(Settings {
            config,
            msa_library: args.msa_library.clone().or(self.search.msa_library),
            tools: ToolsSettings {
                model_command,
                search_command: args.search_command.clone().or(self.tools.search_command),
                models: self
                    .tools
                    .models
                    .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|s| s.to_string()).collect()),
                ptm_models: self
                    .tools
                    .ptm_models
                    .unwrap_or_else(|| DEFAULT_PTM_MODELS.iter().map(|s| s.to_string()).collect()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> FoldArgs {
        FoldArgs {
            input: PathBuf::from("in.fasta"),
            output: PathBuf::from("out"),
            config: None,
            preset: None,
            recycle_budget: None,
            recycle_tolerance: None,
            seeds: None,
            num_seeds: None,
            database: None,
            focus_region: None,
            max_candidates: None,
            msa_library: None,
            model_command: Some(PathBuf::from("/usr/bin/foldmodel")),
            search_command: None,
        }
    }

    #[test]
    fn defaults_come_from_the_balanced_preset() {
        let settings = PartialSettings::default()
            .merge_with_cli(&bare_args())
            .unwrap();

        assert_eq!(settings.config.recycle_budget, 3);
        assert_eq!(settings.config.seeds, SeedPlan::Generate(2));
        assert_eq!(settings.config.database_preset, DatabasePreset::Reduced);
        assert_eq!(settings.tools.models.len(), 5);
    }

    #[test]
    fn file_values_override_the_preset() {
        let partial: PartialSettings = toml::from_str(
            r#"
[search]
database-preset = "full"

[recycling]
budget = 8
tolerance = 0.2

[sampling]
seeds = [4, 5]

[selection]
focus-region = { start = 3, end = 9 }
max-candidates = 2

[tools]
model-command = "/opt/fold/model"
search-command = "/opt/fold/search"
models = ["model_1"]
"#,
        )
        .unwrap();

        let mut args = bare_args();
        args.model_command = None;
        let settings = partial.merge_with_cli(&args).unwrap();

        assert_eq!(settings.config.database_preset, DatabasePreset::Full);
        assert_eq!(settings.config.recycle_budget, 8);
        assert_eq!(settings.config.seeds, SeedPlan::Explicit(vec![4, 5]));
        assert_eq!(settings.config.max_candidates, 2);
        assert_eq!(
            settings.config.focus_region.map(|r| (r.start(), r.end())),
            Some((3, 9))
        );
        assert_eq!(settings.tools.model_command, PathBuf::from("/opt/fold/model"));
        assert_eq!(settings.tools.models, vec!["model_1".to_string()]);
        // Unnamed pTM models keep their defaults.
        assert_eq!(settings.tools.ptm_models.len(), 5);
    }

    #[test]
    fn cli_arguments_override_the_file() {
        let partial: PartialSettings = toml::from_str(
            r#"
[recycling]
budget = 8

[sampling]
num-seeds = 7
"#,
        )
        .unwrap();

        let mut args = bare_args();
        args.recycle_budget = Some(2);
        args.seeds = Some(vec![11, 12]);
        args.focus_region = Some("10-50".to_string());

        let settings = partial.merge_with_cli(&args).unwrap();
        assert_eq!(settings.config.recycle_budget, 2);
        assert_eq!(settings.config.seeds, SeedPlan::Explicit(vec![11, 12]));
        assert_eq!(
            settings.config.focus_region.map(|r| (r.start(), r.end())),
            Some((10, 50))
        );
    }

    #[test]
    fn missing_model_command_is_a_configuration_error() {
        let mut args = bare_args();
        args.model_command = None;

        let err = PartialSettings::default().merge_with_cli(&args).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn invalid_numeric_values_surface_as_configuration_errors() {
        let mut args = bare_args();
        args.recycle_budget = Some(0);

        let err = PartialSettings::default().merge_with_cli(&args).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let result: std::result::Result<PartialSettings, _> =
            toml::from_str("[recycling]\nbudgett = 3\n");
        assert!(result.is_err());
    }
}

/// Alignment and template artifact kinds produced by the external search tools.
///
/// Each kind fixes a file-name suffix and a format marker used to decide
/// whether a cached file is structurally valid without parsing it in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// UniRef90 hits, Stockholm format.
    Uniref90,
    /// MGnify hits, Stockholm format.
    Mgnify,
    /// Small-BFD hits, Stockholm format (reduced database preset).
    SmallBfd,
    /// BFD/Uniclust hits, A3M format (full database preset).
    BfdUniclust,
    /// PDB70 template search results, HHR format.
    Pdb70Templates,
}

impl ArtifactKind {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Uniref90 => "uniref90_hits.sto",
            ArtifactKind::Mgnify => "mgnify_hits.sto",
            ArtifactKind::SmallBfd => "small_bfd_hits.sto",
            ArtifactKind::BfdUniclust => "bfd_uniclust_hits.a3m",
            ArtifactKind::Pdb70Templates => "pdb70_hits.hhr",
        }
    }

    /// Library file name for a component's artifact of this kind.
    pub fn file_name(&self, description: &str) -> String {
        format!("{description}_{}", self.file_suffix())
    }

    /// Leading format marker a well-formed artifact of this kind must carry.
    pub fn format_marker(&self) -> &'static str {
        match self {
            ArtifactKind::Uniref90 | ArtifactKind::Mgnify | ArtifactKind::SmallBfd => "# STOCKHOLM",
            ArtifactKind::BfdUniclust => ">",
            ArtifactKind::Pdb70Templates => "Query",
        }
    }

    /// Structural validity probe: non-empty and opening with the format marker.
    pub fn is_well_formed(&self, content: &str) -> bool {
        let trimmed = content.trim_start();
        !trimmed.is_empty() && trimmed.starts_with(self.format_marker())
    }

    /// Number of aligned sequences in an artifact, where the format carries
    /// alignments; template search results report `None`.
    pub fn alignment_depth(&self, content: &str) -> Option<usize> {
        match self {
            ArtifactKind::Uniref90 | ArtifactKind::Mgnify | ArtifactKind::SmallBfd => {
                Some(stockholm_depth(content))
            }
            ArtifactKind::BfdUniclust => {
                Some(content.lines().filter(|l| l.starts_with('>')).count())
            }
            ArtifactKind::Pdb70Templates => None,
        }
    }
}

/// Unique sequence names across the alignment block of a Stockholm file.
fn stockholm_depth(content: &str) -> usize {
    let mut names: Vec<&str> = Vec::new();
    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') || line == "//" {
            continue;
        }
        if let Some(name) = line.split_whitespace().next()
            && !names.contains(&name)
        {
            names.push(name);
        }
    }
    names.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCKHOLM: &str = "# STOCKHOLM 1.0\n#=GF ID test\nseq1 ACDE\nseq2 AC-E\nseq1 FGHI\n//\n";

    #[test]
    fn file_names_follow_the_library_convention() {
        assert_eq!(
            ArtifactKind::Uniref90.file_name("P1"),
            "P1_uniref90_hits.sto"
        );
        assert_eq!(
            ArtifactKind::Pdb70Templates.file_name("P2"),
            "P2_pdb70_hits.hhr"
        );
    }

    #[test]
    fn well_formedness_requires_the_marker() {
        assert!(ArtifactKind::Uniref90.is_well_formed(STOCKHOLM));
        assert!(ArtifactKind::BfdUniclust.is_well_formed(">seq1\nACDE\n"));
        assert!(ArtifactKind::Pdb70Templates.is_well_formed("Query P1\nNo Hit\n"));

        assert!(!ArtifactKind::Uniref90.is_well_formed(""));
        assert!(!ArtifactKind::Uniref90.is_well_formed("   \n"));
        assert!(!ArtifactKind::Uniref90.is_well_formed(">seq1\nACDE\n"));
    }

    #[test]
    fn stockholm_depth_counts_unique_names() {
        assert_eq!(ArtifactKind::Uniref90.alignment_depth(STOCKHOLM), Some(2));
    }

    #[test]
    fn a3m_depth_counts_headers() {
        let a3m = ">query\nACDE\n>hit1\nAC-E\n>hit2\nACDF\n";
        assert_eq!(ArtifactKind::BfdUniclust.alignment_depth(a3m), Some(3));
    }

    #[test]
    fn template_results_carry_no_depth() {
        assert_eq!(ArtifactKind::Pdb70Templates.alignment_depth("Query"), None);
    }
}

//! Coverage gate for candidate pairs.
//!
//! Before a member is written into a representative group, the pair must be
//! able to satisfy the configured coverage fraction, judged from the two
//! sequence lengths alone (the best possible alignment covers
//! `min(rep_len, member_len)` residues).

/// How the coverage fraction is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageMode {
    /// Both sequences must each be coverable to the threshold.
    #[default]
    Bidirectional,
    /// Only the member (target) must be coverable.
    Target,
    /// Only the representative (query) must be coverable.
    Query,
    /// Member/representative length ratio within `[thr, 1/thr]`.
    LengthQuery,
    /// Representative/member length ratio within `[thr, 1/thr]`.
    LengthTarget,
}

impl CoverageMode {
    /// Decode the numeric mode used on the command line.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Bidirectional),
            1 => Some(Self::Target),
            2 => Some(Self::Query),
            3 => Some(Self::LengthQuery),
            4 => Some(Self::LengthTarget),
            _ => None,
        }
    }
}

/// Can a pair with these lengths possibly satisfy the coverage threshold?
pub fn can_be_covered(cov_thr: f32, mode: CoverageMode, rep_len: u32, member_len: u32) -> bool {
    if cov_thr <= 0.0 {
        return true;
    }
    let q = rep_len as f32;
    let t = member_len as f32;
    match mode {
        CoverageMode::Bidirectional => q / t >= cov_thr && t / q >= cov_thr,
        CoverageMode::Target => q / t >= cov_thr,
        CoverageMode::Query => t / q >= cov_thr,
        CoverageMode::LengthQuery => t / q >= cov_thr && t / q <= 1.0 / cov_thr,
        CoverageMode::LengthTarget => q / t >= cov_thr && q / t <= 1.0 / cov_thr,
    }
}

//! Approval thresholds over a contributor set.
//!
//! - Edit → `yes / contributors ≥ 4/5`
//! - DeleteLine, DeleteFile → every contributor approves
//!
//! All comparisons are done in integers so `0.8 × n` is never rounded.

use crate::proposal::ProposalKind;

/// Numerator of the edit approval ratio.
pub const EDIT_RATIO_NUM: usize = 4;

/// Denominator of the edit approval ratio.
pub const EDIT_RATIO_DEN: usize = 5;

/// Whether `yes` contributor approvals out of `contributors` carry an edit.
///
/// `yes ≥ 0.8 × contributors` rewritten as `5 × yes ≥ 4 × contributors`.
///
/// # Examples
///
/// ```
/// use concord_consensus::edit_approved;
///
/// assert!(edit_approved(4, 5));  // exactly 0.8
/// assert!(!edit_approved(3, 5)); // 0.6
/// assert!(edit_approved(1, 1));
/// ```
pub const fn edit_approved(yes: usize, contributors: usize) -> bool {
    yes * EDIT_RATIO_DEN >= contributors * EDIT_RATIO_NUM
}

/// Whether `yes` contributor approvals out of `contributors` carry a deletion.
///
/// # Examples
///
/// ```
/// use concord_consensus::delete_approved;
///
/// assert!(!delete_approved(2, 3));
/// assert!(delete_approved(3, 3));
/// ```
pub const fn delete_approved(yes: usize, contributors: usize) -> bool {
    yes == contributors
}

/// Smallest number of contributor approvals that carries a proposal of `kind`.
pub const fn required_votes(kind: ProposalKind, contributors: usize) -> usize {
    match kind {
        // ceil(n * 4 / 5) = (n * 4 + 4) / 5
        ProposalKind::Edit => {
            (contributors * EDIT_RATIO_NUM + EDIT_RATIO_DEN - 1) / EDIT_RATIO_DEN
        }
        ProposalKind::DeleteLine | ProposalKind::DeleteFile => contributors,
    }
}

/// How many more contributor approvals a proposal of `kind` still needs.
pub const fn votes_needed(kind: ProposalKind, yes: usize, contributors: usize) -> usize {
    let required = required_votes(kind, contributors);
    if yes >= required {
        0
    } else {
        required - yes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn edit_threshold_cases() {
        let cases = [
            (4, 5, true),  // 0.8
            (3, 5, false), // 0.6
            (1, 1, true),
            (0, 1, false),
            (8, 10, true),
            (7, 10, false),
            (4, 6, false), // 0.666
            (5, 6, true),  // 0.833
        ];

        for (yes, contributors, expected) in cases {
            assert_eq!(
                edit_approved(yes, contributors),
                expected,
                "edit_approved({}, {}) should be {}",
                yes,
                contributors,
                expected
            );
        }
    }

    #[test]
    fn delete_threshold_cases() {
        assert!(!delete_approved(2, 3));
        assert!(delete_approved(3, 3));
        assert!(delete_approved(1, 1));
        assert!(!delete_approved(0, 1));
    }

    #[test]
    fn votes_needed_calculation() {
        assert_eq!(votes_needed(ProposalKind::Edit, 0, 5), 4);
        assert_eq!(votes_needed(ProposalKind::Edit, 4, 5), 0);
        assert_eq!(votes_needed(ProposalKind::DeleteLine, 2, 3), 1);
        assert_eq!(votes_needed(ProposalKind::DeleteFile, 3, 3), 0);
    }

    proptest! {
        #[test]
        fn edit_matches_real_ratio(contributors in 1usize..500, yes in 0usize..500) {
            let yes = yes.min(contributors);
            let ratio = yes as f64 / contributors as f64;
            // Float ratio is only trusted away from the 0.8 boundary.
            prop_assume!((ratio - 0.8).abs() > 1e-9 || yes * 5 == contributors * 4);
            prop_assert_eq!(edit_approved(yes, contributors), ratio >= 0.8 || yes * 5 == contributors * 4);
        }

        #[test]
        fn required_votes_is_the_boundary(contributors in 1usize..500) {
            for kind in [ProposalKind::Edit, ProposalKind::DeleteLine] {
                let required = required_votes(kind, contributors);
                prop_assert!(required <= contributors);
                let approved = |yes| match kind {
                    ProposalKind::Edit => edit_approved(yes, contributors),
                    _ => delete_approved(yes, contributors),
                };
                prop_assert!(approved(required));
                prop_assert!(required == 0 || !approved(required - 1));
            }
        }

        #[test]
        fn edit_monotonic_in_yes(contributors in 1usize..200, yes in 0usize..200) {
            let yes = yes.min(contributors - 1);
            if edit_approved(yes, contributors) {
                prop_assert!(edit_approved(yes + 1, contributors));
            }
        }
    }
}

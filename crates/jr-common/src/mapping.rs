use crate::embedding::EntityEmbedding;
use crate::{FEATURE_ABOUT, FEATURE_CONTENT, FEATURE_PREFERRED_WORK_TYPES, FEATURE_SKILLS,
    FEATURE_WORK_TYPE};

/// Canonical user-feature to job-feature mapping, applied before a user
/// embedding enters the job scorer so user-vs-job and job-vs-job share
/// one scoring path. Kept as data, not inline logic: this table is the
/// single place the mapping is defined.
///
/// `skills` maps onto itself so a caller can weight it against job-side
/// skills once jobs carry that feature; with the default weights it is
/// inert. Salary is deliberately unmapped (jobs store no salary vector
/// to compare against).
pub const USER_JOB_FEATURE_MAP: [(&str, &str); 3] = [
    (FEATURE_ABOUT, FEATURE_CONTENT),
    (FEATURE_PREFERRED_WORK_TYPES, FEATURE_WORK_TYPE),
    (FEATURE_SKILLS, FEATURE_SKILLS),
];

/// Rename a user embedding's features to their job-schema counterparts.
/// Features without a mapping entry (e.g. `title`) keep their name.
pub fn map_user_to_job_features(user: EntityEmbedding) -> EntityEmbedding {
    user.into_iter()
        .map(|(feature, vector)| {
            let mapped = USER_JOB_FEATURE_MAP
                .iter()
                .find(|(from, _)| *from == feature)
                .map(|(_, to)| (*to).to_string())
                .unwrap_or(feature);
            (mapped, vector)
        })
        .collect()
}

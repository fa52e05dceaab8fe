use std::io::Write;

use examkit_config::{BlankPolicy, Permutation, ScoreAdjustment, Settings};

use crate::canonical::CanonicalQuestionMap;
use crate::error::NormalizeError;
use crate::model::{
    CanonicalResponse, NormalizedRecord, NormalizedTable, RawResponseFile, VersionSummary,
    IDENTITY_COLUMNS,
};

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub blank_token: String,
    pub blank_policy: BlankPolicy,
    pub score_adjustment: ScoreAdjustment,
    pub raw_score_column: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for NormalizeOptions {
    fn from(s: &Settings) -> Self {
        Self {
            blank_token: s.blank_token.clone(),
            blank_policy: s.blank_policy,
            score_adjustment: s.score_adjustment,
            raw_score_column: s.raw_score_column.clone(),
        }
    }
}

/// Remap one raw response into canonical choice space.
///
/// A blank marker is first replaced by the key value (under
/// `BlankPolicy::AnswerKey`). An integer `r` in `[1, k]` becomes
/// `perm[r-1] + 1`; anything else passes through verbatim.
pub fn normalize_response(
    raw: &str,
    key: &str,
    perm: &Permutation,
    opts: &NormalizeOptions,
) -> CanonicalResponse {
    let value = if raw == opts.blank_token && opts.blank_policy == BlankPolicy::AnswerKey {
        key
    } else {
        raw
    };

    match value.trim().parse::<usize>().ok().and_then(|r| perm.canonical_of(r)) {
        Some(canonical) => CanonicalResponse::Choice(canonical),
        None => CanonicalResponse::Literal(value.to_string()),
    }
}

/// Normalize every student of every version. `files[i]` is version `i`.
pub fn normalize(
    map: &CanonicalQuestionMap,
    files: &[RawResponseFile],
    opts: &NormalizeOptions,
) -> Result<NormalizedTable, NormalizeError> {
    let n_versions = map.versions().len();
    if files.is_empty() || files.len() > n_versions {
        return Err(NormalizeError::FileCountMismatch {
            versions: n_versions,
            files: files.len(),
        });
    }
    if files.len() < n_versions {
        log::warn!(
            "{} response file(s) for {} version(s); trailing versions are ignored",
            files.len(),
            n_versions
        );
    }

    let questions: Vec<String> = map.questions().map(str::to_string).collect();
    let mut identity_headers: Option<Vec<String>> = None;
    let mut records = Vec::new();
    let mut versions = Vec::with_capacity(files.len());

    for (vi, file) in files.iter().enumerate() {
        let version = &map.versions()[vi];

        if file.headers.len() < IDENTITY_COLUMNS {
            return Err(NormalizeError::ShortHeader {
                version: version.clone(),
                found: file.headers.len(),
            });
        }
        let prefix = &file.headers[..IDENTITY_COLUMNS];
        match &identity_headers {
            None => identity_headers = Some(prefix.to_vec()),
            Some(first) if first.as_slice() != prefix => {
                log::warn!("version '{version}': identity columns differ from the first file");
            }
            Some(_) => {}
        }

        let score_idx = prefix
            .iter()
            .position(|h| *h == opts.raw_score_column)
            .ok_or_else(|| NormalizeError::MissingColumn {
                version: version.clone(),
                column: opts.raw_score_column.clone(),
            })?;

        // Resolve (column index, permutation) for each canonical question once.
        let mut lookups = Vec::with_capacity(questions.len());
        for qid in &questions {
            let lookup = match map.placement(qid, vi) {
                Some(placement) => {
                    let column = placement.column();
                    let idx = file.column(&column).ok_or_else(|| NormalizeError::MissingColumn {
                        version: version.clone(),
                        column,
                    })?;
                    Some((idx, &placement.perm))
                }
                None => None,
            };
            lookups.push(lookup);
        }

        let (key, students) = file
            .rows
            .split_first()
            .ok_or_else(|| NormalizeError::MissingAnswerKey {
                version: version.clone(),
            })?;

        let deduction = match opts.score_adjustment {
            ScoreAdjustment::PerVersion => map.skipped(vi),
            ScoreAdjustment::LastVersion => map.skipped(n_versions - 1),
        };

        let mut kept = 0;
        let mut dropped = 0;
        for (ri, row) in students.iter().enumerate() {
            if row.len() < IDENTITY_COLUMNS {
                log::warn!("version '{version}', row {}: missing identity fields, skipping", ri + 2);
                dropped += 1;
                continue;
            }
            let adjusted = match row[score_idx]
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|s| s.checked_sub(i64::try_from(deduction).ok()?))
            {
                Some(s) => s,
                None => {
                    log::warn!(
                        "version '{version}', row {}: cannot parse or adjust raw score '{}', skipping",
                        ri + 2,
                        row[score_idx]
                    );
                    dropped += 1;
                    continue;
                }
            };
            let mut identity = row[..IDENTITY_COLUMNS].to_vec();
            identity[score_idx] = adjusted.to_string();

            let responses = lookups
                .iter()
                .map(|lookup| match lookup {
                    Some((idx, perm)) => {
                        let raw = row.get(*idx).map(String::as_str).unwrap_or("");
                        let key_value = key.get(*idx).map(String::as_str).unwrap_or("");
                        normalize_response(raw, key_value, perm, opts)
                    }
                    None => CanonicalResponse::Missing,
                })
                .collect();

            records.push(NormalizedRecord {
                identity,
                raw_score: adjusted,
                responses,
            });
            kept += 1;
        }

        log::info!("version '{version}': normalized {kept} student(s), dropped {dropped}");

        versions.push(VersionSummary {
            version: version.clone(),
            students: kept,
            dropped_rows: dropped,
            skipped_from_scoring: map.skipped(vi),
            score_deduction: deduction,
            canonical_questions: map.questions_in(vi),
        });
    }

    Ok(NormalizedTable {
        identity_headers: identity_headers.unwrap_or_default(),
        questions,
        records,
        versions,
    })
}

/// Write the normalized table as CSV.
pub fn write_csv<W: Write>(
    table: &NormalizedTable,
    writer: W,
    missing_token: &str,
) -> Result<(), NormalizeError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.header())?;
    for record in &table.records {
        let row = record
            .identity
            .iter()
            .cloned()
            .chain(record.responses.iter().map(|r| r.to_field(missing_token)));
        wtr.write_record(row)?;
    }
    wtr.flush().map_err(NormalizeError::Write)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use examkit_config::ExamConfig;

    const HEADER: &str = "CWID,Mybama ID,Student Name,Raw Score,Blank";

    fn opts() -> NormalizeOptions {
        NormalizeOptions::default()
    }

    fn swap_config() -> ExamConfig {
        ExamConfig::from_toml(
            r#"
[[versions]]
version = 1
order = ["q1"]
[[versions.questions]]
qid = "q1"
perm = [0, 1]

[[versions]]
version = 2
order = ["q1"]
[[versions.questions]]
qid = "q1"
perm = [1, 0]
"#,
        )
        .unwrap()
    }

    fn file(rows: &[&str]) -> RawResponseFile {
        let mut csv = format!("{HEADER},1\n");
        for r in rows {
            csv.push_str(r);
            csv.push('\n');
        }
        RawResponseFile::from_csv(&csv).unwrap()
    }

    #[test]
    fn swapped_choice_normalizes_to_canonical() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let v1 = file(&[",,,,,1", "1,a,Ann,1,,1"]);
        let v2 = file(&[",,,,,2", "2,b,Bob,0,,1"]);
        let table = normalize(&map, &[v1, v2], &opts()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.response(0, "q1"), Some(&CanonicalResponse::Choice(1)));
        assert_eq!(table.response(1, "q1"), Some(&CanonicalResponse::Choice(2)));
    }

    #[test]
    fn blank_takes_key_value() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let v1 = file(&[",,,,,1", "1,a,Ann,1,,."]);
        let v2 = file(&[",,,,,2", "2,b,Bob,1,,."]);
        let table = normalize(&map, &[v1, v2], &opts()).unwrap();

        assert_eq!(table.response(0, "q1"), Some(&CanonicalResponse::Choice(1)));
        // Key "2" on version 2 maps back to canonical "1".
        assert_eq!(table.response(1, "q1"), Some(&CanonicalResponse::Choice(1)));
    }

    #[test]
    fn blank_kept_when_policy_is_keep() {
        let perm = Permutation::new(vec![1, 0]).unwrap();
        let opts = NormalizeOptions {
            blank_policy: BlankPolicy::Keep,
            ..opts()
        };
        assert_eq!(
            normalize_response(".", "2", &perm, &opts),
            CanonicalResponse::Literal(".".into())
        );
    }

    #[test]
    fn unmappable_tokens_pass_through() {
        let perm = Permutation::new(vec![2, 0, 1]).unwrap();
        for token in ["*", "-", " ", "0", "4", "x"] {
            assert_eq!(
                normalize_response(token, "1", &perm, &opts()),
                CanonicalResponse::Literal(token.into()),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn raw_score_is_reduced_by_unpermuted_count() {
        let config = ExamConfig::from_toml(
            r#"
[[versions]]
version = 1
order = ["q1", "q2", "q3"]
[[versions.questions]]
qid = "q1"
perm = [0, 1]
[[versions.questions]]
qid = "q2"
[[versions.questions]]
qid = "q3"

[[versions]]
version = 2
order = ["q1"]
[[versions.questions]]
qid = "q1"
perm = [1, 0]
"#,
        )
        .unwrap();
        let map = CanonicalQuestionMap::build(&config);
        let mk = |key: &str, row: &str| {
            RawResponseFile::from_csv(&format!("{HEADER},1,2,3\n{key}\n{row}\n")).unwrap()
        };
        let v1 = mk(",,,,,1,1,1", "1,a,Ann,3,,1,1,1");
        let v2 = mk(",,,,,2", "2,b,Bob,3,,2");

        let table = normalize(&map, &[v1.clone(), v2.clone()], &opts()).unwrap();
        assert_eq!(table.records[0].raw_score, 1);
        assert_eq!(table.records[0].identity[3], "1");
        assert_eq!(table.records[1].raw_score, 3);

        let legacy = NormalizeOptions {
            score_adjustment: ScoreAdjustment::LastVersion,
            ..opts()
        };
        let table = normalize(&map, &[v1, v2], &legacy).unwrap();
        assert_eq!(table.records[0].raw_score, 3);
        assert_eq!(table.records[1].raw_score, 3);
    }

    #[test]
    fn version_without_permuted_questions_yields_missing() {
        let config = ExamConfig::from_toml(
            r#"
[[versions]]
version = 1
order = ["q1"]
[[versions.questions]]
qid = "q1"
perm = [0, 1]

[[versions]]
version = 2
order = ["q9"]
[[versions.questions]]
qid = "q9"
"#,
        )
        .unwrap();
        let map = CanonicalQuestionMap::build(&config);
        let v1 = file(&[",,,,,1", "1,a,Ann,1,,1"]);
        let v2 = file(&[",,,,,1", "2,b,Bob,1,,1"]);
        let table = normalize(&map, &[v1, v2], &opts()).unwrap();
        assert_eq!(table.response(1, "q1"), Some(&CanonicalResponse::Missing));
        assert_eq!(table.versions[1].canonical_questions, 0);
    }

    #[test]
    fn unparseable_score_row_is_dropped() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let v1 = file(&[",,,,,1", "1,a,Ann,abc,,1", "3,c,Cy,1,,2", "short"]);
        let table = normalize(&map, &[v1], &opts()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.versions[0].dropped_rows, 2);
    }

    #[test]
    fn missing_key_row_is_an_error() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let v1 = file(&[]);
        let err = normalize(&map, &[v1], &opts()).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingAnswerKey { .. }));
    }

    #[test]
    fn missing_slot_column_is_an_error() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let v1 = RawResponseFile::from_csv(&format!("{HEADER},7\n,,,,,1\n")).unwrap();
        let err = normalize(&map, &[v1], &opts()).unwrap_err();
        assert!(err.to_string().contains("missing column '1'"), "{err}");
    }

    #[test]
    fn too_many_files_is_an_error() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let f = file(&[",,,,,1"]);
        let err = normalize(&map, &[f.clone(), f.clone(), f], &opts()).unwrap_err();
        assert!(matches!(err, NormalizeError::FileCountMismatch { versions: 2, files: 3 }));
    }

    #[test]
    fn raw_score_that_cannot_be_adjusted_is_dropped() {
        let cfg = ExamConfig::from_toml(
            r#"
[[versions]]
version = 1
order = ["q1", "q2"]
questions = [{ qid = "q1", perm = [0, 1] }, { qid = "q2" }]
"#,
        )
        .unwrap();
        let map = CanonicalQuestionMap::build(&cfg);
        let v1 = RawResponseFile::from_csv(&format!(
            "{HEADER},1,2\n,,,,,1,1\n1,a,Ann,-9223372036854775808,,1,1\n2,b,Bob,4000000000,,2,1\n"
        ))
        .unwrap();

        let table = normalize(&map, &[v1], &opts()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].raw_score, 3_999_999_999);
        assert_eq!(table.versions[0].dropped_rows, 1);
    }

    #[test]
    fn write_csv_emits_sorted_header() {
        let map = CanonicalQuestionMap::build(&swap_config());
        let v1 = file(&[",,,,,1", "1,a,Ann,1,,1"]);
        let table = normalize(&map, &[v1], &opts()).unwrap();

        let mut out = Vec::new();
        write_csv(&table, &mut out, "").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "CWID,Mybama ID,Student Name,Raw Score,Blank,q1\n1,a,Ann,1,,1\n"
        );
    }
}

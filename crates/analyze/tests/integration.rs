use std::path::PathBuf;

use examkit_analyze::{
    admit, analyze, AnalysisReport, AnalyzeError, AnalyzeOptions, Choice, DegenerateInput,
    Distribution, ResponseTable,
};
use examkit_config::ScoreSource;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run(file: &str, opts: &AnalyzeOptions) -> Result<AnalysisReport, AnalyzeError> {
    let table = ResponseTable::load(&fixtures_dir().join(file)).unwrap();
    let cohort = admit(&table, opts)?;
    analyze(&cohort)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

fn scenario_opts() -> AnalyzeOptions {
    AnalyzeOptions {
        skip_columns: 1,
        score_source: ScoreSource::RawScore,
        ..Default::default()
    }
}

// -------------------------------------------------------------------------
// Hand-computed exam statistics
// -------------------------------------------------------------------------

#[test]
fn uniform_scores_over_two_questions() {
    let report = run("scenario_c.csv", &scenario_opts()).unwrap();
    let e = &report.exam;

    assert_eq!(e.students, 5);
    assert_eq!(e.questions, 2);
    assert!(close(e.mean, 3.2));
    assert!(close(e.std_dev, 0.7f64.sqrt()));
    // pq = 0.8·0.2 + 0.6·0.4 = 0.4
    let r20 = 2.0 * (1.0 - 0.4 / 0.7);
    assert!(close(e.kr20, r20), "kr20 = {}", e.kr20);
    assert!(close(e.stderr_measurement, 0.7f64.sqrt() * (1.0 - r20).sqrt()));
    assert_eq!((e.min, e.max, e.range), (2, 4, 2));
}

#[test]
fn wrong_version_marker_is_excluded_everywhere() {
    let report = run("scenario_c.csv", &scenario_opts()).unwrap();

    assert_eq!(report.exam.rejected, 1);
    for item in &report.items {
        assert_eq!(item.responses, 5, "{}", item.question);
    }
    // Fa's score of 9 would otherwise be the maximum.
    assert_eq!(report.exam.max, 4);
}

#[test]
fn normalized_table_with_keyed_scores() {
    let report = run("normalized.csv", &AnalyzeOptions::default()).unwrap();
    let e = &report.exam;

    // Keyed scores: 3, 1, 1, 3, 1
    assert!(close(e.mean, 1.8));
    assert!(close(e.std_dev, 1.2f64.sqrt()));
    assert!(close(e.kr20, 1.5 * (1.0 - 0.65 / 1.2)), "kr20 = {}", e.kr20);

    // The "*" on question 101 is not classified.
    let q101 = &report.items[0];
    assert_eq!(q101.question, "101");
    assert_eq!(q101.responses, 4);
    assert!(close(q101.difficulty, 0.5));
    let expected = 2.0 * (1.0f64 / 3.0).sqrt() / 1.2f64.sqrt();
    assert!(close(q101.choice(Choice::A).discrimination, expected));
    assert_eq!(q101.choice(Choice::C).discrimination, 0.0);

    let counted: usize = q101.choices.iter().map(|c| c.count).sum();
    assert_eq!(counted, q101.responses);
}

#[test]
fn all_students_rejected_is_degenerate() {
    let opts = AnalyzeOptions {
        skip_columns: 1,
        version_marker: "7".into(),
        ..scenario_opts()
    };
    let err = run("scenario_c.csv", &opts).unwrap_err();
    assert!(matches!(
        err,
        AnalyzeError::Degenerate(DegenerateInput::TooFewStudents { found: 0 })
    ));
}

#[test]
fn distribution_uses_report_values() {
    let table = ResponseTable::load(&fixtures_dir().join("scenario_c.csv")).unwrap();
    let cohort = admit(&table, &scenario_opts()).unwrap();
    let report = analyze(&cohort).unwrap();
    let scores: Vec<i64> = cohort.scores().collect();

    let dist = Distribution::new(
        &scores,
        report.exam.questions as i64,
        report.exam.mean,
        report.exam.stderr_measurement,
    );
    assert_eq!(dist.bins.first(), Some(&(0, 0)));
    assert_eq!(dist.bins.last(), Some(&(4, 2)));
    assert_eq!(dist.quartiles[1], 3.0);
}

#[test]
fn loads_from_written_file_and_reports_missing_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");
    std::fs::write(
        &path,
        "CWID,ID,Name,Raw Score,Blank,q1,q2\n1,a,A,0,,1,2\n2,b,B,0,,1,1\n3,c,C,0,,2,2\n",
    )
    .unwrap();

    let table = ResponseTable::load(&path).unwrap();
    assert_eq!(table.question_columns(), ["q1", "q2"]);
    let cohort = admit(&table, &AnalyzeOptions::default()).unwrap();
    assert_eq!(cohort.scores().collect::<Vec<_>>(), vec![1, 2, 0]);

    let err = ResponseTable::load(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, AnalyzeError::Io { .. }));
}

#[test]
fn huge_raw_score_is_aggregated_without_overflow() {
    let table = ResponseTable::from_csv(
        "CWID,ID,Name,Raw Score,Blank,q1,q2\n\
         1,a,A,4000000000,,1,1\n\
         2,b,B,1,,1,2\n\
         3,c,C,2,,2,1\n",
    )
    .unwrap();
    let opts = AnalyzeOptions {
        score_source: ScoreSource::RawScore,
        ..Default::default()
    };
    let cohort = admit(&table, &opts).unwrap();
    assert_eq!(cohort.students.len(), 3);

    // The outlier dwarfs the item variances, pushing KR-20 to its ceiling.
    let err = analyze(&cohort).unwrap_err();
    assert!(
        matches!(
            err,
            AnalyzeError::Degenerate(DegenerateInput::ReliabilityAtCeiling { .. })
        ),
        "{err}"
    );

    let scores: Vec<i64> = cohort.scores().collect();
    let dist = Distribution::new(&scores, 2, 0.0, 0.0);
    assert_eq!(dist.bins.len(), 4);
    assert_eq!(dist.bins.last(), Some(&(4_000_000_000, 1)));
}

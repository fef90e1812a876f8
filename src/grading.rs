use serde::{Deserialize, Serialize};

/// Grade point at or above which a subject or sitting counts as passed.
pub const PASS_GRADE_POINT: f64 = 2.0;

/// Fraction of the theory total a student must reach in the theory section
/// alone; below it the whole subject is failed outright.
pub const THEORY_PASS_FRACTION: f64 = 0.4;

/// Section mark below which the textual remark flips to "Failed" on the
/// combined subject-result path. Independent of the grade-point pass flag.
pub const REMARKS_SECTION_FLOOR: f64 = 40.0;

/// Scale factor mapping a 0.0-4.0 grade point back onto the 0-100 band table
/// when re-deriving a final grade for a combined subject result.
pub const GRADE_POINT_PERCENT_FACTOR: f64 = 25.0;

/// Two-decimal rounding used when shaping percentages for responses.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct GradingError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GradingError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: &str, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub min_score: f64,
    pub grade: String,
    pub grade_point: f64,
}

/// Ordered threshold table mapping a 0-100 score to a letter grade and a
/// grade point. Bands are evaluated top-down; the first band whose minimum
/// the score reaches wins. Scores below every band resolve to the floor.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    bands: Vec<GradeBand>,
    floor_grade: String,
    floor_point: f64,
}

impl Default for GradeScale {
    fn default() -> Self {
        let band = |min_score: f64, grade: &str, grade_point: f64| GradeBand {
            min_score,
            grade: grade.to_string(),
            grade_point,
        };
        Self {
            bands: vec![
                band(90.0, "A+", 4.0),
                band(80.0, "A", 3.6),
                band(70.0, "B+", 3.2),
                band(60.0, "B", 2.8),
                band(50.0, "C+", 2.4),
                band(40.0, "C", 2.0),
                band(30.0, "D", 1.6),
            ],
            floor_grade: "NG".to_string(),
            floor_point: 0.0,
        }
    }
}

impl GradeScale {
    pub fn new(
        bands: Vec<GradeBand>,
        floor_grade: impl Into<String>,
        floor_point: f64,
    ) -> Result<Self, GradingError> {
        if bands.is_empty() {
            return Err(GradingError::new(
                "bad_scale",
                "grade scale needs at least one band",
            ));
        }
        let mut prev_min: Option<f64> = None;
        for b in &bands {
            if b.grade.trim().is_empty() {
                return Err(GradingError::new("bad_scale", "band grade must not be empty"));
            }
            if !(0.0..=4.0).contains(&b.grade_point) {
                return Err(GradingError::with_details(
                    "bad_scale",
                    "grade point must be within 0.0..=4.0",
                    serde_json::json!({ "grade": b.grade, "gradePoint": b.grade_point }),
                ));
            }
            if b.min_score < 0.0 {
                return Err(GradingError::with_details(
                    "bad_scale",
                    "band minimum must be >= 0",
                    serde_json::json!({ "grade": b.grade, "minScore": b.min_score }),
                ));
            }
            if let Some(p) = prev_min {
                if b.min_score >= p {
                    return Err(GradingError::with_details(
                        "bad_scale",
                        "band minimums must strictly descend",
                        serde_json::json!({ "grade": b.grade, "minScore": b.min_score }),
                    ));
                }
            }
            prev_min = Some(b.min_score);
        }
        if !(0.0..=4.0).contains(&floor_point) {
            return Err(GradingError::new(
                "bad_scale",
                "floor grade point must be within 0.0..=4.0",
            ));
        }
        Ok(Self {
            bands,
            floor_grade: floor_grade.into(),
            floor_point,
        })
    }

    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    pub fn floor(&self) -> (&str, f64) {
        (&self.floor_grade, self.floor_point)
    }

    /// First matching band wins. Defined for any score >= 0; out-of-range
    /// inputs are rejected by the calculators before reaching here.
    pub fn resolve(&self, score: f64) -> (&str, f64) {
        for b in &self.bands {
            if score >= b.min_score {
                return (&b.grade, b.grade_point);
            }
        }
        (&self.floor_grade, self.floor_point)
    }
}

/// Wire/stored form of a grade scale. Built into a validated [`GradeScale`]
/// before use; invalid tables never reach the calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeScaleConfig {
    pub bands: Vec<GradeBand>,
    pub floor_grade: String,
    pub floor_point: f64,
}

impl GradeScaleConfig {
    pub fn build(self) -> Result<GradeScale, GradingError> {
        GradeScale::new(self.bands, self.floor_grade, self.floor_point)
    }
}

impl From<&GradeScale> for GradeScaleConfig {
    fn from(scale: &GradeScale) -> Self {
        Self {
            bands: scale.bands.clone(),
            floor_grade: scale.floor_grade.clone(),
            floor_point: scale.floor_point,
        }
    }
}

/// Raw inputs for one subject mark row. Section marks are absent when no
/// marks have been entered yet; absence is decided at the boundary, never
/// encoded as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkInput {
    pub theory_marks: Option<f64>,
    pub theory_total: f64,
    pub practical_marks: Option<f64>,
    pub practical_total: f64,
}

impl Default for MarkInput {
    fn default() -> Self {
        Self {
            theory_marks: None,
            theory_total: 100.0,
            practical_marks: None,
            practical_total: 0.0,
        }
    }
}

impl MarkInput {
    fn validate(&self) -> Result<(), GradingError> {
        if self.theory_total < 0.0 || self.practical_total < 0.0 {
            return Err(GradingError::with_details(
                "bad_marks",
                "section totals must not be negative",
                serde_json::json!({
                    "theoryTotal": self.theory_total,
                    "practicalTotal": self.practical_total
                }),
            ));
        }
        if let Some(m) = self.theory_marks {
            if m < 0.0 || m > self.theory_total {
                return Err(GradingError::with_details(
                    "bad_marks",
                    "theory marks must be within 0..=theory total",
                    serde_json::json!({ "theoryMarks": m, "theoryTotal": self.theory_total }),
                ));
            }
        }
        if let Some(m) = self.practical_marks {
            if m < 0.0 || m > self.practical_total {
                return Err(GradingError::with_details(
                    "bad_marks",
                    "practical marks must be within 0..=practical total",
                    serde_json::json!({
                        "practicalMarks": m,
                        "practicalTotal": self.practical_total
                    }),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkOutcome {
    pub total_obtained: f64,
    pub percentage: f64,
    pub grade: String,
    pub grade_point: f64,
    pub passed: bool,
}

/// Derive the stored fields for one mark row. Pure and idempotent; callers
/// persist the outcome in the same statement as the inputs.
pub fn compute_mark(scale: &GradeScale, input: &MarkInput) -> Result<MarkOutcome, GradingError> {
    input.validate()?;

    let theory = input.theory_marks.unwrap_or(0.0);
    let practical = input.practical_marks.unwrap_or(0.0);
    let total_obtained = theory + practical;
    let total_possible = input.theory_total + input.practical_total;
    let percentage = if total_possible > 0.0 {
        total_obtained / total_possible * 100.0
    } else {
        0.0
    };

    // Theory gate: failing the theory section alone fails the subject,
    // no matter how strong the practical score is.
    if theory < input.theory_total * THEORY_PASS_FRACTION {
        let (grade, grade_point) = scale.floor();
        return Ok(MarkOutcome {
            total_obtained,
            percentage,
            grade: grade.to_string(),
            grade_point,
            passed: false,
        });
    }

    let (grade, grade_point) = scale.resolve(percentage);
    Ok(MarkOutcome {
        total_obtained,
        percentage,
        grade: grade.to_string(),
        grade_point,
        passed: grade_point >= PASS_GRADE_POINT,
    })
}

/// Inputs for the combined subject-result path. Section marks are graded on
/// a 0-100 scale each; totals default to 100 for theory and stay optional
/// for practical-only bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubjectResultInput {
    pub theory_marks: Option<f64>,
    pub theory_total: Option<f64>,
    pub practical_marks: Option<f64>,
    pub practical_total: Option<f64>,
}

impl SubjectResultInput {
    fn validate(&self) -> Result<(), GradingError> {
        for (label, total) in [
            ("theoryTotal", self.theory_total),
            ("practicalTotal", self.practical_total),
        ] {
            if let Some(t) = total {
                if t < 0.0 {
                    return Err(GradingError::with_details(
                        "bad_marks",
                        "section totals must not be negative",
                        serde_json::json!({ label: t }),
                    ));
                }
            }
        }
        for (label, marks) in [
            ("theoryMarks", self.theory_marks),
            ("practicalMarks", self.practical_marks),
        ] {
            if let Some(m) = marks {
                if !(0.0..=100.0).contains(&m) {
                    return Err(GradingError::with_details(
                        "bad_marks",
                        "section marks must be within 0..=100",
                        serde_json::json!({ label: m }),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResultOutcome {
    pub theory_grade: Option<String>,
    pub theory_grade_point: Option<f64>,
    pub practical_grade: Option<String>,
    pub practical_grade_point: Option<f64>,
    pub grade_point: Option<f64>,
    pub final_grade: Option<String>,
    /// None means "not computable yet", not "failed".
    pub passed: Option<bool>,
    /// Section-floor remark. Computed independently of `passed`; the two can
    /// disagree and both are preserved.
    pub remarks: String,
}

/// Combined theory+practical calculator for subject rows under an aggregate
/// result. Theory and practical grades resolve independently; the combined
/// grade point is their mean (or whichever section is present), and the
/// final grade re-resolves from grade point x 25.
pub fn compute_subject_result(
    scale: &GradeScale,
    input: &SubjectResultInput,
) -> Result<SubjectResultOutcome, GradingError> {
    input.validate()?;

    let theory_total = input.theory_total.unwrap_or(100.0);
    let remarks = {
        let section_failed = |m: Option<f64>| m.map(|v| v < REMARKS_SECTION_FLOOR).unwrap_or(false);
        if section_failed(input.theory_marks) || section_failed(input.practical_marks) {
            "Failed"
        } else {
            "Passed"
        }
    };

    // Theory gate first, same rule as the per-mark path.
    if input.theory_marks.unwrap_or(0.0) < theory_total * THEORY_PASS_FRACTION {
        let (grade, point) = scale.floor();
        return Ok(SubjectResultOutcome {
            theory_grade: Some(grade.to_string()),
            theory_grade_point: Some(point),
            practical_grade: Some(grade.to_string()),
            practical_grade_point: Some(point),
            grade_point: Some(point),
            final_grade: Some(grade.to_string()),
            passed: Some(false),
            remarks: remarks.to_string(),
        });
    }

    let theory = input.theory_marks.map(|m| {
        let (g, p) = scale.resolve(m);
        (g.to_string(), p)
    });
    let practical = input.practical_marks.map(|m| {
        let (g, p) = scale.resolve(m);
        (g.to_string(), p)
    });

    let grade_point = match (&theory, &practical) {
        (Some((_, t)), Some((_, p))) => Some((t + p) / 2.0),
        (Some((_, t)), None) => Some(*t),
        (None, Some((_, p))) => Some(*p),
        (None, None) => None,
    };
    let final_grade = grade_point.map(|gp| scale.resolve(gp * GRADE_POINT_PERCENT_FACTOR).0.to_string());
    let passed = grade_point.map(|gp| gp >= PASS_GRADE_POINT);

    Ok(SubjectResultOutcome {
        theory_grade: theory.as_ref().map(|(g, _)| g.clone()),
        theory_grade_point: theory.as_ref().map(|(_, p)| *p),
        practical_grade: practical.as_ref().map(|(g, _)| g.clone()),
        practical_grade_point: practical.as_ref().map(|(_, p)| *p),
        grade_point,
        final_grade,
        passed,
        remarks: remarks.to_string(),
    })
}

/// GPA-path percentage for an aggregate result. A distinct formula from the
/// mark-percentage path; the two are never reconciled.
pub fn aggregate_percentage(total_marks: f64, gpa: Option<f64>) -> Option<f64> {
    match gpa {
        Some(g) if total_marks > 0.0 => Some(g / 4.0 * 100.0),
        _ => None,
    }
}

pub fn performance_status(gpa: Option<f64>) -> &'static str {
    match gpa {
        None => "Not Available",
        Some(g) if g >= 3.6 => "Excellent",
        Some(g) if g >= 3.0 => "Good",
        Some(g) if g >= PASS_GRADE_POINT => "Satisfactory",
        Some(_) => "Needs Improvement",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub pass_percentage: f64,
}

/// Class-analytics fold over per-student GPAs. Rows without a GPA count
/// toward the population but toward neither pass nor fail tally.
pub fn summarize_gpas<I>(gpas: I) -> CohortStats
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut total = 0usize;
    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut sum = 0.0_f64;
    let mut present = 0usize;
    let mut highest: Option<f64> = None;
    let mut lowest: Option<f64> = None;

    for gpa in gpas {
        total += 1;
        let Some(g) = gpa else {
            continue;
        };
        present += 1;
        sum += g;
        if g >= PASS_GRADE_POINT {
            passed += 1;
        } else {
            failed += 1;
        }
        highest = Some(highest.map_or(g, |h| h.max(g)));
        lowest = Some(lowest.map_or(g, |l| l.min(g)));
    }

    CohortStats {
        total,
        passed,
        failed,
        average: if present > 0 { sum / present as f64 } else { 0.0 },
        highest: highest.unwrap_or(0.0),
        lowest: lowest.unwrap_or(0.0),
        pass_percentage: if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        },
    }
}

/// Subject-analytics fold over (total obtained, passed) pairs from mark rows.
pub fn summarize_marks<I>(rows: I) -> CohortStats
where
    I: IntoIterator<Item = (f64, bool)>,
{
    let mut total = 0usize;
    let mut passed = 0usize;
    let mut sum = 0.0_f64;
    let mut highest: Option<f64> = None;
    let mut lowest: Option<f64> = None;

    for (obtained, is_passed) in rows {
        total += 1;
        if is_passed {
            passed += 1;
        }
        sum += obtained;
        highest = Some(highest.map_or(obtained, |h| h.max(obtained)));
        lowest = Some(lowest.map_or(obtained, |l| l.min(obtained)));
    }

    CohortStats {
        total,
        passed,
        failed: total - passed,
        average: if total > 0 { sum / total as f64 } else { 0.0 },
        highest: highest.unwrap_or(0.0),
        lowest: lowest.unwrap_or(0.0),
        pass_percentage: if total > 0 {
            passed as f64 / total as f64 * 100.0
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(theory: Option<f64>, t_total: f64, practical: Option<f64>, p_total: f64) -> MarkInput {
        MarkInput {
            theory_marks: theory,
            theory_total: t_total,
            practical_marks: practical,
            practical_total: p_total,
        }
    }

    #[test]
    fn resolve_is_table_consistent_at_boundaries() {
        let scale = GradeScale::default();
        assert_eq!(scale.resolve(100.0), ("A+", 4.0));
        assert_eq!(scale.resolve(90.0), ("A+", 4.0));
        assert_eq!(scale.resolve(89.9), ("A", 3.6));
        assert_eq!(scale.resolve(70.0), ("B+", 3.2));
        assert_eq!(scale.resolve(40.0), ("C", 2.0));
        assert_eq!(scale.resolve(39.9), ("D", 1.6));
        assert_eq!(scale.resolve(30.0), ("D", 1.6));
        assert_eq!(scale.resolve(29.9), ("NG", 0.0));
        assert_eq!(scale.resolve(0.0), ("NG", 0.0));
    }

    #[test]
    fn resolve_is_monotonic_in_grade_point() {
        let scale = GradeScale::default();
        let mut prev = -1.0_f64;
        for tenths in 0..=1000 {
            let score = tenths as f64 / 10.0;
            let (_, point) = scale.resolve(score);
            assert!(
                point >= prev,
                "grade point dropped at score {}: {} -> {}",
                score,
                prev,
                point
            );
            prev = point;
        }
    }

    #[test]
    fn scale_rejects_unordered_bands() {
        let band = |min_score: f64, grade: &str, grade_point: f64| GradeBand {
            min_score,
            grade: grade.to_string(),
            grade_point,
        };
        let err = GradeScale::new(
            vec![band(50.0, "P", 2.0), band(80.0, "H", 4.0)],
            "F",
            0.0,
        )
        .unwrap_err();
        assert_eq!(err.code, "bad_scale");

        let err = GradeScale::new(vec![], "F", 0.0).unwrap_err();
        assert_eq!(err.code, "bad_scale");

        let err = GradeScale::new(vec![band(50.0, "P", 5.0)], "F", 0.0).unwrap_err();
        assert_eq!(err.code, "bad_scale");
    }

    #[test]
    fn theory_gate_overrides_high_practical() {
        let scale = GradeScale::default();
        let out = compute_mark(&scale, &mark(Some(39.0), 100.0, Some(100.0), 100.0)).unwrap();
        assert_eq!(out.total_obtained, 139.0);
        assert!((out.percentage - 69.5).abs() < 1e-9);
        assert_eq!(out.grade, "NG");
        assert_eq!(out.grade_point, 0.0);
        assert!(!out.passed);
    }

    #[test]
    fn normal_path_resolves_from_percentage() {
        let scale = GradeScale::default();
        let out = compute_mark(&scale, &mark(Some(85.0), 100.0, Some(18.0), 20.0)).unwrap();
        assert_eq!(out.total_obtained, 103.0);
        assert!((out.percentage - 85.8333333).abs() < 1e-6);
        assert_eq!(out.grade, "A");
        assert_eq!(out.grade_point, 3.6);
        assert!(out.passed);
    }

    #[test]
    fn compute_mark_is_idempotent() {
        let scale = GradeScale::default();
        let input = mark(Some(72.5), 100.0, Some(15.0), 25.0);
        let a = compute_mark(&scale, &input).unwrap();
        let b = compute_mark(&scale, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn absent_marks_degrade_to_zero_for_arithmetic_only() {
        let scale = GradeScale::default();
        // No theory entered: gate fires against the 100-mark theory total.
        let out = compute_mark(&scale, &mark(None, 100.0, Some(50.0), 50.0)).unwrap();
        assert_eq!(out.grade, "NG");
        assert!(!out.passed);

        // Zero totals: percentage collapses to 0 rather than dividing by zero.
        let out = compute_mark(&scale, &mark(None, 0.0, None, 0.0)).unwrap();
        assert_eq!(out.percentage, 0.0);
        assert_eq!(out.grade, "NG");
    }

    #[test]
    fn out_of_range_marks_are_rejected_not_clamped() {
        let scale = GradeScale::default();
        let err = compute_mark(&scale, &mark(Some(110.0), 100.0, None, 0.0)).unwrap_err();
        assert_eq!(err.code, "bad_marks");
        let err = compute_mark(&scale, &mark(Some(-1.0), 100.0, None, 0.0)).unwrap_err();
        assert_eq!(err.code, "bad_marks");
        let err = compute_mark(
            &scale,
            &MarkInput {
                theory_total: -10.0,
                ..MarkInput::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, "bad_marks");
    }

    #[test]
    fn subject_result_combines_section_grade_points() {
        let scale = GradeScale::default();
        let out = compute_subject_result(
            &scale,
            &SubjectResultInput {
                theory_marks: Some(85.0),
                practical_marks: Some(90.0),
                ..SubjectResultInput::default()
            },
        )
        .unwrap();
        assert_eq!(out.theory_grade.as_deref(), Some("A"));
        assert_eq!(out.practical_grade.as_deref(), Some("A+"));
        assert_eq!(out.grade_point, Some(3.8));
        // 3.8 x 25 = 95 resolves back to the top band.
        assert_eq!(out.final_grade.as_deref(), Some("A+"));
        assert_eq!(out.passed, Some(true));
        assert_eq!(out.remarks, "Passed");
    }

    #[test]
    fn subject_result_theory_gate_marks_everything_ng() {
        let scale = GradeScale::default();
        let out = compute_subject_result(
            &scale,
            &SubjectResultInput {
                theory_marks: Some(20.0),
                practical_marks: Some(95.0),
                ..SubjectResultInput::default()
            },
        )
        .unwrap();
        assert_eq!(out.theory_grade.as_deref(), Some("NG"));
        assert_eq!(out.practical_grade.as_deref(), Some("NG"));
        assert_eq!(out.grade_point, Some(0.0));
        assert_eq!(out.final_grade.as_deref(), Some("NG"));
        assert_eq!(out.passed, Some(false));
        assert_eq!(out.remarks, "Failed");
    }

    #[test]
    fn remarks_and_passed_can_disagree() {
        let scale = GradeScale::default();
        // Theory 45 clears the gate (C, 2.4); practical 38 resolves to D, 1.6.
        // Combined point is exactly 2.0, so the subject passes while the
        // section-floor remark still reads Failed.
        let out = compute_subject_result(
            &scale,
            &SubjectResultInput {
                theory_marks: Some(45.0),
                practical_marks: Some(38.0),
                ..SubjectResultInput::default()
            },
        )
        .unwrap();
        assert_eq!(out.grade_point, Some(2.0));
        assert_eq!(out.passed, Some(true));
        assert_eq!(out.remarks, "Failed");
    }

    #[test]
    fn subject_result_single_section_takes_that_point() {
        let scale = GradeScale::default();
        let out = compute_subject_result(
            &scale,
            &SubjectResultInput {
                theory_marks: Some(72.0),
                ..SubjectResultInput::default()
            },
        )
        .unwrap();
        assert_eq!(out.theory_grade.as_deref(), Some("B+"));
        assert_eq!(out.practical_grade, None);
        assert_eq!(out.grade_point, Some(3.2));
        assert_eq!(out.final_grade.as_deref(), Some("A"));
        assert_eq!(out.passed, Some(true));
    }

    #[test]
    fn subject_result_without_any_marks_is_not_computed() {
        let scale = GradeScale::default();
        // A zero theory total disables the gate; with no section marks there
        // is nothing to grade.
        let out = compute_subject_result(
            &scale,
            &SubjectResultInput {
                theory_total: Some(0.0),
                ..SubjectResultInput::default()
            },
        )
        .unwrap();
        assert_eq!(out.grade_point, None);
        assert_eq!(out.final_grade, None);
        assert_eq!(out.passed, None);
        assert_eq!(out.remarks, "Passed");
    }

    #[test]
    fn aggregate_percentage_needs_total_and_gpa() {
        assert_eq!(aggregate_percentage(480.0, Some(3.2)), Some(80.0));
        assert_eq!(aggregate_percentage(0.0, Some(3.2)), None);
        assert_eq!(aggregate_percentage(480.0, None), None);
    }

    #[test]
    fn performance_status_thresholds() {
        assert_eq!(performance_status(None), "Not Available");
        assert_eq!(performance_status(Some(4.0)), "Excellent");
        assert_eq!(performance_status(Some(3.6)), "Excellent");
        assert_eq!(performance_status(Some(3.0)), "Good");
        assert_eq!(performance_status(Some(2.0)), "Satisfactory");
        assert_eq!(performance_status(Some(1.9)), "Needs Improvement");
    }

    #[test]
    fn summarize_gpas_counts_absent_rows_in_total_only() {
        let stats = summarize_gpas(vec![Some(3.6), Some(2.0), Some(1.0), None]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.average - 2.2).abs() < 1e-9);
        assert_eq!(stats.highest, 3.6);
        assert_eq!(stats.lowest, 1.0);
        assert_eq!(stats.pass_percentage, 50.0);
    }

    #[test]
    fn summarize_gpas_empty_population_is_all_zero() {
        let stats = summarize_gpas(std::iter::empty::<Option<f64>>());
        assert_eq!(stats, CohortStats::default());
    }

    #[test]
    fn summarize_gpas_is_idempotent() {
        let rows = vec![Some(3.2), Some(2.4), None, Some(0.8)];
        assert_eq!(summarize_gpas(rows.clone()), summarize_gpas(rows));
    }

    #[test]
    fn summarize_marks_tallies_pass_flags() {
        let stats = summarize_marks(vec![(92.0, true), (35.0, false), (61.5, true)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.average - 62.8333333).abs() < 1e-6);
        assert_eq!(stats.highest, 92.0);
        assert_eq!(stats.lowest, 35.0);
        assert!((stats.pass_percentage - 66.6666666).abs() < 1e-6);
    }

    #[test]
    fn round_off_two_decimals() {
        assert_eq!(round_off_2_decimals(66.666666), 66.67);
        assert_eq!(round_off_2_decimals(85.833333), 85.83);
        assert_eq!(round_off_2_decimals(0.0), 0.0);
    }
}

//! 메트릭 상수 및 설명 등록
//!
//! 스테이지는 `metrics` 파사드로 기록합니다. 파이프라인은 exporter를 설치하지
//! 않으므로 호스트 프로세스가 recorder를 설치하지 않으면 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `minerva_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

/// 컴포넌트 레이블 키 (setup, test, build)
pub const LABEL_COMPONENT: &str = "component";

/// 스테이지 레이블 키
pub const LABEL_STAGE: &str = "stage";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 실행된 스테이지 수 (counter, 레이블: component, stage, result)
pub const STAGE_TOTAL: &str = "minerva_stage_total";

/// 실패한 스테이지 수 (counter, 레이블: component, stage)
pub const STAGE_FAILURES_TOTAL: &str = "minerva_stage_failures_total";

/// 스테이지 실행 시간 (histogram, 초, 레이블: component, stage)
pub const STAGE_DURATION_SECONDS: &str = "minerva_stage_duration_seconds";

/// 조건 미충족으로 건너뛴 스테이지 수 (counter)
pub const STAGE_SKIPPED_TOTAL: &str = "minerva_stage_skipped_total";

/// 설치된 recorder에 메트릭 설명 등록
pub fn describe_metrics() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(STAGE_TOTAL, "Pipeline stages executed");
    describe_counter!(STAGE_FAILURES_TOTAL, "Pipeline stages that failed");
    describe_histogram!(
        STAGE_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Wall-clock duration of pipeline stages"
    );
    describe_counter!(
        STAGE_SKIPPED_TOTAL,
        "Conditional stages omitted because their precondition was unmet"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_share_prefix() {
        for name in [
            STAGE_TOTAL,
            STAGE_FAILURES_TOTAL,
            STAGE_DURATION_SECONDS,
            STAGE_SKIPPED_TOTAL,
        ] {
            assert!(name.starts_with("minerva_"), "{name} lacks prefix");
        }
    }

    #[test]
    fn describe_without_recorder_is_noop() {
        describe_metrics();
    }
}

//! 진행 상황 보고 trait
//!
//! 컴포넌트는 [`Reporter`]로 일어난 일을 알리고, 터미널 표시 방식은 CLI가
//! 결정합니다. 테스트는 `testing::RecordingReporter`로 같은 호출을 캡처합니다.

use crate::stage::{Stage, StageRecord};

/// 자유 형식 노트의 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLevel {
    Info,
    Success,
    Warn,
    /// 중단 직전에 출력되는 `[ERROR]` 진단
    Error,
}

/// 사용자용 진행 이벤트 수신자
pub trait Reporter {
    /// 컴포넌트 실행 제목
    fn section(&mut self, title: &str);

    fn stage_started(&mut self, ordinal: usize, stage: &Stage);

    /// 스테이지 이름과 소요 시간이 붙은 성공/실패 줄
    fn stage_finished(&mut self, record: &StageRecord);

    fn stage_skipped(&mut self, name: &str, reason: &str);

    fn note(&mut self, level: NoteLevel, message: &str);

    /// 최종 성공 배너 (아무것도 실패하지 않았을 때만)
    fn banner(&mut self, message: &str);
}

/// 모든 이벤트를 버립니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&mut self, _title: &str) {}
    fn stage_started(&mut self, _ordinal: usize, _stage: &Stage) {}
    fn stage_finished(&mut self, _record: &StageRecord) {}
    fn stage_skipped(&mut self, _name: &str, _reason: &str) {}
    fn note(&mut self, _level: NoteLevel, _message: &str) {}
    fn banner(&mut self, _message: &str) {}
}

//! 이미지 아티팩트 -- 빌드된 이미지와 생명주기 상태
//!
//! ```text
//! build:   pending ─> built | failed
//! smoke:   pending ─> passed | failed          (only after built)
//! publish: not_requested
//!          pending ─> published | failed       (only after smoke passed)
//! ```

use serde::Serialize;

use minerva_core::config::is_valid_tag;

use crate::error::ImageError;

/// 모든 빌드에서 버전 태그와 함께 붙는 유동 태그
pub const LATEST_TAG: &str = "latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Built,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokeStatus {
    Pending,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    NotRequested,
    Pending,
    Published,
    Failed,
}

/// 이미지 푸시에 대한 명시적 동의
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishRequest {
    Requested,
    NotRequested,
}

impl PublishRequest {
    /// `arg`가 `literal`과 정확히 일치할 때만 `Requested`.
    /// 대소문자가 다른 값을 포함해 그 밖의 값은 조용히 무시합니다.
    pub fn from_arg(arg: Option<&str>, literal: &str) -> Self {
        match arg {
            Some(value) if value == literal => Self::Requested,
            Some(value) => {
                tracing::debug!(value, expected = literal, "publish argument not recognised, not publishing");
                Self::NotRequested
            }
            None => Self::NotRequested,
        }
    }

    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Requested)
    }
}

/// 버전이 붙은 이미지와 현재 생명주기 단계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageArtifact {
    pub name: String,
    pub version: String,
    pub build_status: BuildStatus,
    pub smoke_status: SmokeStatus,
    pub publish_status: PublishStatus,
}

impl ImageArtifact {
    /// # Errors
    ///
    /// `version`이 유효한 이미지 태그가 아니면 `InvalidTag`
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, ImageError> {
        let version = version.into();
        if !is_valid_tag(&version) {
            return Err(ImageError::InvalidTag {
                tag: version,
                reason: "tags are 1-128 characters of [A-Za-z0-9_.-] not starting with '.' or '-'"
                    .to_owned(),
            });
        }
        Ok(Self {
            name: name.into(),
            version,
            build_status: BuildStatus::Pending,
            smoke_status: SmokeStatus::Pending,
            publish_status: PublishStatus::NotRequested,
        })
    }

    /// `name:version`
    pub fn version_tag(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    /// `name:latest`
    pub fn latest_tag(&self) -> String {
        format!("{}:{LATEST_TAG}", self.name)
    }

    /// 두 태그 (버전 태그 먼저). 모든 빌드가 둘 다 붙입니다.
    pub fn tags(&self) -> [String; 2] {
        [self.version_tag(), self.latest_tag()]
    }

    /// 버전이 semver로도 파싱되는지 여부
    pub fn is_semver(&self) -> bool {
        semver::Version::parse(&self.version).is_ok()
    }

    pub fn mark_built(&mut self) {
        self.build_status = BuildStatus::Built;
    }

    pub fn mark_build_failed(&mut self) {
        self.build_status = BuildStatus::Failed;
    }

    pub fn mark_smoke_passed(&mut self) {
        if self.build_status == BuildStatus::Built {
            self.smoke_status = SmokeStatus::Passed;
        }
    }

    pub fn mark_smoke_failed(&mut self) {
        self.smoke_status = SmokeStatus::Failed;
    }

    /// 푸시 시작 전에 게시 상태를 `Pending`으로 전환
    ///
    /// # Errors
    ///
    /// 스모크 테스트가 통과하고 `request`가 동의한 경우가 아니면 `PublishNotAllowed`
    pub fn begin_publish(&mut self, request: PublishRequest) -> Result<(), ImageError> {
        if !request.is_requested() {
            return Err(ImageError::PublishNotAllowed(
                "publishing was not requested".to_owned(),
            ));
        }
        if self.smoke_status != SmokeStatus::Passed {
            return Err(ImageError::PublishNotAllowed(format!(
                "smoke test has not passed for {}",
                self.version_tag()
            )));
        }
        self.publish_status = PublishStatus::Pending;
        Ok(())
    }

    /// 두 태그 모두 푸시됨
    pub fn mark_published(&mut self) {
        if self.publish_status == PublishStatus::Pending {
            self.publish_status = PublishStatus::Published;
        }
    }

    pub fn mark_publish_failed(&mut self) {
        self.publish_status = PublishStatus::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoked(version: &str) -> ImageArtifact {
        let mut artifact = ImageArtifact::new("minerva-rag", version).unwrap();
        artifact.mark_built();
        artifact.mark_smoke_passed();
        artifact
    }

    #[test]
    fn version_yields_exactly_two_tags() {
        let artifact = ImageArtifact::new("minerva-rag", "1.2.3").unwrap();
        assert_eq!(
            artifact.tags(),
            ["minerva-rag:1.2.3".to_owned(), "minerva-rag:latest".to_owned()]
        );
    }

    #[test]
    fn invalid_tag_rejected() {
        assert!(matches!(
            ImageArtifact::new("minerva-rag", "1.0+build"),
            Err(ImageError::InvalidTag { .. })
        ));
    }

    #[test]
    fn publish_literal_must_match_exactly() {
        assert_eq!(
            PublishRequest::from_arg(Some("push"), "push"),
            PublishRequest::Requested
        );
        for other in ["PUSH", "Push", "push ", "yes", "true", ""] {
            assert_eq!(
                PublishRequest::from_arg(Some(other), "push"),
                PublishRequest::NotRequested,
                "{other:?} must not publish"
            );
        }
        assert_eq!(
            PublishRequest::from_arg(None, "push"),
            PublishRequest::NotRequested
        );
    }

    #[test]
    fn publish_requires_opt_in() {
        let mut artifact = smoked("0.1.0");
        assert!(artifact.begin_publish(PublishRequest::NotRequested).is_err());
        assert_eq!(artifact.publish_status, PublishStatus::NotRequested);
    }

    #[test]
    fn publish_requires_passed_smoke_test() {
        let mut artifact = ImageArtifact::new("minerva-rag", "0.1.0").unwrap();
        artifact.mark_built();
        artifact.mark_smoke_failed();
        assert!(artifact.begin_publish(PublishRequest::Requested).is_err());
        artifact.mark_published();
        assert_ne!(artifact.publish_status, PublishStatus::Published);
    }

    #[test]
    fn smoke_cannot_pass_before_build() {
        let mut artifact = ImageArtifact::new("minerva-rag", "0.1.0").unwrap();
        artifact.mark_smoke_passed();
        assert_eq!(artifact.smoke_status, SmokeStatus::Pending);
    }

    #[test]
    fn full_lifecycle_reaches_published() {
        let mut artifact = smoked("2.0.0");
        artifact.begin_publish(PublishRequest::Requested).unwrap();
        artifact.mark_published();
        assert_eq!(artifact.publish_status, PublishStatus::Published);
    }

    #[test]
    fn serializes_lifecycle_in_snake_case() {
        let artifact = smoked("1.2.3");
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["name"], "minerva-rag");
        assert_eq!(json["build_status"], "built");
        assert_eq!(json["smoke_status"], "passed");
        assert_eq!(json["publish_status"], "not_requested");
    }

    #[test]
    fn semver_detection() {
        assert!(ImageArtifact::new("minerva-rag", "1.2.3").unwrap().is_semver());
        assert!(!ImageArtifact::new("minerva-rag", "nightly").unwrap().is_semver());
    }
}

//! 이미지 빌더 -- Minerva 이미지 빌드, 검증, 선택적 게시
//!
//! 실패 지점마다 `[ERROR]` 노트를 남긴 뒤 해당 [`ImageError`]를 반환합니다.
//!
//! ```text
//! pre-flight ─> build (version + latest) ─> list ─> smoke test ─> publish?
//!     │              │                       │          │            │
//!  EngineMissing  BuildFailed            warn only  SmokeTestFailed  PublishFailed
//! ```

use minerva_core::command::CommandRunner;
use minerva_core::config::ImageConfig;
use minerva_core::error::StageError;
use minerva_core::report::{NoteLevel, Reporter};
use minerva_core::run::PipelineRun;
use minerva_core::stage::{SkippedStage, Stage};

use crate::artifact::{ImageArtifact, PublishRequest};
use crate::engine::ContainerEngine;
use crate::error::ImageError;

pub const STAGE_PREFLIGHT: &str = "pre-flight";
pub const STAGE_BUILD: &str = "build";
pub const STAGE_LIST: &str = "list images";
pub const STAGE_SMOKE: &str = "smoke test";
pub const STAGE_PUBLISH: &str = "publish";

/// 이미지 빌드 한 번을 구동합니다.
pub struct ImageBuilder<'a, R, E> {
    config: &'a ImageConfig,
    runner: &'a R,
    engine: &'a E,
}

impl<'a, R, E> ImageBuilder<'a, R, E>
where
    R: CommandRunner,
    E: ContainerEngine,
{
    pub fn new(config: &'a ImageConfig, runner: &'a R, engine: &'a E) -> Self {
        Self {
            config,
            runner,
            engine,
        }
    }

    /// `config.version`을 빌드하고 스모크 테스트한 뒤, `request`가 동의하면
    /// 두 태그를 푸시합니다.
    ///
    /// 상대 경로인 `context_dir`와 `dockerfile`은 러너의 작업 디렉터리 기준입니다.
    ///
    /// # Errors
    ///
    /// 실패 지점마다 하나의 [`ImageError`]. 스모크 테스트가 통과하지 않으면
    /// 아무것도 푸시하지 않습니다.
    pub async fn run(
        &self,
        run: &mut PipelineRun,
        reporter: &mut dyn Reporter,
        request: PublishRequest,
    ) -> Result<ImageArtifact, ImageError> {
        reporter.section("Minerva Image Build");

        let result = self.build_and_verify(run, reporter, request).await;
        if let Err(err) = &result {
            tracing::error!(error = %err, "image build failed");
            reporter.note(NoteLevel::Error, &err.to_string());
        }
        result
    }

    async fn build_and_verify(
        &self,
        run: &mut PipelineRun,
        reporter: &mut dyn Reporter,
        request: PublishRequest,
    ) -> Result<ImageArtifact, ImageError> {
        let mut artifact = ImageArtifact::new(&self.config.name, &self.config.version)?;
        if !artifact.is_semver() {
            tracing::warn!(version = %artifact.version, "version tag is not semver");
            reporter.note(
                NoteLevel::Warn,
                &format!("version '{}' is not a semantic version", artifact.version),
            );
        }

        self.preflight(run)?;

        let tags = artifact.tags();
        reporter.note(NoteLevel::Info, &format!("Building {}", tags.join(", ")));
        let dockerfile = self.config.context_dir.join(&self.config.dockerfile);
        let build = Stage::new(
            STAGE_BUILD,
            self.engine
                .build_command(&tags, &dockerfile, &self.config.context_dir),
        );
        if let Err(err) = run.execute(self.runner, reporter, &build).await {
            artifact.mark_build_failed();
            return Err(ImageError::from_stage(err, |exit_code| ImageError::BuildFailed {
                image: artifact.version_tag(),
                exit_code,
            }));
        }
        artifact.mark_built();

        self.list(&artifact, reporter).await;

        let smoke = Stage::new(
            STAGE_SMOKE,
            self.engine
                .smoke_command(&artifact.version_tag(), &self.config.smoke_command),
        );
        if let Err(err) = run.execute(self.runner, reporter, &smoke).await {
            artifact.mark_smoke_failed();
            return Err(ImageError::from_stage(err, |exit_code| {
                ImageError::SmokeTestFailed {
                    image: artifact.version_tag(),
                    exit_code,
                }
            }));
        }
        artifact.mark_smoke_passed();

        if request.is_requested() {
            self.publish(&mut artifact, run, reporter, request).await?;
        } else {
            let reason = format!(
                "pass '{}' as the second argument to publish",
                self.config.publish_literal
            );
            reporter.stage_skipped(STAGE_PUBLISH, &reason);
            run.skip(SkippedStage {
                name: STAGE_PUBLISH.to_owned(),
                reason,
            });
        }

        reporter.banner(&format!("Image ready: {}", artifact.tags().join(", ")));
        Ok(artifact)
    }

    fn preflight(&self, run: &mut PipelineRun) -> Result<(), ImageError> {
        if self.engine.is_available() {
            return Ok(());
        }
        let err = ImageError::EngineMissing {
            engine: self.engine.binary().to_owned(),
        };
        run.abort(&StageError::PrerequisiteMissing {
            stage: STAGE_PREFLIGHT.to_owned(),
            what: format!("container engine '{}'", self.engine.binary()),
        });
        Err(err)
    }

    /// 로컬 저장소에 생긴 이미지를 보여줍니다. 빌드를 막지 않습니다.
    async fn list(&self, artifact: &ImageArtifact, reporter: &mut dyn Reporter) {
        match self.engine.list_images(&artifact.name).await {
            Ok(images) if images.is_empty() => {
                tracing::warn!(image = %artifact.name, "built image not found in local store");
                reporter.note(
                    NoteLevel::Warn,
                    &format!("no local images match {}", artifact.name),
                );
            }
            Ok(images) => {
                for image in images {
                    reporter.note(
                        NoteLevel::Info,
                        &format!("{} ({:.1} MB)", image.tags.join(", "), image.size_mb()),
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not list local images");
                reporter.note(NoteLevel::Warn, &format!("could not list images: {e}"));
            }
        }
    }

    /// 버전 태그, 그다음 `latest`를 푸시. 둘 다 성공해야 합니다.
    async fn publish(
        &self,
        artifact: &mut ImageArtifact,
        run: &mut PipelineRun,
        reporter: &mut dyn Reporter,
        request: PublishRequest,
    ) -> Result<(), ImageError> {
        artifact.begin_publish(request)?;
        for tag in artifact.tags() {
            let push = Stage::new(
                format!("{STAGE_PUBLISH} {tag}"),
                self.engine.push_command(&tag),
            );
            if let Err(err) = run.execute(self.runner, reporter, &push).await {
                artifact.mark_publish_failed();
                return Err(ImageError::from_stage(err, |exit_code| {
                    ImageError::PublishFailed {
                        tag: tag.clone(),
                        exit_code,
                    }
                }));
            }
        }
        artifact.mark_published();
        reporter.note(
            NoteLevel::Success,
            &format!("published {}", artifact.tags().join(" and ")),
        );
        Ok(())
    }
}

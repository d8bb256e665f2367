use std::sync::Arc;

use tracing::debug;

use crate::adapters::exec_ffmpeg::{FfmpegAnalyzer, FfmpegSplicer, ToolCandidates};
use crate::adapters::probe_ffprobe::FfprobeKeyframeLocator;
use crate::app::gap_interactor::{GapInteractor, InteractorSettings};
use crate::config_initialization::{GapCutConfig, KeyframeBackend};
use crate::error::{GapCutError, GapCutResult};
use crate::ports::{AnalyzePort, KeyframePort, SplicePort};

pub trait AppContainer: Send + Sync {
    fn gap_interactor(&self) -> Arc<GapInteractor>;
    fn keyframe_port(&self) -> Arc<dyn KeyframePort>;
}

pub struct DefaultAppContainer {
    gap_interactor: Arc<GapInteractor>,
    keyframe_port: Arc<dyn KeyframePort>,
}

impl DefaultAppContainer {
    /// Wire the ffmpeg-backed adapters described by `config`
    pub fn from_config(config: &GapCutConfig) -> GapCutResult<Self> {
        let ffmpeg = ToolCandidates::new(config.ffmpeg_programs.clone());

        let analyze_port: Arc<dyn AnalyzePort> = Arc::new(
            FfmpegAnalyzer::new(ffmpeg.clone(), config.freeze_noise)
                .with_commercial_title(config.commercial_title.clone())
                .with_progress(config.show_progress),
        );
        let splice_port: Arc<dyn SplicePort> =
            Arc::new(FfmpegSplicer::new(ffmpeg).with_progress(config.show_progress));
        let keyframe_port = Self::keyframe_locator(config)?;

        Ok(Self::with_ports(
            analyze_port,
            keyframe_port,
            splice_port,
            InteractorSettings::from(config),
        ))
    }

    /// Wire explicit port implementations
    pub fn with_ports(
        analyze_port: Arc<dyn AnalyzePort>,
        keyframe_port: Arc<dyn KeyframePort>,
        splice_port: Arc<dyn SplicePort>,
        settings: InteractorSettings,
    ) -> Self {
        let gap_interactor = Arc::new(GapInteractor::new(
            analyze_port,
            Arc::clone(&keyframe_port),
            splice_port,
            settings,
        ));

        Self {
            gap_interactor,
            keyframe_port,
        }
    }

    fn keyframe_locator(config: &GapCutConfig) -> GapCutResult<Arc<dyn KeyframePort>> {
        debug!("Keyframe backend: {:?}", config.keyframe_backend);
        match config.keyframe_backend {
            KeyframeBackend::Ffprobe => Ok(Arc::new(FfprobeKeyframeLocator::new(
                ToolCandidates::new(config.ffprobe_programs.clone()),
                config.keyframe_window,
                config.keyframe_timeout(),
            ))),
            #[cfg(feature = "libav")]
            KeyframeBackend::Libav => {
                let locator = crate::adapters::probe_libav::LibavKeyframeLocator::new(
                    config.keyframe_window,
                    config.keyframe_timeout(),
                )
                .map_err(|e| GapCutError::ToolLaunch {
                    program: "libav".to_string(),
                    message: e.to_string(),
                })?;
                Ok(Arc::new(locator))
            }
            #[cfg(not(feature = "libav"))]
            KeyframeBackend::Libav => Err(GapCutError::ConfigError {
                message: "this build has no libav support".to_string(),
            }),
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn gap_interactor(&self) -> Arc<GapInteractor> {
        Arc::clone(&self.gap_interactor)
    }

    fn keyframe_port(&self) -> Arc<dyn KeyframePort> {
        Arc::clone(&self.keyframe_port)
    }
}

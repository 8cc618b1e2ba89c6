//! 분류기 클라이언트 -- 지연 로딩되는 모델 핸들
//!
//! [`ClassifierClient`]는 조립 지점(daemon/cli)에서 모델 경로로 생성되어 `Arc`로 공유됩니다.
//! 첫 [`classify`](webwatch_core::pipeline::Classifier::classify) 호출에서 모델을 한 번만 로딩하며,
//! 동시에 들어온 첫 호출들은 로딩이 끝날 때까지 기다립니다.
//! 로딩에 실패하면 에러를 돌려주고 다음 호출에서 다시 시도합니다.

pub mod model;

pub use model::{LinearModel, ModelBundle};

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use webwatch_core::error::ClassifierError;
use webwatch_core::pipeline::Classifier;
use webwatch_core::types::ClassificationResult;

use crate::config::DetectConfig;

/// 지연 로딩 분류기 클라이언트
pub struct ClassifierClient {
    model_path: PathBuf,
    model: OnceCell<LinearModel>,
}

impl ClassifierClient {
    /// 모델 경로로 클라이언트를 생성합니다. 이 시점에는 파일을 읽지 않습니다.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            model: OnceCell::new(),
        }
    }

    /// 탐지 설정의 모델 경로로 클라이언트를 생성합니다.
    pub fn from_config(config: &DetectConfig) -> Self {
        Self::new(&config.model_path)
    }

    /// 이미 로딩된 모델로 클라이언트를 생성합니다.
    pub fn with_model(model: LinearModel) -> Self {
        Self {
            model_path: PathBuf::new(),
            model: OnceCell::with_value(model),
        }
    }

    /// 모델 아티팩트 경로
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// 모델이 로딩되었는지 여부
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// 모델을 미리 로딩합니다. 이미 로딩되어 있으면 아무것도 하지 않습니다.
    pub fn warm_up(&self) -> Result<(), ClassifierError> {
        self.model().map(|_| ())
    }

    fn model(&self) -> Result<&LinearModel, ClassifierError> {
        self.model.get_or_try_init(|| {
            let model = LinearModel::load(&self.model_path)?;
            info!(
                path = %self.model_path.display(),
                classes = model.class_count(),
                meta_cols = model.meta_cols().len(),
                "classifier model loaded"
            );
            Ok(model)
        })
    }
}

impl std::fmt::Debug for ClassifierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierClient")
            .field("model_path", &self.model_path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Classifier for ClassifierClient {
    fn name(&self) -> &str {
        "linear-model"
    }

    fn classify(
        &self,
        decoded: &str,
        features: &[(&'static str, f64)],
    ) -> Result<ClassificationResult, ClassifierError> {
        let result = self.model()?.predict(decoded, features)?;
        debug!(
            category = %result.category,
            confidence = result.confidence,
            "classified"
        );
        Ok(result)
    }
}

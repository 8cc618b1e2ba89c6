//! 모델 번들 -- 선형 분류기 아티팩트 로딩과 예측
//!
//! 번들은 JSON 문서이며 클래스별 편향, 토큰 가중치, 특징 열 가중치를 담습니다.
//! 열 순서와 레이블 맵은 생략할 수 있으며, 생략하면 기본값을 사용합니다.
//!
//! ```json
//! {
//!   "bias": [0.1, -0.2, 0.0, 0.0, 0.0],
//!   "token_weights": {"union": [0.0, 2.1, 0.0, 0.0, 0.0]},
//!   "meta_weights": [[0.0, ...], ...],
//!   "meta_cols": ["url_length", "..."],
//!   "label_map": {"0": "Benign", "6": "Broken Authentication"}
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use webwatch_core::error::ClassifierError;
use webwatch_core::types::{Category, ClassificationResult};

use crate::features::{DEFAULT_META_COLS, FeatureVector};

/// 모델 고유 클래스 인덱스 중 외부 인덱스로 옮겨야 하는 값
const NATIVE_BROKEN_AUTH_INDEX: usize = 4;

/// 고유 클래스 인덱스를 외부 카테고리 인덱스로 변환합니다 (4 → 6).
pub fn remap_native_index(native: usize) -> usize {
    if native == NATIVE_BROKEN_AUTH_INDEX {
        Category::BrokenAuthentication.index()
    } else {
        native
    }
}

/// 디스크 상의 모델 번들 형식
#[derive(Debug, Clone, Deserialize)]
pub struct ModelBundle {
    /// 클래스별 편향
    pub bias: Vec<f64>,
    /// 토큰별 클래스 가중치
    #[serde(default)]
    pub token_weights: HashMap<String, Vec<f64>>,
    /// 클래스별 특징 열 가중치 (`[클래스][열]`)
    #[serde(default)]
    pub meta_weights: Vec<Vec<f64>>,
    /// 특징 열 순서 (생략 시 기본 순서)
    #[serde(default)]
    pub meta_cols: Option<Vec<String>>,
    /// 외부 인덱스 → 카테고리 레이블 (생략 시 기본 맵)
    #[serde(default)]
    pub label_map: Option<BTreeMap<usize, String>>,
}

/// 검증이 끝난 예측용 모델
#[derive(Debug, Clone)]
pub struct LinearModel {
    bias: Vec<f64>,
    token_weights: HashMap<String, Vec<f64>>,
    meta_weights: Vec<Vec<f64>>,
    meta_cols: Vec<String>,
    labels: BTreeMap<usize, Category>,
}

impl LinearModel {
    /// 파일에서 번들을 읽어 검증합니다.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let load_err = |reason: String| ClassifierError::ModelLoad {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let bundle: ModelBundle =
            serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;
        Self::from_bundle(bundle).map_err(load_err)
    }

    /// 번들의 형태를 검증하고 기본 열 순서/레이블 맵을 병합합니다.
    ///
    /// # 검증 규칙
    /// - 클래스가 1개 이상
    /// - 모든 토큰 가중치 길이 = 클래스 수
    /// - 열 가중치는 비어 있거나 `[클래스 수][열 수]` 형태
    /// - 모든 열 이름이 알려진 특징
    /// - 모든 고유 클래스 인덱스가 레이블 맵에 존재
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self, String> {
        let classes = bundle.bias.len();
        if classes == 0 {
            return Err("bias must list at least one class".to_owned());
        }

        for (token, weights) in &bundle.token_weights {
            if weights.len() != classes {
                return Err(format!(
                    "token '{}' has {} weights, expected {}",
                    token,
                    weights.len(),
                    classes
                ));
            }
        }

        let meta_cols = bundle.meta_cols.unwrap_or_else(|| {
            DEFAULT_META_COLS
                .iter()
                .map(|c| (*c).to_owned())
                .collect()
        });
        let blank = FeatureVector::default();
        if let Some(unknown) = meta_cols.iter().find(|c| blank.get(c).is_none()) {
            return Err(format!("unknown feature column '{}'", unknown));
        }

        let meta_weights = if bundle.meta_weights.is_empty() {
            vec![vec![0.0; meta_cols.len()]; classes]
        } else {
            bundle.meta_weights
        };
        if meta_weights.len() != classes {
            return Err(format!(
                "meta_weights has {} rows, expected {}",
                meta_weights.len(),
                classes
            ));
        }
        if let Some(row) = meta_weights.iter().find(|r| r.len() != meta_cols.len()) {
            return Err(format!(
                "meta_weights row has {} columns, expected {}",
                row.len(),
                meta_cols.len()
            ));
        }

        let labels = match bundle.label_map {
            Some(map) => {
                let mut labels = default_labels();
                for (index, label) in map {
                    let category = Category::from_str_loose(&label)
                        .ok_or_else(|| format!("unknown label '{}' at index {}", label, index))?;
                    labels.insert(index, category);
                }
                labels
            }
            None => default_labels(),
        };
        for native in 0..classes {
            let external = remap_native_index(native);
            if !labels.contains_key(&external) {
                return Err(format!(
                    "class {} (external index {}) has no label",
                    native, external
                ));
            }
        }

        Ok(Self {
            bias: bundle.bias,
            token_weights: bundle.token_weights,
            meta_weights,
            meta_cols,
            labels,
        })
    }

    /// 클래스 수
    pub fn class_count(&self) -> usize {
        self.bias.len()
    }

    /// 사용 중인 특징 열 순서
    pub fn meta_cols(&self) -> &[String] {
        &self.meta_cols
    }

    /// 디코딩된 텍스트와 특징으로 카테고리를 예측합니다.
    pub fn predict(
        &self,
        decoded: &str,
        features: &[(&'static str, f64)],
    ) -> Result<ClassificationResult, ClassifierError> {
        let mut logits = self.bias.clone();

        // 토큰 빈도 (L2 정규화)
        let mut counts: HashMap<&str, f64> = HashMap::new();
        for token in tokenize(decoded) {
            *counts.entry(token).or_insert(0.0) += 1.0;
        }
        let norm = counts.values().map(|c| c * c).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (token, count) in &counts {
                if let Some(weights) = self.token_weights.get(*token) {
                    let tf = count / norm;
                    for (logit, w) in logits.iter_mut().zip(weights) {
                        *logit += tf * w;
                    }
                }
            }
        }

        for (col_idx, col) in self.meta_cols.iter().enumerate() {
            let value = features
                .iter()
                .find(|(name, _)| *name == col.as_str())
                .map(|(_, v)| *v)
                .ok_or_else(|| {
                    ClassifierError::Prediction(format!("missing feature column '{}'", col))
                })?;
            for (logit, row) in logits.iter_mut().zip(&self.meta_weights) {
                *logit += value * row[col_idx];
            }
        }

        let probs = softmax(&logits)
            .ok_or_else(|| ClassifierError::Prediction("non-finite class scores".to_owned()))?;

        let (native, prob) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f64::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        let external = remap_native_index(native);
        let category = self
            .labels
            .get(&external)
            .copied()
            .ok_or(ClassifierError::UnknownLabel(external))?;

        Ok(ClassificationResult {
            category,
            confidence: prob * 100.0,
        })
    }
}

/// 기본 레이블 맵 (외부 인덱스 → 카테고리)
pub fn default_labels() -> BTreeMap<usize, Category> {
    Category::ALL.iter().map(|c| (c.index(), *c)).collect()
}

/// `[a-z0-9_]+` 단어 토큰
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
        .filter(|t| !t.is_empty())
}

/// 수치적으로 안정한 softmax. 유한하지 않은 점수가 있으면 `None`.
fn softmax(logits: &[f64]) -> Option<Vec<f64>> {
    if logits.iter().any(|l| !l.is_finite()) {
        return None;
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Some(exps.into_iter().map(|e| e / sum).collect())
}

//! 알림 브로드캐스트 허브 -- 실시간 구독자에게 알림을 팬아웃
//!
//! 구독자마다 용량이 제한된 mpsc 채널을 가집니다.
//! 발행 시 구독자 목록의 스냅샷을 만들어 동시에 전달하고,
//! 전달에 실패한 구독자는 전달이 모두 끝난 뒤 실제 목록에서 제거합니다.
//!
//! # 전달 규칙
//! - 구독자별로 격리: 한 구독자의 실패가 다른 구독자 전달을 막지 않음
//! - 전달 대기는 `delivery_timeout`으로 제한, 시간 초과와 닫힌 채널 모두 실패로 처리
//! - 실패한 구독자는 재시도 없이 제거
//! - 보낸 구독자는 `echo_to_sender`가 꺼져 있으면 제외
//!
//! 조립(모델 최초 로딩 포함)은 블로킹 스레드에서 실행하므로
//! 발행 중에도 런타임 워커가 다른 구독자 전달과 요청을 계속 처리합니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use webwatch_core::metrics as m;
use webwatch_core::types::AlertRecord;

use crate::assembler::AlertAssembler;
use crate::config::DetectConfig;
use crate::error::DetectError;

/// 구독자 식별자
pub type SubscriberId = Uuid;

/// 구독 핸들
///
/// `receiver`를 버리면 다음 발행에서 전달 실패로 감지되어 제거됩니다.
#[derive(Debug)]
pub struct Subscription {
    /// 구독자 ID
    pub id: SubscriberId,
    /// 알림 수신 채널
    pub receiver: mpsc::Receiver<Arc<AlertRecord>>,
}

/// 발행 결과
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// 조립된 알림
    pub alert: Arc<AlertRecord>,
    /// 전달에 성공한 구독자 수
    pub delivered: usize,
    /// 전달 실패로 제거된 구독자 수
    pub pruned: usize,
}

/// 알림 브로드캐스트 허브
pub struct AlertBroadcastHub {
    assembler: Arc<AlertAssembler>,
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Arc<AlertRecord>>>>,
    channel_capacity: usize,
    delivery_timeout: Duration,
    echo_to_sender: bool,
}

impl AlertBroadcastHub {
    /// 조립기와 설정으로 허브를 생성합니다.
    pub fn new(assembler: AlertAssembler, config: &DetectConfig) -> Self {
        Self {
            assembler: Arc::new(assembler),
            subscribers: RwLock::new(HashMap::new()),
            channel_capacity: config.channel_capacity.max(1),
            delivery_timeout: config.delivery_timeout(),
            echo_to_sender: config.echo_to_sender,
        }
    }

    /// 조립기
    pub fn assembler(&self) -> &AlertAssembler {
        &self.assembler
    }

    /// 보낸 구독자에게도 알림을 돌려보내는지 여부
    pub fn echo_to_sender(&self) -> bool {
        self.echo_to_sender
    }

    /// 새 구독자를 등록합니다.
    pub async fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let id = Uuid::new_v4();

        let count = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, tx);
            subscribers.len()
        };
        metrics::gauge!(m::HUB_SUBSCRIBERS).set(count as f64);
        info!(subscriber = %id, subscribers = count, "subscriber connected");

        Subscription { id, receiver: rx }
    }

    /// 구독자를 제거합니다. 이미 없으면 아무것도 하지 않습니다.
    ///
    /// 실제로 제거했으면 `true`를 반환합니다.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.subscribers.write().await;
            let removed = subscribers.remove(&id).is_some();
            (removed, subscribers.len())
        };
        if removed {
            metrics::gauge!(m::HUB_SUBSCRIBERS).set(count as f64);
            info!(subscriber = %id, subscribers = count, "subscriber disconnected");
        }
        removed
    }

    /// 현재 구독자 수
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// 구독자 등록 여부
    pub async fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// 원시 이벤트를 조립하여 구독자들에게 발행합니다.
    ///
    /// `origin`은 이벤트를 보낸 구독자입니다. 분류기 실패는 그대로 반환하며
    /// 이때는 아무에게도 전달하지 않습니다.
    pub async fn publish(
        &self,
        raw: &Value,
        origin: Option<SubscriberId>,
    ) -> Result<PublishReport, DetectError> {
        let alert = Arc::new(self.assemble_blocking(raw.clone()).await?);
        Ok(self.broadcast(alert, origin).await)
    }

    /// 조립을 블로킹 스레드에서 실행합니다.
    ///
    /// 분류기의 모델 최초 로딩은 파일 읽기와 파싱을 동기적으로 수행합니다.
    async fn assemble_blocking(&self, raw: Value) -> Result<AlertRecord, DetectError> {
        let assembler = Arc::clone(&self.assembler);
        tokio::task::spawn_blocking(move || assembler.assemble(&raw))
            .await
            .map_err(|e| DetectError::Task(format!("alert assembly: {}", e)))?
    }

    /// 이미 조립된 알림을 구독자들에게 전달합니다.
    pub async fn broadcast(
        &self,
        alert: Arc<AlertRecord>,
        origin: Option<SubscriberId>,
    ) -> PublishReport {
        // 잠금은 스냅샷을 만드는 동안만 유지
        let targets: Vec<(SubscriberId, mpsc::Sender<Arc<AlertRecord>>)> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .iter()
                .filter(|(id, _)| self.echo_to_sender || Some(**id) != origin)
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut deliveries = JoinSet::new();
        for (id, tx) in targets {
            let alert = Arc::clone(&alert);
            let timeout = self.delivery_timeout;
            deliveries.spawn(async move { (id, tx.send_timeout(alert, timeout).await.is_ok()) });
        }

        let mut delivered = 0usize;
        let mut failed = Vec::new();
        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok((_, true)) => delivered += 1,
                Ok((id, false)) => failed.push(id),
                Err(e) => warn!(error = %e, "delivery task failed"),
            }
        }

        metrics::counter!(m::HUB_DELIVERIES_TOTAL, m::LABEL_RESULT => "success")
            .increment(delivered as u64);
        metrics::counter!(m::HUB_DELIVERIES_TOTAL, m::LABEL_RESULT => "failure")
            .increment(failed.len() as u64);

        let pruned = if failed.is_empty() {
            0
        } else {
            self.prune(&failed).await
        };

        debug!(
            attack = %alert.attack,
            delivered,
            pruned,
            "alert broadcast"
        );

        PublishReport {
            alert,
            delivered,
            pruned,
        }
    }

    /// 전달에 실패한 구독자를 실제 목록에서 제거합니다.
    ///
    /// 그 사이 이미 떠난 구독자는 세지 않습니다.
    async fn prune(&self, failed: &[SubscriberId]) -> usize {
        let (pruned, count) = {
            let mut subscribers = self.subscribers.write().await;
            let pruned = failed
                .iter()
                .filter(|id| subscribers.remove(*id).is_some())
                .count();
            (pruned, subscribers.len())
        };

        if pruned > 0 {
            metrics::counter!(m::HUB_SUBSCRIBERS_PRUNED_TOTAL).increment(pruned as u64);
            metrics::gauge!(m::HUB_SUBSCRIBERS).set(count as f64);
            warn!(pruned, subscribers = count, "removed unreachable subscribers");
        }
        pruned
    }
}

impl std::fmt::Debug for AlertBroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertBroadcastHub")
            .field("channel_capacity", &self.channel_capacity)
            .field("delivery_timeout", &self.delivery_timeout)
            .field("echo_to_sender", &self.echo_to_sender)
            .finish()
    }
}

//! 缺失翻译上报任务
//!
//! 从上报通道中取出事件逐条发送，发送失败直接丢弃。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::client::HttpResourceClient;
use crate::i18n::core::MissingKeyEvent;

pub struct MissingKeyBeacon;

impl MissingKeyBeacon {
    /// 启动上报任务；通道关闭后任务结束并返回成功发送的条数
    pub fn spawn(
        client: Arc<HttpResourceClient>,
        receiver: mpsc::Receiver<MissingKeyEvent>,
    ) -> JoinHandle<usize> {
        tokio::spawn(Self::drain(client, receiver))
    }

    pub async fn drain(
        client: Arc<HttpResourceClient>,
        mut receiver: mpsc::Receiver<MissingKeyEvent>,
    ) -> usize {
        let mut delivered = 0;
        while let Some(event) = receiver.recv().await {
            match client.report_missing(&event).await {
                Ok(()) => delivered += 1,
                Err(error) => {
                    tracing::debug!("缺失翻译上报失败 {}/{}: {}", event.language, event.key, error);
                }
            }
        }
        tracing::debug!("缺失翻译上报任务结束, 共发送 {} 条", delivered);
        delivered
    }
}

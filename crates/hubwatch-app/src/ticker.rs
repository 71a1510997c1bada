//! 폴링 타이머.
//!
//! `PollTimer` 포트 구현. 타이머마다 `tokio::time::interval` 태스크를 하나 띄우고
//! 틱이 오면 핸들을 채널로 보낸다. 러너가 채널을 받아 제어기에 넘긴다.
//! 취소는 태스크 abort — 이미 채널에 들어간 틱은 제어기가 핸들로 걸러낸다.

use hubwatch_core::ports::timer::{PollTimer, TimerHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// tokio 기반 폴링 타이머
pub struct TokioPollTimer {
    tx: mpsc::UnboundedSender<TimerHandle>,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TimerHandle, JoinHandle<()>>>,
}

impl TokioPollTimer {
    /// 타이머와 틱 수신기 생성
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = Self {
            tx,
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        };
        (timer, rx)
    }

    /// 살아 있는 타이머 수
    pub fn active_count(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, task| !task.is_finished());
        tasks.len()
    }
}

impl PollTimer for TokioPollTimer {
    fn start(&self, interval: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::SeqCst));
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            // 첫 틱은 한 주기 뒤
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(handle).is_err() {
                    break;
                }
            }
        });

        self.tasks.lock().insert(handle, task);
        debug!(?handle, interval_ms = interval.as_millis() as u64, "타이머 시작");
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.lock().remove(&handle) {
            task.abort();
            debug!(?handle, "타이머 취소");
        }
    }
}

impl Drop for TokioPollTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.lock().drain() {
            task.abort();
        }
    }
}

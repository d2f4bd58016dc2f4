//! Dual-loop service skeleton every Broker-session-owning service embeds:
//! an async Bus Loop + Heartbeat on one execution context, and a dedicated
//! OS-thread Worker Loop that owns the Broker Gateway session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, TryRecvError};
use fb_broker::{new_gateway, BrokerGateway, Credentials};
use fb_bus::{AckDecision, BusConsumer, ExchangeKind};
use fb_core::config::BridgeConfig;
use fb_core::constants::{
    BLOCK_COUNTER_MAX, BLOCK_TIMEOUT, HANDOFF_QUEUE_CAPACITY, HEARTBEAT_INTERVAL,
    WORKER_JOIN_TIMEOUT,
};
use fb_core::error::BridgeError;
use fb_core::time::in_trading_hours;
use tokio_util::sync::CancellationToken;

/// What a service-specific handler does with one hand-off item. Errors are
/// logged by the skeleton; they never change the delivery's ack, which has
/// already happened at hand-off time.
pub trait WorkerHandler<T>: Send {
    fn on_message(&mut self, gateway: &mut dyn BrokerGateway, msg: T) -> Result<(), BridgeError>;
}

/// What a bus-less monitor does after every drain — no hand-off queue, the
/// broker's live view is the only input. Position Reconciler, Order
/// Monitor, and Account Monitor all implement this instead of
/// [`WorkerHandler`].
pub trait MonitorHandler: Send {
    fn on_tick(&mut self, gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError>;
}

/// Clears a liveness flag on drop, including on an unwinding panic, so the
/// heartbeat task sees the worker as dead even if it never returns normally.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Binds a queue/exchange/routing-key triple and a [`WorkerHandler`] into a
/// running dual-loop service. Runs until shutdown is requested (signal or
/// fatal liveness violation) and returns the fatal error, if any.
pub async fn run_broker_service<T, H>(
    config: &BridgeConfig,
    queue: &'static str,
    exchange: &'static str,
    exchange_kind: ExchangeKind,
    routing_key: String,
    mut handler: H,
) -> Result<(), BridgeError>
where
    T: serde::de::DeserializeOwned + Send + 'static,
    H: WorkerHandler<T> + 'static,
{
    let token = CancellationToken::new();
    fb_core::shutdown::install_signal_handler(token.clone());

    let (tx, rx) = bounded::<T>(HANDOFF_QUEUE_CAPACITY);
    let fatal: Arc<Mutex<Option<BridgeError>>> = Arc::new(Mutex::new(None));

    let creds = Credentials {
        username: config.tq.username.clone(),
        password: config.tq.password.clone(),
        activation_key: config.tq.activation_key.clone(),
    };

    let worker_alive = Arc::new(AtomicBool::new(true));

    let worker_token = token.clone();
    let worker_fatal = fatal.clone();
    let worker_alive_flag = worker_alive.clone();
    let worker_handle = std::thread::Builder::new()
        .name("broker-worker".into())
        .spawn(move || {
            let _guard = AliveGuard(worker_alive_flag);
            if let Err(e) = worker_loop(worker_token.clone(), creds, rx, &mut handler) {
                *worker_fatal.lock().expect("fatal mutex poisoned") = Some(e);
                worker_token.cancel();
            }
        })
        .map_err(|e| BridgeError::SessionCreateFailure(format!("spawn worker thread: {e}")))?;

    let bus_url = config.rabbitmq.url.clone();
    let bus_token = token.clone();
    let bus_task = tokio::spawn(async move {
        let consumer = BusConsumer::new(bus_url, exchange, exchange_kind, queue, routing_key);
        consumer
            .run(bus_token, move |payload: Vec<u8>| {
                let decision = match serde_json::from_slice::<T>(&payload) {
                    Ok(msg) => match tx.try_send(msg) {
                        Ok(()) => AckDecision::Ack,
                        Err(crossbeam_channel::TrySendError::Full(_)) => {
                            tracing::warn!("hand-off queue full, dropping message");
                            AckDecision::NackDrop
                        }
                        Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                            tracing::error!("hand-off queue disconnected, requeuing message");
                            AckDecision::NackRequeue
                        }
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "invalid message payload, dropping");
                        AckDecision::NackDrop
                    }
                };
                std::future::ready(decision)
            })
            .await;
    });

    let heartbeat_token = token.clone();
    let heartbeat_task = tokio::spawn(async move {
        while !heartbeat_token.is_cancelled() {
            if !worker_alive.load(Ordering::SeqCst) {
                tracing::error!("worker thread died, requesting shutdown");
                heartbeat_token.cancel();
                break;
            }
            tracing::info!("[HEARTBEAT] OK");
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {}
                _ = heartbeat_token.cancelled() => break,
            }
        }
    });

    token.cancelled().await;
    bus_task.abort();
    heartbeat_task.abort();

    let join_result = tokio::task::spawn_blocking(move || {
        let _ = worker_handle.join();
    });
    let _ = tokio::time::timeout(WORKER_JOIN_TIMEOUT, join_result).await;

    match fatal.lock().expect("fatal mutex poisoned").take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Applies the liveness rule to one drain outcome, mutating `block_counter`
/// in place. Shared by [`worker_loop`] and [`monitor_worker_loop`].
fn observe_drain_outcome(
    outcome: fb_broker::DrainOutcome,
    block_counter: &mut u32,
) -> Result<(), BridgeError> {
    if outcome.observed_event {
        *block_counter = 0;
    } else if in_trading_hours(chrono::Utc::now()) {
        *block_counter += 1;
        tracing::warn!(block_counter = *block_counter, "drain timed out during trading hours");
        if *block_counter > BLOCK_COUNTER_MAX {
            return Err(BridgeError::LivenessViolation(*block_counter));
        }
    } else {
        tracing::debug!("drain timed out outside trading hours");
    }
    Ok(())
}

fn worker_loop<T>(
    token: CancellationToken,
    creds: Credentials,
    rx: crossbeam_channel::Receiver<T>,
    handler: &mut dyn WorkerHandler<T>,
) -> Result<(), BridgeError> {
    let mut gateway =
        new_gateway(&creds).map_err(|e| BridgeError::SessionCreateFailure(e.to_string()))?;

    let mut block_counter: u32 = 0;

    while !token.is_cancelled() {
        let outcome = gateway
            .drain(BLOCK_TIMEOUT)
            .map_err(|e| BridgeError::broker_call("drain", e))?;
        observe_drain_outcome(outcome, &mut block_counter)?;

        match rx.try_recv() {
            Ok(msg) => {
                if let Err(e) = handler.on_message(gateway.as_mut(), msg) {
                    tracing::error!(error = %e, "error processing hand-off message");
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }
    }

    gateway.shutdown();
    Ok(())
}

fn monitor_worker_loop(
    token: CancellationToken,
    creds: Credentials,
    monitor: &mut dyn MonitorHandler,
) -> Result<(), BridgeError> {
    let mut gateway =
        new_gateway(&creds).map_err(|e| BridgeError::SessionCreateFailure(e.to_string()))?;

    let mut block_counter: u32 = 0;

    while !token.is_cancelled() {
        let outcome = gateway
            .drain(BLOCK_TIMEOUT)
            .map_err(|e| BridgeError::broker_call("drain", e))?;
        observe_drain_outcome(outcome, &mut block_counter)?;

        if let Err(e) = monitor.on_tick(gateway.as_mut()) {
            tracing::error!(error = %e, "error running monitor tick");
        }
    }

    gateway.shutdown();
    Ok(())
}

/// Binds a [`MonitorHandler`] into a running dual-loop service with no bus
/// consumer: the worker thread owns the Broker Gateway session and calls
/// `on_tick` after every drain; the async context only hosts the heartbeat.
pub async fn run_monitor_service<M>(config: &BridgeConfig, mut monitor: M) -> Result<(), BridgeError>
where
    M: MonitorHandler + 'static,
{
    let token = CancellationToken::new();
    fb_core::shutdown::install_signal_handler(token.clone());

    let fatal: Arc<Mutex<Option<BridgeError>>> = Arc::new(Mutex::new(None));
    let creds = Credentials {
        username: config.tq.username.clone(),
        password: config.tq.password.clone(),
        activation_key: config.tq.activation_key.clone(),
    };

    let worker_alive = Arc::new(AtomicBool::new(true));

    let worker_token = token.clone();
    let worker_fatal = fatal.clone();
    let worker_alive_flag = worker_alive.clone();
    let worker_handle = std::thread::Builder::new()
        .name("broker-monitor".into())
        .spawn(move || {
            let _guard = AliveGuard(worker_alive_flag);
            if let Err(e) = monitor_worker_loop(worker_token.clone(), creds, &mut monitor) {
                *worker_fatal.lock().expect("fatal mutex poisoned") = Some(e);
                worker_token.cancel();
            }
        })
        .map_err(|e| BridgeError::SessionCreateFailure(format!("spawn worker thread: {e}")))?;

    let heartbeat_token = token.clone();
    let heartbeat_task = tokio::spawn(async move {
        while !heartbeat_token.is_cancelled() {
            if !worker_alive.load(Ordering::SeqCst) {
                tracing::error!("worker thread died, requesting shutdown");
                heartbeat_token.cancel();
                break;
            }
            tracing::info!("[HEARTBEAT] OK");
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {}
                _ = heartbeat_token.cancelled() => break,
            }
        }
    });

    token.cancelled().await;
    heartbeat_task.abort();

    let join_result = tokio::task::spawn_blocking(move || {
        let _ = worker_handle.join();
    });
    let _ = tokio::time::timeout(WORKER_JOIN_TIMEOUT, join_result).await;

    match fatal.lock().expect("fatal mutex poisoned").take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Variant used by a non-broker Handler's single blocking context: same
/// prefetch/ack semantics, no Worker Loop, no liveness counter — the
/// consumer task itself does the processing.
pub async fn run_handler_service<T, F, Fut>(
    config: &BridgeConfig,
    queue: &'static str,
    exchange: &'static str,
    exchange_kind: ExchangeKind,
    routing_key: String,
    mut process: F,
) where
    T: serde::de::DeserializeOwned,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), BridgeError>> + Send + 'static,
{
    let token = CancellationToken::new();
    fb_core::shutdown::install_signal_handler(token.clone());

    let bus_url = config.rabbitmq.url.clone();
    let consumer = BusConsumer::new(bus_url, exchange, exchange_kind, queue, routing_key);
    let run_token = token.clone();
    let handle = tokio::spawn(async move {
        consumer
            .run(run_token, move |payload: Vec<u8>| {
                let decoded = serde_json::from_slice::<T>(&payload);
                let fut = match decoded {
                    Ok(msg) => Some(process(msg)),
                    Err(_) => None,
                };
                async move {
                    match fut {
                        Some(fut) => match fut.await {
                            Ok(()) => AckDecision::Ack,
                            Err(e) if matches!(e, BridgeError::PersistenceFailure { .. }) => {
                                tracing::warn!(error = %e, "persistence failure, requeuing");
                                AckDecision::NackRequeue
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "unrecoverable handler error, dropping");
                                AckDecision::NackDrop
                            }
                        },
                        None => {
                            tracing::error!("invalid message payload, dropping");
                            AckDecision::NackDrop
                        }
                    }
                }
            })
            .await;
    });

    token.cancelled().await;
    handle.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use fb_core::model::order::{Direction, Offset};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    impl WorkerHandler<u32> for CountingHandler {
        fn on_message(&mut self, gateway: &mut dyn BrokerGateway, msg: u32) -> Result<(), BridgeError> {
            self.calls.fetch_add(msg as usize, Ordering::SeqCst);
            let _ = gateway.insert_order("noop", "SHFE.rb2505", Direction::Buy, Offset::Open, 1, None);
            Ok(())
        }
    }

    #[test]
    fn worker_loop_drains_hand_off_queue_fifo() {
        let token = CancellationToken::new();
        let (tx, rx) = bounded::<u32>(4);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        drop(tx);

        let calls = Arc::new(AtomicUsize::new(0));
        let mut handler = CountingHandler {
            calls: calls.clone(),
        };

        std::env::set_var("BROKER_FORCE_MOCK", "1");
        let creds = Credentials {
            username: "u".into(),
            password: "p".into(),
            activation_key: "k".into(),
        };

        let result = worker_loop(token, creds, rx, &mut handler);
        std::env::remove_var("BROKER_FORCE_MOCK");

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    struct CountingMonitor {
        ticks: Arc<AtomicUsize>,
        token: CancellationToken,
    }

    impl MonitorHandler for CountingMonitor {
        fn on_tick(&mut self, _gateway: &mut dyn BrokerGateway) -> Result<(), BridgeError> {
            let ticks = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if ticks >= 3 {
                self.token.cancel();
            }
            Ok(())
        }
    }

    #[test]
    fn monitor_worker_loop_ticks_until_cancelled() {
        let token = CancellationToken::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut monitor = CountingMonitor {
            ticks: ticks.clone(),
            token: token.clone(),
        };

        std::env::set_var("BROKER_FORCE_MOCK", "1");
        let creds = Credentials {
            username: "u".into(),
            password: "p".into(),
            activation_key: "k".into(),
        };

        let result = monitor_worker_loop(token, creds, &mut monitor);
        std::env::remove_var("BROKER_FORCE_MOCK");

        assert!(result.is_ok());
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}

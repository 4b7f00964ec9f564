//! Bounded worker pool fanning proxies out to the checker

use crate::proxy::checker::{Connector, ProxyChecker};
use crate::proxy::models::{CheckResult, ProxyDescriptor};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Runs one check task per proxy, at most `concurrency` at a time
pub struct Dispatcher<C> {
    checker: Arc<ProxyChecker<C>>,
    concurrency: usize,
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(checker: ProxyChecker<C>) -> Self {
        let concurrency = checker.config().concurrency.max(1);
        Self {
            checker: Arc::new(checker),
            concurrency,
        }
    }

    /// Check every proxy of `proxies` and stream the results back
    ///
    /// Results arrive in completion order. The returned channel closes once
    /// every launched check has delivered its result.
    pub fn run<S>(&self, proxies: S) -> mpsc::Receiver<CheckResult>
    where
        S: Stream<Item = ProxyDescriptor> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.concurrency);
        let checker = Arc::clone(&self.checker);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        tokio::spawn(async move {
            let mut proxies = Box::pin(proxies);
            let mut tasks = JoinSet::new();

            while let Some(proxy) = proxies.next().await {
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };

                let checker = Arc::clone(&checker);
                let tx = tx.clone();
                tasks.spawn(async move {
                    let result = checker.check_proxy(proxy).await;
                    // a dropped receiver only means nobody wants the result
                    let _ = tx.send(result).await;
                    drop(permit);
                });

                while let Some(joined) = tasks.try_join_next() {
                    report_join(joined);
                }
            }

            while let Some(joined) = tasks.join_next().await {
                report_join(joined);
            }
            drop(tx);
        });

        rx
    }
}

fn report_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!("check task died before reporting: {}", e);
    }
}

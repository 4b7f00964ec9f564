//! Source → dispatcher → aggregator wiring

use crate::proxy::aggregator::{Aggregator, Report};
use crate::proxy::checker::{Connector, ProxyChecker};
use crate::proxy::diagnostics::Diagnostics;
use crate::proxy::dispatcher::Dispatcher;
use crate::proxy::models::ProxyDescriptor;
use futures::Stream;
use std::sync::Arc;

/// Check every proxy and tally the results per country
pub async fn run<C, S>(
    proxies: S,
    checker: ProxyChecker<C>,
    diagnostics: Arc<dyn Diagnostics>,
) -> Report
where
    C: Connector,
    S: Stream<Item = ProxyDescriptor> + Send + 'static,
{
    let verbose = checker.config().verbose;
    let results = Dispatcher::new(checker).run(proxies);
    Aggregator::new(verbose, diagnostics).consume(results).await
}

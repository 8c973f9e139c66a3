// =============================================================================
// Chart Service — one recomputation round, start to publish
// =============================================================================
//
// Orchestrates a chart update:
//
//   1. claim the next round sequence number,
//   2. fetch the primary price series (no fallback exists for this — a
//      failure abandons the round and surfaces to the caller),
//   3. fire one upstream fetch per enabled indicator, all concurrent, and
//      wait for every one to settle; a failed or malformed fetch falls back
//      to the local engine for that indicator only,
//   4. drop the result if a newer round was claimed while we were waiting,
//   5. otherwise assemble the bundle and publish it wholesale.
//
// Rapid indicator toggling therefore never interleaves: whichever round was
// claimed last wins, and earlier rounds discard their work after the join.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::chart::adapter;
use crate::chart::assembler::{self, ResolvedIndicator};
use crate::chart::bundle::{ChartBundle, ChartType, SeriesOrigin};
use crate::datasource::{IndicatorSource, PriceQuery, PriceSource};
use crate::indicators::{self, IndicatorKind, IndicatorParams};

/// One requested indicator with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub params: IndicatorParams,
}

impl IndicatorSpec {
    pub fn with_defaults(kind: IndicatorKind) -> Self {
        Self {
            kind,
            params: IndicatorParams::for_kind(kind),
        }
    }
}

/// Everything that defines one chart recomputation. Any change to the
/// symbol, interval, chart type or indicator set is a new request — there is
/// no partial update.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub symbol: String,
    pub interval: String,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub chart_type: ChartType,
    pub indicators: Vec<IndicatorSpec>,
}

impl ChartRequest {
    fn price_query(&self) -> PriceQuery {
        PriceQuery {
            symbol: self.symbol.clone(),
            interval: self.interval.clone(),
            period: self.period.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
    }
}

/// The chart pipeline: price + indicator sources in, published bundles out.
pub struct ChartService<I, P> {
    indicator_source: I,
    price_source: P,
    /// Round sequence. Claimed at the start of every rebuild; a rebuild whose
    /// claimed number is no longer current after its join discards itself.
    round: AtomicU64,
    latest: RwLock<Option<Arc<ChartBundle>>>,
}

impl<I: IndicatorSource, P: PriceSource> ChartService<I, P> {
    pub fn new(indicator_source: I, price_source: P) -> Self {
        Self {
            indicator_source,
            price_source,
            round: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    /// The most recently published bundle, if any round has completed.
    pub fn latest(&self) -> Option<Arc<ChartBundle>> {
        self.latest.read().clone()
    }

    /// Sequence number of the most recently claimed round.
    pub fn current_round(&self) -> u64 {
        self.round.load(Ordering::SeqCst)
    }

    /// Run one full chart round.
    ///
    /// Returns `Ok(None)` when the round was superseded by a newer one while
    /// its fetches were in flight (the stale result is discarded, nothing is
    /// published). Price-source failure is the only hard error.
    pub async fn rebuild(&self, request: &ChartRequest) -> Result<Option<Arc<ChartBundle>>> {
        let round = self.round.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            round,
            symbol = %request.symbol,
            interval = %request.interval,
            indicators = request.indicators.len(),
            "chart round started"
        );

        let price = self
            .price_source
            .fetch(&request.price_query())
            .await
            .with_context(|| format!("price data unavailable for {}", request.symbol))?;

        // Fire all indicator fetches concurrently and wait for every one to
        // settle. Failures are contained per indicator via local fallback.
        let resolved = join_all(
            request
                .indicators
                .iter()
                .map(|spec| self.resolve_indicator(&request.symbol, spec, &price)),
        )
        .await;

        if self.round.load(Ordering::SeqCst) != round {
            debug!(round, symbol = %request.symbol, "chart round superseded — discarding result");
            return Ok(None);
        }

        let bundle = Arc::new(assembler::assemble(
            price,
            request.chart_type,
            &resolved,
            round,
        ));

        // Publish under the lock, never letting an older round overwrite a
        // newer bundle that slipped in between the staleness check and here.
        {
            let mut slot = self.latest.write();
            if slot.as_ref().is_some_and(|b| b.version > bundle.version) {
                debug!(round, symbol = %request.symbol, "chart round superseded — discarding result");
                return Ok(None);
            }
            *slot = Some(bundle.clone());
        }

        info!(
            round,
            symbol = %request.symbol,
            series = bundle.series.len(),
            axes = bundle.axes.len(),
            "chart bundle published"
        );
        Ok(Some(bundle))
    }

    /// Resolve one indicator: upstream data when available and well-formed,
    /// the local engine otherwise.
    async fn resolve_indicator(
        &self,
        symbol: &str,
        spec: &IndicatorSpec,
        price: &crate::market_data::PriceSeries,
    ) -> ResolvedIndicator {
        if spec.kind.has_remote_source() {
            match self
                .indicator_source
                .fetch(symbol, spec.kind, &spec.params)
                .await
            {
                Ok(payload) => match adapter::adapt_payload(spec.kind, &payload) {
                    Some(points) => {
                        return ResolvedIndicator {
                            kind: spec.kind,
                            params: spec.params,
                            origin: SeriesOrigin::Remote,
                            points,
                        };
                    }
                    None => warn!(
                        symbol = %symbol,
                        indicator = %spec.kind,
                        "malformed indicator payload — falling back to local computation"
                    ),
                },
                Err(e) => warn!(
                    symbol = %symbol,
                    indicator = %spec.kind,
                    error = %e,
                    "indicator source unavailable — falling back to local computation"
                ),
            }
        }

        ResolvedIndicator {
            kind: spec.kind,
            params: spec.params,
            origin: SeriesOrigin::LocalFallback,
            points: indicators::compute(spec.kind, &price.bars, &spec.params),
        }
    }
}
